//! Routes a payment request to the adapter registered for its method and
//! folds whatever happens into a `PaymentResult`.

use crate::error::PaymentError;
use crate::payments::traits::ProviderAdapter;
use crate::payments::types::{
    DispatchState, PaymentForm, PaymentMethod, PaymentRequest, PaymentResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Adapter registry keyed by method tag.
///
/// One `dispatch` call invokes at most one adapter exactly once. There is no
/// retry, queueing or deduplication here: a second click on "pay" is a
/// second payment unless the caller prevents it.
#[derive(Clone, Default)]
pub struct Dispatcher {
    adapters: HashMap<PaymentMethod, Arc<dyn ProviderAdapter>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` under its own method tag, replacing any previous one.
    pub fn with_adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        let method = adapter.method();
        if self.adapters.insert(method, adapter).is_some() {
            warn!("Replacing adapter for payment method {}", method);
        }
    }

    pub fn supports(&self, method: PaymentMethod) -> bool {
        self.adapters.contains_key(&method)
    }

    pub fn methods(&self) -> Vec<PaymentMethod> {
        PaymentMethod::ALL
            .into_iter()
            .filter(|m| self.supports(*m))
            .collect()
    }

    /// Run one payment through its adapter.
    ///
    /// Never fails: every adapter error, including a missing adapter, comes
    /// back as a failed `PaymentResult` carrying the error kind.
    pub async fn dispatch(&self, request: PaymentRequest) -> PaymentResult {
        let mut state = DispatchState::Idle;
        let method = request.method();

        let adapter = match self.adapters.get(&method) {
            Some(adapter) => adapter,
            None => {
                warn!("No adapter registered for payment method {}", method);
                return PaymentResult::failed(&request, &PaymentError::unsupported(method.tag()));
            }
        };

        advance(&mut state, DispatchState::Dispatching, &request);
        info!(
            "Dispatching {} payment: {} {} reference={}",
            method,
            request.amount(),
            request.currency(),
            request.reference()
        );

        let result = match adapter.initiate(&request).await {
            Ok(outcome) => {
                info!(
                    "{} payment succeeded: provider_reference={} settlement={:?}",
                    method, outcome.provider_reference, outcome.settlement
                );
                PaymentResult::succeeded(&request, &outcome)
            }
            Err(err) => {
                warn!(
                    "{} payment failed: kind={} reference={} error={}",
                    method,
                    err.kind(),
                    request.reference(),
                    err
                );
                PaymentResult::failed(&request, &err)
            }
        };

        advance(&mut state, result.state(), &request);
        result
    }

    /// Resolve a raw form and dispatch it.
    ///
    /// An unknown method tag fails with `UnsupportedMethod` before any
    /// adapter is touched.
    pub async fn dispatch_form(&self, form: PaymentForm, reference_prefix: &str) -> PaymentResult {
        match form.clone().into_request(reference_prefix) {
            Ok(request) => self.dispatch(request).await,
            Err(err) => {
                warn!("Rejected payment form: {}", err);
                PaymentResult::rejected_form(&form, &err)
            }
        }
    }
}

fn advance(state: &mut DispatchState, next: DispatchState, request: &PaymentRequest) {
    debug_assert!(state.can_transition_to(next), "{:?} -> {:?}", state, next);
    debug!(
        "Payment {} state {:?} -> {:?}",
        request.reference(),
        state,
        next
    );
    *state = next;
}
