//! Provider adapter trait definitions
//!
//! Defines the common contract every payment provider integration satisfies.

use crate::error::ProviderResult;
use crate::payments::types::{PaymentMethod, PaymentRequest, ProviderOutcome};
use async_trait::async_trait;

/// Trait for provider adapter implementations
///
/// Each adapter wraps one vendor integration (an HTTP API, an embedded
/// checkout widget, or both) behind the same asynchronous call.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// The method tag this adapter serves
    fn method(&self) -> PaymentMethod;

    /// Start a payment with the provider
    ///
    /// Suspends on network I/O and on widget interaction. Credentials are
    /// checked before anything leaves the process, so a misconfigured
    /// adapter fails with `PaymentError::Config` without side effects.
    ///
    /// # Returns
    /// * `ProviderOutcome` - provider reference and how far the payment got
    async fn initiate(&self, request: &PaymentRequest) -> ProviderResult<ProviderOutcome>;
}
