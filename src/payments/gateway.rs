//! Configured set of adapters plus the dispatcher and reporter around them.

use crate::config::PaymentsConfig;
use crate::error::ProviderResult;
use crate::payments::dispatcher::Dispatcher;
use crate::payments::providers::flutterwave::CardWidget;
use crate::payments::providers::paypal::WalletWidget;
use crate::payments::providers::{
    CardWalletAdapter, MobileMoneyAdapter, ProviderContext, WalletAdapter,
};
use crate::payments::reporter::ResultReporter;
use crate::payments::types::{PaymentForm, PaymentMethod, PaymentRequest, PaymentResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Checkout widgets provided by the host. A missing widget makes its
/// method fail with a configuration error.
#[derive(Clone, Default)]
pub struct Widgets {
    pub card: Option<Arc<CardWidget>>,
    pub wallet: Option<Arc<WalletWidget>>,
}

pub struct PaymentGateway {
    config: PaymentsConfig,
    client: reqwest::Client,
    widgets: Widgets,
    mobile_money: Arc<MobileMoneyAdapter>,
    card: Arc<CardWalletAdapter>,
    wallet: Arc<WalletAdapter>,
    dispatcher: Dispatcher,
    reporter: ResultReporter,
}

impl PaymentGateway {
    pub fn new(config: PaymentsConfig, widgets: Widgets) -> ProviderResult<Self> {
        let ctx = ProviderContext::new(&config)?;
        Ok(Self::with_client(config, widgets, ctx.client))
    }

    pub fn with_client(config: PaymentsConfig, widgets: Widgets, client: reqwest::Client) -> Self {
        let ctx = ProviderContext::with_client(config.mode, config.merchant.clone(), client.clone());
        let mobile_money = Arc::new(MobileMoneyAdapter::new(config.mpesa.clone(), ctx.clone()));
        let card = Arc::new(CardWalletAdapter::new(
            config.flutterwave.clone(),
            ctx.clone(),
            widgets.card.clone(),
        ));
        let wallet = Arc::new(WalletAdapter::new(
            config.paypal.clone(),
            ctx,
            widgets.wallet.clone(),
        ));

        let dispatcher = Dispatcher::new()
            .with_adapter(mobile_money.clone())
            .with_adapter(card.clone())
            .with_adapter(wallet.clone());

        for (method, reason) in config.unconfigured() {
            warn!("{} is not available: {}", method.display_name(), reason);
        }

        Self {
            config,
            client,
            widgets,
            mobile_money,
            card,
            wallet,
            dispatcher,
            reporter: ResultReporter::default(),
        }
    }

    pub fn with_reporter(mut self, reporter: ResultReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Swap every provider's credentials at once, e.g. sandbox to live.
    ///
    /// Takes `&mut self`, so it cannot overlap an in-flight payment. The HTTP
    /// client is rebuilt when the timeout changes and reused otherwise.
    pub fn configure(&mut self, config: PaymentsConfig) -> ProviderResult<()> {
        info!(
            "Reconfiguring payment providers: mode={:?} timeout_secs={}",
            config.mode,
            config.timeout_secs()
        );
        let client = if config.timeout_secs() == self.config.timeout_secs() {
            self.client.clone()
        } else {
            ProviderContext::new(&config)?.client
        };
        let reporter = self.reporter.clone();
        *self = Self::with_client(config, self.widgets.clone(), client).with_reporter(reporter);
        Ok(())
    }

    pub fn config(&self) -> &PaymentsConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn is_available(&self, method: PaymentMethod) -> bool {
        let has_widget = match method {
            PaymentMethod::MobileMoney => true,
            PaymentMethod::CardWallet => self.widgets.card.is_some(),
            PaymentMethod::Wallet => self.widgets.wallet.is_some(),
        };
        has_widget && self.config.is_configured(method)
    }

    /// Dispatch a resolved request and report the outcome.
    pub async fn pay(&self, request: PaymentRequest) -> PaymentResult {
        let result = self.dispatcher.dispatch(request).await;
        self.reporter.report(&result);
        result
    }

    /// Dispatch raw form input and report the outcome.
    pub async fn process(&self, form: PaymentForm) -> PaymentResult {
        let result = self
            .dispatcher
            .dispatch_form(form, &self.config.merchant.reference_prefix)
            .await;
        self.reporter.report(&result);
        result
    }

    pub async fn check_mobile_money_status(&self, checkout_request_id: &str) -> ProviderResult<Value> {
        self.mobile_money.check_status(checkout_request_id).await
    }

    pub async fn verify_card_payment(&self, transaction_id: &str) -> ProviderResult<Value> {
        self.card.verify(transaction_id).await
    }

    pub async fn verify_wallet_order(&self, order_id: &str) -> ProviderResult<Value> {
        self.wallet.verify(order_id).await
    }
}
