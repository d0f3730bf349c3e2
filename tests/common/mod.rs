#![allow(dead_code)]

use checkout_dispatch::config::{Mode, PaymentsConfig};
use checkout_dispatch::payments::providers::flutterwave::{CardCheckoutConfig, CardCompletion};
use checkout_dispatch::payments::providers::paypal::{
    CaptureDetails, OrderCapture, WalletApproval, WalletCheckoutConfig,
};
use checkout_dispatch::payments::providers::{FlutterwaveConfig, MpesaConfig, PaypalConfig};
use checkout_dispatch::payments::{
    CheckoutWidget, PaymentForm, PaymentGateway, WidgetCallbacks, Widgets,
};
use checkout_dispatch::ProviderResult;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::MockServer;

pub fn mpesa_config(server: &MockServer) -> MpesaConfig {
    MpesaConfig {
        base_url: Some(server.uri()),
        consumer_key: "consumer-key".to_string(),
        consumer_secret: "consumer-secret".to_string(),
        passkey: "passkey".to_string(),
        callback_url: "https://merchant.example/mpesa/callback".to_string(),
        ..Default::default()
    }
}

pub fn flutterwave_config(server: &MockServer) -> FlutterwaveConfig {
    FlutterwaveConfig {
        base_url: server.uri(),
        public_key: "FLWPUBK_TEST-public".to_string(),
        secret_key: "FLWSECK_TEST-secret".to_string(),
        ..Default::default()
    }
}

pub fn paypal_config(server: &MockServer) -> PaypalConfig {
    PaypalConfig {
        base_url: Some(server.uri()),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
    }
}

/// All three providers pointed at `server`, in sandbox mode.
pub fn payments_config(server: &MockServer) -> PaymentsConfig {
    PaymentsConfig {
        mode: Mode::Sandbox,
        mpesa: mpesa_config(server),
        flutterwave: flutterwave_config(server),
        paypal: paypal_config(server),
        ..Default::default()
    }
}

pub fn gateway(config: PaymentsConfig, widgets: Widgets) -> PaymentGateway {
    PaymentGateway::with_client(config, widgets, reqwest::Client::new())
}

pub fn form(method: &str, amount: Decimal, currency: &str) -> PaymentForm {
    PaymentForm {
        method: method.to_string(),
        amount,
        currency: currency.to_string(),
        email: "a@b.com".to_string(),
        phone: "0712345678".to_string(),
        reference: None,
    }
}

/// How a scripted widget responds once opened.
#[derive(Clone, Copy)]
pub enum Reaction {
    Complete,
    Decline,
    Close,
}

/// Flutterwave checkout stand-in that counts how often it was opened.
pub struct CardWidgetStub {
    pub reaction: Reaction,
    pub opened: AtomicUsize,
}

impl CardWidgetStub {
    pub fn new(reaction: Reaction) -> Arc<Self> {
        Arc::new(Self {
            reaction,
            opened: AtomicUsize::new(0),
        })
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl CheckoutWidget for CardWidgetStub {
    type Config = CardCheckoutConfig;
    type Completion = CardCompletion;

    fn open(
        &self,
        config: CardCheckoutConfig,
        callbacks: WidgetCallbacks<CardCompletion>,
    ) -> ProviderResult<()> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let status = match self.reaction {
            Reaction::Complete => "successful",
            Reaction::Decline => "failed",
            Reaction::Close => {
                callbacks.close();
                return Ok(());
            }
        };

        // The vendor script calls back asynchronously after user input.
        tokio::spawn(async move {
            callbacks.complete(CardCompletion {
                status: status.to_string(),
                transaction_id: Some(288200108),
                tx_ref: Some(config.tx_ref),
                flw_ref: Some("FLW-MOCK-1".to_string()),
                amount: Some(config.amount),
                currency: Some(config.currency),
                message: Some("Approved".to_string()),
                customer: None,
            });
        });
        Ok(())
    }
}

struct CompletedCapture;

#[async_trait::async_trait]
impl OrderCapture for CompletedCapture {
    async fn capture(self: Box<Self>) -> ProviderResult<CaptureDetails> {
        Ok(CaptureDetails {
            id: Some("8AB12345CD678901E".to_string()),
            status: "COMPLETED".to_string(),
            payer: None,
            payment_source: None,
            purchase_units: None,
            create_time: None,
            update_time: None,
        })
    }
}

/// PayPal buttons stand-in.
pub struct WalletWidgetStub {
    pub reaction: Reaction,
    pub opened: AtomicUsize,
}

impl WalletWidgetStub {
    pub fn new(reaction: Reaction) -> Arc<Self> {
        Arc::new(Self {
            reaction,
            opened: AtomicUsize::new(0),
        })
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl CheckoutWidget for WalletWidgetStub {
    type Config = WalletCheckoutConfig;
    type Completion = WalletApproval;

    fn open(
        &self,
        _config: WalletCheckoutConfig,
        callbacks: WidgetCallbacks<WalletApproval>,
    ) -> ProviderResult<()> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        match self.reaction {
            Reaction::Complete => callbacks.complete(WalletApproval {
                order_id: "8AB12345CD678901E".to_string(),
                payer_id: Some("QYR5Z8XDVJNXQ".to_string()),
                capture: Box::new(CompletedCapture),
            }),
            Reaction::Decline => callbacks.fail("INSTRUMENT_DECLINED"),
            Reaction::Close => callbacks.close(),
        }
        Ok(())
    }
}
