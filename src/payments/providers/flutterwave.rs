//! Flutterwave checkout adapter
//!
//! Payments run inside the Flutterwave inline checkout, which the host page
//! renders. This adapter prepares the checkout parameters, waits for the
//! widget's callback and, separately, verifies transactions against the
//! Flutterwave API with the secret key.

use crate::config::require_credential;
use crate::error::{PaymentError, ProviderResult};
use crate::payments::providers::{join_url, read_json, require_path_id, ProviderContext};
use crate::payments::traits::ProviderAdapter;
use crate::payments::types::{
    generate_reference, PaymentMethod, PaymentRequest, ProviderOutcome, Settlement,
};
use crate::payments::widget::{run_widget, CheckoutWidget, WidgetEvent};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

const PROVIDER: &str = "Flutterwave";

/// Flutterwave configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FlutterwaveConfig {
    pub base_url: String,
    /// Used by the inline checkout
    pub public_key: String,
    /// Used by transaction verification
    pub secret_key: String,
    /// Only needed for direct-charge payloads; the inline checkout encrypts itself
    pub encryption_key: String,
    pub payment_options: String,
}

impl Default for FlutterwaveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.flutterwave.com".to_string(),
            public_key: String::new(),
            secret_key: String::new(),
            encryption_key: String::new(),
            payment_options: "card, mobilemoney, banktransfer, ussd".to_string(),
        }
    }
}

impl FlutterwaveConfig {
    pub fn ensure_configured(&self) -> ProviderResult<()> {
        require_credential(PROVIDER, "public key", &self.public_key)
    }
}

/// Parameters handed to `FlutterwaveCheckout`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardCheckoutConfig {
    pub public_key: String,
    pub tx_ref: String,
    /// `FlutterwaveCheckout` takes a JSON number here
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub payment_options: String,
    pub customer: CardCustomer,
    pub customizations: CardCustomizations,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardCustomer {
    pub email: String,
    pub phone_number: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardCustomizations {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// Payload of the checkout `callback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardCompletion {
    pub status: String,
    #[serde(default)]
    pub transaction_id: Option<u64>,
    #[serde(default)]
    pub tx_ref: Option<String>,
    #[serde(default)]
    pub flw_ref: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub customer: Option<Value>,
}

pub type CardWidget = dyn CheckoutWidget<Config = CardCheckoutConfig, Completion = CardCompletion>;

#[derive(Debug, Deserialize)]
struct VerifyEnvelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

/// Flutterwave checkout adapter
pub struct CardWalletAdapter {
    config: FlutterwaveConfig,
    ctx: ProviderContext,
    widget: Option<Arc<CardWidget>>,
}

impl CardWalletAdapter {
    /// Without a widget the adapter can still verify transactions, but
    /// `initiate` fails with a configuration error.
    pub fn new(config: FlutterwaveConfig, ctx: ProviderContext, widget: Option<Arc<CardWidget>>) -> Self {
        Self {
            config,
            ctx,
            widget,
        }
    }

    pub fn config(&self) -> &FlutterwaveConfig {
        &self.config
    }

    fn checkout_config(&self, request: &PaymentRequest) -> CardCheckoutConfig {
        let merchant = &self.ctx.merchant;
        let tx_ref = generate_reference(&merchant.reference_prefix);

        CardCheckoutConfig {
            public_key: self.config.public_key.clone(),
            amount: request.amount(),
            currency: request.currency().to_string(),
            payment_options: self.config.payment_options.clone(),
            customer: CardCustomer {
                email: request.email().to_string(),
                phone_number: request.phone().to_string(),
                name: "Customer".to_string(),
            },
            customizations: CardCustomizations {
                title: format!("{} PAYMENT", merchant.name),
                description: format!("{} - {}", merchant.description, tx_ref),
                logo: merchant.logo_url.clone(),
            },
            tx_ref,
        }
    }

    /// Confirm a transaction with the secret key, returning the provider's
    /// transaction record.
    pub async fn verify(&self, transaction_id: &str) -> ProviderResult<Value> {
        require_credential(PROVIDER, "secret key", &self.config.secret_key)?;
        require_path_id(PROVIDER, transaction_id)?;
        info!("Verifying Flutterwave transaction: id={}", transaction_id);

        let url = join_url(
            &self.config.base_url,
            &format!("/v3/transactions/{}/verify", transaction_id),
        );
        let response = self
            .ctx
            .client
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        let (status, payload) = read_json(response).await?;
        if !status.is_success() {
            error!("Flutterwave verification failed: HTTP {}", status);
            return Err(PaymentError::verification(
                PROVIDER,
                format!("HTTP error! status: {}", status),
            ));
        }

        let envelope: VerifyEnvelope = payload
            .and_then(|p| serde_json::from_value(p).ok())
            .ok_or_else(|| PaymentError::verification(PROVIDER, "Invalid response format"))?;

        if envelope.status != "success" {
            let message = envelope
                .message
                .unwrap_or_else(|| "Transaction verification failed".to_string());
            warn!("Flutterwave verification declined: {}", message);
            return Err(PaymentError::verification(PROVIDER, message));
        }

        info!("Flutterwave transaction verified: id={}", transaction_id);
        Ok(envelope.data)
    }
}

#[async_trait]
impl ProviderAdapter for CardWalletAdapter {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::CardWallet
    }

    async fn initiate(&self, request: &PaymentRequest) -> ProviderResult<ProviderOutcome> {
        self.config.ensure_configured()?;
        let widget = self
            .widget
            .as_ref()
            .ok_or_else(|| PaymentError::config("Flutterwave SDK not loaded"))?;

        let checkout = self.checkout_config(request);
        let tx_ref = checkout.tx_ref.clone();
        info!(
            "Opening Flutterwave checkout: {} {} tx_ref={}",
            request.amount(),
            request.currency(),
            tx_ref
        );

        let completion = match run_widget(widget.as_ref(), checkout).await? {
            WidgetEvent::Completed(completion) => completion,
            WidgetEvent::Closed => {
                info!("Flutterwave checkout closed by payer: tx_ref={}", tx_ref);
                return Err(PaymentError::UserCancelled);
            }
            WidgetEvent::Failed(message) => {
                warn!("Flutterwave checkout error: {}", message);
                return Err(PaymentError::rejected(PROVIDER, message));
            }
        };

        if completion.status != "successful" {
            return Err(PaymentError::rejected(
                PROVIDER,
                format!(
                    "Payment {}: {}",
                    completion.status,
                    completion.message.as_deref().unwrap_or_default()
                ),
            ));
        }

        if let Some(reported) = completion.tx_ref.as_deref() {
            if reported != tx_ref {
                return Err(PaymentError::rejected(
                    PROVIDER,
                    format!("Callback for unexpected tx_ref {}", reported),
                ));
            }
        }

        let transaction_id = completion.transaction_id.ok_or_else(|| {
            PaymentError::rejected(PROVIDER, "Successful callback carried no transaction_id")
        })?;

        info!(
            "Flutterwave payment completed: transaction_id={} tx_ref={}",
            transaction_id, tx_ref
        );

        Ok(ProviderOutcome {
            provider_reference: transaction_id.to_string(),
            settlement: Settlement::Completed,
            message: completion.message.clone(),
            details: serde_json::to_value(&completion).unwrap_or(Value::Null),
        })
    }
}
