//! PayPal wallet adapter
//!
//! The PayPal buttons drive a three-step exchange: the widget asks for the
//! order body, the payer approves, and the adapter captures the approved
//! order through the handle the widget supplies. Only a capture reporting
//! `COMPLETED` counts as success.

use crate::config::require_credential;
use crate::error::{PaymentError, ProviderResult};
use crate::payments::providers::{join_url, read_json, require_path_id, ProviderContext};
use crate::payments::traits::ProviderAdapter;
use crate::payments::types::{PaymentMethod, PaymentRequest, ProviderOutcome, Settlement};
use crate::payments::widget::{run_widget, CheckoutWidget, WidgetEvent};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

const PROVIDER: &str = "PayPal";
const SANDBOX_URL: &str = "https://api.sandbox.paypal.com";
const LIVE_URL: &str = "https://api.paypal.com";

/// PayPal REST configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PaypalConfig {
    /// Overrides the sandbox/live endpoint
    pub base_url: Option<String>,
    pub client_id: String,
    pub client_secret: String,
}

impl PaypalConfig {
    pub fn ensure_configured(&self) -> ProviderResult<()> {
        require_credential(PROVIDER, "client ID", &self.client_id)
    }

    pub fn base_url(&self, ctx: &ProviderContext) -> String {
        match &self.base_url {
            Some(url) => url.clone(),
            None if ctx.mode.is_sandbox() => SANDBOX_URL.to_string(),
            None => LIVE_URL.to_string(),
        }
    }
}

/// Body returned from the buttons' `createOrder` step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub intent: String,
    pub purchase_units: Vec<PurchaseUnit>,
    pub application_context: ApplicationContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseUnit {
    pub amount: OrderAmount,
    pub description: String,
    pub custom_id: String,
    pub soft_descriptor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderAmount {
    pub value: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationContext {
    pub shipping_preference: String,
    pub user_action: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub return_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cancel_url: String,
}

/// What the buttons are rendered with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletCheckoutConfig {
    pub client_id: String,
    pub order: OrderRequest,
}

/// Result of `actions.order.capture()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureDetails {
    #[serde(default)]
    pub id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub payer: Option<Value>,
    #[serde(default)]
    pub payment_source: Option<Value>,
    #[serde(default)]
    pub purchase_units: Option<Value>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

/// Capture action handed over by the widget on approval.
#[async_trait]
pub trait OrderCapture: Send {
    async fn capture(self: Box<Self>) -> ProviderResult<CaptureDetails>;
}

/// Payload of the buttons' `onApprove` step.
pub struct WalletApproval {
    pub order_id: String,
    pub payer_id: Option<String>,
    pub capture: Box<dyn OrderCapture>,
}

impl fmt::Debug for WalletApproval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletApproval")
            .field("order_id", &self.order_id)
            .field("payer_id", &self.payer_id)
            .finish_non_exhaustive()
    }
}

pub type WalletWidget = dyn CheckoutWidget<Config = WalletCheckoutConfig, Completion = WalletApproval>;

/// PayPal buttons adapter
pub struct WalletAdapter {
    config: PaypalConfig,
    ctx: ProviderContext,
    widget: Option<Arc<WalletWidget>>,
}

impl WalletAdapter {
    pub fn new(config: PaypalConfig, ctx: ProviderContext, widget: Option<Arc<WalletWidget>>) -> Self {
        Self {
            config,
            ctx,
            widget,
        }
    }

    pub fn config(&self) -> &PaypalConfig {
        &self.config
    }

    fn order_request(&self, request: &PaymentRequest) -> OrderRequest {
        let merchant = &self.ctx.merchant;
        OrderRequest {
            intent: "CAPTURE".to_string(),
            purchase_units: vec![PurchaseUnit {
                amount: OrderAmount {
                    value: request.amount().normalize().to_string(),
                    currency_code: request.currency().to_string(),
                },
                description: format!("Payment to {} - {}", merchant.name, request.email()),
                custom_id: format!(
                    "{}-{}",
                    merchant.reference_prefix,
                    Utc::now().timestamp_millis()
                ),
                soft_descriptor: format!("{} PAYMENT", merchant.name),
            }],
            application_context: ApplicationContext {
                shipping_preference: "NO_SHIPPING".to_string(),
                user_action: "PAY_NOW".to_string(),
                return_url: merchant.return_url.clone(),
                cancel_url: merchant.cancel_url.clone(),
            },
        }
    }

    /// Fetch the order resource with the client credentials
    pub async fn verify(&self, order_id: &str) -> ProviderResult<Value> {
        self.config.ensure_configured()?;
        require_credential(PROVIDER, "client secret", &self.config.client_secret)?;
        require_path_id(PROVIDER, order_id)?;
        info!("Verifying PayPal order: order_id={}", order_id);

        let url = join_url(
            &self.config.base_url(&self.ctx),
            &format!("/v2/checkout/orders/{}", order_id),
        );
        let response = self
            .ctx
            .client
            .get(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .send()
            .await?;

        let (status, payload) = read_json(response).await?;
        if !status.is_success() {
            error!("PayPal order lookup failed: HTTP {}", status);
            return Err(PaymentError::verification(
                PROVIDER,
                format!("HTTP error! status: {}", status),
            ));
        }

        payload.ok_or_else(|| PaymentError::verification(PROVIDER, "Invalid response format"))
    }
}

#[async_trait]
impl ProviderAdapter for WalletAdapter {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Wallet
    }

    async fn initiate(&self, request: &PaymentRequest) -> ProviderResult<ProviderOutcome> {
        self.config.ensure_configured()?;
        let widget = self
            .widget
            .as_ref()
            .ok_or_else(|| PaymentError::config("PayPal SDK not loaded"))?;

        let checkout = WalletCheckoutConfig {
            client_id: self.config.client_id.clone(),
            order: self.order_request(request),
        };
        info!(
            "Rendering PayPal buttons: {} {} {}",
            request.amount(),
            request.currency(),
            request.reference()
        );

        let approval = match run_widget(widget.as_ref(), checkout).await? {
            WidgetEvent::Completed(approval) => approval,
            WidgetEvent::Closed => {
                info!("PayPal checkout cancelled by payer: {}", request.reference());
                return Err(PaymentError::UserCancelled);
            }
            WidgetEvent::Failed(message) => {
                warn!("PayPal buttons error: {}", message);
                return Err(PaymentError::rejected(
                    PROVIDER,
                    format!("PayPal payment error: {}", message),
                ));
            }
        };

        let WalletApproval {
            order_id,
            payer_id,
            capture,
        } = approval;
        if order_id.trim().is_empty() {
            return Err(PaymentError::rejected(PROVIDER, "Approval carried no order ID"));
        }
        info!("PayPal order approved, capturing: order_id={}", order_id);

        let details = capture.capture().await.map_err(|e| {
            PaymentError::rejected(PROVIDER, format!("Payment capture failed: {}", e))
        })?;

        if details.status != "COMPLETED" {
            warn!(
                "PayPal capture not completed: order_id={} status={}",
                order_id, details.status
            );
            return Err(PaymentError::rejected(
                PROVIDER,
                format!("Capture returned status {}", details.status),
            ));
        }

        let capture_id = details
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let Some(capture_id) = capture_id else {
            warn!("PayPal capture carried no ID: order_id={}", order_id);
            return Err(PaymentError::rejected(PROVIDER, "Capture carried no capture ID"));
        };

        info!(
            "PayPal payment captured: order_id={} capture_id={}",
            order_id, capture_id
        );

        Ok(ProviderOutcome {
            details: json!({
                "orderID": order_id,
                "payerID": payer_id,
                "capture": details,
            }),
            provider_reference: order_id,
            settlement: Settlement::Completed,
            message: None,
        })
    }
}
