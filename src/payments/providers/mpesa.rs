//! M-Pesa (Daraja) mobile-money adapter
//!
//! Sends an STK push to the payer's phone. Acceptance of the push only means
//! the prompt was delivered: the result is `Settlement::Accepted`, and callers
//! poll `check_status` (or wait for the callback) before treating funds as
//! received.

use crate::config::require_credential;
use crate::error::{PaymentError, ProviderResult};
use crate::payments::phone::PhoneRules;
use crate::payments::providers::{join_url, read_json, ProviderContext};
use crate::payments::traits::ProviderAdapter;
use crate::payments::types::{PaymentMethod, PaymentRequest, ProviderOutcome, Settlement};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

const PROVIDER: &str = "M-Pesa";
const SANDBOX_URL: &str = "https://sandbox.safaricom.co.ke";
const LIVE_URL: &str = "https://api.safaricom.co.ke";

const TOKEN_PATH: &str = "/oauth/v1/generate?grant_type=client_credentials";
const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";
const STK_QUERY_PATH: &str = "/mpesa/stkpushquery/v1/query";

/// Daraja reports a still-running push through this error code.
const STILL_PROCESSING: &str = "500.001.1001";

/// M-Pesa Daraja configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MpesaConfig {
    /// Overrides the sandbox/live endpoint
    pub base_url: Option<String>,
    pub consumer_key: String,
    pub consumer_secret: String,
    /// PayBill or till number
    pub business_short_code: String,
    pub passkey: String,
    pub callback_url: String,
    pub transaction_type: String,
    pub phone: PhoneRules,
}

impl Default for MpesaConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            consumer_key: String::new(),
            consumer_secret: String::new(),
            business_short_code: "174379".to_string(),
            passkey: String::new(),
            callback_url: String::new(),
            transaction_type: "CustomerPayBillOnline".to_string(),
            phone: PhoneRules::default(),
        }
    }
}

impl MpesaConfig {
    pub fn ensure_configured(&self) -> ProviderResult<()> {
        require_credential(PROVIDER, "consumer key", &self.consumer_key)?;
        require_credential(PROVIDER, "consumer secret", &self.consumer_secret)?;
        require_credential(PROVIDER, "business short code", &self.business_short_code)?;
        require_credential(PROVIDER, "passkey", &self.passkey)?;
        require_credential(PROVIDER, "callback URL", &self.callback_url)
    }

    pub fn base_url(&self, ctx: &ProviderContext) -> String {
        match &self.base_url {
            Some(url) => url.clone(),
            None if ctx.mode.is_sandbox() => SANDBOX_URL.to_string(),
            None => LIVE_URL.to_string(),
        }
    }
}

/// `YYYYMMDDHHMMSS`, as Daraja expects in `Timestamp`.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// base64(short code + passkey + timestamp)
pub fn password(short_code: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{}{}{}", short_code, passkey, timestamp))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StkPushRequest<'a> {
    business_short_code: &'a str,
    password: String,
    timestamp: String,
    transaction_type: &'a str,
    amount: String,
    party_a: &'a str,
    party_b: &'a str,
    phone_number: &'a str,
    #[serde(rename = "CallBackURL")]
    call_back_url: &'a str,
    account_reference: &'a str,
    transaction_desc: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StkQueryRequest<'a> {
    business_short_code: &'a str,
    password: String,
    timestamp: String,
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StkPushResponse {
    #[serde(rename = "CheckoutRequestID", default)]
    checkout_request_id: Option<String>,
    #[serde(default)]
    response_code: Option<String>,
    #[serde(default)]
    response_description: Option<String>,
    #[serde(default)]
    customer_message: Option<String>,
}

/// Final state of an STK push, read from a status-query payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StkQueryStatus {
    /// The payer entered their PIN and the payment went through
    Completed,
    /// The push is still waiting on the payer
    Pending,
    /// Request cancelled by user (1032)
    Cancelled,
    /// The payer never answered the prompt (1037)
    TimedOut,
    Failed { code: String, description: String },
    Unknown,
}

impl StkQueryStatus {
    pub fn from_payload(payload: &Value) -> Self {
        if payload.get("errorCode").and_then(Value::as_str) == Some(STILL_PROCESSING) {
            return StkQueryStatus::Pending;
        }

        // Daraja sends ResultCode as a string, older sandboxes as a number.
        let code = match payload.get("ResultCode") {
            Some(Value::String(code)) => code.clone(),
            Some(Value::Number(code)) => code.to_string(),
            _ => return StkQueryStatus::Unknown,
        };

        match code.as_str() {
            "0" => return StkQueryStatus::Completed,
            "1032" => return StkQueryStatus::Cancelled,
            "1037" => return StkQueryStatus::TimedOut,
            _ => {}
        }

        let description = payload
            .get("ResultDesc")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        StkQueryStatus::Failed { code, description }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StkQueryStatus::Completed)
    }
}

/// M-Pesa STK push adapter
pub struct MobileMoneyAdapter {
    config: MpesaConfig,
    ctx: ProviderContext,
}

impl MobileMoneyAdapter {
    pub fn new(config: MpesaConfig, ctx: ProviderContext) -> Self {
        Self { config, ctx }
    }

    pub fn config(&self) -> &MpesaConfig {
        &self.config
    }

    /// Exchange the consumer key and secret for a short-lived bearer token
    async fn access_token(&self) -> ProviderResult<String> {
        let url = join_url(&self.config.base_url(&self.ctx), TOKEN_PATH);
        debug!("Requesting M-Pesa access token");

        let response = self
            .ctx
            .client
            .get(&url)
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("M-Pesa token request failed: HTTP {}", status);
            return Err(PaymentError::auth(PROVIDER, format!("HTTP error! status: {}", status)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::auth(PROVIDER, format!("Invalid token response: {}", e)))?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PaymentError::auth(PROVIDER, "Token response carried no access_token"))
    }

    /// Poll Daraja for the final state of a push, returning the raw payload
    ///
    /// Authenticates afresh on every call. Interpret the payload with
    /// `StkQueryStatus::from_payload`.
    pub async fn check_status(&self, checkout_request_id: &str) -> ProviderResult<Value> {
        self.config.ensure_configured()?;
        info!(
            "Checking M-Pesa transaction status: checkout_request_id={}",
            checkout_request_id
        );

        let token = self.access_token().await?;
        let timestamp = timestamp(Utc::now());
        let body = StkQueryRequest {
            business_short_code: &self.config.business_short_code,
            password: password(
                &self.config.business_short_code,
                &self.config.passkey,
                &timestamp,
            ),
            timestamp,
            checkout_request_id,
        };

        let response = self
            .ctx
            .client
            .post(join_url(&self.config.base_url(&self.ctx), STK_QUERY_PATH))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        match read_json(response).await? {
            (_, Some(payload)) => Ok(payload),
            (status, None) => {
                error!("M-Pesa status query returned no JSON: HTTP {}", status);
                Err(PaymentError::network(format!("HTTP error! status: {}", status)))
            }
        }
    }
}

#[async_trait]
impl ProviderAdapter for MobileMoneyAdapter {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::MobileMoney
    }

    async fn initiate(&self, request: &PaymentRequest) -> ProviderResult<ProviderOutcome> {
        self.config.ensure_configured()?;

        let phone = self
            .config
            .phone
            .normalize(request.phone(), self.ctx.mode.is_sandbox());
        if phone.is_empty() {
            return Err(PaymentError::rejected(PROVIDER, "A phone number is required"));
        }

        info!(
            "Initiating M-Pesa STK push: {} {} {}",
            request.amount(),
            request.currency(),
            request.reference()
        );

        let token = self.access_token().await?;
        let timestamp = timestamp(Utc::now());
        let merchant = &self.ctx.merchant;
        let body = StkPushRequest {
            business_short_code: &self.config.business_short_code,
            password: password(
                &self.config.business_short_code,
                &self.config.passkey,
                &timestamp,
            ),
            timestamp,
            transaction_type: &self.config.transaction_type,
            amount: request.amount().normalize().to_string(),
            party_a: &phone,
            party_b: &self.config.business_short_code,
            phone_number: &phone,
            call_back_url: &self.config.callback_url,
            account_reference: request.reference(),
            transaction_desc: format!("{} - {}", merchant.description, merchant.name),
        };

        let response = self
            .ctx
            .client
            .post(join_url(&self.config.base_url(&self.ctx), STK_PUSH_PATH))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let (status, payload) = read_json(response).await?;
        let payload = match payload {
            Some(payload) => payload,
            None => {
                error!("M-Pesa STK push returned no JSON: HTTP {}", status);
                return Err(PaymentError::network(format!("HTTP error! status: {}", status)));
            }
        };

        if !status.is_success() {
            let message = payload
                .get("errorMessage")
                .and_then(Value::as_str)
                .unwrap_or("STK push failed");
            warn!("M-Pesa STK push rejected: HTTP {} {}", status, message);
            return Err(PaymentError::rejected(PROVIDER, message));
        }

        let parsed: StkPushResponse = serde_json::from_value(payload.clone()).map_err(|e| {
            PaymentError::rejected(PROVIDER, format!("Invalid response format: {}", e))
        })?;

        if parsed.response_code.as_deref() != Some("0") {
            let message = parsed
                .response_description
                .unwrap_or_else(|| "STK push failed".to_string());
            warn!("M-Pesa STK push declined: {}", message);
            return Err(PaymentError::rejected(PROVIDER, message));
        }

        let checkout_request_id = parsed
            .checkout_request_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                PaymentError::rejected(PROVIDER, "Accepted push carried no CheckoutRequestID")
            })?;

        info!(
            "M-Pesa STK push accepted: checkout_request_id={}",
            checkout_request_id
        );

        Ok(ProviderOutcome {
            provider_reference: checkout_request_id,
            settlement: Settlement::Accepted,
            message: parsed.customer_message,
            details: payload,
        })
    }
}
