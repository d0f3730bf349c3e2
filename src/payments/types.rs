//! Payment types shared by the dispatcher, adapters and reporter.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{ErrorKind, PaymentError, ProviderResult};

/// Payment method tag, one per provider adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// M-Pesa STK push
    #[serde(rename = "mpesa", alias = "mobile_money")]
    MobileMoney,
    /// Flutterwave checkout (card, mobile money, bank transfer, USSD)
    #[serde(rename = "flutterwave", alias = "card_wallet")]
    CardWallet,
    /// PayPal buttons
    #[serde(rename = "paypal", alias = "wallet")]
    Wallet,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::MobileMoney,
        PaymentMethod::CardWallet,
        PaymentMethod::Wallet,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            PaymentMethod::MobileMoney => "mpesa",
            PaymentMethod::CardWallet => "flutterwave",
            PaymentMethod::Wallet => "paypal",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::MobileMoney => "M-Pesa",
            PaymentMethod::CardWallet => "Flutterwave",
            PaymentMethod::Wallet => "PayPal",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mpesa" | "mobile_money" => Ok(PaymentMethod::MobileMoney),
            "flutterwave" | "card_wallet" => Ok(PaymentMethod::CardWallet),
            "paypal" | "wallet" => Ok(PaymentMethod::Wallet),
            _ => Err(PaymentError::unsupported(s)),
        }
    }
}

/// Build a transaction reference of the form `PREFIX-<unix millis>-<9 chars>`.
pub fn generate_reference(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        prefix,
        Utc::now().timestamp_millis(),
        &suffix[..9]
    )
}

/// A single payment attempt.
///
/// Built once by the form collector and consumed by the dispatcher; there
/// are no setters after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    method: PaymentMethod,
    amount: Decimal,
    currency: String,
    email: String,
    phone: String,
    reference: String,
}

impl PaymentRequest {
    pub fn new(
        method: PaymentMethod,
        amount: Decimal,
        currency: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            method,
            amount,
            currency: currency.into(),
            email: email.into(),
            phone: phone.into(),
            reference: reference.into(),
        }
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// Raw form input: the method is still an untrusted tag.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentForm {
    pub method: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub reference: Option<String>,
}

impl PaymentForm {
    /// Resolve the method tag, generating a reference when none was supplied.
    pub fn into_request(self, reference_prefix: &str) -> ProviderResult<PaymentRequest> {
        let method: PaymentMethod = self.method.parse()?;
        let reference = self
            .reference
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| generate_reference(reference_prefix));

        Ok(PaymentRequest::new(
            method,
            self.amount,
            self.currency,
            self.email,
            self.phone,
            reference,
        ))
    }
}

/// How far a successful provider exchange got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    /// The provider accepted the request; funds are not confirmed yet.
    Accepted,
    /// The provider confirmed the payment.
    Completed,
}

/// What an adapter hands back on success.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutcome {
    pub provider_reference: String,
    pub settlement: Settlement,
    pub message: Option<String>,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailure {
    pub kind: ErrorKind,
    /// Provider text, kept for logs and never shown to the payer.
    pub message: String,
}

impl From<&PaymentError> for PaymentFailure {
    fn from(err: &PaymentError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Per-request lifecycle inside the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Idle,
    Dispatching,
    Succeeded,
    Failed,
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Succeeded | DispatchState::Failed)
    }

    pub fn can_transition_to(&self, next: DispatchState) -> bool {
        matches!(
            (self, next),
            (DispatchState::Idle, DispatchState::Dispatching)
                | (DispatchState::Dispatching, DispatchState::Succeeded)
                | (DispatchState::Dispatching, DispatchState::Failed)
        )
    }
}

/// Normalized outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub success: bool,
    /// `None` when the request named a method nobody handles.
    pub method: Option<PaymentMethod>,
    pub provider_reference: Option<String>,
    pub settlement: Option<Settlement>,
    pub amount: Decimal,
    pub currency: String,
    pub reference: Option<String>,
    pub error: Option<PaymentFailure>,
    pub timestamp: DateTime<Utc>,
}

impl PaymentResult {
    pub fn succeeded(request: &PaymentRequest, outcome: &ProviderOutcome) -> Self {
        Self {
            success: true,
            method: Some(request.method()),
            provider_reference: Some(outcome.provider_reference.clone()),
            settlement: Some(outcome.settlement),
            amount: request.amount(),
            currency: request.currency().to_string(),
            reference: Some(request.reference().to_string()),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(request: &PaymentRequest, err: &PaymentError) -> Self {
        Self {
            success: false,
            method: Some(request.method()),
            provider_reference: None,
            settlement: None,
            amount: request.amount(),
            currency: request.currency().to_string(),
            reference: Some(request.reference().to_string()),
            error: Some(err.into()),
            timestamp: Utc::now(),
        }
    }

    /// Failure for a form whose method tag could not be resolved.
    pub fn rejected_form(form: &PaymentForm, err: &PaymentError) -> Self {
        Self {
            success: false,
            method: None,
            provider_reference: None,
            settlement: None,
            amount: form.amount,
            currency: form.currency.clone(),
            reference: form.reference.clone(),
            error: Some(err.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// True only when the provider confirmed the funds.
    pub fn is_completed(&self) -> bool {
        self.success && self.settlement == Some(Settlement::Completed)
    }

    pub fn state(&self) -> DispatchState {
        if self.success {
            DispatchState::Succeeded
        } else {
            DispatchState::Failed
        }
    }
}
