//! Turns a `PaymentResult` into a payer-facing notification and a log record.

use crate::error::ErrorKind;
use crate::payments::types::{PaymentMethod, PaymentResult, Settlement};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const NETWORK_FAILURE_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

/// The UI side that shows notifications to the payer.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log; the default when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Success => {
                info!("{}: {}", notification.title, notification.message)
            }
            NotificationLevel::Error => {
                warn!("{}: {}", notification.title, notification.message)
            }
        }
    }
}

/// Fixed payer-facing failure text. Provider detail never appears here.
pub fn failure_message(method: Option<PaymentMethod>, kind: Option<ErrorKind>) -> &'static str {
    if kind == Some(ErrorKind::Network) {
        return NETWORK_FAILURE_MESSAGE;
    }
    match method {
        Some(PaymentMethod::MobileMoney) => "M-Pesa payment failed. Please try again.",
        Some(PaymentMethod::CardWallet) => "Flutterwave payment failed. Please try again.",
        Some(PaymentMethod::Wallet) => "PayPal payment failed. Please try again.",
        None => NETWORK_FAILURE_MESSAGE,
    }
}

pub fn success_notification(result: &PaymentResult) -> Notification {
    let name = result
        .method
        .map(|m| m.display_name())
        .unwrap_or("Payment");

    match result.settlement {
        Some(Settlement::Accepted) => Notification {
            level: NotificationLevel::Success,
            title: "Payment Requested".to_string(),
            message: format!(
                "{} payment initiated! Check your phone to complete the payment.",
                name
            ),
        },
        _ => Notification {
            level: NotificationLevel::Success,
            title: "Payment Successful".to_string(),
            message: format!("Your {} payment was completed successfully!", name),
        },
    }
}

pub fn failure_notification(result: &PaymentResult) -> Notification {
    Notification {
        level: NotificationLevel::Error,
        title: "Payment Failed".to_string(),
        message: failure_message(result.method, result.error_kind()).to_string(),
    }
}

#[derive(Clone)]
pub struct ResultReporter {
    notifier: Arc<dyn Notifier>,
}

impl Default for ResultReporter {
    fn default() -> Self {
        Self::new(Arc::new(TracingNotifier))
    }
}

impl ResultReporter {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Surface `result` to the payer and log it as a structured record.
    pub fn report(&self, result: &PaymentResult) {
        match serde_json::to_string(result) {
            Ok(record) => info!(target: "payments::record", "{}", record),
            Err(e) => error!("Failed to serialize payment result: {}", e),
        }

        let notification = if result.success {
            success_notification(result)
        } else {
            failure_notification(result)
        };
        self.notifier.notify(&notification);
    }
}
