use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type ProviderResult<T> = Result<T, PaymentError>;

/// Coarse classification of a payment failure.
///
/// This is what crosses the dispatcher boundary inside a failed
/// `PaymentResult`; the detailed message travels alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Auth,
    ProviderRejected,
    UserCancelled,
    Verification,
    UnsupportedMethod,
    Network,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Config => "config",
            ErrorKind::Auth => "auth",
            ErrorKind::ProviderRejected => "provider_rejected",
            ErrorKind::UserCancelled => "user_cancelled",
            ErrorKind::Verification => "verification",
            ErrorKind::UnsupportedMethod => "unsupported_method",
            ErrorKind::Network => "network",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Authentication with {provider} failed: {message}")]
    Auth { provider: String, message: String },

    #[error("{provider} rejected the payment: {message}")]
    ProviderRejected { provider: String, message: String },

    #[error("Payment cancelled by user")]
    UserCancelled,

    #[error("Verification with {provider} failed: {message}")]
    Verification { provider: String, message: String },

    #[error("Unsupported payment method: {method}")]
    UnsupportedMethod { method: String },

    #[error("Network error: {message}")]
    Network { message: String },
}

impl PaymentError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rejected(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderRejected {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn verification(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Verification {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::Config { .. } => ErrorKind::Config,
            PaymentError::Auth { .. } => ErrorKind::Auth,
            PaymentError::ProviderRejected { .. } => ErrorKind::ProviderRejected,
            PaymentError::UserCancelled => ErrorKind::UserCancelled,
            PaymentError::Verification { .. } => ErrorKind::Verification,
            PaymentError::UnsupportedMethod { .. } => ErrorKind::UnsupportedMethod,
            PaymentError::Network { .. } => ErrorKind::Network,
        }
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PaymentError::network(format!("Request timed out: {}", err))
        } else {
            PaymentError::network(format!("Request error: {}", err))
        }
    }
}
