//! Provider adapter implementations
//!
//! Concrete implementations of the ProviderAdapter trait for each vendor.

pub mod flutterwave;
pub mod mpesa;
pub mod paypal;

pub use flutterwave::{CardWalletAdapter, FlutterwaveConfig};
pub use mpesa::{MobileMoneyAdapter, MpesaConfig, StkQueryStatus};
pub use paypal::{PaypalConfig, WalletAdapter};

use crate::config::{MerchantProfile, Mode, PaymentsConfig};
use crate::error::{PaymentError, ProviderResult};
use reqwest::Client;
use std::time::Duration;

/// Settings every adapter shares.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub mode: Mode,
    pub merchant: MerchantProfile,
    pub client: Client,
}

impl ProviderContext {
    pub fn new(config: &PaymentsConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .user_agent(concat!("checkout-dispatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PaymentError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(config.mode, config.merchant.clone(), client))
    }

    pub fn with_client(mode: Mode, merchant: MerchantProfile, client: Client) -> Self {
        Self {
            mode,
            merchant,
            client,
        }
    }
}

/// Read a response body as JSON, keeping the HTTP status.
///
/// `None` means the body was empty or not JSON.
pub(crate) async fn read_json(
    response: reqwest::Response,
) -> ProviderResult<(reqwest::StatusCode, Option<serde_json::Value>)> {
    let status = response.status();
    let text = response.text().await?;
    Ok((status, serde_json::from_str(&text).ok()))
}

/// Check an identifier before it is placed in a URL path.
///
/// Vendor transaction and order IDs are ASCII alphanumerics plus `-` and `_`;
/// anything else is refused so the ID stays a single path segment.
pub(crate) fn require_path_id(provider: &str, id: &str) -> ProviderResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PaymentError::verification(
            provider,
            format!("Invalid identifier: {:?}", id),
        ))
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
