use anyhow::{anyhow, Context, Result};
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, ProviderResult};
use crate::payments::providers::{FlutterwaveConfig, MpesaConfig, PaypalConfig};
use crate::payments::types::PaymentMethod;

/// Markers found in sample credentials and sample URLs.
const PLACEHOLDER_MARKERS: [&str; 2] = ["YOUR_", "yourdomain.com"];

pub(crate) fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_MARKERS.iter().any(|marker| value.contains(marker))
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: "development".to_string(),
        }
    }
}

/// Sandbox or live provider endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Sandbox,
    Live,
}

impl Mode {
    pub fn is_sandbox(&self) -> bool {
        matches!(self, Mode::Sandbox)
    }
}

/// Display metadata shown by checkout widgets and attached to push requests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MerchantProfile {
    pub name: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub reference_prefix: String,
    pub return_url: String,
    pub cancel_url: String,
}

impl Default for MerchantProfile {
    fn default() -> Self {
        Self {
            name: "SILA TECH".to_string(),
            description: "Payment for services".to_string(),
            logo_url: None,
            reference_prefix: "SILA".to_string(),
            return_url: String::new(),
            cancel_url: String::new(),
        }
    }
}

/// Credentials and endpoints for every provider.
///
/// Set once at startup and swapped wholesale through
/// `PaymentGateway::configure`; never patched field by field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    pub mode: Mode,
    pub timeout_secs: Option<u64>,
    pub merchant: MerchantProfile,
    pub mpesa: MpesaConfig,
    pub flutterwave: FlutterwaveConfig,
    pub paypal: PaypalConfig,
}

impl PaymentsConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(Self::DEFAULT_TIMEOUT_SECS)
    }

    /// Check every provider section, returning the methods that are not
    /// usable together with the reason.
    pub fn unconfigured(&self) -> Vec<(PaymentMethod, PaymentError)> {
        let checks = [
            (PaymentMethod::MobileMoney, self.mpesa.ensure_configured()),
            (PaymentMethod::CardWallet, self.flutterwave.ensure_configured()),
            (PaymentMethod::Wallet, self.paypal.ensure_configured()),
        ];
        checks
            .into_iter()
            .filter_map(|(method, check)| check.err().map(|e| (method, e)))
            .collect()
    }

    pub fn is_configured(&self, method: PaymentMethod) -> bool {
        !self.unconfigured().iter().any(|(m, _)| *m == method)
    }
}

/// Fail with `PaymentError::Config` when `value` is missing or still a
/// vendor placeholder.
pub(crate) fn require_credential(provider: &str, field: &str, value: &str) -> ProviderResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PaymentError::config(format!(
            "{} {} is not configured",
            provider, field
        )));
    }
    if is_placeholder(value) {
        return Err(PaymentError::config(format!(
            "{} {} is still a placeholder",
            provider, field
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from an optional `checkout.toml` and
    /// `CHECKOUT__*` environment variables.
    pub fn from_env() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(File::with_name("checkout").required(false))
            .add_source(
                Environment::with_prefix("CHECKOUT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config: Config = builder
            .build()
            .context("Failed to read configuration sources")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port < 1024 {
            return Err(anyhow!(
                "Port must be at least 1024, got {}",
                self.server.port
            ));
        }

        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.server.environment.as_str()) {
            return Err(anyhow!(
                "Environment must be one of: {:?}, got {}",
                valid_environments,
                self.server.environment
            ));
        }

        if self.server.environment == "production" && self.payments.mode.is_sandbox() {
            tracing::warn!("Running production environment against sandbox providers");
        }

        if self.payments.timeout_secs == Some(0) {
            return Err(anyhow!("payments.timeout_secs must be greater than 0"));
        }

        if self.payments.merchant.reference_prefix.trim().is_empty() {
            return Err(anyhow!("payments.merchant.reference_prefix cannot be empty"));
        }

        let merchant = &self.payments.merchant;
        for (field, url) in [
            ("return_url", &merchant.return_url),
            ("cancel_url", &merchant.cancel_url),
        ] {
            if is_placeholder(url) {
                return Err(anyhow!(
                    "payments.merchant.{} is still a placeholder: {}",
                    field,
                    url
                ));
            }
        }

        Ok(())
    }
}
