use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::config::Mode;
use crate::payments::PaymentMethod;

#[derive(Serialize, Deserialize)]
pub struct ProviderHealth {
    pub method: PaymentMethod,
    pub configured: bool,
    pub available: bool,
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub mode: Mode,
    pub providers: Vec<ProviderHealth>,
}

pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let version = env!("CARGO_PKG_VERSION").to_string();
    let payments = state.gateway.config();

    let providers = PaymentMethod::ALL
        .into_iter()
        .map(|method| ProviderHealth {
            method,
            configured: payments.is_configured(method),
            available: state.gateway.is_available(method),
        })
        .collect();

    let response = HealthResponse {
        status: "healthy".to_string(),
        version,
        environment: state.config.server.environment.clone(),
        mode: payments.mode,
        providers,
    };

    Ok(Json(response))
}
