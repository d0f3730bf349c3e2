pub mod health;
pub mod payments;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::payments::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<PaymentGateway>,
}

impl AppState {
    pub fn new(config: Config, gateway: PaymentGateway) -> Self {
        Self {
            config,
            gateway: Arc::new(gateway),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/payments", post(payments::create_payment))
        .route(
            "/payments/mpesa/:checkout_request_id/status",
            get(payments::mpesa_status),
        )
        .route(
            "/payments/flutterwave/:transaction_id/verify",
            get(payments::verify_flutterwave),
        )
        .route(
            "/payments/paypal/:order_id/verify",
            get(payments::verify_paypal),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
