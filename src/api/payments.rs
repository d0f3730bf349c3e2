use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::error::{ErrorKind, PaymentError};
use crate::payments::providers::StkQueryStatus;
use crate::payments::{PaymentForm, PaymentResult};

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Config => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Auth | ErrorKind::Network => StatusCode::BAD_GATEWAY,
        ErrorKind::ProviderRejected | ErrorKind::Verification => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::UserCancelled => StatusCode::CONFLICT,
        ErrorKind::UnsupportedMethod => StatusCode::BAD_REQUEST,
    }
}

pub struct ApiError(pub PaymentError);

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let body = Json(json!({
            "error": kind,
            "message": self.0.to_string(),
        }));
        (status_for(kind), body).into_response()
    }
}

pub async fn create_payment(
    State(state): State<AppState>,
    Json(form): Json<PaymentForm>,
) -> (StatusCode, Json<PaymentResult>) {
    let result = state.gateway.process(form).await;
    let status = match result.error_kind() {
        None => StatusCode::OK,
        Some(kind) => status_for(kind),
    };
    (status, Json(result))
}

#[derive(Serialize)]
pub struct MpesaStatusResponse {
    pub checkout_request_id: String,
    pub status: StkQueryStatus,
    pub payload: Value,
}

pub async fn mpesa_status(
    State(state): State<AppState>,
    Path(checkout_request_id): Path<String>,
) -> Result<Json<MpesaStatusResponse>, ApiError> {
    let payload = state
        .gateway
        .check_mobile_money_status(&checkout_request_id)
        .await?;

    Ok(Json(MpesaStatusResponse {
        status: StkQueryStatus::from_payload(&payload),
        checkout_request_id,
        payload,
    }))
}

pub async fn verify_flutterwave(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.gateway.verify_card_payment(&transaction_id).await?))
}

pub async fn verify_paypal(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.gateway.verify_wallet_order(&order_id).await?))
}
