use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::PaymentProcessor;
use shared::{DomainError, PaymentReceipt};

type DbPool = Pool<AsyncPgConnection>;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub booking_id: Uuid,
    pub method: String,
    pub reference: Option<String>,
}

/// The manual "I have paid" acknowledgment from the mobile-money flow.
#[derive(Debug, Deserialize)]
pub struct MobileMoneyAckRequest {
    pub booking_id: Uuid,
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WalletBalanceResponse {
    pub host_id: Uuid,
    pub available: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/payments/confirm", post(confirm_payment))
        .route("/payments/mobile-money/ack", post(mobile_money_ack))
        .route("/payments/:booking_id", get(get_payment))
        .route("/wallets/:host_id/balance", get(wallet_balance))
        .route("/wallets/:host_id/entries", get(wallet_entries))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

fn error_response(error: DomainError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        DomainError::BookingNotFound(_) | DomainError::ListingNotFound(_) => StatusCode::NOT_FOUND,
        DomainError::InvalidState { .. } => StatusCode::CONFLICT,
        DomainError::InvalidPropertyType(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Storage(_) | DomainError::Unavailable(_) => {
            tracing::error!("Request failed: {}", error);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<PaymentReceipt>, (StatusCode, Json<ErrorResponse>)> {
    PaymentProcessor::new(state.pool)
        .confirm_payment(request.booking_id, request.method, request.reference)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn mobile_money_ack(
    State(state): State<AppState>,
    Json(request): Json<MobileMoneyAckRequest>,
) -> Result<Json<PaymentReceipt>, (StatusCode, Json<ErrorResponse>)> {
    PaymentProcessor::new(state.pool)
        .confirm_payment(
            request.booking_id,
            "mobile_money".to_string(),
            request.reference,
        )
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<crate::models::Payment>, (StatusCode, Json<ErrorResponse>)> {
    match PaymentProcessor::new(state.pool).get_payment(booking_id).await {
        Ok(Some(payment)) => Ok(Json(payment)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no payment recorded for booking {}", booking_id),
            }),
        )),
        Err(error) => Err(error_response(error)),
    }
}

pub async fn wallet_entries(
    State(state): State<AppState>,
    Path(host_id): Path<Uuid>,
) -> Result<Json<Vec<crate::models::WalletEntry>>, (StatusCode, Json<ErrorResponse>)> {
    PaymentProcessor::new(state.pool)
        .wallet_entries_for(host_id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn wallet_balance(
    State(state): State<AppState>,
    Path(host_id): Path<Uuid>,
) -> Result<Json<WalletBalanceResponse>, (StatusCode, Json<ErrorResponse>)> {
    PaymentProcessor::new(state.pool)
        .wallet_balance(host_id)
        .await
        .map(|available| Json(WalletBalanceResponse { host_id, available }))
        .map_err(error_response)
}

pub async fn health_check() -> &'static str {
    "OK"
}
