use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::BookingCommands;
use shared::{
    BookingData, CommissionBreakdown, CreateBookingData, CreateInquiryData, DomainError,
    InquiryData, PropertyTypeRegistry,
};

type DbPool = Pool<AsyncPgConnection>;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub registry: PropertyTypeRegistry,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub listing_id: Uuid,
    pub room_id: Option<Uuid>,
    pub guest_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub total_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct RejectBookingRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateInquiryRequest {
    pub listing_id: Uuid,
    pub guest_id: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub property_type: String,
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/confirm", post(confirm_booking))
        .route("/bookings/:id/reject", post(reject_booking))
        .route("/bookings/:id/complete", post(complete_booking))
        .route("/bookings/:id/cancel", post(cancel_booking))
        .route("/commission/quote", get(commission_quote))
        .route("/inquiries", post(create_inquiry))
        .route("/listings/:id/inquiries", get(list_inquiries))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

fn commands(state: &AppState) -> BookingCommands {
    BookingCommands::new(state.pool.clone(), state.registry.clone())
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

pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<BookingData>, (StatusCode, Json<ErrorResponse>)> {
    let data = CreateBookingData {
        listing_id: request.listing_id,
        room_id: request.room_id,
        guest_id: request.guest_id,
        check_in: request.check_in,
        check_out: request.check_out,
        num_guests: request.num_guests,
        total_price: request.total_price,
    };
    commands(&state)
        .create_booking(data)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingData>, (StatusCode, Json<ErrorResponse>)> {
    commands(&state)
        .get_booking(id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn confirm_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingData>, (StatusCode, Json<ErrorResponse>)> {
    commands(&state)
        .confirm_booking(id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn reject_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectBookingRequest>,
) -> Result<Json<BookingData>, (StatusCode, Json<ErrorResponse>)> {
    commands(&state)
        .reject_booking(id, request.reason)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn complete_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingData>, (StatusCode, Json<ErrorResponse>)> {
    commands(&state)
        .complete_booking(id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingData>, (StatusCode, Json<ErrorResponse>)> {
    commands(&state)
        .cancel_booking(id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn commission_quote(
    State(state): State<AppState>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<CommissionBreakdown>, (StatusCode, Json<ErrorResponse>)> {
    commands(&state)
        .quote(&params.property_type, params.amount)
        .map(|breakdown| Json(breakdown.rounded()))
        .map_err(error_response)
}

pub async fn create_inquiry(
    State(state): State<AppState>,
    Json(request): Json<CreateInquiryRequest>,
) -> Result<Json<InquiryData>, (StatusCode, Json<ErrorResponse>)> {
    let data = CreateInquiryData {
        listing_id: request.listing_id,
        guest_id: request.guest_id,
        message: request.message,
    };
    commands(&state)
        .create_inquiry(data)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn list_inquiries(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<crate::models::Inquiry>>, (StatusCode, Json<ErrorResponse>)> {
    commands(&state)
        .list_inquiries(id)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn health_check() -> &'static str {
    "OK"
}
