use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use skybook_booking::{Booking, BookingError, BookingStatus};
use skybook_core::payment::{CardDetails, PaymentStatus};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::CustomerClaims;
use crate::state::AppState;

/// Customer-authenticated booking flow. The public PNR lookup lives outside
/// this router; see `lib.rs`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/select-seat", post(select_seat))
        .route("/v1/bookings/history", get(booking_history))
        .route(
            "/v1/bookings/{booking_id}",
            get(get_booking).delete(cancel_booking),
        )
        .route("/v1/bookings/{booking_id}/passenger", post(add_passenger_info))
        .route("/v1/bookings/{booking_id}/payment", post(process_payment))
}

// ============ Step 1: seat selection ============

#[derive(Debug, Deserialize)]
struct SeatSelectionRequest {
    flight_id: Uuid,
    seat_no: String,
}

#[derive(Debug, Serialize)]
struct SeatSelectionResponse {
    booking_id: Uuid,
    flight_id: Uuid,
    seat_no: String,
    status: BookingStatus,
    final_price_cents: i32,
    currency: String,
    message: String,
}

async fn select_seat(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(req): Json<SeatSelectionRequest>,
) -> Result<(StatusCode, Json<SeatSelectionResponse>), AppError> {
    let booking = state
        .engine
        .select_seat(&claims.sub, req.flight_id, &req.seat_no, Utc::now())
        .map_err(|err| {
            if matches!(err, BookingError::SeatUnavailable(_)) {
                state.metrics.seat_conflicts.inc();
            }
            AppError::from_booking(err)
        })?;

    let hold_minutes = state.business_rules.seat_hold_seconds / 60;
    Ok((
        StatusCode::CREATED,
        Json(SeatSelectionResponse {
            booking_id: booking.id,
            flight_id: booking.flight_id,
            seat_no: booking.seat_no.clone(),
            status: booking.status,
            final_price_cents: booking.final_price_cents,
            currency: booking.currency.clone(),
            message: format!(
                "Seat {} reserved. Please complete booking within {} minutes.",
                booking.seat_no, hold_minutes
            ),
        }),
    ))
}

// ============ Step 2: passenger info ============

#[derive(Debug, Deserialize)]
struct PassengerInfoRequest {
    passenger_name: String,
    passenger_email: String,
}

#[derive(Debug, Serialize)]
struct PassengerInfoResponse {
    booking_id: Uuid,
    status: BookingStatus,
    message: String,
}

async fn add_passenger_info(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<PassengerInfoRequest>,
) -> Result<Json<PassengerInfoResponse>, AppError> {
    let booking = state
        .engine
        .add_passenger_info(
            &claims.sub,
            booking_id,
            &req.passenger_name,
            &req.passenger_email,
            Utc::now(),
        )
        .map_err(AppError::from_booking)?;

    Ok(Json(PassengerInfoResponse {
        booking_id: booking.id,
        status: booking.status,
        message: "Passenger information added. Please proceed to payment.".to_string(),
    }))
}

// ============ Step 3: payment ============

#[derive(Debug, Deserialize)]
struct PaymentRequest {
    card_number: String,
    expiry_month: u32,
    expiry_year: i32,
    cvv: String,
}

#[derive(Debug, Serialize)]
struct PaymentResponse {
    booking_id: Uuid,
    payment_status: PaymentStatus,
    status: BookingStatus,
    pnr: Option<String>,
    final_price_cents: i32,
    message: String,
}

async fn process_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    let card = CardDetails {
        card_number: req.card_number,
        expiry_month: req.expiry_month,
        expiry_year: req.expiry_year,
        cvv: req.cvv,
    };

    let outcome = state
        .engine
        .process_payment(&claims.sub, booking_id, &card, Utc::now())
        .map_err(AppError::from_booking)?;

    let message = match outcome.payment_status {
        PaymentStatus::Success => {
            state.metrics.bookings_confirmed.inc();
            format!(
                "Payment successful! Your PNR is: {}",
                outcome.pnr.as_deref().unwrap_or_default()
            )
        }
        PaymentStatus::Failed => {
            state.metrics.payments_declined.inc();
            "Payment failed. The seat has been released; please start again.".to_string()
        }
    };

    Ok(Json(PaymentResponse {
        booking_id: outcome.booking_id,
        payment_status: outcome.payment_status,
        status: outcome.status,
        pnr: outcome.pnr,
        final_price_cents: outcome.final_price_cents,
        message,
    }))
}

// ============ Retrieval & cancellation ============

#[derive(Debug, Serialize)]
struct BookingHistoryResponse {
    bookings: Vec<Booking>,
    total_count: usize,
}

async fn booking_history(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Json<BookingHistoryResponse> {
    let bookings = state.engine.history(&claims.sub);
    let total_count = bookings.len();
    Json(BookingHistoryResponse {
        bookings,
        total_count,
    })
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .engine
        .get_owned(&claims.sub, booking_id)
        .map_err(AppError::from_booking)?;
    Ok(Json(booking))
}

/// Public PNR lookup; the code itself is the credential.
pub async fn lookup_by_pnr(
    State(state): State<AppState>,
    Path(pnr): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .engine
        .lookup_by_pnr(&pnr)
        .map_err(AppError::from_booking)?;
    Ok(Json(booking))
}

#[derive(Debug, Serialize)]
struct CancellationResponse {
    booking_id: Uuid,
    status: BookingStatus,
    pnr: Option<String>,
    refund_cents: i32,
    message: String,
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<CancellationResponse>, AppError> {
    let outcome = state
        .engine
        .cancel(&claims.sub, booking_id, Utc::now())
        .map_err(AppError::from_booking)?;

    Ok(Json(CancellationResponse {
        booking_id: outcome.booking_id,
        status: outcome.status,
        pnr: outcome.pnr,
        refund_cents: outcome.refund_cents,
        message: "Booking cancelled successfully".to_string(),
    }))
}
