use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use skybook_booking::BookingStats;
use skybook_catalog::pricing;
use skybook_catalog::FareTick;
use skybook_shared::events::FareChanged;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Admin-authenticated operational surface. The demand-factor endpoint is
/// the write path the external demand simulator drives; flight CRUD stays
/// out of scope.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/flights/{flight_id}/demand", patch(set_demand_factor))
        .route("/v1/admin/stats", get(stats))
}

#[derive(Debug, Deserialize)]
struct DemandUpdateRequest {
    demand_factor: f64,
}

#[derive(Debug, Serialize)]
struct DemandUpdateResponse {
    flight_id: Uuid,
    flight_number: String,
    demand_factor: f64,
    current_price_cents: i32,
}

async fn set_demand_factor(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
    Json(req): Json<DemandUpdateRequest>,
) -> Result<Json<DemandUpdateResponse>, AppError> {
    let flight = state
        .flights
        .set_demand_factor(flight_id, req.demand_factor)
        .map_err(AppError::from_catalog)?;

    let now = Utc::now();
    let available = state
        .seats
        .available_count(flight_id)
        .map_err(AppError::from_seats)?;

    let price_cents = pricing::quote(
        flight.base_price_cents,
        available,
        flight.total_seats,
        flight.departure_time,
        now,
        flight.demand_factor,
    );

    // Every demand move leaves a fare tick for the price-history endpoint.
    state.fares.record(
        flight_id,
        FareTick {
            price_cents,
            demand_factor: flight.demand_factor,
            available_seats: available,
            recorded_at: now,
        },
    );
    state.engine.publish_fare_change(FareChanged {
        flight_id,
        demand_factor: flight.demand_factor,
        price_cents,
        recorded_at: now,
    });

    tracing::info!(%flight_id, demand_factor = flight.demand_factor, "demand factor updated");

    Ok(Json(DemandUpdateResponse {
        flight_id,
        flight_number: flight.flight_number,
        demand_factor: flight.demand_factor,
        current_price_cents: price_cents,
    }))
}

#[derive(Debug, Serialize)]
struct AdminStats {
    total_flights: usize,
    #[serde(flatten)]
    bookings: BookingStats,
}

async fn stats(State(state): State<AppState>) -> Json<AdminStats> {
    Json(AdminStats {
        total_flights: state.flights.len(),
        bookings: state.engine.stats(),
    })
}
