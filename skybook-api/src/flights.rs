use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use skybook_catalog::flight::{Flight, FlightQuery};
use skybook_catalog::pricing::{self, FareBreakdown};
use skybook_catalog::{FareTick, SeatAvailability};
use skybook_shared::events::BookingEvent;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights", get(search_flights))
        .route("/v1/flights/{flight_id}", get(flight_details))
        .route("/v1/flights/{flight_id}/seats", get(seat_availability))
        .route("/v1/flights/{flight_id}/pricing", get(pricing_breakdown))
        .route("/v1/flights/{flight_id}/fares", get(fare_history))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    source: Option<String>,
    destination: Option<String>,
    departure_date: Option<NaiveDate>,
    min_price_cents: Option<i32>,
    max_price_cents: Option<i32>,
}

#[derive(Debug, Serialize)]
struct FlightSummary {
    id: Uuid,
    flight_number: String,
    airline: String,
    source: String,
    destination: String,
    departure_time: chrono::DateTime<Utc>,
    arrival_time: chrono::DateTime<Utc>,
    base_price_cents: i32,
    dynamic_price_cents: i32,
    currency: String,
    total_seats: i32,
    available_seats: i32,
    duration_minutes: i64,
}

#[derive(Debug, Serialize)]
struct FlightListResponse {
    flights: Vec<FlightSummary>,
    total_count: usize,
}

#[derive(Debug, Serialize)]
struct FlightDetailResponse {
    #[serde(flatten)]
    summary: FlightSummary,
    available_seat_list: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PricingResponse {
    flight_id: Uuid,
    flight_number: String,
    #[serde(flatten)]
    breakdown: FareBreakdown,
}

#[derive(Debug, Serialize)]
struct FareHistoryResponse {
    flight_id: Uuid,
    flight_number: String,
    history: Vec<FareTick>,
}

fn summarize(flight: &Flight, available: i32, now: chrono::DateTime<Utc>) -> FlightSummary {
    let dynamic_price_cents = pricing::quote(
        flight.base_price_cents,
        available,
        flight.total_seats,
        flight.departure_time,
        now,
        flight.demand_factor,
    );

    FlightSummary {
        id: flight.id,
        flight_number: flight.flight_number.clone(),
        airline: flight.airline.clone(),
        source: flight.source.clone(),
        destination: flight.destination.clone(),
        departure_time: flight.departure_time,
        arrival_time: flight.arrival_time,
        base_price_cents: flight.base_price_cents,
        dynamic_price_cents,
        currency: flight.currency.clone(),
        total_seats: flight.total_seats,
        available_seats: available,
        duration_minutes: (flight.arrival_time - flight.departure_time).num_minutes(),
    }
}

/// Search future flights, decorated with the live dynamic price. Sold-out
/// flights are omitted, matching the booking flow's reality.
async fn search_flights(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<FlightListResponse>, AppError> {
    let query = FlightQuery {
        source: params.source,
        destination: params.destination,
        departure_date: params.departure_date,
        min_price_cents: params.min_price_cents,
        max_price_cents: params.max_price_cents,
    };

    let now = Utc::now();
    let flights = state.flights.search(&query, now);
    let mut summaries = Vec::with_capacity(flights.len());
    for flight in &flights {
        let available = state
            .seats
            .available_count(flight.id)
            .map_err(AppError::from_seats)?;
        if available > 0 {
            summaries.push(summarize(flight, available, now));
        }
    }

    let total_count = summaries.len();
    Ok(Json(FlightListResponse {
        flights: summaries,
        total_count,
    }))
}

async fn flight_details(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<FlightDetailResponse>, AppError> {
    let flight = state
        .flights
        .get(flight_id)
        .ok_or_else(|| AppError::NotFoundError("Flight not found".to_string()))?;

    let availability = state
        .seats
        .availability(flight_id)
        .map_err(AppError::from_seats)?;

    Ok(Json(FlightDetailResponse {
        summary: summarize(&flight, availability.available_count, Utc::now()),
        available_seat_list: availability.available_seats,
    }))
}

async fn seat_availability(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<SeatAvailability>, AppError> {
    // 404 for unknown flights rather than an empty map.
    state
        .flights
        .get(flight_id)
        .ok_or_else(|| AppError::NotFoundError("Flight not found".to_string()))?;

    let availability = state
        .seats
        .availability(flight_id)
        .map_err(AppError::from_seats)?;
    Ok(Json(availability))
}

/// The transparency endpoint: the same function that prices bookings
/// produces this breakdown, so the numbers cannot diverge.
async fn pricing_breakdown(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<PricingResponse>, AppError> {
    let flight = state
        .flights
        .get(flight_id)
        .ok_or_else(|| AppError::NotFoundError("Flight not found".to_string()))?;

    let available = state
        .seats
        .available_count(flight_id)
        .map_err(AppError::from_seats)?;

    let breakdown = pricing::breakdown(
        flight.base_price_cents,
        available,
        flight.total_seats,
        flight.departure_time,
        Utc::now(),
        flight.demand_factor,
    );

    Ok(Json(PricingResponse {
        flight_id,
        flight_number: flight.flight_number,
        breakdown,
    }))
}

async fn fare_history(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<FareHistoryResponse>, AppError> {
    let flight = state
        .flights
        .get(flight_id)
        .ok_or_else(|| AppError::NotFoundError("Flight not found".to_string()))?;

    let history = state
        .fares
        .recent(flight_id, state.business_rules.fare_history_limit);

    Ok(Json(FareHistoryResponse {
        flight_id,
        flight_number: flight.flight_number,
        history,
    }))
}

/// Live seat events for one flight, as SSE. Lets a seat-map UI grey out a
/// seat the moment someone else holds it.
pub async fn seat_stream(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    state
        .flights
        .get(flight_id)
        .ok_or_else(|| AppError::NotFoundError("Flight not found".to_string()))?;

    let rx = state.engine.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let event = result.ok()?;
        let (name, event_flight) = match &event {
            BookingEvent::SeatHeld(e) => ("seat_held", e.flight_id),
            BookingEvent::SeatReleased(e) => ("seat_released", e.flight_id),
            BookingEvent::HoldExpired(e) => ("hold_expired", e.flight_id),
            _ => return None,
        };
        if event_flight != flight_id {
            return None;
        }
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok::<_, Infallible>(Event::default().event(name).data(data)))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
