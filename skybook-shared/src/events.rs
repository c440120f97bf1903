use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Events broadcast by the booking engine. Consumed by the SSE stream,
/// the availability mirror and the archive sink.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    SeatHeld(SeatHeld),
    SeatReleased(SeatReleased),
    BookingChanged(BookingChanged),
    HoldExpired(HoldExpired),
    FareChanged(FareChanged),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SeatHeld {
    pub flight_id: Uuid,
    pub seat_no: String,
    pub booking_id: Uuid,
    pub held_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SeatReleased {
    pub flight_id: Uuid,
    pub seat_no: String,
    pub released_at: DateTime<Utc>,
}

/// Flat snapshot of a booking after a state transition. Carries everything
/// the archive needs so sinks never have to call back into the engine.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BookingChanged {
    pub booking_id: Uuid,
    pub user_id: String,
    pub flight_id: Uuid,
    pub seat_no: String,
    pub status: String,
    pub pnr: Option<String>,
    pub final_price_cents: i32,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HoldExpired {
    pub booking_id: Uuid,
    pub flight_id: Uuid,
    pub seat_no: String,
    pub expired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FareChanged {
    pub flight_id: Uuid,
    pub demand_factor: f64,
    pub price_cents: i32,
    pub recorded_at: DateTime<Utc>,
}
