use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Bounds the engine enforces on the externally simulated demand factor,
/// whatever the stored value says.
pub const DEMAND_FACTOR_FLOOR: f64 = 0.8;
pub const DEMAND_FACTOR_CEIL: f64 = 1.5;

/// Price multiplier from remaining availability.
///
/// Bands over the *available* fraction, upper edge of each lower band
/// inclusive: >80% -> 1.0, (50%, 80%] -> 1.2, (20%, 50%] -> 1.5,
/// <=20% -> 2.0. Compared in integer arithmetic so the 80/50/20 edges are
/// exact (8 of 10 seats free prices at 1.2, 2 of 10 at 2.0).
pub fn seat_factor(available_seats: i32, total_seats: i32) -> f64 {
    if total_seats <= 0 {
        return 1.0;
    }

    let available = i64::from(available_seats.max(0));
    let total = i64::from(total_seats);

    if available * 5 > total * 4 {
        1.0
    } else if available * 2 > total {
        1.2
    } else if available * 5 > total {
        1.5
    } else {
        2.0
    }
}

/// Price multiplier from time to departure: >7d -> 1.0, 3-7d -> 1.2,
/// 24h-3d -> 1.3, under 24h -> 1.5. A departed flight prices at 1.0.
pub fn time_factor(departure_time: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let until_departure = departure_time - now;

    if until_departure <= Duration::zero() {
        1.0
    } else if until_departure > Duration::days(7) {
        1.0
    } else if until_departure >= Duration::days(3) {
        1.2
    } else if until_departure >= Duration::hours(24) {
        1.3
    } else {
        1.5
    }
}

/// Clamp the external demand factor into the trusted band. Non-finite input
/// degrades to neutral.
pub fn clamp_demand(demand_factor: f64) -> f64 {
    if !demand_factor.is_finite() {
        return 1.0;
    }
    demand_factor.clamp(DEMAND_FACTOR_FLOOR, DEMAND_FACTOR_CEIL)
}

/// Full pricing breakdown. `final_price_cents` is computed from the factor
/// fields of this struct, so a quote and its breakdown cannot diverge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub base_price_cents: i32,
    pub seat_factor: f64,
    pub time_factor: f64,
    pub demand_factor: f64,
    pub final_price_cents: i32,
    pub available_seats: i32,
    pub total_seats: i32,
    pub hours_to_departure: i64,
}

/// Price a flight from explicit state. Pure: same inputs, same output.
pub fn breakdown(
    base_price_cents: i32,
    available_seats: i32,
    total_seats: i32,
    departure_time: DateTime<Utc>,
    now: DateTime<Utc>,
    demand_factor: f64,
) -> FareBreakdown {
    let seat = seat_factor(available_seats, total_seats);
    let time = time_factor(departure_time, now);
    let demand = clamp_demand(demand_factor);

    // Round half-up to the minor unit (f64::round is half-away-from-zero;
    // prices are non-negative).
    let final_price_cents = (f64::from(base_price_cents) * seat * time * demand).round() as i32;

    FareBreakdown {
        base_price_cents,
        seat_factor: seat,
        time_factor: time,
        demand_factor: demand,
        final_price_cents,
        available_seats,
        total_seats,
        hours_to_departure: (departure_time - now).num_hours(),
    }
}

/// The quote is the breakdown's final price, by construction.
pub fn quote(
    base_price_cents: i32,
    available_seats: i32,
    total_seats: i32,
    departure_time: DateTime<Utc>,
    now: DateTime<Utc>,
    demand_factor: f64,
) -> i32 {
    breakdown(
        base_price_cents,
        available_seats,
        total_seats,
        departure_time,
        now,
        demand_factor,
    )
    .final_price_cents
}
