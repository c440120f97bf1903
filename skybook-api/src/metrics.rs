use axum::extract::State;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::state::AppState;

/// Counters for the booking funnel. Registration failures are programming
/// errors (duplicate names), so construction panics rather than limping on.
pub struct Metrics {
    registry: Registry,
    pub bookings_confirmed: IntCounter,
    pub payments_declined: IntCounter,
    pub seat_conflicts: IntCounter,
    pub holds_expired: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let bookings_confirmed = IntCounter::new(
            "skybook_bookings_confirmed_total",
            "Bookings that reached CONFIRMED",
        )
        .expect("metric definition");
        let payments_declined = IntCounter::new(
            "skybook_payments_declined_total",
            "Simulated payment declines",
        )
        .expect("metric definition");
        let seat_conflicts = IntCounter::new(
            "skybook_seat_conflicts_total",
            "Seat selections lost to a concurrent claim",
        )
        .expect("metric definition");
        let holds_expired = IntCounter::new(
            "skybook_holds_expired_total",
            "Unpaid seat holds released by the expiry sweeper",
        )
        .expect("metric definition");

        for counter in [
            &bookings_confirmed,
            &payments_declined,
            &seat_conflicts,
            &holds_expired,
        ] {
            registry
                .register(Box::new(counter.clone()))
                .expect("metric registration");
        }

        Self {
            registry,
            bookings_confirmed,
            payments_declined,
            seat_conflicts,
            holds_expired,
        }
    }

    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(err) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!("metrics encoding failed: {}", err);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn render_metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_render_in_text_format() {
        let metrics = Metrics::new();
        metrics.bookings_confirmed.inc();

        let rendered = metrics.render();
        assert!(rendered.contains("skybook_bookings_confirmed_total 1"));
    }
}
