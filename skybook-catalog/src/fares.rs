use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use uuid::Uuid;

/// One recorded fare observation for a flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareTick {
    pub price_cents: i32,
    pub demand_factor: f64,
    pub available_seats: i32,
    pub recorded_at: DateTime<Utc>,
}

const DEFAULT_CAP: usize = 256;

/// Per-flight ring of fare observations for the price-history endpoint.
pub struct FareHistory {
    cap: usize,
    ticks: RwLock<HashMap<Uuid, VecDeque<FareTick>>>,
}

impl FareHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAP)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            ticks: RwLock::new(HashMap::new()),
        }
    }

    pub fn record(&self, flight_id: Uuid, tick: FareTick) {
        let mut ticks = self.ticks.write().expect("fare history lock poisoned");
        let ring = ticks.entry(flight_id).or_default();
        if ring.len() == self.cap {
            ring.pop_front();
        }
        ring.push_back(tick);
    }

    /// Most recent ticks first, at most `limit`.
    pub fn recent(&self, flight_id: Uuid, limit: usize) -> Vec<FareTick> {
        let ticks = self.ticks.read().expect("fare history lock poisoned");
        match ticks.get(&flight_id) {
            None => Vec::new(),
            Some(ring) => ring.iter().rev().take(limit).cloned().collect(),
        }
    }
}

impl Default for FareHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tick(price: i32, minute: u32) -> FareTick {
        FareTick {
            price_cents: price,
            demand_factor: 1.0,
            available_seats: 100,
            recorded_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn recent_returns_newest_first() {
        let history = FareHistory::new();
        let flight_id = Uuid::new_v4();

        history.record(flight_id, tick(100, 1));
        history.record(flight_id, tick(110, 2));
        history.record(flight_id, tick(120, 3));

        let recent = history.recent(flight_id, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].price_cents, 120);
        assert_eq!(recent[1].price_cents, 110);
    }

    #[test]
    fn ring_is_capped() {
        let history = FareHistory::with_capacity(3);
        let flight_id = Uuid::new_v4();

        for i in 0..5 {
            history.record(flight_id, tick(100 + i, i as u32));
        }

        let recent = history.recent(flight_id, 10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].price_cents, 104);
        assert_eq!(recent[2].price_cents, 102);
    }

    #[test]
    fn unknown_flight_has_empty_history() {
        let history = FareHistory::new();
        assert!(history.recent(Uuid::new_v4(), 10).is_empty());
    }
}
