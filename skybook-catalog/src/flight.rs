use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// A scheduled flight. `demand_factor` is mutated by an external simulator;
/// pricing reads it fresh on every call and never caches it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub airline: String,
    pub source: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub base_price_cents: i32,
    pub currency: String,
    pub total_seats: i32,
    pub demand_factor: f64,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FlightQuery {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub min_price_cents: Option<i32>,
    pub max_price_cents: Option<i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Flight not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid flight: {0}")]
    InvalidFlight(String),

    #[error("Invalid demand factor: {0}")]
    InvalidDemandFactor(f64),
}

/// In-memory flight catalog. Reads hand out value snapshots so callers never
/// observe a flight mid-update.
pub struct FlightRegistry {
    flights: RwLock<HashMap<Uuid, Flight>>,
}

impl FlightRegistry {
    pub fn new() -> Self {
        Self {
            flights: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, flight: Flight) -> Result<(), CatalogError> {
        if flight.total_seats <= 0 {
            return Err(CatalogError::InvalidFlight(format!(
                "total_seats must be positive, got {}",
                flight.total_seats
            )));
        }
        if flight.base_price_cents < 0 {
            return Err(CatalogError::InvalidFlight(format!(
                "base_price_cents must be non-negative, got {}",
                flight.base_price_cents
            )));
        }
        if !flight.demand_factor.is_finite() || flight.demand_factor <= 0.0 {
            return Err(CatalogError::InvalidDemandFactor(flight.demand_factor));
        }
        if flight.arrival_time <= flight.departure_time {
            return Err(CatalogError::InvalidFlight(
                "arrival_time must be after departure_time".to_string(),
            ));
        }

        let mut flights = self.flights.write().expect("flight registry lock poisoned");
        flights.insert(flight.id, flight);
        Ok(())
    }

    pub fn get(&self, flight_id: Uuid) -> Option<Flight> {
        let flights = self.flights.read().expect("flight registry lock poisoned");
        flights.get(&flight_id).cloned()
    }

    pub fn list(&self) -> Vec<Flight> {
        let flights = self.flights.read().expect("flight registry lock poisoned");
        flights.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let flights = self.flights.read().expect("flight registry lock poisoned");
        flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Update the demand factor (the external simulator's write path) and
    /// return the updated flight snapshot.
    pub fn set_demand_factor(&self, flight_id: Uuid, factor: f64) -> Result<Flight, CatalogError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(CatalogError::InvalidDemandFactor(factor));
        }

        let mut flights = self.flights.write().expect("flight registry lock poisoned");
        let flight = flights
            .get_mut(&flight_id)
            .ok_or(CatalogError::NotFound(flight_id))?;
        flight.demand_factor = factor;
        Ok(flight.clone())
    }

    /// Search future flights matching the query, ordered by departure time.
    /// City filters are case-insensitive substring matches.
    pub fn search(&self, query: &FlightQuery, now: DateTime<Utc>) -> Vec<Flight> {
        let flights = self.flights.read().expect("flight registry lock poisoned");

        let mut matches: Vec<Flight> = flights
            .values()
            .filter(|f| f.departure_time > now)
            .filter(|f| match &query.source {
                Some(s) => f.source.to_lowercase().contains(&s.to_lowercase()),
                None => true,
            })
            .filter(|f| match &query.destination {
                Some(d) => f.destination.to_lowercase().contains(&d.to_lowercase()),
                None => true,
            })
            .filter(|f| match query.departure_date {
                Some(date) => f.departure_time.date_naive() == date,
                None => true,
            })
            .filter(|f| match query.min_price_cents {
                Some(min) => f.base_price_cents >= min,
                None => true,
            })
            .filter(|f| match query.max_price_cents {
                Some(max) => f.base_price_cents <= max,
                None => true,
            })
            .cloned()
            .collect();

        matches.sort_by_key(|f| f.departure_time);
        matches
    }
}

impl Default for FlightRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate seat labels for a cabin: row number + column letter, six
/// abreast (1A..1F, 2A..), truncated to `total_seats`.
pub fn seat_labels(total_seats: i32) -> Vec<String> {
    const COLUMNS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

    let total = total_seats.max(0) as usize;
    let rows = total.div_ceil(COLUMNS.len());

    let mut labels = Vec::with_capacity(total);
    'outer: for row in 1..=rows {
        for col in COLUMNS {
            if labels.len() == total {
                break 'outer;
            }
            labels.push(format!("{}{}", row, col));
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn flight(source: &str, destination: &str, departs_in_hours: i64, base: i32) -> Flight {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        Flight {
            id: Uuid::new_v4(),
            flight_number: "SB101".to_string(),
            airline: "Skybook Air".to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            departure_time: now + Duration::hours(departs_in_hours),
            arrival_time: now + Duration::hours(departs_in_hours + 2),
            base_price_cents: base,
            currency: "USD".to_string(),
            total_seats: 180,
            demand_factor: 1.0,
        }
    }

    #[test]
    fn insert_rejects_bad_invariants() {
        let registry = FlightRegistry::new();

        let mut f = flight("Delhi", "Mumbai", 48, 500000);
        f.total_seats = 0;
        assert!(registry.insert(f).is_err());

        let mut f = flight("Delhi", "Mumbai", 48, 500000);
        f.demand_factor = 0.0;
        assert!(registry.insert(f).is_err());

        let mut f = flight("Delhi", "Mumbai", 48, 500000);
        f.arrival_time = f.departure_time;
        assert!(registry.insert(f).is_err());
    }

    #[test]
    fn search_filters_and_sorts() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let registry = FlightRegistry::new();

        let late = flight("Delhi", "Mumbai", 72, 500000);
        let early = flight("Delhi", "Mumbai", 24, 450000);
        let other = flight("Pune", "Chennai", 24, 450000);
        let departed = flight("Delhi", "Mumbai", -2, 450000);

        for f in [late.clone(), early.clone(), other, departed] {
            registry.insert(f).unwrap();
        }

        let query = FlightQuery {
            source: Some("delhi".to_string()),
            destination: Some("Mum".to_string()),
            ..Default::default()
        };
        let results = registry.search(&query, now);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, early.id);
        assert_eq!(results[1].id, late.id);
    }

    #[test]
    fn search_respects_price_bounds() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let registry = FlightRegistry::new();
        registry.insert(flight("Delhi", "Mumbai", 24, 100000)).unwrap();
        registry.insert(flight("Delhi", "Mumbai", 24, 900000)).unwrap();

        let query = FlightQuery {
            max_price_cents: Some(500000),
            ..Default::default()
        };
        let results = registry.search(&query, now);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].base_price_cents, 100000);
    }

    #[test]
    fn demand_factor_update_is_validated() {
        let registry = FlightRegistry::new();
        let f = flight("Delhi", "Mumbai", 24, 100000);
        let id = f.id;
        registry.insert(f).unwrap();

        assert!(registry.set_demand_factor(id, -0.5).is_err());
        assert!(registry.set_demand_factor(id, f64::NAN).is_err());

        let updated = registry.set_demand_factor(id, 1.3).unwrap();
        assert_eq!(updated.demand_factor, 1.3);
        assert_eq!(registry.get(id).unwrap().demand_factor, 1.3);
    }

    #[test]
    fn seat_labels_cover_cabin() {
        let labels = seat_labels(10);
        assert_eq!(labels.len(), 10);
        assert_eq!(labels[0], "1A");
        assert_eq!(labels[5], "1F");
        assert_eq!(labels[6], "2A");
        assert_eq!(labels[9], "2D");

        assert!(seat_labels(0).is_empty());
    }
}
