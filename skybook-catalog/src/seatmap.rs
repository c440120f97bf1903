use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

use crate::flight::seat_labels;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SeatState {
    Available,
    Held { booking_id: Uuid },
}

/// Occupancy for one flight. Claims and releases go through the owning
/// flight's mutex, so every mutation is a serialized compare-and-set.
#[derive(Debug)]
struct SeatMap {
    total_seats: i32,
    available: i32,
    seats: BTreeMap<String, SeatState>,
}

/// Read-only snapshot of a flight's occupancy.
#[derive(Debug, Clone, Serialize)]
pub struct SeatAvailability {
    pub flight_id: Uuid,
    pub total_seats: i32,
    pub available_count: i32,
    pub available_seats: Vec<String>,
    pub booked_seats: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SeatError {
    #[error("Flight not found: {0}")]
    FlightNotFound(Uuid),

    #[error("Unknown seat {seat_no} on flight {flight_id}")]
    UnknownSeat { flight_id: Uuid, seat_no: String },

    #[error("Seat {seat_no} is already held")]
    AlreadyHeld { seat_no: String },
}

/// Source of truth for seat occupancy. One mutex per flight: the
/// single-writer-per-flight strategy, which keeps claim/release trivially
/// linearizable for a given (flight, seat) pair.
pub struct SeatInventory {
    flights: RwLock<HashMap<Uuid, Arc<Mutex<SeatMap>>>>,
}

impl SeatInventory {
    pub fn new() -> Self {
        Self {
            flights: RwLock::new(HashMap::new()),
        }
    }

    /// Initialize the seat map for a flight. A no-op if already registered,
    /// so re-seeding never wipes live holds.
    pub fn register_flight(&self, flight_id: Uuid, total_seats: i32) {
        let mut flights = self.flights.write().expect("seat inventory lock poisoned");
        flights.entry(flight_id).or_insert_with(|| {
            let seats = seat_labels(total_seats)
                .into_iter()
                .map(|label| (label, SeatState::Available))
                .collect::<BTreeMap<_, _>>();
            Arc::new(Mutex::new(SeatMap {
                total_seats,
                available: total_seats,
                seats,
            }))
        });
    }

    fn seat_map(&self, flight_id: Uuid) -> Result<Arc<Mutex<SeatMap>>, SeatError> {
        let flights = self.flights.read().expect("seat inventory lock poisoned");
        flights
            .get(&flight_id)
            .cloned()
            .ok_or(SeatError::FlightNotFound(flight_id))
    }

    /// Atomically mark a seat HELD by `booking_id` if it is currently
    /// available. Two concurrent claims on the same seat yield exactly one
    /// success. Returns the number of seats still available after the claim.
    pub fn claim(&self, flight_id: Uuid, seat_no: &str, booking_id: Uuid) -> Result<i32, SeatError> {
        let map = self.seat_map(flight_id)?;
        let mut map = map.lock().expect("seat map lock poisoned");

        match map.seats.get(seat_no) {
            None => Err(SeatError::UnknownSeat {
                flight_id,
                seat_no: seat_no.to_string(),
            }),
            Some(SeatState::Held { .. }) => Err(SeatError::AlreadyHeld {
                seat_no: seat_no.to_string(),
            }),
            Some(SeatState::Available) => {
                map.seats
                    .insert(seat_no.to_string(), SeatState::Held { booking_id });
                map.available -= 1;
                Ok(map.available)
            }
        }
    }

    /// Mark a seat available again. Releasing an already-available seat is a
    /// no-op, so retries after a partial failure are safe.
    pub fn release(&self, flight_id: Uuid, seat_no: &str) -> Result<(), SeatError> {
        let map = self.seat_map(flight_id)?;
        let mut map = map.lock().expect("seat map lock poisoned");

        match map.seats.get(seat_no) {
            None => Err(SeatError::UnknownSeat {
                flight_id,
                seat_no: seat_no.to_string(),
            }),
            Some(SeatState::Available) => Ok(()),
            Some(SeatState::Held { .. }) => {
                map.seats
                    .insert(seat_no.to_string(), SeatState::Available);
                map.available += 1;
                Ok(())
            }
        }
    }

    pub fn availability(&self, flight_id: Uuid) -> Result<SeatAvailability, SeatError> {
        let map = self.seat_map(flight_id)?;
        let map = map.lock().expect("seat map lock poisoned");

        let mut available_seats = Vec::new();
        let mut booked_seats = Vec::new();
        for (label, state) in &map.seats {
            match state {
                SeatState::Available => available_seats.push(label.clone()),
                SeatState::Held { .. } => booked_seats.push(label.clone()),
            }
        }

        Ok(SeatAvailability {
            flight_id,
            total_seats: map.total_seats,
            available_count: map.available,
            available_seats,
            booked_seats,
        })
    }

    pub fn available_count(&self, flight_id: Uuid) -> Result<i32, SeatError> {
        let map = self.seat_map(flight_id)?;
        let map = map.lock().expect("seat map lock poisoned");
        Ok(map.available)
    }

    /// Which booking currently holds a seat, if any.
    pub fn holder(&self, flight_id: Uuid, seat_no: &str) -> Result<Option<Uuid>, SeatError> {
        let map = self.seat_map(flight_id)?;
        let map = map.lock().expect("seat map lock poisoned");

        match map.seats.get(seat_no) {
            None => Err(SeatError::UnknownSeat {
                flight_id,
                seat_no: seat_no.to_string(),
            }),
            Some(SeatState::Available) => Ok(None),
            Some(SeatState::Held { booking_id }) => Ok(Some(*booking_id)),
        }
    }
}

impl Default for SeatInventory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn inventory_with_flight(total_seats: i32) -> (SeatInventory, Uuid) {
        let inventory = SeatInventory::new();
        let flight_id = Uuid::new_v4();
        inventory.register_flight(flight_id, total_seats);
        (inventory, flight_id)
    }

    #[test]
    fn claim_and_release_cycle() {
        let (inventory, flight_id) = inventory_with_flight(12);
        let booking_id = Uuid::new_v4();

        let remaining = inventory.claim(flight_id, "1A", booking_id).unwrap();
        assert_eq!(remaining, 11);
        assert_eq!(inventory.holder(flight_id, "1A").unwrap(), Some(booking_id));

        inventory.release(flight_id, "1A").unwrap();
        assert_eq!(inventory.available_count(flight_id).unwrap(), 12);
        assert_eq!(inventory.holder(flight_id, "1A").unwrap(), None);
    }

    #[test]
    fn second_claim_on_held_seat_fails_and_state_is_unchanged() {
        let (inventory, flight_id) = inventory_with_flight(12);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        inventory.claim(flight_id, "2C", first).unwrap();
        let err = inventory.claim(flight_id, "2C", second).unwrap_err();
        assert!(matches!(err, SeatError::AlreadyHeld { .. }));

        // Loser must not have disturbed the winner's hold.
        assert_eq!(inventory.holder(flight_id, "2C").unwrap(), Some(first));
        assert_eq!(inventory.available_count(flight_id).unwrap(), 11);
    }

    #[test]
    fn release_is_idempotent() {
        let (inventory, flight_id) = inventory_with_flight(6);
        inventory.claim(flight_id, "1B", Uuid::new_v4()).unwrap();

        inventory.release(flight_id, "1B").unwrap();
        inventory.release(flight_id, "1B").unwrap();
        assert_eq!(inventory.available_count(flight_id).unwrap(), 6);
    }

    #[test]
    fn unknown_seat_and_flight_are_rejected() {
        let (inventory, flight_id) = inventory_with_flight(6);

        assert!(matches!(
            inventory.claim(flight_id, "99Z", Uuid::new_v4()),
            Err(SeatError::UnknownSeat { .. })
        ));
        assert!(matches!(
            inventory.claim(Uuid::new_v4(), "1A", Uuid::new_v4()),
            Err(SeatError::FlightNotFound(_))
        ));
    }

    #[test]
    fn availability_snapshot_matches_holds() {
        let (inventory, flight_id) = inventory_with_flight(6);
        inventory.claim(flight_id, "1A", Uuid::new_v4()).unwrap();
        inventory.claim(flight_id, "1D", Uuid::new_v4()).unwrap();

        let snapshot = inventory.availability(flight_id).unwrap();
        assert_eq!(snapshot.total_seats, 6);
        assert_eq!(snapshot.available_count, 4);
        assert_eq!(snapshot.booked_seats, vec!["1A", "1D"]);
        assert!(!snapshot.available_seats.contains(&"1A".to_string()));
    }

    #[test]
    fn concurrent_claims_on_same_seat_yield_one_winner() {
        let (inventory, flight_id) = inventory_with_flight(30);
        let inventory = Arc::new(inventory);
        let successes = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let inventory = inventory.clone();
                let successes = successes.clone();
                std::thread::spawn(move || {
                    if inventory.claim(flight_id, "3C", Uuid::new_v4()).is_ok() {
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert_eq!(inventory.available_count(flight_id).unwrap(), 29);
    }
}
