use chrono::{DateTime, Duration, Utc};
use skybook_catalog::flight::FlightRegistry;
use skybook_catalog::pricing;
use skybook_catalog::seatmap::{SeatError, SeatInventory};
use skybook_core::payment::{self, CardDetails, PaymentStatus};
use skybook_shared::events::{
    BookingEvent, FareChanged, HoldExpired, SeatHeld, SeatReleased,
};
use skybook_shared::pii::Masked;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    Booking, BookingStats, BookingStatus, CancellationOutcome, PaymentOutcome,
};
use crate::pnr::{PnrAllocator, PnrError};
use crate::refund;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Flight not found: {0}")]
    FlightNotFound(Uuid),

    #[error("Cannot book a flight that has already departed")]
    FlightDeparted,

    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("No booking found with PNR {0}")]
    PnrNotFound(String),

    #[error("Invalid seat number: {0}")]
    UnknownSeat(String),

    #[error("Seat {0} is no longer available")]
    SeatUnavailable(String),

    #[error("Operation not allowed while booking is {0}")]
    InvalidState(BookingStatus),

    #[error("Booking does not belong to the requester")]
    Forbidden,

    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    PnrExhausted(#[from] PnrError),
}

/// Owns the booking lifecycle: seat claim, passenger info, payment,
/// confirmation, cancellation, hold expiry.
///
/// Bookings live behind their own mutex inside a shared map, so transitions
/// serialize per booking id; seat mutations go through the seat inventory's
/// per-flight critical section. Lock direction is always booking -> seats,
/// never the reverse.
pub struct BookingManager {
    flights: Arc<FlightRegistry>,
    seats: Arc<SeatInventory>,
    bookings: RwLock<HashMap<Uuid, Arc<Mutex<Booking>>>>,
    pnr_index: RwLock<HashMap<String, Uuid>>,
    pnr: PnrAllocator,
    events: broadcast::Sender<BookingEvent>,
}

impl BookingManager {
    pub fn new(flights: Arc<FlightRegistry>, seats: Arc<SeatInventory>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            flights,
            seats,
            bookings: RwLock::new(HashMap::new()),
            pnr_index: RwLock::new(HashMap::new()),
            pnr: PnrAllocator::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.events.subscribe()
    }

    /// Step 1: claim a seat and open a PENDING booking priced from the
    /// pre-claim availability. No booking is created if the claim loses.
    pub fn select_seat(
        &self,
        user_id: &str,
        flight_id: Uuid,
        seat_no: &str,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let flight = self
            .flights
            .get(flight_id)
            .ok_or(BookingError::FlightNotFound(flight_id))?;

        if flight.departure_time <= now {
            return Err(BookingError::FlightDeparted);
        }

        let booking_id = Uuid::new_v4();
        let remaining = match self.seats.claim(flight_id, seat_no, booking_id) {
            Ok(remaining) => remaining,
            Err(SeatError::AlreadyHeld { seat_no }) => {
                return Err(BookingError::SeatUnavailable(seat_no))
            }
            Err(SeatError::UnknownSeat { seat_no, .. }) => {
                return Err(BookingError::UnknownSeat(seat_no))
            }
            Err(SeatError::FlightNotFound(id)) => return Err(BookingError::FlightNotFound(id)),
        };

        // The claim won: a user re-selecting on the same flight abandons
        // their previous pending hold instead of stacking seats. A lost
        // claim must leave everything untouched, so this runs only now.
        self.supersede_pending(user_id, flight_id, now);

        let available_before_claim = remaining + 1;
        let final_price_cents = pricing::quote(
            flight.base_price_cents,
            available_before_claim,
            flight.total_seats,
            flight.departure_time,
            now,
            flight.demand_factor,
        );

        let booking = Booking {
            id: booking_id,
            user_id: user_id.to_string(),
            flight_id,
            seat_no: seat_no.to_string(),
            status: BookingStatus::Pending,
            passenger_name: None,
            passenger_email: None,
            final_price_cents,
            currency: flight.currency.clone(),
            pnr: None,
            created_at: now,
            updated_at: now,
        };

        {
            let mut bookings = self.bookings.write().expect("bookings lock poisoned");
            bookings.insert(booking_id, Arc::new(Mutex::new(booking.clone())));
        }

        info!(%booking_id, %flight_id, seat_no, "seat held");
        self.emit(BookingEvent::SeatHeld(SeatHeld {
            flight_id,
            seat_no: seat_no.to_string(),
            booking_id,
            held_at: now,
        }));
        self.emit(BookingEvent::BookingChanged(booking.to_changed_event()));

        Ok(booking)
    }

    /// Step 2: attach passenger info. Legal only from PENDING.
    pub fn add_passenger_info(
        &self,
        user_id: &str,
        booking_id: Uuid,
        passenger_name: &str,
        passenger_email: &str,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        validate_passenger(passenger_name, passenger_email)?;

        let entry = self.booking_entry(booking_id)?;
        let mut booking = entry.lock().expect("booking lock poisoned");

        // Lookups are owner-scoped: someone else's booking reads as absent.
        if booking.user_id != user_id {
            return Err(BookingError::BookingNotFound(booking_id));
        }
        if !booking.status.can_add_info() {
            return Err(BookingError::InvalidState(booking.status));
        }

        booking.passenger_name = Some(passenger_name.trim().to_string());
        booking.passenger_email = Some(Masked(passenger_email.trim().to_string()));
        booking.status = BookingStatus::InfoAdded;
        booking.updated_at = now;

        self.emit(BookingEvent::BookingChanged(booking.to_changed_event()));
        Ok(booking.clone())
    }

    /// Step 3: simulated payment. A plausible card confirms the booking and
    /// issues a PNR; anything else is a decline that releases the seat.
    /// Duplicate submissions serialize on the booking lock; the loser
    /// observes the new state as `InvalidState`.
    pub fn process_payment(
        &self,
        user_id: &str,
        booking_id: Uuid,
        card: &CardDetails,
        now: DateTime<Utc>,
    ) -> Result<PaymentOutcome, BookingError> {
        let entry = self.booking_entry(booking_id)?;
        let mut booking = entry.lock().expect("booking lock poisoned");

        if booking.user_id != user_id {
            return Err(BookingError::BookingNotFound(booking_id));
        }
        if !booking.status.can_pay() {
            return Err(BookingError::InvalidState(booking.status));
        }

        match payment::validate_card(card, now) {
            PaymentStatus::Success => {
                // Allocation failure aborts before any state changes, so the
                // booking stays payable.
                let code = self.pnr.allocate()?;

                booking.pnr = Some(code.clone());
                booking.status = BookingStatus::Confirmed;
                booking.updated_at = now;

                {
                    let mut index = self.pnr_index.write().expect("pnr index lock poisoned");
                    index.insert(code.clone(), booking.id);
                }

                info!(%booking_id, pnr = %code, "booking confirmed");
                self.emit(BookingEvent::BookingChanged(booking.to_changed_event()));

                Ok(PaymentOutcome {
                    booking_id: booking.id,
                    payment_status: PaymentStatus::Success,
                    status: booking.status,
                    pnr: Some(code),
                    final_price_cents: booking.final_price_cents,
                })
            }
            PaymentStatus::Failed => {
                booking.status = BookingStatus::Failed;
                booking.updated_at = now;
                self.release_seat(booking.flight_id, &booking.seat_no, now);

                info!(%booking_id, "payment declined, seat released");
                self.emit(BookingEvent::BookingChanged(booking.to_changed_event()));

                Ok(PaymentOutcome {
                    booking_id: booking.id,
                    payment_status: PaymentStatus::Failed,
                    status: booking.status,
                    pnr: None,
                    final_price_cents: booking.final_price_cents,
                })
            }
        }
    }

    /// Cancel a booking. Only the owner may cancel; legal from PENDING,
    /// INFO_ADDED and CONFIRMED. Refund is owed only when payment was taken.
    pub fn cancel(
        &self,
        user_id: &str,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CancellationOutcome, BookingError> {
        let entry = self.booking_entry(booking_id)?;
        let mut booking = entry.lock().expect("booking lock poisoned");

        if booking.user_id != user_id {
            return Err(BookingError::Forbidden);
        }
        match booking.status {
            BookingStatus::Cancelled => return Err(BookingError::AlreadyCancelled),
            BookingStatus::Failed => return Err(BookingError::InvalidState(booking.status)),
            _ => {}
        }

        let flight = self
            .flights
            .get(booking.flight_id)
            .ok_or(BookingError::FlightNotFound(booking.flight_id))?;

        let refund_cents = if booking.status == BookingStatus::Confirmed {
            refund::refund_amount(booking.final_price_cents, flight.departure_time, now)
        } else {
            0
        };

        self.release_seat(booking.flight_id, &booking.seat_no, now);
        booking.status = BookingStatus::Cancelled;
        booking.updated_at = now;

        info!(%booking_id, refund_cents, "booking cancelled");
        self.emit(BookingEvent::BookingChanged(booking.to_changed_event()));

        Ok(CancellationOutcome {
            booking_id: booking.id,
            status: booking.status,
            pnr: booking.pnr.clone(),
            refund_cents,
        })
    }

    /// Public lookup; the PNR itself is the credential.
    pub fn lookup_by_pnr(&self, pnr: &str) -> Result<Booking, BookingError> {
        let code = pnr.trim().to_uppercase();
        let booking_id = {
            let index = self.pnr_index.read().expect("pnr index lock poisoned");
            index
                .get(&code)
                .copied()
                .ok_or_else(|| BookingError::PnrNotFound(code.clone()))?
        };

        let entry = self.booking_entry(booking_id)?;
        let booking = entry.lock().expect("booking lock poisoned");
        Ok(booking.clone())
    }

    /// Owner-scoped read.
    pub fn get_owned(&self, user_id: &str, booking_id: Uuid) -> Result<Booking, BookingError> {
        let entry = self.booking_entry(booking_id)?;
        let booking = entry.lock().expect("booking lock poisoned");
        if booking.user_id != user_id {
            return Err(BookingError::BookingNotFound(booking_id));
        }
        Ok(booking.clone())
    }

    /// All of a user's bookings, newest first.
    pub fn history(&self, user_id: &str) -> Vec<Booking> {
        let mut result: Vec<Booking> = self
            .snapshot_entries()
            .into_iter()
            .filter_map(|entry| {
                let booking = entry.lock().expect("booking lock poisoned");
                (booking.user_id == user_id).then(|| booking.clone())
            })
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    pub fn stats(&self) -> BookingStats {
        let mut stats = BookingStats::default();
        for entry in self.snapshot_entries() {
            let booking = entry.lock().expect("booking lock poisoned");
            stats.total_bookings += 1;
            match booking.status {
                BookingStatus::Pending => stats.pending += 1,
                BookingStatus::InfoAdded => stats.info_added += 1,
                BookingStatus::Confirmed => {
                    stats.confirmed += 1;
                    stats.confirmed_revenue_cents += i64::from(booking.final_price_cents);
                }
                BookingStatus::Cancelled => stats.cancelled += 1,
                BookingStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// Cancel unpaid holds older than `max_age`, releasing their seats.
    /// Returns how many holds were expired.
    pub fn expire_stale_holds(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - max_age;
        let mut expired = 0;

        for entry in self.snapshot_entries() {
            let mut booking = entry.lock().expect("booking lock poisoned");
            if !booking.status.holds_unpaid_seat() || booking.created_at > cutoff {
                continue;
            }

            self.release_seat(booking.flight_id, &booking.seat_no, now);
            booking.status = BookingStatus::Cancelled;
            booking.updated_at = now;
            expired += 1;

            info!(booking_id = %booking.id, seat_no = %booking.seat_no, "hold expired");
            self.emit(BookingEvent::HoldExpired(HoldExpired {
                booking_id: booking.id,
                flight_id: booking.flight_id,
                seat_no: booking.seat_no.clone(),
                expired_at: now,
            }));
            self.emit(BookingEvent::BookingChanged(booking.to_changed_event()));
        }

        expired
    }

    /// Broadcast a fare observation (the demand mutator's notification path).
    pub fn publish_fare_change(&self, change: FareChanged) {
        self.emit(BookingEvent::FareChanged(change));
    }

    fn booking_entry(&self, booking_id: Uuid) -> Result<Arc<Mutex<Booking>>, BookingError> {
        let bookings = self.bookings.read().expect("bookings lock poisoned");
        bookings
            .get(&booking_id)
            .cloned()
            .ok_or(BookingError::BookingNotFound(booking_id))
    }

    fn snapshot_entries(&self) -> Vec<Arc<Mutex<Booking>>> {
        let bookings = self.bookings.read().expect("bookings lock poisoned");
        bookings.values().cloned().collect()
    }

    /// Cancel the user's earlier PENDING hold on this flight, if any.
    fn supersede_pending(&self, user_id: &str, flight_id: Uuid, now: DateTime<Utc>) {
        for entry in self.snapshot_entries() {
            let mut booking = entry.lock().expect("booking lock poisoned");
            if booking.user_id != user_id
                || booking.flight_id != flight_id
                || booking.status != BookingStatus::Pending
            {
                continue;
            }

            self.release_seat(booking.flight_id, &booking.seat_no, now);
            booking.status = BookingStatus::Cancelled;
            booking.updated_at = now;

            info!(booking_id = %booking.id, "pending hold superseded by new selection");
            self.emit(BookingEvent::BookingChanged(booking.to_changed_event()));
        }
    }

    fn release_seat(&self, flight_id: Uuid, seat_no: &str, now: DateTime<Utc>) {
        match self.seats.release(flight_id, seat_no) {
            Ok(()) => self.emit(BookingEvent::SeatReleased(SeatReleased {
                flight_id,
                seat_no: seat_no.to_string(),
                released_at: now,
            })),
            Err(err) => warn!(%flight_id, seat_no, %err, "seat release failed"),
        }
    }

    fn emit(&self, event: BookingEvent) {
        // No subscribers is fine; the engine works standalone.
        let _ = self.events.send(event);
    }
}

fn validate_passenger(name: &str, email: &str) -> Result<(), BookingError> {
    if name.trim().len() < 2 {
        return Err(BookingError::Validation(
            "passenger_name must be at least 2 characters".to_string(),
        ));
    }

    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(BookingError::Validation(format!(
            "passenger_email is not a valid address: {}",
            email
        ))),
    }
}
