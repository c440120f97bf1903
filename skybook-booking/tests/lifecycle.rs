use chrono::{DateTime, Duration, TimeZone, Utc};
use skybook_booking::{BookingError, BookingManager, BookingStatus};
use skybook_catalog::flight::{Flight, FlightRegistry};
use skybook_catalog::seatmap::SeatInventory;
use skybook_core::payment::CardDetails;
use skybook_shared::events::BookingEvent;
use std::sync::Arc;
use uuid::Uuid;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
}

fn valid_card() -> CardDetails {
    CardDetails {
        card_number: "4111111111111111".to_string(),
        expiry_month: 12,
        expiry_year: 2030,
        cvv: "123".to_string(),
    }
}

fn setup(total_seats: i32) -> (Arc<BookingManager>, Arc<SeatInventory>, Uuid) {
    let flights = Arc::new(FlightRegistry::new());
    let seats = Arc::new(SeatInventory::new());

    let departure = fixed_now() + Duration::hours(36);
    let flight = Flight {
        id: Uuid::new_v4(),
        flight_number: "SB808".to_string(),
        airline: "Skybook Air".to_string(),
        source: "Bangalore".to_string(),
        destination: "Kolkata".to_string(),
        departure_time: departure,
        arrival_time: departure + Duration::hours(2),
        base_price_cents: 250000,
        currency: "USD".to_string(),
        total_seats,
        demand_factor: 1.0,
    };
    let flight_id = flight.id;
    flights.insert(flight).unwrap();
    seats.register_flight(flight_id, total_seats);

    (
        Arc::new(BookingManager::new(flights, seats.clone())),
        seats,
        flight_id,
    )
}

#[test]
fn concurrent_seat_selection_admits_exactly_one_booking() {
    let (manager, seats, flight_id) = setup(60);

    let handles: Vec<_> = (0..24)
        .map(|i| {
            let manager = manager.clone();
            std::thread::spawn(move || {
                manager.select_seat(&format!("user-{}", i), flight_id, "7F", fixed_now())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one claim must win");
    for result in &results {
        if let Err(err) = result {
            assert!(matches!(err, BookingError::SeatUnavailable(_)));
        }
    }

    assert_eq!(seats.available_count(flight_id).unwrap(), 59);
}

#[test]
fn full_flow_emits_events_and_survives_cancel_reclaim() {
    let (manager, _seats, flight_id) = setup(30);
    let mut events = manager.subscribe();

    // Select -> info -> pay.
    let booking = manager
        .select_seat("traveller", flight_id, "4B", fixed_now())
        .unwrap();
    manager
        .add_passenger_info(
            "traveller",
            booking.id,
            "Asha Rao",
            "asha@example.com",
            fixed_now(),
        )
        .unwrap();
    let outcome = manager
        .process_payment("traveller", booking.id, &valid_card(), fixed_now())
        .unwrap();
    let pnr = outcome.pnr.expect("confirmed booking has a pnr");

    // Public PNR lookup works without ownership.
    let found = manager.lookup_by_pnr(&pnr).unwrap();
    assert_eq!(found.status, BookingStatus::Confirmed);

    // Cancel releases the seat; a different user can claim it again.
    manager.cancel("traveller", booking.id, fixed_now()).unwrap();
    let reclaimed = manager
        .select_seat("next-traveller", flight_id, "4B", fixed_now())
        .unwrap();
    assert_eq!(reclaimed.seat_no, "4B");

    // The event stream saw the seat go held -> released -> held.
    let mut seat_events = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            BookingEvent::SeatHeld(e) if e.seat_no == "4B" => seat_events.push("held"),
            BookingEvent::SeatReleased(e) if e.seat_no == "4B" => seat_events.push("released"),
            _ => {}
        }
    }
    assert_eq!(seat_events, vec!["held", "released", "held"]);
}

#[test]
fn expiry_sweep_unblocks_abandoned_carts() {
    let (manager, seats, flight_id) = setup(12);

    let abandoned = manager
        .select_seat("ghost", flight_id, "2A", fixed_now())
        .unwrap();
    manager
        .add_passenger_info("ghost", abandoned.id, "Gone Ghost", "gone@example.com", fixed_now())
        .unwrap();

    let later = fixed_now() + Duration::minutes(30);
    let expired = manager.expire_stale_holds(Duration::minutes(15), later);
    assert_eq!(expired, 1);
    assert_eq!(seats.holder(flight_id, "2A").unwrap(), None);

    // The abandoned seat is bookable again.
    manager.select_seat("keen", flight_id, "2A", later).unwrap();
}
