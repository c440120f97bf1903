use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use skybook_catalog::flight::Flight;
use skybook_catalog::{FlightRegistry, SeatInventory};
use tracing::info;
use uuid::Uuid;

const AIRLINES: [(&str, &str); 6] = [
    ("IndiGo", "6E"),
    ("Air India", "AI"),
    ("SpiceJet", "SG"),
    ("Vistara", "UK"),
    ("GoAir", "G8"),
    ("AirAsia India", "I5"),
];

const CITIES: [&str; 10] = [
    "Delhi",
    "Mumbai",
    "Bangalore",
    "Chennai",
    "Kolkata",
    "Hyderabad",
    "Ahmedabad",
    "Pune",
    "Jaipur",
    "Lucknow",
];

const CABIN_SIZES: [i32; 3] = [120, 150, 180];

/// Populate the registry with sample flights so the service is explorable
/// straight after boot.
pub fn generate_sample_flights(
    flights: &FlightRegistry,
    seats: &SeatInventory,
    count: usize,
) {
    let mut rng = rand::thread_rng();
    let now = Utc::now();

    for index in 0..count {
        let (airline, prefix) = AIRLINES[rng.gen_range(0..AIRLINES.len())];
        let source = *CITIES.choose(&mut rng).unwrap_or(&CITIES[0]);
        let destination = loop {
            let city = *CITIES.choose(&mut rng).unwrap_or(&CITIES[1]);
            if city != source {
                break city;
            }
        };

        let departure = now
            + Duration::hours(rng.gen_range(6..24 * 10))
            + Duration::minutes(rng.gen_range(0..60));
        let duration_minutes = rng.gen_range(90..210);
        let total_seats = CABIN_SIZES[rng.gen_range(0..CABIN_SIZES.len())];

        let flight = Flight {
            id: Uuid::new_v4(),
            flight_number: format!("{}{}", prefix, 100 + index),
            airline: airline.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            departure_time: departure,
            arrival_time: departure + Duration::minutes(duration_minutes),
            base_price_cents: rng.gen_range(1500..6000) * 100,
            currency: "USD".to_string(),
            total_seats,
            demand_factor: 1.0,
        };

        let flight_id = flight.id;
        if flights.insert(flight).is_ok() {
            seats.register_flight(flight_id, total_seats);
        }
    }

    info!(flights = flights.len(), "seeded sample flights");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_requested_number_of_bookable_flights() {
        let flights = FlightRegistry::new();
        let seats = SeatInventory::new();

        generate_sample_flights(&flights, &seats, 10);

        assert_eq!(flights.len(), 10);
        for flight in flights.list() {
            assert!(flight.departure_time > Utc::now());
            assert_eq!(
                seats.available_count(flight.id).unwrap(),
                flight.total_seats
            );
        }
    }
}
