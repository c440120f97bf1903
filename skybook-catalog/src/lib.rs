pub mod fares;
pub mod flight;
pub mod pricing;
pub mod seatmap;

pub use fares::{FareHistory, FareTick};
pub use flight::{seat_labels, CatalogError, Flight, FlightQuery, FlightRegistry};
pub use pricing::{quote, FareBreakdown};
pub use seatmap::{SeatAvailability, SeatError, SeatInventory};
