pub mod manager;
pub mod models;
pub mod pnr;
pub mod refund;

pub use manager::{BookingError, BookingManager};
pub use models::{Booking, BookingStats, BookingStatus, CancellationOutcome, PaymentOutcome};
pub use pnr::{PnrAllocator, PnrError};
pub use refund::refund_amount;
