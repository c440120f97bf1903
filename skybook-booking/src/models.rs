use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skybook_core::payment::PaymentStatus;
use skybook_shared::events::BookingChanged;
use skybook_shared::pii::Masked;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Seat claimed, awaiting passenger info.
    Pending,
    /// Passenger info attached, awaiting payment.
    InfoAdded,
    /// Payment succeeded, PNR issued. Stable, but cancellable.
    Confirmed,
    /// Terminal.
    Cancelled,
    /// Terminal: payment declined, seat released.
    Failed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::InfoAdded => "INFO_ADDED",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Failed)
    }

    pub fn can_add_info(&self) -> bool {
        matches!(self, BookingStatus::Pending)
    }

    pub fn can_pay(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::InfoAdded)
    }

    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::InfoAdded | BookingStatus::Confirmed
        )
    }

    /// Unpaid states whose seat hold may expire.
    pub fn holds_unpaid_seat(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::InfoAdded)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One booking record. Never deleted: cancellation is a status transition so
/// the audit trail survives. References flight and seat by id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub flight_id: Uuid,
    pub seat_no: String,
    pub status: BookingStatus,
    pub passenger_name: Option<String>,
    pub passenger_email: Option<Masked<String>>,
    /// Frozen at seat-claim time; immutable afterwards.
    pub final_price_cents: i32,
    pub currency: String,
    /// Assigned on confirmation, retained through a later cancellation.
    pub pnr: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Flat snapshot for the event channel. Passenger PII stays out.
    pub fn to_changed_event(&self) -> BookingChanged {
        BookingChanged {
            booking_id: self.id,
            user_id: self.user_id.clone(),
            flight_id: self.flight_id,
            seat_no: self.seat_no.clone(),
            status: self.status.as_str().to_string(),
            pnr: self.pnr.clone(),
            final_price_cents: self.final_price_cents,
            currency: self.currency.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Result of a payment attempt. A decline is a value, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub booking_id: Uuid,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub pnr: Option<String>,
    pub final_price_cents: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancellationOutcome {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub pnr: Option<String>,
    pub refund_cents: i32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BookingStats {
    pub total_bookings: usize,
    pub pending: usize,
    pub info_added: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub failed: usize,
    pub confirmed_revenue_cents: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_predicates_match_lifecycle() {
        assert!(BookingStatus::Pending.can_add_info());
        assert!(!BookingStatus::InfoAdded.can_add_info());

        assert!(BookingStatus::Pending.can_pay());
        assert!(BookingStatus::InfoAdded.can_pay());
        assert!(!BookingStatus::Confirmed.can_pay());
        assert!(!BookingStatus::Failed.can_pay());

        assert!(BookingStatus::Confirmed.can_cancel());
        assert!(!BookingStatus::Cancelled.can_cancel());
        assert!(!BookingStatus::Failed.can_cancel());

        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Failed.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let json = serde_json::to_string(&BookingStatus::InfoAdded).unwrap();
        assert_eq!(json, "\"INFO_ADDED\"");
    }
}
