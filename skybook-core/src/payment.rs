use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Success,
    Failed,
}

/// Card details as submitted by the caller. Never logged; the number is only
/// inspected for plausibility, not stored.
#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    pub card_number: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub cvv: String,
}

/// Simulated payment decision: a plausible card is charged, anything else is
/// a decline. A decline is a normal business outcome, not an error.
pub fn validate_card(card: &CardDetails, now: DateTime<Utc>) -> PaymentStatus {
    if card.card_number.len() != 16 || !card.card_number.bytes().all(|b| b.is_ascii_digit()) {
        return PaymentStatus::Failed;
    }

    if !(1..=12).contains(&card.expiry_month) {
        return PaymentStatus::Failed;
    }

    if card.cvv.len() < 3 || card.cvv.len() > 4 || !card.cvv.bytes().all(|b| b.is_ascii_digit()) {
        return PaymentStatus::Failed;
    }

    // Card must not be expired: valid through the end of its expiry month.
    if card.expiry_year < now.year()
        || (card.expiry_year == now.year() && card.expiry_month < now.month())
    {
        return PaymentStatus::Failed;
    }

    PaymentStatus::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn card(number: &str, month: u32, year: i32, cvv: &str) -> CardDetails {
        CardDetails {
            card_number: number.to_string(),
            expiry_month: month,
            expiry_year: year,
            cvv: cvv.to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn valid_card_succeeds() {
        let c = card("4111111111111111", 12, 2027, "123");
        assert_eq!(validate_card(&c, now()), PaymentStatus::Success);
    }

    #[test]
    fn fifteen_digit_number_declines() {
        let c = card("411111111111111", 12, 2027, "123");
        assert_eq!(validate_card(&c, now()), PaymentStatus::Failed);
    }

    #[test]
    fn non_digit_number_declines() {
        let c = card("4111-1111-1111-11", 12, 2027, "123");
        assert_eq!(validate_card(&c, now()), PaymentStatus::Failed);
    }

    #[test]
    fn expired_card_declines() {
        let c = card("4111111111111111", 5, 2025, "123");
        assert_eq!(validate_card(&c, now()), PaymentStatus::Failed);
    }

    #[test]
    fn card_expiring_this_month_is_still_valid() {
        let c = card("4111111111111111", 6, 2025, "123");
        assert_eq!(validate_card(&c, now()), PaymentStatus::Success);
    }

    #[test]
    fn bad_cvv_declines() {
        let c = card("4111111111111111", 12, 2027, "12");
        assert_eq!(validate_card(&c, now()), PaymentStatus::Failed);
        let c = card("4111111111111111", 12, 2027, "12a");
        assert_eq!(validate_card(&c, now()), PaymentStatus::Failed);
    }
}
