use chrono::{DateTime, Duration, Utc};

/// Cancellations earlier than this before departure refund in full.
pub const FULL_REFUND_WINDOW_HOURS: i64 = 24;

/// Refund owed for a cancellation, as a pure function of price and timing.
///
/// Policy table:
/// - more than 24h before departure: 100%
/// - within the final 24h (boundary inclusive), departure not yet passed: 50%
/// - at or after departure: nothing
///
/// Always satisfies `0 <= refund <= final_price_cents`.
pub fn refund_amount(
    final_price_cents: i32,
    departure_time: DateTime<Utc>,
    cancelled_at: DateTime<Utc>,
) -> i32 {
    if final_price_cents <= 0 || cancelled_at >= departure_time {
        return 0;
    }

    if departure_time - cancelled_at > Duration::hours(FULL_REFUND_WINDOW_HOURS) {
        final_price_cents
    } else {
        // Half, rounded half-up on odd cents.
        (final_price_cents + 1) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn departure() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 18, 0, 0).unwrap()
    }

    #[test]
    fn early_cancellation_refunds_in_full() {
        let cancelled = departure() - Duration::days(3);
        assert_eq!(refund_amount(250000, departure(), cancelled), 250000);
    }

    #[test]
    fn cancellation_two_hours_before_departure_hits_the_late_tier() {
        let cancelled = departure() - Duration::hours(2);
        assert_eq!(refund_amount(250000, departure(), cancelled), 125000);
    }

    #[test]
    fn exactly_24h_before_departure_is_the_late_tier() {
        let cancelled = departure() - Duration::hours(24);
        assert_eq!(refund_amount(250000, departure(), cancelled), 125000);
    }

    #[test]
    fn past_departure_refunds_nothing() {
        assert_eq!(refund_amount(250000, departure(), departure()), 0);
        let cancelled = departure() + Duration::hours(1);
        assert_eq!(refund_amount(250000, departure(), cancelled), 0);
    }

    #[test]
    fn half_refund_rounds_up_on_odd_cents() {
        let cancelled = departure() - Duration::hours(2);
        assert_eq!(refund_amount(999, departure(), cancelled), 500);
    }

    #[test]
    fn refund_is_always_within_bounds() {
        let offsets = [-48, -25, -24, -12, -1, 0, 1, 48];
        for hours in offsets {
            for price in [0, 1, 999, 250000] {
                let cancelled = departure() + Duration::hours(hours);
                let refund = refund_amount(price, departure(), cancelled);
                assert!(refund >= 0);
                assert!(refund <= price.max(0));
            }
        }
    }
}
