//! Currency precision.
//!
//! All fee totals round to exactly 2 decimal places with banker's
//! rounding (`MidpointNearestEven`): ties go to the even digit, so
//! repeated rounding never drifts.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to 2 decimal places, half-to-even.
///
/// Idempotent: rounding an already-rounded amount is a no-op.
pub fn round_to_currency_precision(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_midpoint_to_even() {
        // 2.125 -> 2.12 (down to even), 2.135 -> 2.14 (up to even)
        assert_eq!(
            round_to_currency_precision(Decimal::new(2125, 3)),
            Decimal::new(212, 2)
        );
        assert_eq!(
            round_to_currency_precision(Decimal::new(2135, 3)),
            Decimal::new(214, 2)
        );
    }

    #[test]
    fn rounds_ordinary_cases_to_nearest() {
        assert_eq!(
            round_to_currency_precision(Decimal::new(26_459_9, 4)),
            Decimal::new(2646, 2)
        );
        assert_eq!(
            round_to_currency_precision(Decimal::new(26_454_9, 4)),
            Decimal::new(2645, 2)
        );
    }

    #[test]
    fn idempotent() {
        let cases = [
            Decimal::new(2125, 3),
            Decimal::new(999_995, 5),
            Decimal::new(-2135, 3),
            Decimal::ZERO,
        ];
        for x in cases {
            let once = round_to_currency_precision(x);
            assert_eq!(round_to_currency_precision(once), once);
        }
    }

    #[test]
    fn negative_midpoints_round_to_even_too() {
        assert_eq!(
            round_to_currency_precision(Decimal::new(-2125, 3)),
            Decimal::new(-212, 2)
        );
    }
}
