/// Smallest required minimum payment before the balance itself caps it.
pub const MIN_PAYMENT_FLOOR: f64 = 500.0;

/// Default minimum payment for a debt: `min_percent`% of the balance, never
/// below the floor, and never more than the balance owed.
pub fn default_minimum_payment(balance: f64, min_percent: f64) -> f64 {
    if balance.is_nan() || balance <= 0.0 {
        return 0.0;
    }
    let percent = if min_percent.is_finite() {
        min_percent
    } else {
        0.0
    };
    let mut calc_min = balance * (percent / 100.0);
    if calc_min < MIN_PAYMENT_FLOOR {
        calc_min = MIN_PAYMENT_FLOOR;
    }
    if balance < MIN_PAYMENT_FLOOR {
        calc_min = balance;
    }
    calc_min
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    #[test]
    fn percent_of_balance_above_floor() {
        assert_eq!(default_minimum_payment(30_000.0, 5.0), 1_500.0);
        assert_eq!(default_minimum_payment(20_000.0, 5.0), 1_000.0);
    }

    #[test]
    fn floor_applies_to_small_percentages() {
        assert_eq!(default_minimum_payment(10_000.0, 5.0), 500.0);
        assert_eq!(default_minimum_payment(10_000.0, 0.0), 500.0);
    }

    #[test]
    fn balance_below_floor_is_the_minimum() {
        assert_eq!(default_minimum_payment(320.0, 5.0), 320.0);
        assert_eq!(default_minimum_payment(320.0, 200.0), 320.0);
    }

    #[test]
    fn non_positive_balance_needs_nothing() {
        assert_eq!(default_minimum_payment(0.0, 5.0), 0.0);
        assert_eq!(default_minimum_payment(-10.0, 5.0), 0.0);
        assert_eq!(default_minimum_payment(f64::NAN, 5.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_minimum_never_exceeds_balance_and_respects_floor(
            balance in 0.01f64..1_000_000.0,
            min_percent in 0.0f64..100.0,
        ) {
            let min = default_minimum_payment(balance, min_percent);
            prop_assert!(min <= balance);
            prop_assert!(min >= balance.min(MIN_PAYMENT_FLOOR));
        }
    }
}
