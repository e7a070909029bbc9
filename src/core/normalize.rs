use super::minimum::default_minimum_payment;
use super::numeric::RawValue;
use super::types::{RawDebt, ValidatedDebt};

/// Converts editor rows into simulation inputs. Balance and rate fall back to 0
/// when they do not parse; rows without a positive balance are dropped. An
/// explicit minimum payment wins only when it is a positive finite number.
pub fn normalize_debts(raw: &[RawDebt], min_percent: f64) -> Vec<ValidatedDebt> {
    raw.iter()
        .filter_map(|debt| {
            let balance = field_or_zero(debt.balance.as_ref());
            if balance <= 0.0 {
                log::debug!("skipping debt {} with non-positive balance", debt.id);
                return None;
            }
            let rate = field_or_zero(debt.rate.as_ref()).max(0.0);
            let calc_min = default_minimum_payment(balance, min_percent);
            let min_payment = debt
                .min_pay
                .as_ref()
                .and_then(RawValue::finite)
                .filter(|v| *v > 0.0)
                .unwrap_or(calc_min);

            Some(ValidatedDebt {
                id: debt.id.clone(),
                name: debt.name.clone(),
                balance,
                annual_rate_percent: rate,
                min_payment,
            })
        })
        .collect()
}

fn field_or_zero(value: Option<&RawValue>) -> f64 {
    value.map(RawValue::or_zero).unwrap_or(0.0)
}
