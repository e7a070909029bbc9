use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::numeric::RawValue;
use super::types::DebtId;

/// Manual edits for one month. Only active slots are ever stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub debts: BTreeMap<DebtId, f64>,
}

impl MonthOverride {
    pub fn is_empty(&self) -> bool {
        self.total.is_none() && self.debts.is_empty()
    }

    pub fn debt_payment(&self, id: &DebtId) -> Option<f64> {
        self.debts.get(id).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideSlot {
    Total,
    Debt(DebtId),
}

/// Month-keyed manual overrides. A value counts only if it parses to a finite,
/// non-negative number; anything else clears the slot, so an emptied field
/// falls back to the automatic plan rather than to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideStore {
    months: BTreeMap<u32, MonthOverride>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or clears the total budget for `month`. Returns whether the slot is
    /// active afterwards.
    pub fn set_total(&mut self, month: u32, raw: impl Into<RawValue>) -> bool {
        if month == 0 {
            return false;
        }
        match active_value(&raw.into()) {
            Some(amount) => {
                self.months.entry(month).or_default().total = Some(amount);
                true
            }
            None => {
                self.clear(month, &OverrideSlot::Total);
                false
            }
        }
    }

    /// Sets or clears one debt's payment for `month`. Returns whether the slot
    /// is active afterwards.
    pub fn set_debt_payment(&mut self, month: u32, id: DebtId, raw: impl Into<RawValue>) -> bool {
        if month == 0 {
            return false;
        }
        match active_value(&raw.into()) {
            Some(amount) => {
                self.months
                    .entry(month)
                    .or_default()
                    .debts
                    .insert(id, amount);
                true
            }
            None => {
                self.clear(month, &OverrideSlot::Debt(id));
                false
            }
        }
    }

    pub fn clear(&mut self, month: u32, slot: &OverrideSlot) {
        let Some(entry) = self.months.get_mut(&month) else {
            return;
        };
        match slot {
            OverrideSlot::Total => entry.total = None,
            OverrideSlot::Debt(id) => {
                entry.debts.remove(id);
            }
        }
        if entry.is_empty() {
            log::debug!("month {month} has no manual overrides left");
            self.months.remove(&month);
        }
    }

    pub fn clear_all(&mut self) {
        self.months.clear();
    }

    pub fn active_overrides_for(&self, month: u32) -> Option<&MonthOverride> {
        self.months.get(&month)
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Months carrying at least one active slot, ascending.
    pub fn touched_months(&self) -> impl Iterator<Item = (u32, &MonthOverride)> {
        self.months.iter().map(|(month, entry)| (*month, entry))
    }

    /// Drops zero months, non-finite or negative amounts, and empty entries,
    /// e.g. after deserializing a client-supplied map.
    pub fn sanitized(mut self) -> Self {
        self.months.retain(|month, entry| {
            if entry.total.is_some_and(|v| !v.is_finite() || v < 0.0) {
                entry.total = None;
            }
            entry.debts.retain(|_, v| v.is_finite() && *v >= 0.0);
            *month > 0 && !entry.is_empty()
        });
        self
    }
}

fn active_value(raw: &RawValue) -> Option<f64> {
    raw.finite().filter(|v| *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_text_is_active() {
        let mut store = OverrideStore::new();
        assert!(store.set_total(3, "12000"));
        assert!(store.set_debt_payment(3, DebtId::Number(2), 800.0));

        let month = store.active_overrides_for(3).expect("month 3 active");
        assert_eq!(month.total, Some(12_000.0));
        assert_eq!(month.debt_payment(&DebtId::Number(2)), Some(800.0));
    }

    #[test]
    fn zero_is_a_real_override() {
        let mut store = OverrideStore::new();
        assert!(store.set_total(1, "0"));
        assert_eq!(store.active_overrides_for(1).and_then(|m| m.total), Some(0.0));
    }

    #[test]
    fn empty_or_garbage_clears_instead_of_zeroing() {
        let mut store = OverrideStore::new();
        store.set_total(2, 9_000.0);
        assert!(!store.set_total(2, ""));
        assert!(store.active_overrides_for(2).is_none());
        assert!(store.is_empty());

        assert!(!store.set_debt_payment(4, DebtId::Number(1), "abc"));
        assert!(!store.set_debt_payment(4, DebtId::Number(1), "Infinity"));
        assert!(!store.set_debt_payment(4, DebtId::Number(1), -5.0));
        assert!(store.is_empty());
    }

    #[test]
    fn clearing_one_slot_keeps_the_other() {
        let mut store = OverrideStore::new();
        store.set_total(5, 1_000.0);
        store.set_debt_payment(5, DebtId::Number(7), 200.0);
        store.clear(5, &OverrideSlot::Total);

        let month = store.active_overrides_for(5).expect("debt slot still active");
        assert_eq!(month.total, None);
        assert_eq!(month.debt_payment(&DebtId::Number(7)), Some(200.0));

        store.set_debt_payment(5, DebtId::Number(7), "");
        assert!(store.active_overrides_for(5).is_none());
    }

    #[test]
    fn month_zero_is_ignored() {
        let mut store = OverrideStore::new();
        assert!(!store.set_total(0, 100.0));
        assert!(store.is_empty());
    }

    #[test]
    fn sanitized_drops_invalid_entries() {
        let store: OverrideStore = serde_json::from_str(
            r#"{"0": {"total": 10}, "2": {"total": -1}, "3": {"debts": {"1": 50}}, "4": {}}"#,
        )
        .expect("valid overrides json");
        let store = store.sanitized();
        let months: Vec<u32> = store.touched_months().map(|(m, _)| m).collect();
        assert_eq!(months, vec![3]);
    }
}
