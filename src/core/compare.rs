use serde::Serialize;

use super::overrides::OverrideStore;
use super::types::Report;

/// Above this many edited months the reason text gives a count instead of a
/// list.
const LISTED_MONTHS_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchedMonth {
    pub month: u32,
    pub total_edited: bool,
    pub debts_edited: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDiff {
    pub months_delta: i64,
    pub interest_delta: f64,
    pub touched_months: Vec<TouchedMonth>,
}

impl ReportDiff {
    pub fn is_modified(&self) -> bool {
        !self.touched_months.is_empty()
    }

    pub fn has_change(&self) -> bool {
        self.months_delta != 0 || self.interest_delta != 0.0
    }

    /// Why payoff time or interest moved, or `None` when nothing was edited.
    pub fn describe(&self) -> Option<String> {
        if self.touched_months.is_empty() {
            return None;
        }
        if self.touched_months.len() > LISTED_MONTHS_LIMIT {
            return Some(format!(
                "payoff time and total interest changed because of manual edits in {} months",
                self.touched_months.len()
            ));
        }
        let parts: Vec<String> = self
            .touched_months
            .iter()
            .map(|touched| {
                let mut part = format!("month {}", touched.month);
                if touched.total_edited {
                    part.push_str(" (total budget edited)");
                }
                if touched.debts_edited {
                    part.push_str(" (per-debt payment edited)");
                }
                part
            })
            .collect();
        Some(format!(
            "payoff time and total interest changed because of manual edits in: {}",
            parts.join(", ")
        ))
    }
}

pub fn diff(baseline: &Report, overridden: &Report, overrides: &OverrideStore) -> ReportDiff {
    let touched_months = overrides
        .touched_months()
        .map(|(month, entry)| TouchedMonth {
            month,
            total_edited: entry.total.is_some(),
            debts_edited: !entry.debts.is_empty(),
        })
        .collect();

    ReportDiff {
        months_delta: i64::from(overridden.total_months) - i64::from(baseline.total_months),
        interest_delta: overridden.total_interest_accrued - baseline.total_interest_accrued,
        touched_months,
    }
}
