use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use super::numeric::RawValue;

pub const MAX_MONTHS: u32 = 600;
// Balances and budgets at or below this count as zero.
pub const EPSILON: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum DebtId {
    Number(u64),
    Text(String),
}

impl DebtId {
    pub fn as_number(&self) -> Option<u64> {
        match self {
            DebtId::Number(n) => Some(*n),
            DebtId::Text(_) => None,
        }
    }
}

impl fmt::Display for DebtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtId::Number(n) => write!(f, "{n}"),
            DebtId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for DebtId {
    fn from(value: u64) -> Self {
        DebtId::Number(value)
    }
}

impl From<&str> for DebtId {
    // JSON object keys are always strings, so "3" must name the same debt as 3.
    fn from(value: &str) -> Self {
        match value.parse::<u64>() {
            Ok(n) if n.to_string() == value => DebtId::Number(n),
            _ => DebtId::Text(value.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for DebtId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DebtIdVisitor;

        impl Visitor<'_> for DebtIdVisitor {
            type Value = DebtId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a debt id (non-negative integer or string)")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<DebtId, E> {
                Ok(DebtId::Number(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<DebtId, E> {
                Ok(match u64::try_from(v) {
                    Ok(n) => DebtId::Number(n),
                    Err(_) => DebtId::Text(v.to_string()),
                })
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<DebtId, E> {
                if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
                    Ok(DebtId::Number(v as u64))
                } else {
                    Ok(DebtId::Text(v.to_string()))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<DebtId, E> {
                Ok(DebtId::from(v))
            }
        }

        deserializer.deserialize_any(DebtIdVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDebt {
    pub id: DebtId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_pay: Option<RawValue>,
}

impl RawDebt {
    pub fn new(id: impl Into<DebtId>, name: &str, balance: f64, rate: f64) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            balance: Some(RawValue::Number(balance)),
            rate: Some(RawValue::Number(rate)),
            min_pay: None,
        }
    }

    pub fn with_min_pay(mut self, min_pay: impl Into<RawValue>) -> Self {
        self.min_pay = Some(min_pay.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedDebt {
    pub id: DebtId,
    pub name: String,
    pub balance: f64,
    pub annual_rate_percent: f64,
    pub min_payment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSettings {
    pub budget: f64,
    pub min_percent: f64,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            budget: 16_000.0,
            min_percent: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtMonthState {
    pub id: DebtId,
    pub paid: f64,
    pub balance_after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRow {
    pub month: u32,
    pub total_balance_after: f64,
    pub total_paid_this_month: f64,
    // processing order
    pub debts: Vec<DebtMonthState>,
}

impl MonthlyRow {
    pub fn state_for(&self, id: &DebtId) -> Option<&DebtMonthState> {
        self.debts.iter().find(|state| &state.id == id)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    PaidOff,
    MonthCap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub total_months: u32,
    pub total_interest_accrued: f64,
    pub termination: Termination,
    pub rows: Vec<MonthlyRow>,
    pub original_columns: Vec<ValidatedDebt>,
}

impl Report {
    pub fn is_paid_off(&self) -> bool {
        self.termination == Termination::PaidOff
    }

    pub fn final_balance(&self) -> f64 {
        self.rows
            .last()
            .map(|row| row.total_balance_after)
            .unwrap_or(0.0)
    }
}
