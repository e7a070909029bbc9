mod compare;
mod engine;
mod minimum;
mod normalize;
mod numeric;
mod overrides;
mod types;

pub use compare::{ReportDiff, TouchedMonth, diff};
pub use engine::{plan, run};
pub use minimum::{MIN_PAYMENT_FLOOR, default_minimum_payment};
pub use normalize::normalize_debts;
pub use numeric::{RawValue, parse_float};
pub use overrides::{MonthOverride, OverrideSlot, OverrideStore};
pub use types::{
    DebtId, DebtMonthState, EPSILON, MAX_MONTHS, MonthlyRow, PlanSettings, RawDebt, Report,
    Termination, ValidatedDebt,
};
