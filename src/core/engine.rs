use crate::error::{PlannerError, Result};

use super::normalize::normalize_debts;
use super::overrides::{MonthOverride, OverrideStore};
use super::types::{
    DebtMonthState, EPSILON, MAX_MONTHS, MonthlyRow, PlanSettings, RawDebt, Report, Termination,
    ValidatedDebt,
};

#[derive(Debug)]
struct DebtState<'a> {
    debt: &'a ValidatedDebt,
    balance: f64,
    monthly_rate: f64,
    paid: f64,
    manual: bool,
}

impl DebtState<'_> {
    fn is_open(&self) -> bool {
        self.balance > 0.0
    }

    fn pay(&mut self, amount: f64, remaining: &mut f64) {
        self.paid += amount;
        self.balance -= amount;
        *remaining -= amount;
    }
}

pub fn plan(raw: &[RawDebt], settings: &PlanSettings, overrides: &OverrideStore) -> Result<Report> {
    let debts = normalize_debts(raw, settings.min_percent);
    run(&debts, settings.budget, overrides)
}

pub fn run(debts: &[ValidatedDebt], budget: f64, overrides: &OverrideStore) -> Result<Report> {
    if debts.is_empty() {
        return Err(PlannerError::EmptyDebtSet);
    }

    let base_budget = if budget.is_finite() {
        budget.max(0.0)
    } else {
        0.0
    };
    let mut states = processing_order(debts);
    let mut rows = Vec::new();
    let mut total_interest = 0.0;
    let mut month = 0;
    let mut remaining_balance: f64 = states.iter().map(|s| s.balance).sum();

    while remaining_balance > EPSILON && month < MAX_MONTHS {
        month += 1;
        let month_override = overrides.active_overrides_for(month);

        accrue_interest(&mut states, &mut total_interest);

        let mut remaining = month_override
            .and_then(|entry| entry.total)
            .unwrap_or(base_budget);
        apply_manual_payments(&mut states, month_override, &mut remaining);
        apply_minimum_payments(&mut states, &mut remaining);
        apply_avalanche(&mut states, &mut remaining);

        let row = close_month(&mut states, month);
        remaining_balance = row.total_balance_after;
        rows.push(row);
    }

    let termination = if remaining_balance > EPSILON {
        log::warn!(
            "schedule stopped at the {MAX_MONTHS}-month cap with {remaining_balance:.2} outstanding"
        );
        Termination::MonthCap
    } else {
        Termination::PaidOff
    };
    log::debug!("schedule finished after {month} months ({termination:?})");

    Ok(Report {
        total_months: month,
        total_interest_accrued: total_interest,
        termination,
        rows,
        original_columns: debts.to_vec(),
    })
}

// Highest rate first; equal rates keep input order.
fn processing_order(debts: &[ValidatedDebt]) -> Vec<DebtState<'_>> {
    let mut indexed: Vec<(usize, &ValidatedDebt)> = debts.iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| {
        b.annual_rate_percent
            .total_cmp(&a.annual_rate_percent)
            .then(ia.cmp(ib))
    });
    indexed
        .into_iter()
        .map(|(_, debt)| DebtState {
            debt,
            balance: debt.balance,
            monthly_rate: debt.annual_rate_percent / 100.0 / 12.0,
            paid: 0.0,
            manual: false,
        })
        .collect()
}

fn accrue_interest(states: &mut [DebtState<'_>], total_interest: &mut f64) {
    for state in states.iter_mut() {
        let interest = state.balance * state.monthly_rate;
        state.balance += interest;
        *total_interest += interest;
        state.paid = 0.0;
        state.manual = false;
    }
}

fn apply_manual_payments(
    states: &mut [DebtState<'_>],
    month_override: Option<&MonthOverride>,
    remaining: &mut f64,
) {
    let Some(entry) = month_override else {
        return;
    };
    for state in states.iter_mut() {
        if !state.is_open() {
            continue;
        }
        if let Some(amount) = entry.debt_payment(&state.debt.id) {
            let payment = amount.min(*remaining).min(state.balance);
            state.pay(payment, remaining);
            state.manual = true;
        }
    }
}

fn apply_minimum_payments(states: &mut [DebtState<'_>], remaining: &mut f64) {
    for state in states.iter_mut() {
        if state.is_open() && !state.manual {
            let payment = state.debt.min_payment.min(state.balance).min(*remaining);
            state.pay(payment, remaining);
        }
    }
}

fn apply_avalanche(states: &mut [DebtState<'_>], remaining: &mut f64) {
    if *remaining <= EPSILON {
        return;
    }
    for state in states.iter_mut() {
        if state.is_open() && !state.manual {
            let payment = state.balance.min(*remaining);
            state.pay(payment, remaining);
            if *remaining <= EPSILON {
                break;
            }
        }
    }
}

fn close_month(states: &mut [DebtState<'_>], month: u32) -> MonthlyRow {
    let mut total_balance_after = 0.0;
    let mut total_paid_this_month = 0.0;
    let mut debts = Vec::with_capacity(states.len());
    for state in states.iter_mut() {
        if state.balance < 0.0 {
            state.balance = 0.0;
        }
        total_balance_after += state.balance;
        total_paid_this_month += state.paid;
        debts.push(DebtMonthState {
            id: state.debt.id.clone(),
            paid: state.paid,
            balance_after: state.balance,
        });
    }
    MonthlyRow {
        month,
        total_balance_after,
        total_paid_this_month,
        debts,
    }
}
