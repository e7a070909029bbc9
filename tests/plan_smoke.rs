use avalanche::core::{DebtId, OverrideStore, PlanSettings, Termination, diff, plan};
use avalanche::error::PlannerError;
use avalanche::io::{export_debts, import_debts, schedule_to_string};

const SEED: &str = r#"[
    {"id": 1, "name": "A", "balance": "10000", "rate": "25", "minPay": ""},
    {"id": 2, "name": "B", "balance": "20000", "rate": "18", "minPay": ""},
    {"id": 3, "name": "C", "balance": "30000", "rate": "33", "minPay": ""}
]"#;

#[test]
fn seed_list_pays_off_highest_rate_first() {
    let debts = import_debts(SEED).expect("seed list imports");
    let report = plan(&debts, &PlanSettings::default(), &OverrideStore::new()).expect("plan");

    assert_eq!(report.termination, Termination::PaidOff);
    let first = &report.rows[0];
    let c = first.state_for(&DebtId::Number(3)).expect("debt C");
    assert!((c.balance_after - 16_325.0).abs() < 0.005);
    assert!((first.total_paid_this_month - 16_000.0).abs() < 1e-6);

    let c_cleared = report
        .rows
        .iter()
        .position(|row| row.state_for(&DebtId::Number(3)).is_some_and(|s| s.balance_after < 0.01));
    let a_cleared = report
        .rows
        .iter()
        .position(|row| row.state_for(&DebtId::Number(1)).is_some_and(|s| s.balance_after < 0.01));
    assert!(c_cleared < a_cleared);
}

#[test]
fn skipping_a_month_delays_payoff() {
    let debts = import_debts(SEED).expect("seed list imports");
    let settings = PlanSettings::default();
    let baseline = plan(&debts, &settings, &OverrideStore::new()).expect("baseline");

    let mut overrides = OverrideStore::new();
    assert!(overrides.set_total(1, 0.0));
    let skipped = plan(&debts, &settings, &overrides).expect("overridden");
    let change = diff(&baseline, &skipped, &overrides);

    assert!(change.months_delta >= 1);
    assert!(change.interest_delta > 0.0);
    assert_eq!(
        change.describe().as_deref(),
        Some(
            "payoff time and total interest changed because of manual edits in: month 1 (total budget edited)"
        )
    );
}

#[test]
fn object_import_is_rejected_with_format_hint() {
    let err = import_debts(r#"{"debts": []}"#).expect_err("not an array");
    assert!(matches!(err, PlannerError::ImportFormat(_)));
    assert!(err.to_string().contains("debt-list export"));
}

#[test]
fn export_then_import_keeps_the_editor_rows() {
    let debts = import_debts(SEED).expect("seed list imports");
    let exported = export_debts(&debts).expect("exports");
    assert_eq!(import_debts(&exported).expect("re-imports"), debts);
}

#[test]
fn schedule_csv_starts_with_bom_and_header() {
    let debts = import_debts(SEED).expect("seed list imports");
    let report = plan(&debts, &PlanSettings::default(), &OverrideStore::new()).expect("plan");
    let csv = schedule_to_string(&report).expect("csv");

    assert!(csv.starts_with(
        "\u{feff}month,total balance,total paid this month,A (paid),A (balance),B (paid),B (balance),C (paid),C (balance)"
    ));
    assert_eq!(csv.lines().count(), report.rows.len() + 1);
}
