use std::io::Write;

use csv::WriterBuilder;

use crate::core::Report;
use crate::error::Result;

const BOM: &[u8] = "\u{feff}".as_bytes();

pub fn write_schedule<W: Write>(mut w: W, report: &Report) -> Result<()> {
    w.write_all(BOM)?;
    let mut writer = WriterBuilder::new().from_writer(w);

    let mut header = vec![
        "month".to_string(),
        "total balance".to_string(),
        "total paid this month".to_string(),
    ];
    for column in &report.original_columns {
        header.push(format!("{} (paid)", column.name));
        header.push(format!("{} (balance)", column.name));
    }
    writer.write_record(&header)?;

    for row in &report.rows {
        let mut record = vec![
            row.month.to_string(),
            money(row.total_balance_after),
            money(row.total_paid_this_month),
        ];
        for column in &report.original_columns {
            let (paid, balance) = row
                .state_for(&column.id)
                .map_or((0.0, 0.0), |state| (state.paid, state.balance_after));
            record.push(money(paid));
            record.push(money(balance));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn schedule_to_string(report: &Report) -> Result<String> {
    let mut buf = Vec::new();
    write_schedule(&mut buf, report)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OverrideStore, PlanSettings, RawDebt, plan};

    #[test]
    fn single_debt_schedule_matches_hand_calculation() {
        // 1000 at 0%: minimum 500 (floor), budget 600 -> 600 then 400.
        let debts = vec![RawDebt::new(1, "Loan", 1_000.0, 0.0)];
        let settings = PlanSettings {
            budget: 600.0,
            min_percent: 5.0,
        };
        let report = plan(&debts, &settings, &OverrideStore::new()).expect("valid");
        let csv = schedule_to_string(&report).expect("writable");

        assert_eq!(
            csv,
            "\u{feff}month,total balance,total paid this month,Loan (paid),Loan (balance)\n\
             1,400.00,600.00,600.00,400.00\n\
             2,0.00,400.00,400.00,0.00\n"
        );
    }

    #[test]
    fn columns_follow_input_order_not_processing_order() {
        let debts = vec![
            RawDebt::new(1, "Low", 1_000.0, 5.0),
            RawDebt::new(2, "High", 1_000.0, 30.0),
        ];
        let report =
            plan(&debts, &PlanSettings::default(), &OverrideStore::new()).expect("valid");
        let csv = schedule_to_string(&report).expect("writable");
        let header = csv.lines().next().expect("header line");
        assert!(header.ends_with("Low (paid),Low (balance),High (paid),High (balance)"));
        assert_eq!(csv.lines().count(), report.rows.len() + 1);
    }

    #[test]
    fn names_with_commas_are_quoted() {
        let debts = vec![RawDebt::new(1, "Car, family", 800.0, 0.0)];
        let report =
            plan(&debts, &PlanSettings::default(), &OverrideStore::new()).expect("valid");
        let csv = schedule_to_string(&report).expect("writable");
        assert!(csv.contains("\"Car, family (paid)\""));
    }
}
