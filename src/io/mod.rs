mod debts_json;
mod schedule_csv;

pub use debts_json::{export_debts, import_debts, import_debts_value, next_debt_id};
pub use schedule_csv::{schedule_to_string, write_schedule};
