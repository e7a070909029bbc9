use std::collections::HashSet;

use serde_json::Value;

use crate::core::{DebtId, RawDebt, RawValue};
use crate::error::{PlannerError, Result};

/// Parses an exported debt list. The top level must be an array of objects;
/// missing or repeated ids get fresh ones, a missing name becomes
/// `Debt <position>`, missing amounts stay absent.
pub fn import_debts(json: &str) -> Result<Vec<RawDebt>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| PlannerError::ImportFormat(format!("not valid JSON ({e})")))?;
    import_debts_value(value)
}

pub fn import_debts_value(value: Value) -> Result<Vec<RawDebt>> {
    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(PlannerError::ImportFormat(format!(
                "top-level value is {}, not an array",
                kind_of(&other)
            )));
        }
    };

    let mut parsed = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let mut fields = match entry {
            Value::Object(fields) => fields,
            other => {
                return Err(PlannerError::ImportFormat(format!(
                    "entry {} is {}, not an object",
                    index + 1,
                    kind_of(&other)
                )));
            }
        };
        let id = fields
            .remove("id")
            .and_then(|v| serde_json::from_value::<DebtId>(v).ok());
        let name = match fields.remove("name") {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => format!("Debt {}", index + 1),
        };
        parsed.push((
            id,
            RawDebt {
                id: DebtId::Number(0),
                name,
                balance: amount_field(fields.remove("balance")),
                rate: amount_field(fields.remove("rate")),
                min_pay: amount_field(fields.remove("minPay")),
            },
        ));
    }

    let explicit: HashSet<DebtId> = parsed.iter().filter_map(|(id, _)| id.clone()).collect();
    // Past the largest id when there is room, otherwise the lowest free one.
    let mut next_id = next_debt_id(&explicit).or(Some(1));
    let mut seen = HashSet::new();
    let mut debts = Vec::with_capacity(parsed.len());
    for (id, mut debt) in parsed {
        debt.id = match id {
            Some(id) if seen.insert(id.clone()) => id,
            _ => {
                let fresh = fresh_id(&mut next_id, &explicit, &seen)?;
                seen.insert(fresh.clone());
                fresh
            }
        };
        debts.push(debt);
    }
    Ok(debts)
}

fn fresh_id(
    next_id: &mut Option<u64>,
    explicit: &HashSet<DebtId>,
    seen: &HashSet<DebtId>,
) -> Result<DebtId> {
    while let Some(candidate) = *next_id {
        *next_id = candidate.checked_add(1);
        let id = DebtId::Number(candidate);
        if !explicit.contains(&id) && !seen.contains(&id) {
            return Ok(id);
        }
    }
    Err(PlannerError::ImportFormat(
        "no unused numeric id is left for entries without one".to_string(),
    ))
}

pub fn export_debts(debts: &[RawDebt]) -> Result<String> {
    Ok(serde_json::to_string_pretty(debts)?)
}

/// One past the largest numeric id, 1 for a list without numeric ids, or
/// `None` when the largest id is `u64::MAX`.
pub fn next_debt_id<'a>(ids: impl IntoIterator<Item = &'a DebtId>) -> Option<u64> {
    ids.into_iter()
        .filter_map(DebtId::as_number)
        .max()
        .map_or(Some(1), |max| max.checked_add(1))
}

fn amount_field(value: Option<Value>) -> Option<RawValue> {
    match value? {
        Value::Number(n) => n.as_f64().map(RawValue::Number),
        Value::String(s) => Some(RawValue::Text(s)),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
