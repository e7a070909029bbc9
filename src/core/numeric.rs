use std::fmt;

use serde::{Deserialize, Serialize};

/// A numeric input as it arrives from an editor or a stored document: either a
/// JSON number or free text that may or may not hold a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Leading-number parse of the value. `None` for empty or non-numeric text.
    pub fn parse(&self) -> Option<f64> {
        match self {
            RawValue::Number(v) => Some(*v),
            RawValue::Text(s) => parse_float(s),
        }
    }

    pub fn finite(&self) -> Option<f64> {
        self.parse().filter(|v| v.is_finite())
    }

    pub fn or_zero(&self) -> f64 {
        self.finite().unwrap_or(0.0)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(v) => write!(f, "{v}"),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

/// Parses the longest numeric prefix of `input` after leading whitespace:
/// optional sign, digits with an optional fraction, optional exponent.
/// `"12.5abc"` is 12.5, `"abc"` and `""` are `None`, `"Infinity"` is infinite.
pub fn parse_float(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_float_takes_numeric_prefix() {
        assert_eq!(parse_float("12.5abc"), Some(12.5));
        assert_eq!(parse_float("  -3"), Some(-3.0));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("7."), Some(7.0));
        assert_eq!(parse_float("1e3x"), Some(1000.0));
        assert_eq!(parse_float("2e"), Some(2.0));
    }

    #[test]
    fn parse_float_rejects_non_numbers() {
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("   "), None);
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("-"), None);
    }

    #[test]
    fn infinity_parses_but_is_not_finite() {
        let raw = RawValue::from("Infinity");
        assert_eq!(raw.parse(), Some(f64::INFINITY));
        assert_eq!(raw.finite(), None);
        assert_eq!(raw.or_zero(), 0.0);
    }

    #[test]
    fn raw_value_deserializes_numbers_and_text() {
        let values: Vec<RawValue> = serde_json::from_str(r#"[12, "15.5", ""]"#).expect("valid json");
        assert_eq!(values[0].finite(), Some(12.0));
        assert_eq!(values[1].finite(), Some(15.5));
        assert_eq!(values[2].finite(), None);
    }
}
