use once_cell::sync::Lazy;
use regex::Regex;

use crate::process::Value;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]").unwrap());

/// Lowercase, then drop everything that isn't `a-z` or `0-9`.
/// "Employee ID", "employee_id" and "EMPLOYEEID" all become "employeeid".
pub fn normalize_column(name: &str) -> String {
    NON_ALNUM.replace_all(&name.to_lowercase(), "").into_owned()
}

/// Trimmed text cell; blank cells are null. Quotes are content here, the
/// readers have already undone any quoting.
pub fn text_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::Text(trimmed.to_string())
    }
}

/// Whole floats become integers; spreadsheets store every number as f64.
pub fn float_cell(f: f64) -> Value {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::Int(f as i64)
    } else if f.is_nan() {
        Value::Null
    } else {
        Value::Float(f)
    }
}
