use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value as JsonValue};

use crate::process::{ParsedTable, Value};

/// Parse a JSON document into a table.
///
/// Two layouts are accepted:
/// - records: `[{"col": v, ...}, ...]`
/// - columns: `{"col": [v, ...], ...}` or `{"col": {"row": v, ...}, ...}`
///
/// Key order is preserved; a key missing from a record or column is null.
pub fn parse_json(bytes: &[u8]) -> Result<ParsedTable> {
    let doc: JsonValue = serde_json::from_slice(bytes).context("decoding JSON")?;
    match doc {
        JsonValue::Array(items) => records_to_table(items),
        JsonValue::Object(columns) => columns_to_table(columns),
        other => bail!("JSON document is a bare {}", kind(&other)),
    }
}

fn records_to_table(items: Vec<JsonValue>) -> Result<ParsedTable> {
    let mut records = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            JsonValue::Object(map) => records.push(map),
            other => bail!("JSON record {} is {}, expected an object", idx, kind(&other)),
        }
    }

    let headers = ordered_keys(records.iter());
    let rows = records
        .iter()
        .map(|rec| headers.iter().map(|h| cell(rec.get(h))).collect())
        .collect();

    Ok(ParsedTable::new(headers, rows))
}

fn columns_to_table(columns: Map<String, JsonValue>) -> Result<ParsedTable> {
    let headers: Vec<String> = columns.keys().cloned().collect();

    if columns.values().all(JsonValue::is_array) {
        let height = columns
            .values()
            .filter_map(JsonValue::as_array)
            .map(Vec::len)
            .max()
            .unwrap_or(0);
        let rows = (0..height)
            .map(|i| {
                columns
                    .values()
                    .map(|col| cell(col.as_array().and_then(|a| a.get(i))))
                    .collect()
            })
            .collect();
        return Ok(ParsedTable::new(headers, rows));
    }

    if columns.values().all(JsonValue::is_object) {
        let index = ordered_keys(columns.values().filter_map(JsonValue::as_object));
        let rows = index
            .iter()
            .map(|key| {
                columns
                    .values()
                    .map(|col| cell(col.as_object().and_then(|o| o.get(key))))
                    .collect()
            })
            .collect();
        return Ok(ParsedTable::new(headers, rows));
    }

    bail!("JSON object must map every column to an array or to an object")
}

/// Keys across `maps`, in first-seen order.
fn ordered_keys<'a>(maps: impl Iterator<Item = &'a Map<String, JsonValue>>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for map in maps {
        for key in map.keys() {
            if seen.insert(key.as_str()) {
                keys.push(key.clone());
            }
        }
    }
    keys
}

fn cell(v: Option<&JsonValue>) -> Value {
    match v {
        None | Some(JsonValue::Null) => Value::Null,
        Some(JsonValue::Bool(b)) => Value::Bool(*b),
        Some(JsonValue::Number(n)) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        Some(JsonValue::String(s)) => Value::Text(s.clone()),
        Some(nested) => Value::Text(nested.to_string()),
    }
}

fn kind(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
