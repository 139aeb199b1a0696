use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};

use crate::process::{
    utils::{float_cell, text_cell},
    ParsedTable, Value,
};

/// Parse the first worksheet of any workbook calamine recognises (xlsx, xls,
/// xlsb, ods). The first row is the header.
pub fn parse_workbook(bytes: &[u8]) -> Result<ParsedTable> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook has no worksheets"))?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(header_name).collect(),
        None => Vec::new(),
    };
    let rows = rows
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    Ok(ParsedTable::new(headers, rows))
}

fn header_name(cell: &Data) -> String {
    match cell_value(cell) {
        Value::Null => String::new(),
        v => v.to_string(),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => text_cell(s),
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => float_cell(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) if dt.time() == chrono::NaiveTime::MIN => {
                Value::Text(dt.format("%Y-%m-%d").to_string())
            }
            Some(dt) => Value::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Value::Null,
        },
        other => text_cell(&other.to_string()),
    }
}
