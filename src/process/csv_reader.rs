use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;

use crate::process::{utils::text_cell, ParsedTable};

/// Parse a header-first CSV buffer.
///
/// Stricter than a plain reader so that other text formats don't slip through:
/// the buffer must be UTF-8, every record must have as many fields as the
/// header, and the header needs at least two columns with one non-blank name.
pub fn parse_csv(bytes: &[u8]) -> Result<ParsedTable> {
    let text = std::str::from_utf8(bytes).context("CSV payload is not valid UTF-8")?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.len() < 2 {
        bail!("CSV header has {} column(s), need at least 2", headers.len());
    }
    if headers.iter().all(|h| h.is_empty()) {
        bail!("CSV header is blank");
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        rows.push(record.iter().map(text_cell).collect());
    }

    Ok(ParsedTable::new(headers, rows))
}
