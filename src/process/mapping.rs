use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use crate::{
    error::PreprocessError,
    process::{
        schema::FIELD_COUNT, utils::normalize_column, CanonicalField, CanonicalTable,
        EmployeeRecord, ParsedTable, Value,
    },
};

const STANDARD_ALIASES: &[(&str, &[&str])] = &[
    ("Employee ID", &["employeeid", "empid", "userid", "user_id"]),
    ("First Name", &["firstname", "fname", "first"]),
    ("Last Name", &["lastname", "lname", "last"]),
    ("Email", &["email", "emailaddress"]),
    ("Job Title", &["jobtitle", "position", "role"]),
    ("Phone Number", &["phonenumber", "phone", "mobile"]),
    ("Hire Date", &["hiredate", "startdate", "doj", "dateofbirth", "dob"]),
];

static STANDARD: Lazy<AliasTable> =
    Lazy::new(|| AliasTable::new(STANDARD_ALIASES.iter().copied()));

/// Acceptable source column spellings per canonical field, keyed by the
/// field's normalized name. Alias order is priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    entries: HashMap<String, Vec<String>>,
}

impl AliasTable {
    /// Keys and aliases are normalized on the way in; duplicates after
    /// normalization keep their first position.
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a [&'a str])>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(field, aliases)| {
                let mut list: Vec<String> = Vec::new();
                for alias in aliases {
                    let alias = normalize_column(alias);
                    if !alias.is_empty() && !list.contains(&alias) {
                        list.push(alias);
                    }
                }
                (normalize_column(field), list)
            })
            .collect();
        Self { entries }
    }

    /// The built-in table, built once on first use.
    pub fn standard() -> &'static AliasTable {
        &STANDARD
    }

    /// Aliases for a normalized canonical key; empty when the key is unknown.
    pub fn aliases(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Bind every canonical field to a source column and project the table onto
/// the canonical schema.
///
/// Source headers are normalized, then each field's alias list is walked in
/// order and the first alias present wins. If two source headers normalize to
/// the same key, the later one is used. All unresolved fields are reported
/// together.
pub fn map_fields(
    table: &ParsedTable,
    aliases: &AliasTable,
) -> Result<CanonicalTable, PreprocessError> {
    info!("mapping fields to standard format");

    let by_key: HashMap<String, usize> = table
        .headers
        .iter()
        .enumerate()
        .map(|(idx, header)| (normalize_column(header), idx))
        .collect();

    let mut bound = [0usize; FIELD_COUNT];
    let mut missing = Vec::new();
    for field in CanonicalField::ALL {
        let key = normalize_column(field.name());
        let hit = aliases
            .aliases(&key)
            .iter()
            .find_map(|alias| by_key.get(alias).map(|&idx| (alias, idx)));
        match hit {
            Some((alias, idx)) => {
                debug!(field = %field, source = %table.headers[idx], %alias, "bound field");
                bound[field.index()] = idx;
            }
            None => {
                warn!(field = %field, "could not find a match");
                missing.push(field.name().to_string());
            }
        }
    }

    if !missing.is_empty() {
        return Err(PreprocessError::MissingRequiredFields(missing));
    }

    let records = table
        .rows
        .iter()
        .map(|row| {
            EmployeeRecord::from_fn(|field| {
                row.get(bound[field.index()])
                    .cloned()
                    .unwrap_or(Value::Null)
            })
        })
        .collect();

    Ok(CanonicalTable::new(records))
}
