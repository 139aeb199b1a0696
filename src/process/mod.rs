// src/process/mod.rs
use std::{fmt, fs, path::Path};

use tracing::{debug, info, instrument};

use crate::error::PreprocessError;

pub mod csv_reader;
pub mod excel_reader;
pub mod json_reader;
pub mod mapping;
pub mod schema;
pub mod sniff;
pub mod utils;
pub mod write;
pub mod xml_reader;

pub use mapping::{map_fields, AliasTable};
pub use schema::{CanonicalField, CanonicalTable, EmployeeRecord};
pub use sniff::{detect, sniff, Document, FileFormat, Sniffed};
pub use write::write_canonical_csv;

/// A single scalar cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// A rectangular table as the source format presented it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    /// Column names, verbatim from the source.
    pub headers: Vec<String>,
    /// One entry per row; every row is as wide as `headers`.
    pub rows: Vec<Vec<Value>>,
}

impl ParsedTable {
    /// Builds a table, padding short rows with nulls and dropping overflow cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { headers, rows }
    }
}

/// Turns one downloaded payload into the canonical employee table.
pub struct Preprocessor<'a> {
    bytes: &'a [u8],
    aliases: &'a AliasTable,
}

impl<'a> Preprocessor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_aliases(bytes, AliasTable::standard())
    }

    pub fn with_aliases(bytes: &'a [u8], aliases: &'a AliasTable) -> Self {
        Self { bytes, aliases }
    }

    pub fn detect_file_type(&self) -> FileFormat {
        detect(self.bytes)
    }

    #[instrument(level = "info", skip(self), fields(size = self.bytes.len()))]
    pub fn parse(&self) -> Result<CanonicalTable, PreprocessError> {
        let Some(sniffed) = sniff(self.bytes) else {
            info!("detected file type: {}", FileFormat::Unknown.as_str().to_uppercase());
            return Err(PreprocessError::UnsupportedFormat);
        };
        info!("detected file type: {}", sniffed.format.as_str().to_uppercase());

        match sniffed.document {
            Document::Table(table) => {
                debug!(
                    columns = table.headers.len(),
                    rows = table.rows.len(),
                    "parsed tabular source"
                );
                map_fields(&table, self.aliases)
            }
            Document::Xml(doc) => xml_reader::extract_employees(&doc),
        }
    }
}

/// Read `path` and run it through a [`Preprocessor`] with the standard aliases.
pub fn preprocess_file(path: &Path) -> Result<CanonicalTable, PreprocessError> {
    let bytes = fs::read(path).map_err(|source| PreprocessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Preprocessor::new(&bytes).parse()
}
