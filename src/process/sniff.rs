use std::fmt;

use anyhow::Result;
use tracing::debug;

use crate::process::{
    csv_reader::parse_csv, excel_reader::parse_workbook, json_reader::parse_json,
    xml_reader::parse_xml, xml_reader::XmlDocument, ParsedTable,
};

/// Structural format of a downloaded payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Csv,
    Excel,
    Json,
    Xml,
    Unknown,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Excel => "excel",
            FileFormat::Json => "json",
            FileFormat::Xml => "xml",
            FileFormat::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful probe produced.
#[derive(Debug)]
pub enum Document {
    Table(ParsedTable),
    Xml(XmlDocument),
}

#[derive(Debug)]
pub struct Sniffed {
    pub format: FileFormat,
    pub document: Document,
}

type Probe = fn(&[u8]) -> Result<Document>;

fn probe_csv(bytes: &[u8]) -> Result<Document> {
    parse_csv(bytes).map(Document::Table)
}

fn probe_excel(bytes: &[u8]) -> Result<Document> {
    parse_workbook(bytes).map(Document::Table)
}

fn probe_json(bytes: &[u8]) -> Result<Document> {
    parse_json(bytes).map(Document::Table)
}

fn probe_xml(bytes: &[u8]) -> Result<Document> {
    parse_xml(bytes).map(Document::Xml)
}

/// Tried in order; the first probe that parses wins. CSV goes first since it
/// is the most permissive, XML last since it is the most distinctive.
static PROBES: [(FileFormat, Probe); 4] = [
    (FileFormat::Csv, probe_csv),
    (FileFormat::Excel, probe_excel),
    (FileFormat::Json, probe_json),
    (FileFormat::Xml, probe_xml),
];

/// Trial-parse `bytes` under each candidate format. `None` means no parser
/// accepted it.
pub fn sniff(bytes: &[u8]) -> Option<Sniffed> {
    for (format, probe) in PROBES.iter() {
        match probe(bytes) {
            Ok(document) => {
                debug!(%format, "probe accepted payload");
                return Some(Sniffed {
                    format: *format,
                    document,
                });
            }
            Err(e) => debug!(%format, error = %e, "probe rejected payload"),
        }
    }
    None
}

pub fn detect(bytes: &[u8]) -> FileFormat {
    sniff(bytes).map_or(FileFormat::Unknown, |s| s.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use crate::process::excel_reader::tests::build_xlsx;

    /// Deterministic pseudo-random bytes for a given seed.
    fn noise(seed: u32, len: usize) -> Vec<u8> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 16) as u8
            })
            .collect()
    }

    #[test]
    fn test_detect_csv() {
        init_test_logging();
        let csv = "Employee ID,First Name\n101,John\n";
        assert_eq!(detect(csv.as_bytes()), FileFormat::Csv);
    }

    #[test]
    fn test_detect_excel() {
        init_test_logging();
        let xlsx = build_xlsx(&[&["Employee ID", "First Name"], &["101", "John"]]);
        assert_eq!(detect(&xlsx), FileFormat::Excel);
    }

    #[test]
    fn test_detect_json() {
        init_test_logging();
        let json = "[\n  {\"Employee ID\": 101, \"First Name\": \"John\"},\n  {\"Employee ID\": 102, \"First Name\": \"Jane\"}\n]";
        assert_eq!(detect(json.as_bytes()), FileFormat::Json);
    }

    #[test]
    fn test_detect_xml() {
        init_test_logging();
        let xml = "<employees>\n  <employee>\n    <firstname>John</firstname>\n  </employee>\n</employees>";
        assert_eq!(detect(xml.as_bytes()), FileFormat::Xml);
    }

    #[test]
    fn test_degenerate_buffers_are_unknown() {
        init_test_logging();
        assert_eq!(detect(b""), FileFormat::Unknown);
        assert_eq!(detect(b"   \n\t\r\n  "), FileFormat::Unknown);
    }

    #[test]
    fn test_random_noise_is_unknown() {
        init_test_logging();
        for seed in [0x2545_f491, 7, 1_234_567, 0xdead_beef] {
            for len in [64, 512, 4096] {
                let buf = noise(seed, len);
                assert_eq!(detect(&buf), FileFormat::Unknown, "seed {seed:#x}, len {len}");
            }
        }
    }

    #[test]
    fn test_csv_wins_over_json() {
        init_test_logging();
        // One line, one comma: a two-column CSV header and a columns-oriented
        // JSON object at the same time.
        let ambiguous = br#"{"a": [1], "b": [2]}"#;
        assert!(parse_json(ambiguous).is_ok());
        assert!(parse_csv(ambiguous).is_ok());
        assert_eq!(detect(ambiguous), FileFormat::Csv);
    }

    #[test]
    fn test_sniff_returns_parsed_document() {
        init_test_logging();
        let sniffed = sniff(b"x,y\n1,2\n").expect("csv should be accepted");
        assert_eq!(sniffed.format, FileFormat::Csv);
        match sniffed.document {
            Document::Table(table) => assert_eq!(table.headers, vec!["x", "y"]),
            Document::Xml(_) => panic!("expected a table"),
        }
    }
}
