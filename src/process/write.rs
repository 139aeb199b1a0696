use std::{
    fs, io,
    path::{Path, PathBuf},
};

use csv::WriterBuilder;
use tracing::info;

use crate::{error::PreprocessError, process::CanonicalTable};

/// Write `table` as CSV: the canonical header row (even with no records), then
/// one row per record, nulls as empty fields.
///
/// Goes through a temp file in the destination directory and a rename, so a
/// failed run never leaves a partial file at `path`.
pub fn write_canonical_csv(table: &CanonicalTable, path: &Path) -> Result<(), PreprocessError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(io_error(&dir))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.csv".into());
    let tmp_path = dir.join(format!(".{}.tmp", file_name));

    let result = write_rows(table, &tmp_path).and_then(|_| fs::rename(&tmp_path, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_error(path)(e));
    }

    info!(path = %path.display(), records = table.len(), "saved parsed employee data");
    Ok(())
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> PreprocessError {
    let path = path.to_path_buf();
    move |source| PreprocessError::Io { path, source }
}

fn write_rows(table: &CanonicalTable, tmp_path: &Path) -> io::Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(tmp_path)?;
    wtr.write_record(CanonicalTable::columns())?;
    for record in table.records() {
        wtr.write_record(record.values().iter().map(|v| v.to_string()))?;
    }
    wtr.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CanonicalField, EmployeeRecord, Value};
    use tempfile::tempdir;

    #[test]
    fn test_writes_header_and_rows() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("parsed_employees.csv");
        let table = CanonicalTable::new(vec![EmployeeRecord::from_fn(|f| match f {
            CanonicalField::EmployeeId => Value::Int(101),
            CanonicalField::FirstName => Value::Text("John, Jr.".into()),
            CanonicalField::PhoneNumber => Value::Null,
            other => Value::Text(other.xml_tag()),
        })]);

        write_canonical_csv(&table, &path)?;

        let written = fs::read_to_string(&path)?;
        assert_eq!(
            written,
            "Employee ID,First Name,Last Name,Email,Job Title,Phone Number,Hire Date\n\
             101,\"John, Jr.\",lastname,email,jobtitle,,hiredate\n"
        );
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_table_still_has_header() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        write_canonical_csv(&CanonicalTable::default(), &path)?;
        assert_eq!(
            fs::read_to_string(&path)?,
            "Employee ID,First Name,Last Name,Email,Job Title,Phone Number,Hire Date\n"
        );
        Ok(())
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() -> anyhow::Result<()> {
        let dir = tempdir()?;
        // a directory where the file should go makes the rename fail
        let path = dir.path().join("taken");
        fs::create_dir_all(path.join("child"))?;

        let err = write_canonical_csv(&CanonicalTable::default(), &path).unwrap_err();
        assert!(matches!(err, PreprocessError::Io { .. }));
        assert!(!dir.path().join(".taken.tmp").exists());
        assert!(path.is_dir());
        Ok(())
    }
}
