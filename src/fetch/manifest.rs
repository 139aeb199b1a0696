use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fetch::DownloadOutcome;

/// Sidecar record of where a downloaded payload came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadManifest {
    pub url: String,
    pub filename: String,
    pub size_bytes: u64,
    pub attempts: u32,
    pub download_start: DateTime<Utc>,
    pub download_end: DateTime<Utc>,
}

impl DownloadManifest {
    pub fn from_outcome(url: &str, download_path: &Path, outcome: &DownloadOutcome) -> Self {
        Self {
            url: url.to_string(),
            filename: download_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size_bytes: outcome.bytes.len() as u64,
            attempts: outcome.attempts,
            download_start: outcome.started,
            download_end: outcome.finished,
        }
    }

    /// `<download_path>.manifest.json`
    pub fn path_for(download_path: &Path) -> PathBuf {
        let mut name = download_path.as_os_str().to_owned();
        name.push(".manifest.json");
        PathBuf::from(name)
    }

    /// Write next to `download_path`, via a temp file and rename.
    pub fn write(&self, download_path: &Path) -> Result<PathBuf> {
        let path = Self::path_for(download_path);
        let tmp_path = {
            let mut name = path.as_os_str().to_owned();
            name.push(".tmp");
            PathBuf::from(name)
        };

        let mut tmp = fs::File::create(&tmp_path)
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        serde_json::to_writer_pretty(&mut tmp, self).context("serializing manifest")?;
        tmp.write_all(b"\n")?;
        drop(tmp);

        fs::rename(&tmp_path, &path)
            .with_context(|| format!("renaming {} to {}", tmp_path.display(), path.display()))?;
        Ok(path)
    }

    /// Load the manifest for `download_path`, if one was written.
    pub fn load(download_path: &Path) -> Result<Option<Self>> {
        let path = Self::path_for(download_path);
        let f = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("opening {}", path.display())),
        };
        let manifest = serde_json::from_reader(f)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn outcome() -> DownloadOutcome {
        DownloadOutcome {
            bytes: vec![b'x'; 42],
            attempts: 2,
            started: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            finished: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 3).unwrap(),
        }
    }

    #[test]
    fn test_path_for_appends_suffix() {
        assert_eq!(
            DownloadManifest::path_for(Path::new("data/downloaded_file")),
            PathBuf::from("data/downloaded_file.manifest.json")
        );
    }

    #[test]
    fn test_write_then_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let download = dir.path().join("downloaded_file");
        assert_eq!(DownloadManifest::load(&download)?, None);

        let manifest = DownloadManifest::from_outcome("http://host/roster", &download, &outcome());
        assert_eq!(manifest.filename, "downloaded_file");
        assert_eq!(manifest.size_bytes, 42);

        let written = manifest.write(&download)?;
        assert!(written.exists());
        assert!(!dir.path().join("downloaded_file.manifest.json.tmp").exists());
        assert_eq!(DownloadManifest::load(&download)?, Some(manifest));
        Ok(())
    }

    #[test]
    fn test_load_rejects_garbage() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let download = dir.path().join("downloaded_file");
        fs::write(DownloadManifest::path_for(&download), "not json")?;
        assert!(DownloadManifest::load(&download).is_err());
        Ok(())
    }
}
