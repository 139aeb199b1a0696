use std::{io, path::PathBuf};

use reqwest::StatusCode;
use thiserror::Error;

use crate::process::FileFormat;

/// Failures of the download stage.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("server responded with HTTP {status}")]
    Status { status: StatusCode },

    #[error("empty file received")]
    EmptyBody,

    #[error(
        "file download from {url} failed after {attempts} attempts; \
         check the URL or your internet connection"
    )]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

/// Failures of the preprocessing stage. All are terminal.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("unsupported or unknown file format")]
    UnsupportedFormat,

    #[error("missing required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    #[error("failed to parse {format} source: {reason}")]
    MalformedSource { format: FileFormat, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
