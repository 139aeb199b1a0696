// src/fetch/mod.rs

pub mod download;
pub mod manifest;

pub use download::{
    save_payload, DownloadOutcome, Downloader, RetryPolicy, REQUEST_TIMEOUT, RETRY_DELAY,
    RETRY_LIMIT,
};
pub use manifest::DownloadManifest;
