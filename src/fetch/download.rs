use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::{fs, time::sleep};
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::error::FetchError;

pub const RETRY_LIMIT: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(2);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How hard to try before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause between a failed attempt and the next one.
    pub delay: Duration,
    /// Per-attempt request timeout.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_LIMIT,
            delay: RETRY_DELAY,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

/// A successful download.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub bytes: Vec<u8>,
    /// Attempts used, including the successful one.
    pub attempts: u32,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

/// Fetches one file with bounded retries. The client keeps cookies between
/// attempts, like a browser session.
pub struct Downloader {
    client: Client,
    url: Url,
    policy: RetryPolicy,
}

impl Downloader {
    pub fn new(url: Url, policy: RetryPolicy) -> Result<Self, FetchError> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .timeout(policy.timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            client,
            url,
            policy: RetryPolicy {
                max_attempts: policy.max_attempts.max(1),
                ..policy
            },
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn attempt(&self) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(FetchError::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }
        let bytes = resp.bytes().await.map_err(FetchError::Transport)?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(bytes.to_vec())
    }

    /// GET the file, retrying on transport errors, non-2xx statuses and empty
    /// bodies. Gives up with [`FetchError::Exhausted`] once every attempt failed.
    #[instrument(level = "info", skip(self), fields(url = %self.url))]
    pub async fn download(&self) -> Result<DownloadOutcome, FetchError> {
        let started = Utc::now();
        let max = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!(attempt, "downloading file");

            let err = match self.attempt().await {
                Ok(bytes) => {
                    info!(attempt, size = bytes.len(), "file downloaded successfully");
                    return Ok(DownloadOutcome {
                        bytes,
                        attempts: attempt,
                        started,
                        finished: Utc::now(),
                    });
                }
                Err(e) => e,
            };

            error!(attempt, error = %err, "download attempt failed");
            if attempt >= max {
                error!(attempts = attempt, "file download failed after multiple attempts");
                return Err(FetchError::Exhausted {
                    url: self.url.to_string(),
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            warn!(delay_ms = self.policy.delay.as_millis() as u64, "retrying");
            sleep(self.policy.delay).await;
        }
    }
}

/// Write the payload to `dest`, creating parent directories as needed.
pub async fn save_payload(dest: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let dest = dest.as_ref();
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(dest, bytes)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;
    Ok(())
}
