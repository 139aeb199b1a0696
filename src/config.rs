use std::{env, path::PathBuf, str::FromStr, time::Duration};

use url::Url;

use crate::{error::ConfigError, fetch::RetryPolicy};

/// Where the employee roster is published.
pub const DEFAULT_SOURCE_URL: &str = "https://drive.google.com/uc?id=demo-id&export=download";
pub const DEFAULT_DOWNLOAD_PATH: &str = "data/downloaded_file";
pub const DEFAULT_OUTPUT_PATH: &str = "data/parsed_employees.csv";

pub const ENV_SOURCE_URL: &str = "ROSTER_SOURCE_URL";
pub const ENV_DOWNLOAD_PATH: &str = "ROSTER_DOWNLOAD_PATH";
pub const ENV_OUTPUT_PATH: &str = "ROSTER_OUTPUT_PATH";
pub const ENV_MAX_ATTEMPTS: &str = "ROSTER_MAX_ATTEMPTS";
pub const ENV_RETRY_DELAY_MS: &str = "ROSTER_RETRY_DELAY_MS";
pub const ENV_TIMEOUT_SECS: &str = "ROSTER_TIMEOUT_SECS";

/// Settings shared by both binaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source_url: Url,
    /// Raw payload handed from `download` to `preprocess`.
    pub download_path: PathBuf,
    /// Canonical CSV written by `preprocess`.
    pub output_path: PathBuf,
    pub retry: RetryPolicy,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; unset keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = get(ENV_SOURCE_URL).unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
        let source_url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            key: ENV_SOURCE_URL,
            value: raw_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(source_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: ENV_SOURCE_URL,
                value: raw_url,
                reason: "scheme must be http or https".into(),
            });
        }

        let defaults = RetryPolicy::default();
        let max_attempts: u32 = parse_or(
            get(ENV_MAX_ATTEMPTS),
            ENV_MAX_ATTEMPTS,
            defaults.max_attempts,
        )?;
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_MAX_ATTEMPTS,
                value: "0".into(),
                reason: "at least one attempt is required".into(),
            });
        }
        let delay_ms: u64 = parse_or(
            get(ENV_RETRY_DELAY_MS),
            ENV_RETRY_DELAY_MS,
            defaults.delay.as_millis() as u64,
        )?;
        let timeout_secs: u64 = parse_or(
            get(ENV_TIMEOUT_SECS),
            ENV_TIMEOUT_SECS,
            defaults.timeout.as_secs(),
        )?;

        Ok(Self {
            source_url,
            download_path: get(ENV_DOWNLOAD_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_PATH)),
            output_path: get(ENV_OUTPUT_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            retry: RetryPolicy {
                max_attempts,
                delay: Duration::from_millis(delay_ms),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let s = Settings::from_lookup(lookup(&[]))?;
        assert_eq!(s.source_url.as_str(), DEFAULT_SOURCE_URL);
        assert_eq!(s.download_path, PathBuf::from("data/downloaded_file"));
        assert_eq!(s.output_path, PathBuf::from("data/parsed_employees.csv"));
        assert_eq!(s.retry, RetryPolicy::default());
        assert_eq!(s.retry.max_attempts, 3);
        assert_eq!(s.retry.delay, Duration::from_secs(2));
        assert_eq!(s.retry.timeout, Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn test_overrides() -> anyhow::Result<()> {
        let s = Settings::from_lookup(lookup(&[
            (ENV_SOURCE_URL, "http://localhost:8080/roster.xlsx"),
            (ENV_DOWNLOAD_PATH, "/tmp/in.bin"),
            (ENV_OUTPUT_PATH, "  "),
            (ENV_MAX_ATTEMPTS, "5"),
            (ENV_RETRY_DELAY_MS, "250"),
            (ENV_TIMEOUT_SECS, " 30 "),
        ]))?;
        assert_eq!(s.source_url.host_str(), Some("localhost"));
        assert_eq!(s.download_path, PathBuf::from("/tmp/in.bin"));
        assert_eq!(s.output_path, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert_eq!(
            s.retry,
            RetryPolicy {
                max_attempts: 5,
                delay: Duration::from_millis(250),
                timeout: Duration::from_secs(30),
            }
        );
        Ok(())
    }

    #[test]
    fn test_rejects_bad_values() {
        for (key, value) in [
            (ENV_SOURCE_URL, "not a url"),
            (ENV_SOURCE_URL, "ftp://example.com/file"),
            (ENV_MAX_ATTEMPTS, "three"),
            (ENV_MAX_ATTEMPTS, "0"),
            (ENV_RETRY_DELAY_MS, "-1"),
        ] {
            match Settings::from_lookup(lookup(&[(key, value)])) {
                Err(ConfigError::Invalid { key: k, .. }) => assert_eq!(k, key),
                other => panic!("{key}={value:?} should be rejected, got {other:?}"),
            }
        }
    }
}
