use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::error::{NotifierError, Result};

pub const DEFAULT_URL: &str = "http://localhost:8080";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// Endpoint every line is posted to
    #[validate(url, custom(function = "validate_http_scheme"))]
    pub url: String,

    /// Delay each worker waits before every delivery
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Number of delivery workers, also the work queue capacity
    #[validate(range(min = 1, max = 1024))]
    pub workers: usize,

    /// Timeout applied to each HTTP request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Longest input line accepted before the reader gives up
    #[validate(range(min = 1))]
    pub max_line_length: usize,

    /// Print every accepted line to stdout
    pub echo: bool,

    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            interval: DEFAULT_INTERVAL,
            workers: DEFAULT_WORKERS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            echo: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            NotifierError::ConfigurationError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Validate and hand back the config, ready for the pipeline.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Work queue capacity. Equal to the pool size so a full pool backs up the reader.
    pub fn queue_capacity(&self) -> usize {
        self.workers
    }
}

fn validate_http_scheme(url: &str) -> std::result::Result<(), ValidationError> {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::new("http_scheme")
            .with_message("URL scheme must be http or https".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.workers, 5);
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.queue_capacity(), 5);
        assert!(config.validated().is_ok());
    }

    #[test]
    fn test_rejects_url_without_scheme() {
        let config = Config {
            url: "localhost:8080".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validated(),
            Err(NotifierError::ValidationError(_))
        ));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let config = Config {
            url: "ftp://example.com/drop".to_string(),
            ..Config::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_rejects_empty_pool() {
        let config = Config {
            workers: 0,
            ..Config::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_from_json_with_humantime_durations() {
        let config = Config::from_json(
            r#"{"url": "https://hooks.example.com/in", "interval": "250ms", "workers": 2}"#,
        )
        .unwrap();
        assert_eq!(config.url, "https://hooks.example.com/in");
        assert_eq!(config.interval, Duration::from_millis(250));
        assert_eq!(config.workers, 2);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.max_line_length, DEFAULT_MAX_LINE_LENGTH);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(NotifierError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_serializes_durations_as_text() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("\"interval\":\"5s\""));
    }
}
