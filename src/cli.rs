use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;

/// Message notifier: posts every line read from stdin to the configured URL.
#[derive(Debug, Clone, Parser)]
#[command(name = "notifier", version, about)]
pub struct Args {
    /// URL to which notifications are sent
    #[arg(long, env = "NOTIFIER_URL")]
    pub url: Option<String>,

    /// Seconds each worker waits before sending a notification
    #[arg(long, env = "NOTIFIER_INTERVAL")]
    pub interval: Option<u64>,

    /// Number of delivery workers
    #[arg(long, env = "NOTIFIER_WORKERS")]
    pub workers: Option<usize>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "NOTIFIER_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Longest accepted input line in bytes
    #[arg(long, env = "NOTIFIER_MAX_LINE_LENGTH")]
    pub max_line_length: Option<usize>,

    /// Print every accepted line to stdout
    #[arg(long)]
    pub echo: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "NOTIFIER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// JSON configuration file; flags take precedence over its values
    #[arg(long, env = "NOTIFIER_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Build the effective configuration: defaults, then the file, then flags.
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(secs) = self.interval {
            config.interval = Duration::from_secs(secs);
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(secs) = self.timeout {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(max) = self.max_line_length {
            config.max_line_length = max;
        }
        if self.echo {
            config.echo = true;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        config.validated()
    }
}
