use anyhow::Result;
use clap::Parser;
use notifier::cli::Args;
use notifier::pipeline::Pipeline;
use notifier::shutdown;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = Args::parse()
        .into_config()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("notifier={}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting notifier");
    tracing::debug!(config = %serde_json::to_string(&config)?, "Configuration loaded");

    let pipeline = Pipeline::from_config(config)
        .map_err(|e| anyhow::anyhow!("Failed to create pipeline: {}", e))?;

    match pipeline.run(tokio::io::stdin(), shutdown::interrupt()).await {
        Ok(outcome) => {
            tracing::info!(
                reason = %outcome.reason,
                delivered = outcome.report.delivered,
                failed = outcome.report.failed,
                "Notifier finished"
            );
            // A blocked stdin read would otherwise hold up runtime shutdown.
            std::process::exit(0);
        }
        Err(e) => {
            tracing::error!(error = %e, "Notifier terminated");
            std::process::exit(1);
        }
    }
}
