//! poke-aggregator server binary
//!
//! Usage: `poke-aggregator [CONFIG_PATH]`. The config path may also come from
//! `POKE_AGGREGATOR_CONFIG`; without either, built-in defaults are used.

use poke_aggregator::{AppState, Config, run_with_shutdown};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_ENV: &str = "POKE_AGGREGATOR_CONFIG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok());

    let mut config = match config_path {
        Some(path) => {
            tracing::info!(path = %path, "loading configuration");
            Config::from_file(&path)?
        }
        None => {
            tracing::info!("no configuration file given, using defaults");
            Config::default()
        }
    };
    config.apply_mail_overrides(|key| std::env::var(key).ok())?;

    let state = AppState::from_config(Arc::new(config))?;
    run_with_shutdown(state).await?;

    Ok(())
}
