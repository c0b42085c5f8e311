//! # poke-aggregator
//!
//! Filtered, paginated and exportable views over the PokeAPI catalog.
//!
//! ## Design Philosophy
//!
//! - **Bounded fan-out** - Per-item detail calls run concurrently behind a fixed-size limiter
//! - **Catalog order** - Results are assembled by source index, never by completion order
//! - **Partial failure** - A failed detail fetch drops that item; only a failed listing is fatal
//! - **Explicit configuration** - Upstream, cache, mail and API settings live in one [`Config`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use poke_aggregator::{AggregationPipeline, Config, ListQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let pipeline = AggregationPipeline::from_config(&config)?;
//!
//!     let query = ListQuery::page(1, 20).with_name("chu").with_category("electric");
//!     let page = pipeline.list_filtered(&query).await?;
//!     for item in &page.items {
//!         println!("#{} {} ({})", item.id, item.name, item.category_names());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Time-bounded detail cache
pub mod cache;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Spreadsheet export
pub mod export;
/// Concurrency limiter for upstream calls
pub mod limiter;
/// Email notifications
pub mod notify;
/// Aggregation, filtering and pagination
pub mod pipeline;
/// Retry logic with exponential backoff
pub mod retry;
/// Core domain types
pub mod types;
/// Upstream catalog client
pub mod upstream;

#[cfg(test)]
mod test_helpers;

// Re-export commonly used types
pub use api::AppState;
pub use cache::DetailCache;
pub use config::{Config, MailConfig};
pub use error::{ApiError, Error, ErrorDetail, FetchError, NotificationError, Result, ToHttpStatus};
pub use export::SpreadsheetExport;
pub use limiter::ConcurrencyLimiter;
pub use notify::{Mailer, Notifier, NotifyRequest, SmtpMailer};
pub use pipeline::{AggregationPipeline, ListQuery};
pub use types::{CatalogItem, CategoryRef, ItemDetail, ItemSummary, PageResult, SpeciesDetail};
pub use upstream::{CatalogSource, PokeApiClient};

/// Serve the API until a termination signal arrives, then drain and return.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use poke_aggregator::{AppState, Config, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let state = AppState::from_config(Arc::new(Config::default()))?;
///     run_with_shutdown(state).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(state: AppState) -> Result<()> {
    api::serve_until(state, wait_for_signal()).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
