//! Application state for the API server

use crate::Config;
use crate::notify::Notifier;
use crate::pipeline::AggregationPipeline;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Aggregation pipeline serving listings, details and exports
    pub pipeline: AggregationPipeline,

    /// Outbound notification sender
    pub notifier: Notifier,

    /// Configuration (read-only at runtime)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(pipeline: AggregationPipeline, notifier: Notifier, config: Arc<Config>) -> Self {
        Self {
            pipeline,
            notifier,
            config,
        }
    }

    /// Build the pipeline and notifier from `config`
    ///
    /// Mail transport is optional; without it notifications fail with a
    /// configuration error.
    pub fn from_config(config: Arc<Config>) -> crate::Result<Self> {
        let pipeline = AggregationPipeline::from_config(&config)?;
        let mailer = match &config.mail {
            Some(mail) => match crate::notify::SmtpMailer::new(mail) {
                Ok(mailer) => Some(Arc::new(mailer) as Arc<dyn crate::notify::Mailer>),
                Err(e) => {
                    tracing::warn!(error = %e, "mail transport disabled");
                    None
                }
            },
            None => {
                tracing::info!("no mail configuration, notifications disabled");
                None
            }
        };
        let notifier = Notifier::new(pipeline.clone(), mailer);
        Ok(Self::new(pipeline, notifier, config))
    }
}
