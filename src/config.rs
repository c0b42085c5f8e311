//! Configuration types for poke-aggregator

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, time::Duration};
use utoipa::ToSchema;

/// Base address of the public PokeAPI
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2/";

/// Upstream catalog client settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UpstreamConfig {
    /// Base URL of the catalog API, with trailing slash (default: PokeAPI v2)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,

    /// Upper bound on catalog entries fetched by the listing call (default: 2000)
    #[serde(default = "default_catalog_limit")]
    pub catalog_limit: u32,

    /// Retry policy for transient upstream failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_request_timeout(),
            catalog_limit: default_catalog_limit(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry configuration for transient upstream failures
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt (default: 2, 0 disables retry)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 250 milliseconds)
    #[serde(default = "default_initial_delay", with = "millis_serde")]
    #[schema(value_type = u64)]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 5 seconds)
    #[serde(default = "default_max_delay", with = "millis_serde")]
    #[schema(value_type = u64)]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Detail cache settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CacheConfig {
    /// Time-to-live of cached item and species details (default: 600 seconds)
    #[serde(default = "default_cache_ttl", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_cache_ttl(),
        }
    }
}

/// Aggregation pipeline settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PipelineConfig {
    /// Maximum in-flight upstream detail fetches (default: 5)
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Page size used when a listing request omits `limit` (default: 20)
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Description language preference, most preferred first (default: ["es", "en"])
    #[serde(default = "default_description_languages")]
    pub description_languages: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
            default_page_size: default_page_size(),
            description_languages: default_description_languages(),
        }
    }
}

/// SMTP settings for outbound notifications
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct MailConfig {
    /// Address used in the From header and as the SMTP login
    pub sender_address: String,

    /// SMTP password for the sender account
    pub sender_password: String,

    /// SMTP relay host
    pub host: String,

    /// SMTP relay port (default: 587)
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Upgrade the connection with STARTTLS (default: true)
    #[serde(default = "default_true")]
    pub starttls: bool,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("sender_address", &self.sender_address)
            .field("sender_password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("starttls", &self.starttls)
            .finish()
    }
}

impl MailConfig {
    /// Check that every field needed to open an SMTP session is present
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("mail.sender_address", &self.sender_address),
            ("mail.sender_password", &self.sender_password),
            ("mail.host", &self.host),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config {
                    message: format!("{key} must not be empty"),
                    key: Some(key.to_string()),
                });
            }
        }
        if self.port == 0 {
            return Err(Error::Config {
                message: "mail.port must be non-zero".to_string(),
                key: Some("mail.port".to_string()),
            });
        }
        Ok(())
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:5089)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: the two local frontend origins)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration
///
/// Grouped into sub-configs:
/// - [`upstream`](UpstreamConfig): catalog base URL, timeouts, retry policy
/// - [`cache`](CacheConfig): detail cache TTL
/// - [`pipeline`](PipelineConfig): concurrency ceiling, paging defaults, description languages
/// - [`mail`](MailConfig): SMTP transport (optional; notifications fail with 400 without it)
/// - [`api`](ApiConfig): bind address, CORS, Swagger UI
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Upstream catalog client settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Detail cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Aggregation pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// SMTP transport settings
    #[serde(default)]
    pub mail: Option<MailConfig>,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from a JSON file, then validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    ///
    /// Mail settings are not checked here; a missing or incomplete mail section
    /// only disables notifications.
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.upstream.base_url).is_err() {
            return Err(Error::Config {
                message: format!("invalid base URL '{}'", self.upstream.base_url),
                key: Some("upstream.base_url".to_string()),
            });
        }
        if self.upstream.catalog_limit == 0 {
            return Err(Error::Config {
                message: "catalog_limit must be at least 1".to_string(),
                key: Some("upstream.catalog_limit".to_string()),
            });
        }
        if self.pipeline.max_concurrent_fetches == 0 {
            return Err(Error::Config {
                message: "max_concurrent_fetches must be at least 1".to_string(),
                key: Some("pipeline.max_concurrent_fetches".to_string()),
            });
        }
        if self.pipeline.default_page_size == 0 {
            return Err(Error::Config {
                message: "default_page_size must be at least 1".to_string(),
                key: Some("pipeline.default_page_size".to_string()),
            });
        }
        Ok(())
    }

    /// Overlay `MAIL_SENDER`, `MAIL_PASSWORD`, `MAIL_HOST` and `MAIL_PORT` onto the mail section
    ///
    /// `lookup` resolves a variable name to its value; pass `|k| std::env::var(k).ok()`
    /// for the process environment. Unset variables keep the file value. A mail
    /// section is created when any variable is set.
    pub fn apply_mail_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sender = lookup("MAIL_SENDER");
        let password = lookup("MAIL_PASSWORD");
        let host = lookup("MAIL_HOST");
        let port = lookup("MAIL_PORT");

        if sender.is_none() && password.is_none() && host.is_none() && port.is_none() {
            return Ok(());
        }

        let mail = self.mail.get_or_insert_with(|| MailConfig {
            sender_address: String::new(),
            sender_password: String::new(),
            host: String::new(),
            port: default_smtp_port(),
            starttls: true,
        });

        if let Some(sender) = sender {
            mail.sender_address = sender;
        }
        if let Some(password) = password {
            mail.sender_password = password;
        }
        if let Some(host) = host {
            mail.host = host;
        }
        if let Some(port) = port {
            mail.port = port.trim().parse().map_err(|_| Error::Config {
                message: format!("MAIL_PORT must be a port number, got '{}'", port),
                key: Some("mail.port".to_string()),
            })?;
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_catalog_limit() -> u32 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(250)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_max_concurrent_fetches() -> usize {
    5
}

fn default_page_size() -> u32 {
    20
}

fn default_description_languages() -> Vec<String> {
    vec!["es".to_string(), "en".to_string()]
}

fn default_smtp_port() -> u16 {
    587
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5089))
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "https://localhost:7175".to_string(),
        "http://localhost:5089".to_string(),
    ]
}

// Duration serialization helper (as seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (as milliseconds)
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
