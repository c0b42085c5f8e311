//! Upstream catalog client
//!
//! [`CatalogSource`] is the seam between the aggregation pipeline and the
//! remote catalog. [`PokeApiClient`] implements it over HTTP with reqwest;
//! tests substitute in-memory sources or point the client at a mock server.

use crate::config::UpstreamConfig;
use crate::error::{Error, FetchError};
use crate::retry::fetch_with_retry;
use crate::types::{
    CatalogPage, CategoryListResponse, CategoryRef, DetailResponse, ItemDetail, SpeciesDetail,
    SpeciesResponse,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

/// Fetch-by-key access to the remote catalog
///
/// Implementations perform a single logical fetch per call and carry no
/// business logic. Transport and payload failures both surface as
/// [`FetchError`].
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one page of the catalog listing
    async fn fetch_page(&self, limit: u32, offset: u32) -> Result<CatalogPage, FetchError>;

    /// Fetch the full detail record of one item by name or id
    async fn fetch_item_detail(&self, key: &str) -> Result<ItemDetail, FetchError>;

    /// Fetch the species record of one item by name or id
    async fn fetch_species_detail(&self, key: &str) -> Result<SpeciesDetail, FetchError>;

    /// Fetch every category the catalog knows about
    async fn fetch_categories(&self) -> Result<Vec<CategoryRef>, FetchError>;
}

/// HTTP client for the PokeAPI
#[derive(Clone, Debug)]
pub struct PokeApiClient {
    http: reqwest::Client,
    base_url: Url,
    config: UpstreamConfig,
}

impl PokeApiClient {
    /// Build a client from upstream settings
    pub fn new(config: UpstreamConfig) -> crate::Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", config.base_url, e),
            key: Some("upstream.base_url".to_string()),
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| Error::Other(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url.join(path).map_err(|e| FetchError::Decode {
            url: format!("{}{}", self.base_url, path),
            reason: format!("invalid request URL: {}", e),
        })
    }

    /// GET `url` and decode its JSON body, retrying transient failures
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        fetch_with_retry(&self.config.retry, || self.get_json_once(url.clone())).await
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let url_str = url.to_string();
        tracing::debug!(url = %url_str, "upstream GET");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(&url_str, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(&url_str, &e))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            url: url_str,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl CatalogSource for PokeApiClient {
    async fn fetch_page(&self, limit: u32, offset: u32) -> Result<CatalogPage, FetchError> {
        let mut url = self.endpoint("pokemon")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        self.get_json(url).await
    }

    async fn fetch_item_detail(&self, key: &str) -> Result<ItemDetail, FetchError> {
        let url = self.endpoint(&format!("pokemon/{}/", urlencoding::encode(key)))?;
        self.get_json::<DetailResponse>(url).await.map(Into::into)
    }

    async fn fetch_species_detail(&self, key: &str) -> Result<SpeciesDetail, FetchError> {
        let url = self.endpoint(&format!("pokemon-species/{}/", urlencoding::encode(key)))?;
        self.get_json::<SpeciesResponse>(url).await.map(Into::into)
    }

    async fn fetch_categories(&self) -> Result<Vec<CategoryRef>, FetchError> {
        let url = self.endpoint("type/")?;
        self.get_json::<CategoryListResponse>(url)
            .await
            .map(Into::into)
    }
}
