//! Bounded-concurrency aggregation, filtering and pagination over the catalog
//!
//! A listing request runs in a fixed order:
//!
//! 1. validate paging parameters (no upstream call on bad input)
//! 2. fetch the catalog listing in one call (fatal on failure)
//! 3. name filter, case-insensitive substring, no detail fetches
//! 4. category filter, one cached + limited detail fetch per surviving item
//! 5. count, paginate, and hydrate only the requested page
//!
//! Per-item fetches run concurrently. Each result is written to the slot of
//! its source index and the slots are compacted in index order, so output
//! always follows catalog order regardless of completion order. A failed
//! per-item fetch drops that item and never aborts its siblings.

use crate::cache::DetailCache;
use crate::config::Config;
use crate::error::{Error, FetchError, Result};
use crate::limiter::ConcurrencyLimiter;
use crate::types::{CatalogItem, CategoryRef, ItemDetail, ItemSummary, PageResult, SpeciesDetail};
use crate::upstream::{CatalogSource, PokeApiClient};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::sync::Arc;

/// Category filter value meaning "no category filter"
pub const ALL_CATEGORIES: &str = "all";

/// Parameters of a filtered, paginated listing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive substring the item name must contain
    pub name_filter: Option<String>,
    /// Category the item must belong to; empty or "all" disables the filter
    pub category_filter: Option<String>,
    /// 1-based page number
    pub page_number: i64,
    /// Items per page
    pub page_size: i64,
}

impl ListQuery {
    /// Query for one page with no filters
    pub fn page(page_number: i64, page_size: i64) -> Self {
        Self {
            page_number,
            page_size,
            ..Default::default()
        }
    }

    /// Set the name filter
    pub fn with_name(mut self, filter: impl Into<String>) -> Self {
        self.name_filter = Some(filter.into());
        self
    }

    /// Set the category filter
    pub fn with_category(mut self, filter: impl Into<String>) -> Self {
        self.category_filter = Some(filter.into());
        self
    }

    /// Check paging parameters, returning them as `(page_number, page_size)`
    pub fn validate(&self) -> Result<(usize, usize)> {
        let page_size = usize::try_from(self.page_size)
            .ok()
            .filter(|size| *size >= 1)
            .ok_or_else(|| Error::InvalidInput {
                field: "limit".to_string(),
                message: format!("must be at least 1, got {}", self.page_size),
            })?;
        let page_number = usize::try_from(self.page_number)
            .ok()
            .filter(|page| *page >= 1)
            .ok_or_else(|| Error::InvalidInput {
                field: "page".to_string(),
                message: format!("must be at least 1, got {}", self.page_number),
            })?;
        Ok((page_number, page_size))
    }
}

/// A catalog entry that survived filtering, with its detail if one was fetched
#[derive(Debug)]
struct Candidate {
    item: CatalogItem,
    detail: Option<ItemDetail>,
}

/// The aggregation pipeline
///
/// Cloning is cheap; clones share the upstream client, caches and limiter.
#[derive(Clone)]
pub struct AggregationPipeline {
    source: Arc<dyn CatalogSource>,
    items: DetailCache<ItemDetail>,
    species: DetailCache<SpeciesDetail>,
    limiter: ConcurrencyLimiter,
    catalog_limit: u32,
    description_languages: Vec<String>,
}

impl AggregationPipeline {
    /// Build a pipeline over an arbitrary catalog source
    pub fn new(source: Arc<dyn CatalogSource>, config: &Config) -> Self {
        Self {
            source,
            items: DetailCache::new(config.cache.ttl),
            species: DetailCache::new(config.cache.ttl),
            limiter: ConcurrencyLimiter::new(config.pipeline.max_concurrent_fetches),
            catalog_limit: config.upstream.catalog_limit,
            description_languages: config.pipeline.description_languages.clone(),
        }
    }

    /// Build a pipeline backed by the PokeAPI HTTP client
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = PokeApiClient::new(config.upstream.clone())?;
        Ok(Self::new(Arc::new(client), config))
    }

    /// The limiter gating upstream detail fetches
    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Filtered, paginated listing with the page hydrated to full details
    pub async fn list_filtered(&self, query: &ListQuery) -> Result<PageResult> {
        let (page_number, page_size) = query.validate()?;

        let candidates = self
            .filter_candidates(
                query.name_filter.as_deref(),
                query.category_filter.as_deref(),
            )
            .await?;

        let total_matched = candidates.len();
        let total_pages = total_matched.div_ceil(page_size);
        let skip = (page_number - 1).saturating_mul(page_size);

        let page: Vec<Candidate> = candidates.into_iter().skip(skip).take(page_size).collect();
        let requested = page.len();
        let items = self.hydrate(page).await;

        if items.len() < requested {
            tracing::warn!(
                requested,
                hydrated = items.len(),
                page_number,
                "some page items could not be hydrated"
            );
        }

        tracing::info!(
            total_matched,
            total_pages,
            page_number,
            page_size,
            returned = items.len(),
            "listing served"
        );

        Ok(PageResult {
            total_matched,
            total_pages,
            page_number,
            items,
        })
    }

    /// Every item passing both filters, hydrated, in catalog order (no pagination)
    pub async fn filtered_items(
        &self,
        name_filter: Option<&str>,
        category_filter: Option<&str>,
    ) -> Result<Vec<ItemDetail>> {
        let candidates = self.filter_candidates(name_filter, category_filter).await?;
        let expected = candidates.len();
        let items = self.hydrate(candidates).await;
        tracing::debug!(expected, hydrated = items.len(), "filtered item set ready");
        Ok(items)
    }

    /// Full detail of one item, through the cache and the limiter
    pub async fn item_detail(&self, name: &str) -> std::result::Result<ItemDetail, FetchError> {
        let key = normalize_key(name);
        self.items
            .get_or_fetch(&key, || {
                self.limiter.run(self.source.fetch_item_detail(&key))
            })
            .await
    }

    /// Species record of one item, through the cache and the limiter
    pub async fn species_detail(
        &self,
        name: &str,
    ) -> std::result::Result<SpeciesDetail, FetchError> {
        let key = normalize_key(name);
        self.species
            .get_or_fetch(&key, || {
                self.limiter.run(self.source.fetch_species_detail(&key))
            })
            .await
    }

    /// Item detail merged with its localized description
    ///
    /// Fails with [`Error::NotFound`] when the item detail cannot be fetched.
    /// A missing species record only degrades the description.
    pub async fn item_summary(&self, name: &str) -> Result<ItemSummary> {
        let detail = self.item_detail(name).await.map_err(|e| {
            tracing::warn!(name, error = %e, "item detail unavailable");
            Error::NotFound(format!("item '{}'", name))
        })?;

        let species = match self.species_detail(name).await {
            Ok(species) => Some(species),
            Err(e) => {
                tracing::debug!(name, error = %e, "species detail unavailable");
                None
            }
        };

        Ok(ItemSummary::merge(
            detail,
            species.as_ref(),
            &self.description_languages,
        ))
    }

    /// Every category the catalog knows about; empty when the listing fails
    pub async fn categories(&self) -> Vec<CategoryRef> {
        match self.source.fetch_categories().await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::warn!(error = %e, "category listing unavailable");
                Vec::new()
            }
        }
    }

    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>> {
        let page = self
            .source
            .fetch_page(self.catalog_limit, 0)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "catalog listing failed");
                Error::CatalogUnavailable(e)
            })?;
        tracing::debug!(
            fetched = page.results.len(),
            remote_count = page.count,
            "catalog listing fetched"
        );
        Ok(page.results)
    }

    /// Listing plus name and category filters, in catalog order
    async fn filter_candidates(
        &self,
        name_filter: Option<&str>,
        category_filter: Option<&str>,
    ) -> Result<Vec<Candidate>> {
        let catalog = self.fetch_catalog().await?;

        let named: Vec<CatalogItem> = match active_name_filter(name_filter) {
            Some(needle) => catalog
                .into_iter()
                .filter(|item| item.name.to_lowercase().contains(&needle))
                .collect(),
            None => catalog,
        };

        let Some(category) = active_category_filter(category_filter) else {
            return Ok(named
                .into_iter()
                .map(|item| Candidate { item, detail: None })
                .collect());
        };

        let names: Vec<&str> = named.iter().map(|item| item.name.as_str()).collect();
        let candidates = names.len();
        let details = self.fetch_details_indexed(&names).await;

        let survivors: Vec<Candidate> = named
            .into_iter()
            .zip(details)
            .filter_map(|(item, detail)| match detail {
                Some(detail) if detail.has_category(category) => Some(Candidate {
                    item,
                    detail: Some(detail),
                }),
                _ => None,
            })
            .collect();

        tracing::debug!(
            category,
            candidates,
            survivors = survivors.len(),
            "category filter applied"
        );
        Ok(survivors)
    }

    /// Replace candidates with full details, reusing details already fetched
    ///
    /// Items whose detail cannot be fetched are dropped.
    async fn hydrate(&self, candidates: Vec<Candidate>) -> Vec<ItemDetail> {
        let missing: Vec<(usize, &str)> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.detail.is_none())
            .map(|(idx, c)| (idx, c.item.name.as_str()))
            .collect();

        let names: Vec<&str> = missing.iter().map(|(_, name)| *name).collect();
        let fetched = self.fetch_details_indexed(&names).await;

        let mut slots: Vec<Option<ItemDetail>> =
            candidates.iter().map(|c| c.detail.clone()).collect();
        for ((idx, _), detail) in missing.iter().zip(fetched) {
            slots[*idx] = detail;
        }

        slots.into_iter().flatten().collect()
    }

    /// Fetch details for `names` concurrently, one slot per source index
    ///
    /// Slot `i` holds the detail of `names[i]`, or `None` if its fetch failed.
    async fn fetch_details_indexed(&self, names: &[&str]) -> Vec<Option<ItemDetail>> {
        let mut slots: Vec<Option<ItemDetail>> = vec![None; names.len()];

        let mut pending: FuturesUnordered<_> = names
            .iter()
            .enumerate()
            .map(|(idx, name)| async move { (idx, *name, self.item_detail(name).await) })
            .collect();

        while let Some((idx, name, result)) = pending.next().await {
            match result {
                Ok(detail) => slots[idx] = Some(detail),
                Err(e) => tracing::warn!(name, error = %e, "item detail fetch failed, skipping"),
            }
        }

        slots
    }
}

fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn active_name_filter(filter: Option<&str>) -> Option<String> {
    filter.filter(|f| !f.is_empty()).map(str::to_lowercase)
}

fn active_category_filter(filter: Option<&str>) -> Option<&str> {
    filter
        .map(str::trim)
        .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case(ALL_CATEGORIES))
}
