//! Shared test helpers: an in-memory catalog source, a recording mailer and
//! item builders.

use crate::error::{FetchError, NotificationError};
use crate::notify::{Mailer, OutgoingMail};
use crate::types::{CatalogItem, CatalogPage, CategoryRef, ItemDetail, SpeciesDetail};
use crate::upstream::CatalogSource;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory catalog that counts calls and tracks concurrent detail fetches
#[derive(Default)]
pub(crate) struct FakeCatalog {
    pub(crate) items: Vec<ItemDetail>,
    pub(crate) failing: HashSet<String>,
    pub(crate) species: HashMap<String, SpeciesDetail>,
    pub(crate) categories: Option<Vec<CategoryRef>>,
    pub(crate) catalog_down: bool,
    /// Later catalog entries answer sooner, reversing completion order
    pub(crate) stagger: bool,
    pub(crate) page_calls: AtomicUsize,
    pub(crate) detail_calls: AtomicUsize,
    pub(crate) in_flight: AtomicUsize,
    pub(crate) peak: AtomicUsize,
}

impl FakeCatalog {
    pub(crate) fn with_items(items: Vec<ItemDetail>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub(crate) fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub(crate) fn staggered(mut self) -> Self {
        self.stagger = true;
        self
    }

    pub(crate) fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

fn not_found(key: &str) -> FetchError {
    FetchError::Status {
        url: format!("fake://pokemon/{key}/"),
        status: 404,
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_page(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<CatalogPage, FetchError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if self.catalog_down {
            return Err(FetchError::Transport {
                url: "fake://pokemon".into(),
                reason: "connection refused".into(),
                transient: true,
            });
        }
        let results = self
            .items
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|d| CatalogItem {
                name: d.name.clone(),
                locator: format!("fake://pokemon/{}/", d.id),
            })
            .collect();
        Ok(CatalogPage {
            count: self.items.len() as u32,
            next: None,
            previous: None,
            results,
        })
    }

    async fn fetch_item_detail(&self, key: &str) -> Result<ItemDetail, FetchError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let position = self.items.iter().position(|d| d.name.eq_ignore_ascii_case(key));
        let delay = match (self.stagger, position) {
            (true, Some(idx)) => (self.items.len() - idx) as u64 * 2,
            _ => 1,
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(key) {
            return Err(not_found(key));
        }
        position
            .map(|idx| self.items[idx].clone())
            .ok_or_else(|| not_found(key))
    }

    async fn fetch_species_detail(
        &self,
        key: &str,
    ) -> Result<SpeciesDetail, FetchError> {
        self.species.get(key).cloned().ok_or_else(|| not_found(key))
    }

    async fn fetch_categories(&self) -> Result<Vec<CategoryRef>, FetchError> {
        self.categories.clone().ok_or_else(|| FetchError::Decode {
            url: "fake://type/".into(),
            reason: "schema mismatch".into(),
        })
    }
}

pub(crate) fn item(id: u32, name: &str, categories: &[&str]) -> ItemDetail {
    ItemDetail {
        id,
        name: name.to_string(),
        image_url: Some(format!("https://img/{id}.png")),
        categories: categories
            .iter()
            .map(|c| CategoryRef {
                name: c.to_string(),
                locator: format!("fake://type/{c}/"),
            })
            .collect(),
    }
}

pub(crate) fn five_items() -> Vec<ItemDetail> {
    vec![
        item(1, "a", &["normal"]),
        item(2, "b", &["normal"]),
        item(3, "c", &["normal"]),
        item(4, "d", &["normal"]),
        item(5, "e", &["normal"]),
    ]
}

pub(crate) fn mixed_catalog(n: u32) -> Vec<ItemDetail> {
    (1..=n)
        .map(|id| {
            let category = if id % 3 == 0 { "fire" } else { "water" };
            item(id, &format!("mon-{id:03}"), &[category])
        })
        .collect()
}

/// Mailer that keeps every message instead of sending it
#[derive(Default)]
pub(crate) struct RecordingMailer {
    pub(crate) sent: Mutex<Vec<OutgoingMail>>,
    pub(crate) fail_with: Option<NotificationError>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), NotificationError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.sent
            .lock()
            .map_err(|e| NotificationError::Transport(e.to_string()))?
            .push(mail);
        Ok(())
    }
}
