//! Catalog domain types and the upstream wire schemas they are decoded from

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lightweight catalog reference returned by the list endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogItem {
    /// Item name, unique within one catalog snapshot
    pub name: String,
    /// URL of the item's detail resource
    #[serde(rename = "url")]
    pub locator: String,
}

/// One page of the remote catalog listing
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CatalogPage {
    /// Total number of entries in the remote catalog
    pub count: u32,
    /// URL of the next page, if any
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page, if any
    #[serde(default)]
    pub previous: Option<String>,
    /// Entries on this page, in catalog order
    #[serde(default)]
    pub results: Vec<CatalogItem>,
}

/// Named reference to a category (a Pokémon type)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryRef {
    /// Category name, e.g. "electric"
    pub name: String,
    /// URL of the category resource
    #[serde(rename = "url")]
    pub locator: String,
}

/// Full detail record for one catalog item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    /// Numeric catalog id
    pub id: u32,
    /// Item name
    pub name: String,
    /// Front sprite URL, when the upstream has one
    pub image_url: Option<String>,
    /// Categories in upstream slot order
    pub categories: Vec<CategoryRef>,
}

impl ItemDetail {
    /// Whether any category equals `filter`, ignoring case
    pub fn has_category(&self, filter: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(filter))
    }

    /// Category names joined with ", "
    pub fn category_names(&self) -> String {
        self.categories
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A localized description line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LocalizedText {
    /// Language code, e.g. "en"
    pub language: String,
    /// Raw text as published upstream
    pub text: String,
}

/// Species record, cached independently of [`ItemDetail`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SpeciesDetail {
    /// Numeric species id
    pub id: u32,
    /// Species name
    pub name: String,
    /// Localized descriptions in upstream order
    pub descriptions: Vec<LocalizedText>,
}

/// Marker returned when no description exists in any preferred language
pub const DESCRIPTION_UNAVAILABLE: &str = "Description unavailable";

impl SpeciesDetail {
    /// Pick the first description in the first preferred language that has one
    ///
    /// Newlines and form feeds are collapsed to spaces. Returns
    /// [`DESCRIPTION_UNAVAILABLE`] when none of the languages match.
    pub fn description(&self, languages: &[String]) -> String {
        languages
            .iter()
            .find_map(|lang| {
                self.descriptions
                    .iter()
                    .find(|d| d.language.eq_ignore_ascii_case(lang))
            })
            .map(|d| clean_text(&d.text))
            .unwrap_or_else(|| DESCRIPTION_UNAVAILABLE.to_string())
    }
}

fn clean_text(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\n' | '\r' | '\u{000C}' => ' ',
            other => other,
        })
        .collect()
}

/// Output of a filtered, paginated listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageResult {
    /// Number of items passing every filter
    #[serde(rename = "count")]
    pub total_matched: usize,
    /// `ceil(total_matched / page_size)`
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
    /// The requested page number (1-based)
    #[serde(rename = "currentPage")]
    pub page_number: usize,
    /// Hydrated items on this page, in catalog order
    #[serde(rename = "results")]
    pub items: Vec<ItemDetail>,
}

/// Merged item and species view for a single item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ItemSummary {
    /// Numeric catalog id
    pub id: u32,
    /// Item name
    pub name: String,
    /// Front sprite URL
    pub image: Option<String>,
    /// Category names in slot order
    pub categories: Vec<String>,
    /// Localized description, or the unavailable marker
    pub description: String,
}

impl ItemSummary {
    /// Merge an item detail with its (optional) species record
    pub fn merge(detail: ItemDetail, species: Option<&SpeciesDetail>, languages: &[String]) -> Self {
        let description = species
            .map(|s| s.description(languages))
            .unwrap_or_else(|| DESCRIPTION_UNAVAILABLE.to_string());
        Self {
            id: detail.id,
            categories: detail.categories.into_iter().map(|c| c.name).collect(),
            name: detail.name,
            image: detail.image_url,
            description,
        }
    }
}

// ============================================================================
// Upstream wire schemas
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct DetailResponse {
    id: u32,
    name: String,
    #[serde(default)]
    sprites: Option<SpritesResponse>,
    #[serde(default)]
    types: Vec<TypeSlotResponse>,
}

#[derive(Debug, Deserialize)]
struct SpritesResponse {
    #[serde(default)]
    front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TypeSlotResponse {
    #[serde(default)]
    slot: u32,
    #[serde(rename = "type")]
    category: Option<CategoryRef>,
}

impl From<DetailResponse> for ItemDetail {
    fn from(raw: DetailResponse) -> Self {
        let mut slots = raw.types;
        slots.sort_by_key(|s| s.slot);
        Self {
            id: raw.id,
            name: raw.name,
            image_url: raw.sprites.and_then(|s| s.front_default),
            categories: slots.into_iter().filter_map(|s| s.category).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpeciesResponse {
    id: u32,
    name: String,
    #[serde(default)]
    flavor_text_entries: Vec<FlavorTextResponse>,
}

#[derive(Debug, Deserialize)]
struct FlavorTextResponse {
    flavor_text: String,
    language: Option<NamedResponse>,
}

#[derive(Debug, Deserialize)]
struct NamedResponse {
    name: String,
}

impl From<SpeciesResponse> for SpeciesDetail {
    fn from(raw: SpeciesResponse) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            descriptions: raw
                .flavor_text_entries
                .into_iter()
                .filter_map(|entry| {
                    entry.language.map(|lang| LocalizedText {
                        language: lang.name,
                        text: entry.flavor_text,
                    })
                })
                .collect(),
        }
    }
}

/// Category listing payload; entries missing a name or url are skipped
#[derive(Debug, Deserialize)]
pub(crate) struct CategoryListResponse {
    #[serde(default)]
    results: Vec<CategoryEntryResponse>,
}

#[derive(Debug, Deserialize)]
struct CategoryEntryResponse {
    name: Option<String>,
    url: Option<String>,
}

impl From<CategoryListResponse> for Vec<CategoryRef> {
    fn from(raw: CategoryListResponse) -> Self {
        raw.results
            .into_iter()
            .filter_map(|entry| match (entry.name, entry.url) {
                (Some(name), Some(locator)) => Some(CategoryRef { name, locator }),
                _ => None,
            })
            .collect()
    }
}
