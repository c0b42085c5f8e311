//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`items`]: Filtered listing, categories, single-item summary
//! - [`export`]: Spreadsheet download and email notification
//! - [`system`]: Health, OpenAPI

use serde::{Deserialize, Serialize};

mod export;
mod items;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use export::*;
pub use items::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Query parameters for GET /items
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListItemsQuery {
    /// Case-insensitive substring of the item name
    pub name_filter: Option<String>,
    /// Category name; empty or "all" disables the filter
    pub category_filter: Option<String>,
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Items per page (default: configured page size)
    pub limit: Option<i64>,
}

/// Query parameters for GET /items/export
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// Case-insensitive substring of the item name
    pub name_filter: Option<String>,
    /// Category name; empty or "all" disables the filter
    pub category_filter: Option<String>,
}

/// Response body for POST /items/notify
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct NotifyResponse {
    /// Always "sent"
    pub status: String,
    /// What was sent
    pub detail: crate::notify::NotifyOutcome,
}
