//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the poke-aggregator REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the poke-aggregator REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "poke-aggregator REST API",
        version = "0.1.0",
        description = "Filtered, paginated and exportable views over the PokeAPI catalog",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5089", description = "Local development server")
    ),
    paths(
        // Items
        crate::api::routes::list_items,
        crate::api::routes::list_categories,
        crate::api::routes::get_item,

        // Export & notification
        crate::api::routes::export_items,
        crate::api::routes::notify,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Domain types from types.rs
        crate::types::CategoryRef,
        crate::types::ItemDetail,
        crate::types::ItemSummary,
        crate::types::PageResult,

        // Notification types from notify.rs
        crate::notify::NotifyRequest,
        crate::notify::NotifyOutcome,

        // API request/response types from routes
        crate::api::routes::NotifyResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "items", description = "Catalog items - Filtered listings, categories and single-item summaries"),
        (name = "export", description = "Export - Spreadsheet download and email notifications"),
        (name = "system", description = "System endpoints - Health checks and OpenAPI spec"),
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_has_paths() {
        let spec = ApiDoc::openapi();

        let paths: Vec<&str> = spec.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/items",
            "/items/categories",
            "/items/{name}",
            "/items/export",
            "/items/notify",
            "/health",
        ] {
            assert!(paths.contains(&expected), "missing path {expected}");
        }
    }

    #[test]
    fn test_openapi_spec_has_components() {
        let spec = ApiDoc::openapi();

        let components = spec.components.unwrap();
        assert!(components.schemas.contains_key("PageResult"));
        assert!(components.schemas.contains_key("NotifyRequest"));
        assert!(components.schemas.contains_key("ApiError"));
    }

    #[test]
    fn test_openapi_spec_has_tags() {
        let spec = ApiDoc::openapi();

        let tags = spec.tags.unwrap();
        let tag_names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tag_names, vec!["items", "export", "system"]);
    }

    #[test]
    fn test_openapi_spec_info() {
        let spec = ApiDoc::openapi();

        assert_eq!(spec.info.title, "poke-aggregator REST API");
        assert_eq!(spec.info.version, "0.1.0");
        assert!(spec.info.description.is_some());
    }

    #[test]
    fn test_openapi_spec_version() {
        let spec = ApiDoc::openapi();

        let json = serde_json::to_value(&spec).expect("Should serialize to JSON");
        let version = json.get("openapi").and_then(|v| v.as_str());
        assert!(
            version.unwrap().starts_with("3."),
            "Should use OpenAPI 3.x version"
        );
    }
}
