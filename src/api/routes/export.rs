//! Export and notification handlers.

use super::{ExportQuery, NotifyResponse};
use crate::api::AppState;
use crate::export::{SpreadsheetExport, XLSX_CONTENT_TYPE};
use crate::notify::NotifyRequest;
use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

/// GET /items/export - Download the filtered item set as a spreadsheet
#[utoipa::path(
    get,
    path = "/items/export",
    tag = "export",
    params(ExportQuery),
    responses(
        (status = 200, description = "xlsx workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 500, description = "Export failed (plain-text reason)")
    )
)]
pub async fn export_items(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> impl IntoResponse {
    let rendered = match state
        .pipeline
        .filtered_items(
            query.name_filter.as_deref(),
            query.category_filter.as_deref(),
        )
        .await
    {
        Ok(items) => SpreadsheetExport::render(&items),
        Err(e) => Err(e),
    };

    match rendered {
        Ok(export) => {
            tracing::info!(rows = export.rows, file = %export.file_name, "export served");
            let disposition = format!("attachment; filename=\"{}\"", export.file_name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                export.bytes,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "export failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error generating export: {}", e),
            )
                .into_response()
        }
    }
}

/// POST /items/notify - Email a single-item summary or the filtered export
#[utoipa::path(
    post,
    path = "/items/notify",
    tag = "export",
    request_body(content = crate::notify::NotifyRequest, description = "Recipient, message and optional item or filters"),
    responses(
        (status = 200, description = "Email sent", body = NotifyResponse),
        (status = 400, description = "Missing recipient or mail transport not configured", body = crate::error::ApiError),
        (status = 500, description = "Export or mail transport failure", body = crate::error::ApiError)
    )
)]
pub async fn notify(
    State(state): State<AppState>,
    Json(request): Json<NotifyRequest>,
) -> impl IntoResponse {
    match state.notifier.notify(&request).await {
        Ok(detail) => (
            StatusCode::OK,
            Json(NotifyResponse {
                status: "sent".to_string(),
                detail,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
