//! HTTP surface for the page controller.
//!
//! Runs on port 2004 by default. CORS-permissive so the page can also be
//! opened from another origin during development.
//!
//! | route | |
//! |---|---|
//! | `GET /` | rendered page (waits for every panel to settle) |
//! | `GET /panels` | the same page as JSON |
//! | `GET /<base_dir>/{file}` | one `.txt` / `.wav` resource |
//! | `GET /download-all` | the ZIP archive as an attachment |
//! | `GET /export/status` | export control snapshot |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use audiodeck_core::page::Page;
use audiodeck_core::types::{Catalog, ExportStatus, ResourceKind};

use crate::error::{ExportError, FetchError};
use crate::export::Exporter;
use crate::fetch::SharedFetcher;
use crate::html::{HtmlOptions, render_html};
use crate::render::render_page;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub fetcher: SharedFetcher,
    pub exporter: Arc<Exporter>,
    pub html: Arc<HtmlOptions>,
}

impl AppState {
    pub fn new(catalog: Catalog, fetcher: SharedFetcher, exporter: Exporter, html: HtmlOptions) -> Self {
        Self {
            catalog: Arc::new(catalog),
            fetcher,
            exporter: Arc::new(exporter),
            html: Arc::new(html),
        }
    }
}

/// Build the axum router over shared [`AppState`].
pub fn router(state: AppState) -> Router {
    let resource_route = format!("/{}/{{file}}", state.catalog.base_dir().trim_matches('/'));
    Router::new()
        .route("/", get(index))
        .route("/panels", get(panels))
        .route(&resource_route, get(resource))
        .route("/download-all", get(download_all))
        .route("/export/status", get(export_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn settled_page(state: &AppState) -> Page {
    render_page(&state.catalog, state.fetcher.clone()).wait().await
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let page = settled_page(&state).await;
    Html(render_html(&page, &state.html))
}

async fn panels(State(state): State<AppState>) -> Json<Page> {
    Json(settled_page(&state).await)
}

async fn resource(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    let Some((id, kind)) = ResourceKind::from_file_name(&file) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !state.catalog.contains(&id) {
        return StatusCode::NOT_FOUND.into_response();
    }

    match state.fetcher.fetch(&state.catalog.resource(&id, kind)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, kind.content_type())], bytes).into_response(),
        Err(FetchError::Status { status, reason }) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            reason,
        )
            .into_response(),
        Err(e) => {
            error!("serve {file}: {e}");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

async fn download_all(State(state): State<AppState>) -> Response {
    match state.exporter.export().await {
        Ok(artifact) => {
            info!("download-all: sending {} entries", artifact.entries.len());
            (
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", artifact.file_name),
                    ),
                ],
                artifact.bytes,
            )
                .into_response()
        }
        Err(e) => (export_error_status(&e), e.to_string()).into_response(),
    }
}

async fn export_status(State(state): State<AppState>) -> Json<ExportStatus> {
    Json(state.exporter.control().status())
}

fn export_error_status(e: &ExportError) -> StatusCode {
    match e {
        ExportError::MissingCapability => StatusCode::SERVICE_UNAVAILABLE,
        ExportError::Busy => StatusCode::CONFLICT,
        ExportError::Hidden => StatusCode::NOT_FOUND,
        ExportError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
