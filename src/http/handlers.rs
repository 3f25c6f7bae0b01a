//! HTTP request handlers for the content boundary.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::ArchiveError;
use crate::library::{Content, Library};

use super::pages;

/// Handle GET / : gallery of root archives.
pub async fn handle_gallery(State(library): State<Arc<Library>>) -> Result<Html<String>, AppError> {
    let archives = library.list_root_archives().await?;
    Ok(Html(pages::render_gallery(&archives)))
}

/// Handle GET /thumbnail/{archive}.
pub async fn handle_thumbnail(
    Path(archive): Path<String>,
    State(library): State<Arc<Library>>,
) -> Result<Response, AppError> {
    tracing::debug!("Handling thumbnail request for {}", archive);
    Ok(content_response(library.get_thumbnail(&archive).await?))
}

/// Handle GET /list/{archive}.
pub async fn handle_list(
    Path(archive): Path<String>,
    State(library): State<Arc<Library>>,
) -> Result<Html<String>, AppError> {
    tracing::debug!("Handling list request for {}", archive);
    let documents = library.list_documents(&archive).await?;
    Ok(Html(pages::render_document_list(&archive, &documents)))
}

/// Handle GET /view/{archive}/{*path}.
pub async fn handle_view(
    Path((archive, path)): Path<(String, String)>,
    State(library): State<Arc<Library>>,
) -> Result<Response, AppError> {
    tracing::debug!("Handling view request for {}/{}", archive, path);
    Ok(content_response(library.view(&archive, &path).await?))
}

/// Handle GET /zip_content/{archive}/{*path}.
pub async fn handle_content(
    Path((archive, path)): Path<(String, String)>,
    State(library): State<Arc<Library>>,
) -> Result<Response, AppError> {
    tracing::debug!("Handling content request for {}/{}", archive, path);
    Ok(content_response(library.get_raw_content(&archive, &path).await?))
}

fn content_response(content: Content) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content.mime_type)],
        content.bytes,
    )
        .into_response()
}

/// Application-level error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found (404)
    NotFound(String),
    /// Unexpected failure (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        if err.is_not_found() {
            tracing::debug!("Not found: {}", err);
            Self::NotFound(err.to_string())
        } else {
            tracing::error!("Request failed: {}", err);
            Self::Internal(err.to_string())
        }
    }
}
