use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;

use crate::api::response::ApiError;
use crate::AppState;

/// Serve a stored image verbatim.
/// Route: GET /uploads/:filename
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let (file, len) = state
        .blobs
        .open(&filename)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let mime_type = mime_guess::from_path(&filename)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let body = Body::from_stream(ReaderStream::new(file));
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();

    headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static(mime_type));
    headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(len));

    // Cache for 1 hour (blobs are immutable -- they appear once and are only
    // ever deleted, never rewritten in place)
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("public, max-age=3600"),
    );

    Ok(response)
}
