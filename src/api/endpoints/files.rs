//! Retrieval of uploaded objects by key.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// `GET /files/*key`: the target of every stored public URL.
pub async fn fetch(
    State(ctx): State<ApiContext>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = ctx
        .backend
        .storage()
        .get(&key)?
        .ok_or_else(|| ApiError::NotFound(format!("No file at {key}")))?;
    let mime = mime_guess::from_path(&key).first_or_octet_stream();

    Ok((
        [
            (header::CONTENT_TYPE, mime.essence_str().to_string()),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        bytes,
    )
        .into_response())
}
