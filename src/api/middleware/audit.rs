//! Access log middleware.
//!
//! Logs every API request with method, path, response status, elapsed time
//! and, when the session layer resolved one, the viewer's user id. Runs
//! outside the session layer, so the viewer is read back from the response
//! extensions.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

/// Marker copied into response extensions by handlers that know the viewer.
#[derive(Debug, Clone, Copy)]
pub struct ViewerId(pub Uuid);

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let viewer = response
        .extensions()
        .get::<ViewerId>()
        .map(|v| v.0.to_string())
        .unwrap_or_else(|| "-".to_string());
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status >= 500 {
        tracing::warn!(%method, path = %path, status, viewer = %viewer, elapsed_ms, "API request failed");
    } else {
        tracing::info!(%method, path = %path, status, viewer = %viewer, elapsed_ms, "API request");
    }

    response
}
