//! HTTP router.
//!
//! Routes live under `/api/` in four groups: public, any session, patient
//! only, professional only. Uploaded objects are served from `/files/*key`.
//!
//! Middleware stack (outermost → innermost):
//! Extension → CORS → nosniff header → access log → session → role gate

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware::{audit, auth};
use crate::api::types::ApiContext;

/// Largest accepted request body. Leaves room for a maximum-size upload
/// after base64 expansion.
pub const MAX_REQUEST_BYTES: usize = 8 * 1024 * 1024;

/// Build the application router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
/// Path params use `:param` syntax (axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let public: Router<ApiContext> = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/plans", get(endpoints::content::plans))
        .route("/content/:locale", get(endpoints::content::landing))
        .route("/auth/sign-up", post(endpoints::auth::sign_up))
        .route("/auth/sign-in", post(endpoints::auth::sign_in));

    let signed_in: Router<ApiContext> = Router::new()
        .route("/auth/sign-out", post(endpoints::auth::sign_out))
        .route("/me", get(endpoints::auth::me))
        .route("/records/schema/:kind", get(endpoints::records::schema))
        .route("/export/raster", post(endpoints::export::raster))
        .route_layer(from_fn(auth::require_session));

    // Role gates run inside the session layer: last route_layer is outermost.
    let patient: Router<ApiContext> = Router::new()
        .route("/records", post(endpoints::records::create))
        .route("/dashboard/patient", get(endpoints::dashboard::patient))
        .route("/patients/claim", post(endpoints::patients::claim))
        .route("/export/pdf", get(endpoints::export::medical_history))
        .route_layer(from_fn(auth::require_patient))
        .route_layer(from_fn(auth::require_session));

    let professional: Router<ApiContext> = Router::new()
        .route("/dashboard/professional", get(endpoints::dashboard::professional))
        .route("/patients", post(endpoints::patients::add))
        .route_layer(from_fn(auth::require_professional))
        .route_layer(from_fn(auth::require_session));

    Router::new()
        .nest("/api", public.merge(signed_in).merge(patient).merge(professional))
        .route("/files/*key", get(endpoints::files::fetch))
        .with_state(ctx.clone())
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(from_fn(audit::log_access))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(ctx))
}
