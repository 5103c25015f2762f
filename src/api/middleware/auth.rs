//! Session and role middleware.
//!
//! `require_session` resolves `Authorization: Bearer <token>` to a
//! [`Viewer`] and injects it into request extensions. The role gates run
//! inside it and admit or reject the viewer by [`Role`].

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::access::{evaluate_gate, Gate, Role, SessionState};
use crate::api::error::ApiError;
use crate::api::middleware::audit::ViewerId;
use crate::api::types::{bearer_token, request_locale, ApiContext, Viewer};
use crate::auth::{self, AuthError};
use crate::content::{self, Message};

/// Require a valid session token.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
/// On success: injects `Viewer` and adds `Cache-Control: no-store`.
pub async fn require_session(req: Request<axum::body::Body>, next: Next) -> Response {
    let locale = request_locale(req.headers());
    match require_session_inner(req, next).await {
        Ok(resp) => resp,
        Err(ApiError::Unauthorized) => ApiError::Unauthorized
            .with_notice(content::notice(locale, Message::SignInRequired))
            .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn require_session_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = bearer_token(req.headers())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let (user_id, profile) = match auth::resolve_session(&ctx.backend, &token) {
        Ok(resolved) => resolved,
        Err(AuthError::InvalidSession) => {
            tracing::debug!("Rejected unknown session token");
            return Err(ApiError::Unauthorized);
        }
        Err(e) => return Err(e.into()),
    };

    req.extensions_mut().insert(Viewer {
        user_id,
        profile,
        token,
    });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));
    response.extensions_mut().insert(ViewerId(user_id));
    Ok(response)
}

/// Admit patients only.
pub async fn require_patient(req: Request<axum::body::Body>, next: Next) -> Response {
    gate(&[Role::Patient], req, next).await
}

/// Admit professionals only.
pub async fn require_professional(req: Request<axum::body::Body>, next: Next) -> Response {
    gate(&[Role::Professional], req, next).await
}

async fn gate(allowed: &[Role], req: Request<axum::body::Body>, next: Next) -> Response {
    let locale = request_locale(req.headers());
    let session = req
        .extensions()
        .get::<Viewer>()
        .map(Viewer::session)
        .unwrap_or(SessionState::SignedOut);

    let decision = evaluate_gate(&session, allowed);
    let error = match &decision {
        Gate::Granted(_) => return next.run(req).await,
        Gate::SignInRequired => ApiError::Unauthorized,
        Gate::AccessDenied => {
            tracing::info!(
                path = %req.uri().path(),
                role = ?session.role(),
                "Route gate denied viewer"
            );
            ApiError::Forbidden
        }
        Gate::Loading => ApiError::Internal("session unresolved at gate".into()),
    };
    match decision.notice(locale) {
        Some(notice) => error.with_notice(notice).into_response(),
        None => error.into_response(),
    }
}
