//! Sign-up, sign-in, sign-out and the current viewer.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::access::{dashboard_for, DashboardKind, Role};
use crate::api::error::{ApiError, NoticedError};
use crate::api::types::{request_locale, ApiContext, Viewer};
use crate::auth::{self, AuthError, AuthSession, SignIn, SignUp};
use crate::backend::BackendError;
use crate::content::{self, Locale, Message, Notice};
use crate::models::Profile;

#[derive(Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: AuthSession,
    pub dashboard: DashboardKind,
    pub notice: Notice,
}

impl SessionResponse {
    fn new(session: AuthSession, notice: Notice) -> Self {
        let dashboard = dashboard_for(Role::of(session.profile.as_ref()));
        Self {
            session,
            dashboard,
            notice,
        }
    }
}

fn auth_failure(err: AuthError, locale: Locale) -> NoticedError {
    let notice = match &err {
        AuthError::EmailTaken => content::notice(locale, Message::EmailTaken),
        AuthError::InvalidCredentials => content::notice(locale, Message::InvalidCredentials),
        AuthError::InvalidEmail | AuthError::WeakPassword { .. } | AuthError::MissingName => {
            content::notice_with(locale, Message::Unexpected, err.to_string())
        }
        _ => content::notice(locale, Message::Unexpected),
    };
    ApiError::from(err).with_notice(notice)
}

/// Password hashing is deliberately slow; keep it off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::Backend(BackendError::Task(e.to_string())))?
}

/// `POST /api/auth/sign-up`
pub async fn sign_up(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Json(request): Json<SignUp>,
) -> Result<(StatusCode, Json<SessionResponse>), NoticedError> {
    let locale = request_locale(&headers);
    let backend = ctx.backend.clone();
    let session = run_blocking(move || auth::sign_up(&backend, &request))
        .await
        .map_err(|e| auth_failure(e, locale))?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::new(session, content::notice(locale, Message::SignedUp))),
    ))
}

/// `POST /api/auth/sign-in`
pub async fn sign_in(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Json(request): Json<SignIn>,
) -> Result<Json<SessionResponse>, NoticedError> {
    let locale = request_locale(&headers);
    let backend = ctx.backend.clone();
    let session = run_blocking(move || auth::sign_in(&backend, &request))
        .await
        .map_err(|e| auth_failure(e, locale))?;
    Ok(Json(SessionResponse::new(
        session,
        content::notice(locale, Message::SignedIn),
    )))
}

#[derive(Serialize)]
pub struct SignedOut {
    pub notice: Notice,
}

/// `POST /api/auth/sign-out`: ends the presented session only.
pub async fn sign_out(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
) -> Result<Json<SignedOut>, ApiError> {
    auth::sign_out(&ctx.backend, &viewer.token)?;
    Ok(Json(SignedOut {
        notice: content::notice(request_locale(&headers), Message::SignedOut),
    }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub profile: Option<Profile>,
    pub role: Role,
    pub dashboard: DashboardKind,
}

/// `GET /api/me`: where the viewer lands after sign-in.
pub async fn me(Extension(viewer): Extension<Viewer>) -> Json<MeResponse> {
    let role = viewer.role();
    Json(MeResponse {
        user_id: viewer.user_id,
        profile: viewer.profile,
        role,
        dashboard: dashboard_for(role),
    })
}
