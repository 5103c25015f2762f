//! Shared types for the HTTP layer.

use std::sync::Arc;

use axum::http::HeaderMap;
use serde::Serialize;
use uuid::Uuid;

use crate::access::{Role, SessionState};
use crate::backend::Backend;
use crate::content::Locale;
use crate::models::{PlanTier, Profile};

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub backend: Arc<Backend>,
    /// Plan applied to every professional's roster cap. No billing is stored.
    pub plan: PlanTier,
}

impl ApiContext {
    pub fn new(backend: Arc<Backend>) -> Self {
        Self {
            backend,
            plan: PlanTier::Free,
        }
    }

    pub fn with_plan(mut self, plan: PlanTier) -> Self {
        self.plan = plan;
        self
    }
}

/// Signed-in viewer, injected into request extensions by the session
/// middleware.
#[derive(Debug, Clone, Serialize)]
pub struct Viewer {
    pub user_id: Uuid,
    pub profile: Option<Profile>,
    #[serde(skip)]
    pub token: String,
}

impl Viewer {
    pub fn role(&self) -> Role {
        Role::of(self.profile.as_ref())
    }

    pub fn session(&self) -> SessionState {
        SessionState::SignedIn {
            user_id: self.user_id,
            profile: self.profile.clone(),
        }
    }
}

/// `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Locale from the first `Accept-Language` entry, English otherwise.
pub fn request_locale(headers: &HeaderMap) -> Locale {
    headers
        .get("Accept-Language")
        .and_then(|v| v.to_str().ok())
        .map(Locale::from_tag)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_extracted() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));
        headers.insert("Authorization", HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert("Authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn locale_from_accept_language() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_locale(&headers), Locale::En);
        headers.insert("Accept-Language", HeaderValue::from_static("pt-BR,pt;q=0.9,en;q=0.8"));
        assert_eq!(request_locale(&headers), Locale::PtBr);
        headers.insert("Accept-Language", HeaderValue::from_static("en-US;q=0.9"));
        assert_eq!(request_locale(&headers), Locale::En);
    }

    #[test]
    fn viewer_without_profile_is_guest() {
        let viewer = Viewer {
            user_id: Uuid::new_v4(),
            profile: None,
            token: "t".into(),
        };
        assert_eq!(viewer.role(), Role::Guest);
    }
}
