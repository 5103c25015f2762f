//! Route gating by role.
//!
//! A viewer is classified into a closed [`Role`] from its profile; each route
//! group names the roles it admits. Default-deny: a signed-in viewer without a
//! profile is a `Guest` and only passes unrestricted gates.

use serde::Serialize;
use uuid::Uuid;

use crate::content::{self, Locale, Message, Notice};
use crate::models::{Profile, UserType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Professional,
    Patient,
    Guest,
}

impl Role {
    pub fn of(profile: Option<&Profile>) -> Self {
        match profile.map(|p| p.user_type) {
            Some(UserType::Professional) => Self::Professional,
            Some(UserType::Patient) => Self::Patient,
            None => Self::Guest,
        }
    }
}

/// Where a viewer's session stands.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Session or profile lookup still in flight.
    Loading,
    SignedOut,
    SignedIn {
        user_id: Uuid,
        profile: Option<Profile>,
    },
}

impl SessionState {
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::SignedIn { profile, .. } => Some(Role::of(profile.as_ref())),
            Self::Loading | Self::SignedOut => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "gate", content = "role", rename_all = "snake_case")]
pub enum Gate {
    Loading,
    SignInRequired,
    AccessDenied,
    Granted(Role),
}

impl Gate {
    /// Notice for a blocked gate; `None` when nothing needs saying.
    pub fn notice(&self, locale: Locale) -> Option<Notice> {
        match self {
            Self::SignInRequired => Some(content::notice(locale, Message::SignInRequired)),
            Self::AccessDenied => Some(content::notice(locale, Message::AccessDenied)),
            Self::Loading | Self::Granted(_) => None,
        }
    }
}

/// Decide whether a session may enter a route admitting `allowed` roles.
///
/// An empty `allowed` admits any signed-in viewer.
pub fn evaluate_gate(session: &SessionState, allowed: &[Role]) -> Gate {
    let role = match session {
        SessionState::Loading => return Gate::Loading,
        SessionState::SignedOut => return Gate::SignInRequired,
        SessionState::SignedIn { profile, .. } => Role::of(profile.as_ref()),
    };

    if allowed.is_empty() || allowed.contains(&role) {
        Gate::Granted(role)
    } else {
        Gate::AccessDenied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardKind {
    Professional,
    Patient,
    /// No profile yet: back to the landing page.
    Landing,
}

pub fn dashboard_for(role: Role) -> DashboardKind {
    match role {
        Role::Professional => DashboardKind::Professional,
        Role::Patient => DashboardKind::Patient,
        Role::Guest => DashboardKind::Landing,
    }
}
