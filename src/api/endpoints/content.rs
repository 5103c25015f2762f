//! Public marketing content: pricing plans and landing copy.

use axum::extract::Path;
use axum::Json;

use crate::content::{self, LandingContent, Locale, Plan};

/// `GET /api/plans`
pub async fn plans() -> Json<Vec<Plan>> {
    Json(content::plans())
}

/// `GET /api/content/:locale`: unknown locales fall back to English.
pub async fn landing(Path(locale): Path<String>) -> Json<LandingContent> {
    Json(content::landing(Locale::from_tag(&locale)))
}
