//! Patient and professional dashboards.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Viewer};
use crate::dashboard::{self, PatientDashboard, ProfessionalDashboard};

/// `GET /api/dashboard/patient`
pub async fn patient(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<PatientDashboard>, ApiError> {
    let dashboard = dashboard::load_patient_dashboard(&ctx.backend, &viewer.user_id)?;
    Ok(Json(dashboard))
}

#[derive(Debug, Default, Deserialize)]
pub struct RosterQuery {
    #[serde(default)]
    pub search: Option<String>,
}

/// `GET /api/dashboard/professional?search=`
pub async fn professional(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<RosterQuery>,
) -> Result<Json<ProfessionalDashboard>, ApiError> {
    let dashboard = dashboard::load_professional_dashboard(
        &ctx.backend,
        &viewer.user_id,
        ctx.plan,
        query.search.as_deref(),
    )?;
    Ok(Json(dashboard))
}
