//! Roster endpoints: add a patient, claim an access link.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, NoticedError};
use crate::api::types::{request_locale, ApiContext, Viewer};
use crate::content::{self, Locale, Message, Notice};
use crate::models::Patient;
use crate::roster::{self, AccessLink, NewPatient, RosterError};

#[derive(Serialize)]
pub struct AddedPatient {
    #[serde(flatten)]
    pub access: AccessLink,
    pub notice: Notice,
}

fn roster_failure(err: RosterError, locale: Locale) -> NoticedError {
    let notice = err.notice(locale);
    ApiError::from(err).with_notice(notice)
}

/// `POST /api/patients`: returns the access link to hand to the patient.
pub async fn add(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Json(form): Json<NewPatient>,
) -> Result<(StatusCode, Json<AddedPatient>), NoticedError> {
    let locale = request_locale(&headers);
    let access = roster::add_patient(&ctx.backend, &viewer.user_id, &form, ctx.plan)
        .map_err(|e| roster_failure(e, locale))?;
    Ok((
        StatusCode::CREATED,
        Json(AddedPatient {
            access,
            notice: content::notice(locale, Message::PatientAdded),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub token: String,
}

#[derive(Serialize)]
pub struct ClaimedPatient {
    pub patient: Patient,
    pub notice: Notice,
}

/// `POST /api/patients/claim`
pub async fn claim(
    State(ctx): State<ApiContext>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<ClaimedPatient>, NoticedError> {
    let locale = request_locale(&headers);
    let patient = roster::claim_access(&ctx.backend, &viewer.user_id, request.token.trim())
        .map_err(|e| roster_failure(e, locale))?;
    Ok(Json(ClaimedPatient {
        patient,
        notice: content::notice(locale, Message::AccessClaimed),
    }))
}
