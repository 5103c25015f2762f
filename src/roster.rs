//! Professional patient roster.
//!
//! Adding a patient is a two-phase flow: the form is submitted, the plan cap
//! is checked, the row is inserted with a fresh access token, and the form
//! switches to showing the shareable access link until closed.
//!
//! [`PatientIntake`] is the library-side model of that dialog. The HTTP
//! endpoint is stateless and calls [`add_patient`] directly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::generate_token;
use crate::backend::{Backend, BackendError};
use crate::content::{self, Locale, Message, Notice};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{Patient, PlanTier, UserType};

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("Missing required field: {0}")]
    Missing(&'static str),
    #[error("Invalid birth date: {0}")]
    InvalidDate(String),
    #[error("Professional profile not found")]
    ProfileNotFound,
    #[error("Only {0} profiles can do this")]
    WrongProfileType(UserType),
    #[error("Patient limit reached ({limit})")]
    LimitReached { limit: u32 },
    /// Backend message, verbatim.
    #[error("{0}")]
    Insert(String),
    #[error("Access link is not valid")]
    InvalidAccessLink,
    #[error("Access link was already claimed")]
    AlreadyClaimed,
    #[error("QR generation failed: {0}")]
    QrCode(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<DatabaseError> for RosterError {
    fn from(err: DatabaseError) -> Self {
        BackendError::from(err).into()
    }
}

impl RosterError {
    pub fn notice(&self, locale: Locale) -> Notice {
        match self {
            Self::LimitReached { .. } => content::notice(locale, Message::LimitReached),
            Self::InvalidAccessLink | Self::AlreadyClaimed => {
                content::notice(locale, Message::InvalidAccessLink)
            }
            Self::ProfileNotFound => content::notice(locale, Message::ProfileMissing),
            Self::Backend(_) => content::notice(locale, Message::PatientFailed),
            other => content::notice_with(locale, Message::PatientFailed, other.to_string()),
        }
    }
}

/// Submitted add-patient form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// `YYYY-MM-DD`; blank means unknown.
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
}

fn blank_to_none(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A roster row with its shareable access link.
#[derive(Debug, Clone, Serialize)]
pub struct AccessLink {
    pub patient: Patient,
    pub link: String,
    /// The link as a QR code, SVG markup.
    pub qr_svg: String,
}

pub fn access_link(public_origin: &str, access_token: &str) -> String {
    format!(
        "{}/patient-access?token={access_token}",
        public_origin.trim_end_matches('/')
    )
}

/// Render a link as an SVG QR code.
pub fn qr_svg(link: &str) -> Result<String, RosterError> {
    use qrcode::render::svg;
    use qrcode::QrCode;

    let code = QrCode::new(link.as_bytes()).map_err(|e| RosterError::QrCode(e.to_string()))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .max_dimensions(300, 300)
        .dark_color(svg::Color("#1c1917"))
        .light_color(svg::Color("#ffffff"))
        .quiet_zone(true)
        .build())
}

/// Patient cap for a plan; `None` is unlimited.
pub fn patient_limit(tier: PlanTier) -> Option<u32> {
    content::plan(tier).patient_limit
}

/// Add a patient to the roster of the professional owning `user_id`.
///
/// The cap is checked before anything is written.
pub fn add_patient(
    backend: &Backend,
    user_id: &Uuid,
    form: &NewPatient,
    tier: PlanTier,
) -> Result<AccessLink, RosterError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(RosterError::Missing("name"));
    }
    let email = form.email.trim();
    if email.is_empty() {
        return Err(RosterError::Missing("email"));
    }
    let birth_date = blank_to_none(&form.birth_date)
        .map(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| RosterError::InvalidDate(raw)))
        .transpose()?;

    let conn = backend.conn()?;
    let profile = repository::get_profile_by_user_id(&conn, user_id)?
        .ok_or(RosterError::ProfileNotFound)?;
    if profile.user_type != UserType::Professional {
        return Err(RosterError::WrongProfileType(UserType::Professional));
    }

    if let Some(limit) = patient_limit(tier) {
        let count = repository::count_patients_for_professional(&conn, &profile.id)?;
        if count >= limit {
            tracing::info!(professional = %profile.id, count, limit, "Patient limit reached");
            return Err(RosterError::LimitReached { limit });
        }
    }

    let now = repository::now_utc();
    let patient = Patient {
        id: Uuid::new_v4(),
        professional_id: profile.id,
        patient_id: None,
        name: name.to_string(),
        email: email.to_string(),
        phone: blank_to_none(&form.phone),
        birth_date,
        cpf: blank_to_none(&form.cpf),
        access_token: generate_token(),
        created_at: now,
        updated_at: now,
    };
    repository::insert_patient(&conn, &patient).map_err(|e| match e {
        DatabaseError::Sqlite(e) => RosterError::Insert(e.to_string()),
        other => RosterError::Insert(other.to_string()),
    })?;

    let link = access_link(backend.public_origin(), &patient.access_token);
    let qr_svg = qr_svg(&link)?;
    tracing::info!(professional = %profile.id, patient = %patient.id, "Patient added");
    Ok(AccessLink {
        patient,
        link,
        qr_svg,
    })
}

/// Link the roster row behind `access_token` to the patient owning `user_id`.
///
/// Claiming the same link twice by the same patient is a no-op.
pub fn claim_access(backend: &Backend, user_id: &Uuid, access_token: &str) -> Result<Patient, RosterError> {
    let conn = backend.conn()?;
    let profile = repository::get_profile_by_user_id(&conn, user_id)?
        .ok_or(RosterError::ProfileNotFound)?;
    if profile.user_type != UserType::Patient {
        return Err(RosterError::WrongProfileType(UserType::Patient));
    }

    let mut patient = repository::get_patient_by_access_token(&conn, access_token.trim())?
        .ok_or(RosterError::InvalidAccessLink)?;
    match patient.patient_id {
        Some(existing) if existing == profile.id => return Ok(patient),
        Some(_) => return Err(RosterError::AlreadyClaimed),
        None => {}
    }

    repository::set_patient_claim(&conn, &patient.id, &profile.id)?;
    patient.patient_id = Some(profile.id);
    tracing::info!(patient = %patient.id, profile = %profile.id, "Access link claimed");
    Ok(patient)
}

/// Add-patient dialog state.
#[derive(Debug, Clone, Default)]
pub enum PatientIntake {
    #[default]
    Form,
    LinkDisplay { link: AccessLink },
}

impl PatientIntake {
    /// Submit the form. On success the intake shows the access link.
    /// On failure it stays on the form.
    pub fn submit(
        &mut self,
        backend: &Backend,
        user_id: &Uuid,
        form: &NewPatient,
        tier: PlanTier,
    ) -> Result<AccessLink, RosterError> {
        let link = add_patient(backend, user_id, form, tier)?;
        *self = Self::LinkDisplay { link: link.clone() };
        Ok(link)
    }

    pub fn close(&mut self) {
        *self = Self::Form;
    }

    pub fn link(&self) -> Option<&AccessLink> {
        match self {
            Self::LinkDisplay { link } => Some(link),
            Self::Form => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::make_profile;
    use crate::models::Profile;

    const ORIGIN: &str = "https://records.example.org";

    fn professional() -> (Backend, Profile) {
        let backend = Backend::in_memory(ORIGIN).unwrap();
        let profile = make_profile(&backend.conn().unwrap(), "Dr. Chen", UserType::Professional);
        (backend, profile)
    }

    fn form(name: &str) -> NewPatient {
        NewPatient {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone: Some("".into()),
            birth_date: Some("1985-04-12".into()),
            cpf: None,
        }
    }

    fn roster_len(backend: &Backend, profile: &Profile) -> u32 {
        repository::count_patients_for_professional(&backend.conn().unwrap(), &profile.id).unwrap()
    }

    #[test]
    fn add_patient_generates_access_link() {
        let (backend, profile) = professional();
        let added = add_patient(&backend, &profile.user_id, &form("Maria Silva"), PlanTier::Free).unwrap();

        assert_eq!(
            added.link,
            format!("{ORIGIN}/patient-access?token={}", added.patient.access_token)
        );
        assert!(added.qr_svg.contains("<svg"));
        assert_eq!(added.patient.phone, None);
        assert_eq!(added.patient.birth_date, NaiveDate::from_ymd_opt(1985, 4, 12));
        assert_eq!(roster_len(&backend, &profile), 1);
    }

    #[test]
    fn access_tokens_are_unique() {
        let (backend, profile) = professional();
        let a = add_patient(&backend, &profile.user_id, &form("Maria Silva"), PlanTier::Free).unwrap();
        let b = add_patient(&backend, &profile.user_id, &form("Joao Santos"), PlanTier::Free).unwrap();
        assert_ne!(a.patient.access_token, b.patient.access_token);
    }

    #[test]
    fn sixth_patient_rejected_on_free_plan_without_insert() {
        let (backend, profile) = professional();
        for i in 0..5 {
            add_patient(&backend, &profile.user_id, &form(&format!("Patient {i}")), PlanTier::Free).unwrap();
        }
        assert_eq!(roster_len(&backend, &profile), 5);

        let err = add_patient(&backend, &profile.user_id, &form("Ana Costa"), PlanTier::Free).unwrap_err();
        assert!(matches!(err, RosterError::LimitReached { limit: 5 }));
        assert_eq!(roster_len(&backend, &profile), 5);

        let notice = err.notice(Locale::En);
        assert_eq!(notice.title, "Limit reached");
    }

    #[test]
    fn premium_plan_is_uncapped() {
        let (backend, profile) = professional();
        for i in 0..6 {
            add_patient(&backend, &profile.user_id, &form(&format!("Patient {i}")), PlanTier::Premium)
                .unwrap();
        }
        assert_eq!(roster_len(&backend, &profile), 6);
    }

    #[test]
    fn patients_cannot_keep_a_roster() {
        let backend = Backend::in_memory(ORIGIN).unwrap();
        let patient = make_profile(&backend.conn().unwrap(), "Maria Silva", UserType::Patient);
        let err = add_patient(&backend, &patient.user_id, &form("Joao Santos"), PlanTier::Free).unwrap_err();
        assert!(matches!(err, RosterError::WrongProfileType(UserType::Professional)));
    }

    #[test]
    fn required_fields_checked_first() {
        let (backend, profile) = professional();
        let mut nameless = form("x");
        nameless.name = " ".into();
        assert!(matches!(
            add_patient(&backend, &profile.user_id, &nameless, PlanTier::Free),
            Err(RosterError::Missing("name"))
        ));

        let mut bad_date = form("Maria Silva");
        bad_date.birth_date = Some("12/04/1985".into());
        assert!(matches!(
            add_patient(&backend, &profile.user_id, &bad_date, PlanTier::Free),
            Err(RosterError::InvalidDate(_))
        ));
    }

    #[test]
    fn claim_links_patient_profile() {
        let (backend, pro) = professional();
        let added = add_patient(&backend, &pro.user_id, &form("Maria Silva"), PlanTier::Free).unwrap();
        let patient = make_profile(&backend.conn().unwrap(), "Maria Silva", UserType::Patient);

        let claimed = claim_access(&backend, &patient.user_id, &added.patient.access_token).unwrap();
        assert_eq!(claimed.patient_id, Some(patient.id));

        let again = claim_access(&backend, &patient.user_id, &added.patient.access_token).unwrap();
        assert_eq!(again.patient_id, Some(patient.id));

        let other = make_profile(&backend.conn().unwrap(), "Ana Costa", UserType::Patient);
        assert!(matches!(
            claim_access(&backend, &other.user_id, &added.patient.access_token),
            Err(RosterError::AlreadyClaimed)
        ));
    }

    #[test]
    fn claim_with_unknown_token_rejected() {
        let backend = Backend::in_memory(ORIGIN).unwrap();
        let patient = make_profile(&backend.conn().unwrap(), "Maria Silva", UserType::Patient);
        assert!(matches!(
            claim_access(&backend, &patient.user_id, "nope"),
            Err(RosterError::InvalidAccessLink)
        ));
    }

    #[test]
    fn intake_moves_to_link_and_back() {
        let (backend, profile) = professional();
        let mut intake = PatientIntake::default();
        assert!(intake.link().is_none());

        let link = intake
            .submit(&backend, &profile.user_id, &form("Maria Silva"), PlanTier::Free)
            .unwrap()
            .link;
        assert_eq!(intake.link().map(|l| l.link.as_str()), Some(link.as_str()));

        intake.close();
        assert!(matches!(intake, PatientIntake::Form));
    }

    #[test]
    fn intake_stays_on_form_when_rejected() {
        let (backend, profile) = professional();
        let mut intake = PatientIntake::Form;
        let mut empty = form("x");
        empty.email = String::new();
        assert!(intake.submit(&backend, &profile.user_id, &empty, PlanTier::Free).is_err());
        assert!(matches!(intake, PatientIntake::Form));
    }
}
