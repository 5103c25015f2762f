//! Read models for the patient and professional dashboards.

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::backend::{Backend, BackendError};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::*;
use crate::report::{ExportOptions, MedicalData};
use crate::roster::{access_link, patient_limit};

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Profile not found for user {0}")]
    ProfileNotFound(Uuid),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<DatabaseError> for DashboardError {
    fn from(err: DatabaseError) -> Self {
        BackendError::from(err).into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatientStats {
    pub exams: usize,
    pub vaccines: usize,
    /// Only medications still in use.
    pub active_medications: usize,
    pub history_entries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientDashboard {
    pub profile: Profile,
    pub stats: PatientStats,
    pub exams: Vec<Exam>,
    pub vaccines: Vec<Vaccine>,
    pub medications: Vec<Medication>,
    pub history: Vec<MedicalHistoryEntry>,
}

impl PatientDashboard {
    /// Report input built from what the dashboard shows.
    pub fn report_data(&self) -> MedicalData {
        MedicalData {
            exams: self.exams.clone(),
            vaccines: self.vaccines.clone(),
            medications: self.medications.clone(),
            history: self.history.clone(),
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            patient_name: self.profile.full_name.clone(),
            ..ExportOptions::default()
        }
    }
}

/// Read one collection; a failure is logged and shown as empty.
fn read_or_empty<T>(
    collection: &'static str,
    conn: &Connection,
    read: impl FnOnce(&Connection) -> Result<Vec<T>, DatabaseError>,
) -> Vec<T> {
    match read(conn) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(collection, error = %e, "Dashboard read failed; showing empty");
            Vec::new()
        }
    }
}

fn resolve_profile(conn: &Connection, user_id: &Uuid) -> Result<Profile, DashboardError> {
    repository::get_profile_by_user_id(conn, user_id)?.ok_or(DashboardError::ProfileNotFound(*user_id))
}

pub fn load_patient_dashboard(backend: &Backend, user_id: &Uuid) -> Result<PatientDashboard, DashboardError> {
    let conn = backend.conn()?;
    let profile = resolve_profile(&conn, user_id)?;

    let exams = read_or_empty("exams", &conn, |c| repository::list_exams_for_profile(c, &profile.id));
    let vaccines = read_or_empty("vaccines", &conn, |c| {
        repository::list_vaccines_for_profile(c, &profile.id)
    });
    let medications = read_or_empty("medications", &conn, |c| {
        repository::list_medications_for_profile(c, &profile.id)
    });
    let history = read_or_empty("medical_history", &conn, |c| {
        repository::list_history_for_profile(c, &profile.id)
    });

    let stats = PatientStats {
        exams: exams.len(),
        vaccines: vaccines.len(),
        active_medications: medications.iter().filter(|m| m.still_in_use).count(),
        history_entries: history.len(),
    };

    Ok(PatientDashboard {
        profile,
        stats,
        exams,
        vaccines,
        medications,
        history,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterStatus {
    /// The patient has claimed the access link.
    Active,
    Pending,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub patient: Patient,
    pub status: RosterStatus,
    pub access_link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfessionalDashboard {
    pub profile: Profile,
    pub plan: PlanTier,
    /// `None` is unlimited.
    pub patient_limit: Option<u32>,
    pub remaining_slots: Option<u32>,
    pub total_patients: usize,
    pub active_patients: usize,
    /// Roster rows matching the search, newest first.
    pub patients: Vec<RosterEntry>,
}

fn matches_search(patient: &Patient, needle: &str) -> bool {
    patient.name.to_lowercase().contains(needle) || patient.email.to_lowercase().contains(needle)
}

pub fn load_professional_dashboard(
    backend: &Backend,
    user_id: &Uuid,
    plan: PlanTier,
    search: Option<&str>,
) -> Result<ProfessionalDashboard, DashboardError> {
    let conn = backend.conn()?;
    let profile = resolve_profile(&conn, user_id)?;

    let roster = read_or_empty("patients", &conn, |c| {
        repository::list_patients_for_professional(c, &profile.id)
    });
    let total_patients = roster.len();
    let active_patients = roster.iter().filter(|p| p.patient_id.is_some()).count();
    let limit = patient_limit(plan);
    let remaining_slots = limit.map(|l| l.saturating_sub(total_patients as u32));

    let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
    let patients = roster
        .into_iter()
        .filter(|p| needle.as_deref().map_or(true, |n| matches_search(p, n)))
        .map(|patient| RosterEntry {
            status: if patient.patient_id.is_some() {
                RosterStatus::Active
            } else {
                RosterStatus::Pending
            },
            access_link: access_link(backend.public_origin(), &patient.access_token),
            patient,
        })
        .collect();

    Ok(ProfessionalDashboard {
        profile,
        plan,
        patient_limit: limit,
        remaining_slots,
        total_patients,
        active_patients,
        patients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::{date, make_profile};
    use crate::records::{create_clinical_record, MedicationDraft, RecordDraft, VaccineDraft, ExamDraft};
    use crate::roster::{add_patient, claim_access, NewPatient};

    const ORIGIN: &str = "http://localhost:8787";

    fn medication(name: &str, still_in_use: bool, start: u32) -> RecordDraft {
        RecordDraft::Medication(MedicationDraft {
            name: name.into(),
            dose: "1 tablet".into(),
            frequency: "once daily".into(),
            start_date: date(2024, start, 1),
            end_date: (!still_in_use).then(|| date(2024, start, 20)),
            still_in_use,
        })
    }

    fn exam(name: &str, day: u32) -> RecordDraft {
        RecordDraft::Exam(ExamDraft {
            name: name.into(),
            exam_type: "Imaging".into(),
            exam_date: date(2024, 12, day),
            notes: None,
        })
    }

    #[test]
    fn patient_dashboard_counts_and_orders() {
        let backend = Backend::in_memory(ORIGIN).unwrap();
        let profile = make_profile(&backend.conn().unwrap(), "Maria Silva", UserType::Patient);
        let user = profile.user_id;

        create_clinical_record(&backend, &user, exam("Chest X-Ray", 10), None).unwrap();
        create_clinical_record(&backend, &user, exam("Complete Blood Count", 15), None).unwrap();
        create_clinical_record(&backend, &user, medication("Losartan", true, 10), None).unwrap();
        create_clinical_record(&backend, &user, medication("Amoxicillin", false, 11), None).unwrap();
        create_clinical_record(
            &backend,
            &user,
            RecordDraft::Vaccine(VaccineDraft {
                name: "Influenza".into(),
                vaccine_date: date(2024, 3, 15),
                batch: None,
                location: None,
            }),
            None,
        )
        .unwrap();

        let dash = load_patient_dashboard(&backend, &user).unwrap();
        assert_eq!(
            dash.stats,
            PatientStats {
                exams: 2,
                vaccines: 1,
                active_medications: 1,
                history_entries: 0,
            }
        );
        assert_eq!(dash.exams[0].name, "Complete Blood Count");
        assert_eq!(dash.medications[0].name, "Amoxicillin");
        assert_eq!(dash.export_options().patient_name, "Maria Silva");
        assert_eq!(dash.report_data().exams.len(), 2);
    }

    #[test]
    fn other_patients_records_excluded() {
        let backend = Backend::in_memory(ORIGIN).unwrap();
        let maria = make_profile(&backend.conn().unwrap(), "Maria Silva", UserType::Patient);
        let joao = make_profile(&backend.conn().unwrap(), "Joao Santos", UserType::Patient);
        create_clinical_record(&backend, &maria.user_id, exam("ECG", 5), None).unwrap();

        let dash = load_patient_dashboard(&backend, &joao.user_id).unwrap();
        assert!(dash.exams.is_empty());
    }

    #[test]
    fn failed_collection_read_degrades_to_empty() {
        let backend = Backend::in_memory(ORIGIN).unwrap();
        let profile = make_profile(&backend.conn().unwrap(), "Maria Silva", UserType::Patient);
        create_clinical_record(&backend, &profile.user_id, exam("ECG", 5), None).unwrap();
        backend.conn().unwrap().execute_batch("DROP TABLE vaccines").unwrap();

        let dash = load_patient_dashboard(&backend, &profile.user_id).unwrap();
        assert!(dash.vaccines.is_empty());
        assert_eq!(dash.exams.len(), 1);
    }

    #[test]
    fn missing_profile_is_an_error() {
        let backend = Backend::in_memory(ORIGIN).unwrap();
        assert!(matches!(
            load_patient_dashboard(&backend, &Uuid::new_v4()),
            Err(DashboardError::ProfileNotFound(_))
        ));
    }

    fn new_patient(name: &str, email: &str) -> NewPatient {
        NewPatient {
            name: name.into(),
            email: email.into(),
            ..NewPatient::default()
        }
    }

    #[test]
    fn professional_dashboard_lists_roster_with_slots() {
        let backend = Backend::in_memory(ORIGIN).unwrap();
        let pro = make_profile(&backend.conn().unwrap(), "Dr. Chen", UserType::Professional);
        add_patient(&backend, &pro.user_id, &new_patient("Maria Silva", "maria@email.com"), PlanTier::Free)
            .unwrap();
        let joao =
            add_patient(&backend, &pro.user_id, &new_patient("Joao Santos", "joao@email.com"), PlanTier::Free)
                .unwrap();

        let patient = make_profile(&backend.conn().unwrap(), "Joao Santos", UserType::Patient);
        claim_access(&backend, &patient.user_id, &joao.patient.access_token).unwrap();

        let dash = load_professional_dashboard(&backend, &pro.user_id, PlanTier::Free, None).unwrap();
        assert_eq!(dash.total_patients, 2);
        assert_eq!(dash.active_patients, 1);
        assert_eq!(dash.patient_limit, Some(5));
        assert_eq!(dash.remaining_slots, Some(3));
        assert_eq!(dash.patients[0].patient.name, "Joao Santos");
        assert_eq!(dash.patients[0].status, RosterStatus::Active);
        assert_eq!(dash.patients[1].status, RosterStatus::Pending);
        assert_eq!(dash.patients[0].access_link, joao.link);
    }

    #[test]
    fn professional_search_matches_name_or_email() {
        let backend = Backend::in_memory(ORIGIN).unwrap();
        let pro = make_profile(&backend.conn().unwrap(), "Dr. Chen", UserType::Professional);
        for (name, email) in [
            ("Maria Silva", "maria@email.com"),
            ("Joao Santos", "joao@email.com"),
            ("Ana Costa", "ana.c@clinic.org"),
        ] {
            add_patient(&backend, &pro.user_id, &new_patient(name, email), PlanTier::Free).unwrap();
        }

        let by_name = load_professional_dashboard(&backend, &pro.user_id, PlanTier::Free, Some("SILVA")).unwrap();
        assert_eq!(by_name.patients.len(), 1);
        assert_eq!(by_name.total_patients, 3);

        let by_email =
            load_professional_dashboard(&backend, &pro.user_id, PlanTier::Free, Some("clinic.org")).unwrap();
        assert_eq!(by_email.patients[0].patient.name, "Ana Costa");

        let blank = load_professional_dashboard(&backend, &pro.user_id, PlanTier::Free, Some("  ")).unwrap();
        assert_eq!(blank.patients.len(), 3);
    }
}
