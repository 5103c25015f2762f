//! Record creation: profile resolution, optional upload, single insert.

use serde::Serialize;
use uuid::Uuid;

use super::draft::{RecordDraft, ValidationError};
use super::schema::schema;
use crate::backend::{Backend, BackendError};
use crate::content::{self, Locale, Message, Notice};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::*;
use crate::storage::{self, Attachment, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid record: {0}")]
    Validation(#[from] ValidationError),
    #[error("Profile not found for user {0}")]
    ProfileNotFound(Uuid),
    #[error("Upload failed: {0}")]
    Upload(#[from] StorageError),
    /// Backend message, verbatim.
    #[error("{0}")]
    Insert(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl RecordError {
    /// The single notice shown for this failure.
    pub fn notice(&self, kind: RecordKind, locale: Locale) -> Notice {
        match self {
            Self::Upload(StorageError::UnsupportedType(_)) => {
                content::notice(locale, Message::InvalidFileType)
            }
            Self::Upload(StorageError::TooLarge { .. }) => content::notice(locale, Message::FileTooLarge),
            Self::ProfileNotFound(_) => content::notice(locale, Message::ProfileMissing),
            Self::Backend(_) => content::notice(locale, Message::RecordFailed(kind)),
            other => content::notice_with(locale, Message::RecordFailed(kind), other.to_string()),
        }
    }
}

/// A stored clinical record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum ClinicalRecord {
    Exam(Exam),
    Vaccine(Vaccine),
    Medication(Medication),
    History(MedicalHistoryEntry),
}

impl ClinicalRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Exam(_) => RecordKind::Exam,
            Self::Vaccine(_) => RecordKind::Vaccine,
            Self::Medication(_) => RecordKind::Medication,
            Self::History(_) => RecordKind::History,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Exam(r) => r.id,
            Self::Vaccine(r) => r.id,
            Self::Medication(r) => r.id,
            Self::History(r) => r.id,
        }
    }
}

/// Store a new clinical record for the profile owned by `user_id`.
///
/// The attachment, if any, is uploaded first and its public URL is written
/// into the row. A failed upload aborts before the insert. A failed insert
/// leaves the uploaded object in place; its key is logged.
pub fn create_clinical_record(
    backend: &Backend,
    user_id: &Uuid,
    draft: RecordDraft,
    attachment: Option<Attachment>,
) -> Result<ClinicalRecord, RecordError> {
    let kind = draft.kind();
    if attachment.is_some() && !schema(kind).accepts_attachment() {
        return Err(ValidationError::AttachmentNotAccepted(kind).into());
    }

    let conn = backend.conn()?;
    let profile = repository::get_profile_by_user_id(&conn, user_id)
        .map_err(BackendError::from)?
        .ok_or(RecordError::ProfileNotFound(*user_id))?;

    let uploaded = match attachment {
        Some(file) => {
            storage::validate_upload(&file)?;
            let key = storage::object_key(user_id, chrono::Utc::now().timestamp_millis(), &file.filename);
            backend.storage().put(&key, &file.bytes)?;
            let url = backend.storage().public_url(&key);
            Some((key, url))
        }
        None => None,
    };
    let file_url = uploaded.as_ref().map(|(_, url)| url.clone());

    let now = repository::now_utc();
    let record = match draft {
        RecordDraft::Exam(d) => ClinicalRecord::Exam(Exam {
            id: Uuid::new_v4(),
            patient_profile_id: profile.id,
            name: d.name,
            exam_type: d.exam_type,
            exam_date: d.exam_date,
            file_url,
            notes: d.notes,
            created_at: now,
            updated_at: now,
        }),
        RecordDraft::Vaccine(d) => ClinicalRecord::Vaccine(Vaccine {
            id: Uuid::new_v4(),
            patient_profile_id: profile.id,
            name: d.name,
            vaccine_date: d.vaccine_date,
            batch: d.batch,
            location: d.location,
            proof_file_url: file_url,
            created_at: now,
            updated_at: now,
        }),
        RecordDraft::Medication(d) => ClinicalRecord::Medication(Medication {
            id: Uuid::new_v4(),
            patient_profile_id: profile.id,
            name: d.name,
            dose: d.dose,
            frequency: d.frequency,
            start_date: d.start_date,
            end_date: if d.still_in_use { None } else { d.end_date },
            still_in_use: d.still_in_use,
            created_at: now,
            updated_at: now,
        }),
        RecordDraft::History(d) => ClinicalRecord::History(MedicalHistoryEntry {
            id: Uuid::new_v4(),
            patient_profile_id: profile.id,
            title: d.title,
            description: d.description,
            evaluating_professional: d.evaluating_professional,
            history_date: d.history_date,
            created_at: now,
            updated_at: now,
        }),
    };

    let inserted = match &record {
        ClinicalRecord::Exam(r) => repository::insert_exam(&conn, r),
        ClinicalRecord::Vaccine(r) => repository::insert_vaccine(&conn, r),
        ClinicalRecord::Medication(r) => repository::insert_medication(&conn, r),
        ClinicalRecord::History(r) => repository::insert_history_entry(&conn, r),
    };

    if let Err(e) = inserted {
        if let Some((key, _)) = &uploaded {
            tracing::warn!(%kind, key = %key, "Insert failed after upload; object left orphaned");
        }
        return Err(RecordError::Insert(raw_message(e)));
    }

    tracing::info!(%kind, id = %record.id(), profile = %profile.id, "Clinical record created");
    Ok(record)
}

fn raw_message(err: DatabaseError) -> String {
    match err {
        DatabaseError::Sqlite(e) => e.to_string(),
        other => other.to_string(),
    }
}
