//! Clinical records: exams, vaccines, medications and history entries.
//!
//! One data-driven schema per kind, one draft type built from form fields,
//! one create operation for all kinds.

pub mod create;
pub mod draft;
pub mod schema;

pub use create::{create_clinical_record, ClinicalRecord, RecordError};
pub use draft::{
    ExamDraft, FormFields, HistoryDraft, MedicationDraft, RecordDraft, ValidationError, VaccineDraft,
};
pub use schema::{schema, FieldKind, FieldSpec, RecordSchema, EXAM_TYPES};
