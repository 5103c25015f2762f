//! Field schemas for the four clinical record kinds.
//!
//! One schema per kind drives both validation (`RecordDraft::from_form`) and
//! the form description served to clients.

use serde::Serialize;

use crate::models::RecordKind;

/// Exam categories offered by the exam form.
pub const EXAM_TYPES: &[&str] = &[
    "Laboratory",
    "Imaging",
    "Cardiology",
    "Neurology",
    "Ophthalmology",
    "Audiology",
    "Endoscopy",
    "Others",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "options", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    LongText,
    /// ISO date, `YYYY-MM-DD`.
    Date,
    /// Yes/no toggle.
    Flag,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec { name, label, kind, required }
}

/// Form description of one record kind.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecordSchema {
    pub kind: RecordKind,
    /// Backing table.
    pub table: &'static str,
    /// Column receiving the public URL of an attached file, if the kind accepts one.
    pub file_column: Option<&'static str>,
    pub fields: &'static [FieldSpec],
}

impl RecordSchema {
    pub fn accepts_attachment(&self) -> bool {
        self.file_column.is_some()
    }
}

const EXAM_FIELDS: &[FieldSpec] = &[
    field("name", "Exam Name", FieldKind::Text, true),
    field("exam_type", "Exam Type", FieldKind::Choice(EXAM_TYPES), true),
    field("exam_date", "Exam Date", FieldKind::Date, true),
    field("notes", "Notes", FieldKind::LongText, false),
];

const VACCINE_FIELDS: &[FieldSpec] = &[
    field("name", "Vaccine Name", FieldKind::Text, true),
    field("vaccine_date", "Application Date", FieldKind::Date, true),
    field("batch", "Batch", FieldKind::Text, false),
    field("location", "Application Location", FieldKind::Text, false),
];

const MEDICATION_FIELDS: &[FieldSpec] = &[
    field("name", "Medication Name", FieldKind::Text, true),
    field("dose", "Dose", FieldKind::Text, true),
    field("frequency", "Frequency", FieldKind::Text, true),
    field("start_date", "Start Date", FieldKind::Date, true),
    field("end_date", "End Date", FieldKind::Date, false),
    field("still_in_use", "Still in use", FieldKind::Flag, false),
];

// history_date defaults to the submission day when left empty.
const HISTORY_FIELDS: &[FieldSpec] = &[
    field("title", "Title", FieldKind::Text, true),
    field("description", "Description", FieldKind::LongText, true),
    field("evaluating_professional", "Responsible Professional", FieldKind::Text, false),
    field("history_date", "Date", FieldKind::Date, false),
];

pub fn schema(kind: RecordKind) -> RecordSchema {
    match kind {
        RecordKind::Exam => RecordSchema {
            kind,
            table: "exams",
            file_column: Some("file_url"),
            fields: EXAM_FIELDS,
        },
        RecordKind::Vaccine => RecordSchema {
            kind,
            table: "vaccines",
            file_column: Some("proof_file_url"),
            fields: VACCINE_FIELDS,
        },
        RecordKind::Medication => RecordSchema {
            kind,
            table: "medications",
            file_column: None,
            fields: MEDICATION_FIELDS,
        },
        RecordKind::History => RecordSchema {
            kind,
            table: "medical_history",
            file_column: None,
            fields: HISTORY_FIELDS,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exam_and_vaccine_accept_files() {
        assert!(schema(RecordKind::Exam).accepts_attachment());
        assert!(schema(RecordKind::Vaccine).accepts_attachment());
        assert!(!schema(RecordKind::Medication).accepts_attachment());
        assert!(!schema(RecordKind::History).accepts_attachment());
    }

    #[test]
    fn every_kind_has_a_required_name_or_title() {
        for kind in RecordKind::all() {
            let s = schema(*kind);
            let first = s.fields[0];
            assert!(first.required, "{kind} first field should be required");
            assert!(matches!(first.name, "name" | "title"));
        }
    }

    #[test]
    fn schema_serializes_choice_options() {
        let json = serde_json::to_value(schema(RecordKind::Exam)).unwrap();
        assert_eq!(json["kind"], "exam");
        assert_eq!(json["fields"][1]["kind"]["type"], "choice");
        assert_eq!(json["fields"][1]["kind"]["options"][0], "Laboratory");
        assert_eq!(json["fields"][2]["kind"]["type"], "date");
    }
}
