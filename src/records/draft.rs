//! Typed record drafts built from submitted form fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::schema::{schema, FieldKind, FieldSpec};
use crate::models::RecordKind;

/// Raw form input, keyed by field name.
///
/// Values may be JSON strings, booleans or numbers; empty strings count as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormFields(pub Map<String, Value>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    /// Trimmed text value; `None` when missing, null or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    Missing(&'static str),
    #[error("Invalid date for {field}: {value}")]
    InvalidDate { field: &'static str, value: String },
    #[error("Invalid yes/no value for {field}: {value}")]
    InvalidFlag { field: &'static str, value: String },
    #[error("Invalid choice for {field}: {value}")]
    InvalidChoice { field: &'static str, value: String },
    #[error("{0} records do not accept file attachments")]
    AttachmentNotAccepted(RecordKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamDraft {
    pub name: String,
    pub exam_type: String,
    pub exam_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccineDraft {
    pub name: String,
    pub vaccine_date: NaiveDate,
    pub batch: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationDraft {
    pub name: String,
    pub dose: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub still_in_use: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDraft {
    pub title: String,
    pub description: String,
    pub evaluating_professional: Option<String>,
    pub history_date: NaiveDate,
}

/// A validated, not yet stored clinical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordDraft {
    Exam(ExamDraft),
    Vaccine(VaccineDraft),
    Medication(MedicationDraft),
    History(HistoryDraft),
}

impl RecordDraft {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Exam(_) => RecordKind::Exam,
            Self::Vaccine(_) => RecordKind::Vaccine,
            Self::Medication(_) => RecordKind::Medication,
            Self::History(_) => RecordKind::History,
        }
    }

    /// Validate `fields` against the schema of `kind` and build the draft.
    ///
    /// `today` fills a blank history date. A medication marked as still in use
    /// never keeps an end date.
    pub fn from_form(
        kind: RecordKind,
        fields: &FormFields,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let form = CheckedForm::new(kind, fields)?;

        let draft = match kind {
            RecordKind::Exam => Self::Exam(ExamDraft {
                name: form.required_text("name")?,
                exam_type: form.required_text("exam_type")?,
                exam_date: form.required_date("exam_date")?,
                notes: form.text("notes"),
            }),
            RecordKind::Vaccine => Self::Vaccine(VaccineDraft {
                name: form.required_text("name")?,
                vaccine_date: form.required_date("vaccine_date")?,
                batch: form.text("batch"),
                location: form.text("location"),
            }),
            RecordKind::Medication => {
                let still_in_use = form.flag("still_in_use")?;
                let end_date = if still_in_use {
                    None
                } else {
                    form.date("end_date")?
                };
                Self::Medication(MedicationDraft {
                    name: form.required_text("name")?,
                    dose: form.required_text("dose")?,
                    frequency: form.required_text("frequency")?,
                    start_date: form.required_date("start_date")?,
                    end_date,
                    still_in_use,
                })
            }
            RecordKind::History => Self::History(HistoryDraft {
                title: form.required_text("title")?,
                description: form.required_text("description")?,
                evaluating_professional: form.text("evaluating_professional"),
                history_date: form.date("history_date")?.unwrap_or(today),
            }),
        };
        Ok(draft)
    }
}

/// Form fields that passed the per-field schema checks.
struct CheckedForm<'a> {
    fields: &'a FormFields,
}

impl<'a> CheckedForm<'a> {
    fn new(kind: RecordKind, fields: &'a FormFields) -> Result<Self, ValidationError> {
        for spec in schema(kind).fields {
            check_field(spec, fields)?;
        }
        Ok(Self { fields })
    }

    fn text(&self, name: &str) -> Option<String> {
        self.fields.text(name)
    }

    fn required_text(&self, name: &'static str) -> Result<String, ValidationError> {
        self.fields.text(name).ok_or(ValidationError::Missing(name))
    }

    fn date(&self, name: &'static str) -> Result<Option<NaiveDate>, ValidationError> {
        self.fields
            .text(name)
            .map(|raw| parse_date(name, &raw))
            .transpose()
    }

    fn required_date(&self, name: &'static str) -> Result<NaiveDate, ValidationError> {
        self.date(name)?.ok_or(ValidationError::Missing(name))
    }

    fn flag(&self, name: &'static str) -> Result<bool, ValidationError> {
        match self.fields.0.get(name) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => {
                let raw = match other {
                    Value::String(s) => s.trim().to_ascii_lowercase(),
                    v => v.to_string(),
                };
                match raw.as_str() {
                    "true" | "on" | "yes" | "1" => Ok(true),
                    "false" | "off" | "no" | "0" | "" => Ok(false),
                    _ => Err(ValidationError::InvalidFlag { field: name, value: raw }),
                }
            }
        }
    }
}

fn check_field(spec: &FieldSpec, fields: &FormFields) -> Result<(), ValidationError> {
    let value = fields.text(spec.name);
    let Some(value) = value else {
        return if spec.required && spec.kind != FieldKind::Flag {
            Err(ValidationError::Missing(spec.name))
        } else {
            Ok(())
        };
    };

    match spec.kind {
        FieldKind::Date => parse_date(spec.name, &value).map(|_| ()),
        FieldKind::Choice(options) if !options.contains(&value.as_str()) => {
            Err(ValidationError::InvalidChoice {
                field: spec.name,
                value,
            })
        }
        _ => Ok(()),
    }
}

fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}
