use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalHistoryEntry {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub title: String,
    pub description: String,
    pub evaluating_professional: Option<String>,
    pub history_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
