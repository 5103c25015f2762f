use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vaccine {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub name: String,
    pub vaccine_date: NaiveDate,
    pub batch: Option<String>,
    pub location: Option<String>,
    pub proof_file_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
