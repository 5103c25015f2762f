use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A medication taken by a patient. `still_in_use` implies `end_date` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub name: String,
    pub dose: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub still_in_use: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Medication {
    /// Status label derived from the stored flag, never from the dates.
    pub fn status_label(&self) -> &'static str {
        if self.still_in_use {
            "Active"
        } else {
            "Inactive"
        }
    }
}
