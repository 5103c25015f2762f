use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{date_column, format_timestamp, timestamp_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_history_entry(
    conn: &Connection,
    entry: &MedicalHistoryEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medical_history (id, patient_profile_id, title, description,
         evaluating_professional, history_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.id.to_string(),
            entry.patient_profile_id.to_string(),
            entry.title,
            entry.description,
            entry.evaluating_professional,
            entry.history_date.to_string(),
            format_timestamp(&entry.created_at),
            format_timestamp(&entry.updated_at),
        ],
    )?;
    Ok(())
}

pub fn list_history_for_profile(
    conn: &Connection,
    patient_profile_id: &Uuid,
) -> Result<Vec<MedicalHistoryEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_profile_id, title, description, evaluating_professional,
         history_date, created_at, updated_at
         FROM medical_history WHERE patient_profile_id = ?1
         ORDER BY history_date DESC, created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![patient_profile_id.to_string()], history_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<MedicalHistoryEntry> {
    Ok(MedicalHistoryEntry {
        id: uuid_column(row, 0)?,
        patient_profile_id: uuid_column(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        evaluating_professional: row.get(4)?,
        history_date: date_column(row, 5)?,
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::{date, make_profile};
    use crate::db::repository::now_utc;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn history_entries_newest_first() {
        let conn = open_memory_database().unwrap();
        let profile = make_profile(&conn, "Maria", UserType::Patient);
        for (title, day) in [("Consultation", 15), ("Follow-up", 20), ("Exam", 10)] {
            let now = now_utc();
            insert_history_entry(&conn, &MedicalHistoryEntry {
                id: Uuid::new_v4(),
                patient_profile_id: profile.id,
                title: title.into(),
                description: "Routine visit".into(),
                evaluating_professional: None,
                history_date: date(2024, 12, day),
                created_at: now,
                updated_at: now,
            })
            .unwrap();
        }

        let titles: Vec<_> = list_history_for_profile(&conn, &profile.id)
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Follow-up", "Consultation", "Exam"]);
    }
}
