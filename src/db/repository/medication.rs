use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{date_column, format_timestamp, opt_date_column, timestamp_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (id, patient_profile_id, name, dose, frequency, start_date,
         end_date, still_in_use, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            med.id.to_string(),
            med.patient_profile_id.to_string(),
            med.name,
            med.dose,
            med.frequency,
            med.start_date.to_string(),
            med.end_date.map(|d| d.to_string()),
            med.still_in_use as i32,
            format_timestamp(&med.created_at),
            format_timestamp(&med.updated_at),
        ],
    )?;
    Ok(())
}

/// Medications of a patient profile, most recent start date first.
pub fn list_medications_for_profile(
    conn: &Connection,
    patient_profile_id: &Uuid,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_profile_id, name, dose, frequency, start_date, end_date,
         still_in_use, created_at, updated_at
         FROM medications WHERE patient_profile_id = ?1
         ORDER BY start_date DESC, created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![patient_profile_id.to_string()], medication_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn medication_from_row(row: &Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        id: uuid_column(row, 0)?,
        patient_profile_id: uuid_column(row, 1)?,
        name: row.get(2)?,
        dose: row.get(3)?,
        frequency: row.get(4)?,
        start_date: date_column(row, 5)?,
        end_date: opt_date_column(row, 6)?,
        still_in_use: row.get::<_, i32>(7)? != 0,
        created_at: timestamp_column(row, 8)?,
        updated_at: timestamp_column(row, 9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::{date, make_profile};
    use crate::db::repository::now_utc;
    use crate::db::sqlite::open_memory_database;

    fn medication(profile_id: Uuid, still_in_use: bool, end_date: Option<chrono::NaiveDate>) -> Medication {
        let now = now_utc();
        Medication {
            id: Uuid::new_v4(),
            patient_profile_id: profile_id,
            name: "Losartan 50mg".into(),
            dose: "1 tablet".into(),
            frequency: "once daily".into(),
            start_date: date(2024, 10, 1),
            end_date,
            still_in_use,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn medication_round_trip() {
        let conn = open_memory_database().unwrap();
        let profile = make_profile(&conn, "Maria", UserType::Patient);
        let med = medication(profile.id, false, Some(date(2024, 12, 1)));
        insert_medication(&conn, &med).unwrap();

        assert_eq!(list_medications_for_profile(&conn, &profile.id).unwrap(), vec![med]);
    }

    #[test]
    fn schema_rejects_in_use_medication_with_end_date() {
        let conn = open_memory_database().unwrap();
        let profile = make_profile(&conn, "Maria", UserType::Patient);
        let med = medication(profile.id, true, Some(date(2024, 12, 1)));
        assert!(insert_medication(&conn, &med).is_err());
    }
}
