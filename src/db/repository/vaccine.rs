use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{date_column, format_timestamp, timestamp_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_vaccine(conn: &Connection, vaccine: &Vaccine) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO vaccines (id, patient_profile_id, name, vaccine_date, batch, location,
         proof_file_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            vaccine.id.to_string(),
            vaccine.patient_profile_id.to_string(),
            vaccine.name,
            vaccine.vaccine_date.to_string(),
            vaccine.batch,
            vaccine.location,
            vaccine.proof_file_url,
            format_timestamp(&vaccine.created_at),
            format_timestamp(&vaccine.updated_at),
        ],
    )?;
    Ok(())
}

pub fn list_vaccines_for_profile(
    conn: &Connection,
    patient_profile_id: &Uuid,
) -> Result<Vec<Vaccine>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_profile_id, name, vaccine_date, batch, location, proof_file_url,
         created_at, updated_at
         FROM vaccines WHERE patient_profile_id = ?1
         ORDER BY vaccine_date DESC, created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![patient_profile_id.to_string()], vaccine_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn vaccine_from_row(row: &Row<'_>) -> rusqlite::Result<Vaccine> {
    Ok(Vaccine {
        id: uuid_column(row, 0)?,
        patient_profile_id: uuid_column(row, 1)?,
        name: row.get(2)?,
        vaccine_date: date_column(row, 3)?,
        batch: row.get(4)?,
        location: row.get(5)?,
        proof_file_url: row.get(6)?,
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
    })
}
