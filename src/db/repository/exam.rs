use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{date_column, format_timestamp, timestamp_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_exam(conn: &Connection, exam: &Exam) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO exams (id, patient_profile_id, name, exam_type, exam_date, file_url, notes,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            exam.id.to_string(),
            exam.patient_profile_id.to_string(),
            exam.name,
            exam.exam_type,
            exam.exam_date.to_string(),
            exam.file_url,
            exam.notes,
            format_timestamp(&exam.created_at),
            format_timestamp(&exam.updated_at),
        ],
    )?;
    Ok(())
}

/// Exams of a patient profile, most recent exam date first.
pub fn list_exams_for_profile(
    conn: &Connection,
    patient_profile_id: &Uuid,
) -> Result<Vec<Exam>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_profile_id, name, exam_type, exam_date, file_url, notes,
         created_at, updated_at
         FROM exams WHERE patient_profile_id = ?1
         ORDER BY exam_date DESC, created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![patient_profile_id.to_string()], exam_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn exam_from_row(row: &Row<'_>) -> rusqlite::Result<Exam> {
    Ok(Exam {
        id: uuid_column(row, 0)?,
        patient_profile_id: uuid_column(row, 1)?,
        name: row.get(2)?,
        exam_type: row.get(3)?,
        exam_date: date_column(row, 4)?,
        file_url: row.get(5)?,
        notes: row.get(6)?,
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
    })
}
