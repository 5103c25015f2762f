use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{format_timestamp, opt_date_column, timestamp_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::*;

const PROFILE_COLUMNS: &str =
    "id, user_id, full_name, user_type, phone, birth_date, cpf, created_at, updated_at";

pub fn insert_profile(conn: &Connection, profile: &Profile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO profiles (id, user_id, full_name, user_type, phone, birth_date, cpf,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            profile.id.to_string(),
            profile.user_id.to_string(),
            profile.full_name,
            profile.user_type.as_str(),
            profile.phone,
            profile.birth_date.map(|d| d.to_string()),
            profile.cpf,
            format_timestamp(&profile.created_at),
            format_timestamp(&profile.updated_at),
        ],
    )?;
    Ok(())
}

/// Look up the profile owned by a signed-in user.
pub fn get_profile_by_user_id(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<Profile>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1"),
            params![user_id.to_string()],
            profile_row,
        )
        .optional()?;
    raw.map(profile_from_row).transpose()
}

pub fn get_profile(conn: &Connection, id: &Uuid) -> Result<Option<Profile>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
            params![id.to_string()],
            profile_row,
        )
        .optional()?;
    raw.map(profile_from_row).transpose()
}

/// Row with `user_type` still as text; the enum is parsed outside the rusqlite closure
/// so an unknown value surfaces as `DatabaseError::InvalidEnum`.
type ProfileRow = (Profile, String);

fn profile_row(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    let user_type: String = row.get(3)?;
    Ok((
        Profile {
            id: uuid_column(row, 0)?,
            user_id: uuid_column(row, 1)?,
            full_name: row.get(2)?,
            user_type: UserType::Patient,
            phone: row.get(4)?,
            birth_date: opt_date_column(row, 5)?,
            cpf: row.get(6)?,
            created_at: timestamp_column(row, 7)?,
            updated_at: timestamp_column(row, 8)?,
        },
        user_type,
    ))
}

fn profile_from_row((mut profile, user_type): ProfileRow) -> Result<Profile, DatabaseError> {
    profile.user_type = UserType::from_str(&user_type)?;
    Ok(profile)
}
