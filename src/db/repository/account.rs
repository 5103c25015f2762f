use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{format_timestamp, now_utc, timestamp_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_account(conn: &Connection, account: &Account) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO accounts (id, email, password_hash, salt, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            account.id.to_string(),
            account.email,
            account.password_hash,
            account.salt,
            format_timestamp(&account.created_at),
        ],
    )?;
    Ok(())
}

/// Case-insensitive lookup by sign-in email.
pub fn get_account_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Account>, DatabaseError> {
    conn.query_row(
        "SELECT id, email, password_hash, salt, created_at FROM accounts WHERE email = ?1",
        params![email],
        account_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn insert_session(
    conn: &Connection,
    token_hash: &[u8; 32],
    user_id: &Uuid,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, created_at) VALUES (?1, ?2, ?3)",
        params![
            token_hash.as_slice(),
            user_id.to_string(),
            format_timestamp(&now_utc()),
        ],
    )?;
    Ok(())
}

/// Resolve the user owning a session token hash.
pub fn get_session_user(
    conn: &Connection,
    token_hash: &[u8; 32],
) -> Result<Option<Uuid>, DatabaseError> {
    conn.query_row(
        "SELECT user_id FROM sessions WHERE token_hash = ?1",
        params![token_hash.as_slice()],
        |row| uuid_column(row, 0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Returns `true` when a session was removed.
pub fn delete_session(conn: &Connection, token_hash: &[u8; 32]) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![token_hash.as_slice()],
    )?;
    Ok(deleted > 0)
}

/// Keep only the `keep` most recently issued sessions for a user.
/// Returns how many were removed.
pub fn prune_sessions(conn: &Connection, user_id: &Uuid, keep: u32) -> Result<usize, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE user_id = ?1 AND rowid NOT IN (
             SELECT rowid FROM sessions WHERE user_id = ?1 ORDER BY rowid DESC LIMIT ?2
         )",
        params![user_id.to_string(), keep],
    )?;
    Ok(removed)
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: uuid_column(row, 0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        salt: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
    })
}
