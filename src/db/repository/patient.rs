use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{format_timestamp, now_utc, opt_date_column, opt_uuid_column, timestamp_column, uuid_column};
use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, professional_id, patient_id, name, email, phone, birth_date,
     cpf, access_token, created_at, updated_at";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, professional_id, patient_id, name, email, phone, birth_date,
         cpf, access_token, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            patient.id.to_string(),
            patient.professional_id.to_string(),
            patient.patient_id.map(|id| id.to_string()),
            patient.name,
            patient.email,
            patient.phone,
            patient.birth_date.map(|d| d.to_string()),
            patient.cpf,
            patient.access_token,
            format_timestamp(&patient.created_at),
            format_timestamp(&patient.updated_at),
        ],
    )?;
    Ok(())
}

/// Number of roster rows owned by a professional.
pub fn count_patients_for_professional(
    conn: &Connection,
    professional_id: &Uuid,
) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM patients WHERE professional_id = ?1",
        params![professional_id.to_string()],
        |row| row.get::<_, u32>(0),
    )?;
    Ok(count)
}

/// Roster of a professional, newest first.
pub fn list_patients_for_professional(
    conn: &Connection,
    professional_id: &Uuid,
) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE professional_id = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map(params![professional_id.to_string()], patient_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn get_patient_by_access_token(
    conn: &Connection,
    access_token: &str,
) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE access_token = ?1"),
        params![access_token],
        patient_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Link a roster row to the patient profile that claimed its access link.
pub fn set_patient_claim(
    conn: &Connection,
    roster_id: &Uuid,
    patient_profile_id: &Uuid,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE patients SET patient_id = ?1, updated_at = ?2 WHERE id = ?3",
        params![
            patient_profile_id.to_string(),
            format_timestamp(&now_utc()),
            roster_id.to_string(),
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: roster_id.to_string(),
        });
    }
    Ok(())
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: uuid_column(row, 0)?,
        professional_id: uuid_column(row, 1)?,
        patient_id: opt_uuid_column(row, 2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        birth_date: opt_date_column(row, 6)?,
        cpf: row.get(7)?,
        access_token: row.get(8)?,
        created_at: timestamp_column(row, 9)?,
        updated_at: timestamp_column(row, 10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::{date, make_profile};
    use crate::db::sqlite::open_memory_database;

    fn make_patient(conn: &Connection, professional_id: Uuid, name: &str, token: &str) -> Patient {
        let now = now_utc();
        let patient = Patient {
            id: Uuid::new_v4(),
            professional_id,
            patient_id: None,
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: Some("+55 11 99999-0000".into()),
            birth_date: Some(date(1980, 5, 17)),
            cpf: None,
            access_token: token.into(),
            created_at: now,
            updated_at: now,
        };
        insert_patient(conn, &patient).unwrap();
        patient
    }

    #[test]
    fn roster_count_scoped_to_professional() {
        let conn = open_memory_database().unwrap();
        let a = make_profile(&conn, "Dr. A", UserType::Professional);
        let b = make_profile(&conn, "Dr. B", UserType::Professional);
        make_patient(&conn, a.id, "Ana", "tok-1");
        make_patient(&conn, a.id, "Joao", "tok-2");
        make_patient(&conn, b.id, "Carlos", "tok-3");

        assert_eq!(count_patients_for_professional(&conn, &a.id).unwrap(), 2);
        assert_eq!(count_patients_for_professional(&conn, &b.id).unwrap(), 1);
    }

    #[test]
    fn roster_listed_newest_first() {
        let conn = open_memory_database().unwrap();
        let prof = make_profile(&conn, "Dr. A", UserType::Professional);
        make_patient(&conn, prof.id, "First", "tok-1");
        make_patient(&conn, prof.id, "Second", "tok-2");

        let roster = list_patients_for_professional(&conn, &prof.id).unwrap();
        let names: Vec<_> = roster.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[test]
    fn claim_links_patient_profile() {
        let conn = open_memory_database().unwrap();
        let prof = make_profile(&conn, "Dr. A", UserType::Professional);
        let invited = make_profile(&conn, "Ana", UserType::Patient);
        let row = make_patient(&conn, prof.id, "Ana", "claim-me");

        let found = get_patient_by_access_token(&conn, "claim-me").unwrap().unwrap();
        assert_eq!(found.id, row.id);
        assert!(found.patient_id.is_none());

        set_patient_claim(&conn, &row.id, &invited.id).unwrap();
        let claimed = get_patient_by_access_token(&conn, "claim-me").unwrap().unwrap();
        assert_eq!(claimed.patient_id, Some(invited.id));
    }

    #[test]
    fn claim_unknown_row_is_not_found() {
        let conn = open_memory_database().unwrap();
        let invited = make_profile(&conn, "Ana", UserType::Patient);
        let err = set_patient_claim(&conn, &Uuid::new_v4(), &invited.id).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn access_tokens_are_unique() {
        let conn = open_memory_database().unwrap();
        let prof = make_profile(&conn, "Dr. A", UserType::Professional);
        make_patient(&conn, prof.id, "Ana", "same");
        let now = now_utc();
        let clash = Patient {
            id: Uuid::new_v4(),
            professional_id: prof.id,
            patient_id: None,
            name: "Other".into(),
            email: "other@example.com".into(),
            phone: None,
            birth_date: None,
            cpf: None,
            access_token: "same".into(),
            created_at: now,
            updated_at: now,
        };
        assert!(insert_patient(&conn, &clash).is_err());
    }
}
