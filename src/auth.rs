//! Local accounts and bearer sessions.
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 digests with a per-account
//! random salt. Session tokens are random URL-safe strings; only their
//! SHA-256 hash is persisted.

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::backend::{Backend, BackendError};
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{Account, Profile, UserType};

pub const PBKDF2_ITERATIONS: u32 = if cfg!(test) { 1_000 } else { 600_000 };
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 32;
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Open sessions kept per account. Signing in beyond this ends the oldest.
pub const MAX_SESSIONS_PER_USER: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("Full name is required")]
    MissingName,
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Session is invalid or has ended")]
    InvalidSession,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub user_type: UserType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

/// An issued session. The token is only ever returned here.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub profile: Option<Profile>,
}

/// Hash a bearer token with SHA-256 for storage.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::Digest;
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

fn derive_hash(password: &str, salt: &[u8]) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut out);
    out
}

fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if valid && !email.contains(char::is_whitespace) {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

/// Create an account with its profile and open a session.
pub fn sign_up(backend: &Backend, request: &SignUp) -> Result<AuthSession, AuthError> {
    let email = normalize_email(&request.email)?;
    if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword { min: MIN_PASSWORD_LENGTH });
    }
    let full_name = request.full_name.trim();
    if full_name.is_empty() {
        return Err(AuthError::MissingName);
    }

    // Hash before taking the connection: PBKDF2 is slow and every request
    // shares the one lock.
    let salt = generate_salt();
    let password_hash = derive_hash(&request.password, &salt);

    let mut conn = backend.conn()?;
    if repository::get_account_by_email(&conn, &email)?.is_some() {
        return Err(AuthError::EmailTaken);
    }

    let now = repository::now_utc();
    let account = Account {
        id: Uuid::new_v4(),
        email,
        password_hash: password_hash.to_vec(),
        salt: salt.to_vec(),
        created_at: now,
    };
    let profile = Profile {
        id: Uuid::new_v4(),
        user_id: account.id,
        full_name: full_name.to_string(),
        user_type: request.user_type,
        phone: None,
        birth_date: None,
        cpf: None,
        created_at: now,
        updated_at: now,
    };
    let token = generate_token();

    let tx = conn.transaction().map_err(DatabaseError::from)?;
    repository::insert_account(&tx, &account)?;
    repository::insert_profile(&tx, &profile)?;
    repository::insert_session(&tx, &hash_token(&token), &account.id)?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(user_id = %account.id, user_type = %profile.user_type, "Account created");
    Ok(AuthSession {
        token,
        user_id: account.id,
        profile: Some(profile),
    })
}

fn verify_password(account: &Account, password: &str) -> bool {
    let candidate = derive_hash(password, &account.salt);
    candidate.as_slice().ct_eq(account.password_hash.as_slice()).unwrap_u8() == 1
}

/// Verify credentials and open a session.
pub fn sign_in(backend: &Backend, request: &SignIn) -> Result<AuthSession, AuthError> {
    sign_in_checked(backend, request, verify_password)
}

/// The connection is released while `verify` runs.
fn sign_in_checked(
    backend: &Backend,
    request: &SignIn,
    verify: impl FnOnce(&Account, &str) -> bool,
) -> Result<AuthSession, AuthError> {
    let email = normalize_email(&request.email).map_err(|_| AuthError::InvalidCredentials)?;
    let account = {
        let conn = backend.conn()?;
        repository::get_account_by_email(&conn, &email)?
    };
    let Some(account) = account else {
        tracing::debug!("Sign-in for unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify(&account, &request.password) {
        tracing::warn!(user_id = %account.id, "Sign-in rejected: wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    let token = generate_token();
    let conn = backend.conn()?;
    repository::insert_session(&conn, &hash_token(&token), &account.id)?;
    let pruned = repository::prune_sessions(&conn, &account.id, MAX_SESSIONS_PER_USER)?;
    let profile = repository::get_profile_by_user_id(&conn, &account.id)?;

    tracing::info!(user_id = %account.id, pruned, "Signed in");
    Ok(AuthSession {
        token,
        user_id: account.id,
        profile,
    })
}

/// End a session. Unknown tokens are an error so callers can tell.
pub fn sign_out(backend: &Backend, token: &str) -> Result<(), AuthError> {
    let conn = backend.conn()?;
    if repository::delete_session(&conn, &hash_token(token))? {
        tracing::info!("Signed out");
        Ok(())
    } else {
        Err(AuthError::InvalidSession)
    }
}

/// Resolve a bearer token to its user and (optional) profile.
pub fn resolve_session(backend: &Backend, token: &str) -> Result<(Uuid, Option<Profile>), AuthError> {
    let conn = backend.conn()?;
    let user_id = repository::get_session_user(&conn, &hash_token(token))?
        .ok_or(AuthError::InvalidSession)?;
    let profile = repository::get_profile_by_user_id(&conn, &user_id)?;
    Ok((user_id, profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> Backend {
        Backend::in_memory("http://localhost:8787").unwrap()
    }

    fn patient_sign_up(email: &str) -> SignUp {
        SignUp {
            email: email.into(),
            password: "correct horse".into(),
            full_name: "Maria Silva".into(),
            user_type: UserType::Patient,
        }
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert_eq!(t1.len(), 43);
    }

    #[test]
    fn hash_token_is_deterministic() {
        assert_eq!(hash_token("test"), hash_token("test"));
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }

    #[test]
    fn sign_up_creates_profile_and_session() {
        let backend = backend();
        let session = sign_up(&backend, &patient_sign_up("maria@example.com")).unwrap();

        let profile = session.profile.as_ref().unwrap();
        assert_eq!(profile.user_type, UserType::Patient);
        assert_eq!(profile.full_name, "Maria Silva");

        let (user_id, resolved) = resolve_session(&backend, &session.token).unwrap();
        assert_eq!(user_id, session.user_id);
        assert_eq!(resolved.unwrap().id, profile.id);
    }

    #[test]
    fn password_stored_hashed() {
        let backend = backend();
        sign_up(&backend, &patient_sign_up("maria@example.com")).unwrap();
        let conn = backend.conn().unwrap();
        let account = repository::get_account_by_email(&conn, "maria@example.com").unwrap().unwrap();
        assert_eq!(account.password_hash.len(), HASH_LENGTH);
        assert_ne!(account.password_hash, b"correct horse".to_vec());
    }

    #[test]
    fn duplicate_email_rejected_case_insensitively() {
        let backend = backend();
        sign_up(&backend, &patient_sign_up("maria@example.com")).unwrap();
        let err = sign_up(&backend, &patient_sign_up("  Maria@Example.com ")).unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[test]
    fn sign_up_validates_input() {
        let backend = backend();
        assert!(matches!(
            sign_up(&backend, &patient_sign_up("not-an-email")),
            Err(AuthError::InvalidEmail)
        ));

        let mut short = patient_sign_up("a@example.com");
        short.password = "12345".into();
        assert!(matches!(sign_up(&backend, &short), Err(AuthError::WeakPassword { min: 6 })));

        let mut nameless = patient_sign_up("b@example.com");
        nameless.full_name = "  ".into();
        assert!(matches!(sign_up(&backend, &nameless), Err(AuthError::MissingName)));
    }

    #[test]
    fn sign_in_with_correct_password() {
        let backend = backend();
        let created = sign_up(&backend, &patient_sign_up("maria@example.com")).unwrap();
        let session = sign_in(
            &backend,
            &SignIn {
                email: "MARIA@example.com".into(),
                password: "correct horse".into(),
            },
        )
        .unwrap();
        assert_eq!(session.user_id, created.user_id);
        assert_ne!(session.token, created.token);
        assert!(session.profile.is_some());
    }

    #[test]
    fn sign_in_rejects_wrong_password_and_unknown_email() {
        let backend = backend();
        sign_up(&backend, &patient_sign_up("maria@example.com")).unwrap();

        let wrong = SignIn {
            email: "maria@example.com".into(),
            password: "battery staple".into(),
        };
        assert!(matches!(sign_in(&backend, &wrong), Err(AuthError::InvalidCredentials)));

        let unknown = SignIn {
            email: "joao@example.com".into(),
            password: "correct horse".into(),
        };
        assert!(matches!(sign_in(&backend, &unknown), Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn connection_free_while_password_checked() {
        use std::sync::{mpsc, Arc};
        use std::time::Duration;

        let backend = Arc::new(backend());
        sign_up(&backend, &patient_sign_up("maria@example.com")).unwrap();

        let request = SignIn {
            email: "maria@example.com".into(),
            password: "correct horse".into(),
        };
        let session = sign_in_checked(&backend, &request, |account, password| {
            let (tx, rx) = mpsc::channel();
            let other = Arc::clone(&backend);
            std::thread::spawn(move || {
                let acquired = other.conn().is_ok();
                let _ = tx.send(acquired);
            });
            let acquired = rx.recv_timeout(Duration::from_secs(5));
            assert_eq!(acquired, Ok(true), "connection held during password check");
            verify_password(account, password)
        })
        .unwrap();
        assert!(session.profile.is_some());
    }

    #[test]
    fn oldest_session_ends_past_the_limit() {
        let backend = backend();
        let first = sign_up(&backend, &patient_sign_up("maria@example.com")).unwrap();
        let request = SignIn {
            email: "maria@example.com".into(),
            password: "correct horse".into(),
        };
        let mut latest = Vec::new();
        for _ in 0..MAX_SESSIONS_PER_USER {
            latest.push(sign_in(&backend, &request).unwrap());
        }

        assert!(matches!(
            resolve_session(&backend, &first.token),
            Err(AuthError::InvalidSession)
        ));
        for session in &latest {
            assert!(resolve_session(&backend, &session.token).is_ok());
        }
    }

    #[test]
    fn sign_out_ends_session() {
        let backend = backend();
        let session = sign_up(&backend, &patient_sign_up("maria@example.com")).unwrap();
        sign_out(&backend, &session.token).unwrap();

        assert!(matches!(
            resolve_session(&backend, &session.token),
            Err(AuthError::InvalidSession)
        ));
        assert!(matches!(sign_out(&backend, &session.token), Err(AuthError::InvalidSession)));
    }
}
