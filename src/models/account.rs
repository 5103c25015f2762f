use chrono::NaiveDateTime;
use uuid::Uuid;

/// Credentials for one sign-in identity. `id` is the `user_id` referenced by
/// the profile.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
    pub created_at: NaiveDateTime,
}
