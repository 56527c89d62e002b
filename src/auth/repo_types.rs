use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Identity record. `email` and `username` are unique at the storage level;
/// identity fields are never updated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

/// Opaque bearer credential. Valid exactly while the row exists; logout
/// deletes every row for the user.
#[derive(Debug, Clone, FromRow)]
pub struct AccessToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// Ephemeral recovery token bound to an email address.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub email: String,
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Fields persisted for a new user. The password arrives here already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}
