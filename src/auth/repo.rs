use async_trait::async_trait;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::auth::repo_types::{AccessToken, NewUser, PasswordReset, User};
use crate::auth::token::generate_token;
use crate::error::{ApiError, FieldErrors};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("the email has already been taken")]
    DuplicateEmail,
    #[error("the username has already been taken")]
    DuplicateUsername,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        // Unique-constraint losers (the concurrent-registration race) surface
        // with the same field-error shape as the pre-check.
        let mut errors = FieldErrors::new();
        match err {
            StoreError::DuplicateEmail => {
                crate::auth::validate::duplicate_email(&mut errors);
                ApiError::Validation(errors)
            }
            StoreError::DuplicateUsername => {
                crate::auth::validate::duplicate_username(&mut errors);
                ApiError::Validation(errors)
            }
            StoreError::Database(e) => ApiError::Internal(e.into()),
        }
    }
}

/// User persistence. Uniqueness of `email` and `username` is enforced by the
/// storage engine, not just the service-level pre-check.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
}

/// Bearer-token persistence. A token is valid exactly while its row exists.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn issue(&self, user_id: Uuid) -> Result<AccessToken, StoreError>;
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, StoreError>;
    /// Deletes every token for the user and returns how many were removed.
    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, StoreError>;
    /// Records an already-dispatched reset token; the caller generates and
    /// sends it first so a refused dispatch leaves the store untouched.
    async fn create_password_reset(
        &self,
        email: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<PasswordReset, StoreError>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        match db_err.constraint() {
            Some("users_email_key") => return StoreError::DuplicateEmail,
            Some("users_username_key") => return StoreError::DuplicateUsername,
            _ => {}
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, username, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, username, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, username, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, username, password_hash, created_at
            "#,
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique_violation)?;
        Ok(user)
    }
}

pub struct PgTokenStore {
    db: PgPool,
}

impl PgTokenStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn issue(&self, user_id: Uuid) -> Result<AccessToken, StoreError> {
        let token = sqlx::query_as::<_, AccessToken>(
            r#"
            INSERT INTO access_tokens (token, user_id)
            VALUES ($1, $2)
            RETURNING token, user_id, created_at
            "#,
        )
        .bind(generate_token())
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, StoreError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT user_id FROM access_tokens WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|(user_id,)| user_id))
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM access_tokens WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn create_password_reset(
        &self,
        email: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<PasswordReset, StoreError> {
        // One outstanding reset per email: replace any earlier request.
        sqlx::query(r#"DELETE FROM password_resets WHERE email = $1"#)
            .bind(email)
            .execute(&self.db)
            .await?;

        let reset = sqlx::query_as::<_, PasswordReset>(
            r#"
            INSERT INTO password_resets (email, token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING email, token, expires_at
            "#,
        )
        .bind(email)
        .bind(token)
        .bind(OffsetDateTime::now_utc() + ttl)
        .fetch_one(&self.db)
        .await?;
        Ok(reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_surfaces_as_the_409_field_map() {
        match ApiError::from(StoreError::DuplicateEmail) {
            ApiError::Validation(errors) => {
                assert_eq!(
                    errors["email"],
                    vec!["the email has already been taken".to_string()]
                );
                assert!(!errors.contains_key("username"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_username_surfaces_as_the_409_field_map() {
        match ApiError::from(StoreError::DuplicateUsername) {
            ApiError::Validation(errors) => {
                assert_eq!(
                    errors["username"],
                    vec!["the username has already been taken".to_string()]
                );
                assert!(!errors.contains_key("email"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn database_errors_stay_internal() {
        let err = ApiError::from(StoreError::Database(sqlx::Error::RowNotFound));
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
