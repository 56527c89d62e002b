use time::Duration;
use tracing::{info, warn};

use crate::auth::dto::{LoginRequest, RegisterRequest};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::{AccessToken, NewUser, User};
use crate::auth::token::generate_token;
use crate::auth::validate::{
    duplicate_email, duplicate_username, is_valid_email, validate_register,
};
use crate::error::ApiError;
use crate::state::AppState;

/// Creates the user and issues its first bearer token. All field violations,
/// including taken email/username, are collected into one 409 response; the
/// storage-level unique constraints cover the concurrent-registration race
/// and surface as the same field-error shape.
pub async fn register(
    state: &AppState,
    mut req: RegisterRequest,
) -> Result<(User, AccessToken), ApiError> {
    req.name = req.name.trim().to_string();
    req.email = req.email.trim().to_lowercase();
    req.username = req.username.trim().to_string();

    let mut errors = validate_register(&req);

    if !req.email.is_empty() && state.users.find_by_email(&req.email).await?.is_some() {
        duplicate_email(&mut errors);
    }
    if !req.username.is_empty() && state.users.find_by_username(&req.username).await?.is_some() {
        duplicate_username(&mut errors);
    }

    if !errors.is_empty() {
        warn!(email = %req.email, "registration rejected");
        return Err(ApiError::Validation(errors));
    }

    let password_hash = hash_password(&req.password)?;
    let user = state
        .users
        .create(NewUser {
            name: req.name,
            email: req.email,
            username: req.username,
            password_hash,
        })
        .await?;
    let token = state.tokens.issue(user.id).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((user, token))
}

/// Verifies credentials and issues a fresh token. A missing user and a wrong
/// password are indistinguishable to the caller. Existing tokens stay valid;
/// concurrent sessions are allowed.
pub async fn login(state: &AppState, mut req: LoginRequest) -> Result<(User, AccessToken), ApiError> {
    req.email = req.email.trim().to_lowercase();

    let user = match state.users.find_by_email(&req.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %req.email, "login unknown email");
            return Err(ApiError::Unauthorized);
        }
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(email = %req.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized);
    }

    let token = state.tokens.issue(user.id).await?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((user, token))
}

/// Revokes every token the user holds, not just the one presented for this
/// request, so every other active session is invalidated too.
pub async fn logout(state: &AppState, user: &User) -> Result<u64, ApiError> {
    let revoked = state.tokens.revoke_all_for_user(user.id).await?;
    info!(user_id = %user.id, revoked, "user logged out");
    Ok(revoked)
}

/// Starts password recovery: a malformed email is the caller's mistake (400),
/// a well-formed but unknown one is 404, and a refused dispatch maps to 401.
pub async fn forgot_password(state: &AppState, email: &str) -> Result<(), ApiError> {
    let email = email.trim().to_lowercase();

    if email.is_empty() || !is_valid_email(&email) {
        return Err(ApiError::BadRequest(
            "the email must be a valid email address".to_string(),
        ));
    }

    if state.users.find_by_email(&email).await?.is_none() {
        warn!(email = %email, "password recovery for unknown email");
        return Err(ApiError::NotFound(
            "no user exists for the given email".to_string(),
        ));
    }

    // Dispatch before touching the store: a refused send must leave the
    // previously emailed reset token valid.
    let token = generate_token();
    state
        .mailer
        .send_reset(&email, &token)
        .await
        .map_err(|e| match e {
            crate::mailer::MailerError::Throttled => ApiError::ResetThrottled,
            crate::mailer::MailerError::Transport(source) => ApiError::Internal(source),
        })?;

    let ttl = Duration::minutes(state.config.reset.token_ttl_minutes);
    state.tokens.create_password_reset(&email, &token, ttl).await?;

    info!(email = %email, "password recovery started");
    Ok(())
}
