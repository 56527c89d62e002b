use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, ProfileResponse,
            RegisterRequest, RegisterResponse, TOKEN_TYPE,
        },
        extractors::AuthUser,
        service,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/login/recuperar", post(forgot_password))
        .route("/logout", post(logout))
        .route("/profile", get(profile))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let (user, token) = service::register(&state, payload).await?;
    Ok(Json(RegisterResponse {
        data: user,
        access_token: token.token,
        token_type: TOKEN_TYPE,
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (user, token) = service::login(&state, payload).await?;
    Ok(Json(LoginResponse {
        message: format!("Hi {}, welcome to home", user.name),
        access_token: token.token,
        token_type: TOKEN_TYPE,
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    service::logout(&state, &user).await?;
    Ok(Json(MessageResponse {
        message: "you have been logged out and your access tokens were revoked".to_string(),
    }))
}

/// Pure read of the caller's own record.
#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn profile(AuthUser(user): AuthUser) -> Result<Json<ProfileResponse>, ApiError> {
    Ok(Json(ProfileResponse { data: user }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    service::forgot_password(&state, &payload.email).await?;
    Ok(Json(MessageResponse {
        message: "password recovery instructions were sent to your email".to_string(),
    }))
}
