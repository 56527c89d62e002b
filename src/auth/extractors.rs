use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::auth::repo_types::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Resolves the bearer token from the Authorization header to the calling
/// user. Handlers receive the user as a plain value; there is no ambient
/// session state.
#[derive(Debug)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let user_id = state
            .tokens
            .resolve(token)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        // A token row without its user means the account is gone; treat the
        // credential as invalid.
        let user = state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header::AUTHORIZATION;
    use axum::http::Request;

    use super::*;
    use crate::auth::dto::RegisterRequest;
    use crate::auth::service;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/profile");
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    async fn registered_state() -> (AppState, String) {
        let state = AppState::fake();
        let (_, token) = service::register(
            &state,
            RegisterRequest {
                name: "Ana".into(),
                email: "ana@x.com".into(),
                username: "ana1".into(),
                password: "password1".into(),
            },
        )
        .await
        .expect("registration should succeed");
        (state, token.token)
    }

    #[tokio::test]
    async fn resolves_a_valid_bearer_token() {
        let (state, token) = registered_state().await;
        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));
        let AuthUser(user) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("extraction should succeed");
        assert_eq!(user.email, "ana@x.com");
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        let (state, _) = registered_state().await;
        let mut parts = parts_with_header(None);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn rejects_wrong_scheme() {
        let (state, token) = registered_state().await;
        let mut parts = parts_with_header(Some(&format!("Basic {token}")));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn rejects_unknown_token() {
        let (state, _) = registered_state().await;
        let mut parts = parts_with_header(Some("Bearer not-a-real-token"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn rejects_revoked_token() {
        let (state, token) = registered_state().await;
        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));
        let AuthUser(user) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("token valid before logout");

        service::logout(&state, &user).await.expect("logout");

        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }
}
