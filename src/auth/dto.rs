use serde::{Deserialize, Serialize};

use crate::auth::repo_types::User;

pub const TOKEN_TYPE: &str = "Bearer";

/// Request body for user registration. Absent fields deserialize as empty
/// strings so they land in the aggregated validation response instead of a
/// body-rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for starting password recovery.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Response returned after registration: the created user plus its first
/// bearer token. `User` serialization skips the password hash.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub data: User,
    pub access_token: String,
    pub token_type: &'static str,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
    pub token_type: &'static str,
}

/// Response for the profile read.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub data: User,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@x.com".into(),
            username: "ana1".into(),
            password_hash: "$argon2id$v=19$hidden".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn register_response_serialization() {
        let response = RegisterResponse {
            data: sample_user(),
            access_token: "abc123".into(),
            token_type: TOKEN_TYPE,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"access_token\":\"abc123\""));
        assert!(json.contains("\"token_type\":\"Bearer\""));
        assert!(json.contains("ana@x.com"));
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn profile_response_never_leaks_the_hash() {
        let response = ProfileResponse {
            data: sample_user(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("argon2id"));
    }
}
