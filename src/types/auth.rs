use serde::{Deserialize, Serialize};

use crate::types::User;

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Successful response of both `/auth/login` and `/auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    /// The identity that was authenticated.
    pub user: User,

    /// Bearer token for subsequent requests.
    pub access_token: String,

    /// Optional greeting from the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of a login or signup attempt, ready to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub success: bool,
    pub message: String,
}

impl AuthOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_response_from_server() {
        let response: AuthResponse = serde_json::from_value(json!({
            "user": {"id": 1, "name": "Ada", "email": "ada@example.com"},
            "access_token": "abc",
            "message": "Login successful"
        }))
        .unwrap();
        assert_eq!(response.access_token, "abc");
        assert_eq!(response.user.id, 1);
        assert_eq!(response.message.as_deref(), Some("Login successful"));
    }

    #[test]
    fn auth_response_message_optional() {
        let response: AuthResponse = serde_json::from_value(json!({
            "user": {"id": 2, "name": "Bo", "email": "bo@example.com"},
            "access_token": "xyz"
        }))
        .unwrap();
        assert!(response.message.is_none());
    }

    #[test]
    fn signup_request_shape() {
        let body = SignupRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"name": "Ada", "email": "ada@example.com", "password": "secret"})
        );
    }
}
