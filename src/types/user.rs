use serde::{Deserialize, Serialize};

/// The authenticated identity as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Numeric user id.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Login email.
    pub email: String,

    /// Account creation time as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    /// Create a new `User`.
    pub fn new(id: i64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_without_created_at() {
        let user: User =
            serde_json::from_value(json!({"id": 1, "name": "Ada", "email": "ada@example.com"}))
                .unwrap();
        assert_eq!(user, User::new(1, "Ada", "ada@example.com"));
    }

    #[test]
    fn deserialize_ignores_unknown_fields() {
        let user: User = serde_json::from_value(json!({
            "id": 7,
            "name": "Grace",
            "email": "grace@example.com",
            "created_at": "2025-01-02T03:04:05Z",
            "is_active": true
        }))
        .unwrap();
        assert_eq!(user.created_at.as_deref(), Some("2025-01-02T03:04:05Z"));
    }

    #[test]
    fn serialize_skips_missing_created_at() {
        let value = serde_json::to_value(User::new(1, "Ada", "ada@example.com")).unwrap();
        assert_eq!(
            value,
            json!({"id": 1, "name": "Ada", "email": "ada@example.com"})
        );
    }
}
