use serde::{Deserialize, Serialize};

/// Response of `POST /categorize`.
///
/// The backend answers `{"status": "successed"}` on success and
/// `{"status": "failed", "error": "..."}` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategorizeStatus {
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CategorizeStatus {
    /// True unless the server reported a failure.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && !self.status.eq_ignore_ascii_case("failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_status() {
        let status: CategorizeStatus =
            serde_json::from_value(json!({"status": "successed"})).unwrap();
        assert!(status.is_success());
    }

    #[test]
    fn failure_status() {
        let status: CategorizeStatus =
            serde_json::from_value(json!({"status": "failed", "error": "bad column"})).unwrap();
        assert!(!status.is_success());
        assert_eq!(status.error.as_deref(), Some("bad column"));
    }
}
