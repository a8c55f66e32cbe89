use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Body returned by the liveness probe.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Connectivity as last observed by [`crate::FinChat::check_health`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub is_healthy: bool,

    #[serde(with = "crate::utils::time::option")]
    pub last_checked: Option<OffsetDateTime>,

    pub error: Option<String>,
}

impl HealthStatus {
    /// A healthy observation taken at `at`.
    pub fn healthy(at: OffsetDateTime) -> Self {
        Self {
            is_healthy: true,
            last_checked: Some(at),
            error: None,
        }
    }

    /// An unhealthy observation taken at `at`.
    pub fn unhealthy(at: OffsetDateTime, error: impl Into<String>) -> Self {
        Self {
            is_healthy: false,
            last_checked: Some(at),
            error: Some(error.into()),
        }
    }
}
