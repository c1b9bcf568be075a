//! Health status snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of one health probe.
///
/// Always freshly derived: every probe and every aggregation builds a new
/// value stamped with the time it was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Whether traffic should keep being routed to this instance
    pub healthy: bool,
    /// Reason for an unhealthy result, or extra context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// When the status was computed
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    /// Creates a healthy status
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            detail: None,
            checked_at: Utc::now(),
        }
    }

    /// Creates an unhealthy status with a reason
    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: false,
            detail: Some(detail.into()),
            checked_at: Utc::now(),
        }
    }

    /// Attaches a detail message
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// HTTP status code the health endpoint answers with
    pub fn http_status_code(&self) -> u16 {
        if self.healthy { 200 } else { 503 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let up = HealthStatus::healthy();
        assert!(up.healthy);
        assert!(up.detail.is_none());
        assert_eq!(up.http_status_code(), 200);

        let down = HealthStatus::unhealthy("database unreachable");
        assert!(!down.healthy);
        assert_eq!(down.detail.as_deref(), Some("database unreachable"));
        assert_eq!(down.http_status_code(), 503);
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let json = serde_json::to_value(HealthStatus::unhealthy("timeout")).unwrap();
        assert_eq!(json["healthy"], false);
        assert_eq!(json["detail"], "timeout");
        assert!(json.get("checkedAt").is_some());

        let json = serde_json::to_value(HealthStatus::healthy()).unwrap();
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn test_deserialize_without_detail() {
        let status: HealthStatus =
            serde_json::from_str(r#"{"healthy":true,"checkedAt":"2024-01-01T00:00:00Z"}"#)
                .unwrap();
        assert!(status.healthy);
        assert!(status.detail.is_none());
    }
}
