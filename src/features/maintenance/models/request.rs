use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maintenance request identifier.
///
/// The record store assigns the authoritative value on insert; a locally
/// generated token (e.g. "MR-483920") is used only when the store does not
/// report an assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fallback token derived from the submission timestamp: the given
    /// prefix plus the last six digits of the unix-millisecond clock.
    pub fn fallback(prefix: &str, at: DateTime<Utc>) -> Self {
        let millis = at.timestamp_millis().unsigned_abs();
        Self(format!("{}-{:06}", prefix, millis % 1_000_000))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Request status as stored and served (kebab-case)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    /// Human-readable label used in notifications and default audit notes
    pub fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::InProgress => "In Progress",
            RequestStatus::Completed => "Completed",
            RequestStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::InProgress => write!(f, "in-progress"),
            RequestStatus::Completed => write!(f, "completed"),
            RequestStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            // Legacy rows carry a space instead of a hyphen
            "in-progress" | "in progress" => Ok(RequestStatus::InProgress),
            "completed" => Ok(RequestStatus::Completed),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(format!("unknown request status '{}'", other)),
        }
    }
}

/// Request priority as stored and served (lowercase)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl RequestPriority {
    pub fn label(self) -> &'static str {
        match self {
            RequestPriority::Low => "Low",
            RequestPriority::Medium => "Medium",
            RequestPriority::High => "High",
            RequestPriority::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for RequestPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestPriority::Low => write!(f, "low"),
            RequestPriority::Medium => write!(f, "medium"),
            RequestPriority::High => write!(f, "high"),
            RequestPriority::Urgent => write!(f, "urgent"),
        }
    }
}

impl FromStr for RequestPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(RequestPriority::Low),
            "medium" => Ok(RequestPriority::Medium),
            "high" => Ok(RequestPriority::High),
            "urgent" => Ok(RequestPriority::Urgent),
            other => Err(format!("unknown request priority '{}'", other)),
        }
    }
}

/// A submitted maintenance request.
///
/// Created exactly once at submission with status `pending`; mutated only by
/// status transitions afterwards. Never deleted by this subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceRequest {
    pub id: RequestId,
    pub title: String,
    pub description: String,
    pub service_type: String,
    pub priority: RequestPriority,
    pub status: RequestStatus,
    pub scheduled_date: NaiveDate,
    pub estimated_cost: Option<Decimal>,
    pub actual_cost: Option<Decimal>,
    pub store_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
}

/// Insert shape for a new maintenance request
#[derive(Debug, Clone)]
pub struct NewMaintenanceRequest {
    pub title: String,
    pub description: String,
    pub service_type: String,
    pub priority: RequestPriority,
    pub status: RequestStatus,
    pub scheduled_date: NaiveDate,
    pub estimated_cost: Option<Decimal>,
    pub store_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::InProgress,
            RequestStatus::Completed,
            RequestStatus::Cancelled,
        ] {
            let parsed: RequestStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_accepts_legacy_spelling() {
        assert_eq!(
            "in progress".parse::<RequestStatus>().unwrap(),
            RequestStatus::InProgress
        );
        assert_eq!(
            "Pending".parse::<RequestStatus>().unwrap(),
            RequestStatus::Pending
        );
    }

    #[test]
    fn test_status_rejects_unknown() {
        assert!("archived".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_fallback_id_uses_last_six_digits() {
        let at = DateTime::from_timestamp_millis(1_736_000_483_920).unwrap();
        let id = RequestId::fallback("MR", at);
        assert_eq!(id.as_str(), "MR-483920");

        let quick = RequestId::fallback("QMR", at);
        assert_eq!(quick.as_str(), "QMR-483920");
    }
}
