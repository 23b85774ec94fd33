use chrono::{DateTime, Utc};

use crate::features::maintenance::models::{RequestId, RequestStatus};

/// One entry of a request's audit trail.
///
/// Append-only: written on every accepted status transition, never mutated
/// or removed. Ordered by `changed_at`, the entries reconstruct the full
/// transition history and the last entry matches the request's current
/// status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLogEntry {
    pub id: String,
    pub request_id: RequestId,
    pub status: RequestStatus,
    pub note: String,
    pub changed_at: DateTime<Utc>,
}

/// Insert shape for a new audit-trail entry
#[derive(Debug, Clone)]
pub struct NewStatusLogEntry {
    pub request_id: RequestId,
    pub status: RequestStatus,
    pub note: String,
    pub changed_at: DateTime<Utc>,
}
