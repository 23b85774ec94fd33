mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::error::Result;
use crate::features::maintenance::models::{
    MaintenanceRequest, NewMaintenanceRequest, NewRequestAttachment, NewStatusLogEntry,
    RequestAttachment, RequestId, RequestStatus, StatusLogEntry,
};

pub use postgres::{PgBranchDirectory, PgRequestStore};

/// Durable record store for requests, their attachments and their audit
/// trail. Injected into the services; the store decides its own identifier
/// scheme and reports the assigned id on insert when it has one.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Persist a new request. Returns the store-assigned identifier, or
    /// `None` when the store does not report one (callers then fall back to
    /// a locally generated token).
    async fn insert_request(&self, new: &NewMaintenanceRequest) -> Result<Option<RequestId>>;

    async fn get_request(&self, id: &RequestId) -> Result<Option<MaintenanceRequest>>;

    /// All submitted requests, most recent first
    async fn list_requests(&self) -> Result<Vec<MaintenanceRequest>>;

    /// Set the status on a request. Returns false when no such request
    /// exists.
    async fn update_status(&self, id: &RequestId, status: RequestStatus) -> Result<bool>;

    async fn set_completion_date(
        &self,
        id: &RequestId,
        completed_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn insert_attachment(&self, new: &NewRequestAttachment) -> Result<()>;

    /// Non-deleted attachments for a request, oldest first
    async fn list_attachments(&self, request_id: &RequestId) -> Result<Vec<RequestAttachment>>;

    async fn insert_status_log(&self, entry: &NewStatusLogEntry) -> Result<StatusLogEntry>;

    /// Full audit trail for a request, ordered by change time
    async fn list_status_log(&self, request_id: &RequestId) -> Result<Vec<StatusLogEntry>>;
}

/// A servicing branch, as kept in the reference data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub id: String,
    pub name: String,
}

/// Reference data source resolving branch display names to stable
/// identifiers and back. A miss is a normal outcome, never an error.
#[async_trait]
pub trait BranchDirectory: Send + Sync {
    /// Resolve a branch display name to its stable identifier
    async fn resolve_name(&self, name: &str) -> Result<Option<String>>;

    /// Resolve a stable identifier back to the branch display name
    async fn display_name(&self, store_ref: &str) -> Result<Option<String>>;

    /// All known branches, for form selects
    async fn list_branches(&self) -> Result<Vec<Branch>>;
}
