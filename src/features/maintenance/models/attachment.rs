use chrono::{DateTime, Utc};

use crate::features::maintenance::models::RequestId;

/// A persisted attachment record linking an uploaded file to a request.
/// Ownership is exclusive to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAttachment {
    pub id: String,
    pub request_id: RequestId,
    pub file_url: String,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub is_deleted: bool,
}

/// Insert shape for a new attachment record
#[derive(Debug, Clone)]
pub struct NewRequestAttachment {
    pub request_id: RequestId,
    pub file_url: String,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}
