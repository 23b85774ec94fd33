use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::maintenance::models::{
    MaintenanceRequest, RequestAttachment, RequestId, RequestPriority, RequestStatus,
    StatusLogEntry,
};
use crate::features::maintenance::services::{SubmissionReceipt, TrackedRequest, UploadOutcome};
use crate::features::maintenance::store::Branch;

/// Response DTO for a submitted maintenance request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceRequestResponseDto {
    pub id: RequestId,
    pub title: String,
    pub description: String,
    pub service_type: String,
    pub priority: RequestPriority,
    pub status: RequestStatus,
    pub scheduled_date: NaiveDate,
    #[schema(value_type = Option<f64>)]
    pub estimated_cost: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub actual_cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub completion_date: Option<DateTime<Utc>>,
}

impl From<MaintenanceRequest> for MaintenanceRequestResponseDto {
    fn from(r: MaintenanceRequest) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            service_type: r.service_type,
            priority: r.priority,
            status: r.status,
            scheduled_date: r.scheduled_date,
            estimated_cost: r.estimated_cost,
            actual_cost: r.actual_cost,
            created_at: r.created_at,
            completion_date: r.completion_date,
        }
    }
}

/// Response DTO for an attachment on a request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentResponseDto {
    pub id: String,
    pub file_url: String,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<RequestAttachment> for AttachmentResponseDto {
    fn from(a: RequestAttachment) -> Self {
        Self {
            id: a.id,
            file_url: a.file_url,
            description: a.description,
            uploaded_at: a.uploaded_at,
        }
    }
}

/// Response DTO for one audit-trail entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusLogEntryResponseDto {
    pub id: String,
    pub status: RequestStatus,
    pub note: String,
    pub changed_at: DateTime<Utc>,
}

impl From<StatusLogEntry> for StatusLogEntryResponseDto {
    fn from(e: StatusLogEntry) -> Self {
        Self {
            id: e.id,
            status: e.status,
            note: e.note,
            changed_at: e.changed_at,
        }
    }
}

/// Response DTO for the tracking view: the request plus its branch name,
/// attachments and full audit trail
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequestDetailResponseDto {
    #[serde(flatten)]
    pub request: MaintenanceRequestResponseDto,
    pub branch: String,
    pub attachments: Vec<AttachmentResponseDto>,
    pub status_log: Vec<StatusLogEntryResponseDto>,
}

impl From<TrackedRequest> for RequestDetailResponseDto {
    fn from(t: TrackedRequest) -> Self {
        Self {
            request: t.request.into(),
            branch: t.branch,
            attachments: t.attachments.into_iter().map(Into::into).collect(),
            status_log: t.status_log.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-file upload report in the submission response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadOutcomeDto {
    pub filename: String,
    pub file_url: Option<String>,
    pub error: Option<String>,
}

impl From<UploadOutcome> for UploadOutcomeDto {
    fn from(outcome: UploadOutcome) -> Self {
        match outcome {
            UploadOutcome::Stored { filename, file_url } => Self {
                filename,
                file_url: Some(file_url),
                error: None,
            },
            UploadOutcome::Failed { filename, reason } => Self {
                filename,
                file_url: None,
                error: Some(reason),
            },
        }
    }
}

/// Response DTO for a successful submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponseDto {
    pub request_id: RequestId,
    pub attachments_uploaded: usize,
    pub attachments_failed: usize,
    pub uploads: Vec<UploadOutcomeDto>,
}

impl From<SubmissionReceipt> for SubmissionResponseDto {
    fn from(receipt: SubmissionReceipt) -> Self {
        Self {
            request_id: receipt.request_id.clone(),
            attachments_uploaded: receipt.stored_count(),
            attachments_failed: receipt.failed_count(),
            uploads: receipt.uploads.into_iter().map(Into::into).collect(),
        }
    }
}

/// Multipart form shape for both submission endpoints (documentation only;
/// the handlers read the fields straight off the multipart stream)
#[derive(Debug, Deserialize, ToSchema)]
#[allow(dead_code)]
pub struct SubmitRequestFormDto {
    pub branch: String,
    pub service_type: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub requested_date: String,
    pub estimated_cost: Option<String>,
    /// Up to five files under the repeated `attachments` field
    #[schema(value_type = Option<String>, format = Binary)]
    pub attachments: Option<String>,
}

/// Request DTO for a status transition
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRequestStatusDto {
    pub status: RequestStatus,
    #[validate(length(max = 500, message = "Note must not exceed 500 characters"))]
    pub note: Option<String>,
}

/// Response DTO for a servicing branch
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BranchResponseDto {
    pub id: String,
    pub name: String,
}

impl From<Branch> for BranchResponseDto {
    fn from(b: Branch) -> Self {
        Self {
            id: b.id,
            name: b.name,
        }
    }
}
