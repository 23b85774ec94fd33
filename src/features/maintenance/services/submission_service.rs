use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;

use crate::core::error::{AppError, Result};
use crate::features::maintenance::models::{
    NewMaintenanceRequest, NewRequestAttachment, RequestId, RequestPriority, RequestStatus,
};
use crate::features::maintenance::store::{BranchDirectory, RequestStore};
use crate::features::maintenance::wizard::{
    parse_requested_date, AttachmentContext, RequestDraft, StagedAttachment,
};
use crate::modules::email::{RequestNotification, RequestNotifier};
use crate::modules::storage::BlobStore;

/// Which intake form produced the draft. Selects the attachment allow-list
/// and the prefix of the locally generated fallback identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionForm {
    Standard,
    Quick,
}

impl SubmissionForm {
    pub fn fallback_prefix(self) -> &'static str {
        match self {
            SubmissionForm::Standard => "MR",
            SubmissionForm::Quick => "QMR",
        }
    }

    pub fn attachment_context(self) -> AttachmentContext {
        match self {
            SubmissionForm::Standard => AttachmentContext::Wizard,
            SubmissionForm::Quick => AttachmentContext::QuickForm,
        }
    }
}

/// Per-attachment upload result. Failures degrade the single attachment and
/// are reported here instead of failing the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Stored { filename: String, file_url: String },
    Failed { filename: String, reason: String },
}

/// What a successful submission produced: the assigned request identifier
/// plus the per-attachment upload report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub request_id: RequestId,
    pub uploads: Vec<UploadOutcome>,
}

impl SubmissionReceipt {
    pub fn stored_count(&self) -> usize {
        self.uploads
            .iter()
            .filter(|u| matches!(u, UploadOutcome::Stored { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.uploads.len() - self.stored_count()
    }
}

/// Owns the only path from a draft to a submitted request.
///
/// Persists the request record, uploads the accepted attachments to durable
/// storage, links the attachment records and dispatches a best-effort
/// notification. Only the request insert is fatal; attachment uploads and
/// the notification degrade independently.
pub struct SubmissionService {
    store: Arc<dyn RequestStore>,
    branches: Arc<dyn BranchDirectory>,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<dyn RequestNotifier>,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn RequestStore>,
        branches: Arc<dyn BranchDirectory>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn RequestNotifier>,
    ) -> Self {
        Self {
            store,
            branches,
            blobs,
            notifier,
        }
    }

    pub async fn submit(
        &self,
        draft: &RequestDraft,
        form: SubmissionForm,
    ) -> Result<SubmissionReceipt> {
        // Fail fast before any side effect
        let (priority, scheduled_date, estimated_cost) = validate_draft(draft)?;

        // Branch resolution is best-effort: an unknown name or a lookup
        // failure still leaves the request submittable, just unlinked.
        let store_ref = match self.branches.resolve_name(&draft.branch).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Branch lookup failed for '{}': {}", draft.branch, e);
                None
            }
        };

        let created_at = Utc::now();
        let new_request = NewMaintenanceRequest {
            title: draft.title.clone(),
            description: draft.description.clone(),
            service_type: draft.service_type.clone(),
            priority,
            status: RequestStatus::Pending,
            scheduled_date,
            estimated_cost,
            store_ref,
            created_at,
        };

        // The request insert is the one fatal step; nothing downstream runs
        // if it fails.
        let request_id = self
            .store
            .insert_request(&new_request)
            .await?
            .unwrap_or_else(|| RequestId::fallback(form.fallback_prefix(), created_at));

        tracing::info!(
            "Maintenance request created: id={}, title={}, attachments={}",
            request_id,
            draft.title,
            draft.attachments.len()
        );

        let uploads = join_all(
            draft
                .attachments
                .iter()
                .map(|file| self.upload_attachment(&request_id, &draft.title, file)),
        )
        .await;

        let notification = build_notification(draft, &request_id, priority, scheduled_date);
        if let Err(e) = self.notifier.notify(&notification).await {
            tracing::warn!(
                "Failed to send submission notification for {}: {}",
                request_id,
                e
            );
        }

        Ok(SubmissionReceipt {
            request_id,
            uploads,
        })
    }

    /// Upload one staged file and link its record to the request. Never
    /// fails the submission: any error is folded into the outcome.
    async fn upload_attachment(
        &self,
        request_id: &RequestId,
        title: &str,
        file: &StagedAttachment,
    ) -> UploadOutcome {
        let key = format!("{}/{}", request_id, file.filename);

        let file_url = match self
            .blobs
            .upload(&key, file.bytes.clone(), &file.content_type)
            .await
        {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Failed to upload attachment '{}': {}", file.filename, e);
                return UploadOutcome::Failed {
                    filename: file.filename.clone(),
                    reason: e.to_string(),
                };
            }
        };

        let record = NewRequestAttachment {
            request_id: request_id.clone(),
            file_url: file_url.clone(),
            description: Some(format!("Attachment for request {}", title)),
            uploaded_at: Utc::now(),
        };

        if let Err(e) = self.store.insert_attachment(&record).await {
            tracing::warn!(
                "Failed to link attachment '{}' to request {}: {}",
                file.filename,
                request_id,
                e
            );
            return UploadOutcome::Failed {
                filename: file.filename.clone(),
                reason: e.to_string(),
            };
        }

        UploadOutcome::Stored {
            filename: file.filename.clone(),
            file_url,
        }
    }
}

/// Check the required fields and parse the typed ones. No side effects.
fn validate_draft(
    draft: &RequestDraft,
) -> Result<(RequestPriority, chrono::NaiveDate, Option<Decimal>)> {
    let mut missing = Vec::new();
    if draft.branch.is_empty() {
        missing.push("branch");
    }
    if draft.service_type.is_empty() {
        missing.push("service type");
    }
    if draft.title.is_empty() {
        missing.push("title");
    }
    if draft.description.is_empty() {
        missing.push("description");
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "required fields missing: {}",
            missing.join(", ")
        )));
    }

    let priority = RequestPriority::from_str(&draft.priority)
        .map_err(AppError::Validation)?;

    let scheduled_date = parse_requested_date(&draft.requested_date).ok_or_else(|| {
        AppError::Validation(format!(
            "'{}' is not a valid requested date",
            draft.requested_date
        ))
    })?;

    let estimated_cost = if draft.estimated_cost.is_empty() {
        None
    } else {
        let cost = Decimal::from_str(&draft.estimated_cost).map_err(|_| {
            AppError::Validation(format!(
                "'{}' is not a valid estimated cost",
                draft.estimated_cost
            ))
        })?;
        if cost.is_sign_negative() {
            return Err(AppError::Validation(
                "estimated cost must not be negative".to_string(),
            ));
        }
        Some(cost)
    };

    Ok((priority, scheduled_date, estimated_cost))
}

fn build_notification(
    draft: &RequestDraft,
    request_id: &RequestId,
    priority: RequestPriority,
    scheduled_date: chrono::NaiveDate,
) -> RequestNotification {
    RequestNotification {
        request_number: request_id.to_string(),
        branch: draft.branch.clone(),
        service_type: draft.service_type.clone(),
        title: draft.title.clone(),
        description: draft.description.clone(),
        priority: priority.label().to_string(),
        requested_date: scheduled_date.format("%Y-%m-%d").to_string(),
        estimated_cost: if draft.estimated_cost.is_empty() {
            "unspecified".to_string()
        } else {
            draft.estimated_cost.clone()
        },
        attachments_count: draft.attachments.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::maintenance::wizard::DraftField;
    use crate::shared::test_helpers::{
        InMemoryBlobStore, InMemoryBranchDirectory, InMemoryRequestStore, RecordingNotifier,
    };

    struct Harness {
        store: Arc<InMemoryRequestStore>,
        branches: Arc<InMemoryBranchDirectory>,
        blobs: Arc<InMemoryBlobStore>,
        notifier: Arc<RecordingNotifier>,
        service: SubmissionService,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryRequestStore::default());
        let branches = Arc::new(InMemoryBranchDirectory::with_branches(&[(
            "store-1", "Main",
        )]));
        let blobs = Arc::new(InMemoryBlobStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = SubmissionService::new(
            Arc::clone(&store) as Arc<dyn RequestStore>,
            Arc::clone(&branches) as Arc<dyn BranchDirectory>,
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
            Arc::clone(&notifier) as Arc<dyn RequestNotifier>,
        );
        Harness {
            store,
            branches,
            blobs,
            notifier,
            service,
        }
    }

    fn valid_draft() -> RequestDraft {
        let mut draft = RequestDraft::new();
        draft.update(DraftField::Branch, "Main");
        draft.update(DraftField::ServiceType, "General");
        draft.update(DraftField::Title, "Leak");
        draft.update(DraftField::Description, "Pipe leak in kitchen");
        draft.update(DraftField::Priority, "high");
        draft.update(DraftField::RequestedDate, "2030-01-02");
        draft
    }

    fn jpeg(name: &str) -> StagedAttachment {
        StagedAttachment::new(name, "image/jpeg", vec![0u8; 64])
    }

    #[tokio::test]
    async fn test_submit_creates_pending_request_with_attachment() {
        let h = harness();
        let mut draft = valid_draft();
        draft.set_attachments(vec![jpeg("leak.jpg")]);

        let receipt = h
            .service
            .submit(&draft, SubmissionForm::Standard)
            .await
            .unwrap();

        let request = h.store.get_request_sync(&receipt.request_id).unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.title, "Leak");
        assert_eq!(request.priority, RequestPriority::High);
        assert_eq!(request.store_ref.as_deref(), Some("store-1"));
        assert!(request.completion_date.is_none());

        assert_eq!(receipt.stored_count(), 1);
        assert_eq!(h.store.attachments_sync(&receipt.request_id).len(), 1);
        assert_eq!(h.store.request_count(), 1);
        assert_eq!(h.notifier.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_required_field_fails_without_side_effects() {
        let h = harness();
        let mut draft = valid_draft();
        draft.update(DraftField::Title, "");

        let err = h
            .service
            .submit(&draft, SubmissionForm::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("title")));
        assert_eq!(h.store.request_count(), 0);
        assert_eq!(h.notifier.sent_count(), 0);
        assert!(h.blobs.uploaded_keys().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_priority_is_a_validation_error() {
        let h = harness();
        let mut draft = valid_draft();
        draft.update(DraftField::Priority, "whenever");

        let err = h
            .service
            .submit(&draft, SubmissionForm::Standard)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(h.store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_negative_estimated_cost_rejected() {
        let h = harness();
        let mut draft = valid_draft();
        draft.update(DraftField::EstimatedCost, "-10");

        let err = h
            .service
            .submit(&draft, SubmissionForm::Standard)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("negative")));
    }

    #[tokio::test]
    async fn test_unknown_branch_does_not_block_submission() {
        let h = harness();
        let mut draft = valid_draft();
        draft.update(DraftField::Branch, "Nowhere");

        let receipt = h
            .service
            .submit(&draft, SubmissionForm::Standard)
            .await
            .unwrap();

        let request = h.store.get_request_sync(&receipt.request_id).unwrap();
        assert!(request.store_ref.is_none());
    }

    #[tokio::test]
    async fn test_branch_lookup_failure_is_non_fatal() {
        let h = harness();
        h.branches.fail_lookups();
        let draft = valid_draft();

        let receipt = h
            .service
            .submit(&draft, SubmissionForm::Standard)
            .await
            .unwrap();
        assert!(h
            .store
            .get_request_sync(&receipt.request_id)
            .unwrap()
            .store_ref
            .is_none());
    }

    #[tokio::test]
    async fn test_store_failure_aborts_before_uploads_and_notification() {
        let h = harness();
        h.store.fail_next_insert();
        let mut draft = valid_draft();
        draft.set_attachments(vec![jpeg("leak.jpg")]);

        let err = h
            .service
            .submit(&draft, SubmissionForm::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert!(h.blobs.uploaded_keys().is_empty());
        assert_eq!(h.notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_upload_failure_keeps_request_and_survivors() {
        let h = harness();
        h.blobs.fail_uploads_containing("broken.png");
        let mut draft = valid_draft();
        draft.set_attachments(vec![jpeg("ok.jpg"), jpeg("broken.png")]);

        let receipt = h
            .service
            .submit(&draft, SubmissionForm::Standard)
            .await
            .unwrap();

        assert_eq!(receipt.stored_count(), 1);
        assert_eq!(receipt.failed_count(), 1);
        assert!(receipt.uploads.iter().any(|u| matches!(
            u,
            UploadOutcome::Failed { filename, .. } if filename == "broken.png"
        )));

        // Request row exists and only the surviving attachment was linked
        assert!(h.store.get_request_sync(&receipt.request_id).is_some());
        assert_eq!(h.store.attachments_sync(&receipt.request_id).len(), 1);
        assert_eq!(h.notifier.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_submission() {
        let h = harness();
        h.notifier.fail_sends();
        let draft = valid_draft();

        let receipt = h.service.submit(&draft, SubmissionForm::Standard).await;
        assert!(receipt.is_ok());
    }

    #[tokio::test]
    async fn test_fallback_id_used_when_store_assigns_none() {
        let h = harness();
        h.store.stop_assigning_ids();
        let draft = valid_draft();

        let receipt = h
            .service
            .submit(&draft, SubmissionForm::Quick)
            .await
            .unwrap();

        assert!(receipt.request_id.as_str().starts_with("QMR-"));
    }

    #[tokio::test]
    async fn test_notification_carries_submission_summary() {
        let h = harness();
        let mut draft = valid_draft();
        draft.update(DraftField::EstimatedCost, "1500");
        draft.set_attachments(vec![jpeg("a.jpg"), jpeg("b.jpg")]);

        h.service
            .submit(&draft, SubmissionForm::Standard)
            .await
            .unwrap();

        let sent = h.notifier.last_notification().unwrap();
        assert_eq!(sent.branch, "Main");
        assert_eq!(sent.priority, "High");
        assert_eq!(sent.requested_date, "2030-01-02");
        assert_eq!(sent.estimated_cost, "1500");
        assert_eq!(sent.attachments_count, 2);
    }

    #[tokio::test]
    async fn test_missing_estimated_cost_reported_as_unspecified() {
        let h = harness();
        let draft = valid_draft();

        h.service
            .submit(&draft, SubmissionForm::Standard)
            .await
            .unwrap();

        let sent = h.notifier.last_notification().unwrap();
        assert_eq!(sent.estimated_cost, "unspecified");
    }
}
