use std::sync::Arc;

use crate::core::error::Result;
use crate::features::maintenance::models::{
    MaintenanceRequest, RequestAttachment, RequestId, StatusLogEntry,
};
use crate::features::maintenance::store::{BranchDirectory, RequestStore};

/// Branch name served when the request has no resolvable branch reference
pub const UNSPECIFIED_BRANCH: &str = "unspecified";

/// A submitted request with everything the tracking page shows
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedRequest {
    pub request: MaintenanceRequest,
    pub branch: String,
    pub attachments: Vec<RequestAttachment>,
    pub status_log: Vec<StatusLogEntry>,
}

/// Read-only lookup of submitted requests. No side effects; a miss is a
/// normal outcome, not an error.
pub struct TrackingService {
    store: Arc<dyn RequestStore>,
    branches: Arc<dyn BranchDirectory>,
}

impl TrackingService {
    pub fn new(store: Arc<dyn RequestStore>, branches: Arc<dyn BranchDirectory>) -> Self {
        Self { store, branches }
    }

    pub async fn lookup(&self, id: &RequestId) -> Result<Option<TrackedRequest>> {
        let Some(request) = self.store.get_request(id).await? else {
            return Ok(None);
        };

        let branch = match &request.store_ref {
            Some(store_ref) => match self.branches.display_name(store_ref).await {
                Ok(Some(name)) => name,
                Ok(None) => UNSPECIFIED_BRANCH.to_string(),
                Err(e) => {
                    tracing::warn!("Branch lookup failed for '{}': {}", store_ref, e);
                    UNSPECIFIED_BRANCH.to_string()
                }
            },
            None => UNSPECIFIED_BRANCH.to_string(),
        };

        let attachments = self.store.list_attachments(id).await?;
        let status_log = self.store.list_status_log(id).await?;

        Ok(Some(TrackedRequest {
            request,
            branch,
            attachments,
            status_log,
        }))
    }

    pub async fn list(&self) -> Result<Vec<MaintenanceRequest>> {
        self.store.list_requests().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::maintenance::models::RequestStatus;
    use crate::features::maintenance::services::{SubmissionForm, SubmissionService};
    use crate::features::maintenance::wizard::{DraftField, RequestDraft, StagedAttachment};
    use crate::modules::email::RequestNotifier;
    use crate::modules::storage::BlobStore;
    use crate::shared::test_helpers::{
        InMemoryBlobStore, InMemoryBranchDirectory, InMemoryRequestStore, RecordingNotifier,
    };

    fn service(
        store: Arc<InMemoryRequestStore>,
        branches: Arc<InMemoryBranchDirectory>,
    ) -> TrackingService {
        TrackingService::new(
            store as Arc<dyn RequestStore>,
            branches as Arc<dyn BranchDirectory>,
        )
    }

    #[tokio::test]
    async fn test_miss_is_none_not_an_error() {
        let store = Arc::new(InMemoryRequestStore::default());
        let branches = Arc::new(InMemoryBranchDirectory::default());
        let tracking = service(store, branches);

        let found = tracking.lookup(&RequestId::from("nope")).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_lookup_is_idempotent() {
        let store = Arc::new(InMemoryRequestStore::default());
        let id = store.seed_pending_request("Leak");
        let branches = Arc::new(InMemoryBranchDirectory::default());
        let tracking = service(Arc::clone(&store), branches);

        let first = tracking.lookup(&id).await.unwrap();
        let second = tracking.lookup(&id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_branch_name_resolved_for_display() {
        let store = Arc::new(InMemoryRequestStore::default());
        let id = store.seed_pending_request("Leak");
        store.set_store_ref(&id, "store-1");
        let branches = Arc::new(InMemoryBranchDirectory::with_branches(&[(
            "store-1", "Main",
        )]));
        let tracking = service(Arc::clone(&store), branches);

        let found = tracking.lookup(&id).await.unwrap().unwrap();
        assert_eq!(found.branch, "Main");
    }

    #[tokio::test]
    async fn test_unresolvable_branch_defaults_to_unspecified() {
        let store = Arc::new(InMemoryRequestStore::default());
        let id = store.seed_pending_request("Leak");
        let branches = Arc::new(InMemoryBranchDirectory::default());
        let tracking = service(Arc::clone(&store), branches);

        let found = tracking.lookup(&id).await.unwrap().unwrap();
        assert_eq!(found.branch, UNSPECIFIED_BRANCH);
    }

    #[tokio::test]
    async fn test_submitted_request_is_trackable() {
        let store = Arc::new(InMemoryRequestStore::default());
        let branches = Arc::new(InMemoryBranchDirectory::with_branches(&[(
            "store-1", "Main",
        )]));
        let submission = SubmissionService::new(
            Arc::clone(&store) as Arc<dyn RequestStore>,
            Arc::clone(&branches) as Arc<dyn BranchDirectory>,
            Arc::new(InMemoryBlobStore::default()) as Arc<dyn BlobStore>,
            Arc::new(RecordingNotifier::default()) as Arc<dyn RequestNotifier>,
        );

        let mut draft = RequestDraft::new();
        draft.update(DraftField::Branch, "Main");
        draft.update(DraftField::ServiceType, "General");
        draft.update(DraftField::Title, "Leak");
        draft.update(DraftField::Description, "Pipe leak in kitchen");
        draft.update(DraftField::Priority, "high");
        draft.update(DraftField::RequestedDate, "2030-01-02");
        draft.set_attachments(vec![StagedAttachment::new(
            "leak.jpg",
            "image/jpeg",
            vec![0u8; 32],
        )]);

        let receipt = submission
            .submit(&draft, SubmissionForm::Standard)
            .await
            .unwrap();

        let tracking = service(Arc::clone(&store), branches);
        let found = tracking.lookup(&receipt.request_id).await.unwrap().unwrap();

        assert_eq!(found.request.status, RequestStatus::Pending);
        assert_eq!(found.branch, "Main");
        assert_eq!(found.attachments.len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_attachments_are_excluded() {
        let store = Arc::new(InMemoryRequestStore::default());
        let id = store.seed_pending_request("Leak");
        store.seed_attachment(&id, "https://files/a.jpg", false);
        store.seed_attachment(&id, "https://files/b.jpg", true);
        let branches = Arc::new(InMemoryBranchDirectory::default());
        let tracking = service(Arc::clone(&store), branches);

        let found = tracking.lookup(&id).await.unwrap().unwrap();
        assert_eq!(found.attachments.len(), 1);
        assert_eq!(found.attachments[0].file_url, "https://files/a.jpg");
    }
}
