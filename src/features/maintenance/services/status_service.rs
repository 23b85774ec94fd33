use std::sync::Arc;

use chrono::Utc;

use crate::core::error::{AppError, Result};
use crate::features::maintenance::models::{
    NewStatusLogEntry, RequestId, RequestStatus, StatusLogEntry,
};
use crate::features::maintenance::store::RequestStore;

/// Governs how a submitted request moves between statuses.
///
/// Every accepted transition persists the new status, derives the completion
/// timestamp where applicable and appends one immutable audit-trail entry.
/// Any status may be requested from any other, including moving a completed
/// request back to pending; nothing restricts reachability.
pub struct StatusService {
    store: Arc<dyn RequestStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self { store }
    }

    pub async fn change_status(
        &self,
        id: &RequestId,
        new_status: RequestStatus,
        note: Option<String>,
    ) -> Result<StatusLogEntry> {
        let updated = self.store.update_status(id, new_status).await?;
        if !updated {
            return Err(AppError::NotFound(format!(
                "Maintenance request '{}' not found",
                id
            )));
        }

        let now = Utc::now();

        // Completion is the only status with a derived side-effect field
        if new_status == RequestStatus::Completed {
            self.store.set_completion_date(id, now).await?;
        }

        let note =
            note.unwrap_or_else(|| format!("Status changed to {}", new_status.label()));
        let entry = self
            .store
            .insert_status_log(&NewStatusLogEntry {
                request_id: id.clone(),
                status: new_status,
                note,
                changed_at: now,
            })
            .await?;

        tracing::info!("Request {} status changed to {}", id, new_status);

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::InMemoryRequestStore;

    async fn seeded() -> (Arc<InMemoryRequestStore>, StatusService, RequestId) {
        let store = Arc::new(InMemoryRequestStore::default());
        let id = store.seed_pending_request("Leak");
        let service = StatusService::new(Arc::clone(&store) as Arc<dyn RequestStore>);
        (store, service, id)
    }

    #[tokio::test]
    async fn test_completed_sets_completion_date_and_appends_log() {
        let (store, service, id) = seeded().await;

        let entry = service
            .change_status(&id, RequestStatus::Completed, None)
            .await
            .unwrap();

        let request = store.get_request_sync(&id).unwrap();
        assert_eq!(request.status, RequestStatus::Completed);
        assert!(request.completion_date.is_some());

        assert_eq!(entry.status, RequestStatus::Completed);
        assert_eq!(entry.note, "Status changed to Completed");

        let log = store.status_log_sync(&id);
        assert_eq!(log.len(), 1);
        assert_eq!(log.last().unwrap().status, RequestStatus::Completed);
    }

    #[tokio::test]
    async fn test_non_completed_transition_leaves_completion_date_unset() {
        let (store, service, id) = seeded().await;

        service
            .change_status(&id, RequestStatus::InProgress, None)
            .await
            .unwrap();

        let request = store.get_request_sync(&id).unwrap();
        assert_eq!(request.status, RequestStatus::InProgress);
        assert!(request.completion_date.is_none());
    }

    #[tokio::test]
    async fn test_reverse_transition_from_completed_is_accepted() {
        // No transition table restricts reachability; a completed request
        // can be reopened.
        let (store, service, id) = seeded().await;

        service
            .change_status(&id, RequestStatus::Completed, None)
            .await
            .unwrap();
        service
            .change_status(&id, RequestStatus::Pending, None)
            .await
            .unwrap();

        let request = store.get_request_sync(&id).unwrap();
        assert_eq!(request.status, RequestStatus::Pending);

        let log = store.status_log_sync(&id);
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].status, RequestStatus::Completed);
        assert_eq!(log[1].status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_custom_note_is_kept() {
        let (store, service, id) = seeded().await;

        service
            .change_status(
                &id,
                RequestStatus::Cancelled,
                Some("Customer withdrew the request".to_string()),
            )
            .await
            .unwrap();

        let log = store.status_log_sync(&id);
        assert_eq!(log[0].note, "Customer withdrew the request");
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let (store, service, _) = seeded().await;

        let err = service
            .change_status(&RequestId::from("missing"), RequestStatus::Completed, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.status_log_sync(&RequestId::from("missing")).is_empty());
    }

    #[tokio::test]
    async fn test_update_failure_skips_derived_steps() {
        let (store, service, id) = seeded().await;
        store.fail_next_update();

        let err = service
            .change_status(&id, RequestStatus::Completed, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        let request = store.get_request_sync(&id).unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.completion_date.is_none());
        assert!(store.status_log_sync(&id).is_empty());
    }
}
