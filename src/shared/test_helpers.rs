//! In-memory fakes for the external ports, shared by the service and
//! wizard test modules. The record store mimics the real adapter closely
//! enough to exercise failure paths: single failure injections, id
//! assignment toggling and soft-deleted rows.

#[cfg(test)]
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use chrono::{DateTime, NaiveDate, Utc};

#[cfg(test)]
use crate::core::error::{AppError, Result};
#[cfg(test)]
use crate::features::maintenance::models::{
    MaintenanceRequest, NewMaintenanceRequest, NewRequestAttachment, NewStatusLogEntry,
    RequestAttachment, RequestId, RequestPriority, RequestStatus, StatusLogEntry,
};
#[cfg(test)]
use crate::features::maintenance::store::{Branch, BranchDirectory, RequestStore};
#[cfg(test)]
use crate::modules::email::{RequestNotification, RequestNotifier};
#[cfg(test)]
use crate::modules::storage::BlobStore;

#[cfg(test)]
fn storage_error() -> AppError {
    AppError::Database(sqlx::Error::PoolClosed)
}

#[cfg(test)]
#[derive(Default)]
struct StoreState {
    requests: Vec<MaintenanceRequest>,
    attachments: Vec<RequestAttachment>,
    status_log: Vec<StatusLogEntry>,
}

#[cfg(test)]
#[derive(Default)]
pub struct InMemoryRequestStore {
    state: Mutex<StoreState>,
    next_id: AtomicUsize,
    fail_next_insert: AtomicBool,
    fail_next_update: AtomicBool,
    withhold_ids: AtomicBool,
}

#[cfg(test)]
impl InMemoryRequestStore {
    pub fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }

    /// Make inserts stop reporting the assigned identifier, as a store
    /// without RETURNING support would.
    pub fn stop_assigning_ids(&self) {
        self.withhold_ids.store(true, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn get_request_sync(&self, id: &RequestId) -> Option<MaintenanceRequest> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .find(|r| &r.id == id)
            .cloned()
    }

    pub fn attachments_sync(&self, id: &RequestId) -> Vec<RequestAttachment> {
        self.state
            .lock()
            .unwrap()
            .attachments
            .iter()
            .filter(|a| &a.request_id == id && !a.is_deleted)
            .cloned()
            .collect()
    }

    pub fn status_log_sync(&self, id: &RequestId) -> Vec<StatusLogEntry> {
        self.state
            .lock()
            .unwrap()
            .status_log
            .iter()
            .filter(|e| &e.request_id == id)
            .cloned()
            .collect()
    }

    pub fn seed_pending_request(&self, title: &str) -> RequestId {
        let id = RequestId::new(self.generate_id("req"));
        let request = MaintenanceRequest {
            id: id.clone(),
            title: title.to_string(),
            description: "seeded request".to_string(),
            service_type: "General".to_string(),
            priority: RequestPriority::Medium,
            status: RequestStatus::Pending,
            scheduled_date: NaiveDate::from_ymd_opt(2030, 1, 2).unwrap(),
            estimated_cost: None,
            actual_cost: None,
            store_ref: None,
            created_at: Utc::now(),
            completion_date: None,
        };
        self.state.lock().unwrap().requests.push(request);
        id
    }

    pub fn set_store_ref(&self, id: &RequestId, store_ref: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(request) = state.requests.iter_mut().find(|r| &r.id == id) {
            request.store_ref = Some(store_ref.to_string());
        }
    }

    pub fn seed_attachment(&self, id: &RequestId, file_url: &str, is_deleted: bool) {
        let attachment = RequestAttachment {
            id: self.generate_id("att"),
            request_id: id.clone(),
            file_url: file_url.to_string(),
            description: None,
            uploaded_at: Utc::now(),
            is_deleted,
        };
        self.state.lock().unwrap().attachments.push(attachment);
    }

    fn generate_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", prefix, n)
    }
}

#[cfg(test)]
#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn insert_request(&self, new: &NewMaintenanceRequest) -> Result<Option<RequestId>> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(storage_error());
        }

        let id = RequestId::new(self.generate_id("req"));
        let request = MaintenanceRequest {
            id: id.clone(),
            title: new.title.clone(),
            description: new.description.clone(),
            service_type: new.service_type.clone(),
            priority: new.priority,
            status: new.status,
            scheduled_date: new.scheduled_date,
            estimated_cost: new.estimated_cost,
            actual_cost: None,
            store_ref: new.store_ref.clone(),
            created_at: new.created_at,
            completion_date: None,
        };
        self.state.lock().unwrap().requests.push(request);

        if self.withhold_ids.load(Ordering::SeqCst) {
            Ok(None)
        } else {
            Ok(Some(id))
        }
    }

    async fn get_request(&self, id: &RequestId) -> Result<Option<MaintenanceRequest>> {
        Ok(self.get_request_sync(id))
    }

    async fn list_requests(&self) -> Result<Vec<MaintenanceRequest>> {
        let mut requests = self.state.lock().unwrap().requests.clone();
        requests.reverse();
        Ok(requests)
    }

    async fn update_status(&self, id: &RequestId, status: RequestStatus) -> Result<bool> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(storage_error());
        }

        let mut state = self.state.lock().unwrap();
        match state.requests.iter_mut().find(|r| &r.id == id) {
            Some(request) => {
                request.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_completion_date(
        &self,
        id: &RequestId,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(request) = state.requests.iter_mut().find(|r| &r.id == id) {
            request.completion_date = Some(completed_at);
        }
        Ok(())
    }

    async fn insert_attachment(&self, new: &NewRequestAttachment) -> Result<()> {
        let attachment = RequestAttachment {
            id: self.generate_id("att"),
            request_id: new.request_id.clone(),
            file_url: new.file_url.clone(),
            description: new.description.clone(),
            uploaded_at: new.uploaded_at,
            is_deleted: false,
        };
        self.state.lock().unwrap().attachments.push(attachment);
        Ok(())
    }

    async fn list_attachments(&self, request_id: &RequestId) -> Result<Vec<RequestAttachment>> {
        Ok(self.attachments_sync(request_id))
    }

    async fn insert_status_log(&self, entry: &NewStatusLogEntry) -> Result<StatusLogEntry> {
        let entry = StatusLogEntry {
            id: self.generate_id("log"),
            request_id: entry.request_id.clone(),
            status: entry.status,
            note: entry.note.clone(),
            changed_at: entry.changed_at,
        };
        self.state.lock().unwrap().status_log.push(entry.clone());
        Ok(entry)
    }

    async fn list_status_log(&self, request_id: &RequestId) -> Result<Vec<StatusLogEntry>> {
        Ok(self.status_log_sync(request_id))
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct InMemoryBranchDirectory {
    branches: Vec<Branch>,
    fail: AtomicBool,
}

#[cfg(test)]
impl InMemoryBranchDirectory {
    pub fn with_branches(entries: &[(&str, &str)]) -> Self {
        Self {
            branches: entries
                .iter()
                .map(|(id, name)| Branch {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail_lookups(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("branch directory unavailable".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl BranchDirectory for InMemoryBranchDirectory {
    async fn resolve_name(&self, name: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self
            .branches
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.id.clone()))
    }

    async fn display_name(&self, store_ref: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self
            .branches
            .iter()
            .find(|b| b.id == store_ref)
            .map(|b| b.name.clone()))
    }

    async fn list_branches(&self) -> Result<Vec<Branch>> {
        self.check()?;
        Ok(self.branches.clone())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct InMemoryBlobStore {
    uploads: Mutex<Vec<String>>,
    fail_substrings: Mutex<Vec<String>>,
}

#[cfg(test)]
impl InMemoryBlobStore {
    /// Make uploads whose key contains the fragment fail
    pub fn fail_uploads_containing(&self, fragment: &str) {
        self.fail_substrings
            .lock()
            .unwrap()
            .push(fragment.to_string());
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, key: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        let blocked = self
            .fail_substrings
            .lock()
            .unwrap()
            .iter()
            .any(|fragment| key.contains(fragment.as_str()));
        if blocked {
            return Err(AppError::Internal(format!(
                "simulated upload failure for '{}'",
                key
            )));
        }

        self.uploads.lock().unwrap().push(key.to_string());
        Ok(self.public_url(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://blobs.test/{}", key)
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<RequestNotification>>,
    fail: AtomicBool,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn fail_sends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_notification(&self) -> Option<RequestNotification> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[cfg(test)]
#[async_trait]
impl RequestNotifier for RecordingNotifier {
    async fn notify(&self, notification: &RequestNotification) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::ExternalServiceError(
                "simulated notification failure".into(),
            ));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
