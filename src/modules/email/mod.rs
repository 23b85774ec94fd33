//! Outbound notification channel for submitted requests

mod emailjs;

use async_trait::async_trait;

use crate::core::error::Result;

pub use emailjs::EmailJsClient;

/// Summary of a submitted request as handed to the notification template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestNotification {
    pub request_number: String,
    pub branch: String,
    pub service_type: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub requested_date: String,
    pub estimated_cost: String,
    pub attachments_count: usize,
}

/// Fire-and-forget notification port. Callers treat failures as
/// best-effort: they log and move on, never failing the submission.
#[async_trait]
pub trait RequestNotifier: Send + Sync {
    async fn notify(&self, notification: &RequestNotification) -> Result<()>;
}
