use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::core::config::EmailJsConfig;
use crate::core::error::{AppError, Result};
use crate::modules::email::{RequestNotification, RequestNotifier};

/// EmailJS-backed notifier. Sends one templated email per submitted request
/// through the EmailJS REST API.
pub struct EmailJsClient {
    http_client: Client,
    config: EmailJsConfig,
}

impl EmailJsClient {
    pub fn new(config: EmailJsConfig) -> Result<Self> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl RequestNotifier for EmailJsClient {
    async fn notify(&self, notification: &RequestNotification) -> Result<()> {
        let body = json!({
            "service_id": self.config.service_id,
            "template_id": self.config.template_id,
            "user_id": self.config.public_key,
            "template_params": {
                "request_number": notification.request_number,
                "branch": notification.branch,
                "service_type": notification.service_type,
                "title": notification.title,
                "description": notification.description,
                "priority": notification.priority,
                "requested_date": notification.requested_date,
                "estimated_cost": notification.estimated_cost,
                "attachments_count": notification.attachments_count,
            }
        });

        let response = self
            .http_client
            .post(&self.config.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("EmailJS request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalServiceError(format!(
                "EmailJS returned {}: {}",
                status, text
            )));
        }

        tracing::debug!(
            "Submission notification sent for request {}",
            notification.request_number
        );
        Ok(())
    }
}
