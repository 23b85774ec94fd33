use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::core::error::{AppError, Result};
use crate::features::maintenance::models::{
    MaintenanceRequest, NewMaintenanceRequest, NewRequestAttachment, NewStatusLogEntry,
    RequestAttachment, RequestId, RequestStatus, StatusLogEntry,
};
use crate::features::maintenance::store::{Branch, BranchDirectory, RequestStore};

/// Raw row shape as the database serves it; status and priority come back
/// as text and are parsed into domain enums immediately on read.
#[derive(Debug, FromRow)]
struct RequestRow {
    id: String,
    title: String,
    description: String,
    service_type: String,
    priority: String,
    status: String,
    scheduled_date: NaiveDate,
    estimated_cost: Option<Decimal>,
    actual_cost: Option<Decimal>,
    store_ref: Option<String>,
    created_at: DateTime<Utc>,
    completion_date: Option<DateTime<Utc>>,
}

impl TryFrom<RequestRow> for MaintenanceRequest {
    type Error = AppError;

    fn try_from(row: RequestRow) -> Result<Self> {
        let status: RequestStatus = row
            .status
            .parse()
            .map_err(|e| AppError::Internal(format!("request {}: {}", row.id, e)))?;
        let priority = row
            .priority
            .parse()
            .map_err(|e| AppError::Internal(format!("request {}: {}", row.id, e)))?;

        Ok(MaintenanceRequest {
            id: RequestId::new(row.id),
            title: row.title,
            description: row.description,
            service_type: row.service_type,
            priority,
            status,
            scheduled_date: row.scheduled_date,
            estimated_cost: row.estimated_cost,
            actual_cost: row.actual_cost,
            store_ref: row.store_ref,
            created_at: row.created_at,
            completion_date: row.completion_date,
        })
    }
}

#[derive(Debug, FromRow)]
struct AttachmentRow {
    id: String,
    request_id: String,
    file_url: String,
    description: Option<String>,
    uploaded_at: DateTime<Utc>,
    is_deleted: bool,
}

impl From<AttachmentRow> for RequestAttachment {
    fn from(row: AttachmentRow) -> Self {
        Self {
            id: row.id,
            request_id: RequestId::new(row.request_id),
            file_url: row.file_url,
            description: row.description,
            uploaded_at: row.uploaded_at,
            is_deleted: row.is_deleted,
        }
    }
}

#[derive(Debug, FromRow)]
struct StatusLogRow {
    id: String,
    request_id: String,
    status: String,
    note: String,
    changed_at: DateTime<Utc>,
}

impl TryFrom<StatusLogRow> for StatusLogEntry {
    type Error = AppError;

    fn try_from(row: StatusLogRow) -> Result<Self> {
        let status = row
            .status
            .parse()
            .map_err(|e| AppError::Internal(format!("status log {}: {}", row.id, e)))?;

        Ok(StatusLogEntry {
            id: row.id,
            request_id: RequestId::new(row.request_id),
            status,
            note: row.note,
            changed_at: row.changed_at,
        })
    }
}

/// Postgres-backed record store
pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const REQUEST_COLUMNS: &str = "id, title, description, service_type, priority, status, \
     scheduled_date, estimated_cost, actual_cost, store_ref, created_at, completion_date";

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn insert_request(&self, new: &NewMaintenanceRequest) -> Result<Option<RequestId>> {
        let id: String = sqlx::query_scalar(
            r#"
            INSERT INTO maintenance_requests
                (title, description, service_type, priority, status,
                 scheduled_date, estimated_cost, store_ref, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.service_type)
        .bind(new.priority.to_string())
        .bind(new.status.to_string())
        .bind(new.scheduled_date)
        .bind(new.estimated_cost)
        .bind(&new.store_ref)
        .bind(new.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert maintenance request: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(Some(RequestId::new(id)))
    }

    async fn get_request(&self, id: &RequestId) -> Result<Option<MaintenanceRequest>> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {} FROM maintenance_requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get maintenance request: {:?}", e);
            AppError::Database(e)
        })?;

        row.map(MaintenanceRequest::try_from).transpose()
    }

    async fn list_requests(&self) -> Result<Vec<MaintenanceRequest>> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {} FROM maintenance_requests ORDER BY created_at DESC",
            REQUEST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list maintenance requests: {:?}", e);
            AppError::Database(e)
        })?;

        rows.into_iter().map(MaintenanceRequest::try_from).collect()
    }

    async fn update_status(&self, id: &RequestId, status: RequestStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE maintenance_requests SET status = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(status.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update request status: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_completion_date(
        &self,
        id: &RequestId,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE maintenance_requests SET completion_date = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(completed_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to set completion date: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(())
    }

    async fn insert_attachment(&self, new: &NewRequestAttachment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO attachments (request_id, file_url, description, uploaded_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(new.request_id.as_str())
        .bind(&new.file_url)
        .bind(&new.description)
        .bind(new.uploaded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert attachment: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(())
    }

    async fn list_attachments(&self, request_id: &RequestId) -> Result<Vec<RequestAttachment>> {
        let rows = sqlx::query_as::<_, AttachmentRow>(
            r#"
            SELECT id, request_id, file_url, description, uploaded_at, is_deleted
            FROM attachments
            WHERE request_id = $1 AND is_deleted = FALSE
            ORDER BY uploaded_at ASC
            "#,
        )
        .bind(request_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list attachments: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(rows.into_iter().map(RequestAttachment::from).collect())
    }

    async fn insert_status_log(&self, entry: &NewStatusLogEntry) -> Result<StatusLogEntry> {
        let row = sqlx::query_as::<_, StatusLogRow>(
            r#"
            INSERT INTO request_status_log (request_id, status, note, changed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, request_id, status, note, changed_at
            "#,
        )
        .bind(entry.request_id.as_str())
        .bind(entry.status.to_string())
        .bind(&entry.note)
        .bind(entry.changed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert status log entry: {:?}", e);
            AppError::Database(e)
        })?;

        row.try_into()
    }

    async fn list_status_log(&self, request_id: &RequestId) -> Result<Vec<StatusLogEntry>> {
        let rows = sqlx::query_as::<_, StatusLogRow>(
            r#"
            SELECT id, request_id, status, note, changed_at
            FROM request_status_log
            WHERE request_id = $1
            ORDER BY changed_at ASC
            "#,
        )
        .bind(request_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list status log: {:?}", e);
            AppError::Database(e)
        })?;

        rows.into_iter().map(StatusLogEntry::try_from).collect()
    }
}

/// Postgres-backed branch reference data, kept in the `stores` table
pub struct PgBranchDirectory {
    pool: PgPool,
}

impl PgBranchDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BranchDirectory for PgBranchDirectory {
    async fn resolve_name(&self, name: &str) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT id FROM stores WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to resolve branch name: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn display_name(&self, store_ref: &str) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT name FROM stores WHERE id = $1")
            .bind(store_ref)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to resolve branch display name: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list_branches(&self) -> Result<Vec<Branch>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, name FROM stores ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to list branches: {:?}", e);
                    AppError::Database(e)
                })?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Branch { id, name })
            .collect())
    }
}
