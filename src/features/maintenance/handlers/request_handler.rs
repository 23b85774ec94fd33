use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::maintenance::dtos::{
    BranchResponseDto, MaintenanceRequestResponseDto, RequestDetailResponseDto,
    StatusLogEntryResponseDto, SubmissionResponseDto, SubmitRequestFormDto,
    UpdateRequestStatusDto,
};
use crate::features::maintenance::models::RequestId;
use crate::features::maintenance::services::{
    StatusService, SubmissionForm, SubmissionService, TrackingService,
};
use crate::features::maintenance::store::BranchDirectory;
use crate::features::maintenance::wizard::validator::validate as validate_attachments;
use crate::features::maintenance::wizard::{
    parse_requested_date, DraftField, RejectedAttachment, RequestDraft, RequestWizard,
    StagedAttachment, WizardError,
};
use crate::shared::types::{ApiResponse, Meta};

/// State for maintenance handlers
#[derive(Clone)]
pub struct MaintenanceState {
    pub submission_service: Arc<SubmissionService>,
    pub status_service: Arc<StatusService>,
    pub tracking_service: Arc<TrackingService>,
    pub branches: Arc<dyn BranchDirectory>,
}

/// Read the intake form fields and files off a multipart stream
async fn read_submission_form(
    multipart: &mut Multipart,
) -> Result<(RequestDraft, Vec<StagedAttachment>)> {
    let mut draft = RequestDraft::new();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        let draft_field = match field_name.as_str() {
            "branch" => Some(DraftField::Branch),
            "service_type" => Some(DraftField::ServiceType),
            "title" => Some(DraftField::Title),
            "description" => Some(DraftField::Description),
            "priority" => Some(DraftField::Priority),
            "requested_date" => Some(DraftField::RequestedDate),
            "estimated_cost" => Some(DraftField::EstimatedCost),
            _ => None,
        };

        if let Some(draft_field) = draft_field {
            let value = field.text().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read field '{}': {}", field_name, e))
            })?;
            draft.update(draft_field, value);
        } else if field_name == "attachments" {
            let filename = field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unnamed".to_string());
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let bytes = field.bytes().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read file '{}': {}", filename, e))
            })?;
            files.push(StagedAttachment::new(filename, content_type, bytes.to_vec()));
        }
        // Unknown fields are dropped
    }

    Ok((draft, files))
}

fn wizard_error(e: WizardError) -> AppError {
    AppError::Validation(e.to_string())
}

fn rejection_summary(rejections: &[RejectedAttachment]) -> String {
    rejections
        .iter()
        .map(|r| format!("{}: {}", r.attachment.filename, r.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Submit a maintenance request through the step-by-step intake flow
///
/// The posted form is replayed through the wizard's step gates, so it fails
/// exactly where the corresponding step would have blocked.
#[utoipa::path(
    post,
    path = "/api/maintenance/requests",
    tag = "maintenance",
    request_body(
        content = SubmitRequestFormDto,
        content_type = "multipart/form-data",
        description = "Request fields plus up to five attachments"
    ),
    responses(
        (status = 201, description = "Request submitted", body = ApiResponse<SubmissionResponseDto>),
        (status = 400, description = "Validation error")
    )
)]
pub async fn submit_request(
    State(state): State<MaintenanceState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<SubmissionResponseDto>>)> {
    let (draft, files) = read_submission_form(&mut multipart).await?;
    let today = Utc::now().date_naive();

    let mut wizard = RequestWizard::new();
    *wizard.draft_mut() = draft;

    // Basic info, then details
    wizard.next(today).map_err(wizard_error)?;
    wizard.next(today).map_err(wizard_error)?;

    let rejections = wizard.stage_attachments(files);
    if !rejections.is_empty() {
        return Err(AppError::Validation(rejection_summary(&rejections)));
    }
    wizard.next(today).map_err(wizard_error)?;

    let receipt = wizard.submit(&state.submission_service).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(receipt.into()),
            Some("Maintenance request submitted successfully".to_string()),
            None,
        )),
    ))
}

/// Submit a maintenance request through the one-step quick form
#[utoipa::path(
    post,
    path = "/api/maintenance/requests/quick",
    tag = "maintenance",
    request_body(
        content = SubmitRequestFormDto,
        content_type = "multipart/form-data",
        description = "Request fields plus up to five attachments"
    ),
    responses(
        (status = 201, description = "Request submitted", body = ApiResponse<SubmissionResponseDto>),
        (status = 400, description = "Validation error")
    )
)]
pub async fn submit_quick_request(
    State(state): State<MaintenanceState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<SubmissionResponseDto>>)> {
    let (mut draft, files) = read_submission_form(&mut multipart).await?;

    let today = Utc::now().date_naive();
    if let Some(date) = parse_requested_date(&draft.requested_date) {
        if date < today {
            return Err(AppError::Validation(
                "requested date must not be in the past".to_string(),
            ));
        }
    }

    let (accepted, rejections) = validate_attachments(
        SubmissionForm::Quick.attachment_context(),
        files,
        &draft.attachments,
    );
    if !rejections.is_empty() {
        return Err(AppError::Validation(rejection_summary(&rejections)));
    }
    draft.set_attachments(accepted);

    let receipt = state
        .submission_service
        .submit(&draft, SubmissionForm::Quick)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(receipt.into()),
            Some("Maintenance request submitted successfully".to_string()),
            None,
        )),
    ))
}

/// List submitted maintenance requests
#[utoipa::path(
    get,
    path = "/api/maintenance/requests",
    tag = "maintenance",
    responses(
        (status = 200, description = "List of maintenance requests", body = ApiResponse<Vec<MaintenanceRequestResponseDto>>)
    )
)]
pub async fn list_requests(
    State(state): State<MaintenanceState>,
) -> Result<Json<ApiResponse<Vec<MaintenanceRequestResponseDto>>>> {
    let requests = state.tracking_service.list().await?;
    let total = requests.len() as i64;
    let dtos: Vec<MaintenanceRequestResponseDto> =
        requests.into_iter().map(Into::into).collect();

    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Track a maintenance request: current status, attachments and audit trail
#[utoipa::path(
    get,
    path = "/api/maintenance/requests/{id}",
    tag = "maintenance",
    params(
        ("id" = String, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request found", body = ApiResponse<RequestDetailResponseDto>),
        (status = 404, description = "Request not found")
    )
)]
pub async fn get_request(
    State(state): State<MaintenanceState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RequestDetailResponseDto>>> {
    let id = RequestId::new(id);
    let tracked = state
        .tracking_service
        .lookup(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Maintenance request '{}' not found", id)))?;

    Ok(Json(ApiResponse::success(Some(tracked.into()), None, None)))
}

/// Change the status of a maintenance request
#[utoipa::path(
    patch,
    path = "/api/maintenance/requests/{id}/status",
    tag = "maintenance",
    params(
        ("id" = String, Path, description = "Request ID")
    ),
    request_body = UpdateRequestStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<StatusLogEntryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn update_request_status(
    State(state): State<MaintenanceState>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<UpdateRequestStatusDto>,
) -> Result<Json<ApiResponse<StatusLogEntryResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let id = RequestId::new(id);
    let entry = state
        .status_service
        .change_status(&id, dto.status, dto.note)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(entry.into()),
        Some("Request status updated successfully".to_string()),
        None,
    )))
}

/// List servicing branches for the intake form selects
#[utoipa::path(
    get,
    path = "/api/maintenance/branches",
    tag = "maintenance",
    responses(
        (status = 200, description = "List of branches", body = ApiResponse<Vec<BranchResponseDto>>)
    )
)]
pub async fn list_branches(
    State(state): State<MaintenanceState>,
) -> Result<Json<ApiResponse<Vec<BranchResponseDto>>>> {
    let branches = state.branches.list_branches().await?;
    let dtos: Vec<BranchResponseDto> = branches.into_iter().map(Into::into).collect();

    Ok(Json(ApiResponse::success(Some(dtos), None, None)))
}
