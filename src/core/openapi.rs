use utoipa::{Modify, OpenApi};

use crate::features::maintenance::{
    dtos as maintenance_dtos, handlers as maintenance_handlers, models as maintenance_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Maintenance requests
        maintenance_handlers::request_handler::submit_request,
        maintenance_handlers::request_handler::submit_quick_request,
        maintenance_handlers::request_handler::list_requests,
        maintenance_handlers::request_handler::get_request,
        maintenance_handlers::request_handler::update_request_status,
        maintenance_handlers::request_handler::list_branches,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Maintenance
            maintenance_models::RequestId,
            maintenance_models::RequestStatus,
            maintenance_models::RequestPriority,
            maintenance_dtos::SubmitRequestFormDto,
            maintenance_dtos::SubmissionResponseDto,
            maintenance_dtos::UploadOutcomeDto,
            maintenance_dtos::MaintenanceRequestResponseDto,
            maintenance_dtos::RequestDetailResponseDto,
            maintenance_dtos::AttachmentResponseDto,
            maintenance_dtos::StatusLogEntryResponseDto,
            maintenance_dtos::UpdateRequestStatusDto,
            maintenance_dtos::BranchResponseDto,
            ApiResponse<maintenance_dtos::SubmissionResponseDto>,
            ApiResponse<Vec<maintenance_dtos::MaintenanceRequestResponseDto>>,
            ApiResponse<maintenance_dtos::RequestDetailResponseDto>,
            ApiResponse<maintenance_dtos::StatusLogEntryResponseDto>,
            ApiResponse<Vec<maintenance_dtos::BranchResponseDto>>,
        )
    ),
    tags(
        (name = "maintenance", description = "Maintenance request intake, tracking and status transitions"),
    ),
    info(
        title = "Alazab API",
        version = "0.1.0",
        description = "API documentation for the Alazab maintenance backend",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
