use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::maintenance::handlers::{request_handler, MaintenanceState};
use crate::features::maintenance::services::{StatusService, SubmissionService, TrackingService};
use crate::features::maintenance::store::BranchDirectory;

/// Create routes for the maintenance feature
pub fn routes(
    submission_service: Arc<SubmissionService>,
    status_service: Arc<StatusService>,
    tracking_service: Arc<TrackingService>,
    branches: Arc<dyn BranchDirectory>,
) -> Router {
    let state = MaintenanceState {
        submission_service,
        status_service,
        tracking_service,
        branches,
    };

    Router::new()
        .route(
            "/api/maintenance/requests",
            post(request_handler::submit_request).get(request_handler::list_requests),
        )
        .route(
            "/api/maintenance/requests/quick",
            post(request_handler::submit_quick_request),
        )
        .route(
            "/api/maintenance/requests/{id}",
            get(request_handler::get_request),
        )
        .route(
            "/api/maintenance/requests/{id}/status",
            patch(request_handler::update_request_status),
        )
        .route(
            "/api/maintenance/branches",
            get(request_handler::list_branches),
        )
        .with_state(state)
}
