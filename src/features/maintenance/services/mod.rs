mod status_service;
mod submission_service;
mod tracking_service;

pub use status_service::StatusService;
pub use submission_service::{
    SubmissionForm, SubmissionReceipt, SubmissionService, UploadOutcome,
};
pub use tracking_service::{TrackedRequest, TrackingService, UNSPECIFIED_BRANCH};
