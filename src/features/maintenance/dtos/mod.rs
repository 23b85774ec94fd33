mod request_dto;

pub use request_dto::{
    AttachmentResponseDto, BranchResponseDto, MaintenanceRequestResponseDto,
    RequestDetailResponseDto, StatusLogEntryResponseDto, SubmissionResponseDto,
    SubmitRequestFormDto, UpdateRequestStatusDto, UploadOutcomeDto,
};
