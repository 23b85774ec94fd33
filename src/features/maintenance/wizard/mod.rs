mod controller;
mod draft;
pub mod validator;

pub use controller::{parse_requested_date, RequestWizard, WizardError, WizardStep};
pub use draft::{DraftField, RequestDraft, StagedAttachment};
pub use validator::{
    AttachmentContext, RejectedAttachment, RejectionReason, MAX_ATTACHMENTS_PER_REQUEST,
    MAX_ATTACHMENT_SIZE,
};
