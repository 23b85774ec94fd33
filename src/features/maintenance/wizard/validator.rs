use std::fmt;

use crate::features::maintenance::wizard::StagedAttachment;

/// Maximum number of attachments per request
pub const MAX_ATTACHMENTS_PER_REQUEST: usize = 5;

/// Maximum attachment size in bytes (5 MiB)
pub const MAX_ATTACHMENT_SIZE: usize = 5 * 1024 * 1024;

/// MIME types accepted by the step-by-step wizard
pub const WIZARD_ALLOWED_MIME_TYPES: &[&str] =
    &["image/jpeg", "image/png", "application/pdf"];

/// Non-image MIME types accepted by the quick form (any image/* is also allowed)
pub const QUICK_FORM_ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Which intake form the attachments are being staged for; each carries its
/// own MIME allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentContext {
    Wizard,
    QuickForm,
}

impl AttachmentContext {
    pub fn allows(self, content_type: &str) -> bool {
        match self {
            AttachmentContext::Wizard => WIZARD_ALLOWED_MIME_TYPES.contains(&content_type),
            AttachmentContext::QuickForm => {
                content_type.starts_with("image/")
                    || QUICK_FORM_ALLOWED_MIME_TYPES.contains(&content_type)
            }
        }
    }
}

/// Why a candidate attachment was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// The whole incoming batch would push the request over the attachment
    /// limit; no file from the batch is accepted.
    BatchLimitExceeded { limit: usize },
    UnsupportedType { content_type: String },
    TooLarge { size: usize, limit: usize },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::BatchLimitExceeded { limit } => {
                write!(f, "at most {} attachments are allowed per request", limit)
            }
            RejectionReason::UnsupportedType { content_type } => {
                write!(f, "file type '{}' is not supported", content_type)
            }
            RejectionReason::TooLarge { size, limit } => write!(
                f,
                "file is {} bytes, larger than the {} byte limit",
                size, limit
            ),
        }
    }
}

/// A rejected candidate together with the reason, handed back to the caller
/// for display; the caller decides what to do with the accepted set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedAttachment {
    pub attachment: StagedAttachment,
    pub reason: RejectionReason,
}

/// Validate a batch of candidate attachments against the limits for the
/// given context.
///
/// The count limit is checked once for the whole batch: if the already
/// accepted set plus the incoming batch exceeds it, every candidate is
/// rejected and the accepted set stays untouched. Remaining candidates are
/// then checked individually for MIME type and size. Pure function; no side
/// effects.
pub fn validate(
    context: AttachmentContext,
    candidates: Vec<StagedAttachment>,
    already_accepted: &[StagedAttachment],
) -> (Vec<StagedAttachment>, Vec<RejectedAttachment>) {
    if already_accepted.len() + candidates.len() > MAX_ATTACHMENTS_PER_REQUEST {
        let rejections = candidates
            .into_iter()
            .map(|attachment| RejectedAttachment {
                attachment,
                reason: RejectionReason::BatchLimitExceeded {
                    limit: MAX_ATTACHMENTS_PER_REQUEST,
                },
            })
            .collect();
        return (Vec::new(), rejections);
    }

    let mut accepted = Vec::new();
    let mut rejections = Vec::new();

    for attachment in candidates {
        if !context.allows(&attachment.content_type) {
            let content_type = attachment.content_type.clone();
            rejections.push(RejectedAttachment {
                attachment,
                reason: RejectionReason::UnsupportedType { content_type },
            });
            continue;
        }

        if attachment.size() > MAX_ATTACHMENT_SIZE {
            let size = attachment.size();
            rejections.push(RejectedAttachment {
                attachment,
                reason: RejectionReason::TooLarge {
                    size,
                    limit: MAX_ATTACHMENT_SIZE,
                },
            });
            continue;
        }

        accepted.push(attachment);
    }

    (accepted, rejections)
}
