use chrono::NaiveDate;
use thiserror::Error;

use crate::core::error::{AppError, Result};
use crate::features::maintenance::services::{
    SubmissionForm, SubmissionReceipt, SubmissionService,
};
use crate::features::maintenance::wizard::{
    validator, AttachmentContext, RejectedAttachment, RequestDraft, StagedAttachment,
};

/// Entry steps of the request wizard, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    BasicInfo,
    RequestDetails,
    Attachments,
    Review,
    Submission,
}

impl WizardStep {
    fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::BasicInfo => Some(WizardStep::RequestDetails),
            WizardStep::RequestDetails => Some(WizardStep::Attachments),
            WizardStep::Attachments => Some(WizardStep::Review),
            WizardStep::Review => Some(WizardStep::Submission),
            WizardStep::Submission => None,
        }
    }

    fn prev(self) -> Option<WizardStep> {
        match self {
            WizardStep::BasicInfo => None,
            WizardStep::RequestDetails => Some(WizardStep::BasicInfo),
            WizardStep::Attachments => Some(WizardStep::RequestDetails),
            WizardStep::Review => Some(WizardStep::Attachments),
            WizardStep::Submission => Some(WizardStep::Review),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("{0}")]
    StepIncomplete(String),

    /// `next` was called on the review step; confirmation goes through
    /// [`RequestWizard::submit`] instead.
    #[error("the review step is confirmed by submitting the request")]
    ConfirmationRequired,

    #[error("the wizard is already complete")]
    Complete,
}

/// Interpret a requested-date field value as a calendar date.
///
/// Accepts a plain date ("2026-08-07") or an RFC 3339 timestamp, which is
/// what date pickers typically send.
pub fn parse_requested_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Finite-state controller for the multi-step intake form.
///
/// Sequences the entry steps, gates forward progress on per-step validity
/// and keeps every entered value across backward navigation. Transitions are
/// synchronous and pure; the only effectful operation is [`submit`], which
/// hands the draft to the submission service and is the single path from
/// `Review` to `Submission`.
///
/// Dropping the wizard before `Submission` discards the draft; nothing is
/// persisted.
///
/// [`submit`]: RequestWizard::submit
#[derive(Debug)]
pub struct RequestWizard {
    step: WizardStep,
    draft: RequestDraft,
}

impl Default for RequestWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::BasicInfo,
            draft: RequestDraft::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &RequestDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut RequestDraft {
        &mut self.draft
    }

    /// Advance to the next step if the current step's requirements are met.
    /// Returns the step the wizard landed on.
    pub fn next(&mut self, today: NaiveDate) -> std::result::Result<WizardStep, WizardError> {
        let current = self.step();
        match current {
            WizardStep::Review => return Err(WizardError::ConfirmationRequired),
            WizardStep::Submission => return Err(WizardError::Complete),
            _ => self.check_step(current, today)?,
        }

        let next = current.next().expect("non-terminal step has a successor");
        self.step = next;
        Ok(next)
    }

    /// Go back one step. Entered values are preserved. Returns false when
    /// already on the first step.
    pub fn prev(&mut self) -> bool {
        match self.step().prev() {
            Some(step) => {
                self.step = step;
                true
            }
            None => false,
        }
    }

    /// Run candidate files through the attachment rules and stage the
    /// accepted ones on the draft. Rejections are handed back for display.
    pub fn stage_attachments(
        &mut self,
        candidates: Vec<StagedAttachment>,
    ) -> Vec<RejectedAttachment> {
        let (accepted, rejections) = validator::validate(
            AttachmentContext::Wizard,
            candidates,
            &self.draft.attachments,
        );
        self.draft.attachments.extend(accepted);
        rejections
    }

    /// Confirm the reviewed draft: hand it to the submission service and, on
    /// success, move to the terminal step and discard the draft. On failure
    /// the wizard stays on `Review` with the draft intact so the caller can
    /// retry.
    pub async fn submit(&mut self, service: &SubmissionService) -> Result<SubmissionReceipt> {
        if self.step() != WizardStep::Review {
            return Err(AppError::BadRequest(
                "submission is only available from the review step".to_string(),
            ));
        }

        let receipt = service.submit(&self.draft, SubmissionForm::Standard).await?;

        self.step = WizardStep::Submission;
        self.draft = RequestDraft::new();
        Ok(receipt)
    }

    fn check_step(
        &self,
        step: WizardStep,
        today: NaiveDate,
    ) -> std::result::Result<(), WizardError> {
        match step {
            WizardStep::BasicInfo => {
                let mut missing = Vec::new();
                if self.draft.branch.is_empty() {
                    missing.push("branch");
                }
                if self.draft.service_type.is_empty() {
                    missing.push("service type");
                }
                if self.draft.title.is_empty() {
                    missing.push("title");
                }
                if !missing.is_empty() {
                    return Err(WizardError::StepIncomplete(format!(
                        "required fields missing: {}",
                        missing.join(", ")
                    )));
                }
                Ok(())
            }
            WizardStep::RequestDetails => {
                let mut missing = Vec::new();
                if self.draft.description.is_empty() {
                    missing.push("description");
                }
                if self.draft.priority.is_empty() {
                    missing.push("priority");
                }
                if self.draft.requested_date.is_empty() {
                    missing.push("requested date");
                }
                if !missing.is_empty() {
                    return Err(WizardError::StepIncomplete(format!(
                        "required fields missing: {}",
                        missing.join(", ")
                    )));
                }

                let date = parse_requested_date(&self.draft.requested_date).ok_or_else(|| {
                    WizardError::StepIncomplete(format!(
                        "'{}' is not a valid requested date",
                        self.draft.requested_date
                    ))
                })?;
                if date < today {
                    return Err(WizardError::StepIncomplete(
                        "requested date must not be in the past".to_string(),
                    ));
                }
                Ok(())
            }
            // Attachments are optional; the step always passes
            WizardStep::Attachments => Ok(()),
            WizardStep::Review | WizardStep::Submission => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::features::maintenance::wizard::DraftField;
    use crate::shared::test_helpers::{
        InMemoryBlobStore, InMemoryBranchDirectory, InMemoryRequestStore, RecordingNotifier,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn fill_basic_info(wizard: &mut RequestWizard) {
        wizard.draft_mut().update(DraftField::Branch, "Main");
        wizard.draft_mut().update(DraftField::ServiceType, "General");
        wizard.draft_mut().update(DraftField::Title, "Leak");
    }

    fn fill_details(wizard: &mut RequestWizard) {
        wizard
            .draft_mut()
            .update(DraftField::Description, "Pipe leak in kitchen");
        wizard.draft_mut().update(DraftField::Priority, "high");
        wizard
            .draft_mut()
            .update(DraftField::RequestedDate, "2025-06-16");
    }

    fn submission_service(store: Arc<InMemoryRequestStore>) -> SubmissionService {
        SubmissionService::new(
            store,
            Arc::new(InMemoryBranchDirectory::default()),
            Arc::new(InMemoryBlobStore::default()),
            Arc::new(RecordingNotifier::default()),
        )
    }

    #[test]
    fn test_starts_at_basic_info() {
        let wizard = RequestWizard::new();
        assert_eq!(wizard.step(), WizardStep::BasicInfo);
    }

    #[test]
    fn test_basic_info_blocks_until_all_fields_set() {
        let mut wizard = RequestWizard::new();
        wizard.draft_mut().update(DraftField::Branch, "Main");
        wizard.draft_mut().update(DraftField::ServiceType, "General");

        // Title still missing
        let err = wizard.next(today()).unwrap_err();
        assert!(matches!(err, WizardError::StepIncomplete(ref msg) if msg.contains("title")));
        assert_eq!(wizard.step(), WizardStep::BasicInfo);

        wizard.draft_mut().update(DraftField::Title, "Leak");
        assert_eq!(wizard.next(today()).unwrap(), WizardStep::RequestDetails);
    }

    #[test]
    fn test_details_rejects_past_date() {
        let mut wizard = RequestWizard::new();
        fill_basic_info(&mut wizard);
        wizard.next(today()).unwrap();

        fill_details(&mut wizard);
        wizard
            .draft_mut()
            .update(DraftField::RequestedDate, "2025-06-14");

        let err = wizard.next(today()).unwrap_err();
        assert!(matches!(err, WizardError::StepIncomplete(ref msg) if msg.contains("past")));
        assert_eq!(wizard.step(), WizardStep::RequestDetails);
    }

    #[test]
    fn test_details_accepts_today() {
        let mut wizard = RequestWizard::new();
        fill_basic_info(&mut wizard);
        wizard.next(today()).unwrap();

        fill_details(&mut wizard);
        wizard
            .draft_mut()
            .update(DraftField::RequestedDate, "2025-06-15");

        assert_eq!(wizard.next(today()).unwrap(), WizardStep::Attachments);
    }

    #[test]
    fn test_details_accepts_rfc3339_timestamp() {
        let mut wizard = RequestWizard::new();
        fill_basic_info(&mut wizard);
        wizard.next(today()).unwrap();

        fill_details(&mut wizard);
        wizard
            .draft_mut()
            .update(DraftField::RequestedDate, "2025-07-01T08:30:00+03:00");

        assert_eq!(wizard.next(today()).unwrap(), WizardStep::Attachments);
    }

    #[test]
    fn test_attachments_step_is_optional() {
        let mut wizard = RequestWizard::new();
        fill_basic_info(&mut wizard);
        wizard.next(today()).unwrap();
        fill_details(&mut wizard);
        wizard.next(today()).unwrap();

        // No attachments staged; the step still passes
        assert_eq!(wizard.next(today()).unwrap(), WizardStep::Review);
    }

    #[test]
    fn test_prev_preserves_entered_values() {
        let mut wizard = RequestWizard::new();
        fill_basic_info(&mut wizard);
        wizard.next(today()).unwrap();
        fill_details(&mut wizard);

        assert!(wizard.prev());
        assert_eq!(wizard.step(), WizardStep::BasicInfo);
        assert_eq!(wizard.draft().title, "Leak");
        assert_eq!(wizard.draft().description, "Pipe leak in kitchen");

        assert!(!RequestWizard::new().prev());
    }

    #[test]
    fn test_next_on_review_requires_submission() {
        let mut wizard = RequestWizard::new();
        fill_basic_info(&mut wizard);
        wizard.next(today()).unwrap();
        fill_details(&mut wizard);
        wizard.next(today()).unwrap();
        wizard.next(today()).unwrap();

        assert_eq!(wizard.next(today()), Err(WizardError::ConfirmationRequired));
        assert_eq!(wizard.step(), WizardStep::Review);
    }

    #[test]
    fn test_stage_attachments_reports_rejections() {
        let mut wizard = RequestWizard::new();
        let rejections = wizard.stage_attachments(vec![
            StagedAttachment::new("a.jpg", "image/jpeg", vec![0u8; 16]),
            StagedAttachment::new("b.gif", "image/gif", vec![0u8; 16]),
        ]);

        assert_eq!(rejections.len(), 1);
        assert_eq!(wizard.draft().attachments.len(), 1);
        assert_eq!(wizard.draft().attachments[0].filename, "a.jpg");
    }

    #[tokio::test]
    async fn test_submit_advances_and_discards_draft() {
        let store = Arc::new(InMemoryRequestStore::default());
        let service = submission_service(Arc::clone(&store));

        let mut wizard = RequestWizard::new();
        fill_basic_info(&mut wizard);
        wizard.next(today()).unwrap();
        fill_details(&mut wizard);
        wizard.next(today()).unwrap();
        wizard.next(today()).unwrap();

        let receipt = wizard.submit(&service).await.unwrap();

        assert_eq!(wizard.step(), WizardStep::Submission);
        assert!(wizard.draft().title.is_empty());
        assert!(store.get_request_sync(&receipt.request_id).is_some());
    }

    #[tokio::test]
    async fn test_failed_submit_stays_on_review() {
        let store = Arc::new(InMemoryRequestStore::default());
        store.fail_next_insert();
        let service = submission_service(Arc::clone(&store));

        let mut wizard = RequestWizard::new();
        fill_basic_info(&mut wizard);
        wizard.next(today()).unwrap();
        fill_details(&mut wizard);
        wizard.next(today()).unwrap();
        wizard.next(today()).unwrap();

        let err = wizard.submit(&service).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        // The draft survives so the user can retry
        assert_eq!(wizard.step(), WizardStep::Review);
        assert_eq!(wizard.draft().title, "Leak");
    }

    #[tokio::test]
    async fn test_submit_outside_review_is_rejected() {
        let store = Arc::new(InMemoryRequestStore::default());
        let service = submission_service(store);

        let mut wizard = RequestWizard::new();
        let err = wizard.submit(&service).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
