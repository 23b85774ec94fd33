/// A file staged in a draft before submission: raw bytes plus the metadata
/// needed for validation and upload. Nothing is persisted at this stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl StagedAttachment {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Draft fields addressable through [`RequestDraft::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Branch,
    ServiceType,
    Title,
    Description,
    Priority,
    RequestedDate,
    EstimatedCost,
}

/// In-memory staging area for a not-yet-submitted maintenance request.
///
/// Field values are kept as entered (free-form strings, like the form they
/// come from); validation happens at the step gates and at submission, not
/// here. A draft lives only in the wizard's working memory and is discarded
/// on successful submission or abandonment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDraft {
    pub branch: String,
    pub service_type: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub requested_date: String,
    pub estimated_cost: String,
    pub attachments: Vec<StagedAttachment>,
}

impl RequestDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-form field mutation; no validation at this layer
    pub fn update(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::Branch => self.branch = value,
            DraftField::ServiceType => self.service_type = value,
            DraftField::Title => self.title = value,
            DraftField::Description => self.description = value,
            DraftField::Priority => self.priority = value,
            DraftField::RequestedDate => self.requested_date = value,
            DraftField::EstimatedCost => self.estimated_cost = value,
        }
    }

    pub fn set_attachments(&mut self, attachments: Vec<StagedAttachment>) {
        self.attachments = attachments;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_sets_fields() {
        let mut draft = RequestDraft::new();
        draft.update(DraftField::Branch, "Main");
        draft.update(DraftField::Title, "Leak");
        draft.update(DraftField::EstimatedCost, "1500.50");

        assert_eq!(draft.branch, "Main");
        assert_eq!(draft.title, "Leak");
        assert_eq!(draft.estimated_cost, "1500.50");
        assert!(draft.description.is_empty());
    }

    #[test]
    fn test_set_attachments_replaces_list() {
        let mut draft = RequestDraft::new();
        draft.set_attachments(vec![StagedAttachment::new("a.jpg", "image/jpeg", vec![1])]);
        draft.set_attachments(vec![
            StagedAttachment::new("b.png", "image/png", vec![2]),
            StagedAttachment::new("c.pdf", "application/pdf", vec![3]),
        ]);

        assert_eq!(draft.attachments.len(), 2);
        assert_eq!(draft.attachments[0].filename, "b.png");
    }
}
