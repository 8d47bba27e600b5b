//! Reviewer selection for one application.
//!
//! Membership and lead designation are kept consistent on removal: un-selecting the lead also
//! clears the lead. Designating a lead is deliberately lax (any id is accepted); whether the
//! lead is a member is checked only by [`ReviewerSelection::validate_for_dispatch`].
//!
//! A selection can only be opened for an application whose current status is `New`.

use crate::error::SelectionError;
use crate::{CoreError, CoreResult};
use drt_records::{Application, ApplicationId, ApplicationStatus, ReviewerId};

/// Reviewers chosen for one application, plus the designated lead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewerSelection {
    application_id: ApplicationId,
    /// Unique ids in the order they were selected.
    members: Vec<ReviewerId>,
    lead: Option<ReviewerId>,
}

impl ReviewerSelection {
    pub(crate) fn new(application_id: ApplicationId) -> Self {
        Self {
            application_id,
            members: Vec::new(),
            lead: None,
        }
    }

    /// Open an empty selection for an application whose current status is `New`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotAssignable`] for any other status, including `Unknown`.
    pub fn for_application(application: &Application) -> CoreResult<Self> {
        ensure_assignable(application)?;
        Ok(Self::new(application.id))
    }

    pub fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    pub fn members(&self) -> &[ReviewerId] {
        &self.members
    }

    pub fn lead(&self) -> Option<ReviewerId> {
        self.lead
    }

    pub fn contains(&self, reviewer: ReviewerId) -> bool {
        self.members.contains(&reviewer)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add `reviewer` if absent, remove it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, reviewer: ReviewerId) -> bool {
        if let Some(pos) = self.members.iter().position(|m| *m == reviewer) {
            self.members.remove(pos);
            if self.lead == Some(reviewer) {
                self.lead = None;
            }
            false
        } else {
            self.members.push(reviewer);
            true
        }
    }

    /// Designate `reviewer` as lead. Membership is not required yet.
    pub fn set_lead(&mut self, reviewer: ReviewerId) {
        self.lead = Some(reviewer);
    }

    /// Check the selection can be dispatched with a quorum of `min_reviewers`.
    ///
    /// Conditions are checked in order: quorum, lead present, lead is a member.
    pub fn validate_for_dispatch(&self, min_reviewers: usize) -> Result<(), SelectionError> {
        if self.members.len() < min_reviewers {
            return Err(SelectionError::TooFewReviewers {
                required: min_reviewers,
            });
        }
        let lead = self.lead.ok_or(SelectionError::NoLeadDesignated)?;
        if !self.contains(lead) {
            return Err(SelectionError::LeadNotAmongSelected);
        }
        Ok(())
    }
}

/// Refuse any application whose current status is not `New`.
pub(crate) fn ensure_assignable(application: &Application) -> CoreResult<()> {
    let status = application.status();
    if status.known() != Some(ApplicationStatus::New) {
        return Err(CoreError::NotAssignable {
            status: status.to_string(),
        });
    }
    Ok(())
}
