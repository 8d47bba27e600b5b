//! Review decision form for a single application.

use crate::store::ApplicationStore;
use crate::{CoreError, CoreResult};
use drt_records::{ApplicationId, Decision, ReviewDecision};

/// A reviewer's decision in progress.
///
/// Cleared after a successful submission, kept intact after a failed one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewForm {
    application_id: ApplicationId,
    decision: Option<Decision>,
    comment: String,
}

impl ReviewForm {
    pub fn new(application_id: ApplicationId) -> Self {
        Self {
            application_id,
            decision: None,
            comment: String::new(),
        }
    }

    pub fn decision(&self) -> Option<Decision> {
        self.decision
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_decision(&mut self, decision: Decision) {
        self.decision = Some(decision);
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// The wire record for the current form state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoDecision`] if no decision has been chosen.
    pub fn to_decision(&self) -> CoreResult<ReviewDecision> {
        let decision = self.decision.ok_or(CoreError::NoDecision)?;
        Ok(ReviewDecision {
            application_id: self.application_id,
            comment: self.comment.clone(),
            review_status: decision,
        })
    }

    pub async fn submit<S: ApplicationStore>(&mut self, store: &S) -> CoreResult<()> {
        let record = self.to_decision()?;
        if let Err(err) = store.submit_review(&record).await {
            tracing::warn!(
                application_id = %self.application_id,
                error = %err,
                "review submission failed"
            );
            return Err(err.into());
        }

        tracing::info!(
            application_id = %self.application_id,
            decision = %record.review_status,
            "review submitted"
        );
        self.decision = None;
        self.comment.clear();
        Ok(())
    }
}
