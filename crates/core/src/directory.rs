//! Reviewer directory as loaded from the persistence collaborator.

use crate::store::ApplicationStore;
use crate::CoreResult;
use drt_records::{Reviewer, ReviewerId};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReviewerDirectory {
    reviewers: Vec<Reviewer>,
}

impl ReviewerDirectory {
    pub fn new(reviewers: Vec<Reviewer>) -> Self {
        Self { reviewers }
    }

    pub async fn load<S: ApplicationStore>(store: &S) -> CoreResult<Self> {
        let reviewers = store.list_reviewers().await.map_err(|err| {
            tracing::warn!(error = %err, "failed to load reviewer directory");
            err
        })?;
        tracing::debug!(count = reviewers.len(), "reviewer directory loaded");
        Ok(Self::new(reviewers))
    }

    pub fn all(&self) -> &[Reviewer] {
        &self.reviewers
    }

    pub fn get(&self, id: ReviewerId) -> Option<&Reviewer> {
        self.reviewers.iter().find(|r| r.id == id)
    }

    /// Reviewers whose title, first or last name contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Vec<&Reviewer> {
        self.reviewers.iter().filter(|r| r.matches(term)).collect()
    }
}
