//! Reviewer assignment dispatch.
//!
//! Turns a validated [`ReviewerSelection`] into one assignment record per member, issued one at a
//! time in selection order. The first failing request stops the batch.
//!
//! The application's status is read again before the first request; it must still be `New`.
//!
//! ## Partial batches
//!
//! Records created before the failure are handled according to [`DispatchPolicy`]:
//! - `LeavePartial`: they stay, and the error lists them
//! - `Compensate`: they are deleted newest first; the error says whether that fully succeeded
//!
//! Either way the caller receives [`CoreError::PartialAssignment`] naming the failed reviewer.
//! A failure of the very first request created nothing and surfaces as [`CoreError::Store`].

use crate::config::{CoreConfig, DispatchPolicy};
use crate::error::StoreError;
use crate::selection::{ensure_assignable, ReviewerSelection};
use crate::store::{ApplicationStore, AssignmentReceipt};
use crate::{CoreError, CoreResult};
use drt_records::{ApplicationId, AssignmentRecord, ReviewerId};
use std::sync::Arc;

/// Records created by a successful dispatch, in request order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    pub application_id: ApplicationId,
    pub receipts: Vec<AssignmentReceipt>,
}

impl DispatchReport {
    pub fn reviewers(&self) -> Vec<ReviewerId> {
        self.receipts.iter().map(|r| r.reviewer_id).collect()
    }
}

/// Service issuing assignment records through an [`ApplicationStore`].
#[derive(Debug)]
pub struct AssignmentDispatcher<S> {
    cfg: Arc<CoreConfig>,
    store: Arc<S>,
}

impl<S: ApplicationStore> AssignmentDispatcher<S> {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<S>) -> Self {
        Self { cfg, store }
    }

    /// Fetch an application and open an empty selection for it.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Store`] if the application cannot be fetched
    /// - [`CoreError::NotAssignable`] unless its current status is `New`
    pub async fn open_selection(
        &self,
        application_id: ApplicationId,
    ) -> CoreResult<ReviewerSelection> {
        let application = self.store.get_application(application_id).await?;
        ReviewerSelection::for_application(&application)
    }

    /// Create one assignment record per selected reviewer.
    ///
    /// Nothing is sent if the selection fails validation or the application has left `New`.
    pub async fn dispatch(&self, selection: &ReviewerSelection) -> CoreResult<DispatchReport> {
        selection.validate_for_dispatch(self.cfg.min_reviewers())?;

        let application_id = selection.application_id();
        let application = self.store.get_application(application_id).await?;
        ensure_assignable(&application)?;

        let lead = selection.lead();
        let mut receipts: Vec<AssignmentReceipt> = Vec::with_capacity(selection.len());

        for &reviewer_id in selection.members() {
            let is_lead = lead == Some(reviewer_id);
            let record = AssignmentRecord::pending(application_id, reviewer_id, is_lead);

            match self.store.create_assignment(&record).await {
                Ok(receipt) => {
                    tracing::info!(
                        application_id = %application_id,
                        reviewer_id = %reviewer_id,
                        is_lead = record.is_lead,
                        "assignment created"
                    );
                    receipts.push(receipt);
                }
                Err(source) => {
                    tracing::warn!(
                        application_id = %application_id,
                        reviewer_id = %reviewer_id,
                        created = receipts.len(),
                        error = %source,
                        "assignment failed; batch stopped"
                    );
                    if receipts.is_empty() {
                        return Err(source.into());
                    }
                    return Err(self.partial_failure(reviewer_id, receipts, source).await);
                }
            }
        }

        Ok(DispatchReport {
            application_id,
            receipts,
        })
    }

    async fn partial_failure(
        &self,
        failed: ReviewerId,
        receipts: Vec<AssignmentReceipt>,
        source: StoreError,
    ) -> CoreError {
        let created: Vec<ReviewerId> = receipts.iter().map(|r| r.reviewer_id).collect();

        let rolled_back = match self.cfg.dispatch_policy() {
            DispatchPolicy::LeavePartial => false,
            DispatchPolicy::Compensate => self.compensate(&receipts).await,
        };

        CoreError::PartialAssignment {
            failed,
            created,
            rolled_back,
            source,
        }
    }

    /// Delete `receipts` newest first. Returns true if every deletion succeeded.
    async fn compensate(&self, receipts: &[AssignmentReceipt]) -> bool {
        let mut all_removed = true;
        for receipt in receipts.iter().rev() {
            if let Err(err) = self.store.delete_assignment(receipt).await {
                tracing::warn!(
                    assignment_id = receipt.assignment_id,
                    reviewer_id = %receipt.reviewer_id,
                    error = %err,
                    "compensating delete failed"
                );
                all_removed = false;
            }
        }
        all_removed
    }
}
