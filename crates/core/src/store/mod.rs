//! Boundary with the persistence collaborator.
//!
//! Everything the core fetches or persists goes through [`ApplicationStore`]. The trait mirrors
//! the collaborator's operations one-to-one; how they are carried (HTTP, database, queue) is the
//! implementor's concern.
//!
//! [`memory::InMemoryStore`] is a complete in-process implementation with fault injection.

pub mod memory;

use crate::error::StoreResult;
use drt_records::{
    Application, ApplicationId, ApplicationPayload, AssignmentRecord, Facility, ReviewDecision,
    Reviewer, ReviewerId,
};
use std::future::Future;

pub use memory::InMemoryStore;

/// Outcome of submitting an application.
///
/// `created` is the collaborator's boolean-coercible success flag. `false` means the request
/// completed but nothing was persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub created: bool,
    pub application_id: Option<ApplicationId>,
}

/// Handle to one created assignment record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssignmentReceipt {
    pub assignment_id: u64,
    pub application_id: ApplicationId,
    pub reviewer_id: ReviewerId,
}

/// Persistence collaborator consumed by the core services.
///
/// Every operation may suspend. Implementations must be shareable across tasks.
pub trait ApplicationStore: Send + Sync {
    /// Reviewer directory.
    fn list_reviewers(&self) -> impl Future<Output = StoreResult<Vec<Reviewer>>> + Send;

    /// Facilities (institutions) an application can be filed under.
    fn list_facilities(&self) -> impl Future<Output = StoreResult<Vec<Facility>>> + Send;

    /// One persisted application with its status history.
    fn get_application(
        &self,
        id: ApplicationId,
    ) -> impl Future<Output = StoreResult<Application>> + Send;

    fn submit_application(
        &self,
        payload: &ApplicationPayload,
    ) -> impl Future<Output = StoreResult<SubmitReceipt>> + Send;

    fn create_assignment(
        &self,
        record: &AssignmentRecord,
    ) -> impl Future<Output = StoreResult<AssignmentReceipt>> + Send;

    /// Remove a previously created assignment record.
    fn delete_assignment(
        &self,
        receipt: &AssignmentReceipt,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn submit_review(
        &self,
        decision: &ReviewDecision,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}
