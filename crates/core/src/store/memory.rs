//! In-memory persistence collaborator.
//!
//! Assigns sequential identifiers, keeps every record in process memory and can be told to fail
//! specific requests, so the failure paths of submission and assignment can be exercised.

use super::{ApplicationStore, AssignmentReceipt, SubmitReceipt};
use crate::error::{StoreError, StoreResult};
use chrono::Utc;
use drt_records::{
    Application, ApplicationId, ApplicationPayload, AssignmentRecord, Facility, PatientId,
    ReviewDecision, Reviewer, StatusEntry,
};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// How submissions should misbehave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitFault {
    /// The request fails outright.
    Unavailable,
    /// The request completes but reports `created: false`.
    NotCreated,
    /// The request never answers.
    Stall,
}

#[derive(Debug, Default)]
struct MemoryState {
    reviewers: Vec<Reviewer>,
    facilities: Vec<Facility>,
    applications: BTreeMap<ApplicationId, Application>,
    assignments: BTreeMap<u64, AssignmentRecord>,
    reviews: Vec<ReviewDecision>,
    submissions: Vec<ApplicationPayload>,
    last_application_id: u64,
    last_patient_id: u64,
    last_assignment_id: u64,
    assignment_requests: usize,
    fail_assignment_request: Option<usize>,
    submit_fault: Option<SubmitFault>,
    fail_deletions: bool,
    fail_lookups: bool,
}

/// [`ApplicationStore`] backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reviewers(mut self, reviewers: Vec<Reviewer>) -> Self {
        self.state.get_mut().reviewers = reviewers;
        self
    }

    pub fn with_facilities(mut self, facilities: Vec<Facility>) -> Self {
        self.state.get_mut().facilities = facilities;
        self
    }

    /// Seed an existing application. Later submissions are numbered after it.
    pub fn with_application(mut self, application: Application) -> Self {
        let state = self.state.get_mut();
        state.last_application_id = state.last_application_id.max(application.id.get());
        state.applications.insert(application.id, application);
        self
    }

    /// Make the `n`-th assignment request (1-based, counted from now on) fail.
    pub async fn fail_assignment_request(&self, n: usize) {
        let mut state = self.state.lock().await;
        state.fail_assignment_request = Some(state.assignment_requests + n);
    }

    pub async fn set_submit_fault(&self, fault: Option<SubmitFault>) {
        self.state.lock().await.submit_fault = fault;
    }

    pub async fn fail_deletions(&self, fail: bool) {
        self.state.lock().await.fail_deletions = fail;
    }

    /// Make the reviewer and facility lookups fail.
    pub async fn fail_lookups(&self, fail: bool) {
        self.state.lock().await.fail_lookups = fail;
    }

    /// Append a status transition to a stored application.
    pub async fn push_status(&self, id: ApplicationId, entry: StatusEntry) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let application = state
            .applications
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("application {id}")))?;
        application.statuses.push(entry);
        Ok(())
    }

    /// Assignment records currently stored, in creation order.
    pub async fn assignments(&self) -> Vec<AssignmentRecord> {
        self.state.lock().await.assignments.values().cloned().collect()
    }

    /// Number of assignment requests received, failed ones included.
    pub async fn assignment_requests(&self) -> usize {
        self.state.lock().await.assignment_requests
    }

    pub async fn reviews(&self) -> Vec<ReviewDecision> {
        self.state.lock().await.reviews.clone()
    }

    /// Payloads of every accepted submission.
    pub async fn submissions(&self) -> Vec<ApplicationPayload> {
        self.state.lock().await.submissions.clone()
    }
}

impl ApplicationStore for InMemoryStore {
    async fn list_reviewers(&self) -> StoreResult<Vec<Reviewer>> {
        let state = self.state.lock().await;
        if state.fail_lookups {
            return Err(StoreError::Unavailable("reviewer directory unreachable".into()));
        }
        Ok(state.reviewers.clone())
    }

    async fn list_facilities(&self) -> StoreResult<Vec<Facility>> {
        let state = self.state.lock().await;
        if state.fail_lookups {
            return Err(StoreError::Unavailable("facility list unreachable".into()));
        }
        Ok(state.facilities.clone())
    }

    async fn get_application(&self, id: ApplicationId) -> StoreResult<Application> {
        self.state
            .lock()
            .await
            .applications
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("application {id}")))
    }

    async fn submit_application(&self, payload: &ApplicationPayload) -> StoreResult<SubmitReceipt> {
        let mut state = self.state.lock().await;
        let fault = state.submit_fault;
        match fault {
            Some(SubmitFault::Unavailable) => {
                return Err(StoreError::Unavailable("submission endpoint down".into()))
            }
            Some(SubmitFault::NotCreated) => {
                return Ok(SubmitReceipt {
                    created: false,
                    application_id: None,
                })
            }
            Some(SubmitFault::Stall) => {
                drop(state);
                return std::future::pending().await;
            }
            None => {}
        }

        state.last_application_id += 1;
        state.last_patient_id += 1;
        let id = ApplicationId::new(state.last_application_id)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let patient_id = PatientId::new(state.last_patient_id)
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let application = Application::from_payload(id, patient_id, payload, Utc::now());
        state.applications.insert(id, application);
        state.submissions.push(payload.clone());

        Ok(SubmitReceipt {
            created: true,
            application_id: Some(id),
        })
    }

    async fn create_assignment(&self, record: &AssignmentRecord) -> StoreResult<AssignmentReceipt> {
        let mut state = self.state.lock().await;
        state.assignment_requests += 1;
        if state.fail_assignment_request == Some(state.assignment_requests) {
            return Err(StoreError::Unavailable(format!(
                "assignment request {} dropped",
                state.assignment_requests
            )));
        }
        if !state.applications.contains_key(&record.application_id) {
            return Err(StoreError::NotFound(format!(
                "application {}",
                record.application_id
            )));
        }

        state.last_assignment_id += 1;
        let assignment_id = state.last_assignment_id;
        state.assignments.insert(assignment_id, record.clone());

        Ok(AssignmentReceipt {
            assignment_id,
            application_id: record.application_id,
            reviewer_id: record.reviewer_id,
        })
    }

    async fn delete_assignment(&self, receipt: &AssignmentReceipt) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.fail_deletions {
            return Err(StoreError::Rejected {
                status: 500,
                message: "delete refused".into(),
            });
        }
        state
            .assignments
            .remove(&receipt.assignment_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("assignment {}", receipt.assignment_id)))
    }

    async fn submit_review(&self, decision: &ReviewDecision) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if !state.applications.contains_key(&decision.application_id) {
            return Err(StoreError::NotFound(format!(
                "application {}",
                decision.application_id
            )));
        }
        state.reviews.push(decision.clone());
        Ok(())
    }
}
