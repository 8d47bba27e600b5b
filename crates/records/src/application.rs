//! Persisted applications and their status history.
//!
//! Responsibilities:
//! - Define the application record returned by the persistence collaborator
//! - Define the status pipeline and its allowed transitions
//! - Derive the current status from the status history
//!
//! The current status is never stored. It is the status of the history entry with the latest
//! `startDate`; among entries sharing that date the one appearing last wins.

use crate::patient::{ApplicationPayload, PatientPayload};
use crate::RecordsResult;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use drt_types::{ApplicationId, FacilityId, PatientId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Known values of an application's status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApplicationStatus {
    New,
    PendingReview,
    Approved,
    SampleCollected,
    ResultsReceived,
    Completed,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 7] = [
        ApplicationStatus::New,
        ApplicationStatus::PendingReview,
        ApplicationStatus::Approved,
        ApplicationStatus::SampleCollected,
        ApplicationStatus::ResultsReceived,
        ApplicationStatus::Completed,
        ApplicationStatus::Rejected,
    ];

    pub fn to_wire(self) -> &'static str {
        match self {
            ApplicationStatus::New => "New",
            ApplicationStatus::PendingReview => "Pending review",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::SampleCollected => "Sample Collected",
            ApplicationStatus::ResultsReceived => "Results Received",
            ApplicationStatus::Completed => "Completed",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    /// Parse status text, ignoring case and surrounding whitespace.
    pub fn from_wire(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.to_wire().eq_ignore_ascii_case(text))
    }

    /// Next status along the main pipeline, if any.
    pub fn successor(self) -> Option<Self> {
        match self {
            ApplicationStatus::New => Some(ApplicationStatus::PendingReview),
            ApplicationStatus::PendingReview => Some(ApplicationStatus::Approved),
            ApplicationStatus::Approved => Some(ApplicationStatus::SampleCollected),
            ApplicationStatus::SampleCollected => Some(ApplicationStatus::ResultsReceived),
            ApplicationStatus::ResultsReceived => Some(ApplicationStatus::Completed),
            ApplicationStatus::Completed | ApplicationStatus::Rejected => None,
        }
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        if next == ApplicationStatus::Rejected {
            return matches!(
                self,
                ApplicationStatus::New | ApplicationStatus::PendingReview
            );
        }
        self.successor() == Some(next)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Completed | ApplicationStatus::Rejected
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_wire())
    }
}

/// One transition in an application's status history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusEntry {
    pub status: String,
    pub start_date: String,
}

impl StatusEntry {
    pub fn new(status: impl Into<String>, start_date: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            start_date: start_date.into(),
        }
    }

    /// Parsed `startDate`; accepts RFC 3339, a naive date-time, or a bare date.
    fn effective_at(&self) -> Option<DateTime<Utc>> {
        let text = self.start_date.trim();
        if let Ok(at) = DateTime::parse_from_rfc3339(text) {
            return Some(at.with_timezone(&Utc));
        }
        if let Ok(at) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(at.and_utc());
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|at| at.and_utc())
    }
}

/// Status derived from a status history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DerivedStatus {
    Known(ApplicationStatus),
    /// Status text outside the known pipeline, passed through as-is.
    Other(String),
    /// Empty history, or latest entry without status text.
    Unknown,
}

impl DerivedStatus {
    /// Derive the current status from a status history.
    pub fn from_history(history: &[StatusEntry]) -> Self {
        let mut latest: Option<(Option<DateTime<Utc>>, &StatusEntry)> = None;
        for entry in history {
            let at = entry.effective_at();
            // `>=` so the last of several equal dates wins; None orders below Some.
            if latest.map_or(true, |(best, _)| at >= best) {
                latest = Some((at, entry));
            }
        }

        match latest {
            Some((_, entry)) if !entry.status.trim().is_empty() => {
                match ApplicationStatus::from_wire(&entry.status) {
                    Some(known) => DerivedStatus::Known(known),
                    None => DerivedStatus::Other(entry.status.clone()),
                }
            }
            _ => DerivedStatus::Unknown,
        }
    }

    pub fn known(&self) -> Option<ApplicationStatus> {
        match self {
            DerivedStatus::Known(status) => Some(*status),
            _ => None,
        }
    }

    /// Case-insensitive match against a status filter such as `"pending review"`.
    pub fn matches_filter(&self, filter: &str) -> bool {
        self.to_string().to_lowercase() == filter.trim().to_lowercase()
    }
}

impl fmt::Display for DerivedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivedStatus::Known(status) => f.write_str(status.to_wire()),
            DerivedStatus::Other(text) => f.write_str(text),
            DerivedStatus::Unknown => f.write_str("Unknown"),
        }
    }
}

/// A persisted application as read back from the collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    #[serde(default)]
    pub application_date: String,
    #[serde(default)]
    pub patient_id: Option<PatientId>,
    #[serde(default)]
    pub facility_id: Option<FacilityId>,
    #[serde(default)]
    pub patient: PatientPayload,
    #[serde(default)]
    pub statuses: Vec<StatusEntry>,
}

impl Application {
    /// Parse an application document, reporting the path of any schema mismatch.
    pub fn parse_json(json_text: &str) -> RecordsResult<Self> {
        crate::parse_json_at_path(json_text, "application")
    }

    /// Materialise a freshly submitted payload under server-assigned ids.
    ///
    /// The history starts with a single `New` entry dated `created_on`.
    pub fn from_payload(
        id: ApplicationId,
        patient_id: PatientId,
        payload: &ApplicationPayload,
        created_on: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            application_date: payload.application_date.clone(),
            patient_id: Some(patient_id),
            facility_id: FacilityId::new(payload.facility_id).ok(),
            patient: payload.patient.clone(),
            statuses: vec![StatusEntry::new(
                ApplicationStatus::New.to_wire(),
                created_on.to_rfc3339(),
            )],
        }
    }

    pub fn status(&self) -> DerivedStatus {
        DerivedStatus::from_history(&self.statuses)
    }
}
