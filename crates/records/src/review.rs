//! Reviewer directory entries, facilities, assignment records and review decisions.
//!
//! All of these are wire shapes first: field names follow the persistence collaborator
//! exactly, including its mix of `camelCase` and `snake_case`.

use drt_types::{ApplicationId, FacilityId, ReviewerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An entry in the reviewer directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: ReviewerId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Reviewer {
    /// "Title First Last", skipping blank parts.
    pub fn display_name(&self) -> String {
        [&self.title, &self.first_name, &self.last_name]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Case-insensitive substring match against title, first and last name.
    ///
    /// A blank term matches every reviewer.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.title, &self.first_name, &self.last_name]
            .into_iter()
            .any(|part| part.to_lowercase().contains(&term))
    }
}

/// A facility (institution) that submits applications.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
}

/// Review state carried on an assignment record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approve,
    Reject,
}

/// A reviewer's decision on an application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn to_wire(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_wire())
    }
}

impl From<Decision> for ReviewStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approve => ReviewStatus::Approve,
            Decision::Reject => ReviewStatus::Reject,
        }
    }
}

/// One (application, reviewer) pairing as sent to the collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    #[serde(rename = "applicationId")]
    pub application_id: ApplicationId,
    #[serde(rename = "reviewerId")]
    pub reviewer_id: ReviewerId,
    pub is_lead: bool,
    pub comment: String,
    pub review_status: ReviewStatus,
}

impl AssignmentRecord {
    /// A fresh assignment: empty comment, status `pending`.
    pub fn pending(application_id: ApplicationId, reviewer_id: ReviewerId, is_lead: bool) -> Self {
        Self {
            application_id,
            reviewer_id,
            is_lead,
            comment: String::new(),
            review_status: ReviewStatus::Pending,
        }
    }
}

/// A review decision as sent to the collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDecision {
    #[serde(rename = "applicationId")]
    pub application_id: ApplicationId,
    pub comment: String,
    pub review_status: Decision,
}
