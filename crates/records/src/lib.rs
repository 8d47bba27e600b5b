//! Intake and review records for the drug-resistance testing programme.
//!
//! This crate provides **domain records** and **wire models** for the data exchanged with
//! the persistence collaborator:
//! - the application draft assembled by the intake wizard and its submission payload
//! - the repeatable sub-collection entries nested in a patient record
//! - persisted applications and their status history
//! - reviewer directory entries, assignment records and review decisions
//!
//! This crate focuses on:
//! - exact wire field names (JSON)
//! - translation between domain records and wire structs
//! - pure rules that belong to the records themselves (entry completeness, status derivation)
//!
//! It performs no I/O. Fetching and persisting records is the job of an
//! `ApplicationStore` implementation in `drt-core`.

pub mod application;
pub mod entries;
pub mod patient;
pub mod review;

// Re-export public domain-level types
pub use application::{Application, ApplicationStatus, DerivedStatus, StatusEntry};
pub use entries::{
    AdherenceQuestionnaire, AdherenceVisit, ArtInterruption, EntryKind, MonitoringTest,
    SubCollectionEntry, TbEpisode, TreatmentEpisode,
};
pub use patient::{
    ApplicationDraft, ApplicationPayload, DraftField, PatientDraft, PatientPayload,
    QuestionnaireField, Sex,
};
pub use review::{AssignmentRecord, Decision, Facility, ReviewDecision, ReviewStatus, Reviewer};

pub use drt_types::{ApplicationId, FacilityId, LookupId, PatientId, ReviewerId, TypeError};

/// Errors returned by the `drt-records` crate.
#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("unknown draft field: {0}")]
    UnknownField(String),

    #[error("invalid value for {field}: {source}")]
    InvalidValue {
        field: String,
        #[source]
        source: TypeError,
    },
}

/// Type alias for Results that can fail with a [`RecordsError`].
pub type RecordsResult<T> = Result<T, RecordsError>;

/// Deserialise a JSON document, reporting the path of the first mismatching field.
pub(crate) fn parse_json_at_path<T>(json_text: &str, what: &str) -> RecordsResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let mut deserializer = serde_json::Deserializer::from_str(json_text);

    match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            Err(RecordsError::Translation(format!(
                "{what} schema mismatch at {path}: {source}"
            )))
        }
    }
}
