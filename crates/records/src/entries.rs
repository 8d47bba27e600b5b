//! Repeatable sub-collection entries of a patient record.
//!
//! Every entry kind is a plain record with the wire field names used by the
//! persistence collaborator, plus a kind-specific minimal-completeness predicate.
//! Entries carry no identifier of their own: inside a draft they are addressed by
//! position only.
//!
//! The set of kinds is closed. [`EntryKind`] names them and [`SubCollectionEntry`]
//! (sealed) ties each entry type to its kind, its completeness predicate and its
//! slot in a [`PatientDraft`].

use crate::patient::PatientDraft;
use crate::{RecordsError, RecordsResult};
use drt_types::{parse_whole_number, LookupId, TypeError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Entry kinds
// ============================================================================

/// The closed set of repeatable sub-collections in a patient record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Test,
    Treatment,
    TbEpisode,
    Interruption,
    AdherenceVisit,
}

impl EntryKind {
    pub const ALL: [EntryKind; 5] = [
        EntryKind::Test,
        EntryKind::Treatment,
        EntryKind::TbEpisode,
        EntryKind::Interruption,
        EntryKind::AdherenceVisit,
    ];

    /// Wire name of the collection inside the patient payload.
    pub fn wire_name(self) -> &'static str {
        match self {
            EntryKind::Test => "testMonitoring",
            EntryKind::Treatment => "treatmentHistory",
            EntryKind::TbEpisode => "tbHistory",
            EntryKind::Interruption => "art_interruption",
            EntryKind::AdherenceVisit => "adherence",
        }
    }

    /// Number of committed entries of this kind in `draft`.
    pub fn len_in(self, draft: &PatientDraft) -> usize {
        match self {
            EntryKind::Test => draft.tests.len(),
            EntryKind::Treatment => draft.treatments.len(),
            EntryKind::TbEpisode => draft.tb_episodes.len(),
            EntryKind::Interruption => draft.interruptions.len(),
            EntryKind::AdherenceVisit => draft.adherence_visits.len(),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Behaviour shared by every sub-collection entry type.
///
/// Implemented only for the five entry types in this module.
pub trait SubCollectionEntry: Clone + Default + fmt::Debug + sealed::Sealed {
    /// The kind this entry type belongs to.
    const KIND: EntryKind;

    /// Minimal-completeness predicate checked before an entry is committed.
    fn is_complete(&self) -> bool;

    /// The committed entries of this kind in `draft`.
    fn committed(draft: &PatientDraft) -> &[Self];

    /// A copy of `draft` with this kind's collection replaced by `entries`.
    fn with_committed(draft: &PatientDraft, entries: Vec<Self>) -> PatientDraft;

    /// Set the field with wire name `field` from a raw form value.
    ///
    /// Lookup and count fields are coerced as in [`crate::DraftField::from_path`]: blank is
    /// unset or zero. Text is kept as typed.
    ///
    /// # Errors
    ///
    /// [`RecordsError::UnknownField`] if this kind has no such field, and
    /// [`RecordsError::InvalidValue`] if the value cannot be coerced. `self` is unchanged on error.
    fn set_input(&mut self, field: &str, raw: &str) -> RecordsResult<()>;
}

// ----------------------------------------------------------------------------
// Form input coercion
// ----------------------------------------------------------------------------

fn invalid(field: &str, source: TypeError) -> RecordsError {
    RecordsError::InvalidValue {
        field: field.to_owned(),
        source,
    }
}

fn unknown(field: &str) -> RecordsError {
    RecordsError::UnknownField(field.to_owned())
}

fn lookup_input(field: &str, raw: &str) -> RecordsResult<LookupId> {
    LookupId::from_input(raw).map_err(|source| invalid(field, source))
}

fn number_input<T: TryFrom<i64>>(field: &str, raw: &str) -> RecordsResult<T> {
    let value = parse_whole_number(raw).map_err(|source| invalid(field, source))?;
    T::try_from(value).map_err(|_| invalid(field, TypeError::NotNumeric(raw.to_owned())))
}

// ============================================================================
// Entry records
// ============================================================================

/// One laboratory monitoring result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitoringTest {
    pub test_type_id: LookupId,
    pub test_date: String,
    pub result: String,
}

/// One antiretroviral treatment episode; up to three drug slots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreatmentEpisode {
    pub drug1_id: LookupId,
    pub drug2_id: LookupId,
    pub drug3_id: LookupId,
    pub start_date: String,
    pub end_date: String,
    pub reason_for_stopping: String,
}

/// One tuberculosis treatment episode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TbEpisode {
    pub tb_regimen: LookupId,
    pub start_date: String,
    pub end_date: String,
    pub art_regimen: LookupId,
    pub additional_drug: LookupId,
}

/// One interruption of antiretroviral therapy.
///
/// `duration` is the period unit (days, weeks, ...) from the period lookup table and
/// `duration_number` the amount of that unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtInterruption {
    pub date_stopped: String,
    pub duration: LookupId,
    pub duration_number: u32,
    pub reason_for_stopping: String,
}

impl ArtInterruption {
    /// Both safety-relevant fields carry text (whitespace does not count).
    pub fn has_stop_date_and_reason(&self) -> bool {
        !self.date_stopped.trim().is_empty() && !self.reason_for_stopping.trim().is_empty()
    }
}

/// One adherence follow-up visit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdherenceVisit {
    pub scheduled_visit_date: String,
    pub actual_visit_date: String,
    pub dose_missed: i32,
    pub adherence_challenges: String,
}

/// The singleton adherence questionnaire. Not a repeatable collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdherenceQuestionnaire {
    pub last_month_missed_dose: u32,
    pub last_week_missed_dose: u32,
    pub adherence_last_session: u32,
    pub last_date_of_session: String,
    pub outcome: LookupId,
    pub hiv_disclosure: LookupId,
    pub swallow_tabs: LookupId,
}

// ============================================================================
// Kind bindings
// ============================================================================

impl sealed::Sealed for MonitoringTest {}
impl SubCollectionEntry for MonitoringTest {
    const KIND: EntryKind = EntryKind::Test;

    fn is_complete(&self) -> bool {
        self.test_type_id.is_set() && !self.test_date.is_empty() && !self.result.is_empty()
    }

    fn committed(draft: &PatientDraft) -> &[Self] {
        &draft.tests
    }

    fn with_committed(draft: &PatientDraft, entries: Vec<Self>) -> PatientDraft {
        PatientDraft {
            tests: entries,
            ..draft.clone()
        }
    }

    fn set_input(&mut self, field: &str, raw: &str) -> RecordsResult<()> {
        match field {
            "testTypeId" => self.test_type_id = lookup_input(field, raw)?,
            "testDate" => self.test_date = raw.to_owned(),
            "result" => self.result = raw.to_owned(),
            _ => return Err(unknown(field)),
        }
        Ok(())
    }
}

impl sealed::Sealed for TreatmentEpisode {}
impl SubCollectionEntry for TreatmentEpisode {
    const KIND: EntryKind = EntryKind::Treatment;

    fn is_complete(&self) -> bool {
        self.drug1_id.is_set() && !self.start_date.is_empty()
    }

    fn committed(draft: &PatientDraft) -> &[Self] {
        &draft.treatments
    }

    fn with_committed(draft: &PatientDraft, entries: Vec<Self>) -> PatientDraft {
        PatientDraft {
            treatments: entries,
            ..draft.clone()
        }
    }

    fn set_input(&mut self, field: &str, raw: &str) -> RecordsResult<()> {
        match field {
            "drug1Id" => self.drug1_id = lookup_input(field, raw)?,
            "drug2Id" => self.drug2_id = lookup_input(field, raw)?,
            "drug3Id" => self.drug3_id = lookup_input(field, raw)?,
            "startDate" => self.start_date = raw.to_owned(),
            "endDate" => self.end_date = raw.to_owned(),
            "reasonForStopping" => self.reason_for_stopping = raw.to_owned(),
            _ => return Err(unknown(field)),
        }
        Ok(())
    }
}

impl sealed::Sealed for TbEpisode {}
impl SubCollectionEntry for TbEpisode {
    const KIND: EntryKind = EntryKind::TbEpisode;

    fn is_complete(&self) -> bool {
        self.tb_regimen.is_set() && !self.start_date.is_empty() && !self.end_date.is_empty()
    }

    fn committed(draft: &PatientDraft) -> &[Self] {
        &draft.tb_episodes
    }

    fn with_committed(draft: &PatientDraft, entries: Vec<Self>) -> PatientDraft {
        PatientDraft {
            tb_episodes: entries,
            ..draft.clone()
        }
    }

    fn set_input(&mut self, field: &str, raw: &str) -> RecordsResult<()> {
        match field {
            "tbRegimen" => self.tb_regimen = lookup_input(field, raw)?,
            "startDate" => self.start_date = raw.to_owned(),
            "endDate" => self.end_date = raw.to_owned(),
            "artRegimen" => self.art_regimen = lookup_input(field, raw)?,
            "additionalDrug" => self.additional_drug = lookup_input(field, raw)?,
            _ => return Err(unknown(field)),
        }
        Ok(())
    }
}

impl sealed::Sealed for ArtInterruption {}
impl SubCollectionEntry for ArtInterruption {
    const KIND: EntryKind = EntryKind::Interruption;

    fn is_complete(&self) -> bool {
        !self.date_stopped.is_empty()
            && self.duration.is_set()
            && self.duration_number != 0
            && !self.reason_for_stopping.is_empty()
    }

    fn committed(draft: &PatientDraft) -> &[Self] {
        &draft.interruptions
    }

    fn with_committed(draft: &PatientDraft, entries: Vec<Self>) -> PatientDraft {
        PatientDraft {
            interruptions: entries,
            ..draft.clone()
        }
    }

    fn set_input(&mut self, field: &str, raw: &str) -> RecordsResult<()> {
        match field {
            "dateStopped" => self.date_stopped = raw.to_owned(),
            "duration" => self.duration = lookup_input(field, raw)?,
            "durationNumber" => self.duration_number = number_input(field, raw)?,
            "reasonForStopping" => self.reason_for_stopping = raw.to_owned(),
            _ => return Err(unknown(field)),
        }
        Ok(())
    }
}

impl sealed::Sealed for AdherenceVisit {}
impl SubCollectionEntry for AdherenceVisit {
    const KIND: EntryKind = EntryKind::AdherenceVisit;

    fn is_complete(&self) -> bool {
        !self.scheduled_visit_date.is_empty()
            && !self.actual_visit_date.is_empty()
            && self.dose_missed >= 0
    }

    fn committed(draft: &PatientDraft) -> &[Self] {
        &draft.adherence_visits
    }

    fn with_committed(draft: &PatientDraft, entries: Vec<Self>) -> PatientDraft {
        PatientDraft {
            adherence_visits: entries,
            ..draft.clone()
        }
    }

    fn set_input(&mut self, field: &str, raw: &str) -> RecordsResult<()> {
        match field {
            "scheduledVisitDate" => self.scheduled_visit_date = raw.to_owned(),
            "actualVisitDate" => self.actual_visit_date = raw.to_owned(),
            // signed: a negative count is kept and fails the completeness check
            "doseMissed" => self.dose_missed = number_input(field, raw)?,
            "adherenceChallenges" => self.adherence_challenges = raw.to_owned(),
            _ => return Err(unknown(field)),
        }
        Ok(())
    }
}
