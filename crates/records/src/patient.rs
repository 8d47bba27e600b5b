//! Patient draft records and the application submission payload.
//!
//! This module provides both the domain-level draft assembled by the intake wizard and the
//! wire model sent to the persistence collaborator on submission.
//!
//! Responsibilities:
//! - Define the draft (`ApplicationDraft` wrapping a `PatientDraft`)
//! - Apply field updates as pure transforms (`with_field`), including updates addressed by
//!   wire path with raw form input
//! - Render the draft into the submission payload, dropping non-authoritative fields
//!
//! Notes:
//! - Exactly one of date of birth / age is submitted, selected by `date_of_birth_available`
//! - The pregnancy due date is submitted only when the sex code is `FP`
//! - Both non-authoritative values stay in the draft so toggling back restores them

use crate::entries::{
    AdherenceQuestionnaire, AdherenceVisit, ArtInterruption, MonitoringTest, TbEpisode,
    TreatmentEpisode,
};
use crate::{RecordsError, RecordsResult};
use chrono::{DateTime, SecondsFormat, Utc};
use drt_types::{parse_whole_number, FacilityId, LookupId, TypeError};
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Sex / pregnancy status code as captured on the intake form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "FNP")]
    FemaleNotPregnant,
    #[serde(rename = "FP")]
    FemalePregnant,
    #[serde(rename = "FBf")]
    FemaleBreastfeeding,
}

impl Sex {
    /// Convert to the wire code.
    pub fn to_wire(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::FemaleNotPregnant => "FNP",
            Sex::FemalePregnant => "FP",
            Sex::FemaleBreastfeeding => "FBf",
        }
    }

    /// Parse a wire code. Blank input means "not chosen" and yields `Ok(None)`.
    pub fn from_wire(code: &str) -> RecordsResult<Option<Self>> {
        match code.trim() {
            "" => Ok(None),
            "M" => Ok(Some(Sex::Male)),
            "FNP" => Ok(Some(Sex::FemaleNotPregnant)),
            "FP" => Ok(Some(Sex::FemalePregnant)),
            "FBf" => Ok(Some(Sex::FemaleBreastfeeding)),
            other => Err(RecordsError::InvalidInput(format!(
                "unknown sex code '{other}'"
            ))),
        }
    }

    pub fn is_pregnant(self) -> bool {
        matches!(self, Sex::FemalePregnant)
    }
}

/// The patient record under construction.
///
/// Values are never mutated in place: every update goes through [`PatientDraft::with_field`]
/// or [`crate::SubCollectionEntry::with_committed`] and yields a new value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientDraft {
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub art_number: String,
    pub sex: Option<Sex>,
    pub date_of_birth: String,
    pub age: u32,
    /// When true the date of birth is authoritative, otherwise the age is.
    pub date_of_birth_available: bool,
    pub art_start_date: String,
    pub pregnancy_due_date: String,
    pub tests: Vec<MonitoringTest>,
    pub treatments: Vec<TreatmentEpisode>,
    pub tb_episodes: Vec<TbEpisode>,
    pub interruptions: Vec<ArtInterruption>,
    pub adherence_visits: Vec<AdherenceVisit>,
    pub questionnaire: AdherenceQuestionnaire,
}

impl Default for PatientDraft {
    fn default() -> Self {
        Self {
            national_id: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            art_number: String::new(),
            sex: None,
            date_of_birth: String::new(),
            age: 0,
            date_of_birth_available: true,
            art_start_date: String::new(),
            pregnancy_due_date: String::new(),
            tests: Vec::new(),
            treatments: Vec::new(),
            tb_episodes: Vec::new(),
            interruptions: Vec::new(),
            adherence_visits: Vec::new(),
            questionnaire: AdherenceQuestionnaire::default(),
        }
    }
}

/// The whole unit submitted by the intake wizard: application envelope plus patient draft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub application_date: DateTime<Utc>,
    pub facility_id: Option<FacilityId>,
    pub patient: PatientDraft,
}

impl ApplicationDraft {
    /// An empty draft stamped with `application_date`.
    pub fn new(application_date: DateTime<Utc>) -> Self {
        Self {
            application_date,
            facility_id: None,
            patient: PatientDraft::default(),
        }
    }
}

/// A single named field update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DraftField {
    Facility(Option<FacilityId>),
    NationalId(String),
    FirstName(String),
    LastName(String),
    ArtNumber(String),
    Sex(Option<Sex>),
    DateOfBirth(String),
    Age(u32),
    DateOfBirthAvailable(bool),
    ArtStartDate(String),
    PregnancyDueDate(String),
    Questionnaire(QuestionnaireField),
}

/// A field update inside the adherence questionnaire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestionnaireField {
    LastMonthMissedDose(u32),
    LastWeekMissedDose(u32),
    AdherenceLastSession(u32),
    LastDateOfSession(String),
    Outcome(LookupId),
    HivDisclosure(LookupId),
    SwallowTabs(LookupId),
}

impl DraftField {
    /// Build an update from a wire path and a raw form value.
    ///
    /// Paths use the payload's wire names, with `adherenceQuestions.` prefixing questionnaire
    /// fields (for example `firstname`, `dateOfBirthEstimated`, `adherenceQuestions.outcome`).
    /// Numeric values are coerced the way an HTML number input would be: blank is zero.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::UnknownField`] for an unrecognised path and
    /// [`RecordsError::InvalidValue`] if the value cannot be coerced to the field's type.
    pub fn from_path(path: &str, raw: &str) -> RecordsResult<Self> {
        let invalid = |source: TypeError| RecordsError::InvalidValue {
            field: path.to_owned(),
            source,
        };
        let count = |raw: &str| -> RecordsResult<u32> {
            let value = parse_whole_number(raw).map_err(invalid)?;
            u32::try_from(value).map_err(|_| invalid(TypeError::NotNumeric(raw.to_owned())))
        };
        let lookup = |raw: &str| LookupId::from_input(raw).map_err(invalid);

        if let Some(nested) = path.strip_prefix("adherenceQuestions.") {
            let field = match nested {
                "lastMonthMissedDose" => QuestionnaireField::LastMonthMissedDose(count(raw)?),
                "lastWeekMissedDose" => QuestionnaireField::LastWeekMissedDose(count(raw)?),
                "adherenceLastSession" => QuestionnaireField::AdherenceLastSession(count(raw)?),
                "lastDateOfSession" => QuestionnaireField::LastDateOfSession(raw.to_owned()),
                "outcome" => QuestionnaireField::Outcome(lookup(raw)?),
                "hivDisclosure" => QuestionnaireField::HivDisclosure(lookup(raw)?),
                "swallowTabs" => QuestionnaireField::SwallowTabs(lookup(raw)?),
                _ => return Err(RecordsError::UnknownField(path.to_owned())),
            };
            return Ok(DraftField::Questionnaire(field));
        }

        let field = match path {
            "facilityId" => {
                let value = parse_whole_number(raw).map_err(invalid)?;
                if value == 0 {
                    DraftField::Facility(None)
                } else {
                    let id = u64::try_from(value)
                        .map_err(|_| invalid(TypeError::NonPositiveId))
                        .and_then(|v| FacilityId::new(v).map_err(invalid))?;
                    DraftField::Facility(Some(id))
                }
            }
            "nationalId" => DraftField::NationalId(raw.to_owned()),
            "firstname" => DraftField::FirstName(raw.to_owned()),
            "lastname" => DraftField::LastName(raw.to_owned()),
            "ARTNumber" => DraftField::ArtNumber(raw.to_owned()),
            "gender" => DraftField::Sex(Sex::from_wire(raw)?),
            "dateOfBirth" => DraftField::DateOfBirth(raw.to_owned()),
            "age" => DraftField::Age(count(raw)?),
            "dateOfBirthEstimated" => DraftField::DateOfBirthAvailable(count(raw)? != 0),
            "dateStartedART" => DraftField::ArtStartDate(raw.to_owned()),
            "pregnantDueDate" => DraftField::PregnancyDueDate(raw.to_owned()),
            _ => return Err(RecordsError::UnknownField(path.to_owned())),
        };
        Ok(field)
    }
}

impl ApplicationDraft {
    /// Apply one field update, returning the updated copy. `self` is left untouched.
    pub fn with_field(&self, field: DraftField) -> ApplicationDraft {
        let mut next = self.clone();
        let patient = &mut next.patient;
        match field {
            DraftField::Facility(id) => next.facility_id = id,
            DraftField::NationalId(v) => patient.national_id = v,
            DraftField::FirstName(v) => patient.first_name = v,
            DraftField::LastName(v) => patient.last_name = v,
            DraftField::ArtNumber(v) => patient.art_number = v,
            DraftField::Sex(v) => patient.sex = v,
            DraftField::DateOfBirth(v) => patient.date_of_birth = v,
            DraftField::Age(v) => patient.age = v,
            DraftField::DateOfBirthAvailable(v) => patient.date_of_birth_available = v,
            DraftField::ArtStartDate(v) => patient.art_start_date = v,
            DraftField::PregnancyDueDate(v) => patient.pregnancy_due_date = v,
            DraftField::Questionnaire(q) => {
                let questions = &mut patient.questionnaire;
                match q {
                    QuestionnaireField::LastMonthMissedDose(v) => {
                        questions.last_month_missed_dose = v
                    }
                    QuestionnaireField::LastWeekMissedDose(v) => {
                        questions.last_week_missed_dose = v
                    }
                    QuestionnaireField::AdherenceLastSession(v) => {
                        questions.adherence_last_session = v
                    }
                    QuestionnaireField::LastDateOfSession(v) => questions.last_date_of_session = v,
                    QuestionnaireField::Outcome(v) => questions.outcome = v,
                    QuestionnaireField::HivDisclosure(v) => questions.hiv_disclosure = v,
                    QuestionnaireField::SwallowTabs(v) => questions.swallow_tabs = v,
                }
            }
        }
        next
    }

    /// Render the submission payload.
    pub fn to_payload(&self) -> ApplicationPayload {
        ApplicationPayload {
            id: 0,
            application_date: self
                .application_date
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            patient_id: 0,
            facility_id: self.facility_id.map_or(0, FacilityId::get),
            patient: PatientPayload::from_draft(&self.patient),
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Wire representation of the submitted application envelope.
///
/// `id` and `patientId` are always `0` on submission; the collaborator assigns them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPayload {
    pub id: u64,
    pub application_date: String,
    pub patient_id: u64,
    pub facility_id: u64,
    pub patient: PatientPayload,
}

impl ApplicationPayload {
    /// Serialise to the JSON body sent to the collaborator.
    pub fn to_json(&self) -> RecordsResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Wire representation of a patient record.
///
/// Used both for submission and inside persisted applications read back from the
/// collaborator, hence every field has a default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientPayload {
    #[serde(rename = "nationalId")]
    pub national_id: String,
    #[serde(rename = "firstname")]
    pub first_name: String,
    #[serde(rename = "lastname")]
    pub last_name: String,
    #[serde(rename = "ARTNumber")]
    pub art_number: String,
    pub gender: String,
    #[serde(rename = "dateOfBirth", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(rename = "dateOfBirthEstimated")]
    pub date_of_birth_estimated: u8,
    #[serde(rename = "dateStartedART")]
    pub date_started_art: String,
    #[serde(rename = "patientPregnant")]
    pub patient_pregnant: u8,
    #[serde(rename = "pregnantDueDate", skip_serializing_if = "Option::is_none")]
    pub pregnant_due_date: Option<String>,
    #[serde(rename = "testMonitoring")]
    pub test_monitoring: Vec<MonitoringTest>,
    #[serde(rename = "tbHistory")]
    pub tb_history: Vec<TbEpisode>,
    #[serde(rename = "treatmentHistory")]
    pub treatment_history: Vec<TreatmentEpisode>,
    #[serde(rename = "art_interruption")]
    pub art_interruption: Vec<ArtInterruption>,
    pub adherence: Vec<AdherenceVisit>,
    #[serde(rename = "adherenceQuestions")]
    pub adherence_questions: AdherenceQuestionnaire,
}

impl PatientPayload {
    /// Translate a draft into its wire form, applying the authoritative-field rules.
    pub fn from_draft(draft: &PatientDraft) -> Self {
        let pregnant = draft.sex.is_some_and(Sex::is_pregnant);

        let (date_of_birth, age) = if draft.date_of_birth_available {
            (Some(draft.date_of_birth.clone()), None)
        } else {
            (None, Some(draft.age))
        };

        Self {
            national_id: draft.national_id.clone(),
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            art_number: draft.art_number.clone(),
            gender: draft.sex.map(Sex::to_wire).unwrap_or_default().to_owned(),
            date_of_birth,
            age,
            date_of_birth_estimated: u8::from(draft.date_of_birth_available),
            date_started_art: draft.art_start_date.clone(),
            patient_pregnant: u8::from(pregnant),
            pregnant_due_date: pregnant.then(|| draft.pregnancy_due_date.clone()),
            test_monitoring: draft.tests.clone(),
            tb_history: draft.tb_episodes.clone(),
            treatment_history: draft.treatments.clone(),
            art_interruption: draft.interruptions.clone(),
            adherence: draft.adherence_visits.clone(),
            adherence_questions: draft.questionnaire.clone(),
        }
    }

    /// Patient's display name ("first last").
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}
