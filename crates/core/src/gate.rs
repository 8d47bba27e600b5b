//! Wizard steps and the forward-navigation gate.
//!
//! Gates are consulted only when advancing with "Next". Going back, jumping directly to a step,
//! and leaving the final step are never gated.

use crate::constants::{INTERRUPTIONS_INCOMPLETE, INTERRUPTIONS_STEP, REVIEW_STEP, STEP_TITLES};
use crate::{CoreError, CoreResult};
use drt_records::{ApplicationDraft, ArtInterruption};
use std::fmt;

/// One step of the intake wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    ApplicationInfo,
    PatientInfo,
    TestMonitoring,
    TreatmentHistory,
    TbHistory,
    ArtInterruptions,
    Adherence,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 8] = [
        WizardStep::ApplicationInfo,
        WizardStep::PatientInfo,
        WizardStep::TestMonitoring,
        WizardStep::TreatmentHistory,
        WizardStep::TbHistory,
        WizardStep::ArtInterruptions,
        WizardStep::Adherence,
        WizardStep::Review,
    ];

    pub const FIRST: WizardStep = WizardStep::ApplicationInfo;
    pub const LAST: WizardStep = WizardStep::Review;

    /// # Errors
    ///
    /// Returns [`CoreError::NoSuchStep`] outside `0..=7`.
    pub fn from_index(index: usize) -> CoreResult<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(CoreError::NoSuchStep(index))
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        STEP_TITLES[self.index()]
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn is_review(self) -> bool {
        self.index() == REVIEW_STEP
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Why the wizard refused to advance. A correctable state, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateRefusal {
    pub step: WizardStep,
    /// Positions of the entries that fail the gate.
    pub offending: Vec<usize>,
    pub message: String,
}

impl fmt::Display for GateRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Every interruption must carry a stop date and a stop reason.
pub fn interruptions_gate(entries: &[ArtInterruption]) -> Result<(), GateRefusal> {
    let offending: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.has_stop_date_and_reason())
        .map(|(i, _)| i)
        .collect();

    if offending.is_empty() {
        return Ok(());
    }

    Err(GateRefusal {
        step: WizardStep::ArtInterruptions,
        message: INTERRUPTIONS_INCOMPLETE.into(),
        offending,
    })
}

/// Gate for leaving `step` forwards.
pub fn check_forward(step: WizardStep, draft: &ApplicationDraft) -> Result<(), GateRefusal> {
    match step.index() {
        INTERRUPTIONS_STEP => interruptions_gate(&draft.patient.interruptions),
        _ => Ok(()),
    }
}
