//! Multi-step application intake.
//!
//! The wizard is the single owner of the application draft and the active step. The draft is an
//! immutable value behind an `Arc`; every update builds a new value and swaps the handle, so a
//! snapshot taken earlier stays valid and undo is a handle swap.
//!
//! Responsibilities:
//! - Step navigation (`back`, `next`, `jump_to`), with the forward gate applied only to `next`
//! - Field updates, by variant or by wire path
//! - One collection editor per repeatable sub-collection
//! - Single-flight submission to the persistence collaborator
//!
//! Once submitted the wizard is terminal and refuses further edits. A submission whose ticket is
//! dropped before it is finished (including a cancelled `submit` future) is abandoned, and the
//! wizard accepts edits again.

use crate::collection::{CollectionEditor, CommitOutcome};
use crate::config::CoreConfig;
use crate::error::StoreResult;
use crate::gate::{check_forward, GateRefusal, WizardStep};
use crate::store::{ApplicationStore, SubmitReceipt};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use drt_records::{
    AdherenceVisit, ApplicationDraft, ApplicationId, ApplicationPayload, ArtInterruption,
    DraftField, Facility, MonitoringTest, SubCollectionEntry, TbEpisode, TreatmentEpisode,
};
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Result of pressing "Next".
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    Advanced(WizardStep),
    Refused(GateRefusal),
    /// Already on the last step; nothing happened.
    AtEnd,
}

/// Lifecycle of the wizard with respect to submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardPhase {
    Editing,
    Submitting { attempt: Uuid },
    Submitted { application_id: Option<ApplicationId> },
}

/// A submission that has been started and must be finished with
/// [`IntakeWizard::finish_submission`].
///
/// Dropping the ticket abandons the submission.
#[must_use = "dropping a ticket abandons the submission"]
#[derive(Debug)]
pub struct SubmissionTicket {
    /// Attempt id; the wizard watches this handle to notice abandonment.
    attempt: Arc<Uuid>,
    payload: ApplicationPayload,
}

impl SubmissionTicket {
    pub fn attempt(&self) -> Uuid {
        *self.attempt
    }

    pub fn payload(&self) -> &ApplicationPayload {
        &self.payload
    }
}

/// Staged candidates of every collection editor.
#[doc(hidden)]
#[derive(Clone, Debug, Default)]
pub struct Editors {
    tests: CollectionEditor<MonitoringTest>,
    treatments: CollectionEditor<TreatmentEpisode>,
    tb_episodes: CollectionEditor<TbEpisode>,
    interruptions: CollectionEditor<ArtInterruption>,
    adherence_visits: CollectionEditor<AdherenceVisit>,
}

/// Entry kinds the wizard has an editor for.
pub trait WizardEntry: SubCollectionEntry {
    #[doc(hidden)]
    fn editor(editors: &Editors) -> &CollectionEditor<Self>;
    #[doc(hidden)]
    fn editor_mut(editors: &mut Editors) -> &mut CollectionEditor<Self>;
}

macro_rules! wizard_entry {
    ($($entry:ty => $slot:ident),* $(,)?) => {
        $(
            impl WizardEntry for $entry {
                fn editor(editors: &Editors) -> &CollectionEditor<Self> {
                    &editors.$slot
                }
                fn editor_mut(editors: &mut Editors) -> &mut CollectionEditor<Self> {
                    &mut editors.$slot
                }
            }
        )*
    };
}

wizard_entry!(
    MonitoringTest => tests,
    TreatmentEpisode => treatments,
    TbEpisode => tb_episodes,
    ArtInterruption => interruptions,
    AdherenceVisit => adherence_visits,
);

/// The intake wizard.
#[derive(Debug)]
pub struct IntakeWizard {
    cfg: Arc<CoreConfig>,
    draft: Arc<ApplicationDraft>,
    version: u64,
    history: VecDeque<Arc<ApplicationDraft>>,
    step: WizardStep,
    phase: WizardPhase,
    /// Liveness of the outstanding ticket while `phase` is `Submitting`.
    in_flight: Weak<Uuid>,
    editors: Editors,
    facilities: Vec<Facility>,
}

impl IntakeWizard {
    /// Open a wizard with an empty draft stamped with the current time.
    pub fn open(cfg: Arc<CoreConfig>) -> Self {
        Self::open_at(cfg, Utc::now())
    }

    /// Open a wizard with an empty draft stamped with `opened_at`.
    pub fn open_at(cfg: Arc<CoreConfig>, opened_at: DateTime<Utc>) -> Self {
        tracing::info!(application_date = %opened_at, "intake wizard opened");
        Self {
            cfg,
            draft: Arc::new(ApplicationDraft::new(opened_at)),
            version: 0,
            history: VecDeque::new(),
            step: WizardStep::FIRST,
            phase: WizardPhase::Editing,
            in_flight: Weak::new(),
            editors: Editors::default(),
            facilities: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn phase(&self) -> WizardPhase {
        match self.phase {
            WizardPhase::Submitting { .. } if self.in_flight.strong_count() == 0 => {
                WizardPhase::Editing
            }
            phase => phase,
        }
    }

    /// A handle to the current draft. Stays valid after later updates.
    pub fn snapshot(&self) -> Arc<ApplicationDraft> {
        Arc::clone(&self.draft)
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    /// Incremented on every change of the draft.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Go back one step. No-op on the first step.
    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            tracing::info!(from = %self.step, to = %previous, "wizard step back");
            self.step = previous;
        }
        self.step
    }

    /// Advance one step if the current step's gate allows it.
    pub fn next(&mut self) -> Advance {
        let Some(next) = self.step.next() else {
            return Advance::AtEnd;
        };

        if let Err(refusal) = check_forward(self.step, &self.draft) {
            tracing::warn!(
                step = %self.step,
                offending = ?refusal.offending,
                "wizard advance refused"
            );
            return Advance::Refused(refusal);
        }

        tracing::info!(from = %self.step, to = %next, "wizard step forward");
        self.step = next;
        Advance::Advanced(next)
    }

    /// Jump straight to a step. Direct jumps are never gated.
    pub fn jump_to(&mut self, index: usize) -> CoreResult<WizardStep> {
        let target = WizardStep::from_index(index)?;
        tracing::info!(from = %self.step, to = %target, "wizard jump");
        self.step = target;
        Ok(target)
    }

    // ------------------------------------------------------------------------
    // Draft updates
    // ------------------------------------------------------------------------

    pub fn update(&mut self, field: DraftField) -> CoreResult<()> {
        self.ensure_editable()?;
        let next = self.draft.with_field(field);
        self.replace_draft(next);
        Ok(())
    }

    /// Update a field addressed by wire path with a raw form value.
    pub fn update_path(&mut self, path: &str, raw: &str) -> CoreResult<()> {
        let field = DraftField::from_path(path, raw).map_err(CoreError::from_records)?;
        self.update(field)
    }

    pub fn staged<E: WizardEntry>(&self) -> &E {
        E::editor(&self.editors).staged()
    }

    /// Replace the staged candidate for `E`'s collection.
    pub fn stage<E: WizardEntry>(&mut self, candidate: E) -> CoreResult<()> {
        self.ensure_editable()?;
        E::editor_mut(&mut self.editors).stage(candidate);
        Ok(())
    }

    /// Edit the staged candidate for `E`'s collection.
    pub fn stage_with<E: WizardEntry>(&mut self, edit: impl FnOnce(&mut E)) -> CoreResult<()> {
        self.ensure_editable()?;
        E::editor_mut(&mut self.editors).stage_with(edit);
        Ok(())
    }

    /// Set one field of the staged candidate from a raw form value.
    ///
    /// The candidate is unchanged if the field is unknown or the value cannot be coerced.
    pub fn stage_path<E: WizardEntry>(&mut self, field: &str, raw: &str) -> CoreResult<()> {
        self.ensure_editable()?;
        let mut candidate = self.staged::<E>().clone();
        candidate
            .set_input(field, raw)
            .map_err(CoreError::from_records)?;
        E::editor_mut(&mut self.editors).stage(candidate);
        Ok(())
    }

    /// Commit the staged candidate into the draft if it is complete.
    ///
    /// An incomplete candidate yields `Ok(CommitOutcome::Retained)` and leaves the draft as is.
    pub fn commit<E: WizardEntry>(&mut self) -> CoreResult<CommitOutcome<E>> {
        self.ensure_editable()?;
        let outcome = E::editor_mut(&mut self.editors).commit(E::committed(&self.draft.patient));
        if let CommitOutcome::Appended(entries) = &outcome {
            let patient = E::with_committed(&self.draft.patient, entries.clone());
            self.replace_patient(patient);
        }
        Ok(outcome)
    }

    /// Remove the committed entry at `index` from `E`'s collection.
    pub fn remove<E: WizardEntry>(&mut self, index: usize) -> CoreResult<()> {
        self.ensure_editable()?;
        let editor = E::editor(&self.editors);
        let entries = editor.remove_at(E::committed(&self.draft.patient), index)?;
        tracing::info!(kind = %E::KIND, index, "entry removed");
        let patient = E::with_committed(&self.draft.patient, entries);
        self.replace_patient(patient);
        Ok(())
    }

    /// Restore the previous draft version.
    pub fn undo(&mut self) -> CoreResult<()> {
        self.ensure_editable()?;
        let previous = self.history.pop_back().ok_or(CoreError::NothingToUndo)?;
        self.draft = previous;
        self.version += 1;
        tracing::debug!(version = self.version, "draft change undone");
        Ok(())
    }

    /// Drop the wizard and its draft without persisting anything.
    pub fn discard(self) {
        tracing::info!(
            version = self.version,
            submitted = matches!(self.phase, WizardPhase::Submitted { .. }),
            "intake wizard discarded"
        );
    }

    // ------------------------------------------------------------------------
    // Collaborator interaction
    // ------------------------------------------------------------------------

    /// Load the facility list used by the Application Info step.
    ///
    /// On failure the previously loaded list is kept.
    pub async fn load_facilities<S: ApplicationStore>(
        &mut self,
        store: &S,
    ) -> CoreResult<&[Facility]> {
        match store.list_facilities().await {
            Ok(facilities) => {
                tracing::debug!(count = facilities.len(), "facilities loaded");
                self.facilities = facilities;
                Ok(&self.facilities)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load facilities");
                Err(err.into())
            }
        }
    }

    /// Start a submission: checks the step and phase and renders the payload.
    ///
    /// While the returned ticket is outstanding, edits and further submissions are refused.
    pub fn begin_submission(&mut self) -> CoreResult<SubmissionTicket> {
        self.ensure_editable()?;
        if !self.step.is_review() {
            return Err(CoreError::NotAtReviewStep);
        }
        if let WizardPhase::Submitting { attempt } = self.phase {
            tracing::warn!(%attempt, "abandoned submission released");
        }

        let attempt = Uuid::new_v4();
        let payload = self.draft.to_payload();
        let ticket = SubmissionTicket {
            attempt: Arc::new(attempt),
            payload,
        };
        self.in_flight = Arc::downgrade(&ticket.attempt);
        self.phase = WizardPhase::Submitting { attempt };
        tracing::info!(%attempt, version = self.version, "submitting application");

        Ok(ticket)
    }

    /// Finish a submission with the collaborator's answer.
    ///
    /// On success the wizard becomes terminal. On failure the draft and step are unchanged and
    /// the wizard accepts edits and a fresh submission again.
    pub fn finish_submission(
        &mut self,
        ticket: SubmissionTicket,
        result: StoreResult<SubmitReceipt>,
    ) -> CoreResult<SubmitReceipt> {
        let attempt = ticket.attempt();
        match self.phase {
            WizardPhase::Submitting { attempt: current } if current == attempt => {}
            _ => {
                return Err(CoreError::InvalidInput(format!(
                    "submission {attempt} is not in flight"
                )))
            }
        }

        match result {
            Ok(receipt) if receipt.created => {
                self.phase = WizardPhase::Submitted {
                    application_id: receipt.application_id,
                };
                tracing::info!(
                    %attempt,
                    application_id = ?receipt.application_id.map(ApplicationId::get),
                    "application submitted"
                );
                Ok(receipt)
            }
            Ok(_) => {
                self.phase = WizardPhase::Editing;
                tracing::warn!(%attempt, "collaborator did not create the application");
                Err(CoreError::NotCreated)
            }
            Err(err) => {
                self.phase = WizardPhase::Editing;
                tracing::warn!(%attempt, error = %err, "application submission failed");
                Err(err.into())
            }
        }
    }

    /// Submit the draft as one unit.
    pub async fn submit<S: ApplicationStore>(&mut self, store: &S) -> CoreResult<SubmitReceipt> {
        let ticket = self.begin_submission()?;
        let result = store.submit_application(ticket.payload()).await;
        self.finish_submission(ticket, result)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn ensure_editable(&self) -> CoreResult<()> {
        match self.phase() {
            WizardPhase::Editing => Ok(()),
            WizardPhase::Submitting { .. } => Err(CoreError::SubmissionInFlight),
            WizardPhase::Submitted { .. } => Err(CoreError::AlreadySubmitted),
        }
    }

    fn replace_patient(&mut self, patient: drt_records::PatientDraft) {
        let next = ApplicationDraft {
            patient,
            ..(*self.draft).clone()
        };
        self.replace_draft(next);
    }

    fn replace_draft(&mut self, next: ApplicationDraft) {
        if *self.draft == next {
            return;
        }
        let depth = self.cfg.undo_depth();
        if depth > 0 {
            let previous = std::mem::replace(&mut self.draft, Arc::new(next));
            self.history.push_back(previous);
            while self.history.len() > depth {
                self.history.pop_front();
            }
        } else {
            self.draft = Arc::new(next);
        }
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatchPolicy;
    use crate::error::StoreError;
    use crate::store::memory::{InMemoryStore, SubmitFault};
    use drt_records::{FacilityId, LookupId, Sex};

    fn wizard() -> IntakeWizard {
        IntakeWizard::open(Arc::new(CoreConfig::default()))
    }

    fn interruption(date: &str, reason: &str) -> ArtInterruption {
        ArtInterruption {
            date_stopped: date.into(),
            duration: LookupId::new(2),
            duration_number: 3,
            reason_for_stopping: reason.into(),
        }
    }

    fn at_review(w: &mut IntakeWizard) {
        w.jump_to(7).expect("review step exists");
    }

    #[test]
    fn back_is_a_no_op_on_the_first_step() {
        let mut w = wizard();
        assert_eq!(w.back(), WizardStep::ApplicationInfo);
        assert_eq!(w.step().index(), 0);
    }

    #[test]
    fn next_walks_forward_until_the_end() {
        let mut w = wizard();
        for expected in 1..=7 {
            assert_eq!(
                w.next(),
                Advance::Advanced(WizardStep::from_index(expected).unwrap())
            );
        }
        assert_eq!(w.next(), Advance::AtEnd);
        assert_eq!(w.step(), WizardStep::Review);
    }

    #[test]
    fn interruption_gate_blocks_next_but_not_jumps() {
        let mut w = wizard();
        w.jump_to(5).unwrap();

        w.stage(interruption("2024-01-10", "Stock-out")).unwrap();
        assert!(w.commit::<ArtInterruption>().unwrap().is_appended());
        assert_eq!(w.next(), Advance::Advanced(WizardStep::Adherence));
        w.back();

        // a whitespace reason satisfies the commit check but not the gate
        w.stage(interruption("2024-03-01", "   ")).unwrap();
        assert!(w.commit::<ArtInterruption>().unwrap().is_appended());

        let Advance::Refused(refusal) = w.next() else {
            panic!("gate should refuse");
        };
        assert_eq!(refusal.offending, vec![1]);
        assert_eq!(w.step(), WizardStep::ArtInterruptions);

        assert_eq!(w.jump_to(6).unwrap(), WizardStep::Adherence);

        w.back();
        w.remove::<ArtInterruption>(1).unwrap();
        assert!(matches!(w.next(), Advance::Advanced(WizardStep::Adherence)));
    }

    #[test]
    fn updates_produce_new_versions_and_keep_snapshots_valid() {
        let mut w = wizard();
        let before = w.snapshot();
        w.update(DraftField::FirstName("Chikondi".into())).unwrap();
        w.update_path("gender", "FP").unwrap();

        assert_eq!(before.patient.first_name, "");
        assert_eq!(w.draft().patient.first_name, "Chikondi");
        assert_eq!(w.draft().patient.sex, Some(Sex::FemalePregnant));
        assert_eq!(w.version(), 2);
    }

    #[test]
    fn unknown_path_is_reported() {
        let mut w = wizard();
        let err = w.update_path("nickname", "Chi").expect_err("no such field");
        assert!(matches!(err, CoreError::UnknownField(p) if p == "nickname"));
        assert_eq!(w.version(), 0);
    }

    #[test]
    fn incomplete_commit_leaves_the_draft_alone() {
        let mut w = wizard();
        w.stage_with::<MonitoringTest>(|t| t.result = "Detected".into())
            .unwrap();
        for _ in 0..3 {
            assert_eq!(
                w.commit::<MonitoringTest>().unwrap(),
                CommitOutcome::Retained
            );
        }
        assert!(w.draft().patient.tests.is_empty());
        assert_eq!(w.staged::<MonitoringTest>().result, "Detected");
        assert_eq!(w.version(), 0);
    }

    #[test]
    fn remove_rewrites_only_the_target_collection() {
        let mut w = wizard();
        for drug in [4, 5, 6] {
            w.stage(TreatmentEpisode {
                drug1_id: LookupId::new(drug),
                start_date: "2023-01-01".into(),
                ..TreatmentEpisode::default()
            })
            .unwrap();
            w.commit::<TreatmentEpisode>().unwrap();
        }
        w.remove::<TreatmentEpisode>(1).unwrap();

        let drugs: Vec<u32> = w
            .draft()
            .patient
            .treatments
            .iter()
            .map(|t| t.drug1_id.get())
            .collect();
        assert_eq!(drugs, vec![4, 6]);

        let err = w.remove::<TreatmentEpisode>(2).expect_err("only two left");
        assert!(matches!(err, CoreError::IndexOutOfRange { index: 2, len: 2 }));
    }

    #[test]
    fn undo_restores_previous_versions_within_depth() {
        let cfg = CoreConfig::new(2, DispatchPolicy::LeavePartial, 2).unwrap();
        let mut w = IntakeWizard::open(Arc::new(cfg));
        for name in ["A", "B", "C"] {
            w.update(DraftField::LastName(name.into())).unwrap();
        }

        w.undo().unwrap();
        assert_eq!(w.draft().patient.last_name, "B");
        w.undo().unwrap();
        assert_eq!(w.draft().patient.last_name, "A");
        assert!(matches!(w.undo(), Err(CoreError::NothingToUndo)));
    }

    #[test]
    fn zero_undo_depth_disables_history() {
        let cfg = CoreConfig::new(2, DispatchPolicy::LeavePartial, 0).unwrap();
        let mut w = IntakeWizard::open(Arc::new(cfg));
        w.update(DraftField::LastName("Banda".into())).unwrap();
        assert!(!w.can_undo());
    }

    #[test]
    fn submission_is_single_flight() {
        let mut w = wizard();
        at_review(&mut w);
        let ticket = w.begin_submission().expect("first submission starts");

        assert!(matches!(w.begin_submission(), Err(CoreError::SubmissionInFlight)));
        assert!(matches!(
            w.update(DraftField::FirstName("late".into())),
            Err(CoreError::SubmissionInFlight)
        ));

        let receipt = SubmitReceipt {
            created: true,
            application_id: Some(ApplicationId::new(3).unwrap()),
        };
        w.finish_submission(ticket, Ok(receipt)).expect("completes");
        assert!(matches!(w.phase(), WizardPhase::Submitted { .. }));
        assert!(matches!(w.begin_submission(), Err(CoreError::AlreadySubmitted)));
    }

    #[test]
    fn dropped_ticket_releases_the_wizard() {
        let mut w = wizard();
        at_review(&mut w);
        let ticket = w.begin_submission().expect("starts");
        assert!(matches!(w.undo(), Err(CoreError::SubmissionInFlight)));

        drop(ticket);
        assert_eq!(w.phase(), WizardPhase::Editing);
        w.update(DraftField::LastName("Banda".into()))
            .expect("edits accepted again");
        let retry = w.begin_submission().expect("fresh submission");
        assert_eq!(w.phase(), WizardPhase::Submitting { attempt: retry.attempt() });
    }

    #[test]
    fn restarted_submission_gets_a_fresh_attempt() {
        let mut w = wizard();
        at_review(&mut w);
        let first = w.begin_submission().expect("starts");
        let first_attempt = first.attempt();
        drop(first);

        let second = w.begin_submission().expect("restarts");
        assert_ne!(second.attempt(), first_attempt);
        let receipt = SubmitReceipt {
            created: true,
            application_id: Some(ApplicationId::new(8).unwrap()),
        };
        w.finish_submission(second, Ok(receipt)).expect("completes");
        assert_eq!(
            w.phase(),
            WizardPhase::Submitted {
                application_id: Some(ApplicationId::new(8).unwrap())
            }
        );
    }

    #[test]
    fn staged_fields_accept_raw_form_input() {
        let mut w = wizard();
        w.stage_path::<ArtInterruption>("dateStopped", "2024-02-10")
            .unwrap();
        w.stage_path::<ArtInterruption>("duration", "2").unwrap();
        w.stage_path::<ArtInterruption>("durationNumber", " 3 ")
            .unwrap();
        w.stage_path::<ArtInterruption>("reasonForStopping", "Stock-out")
            .unwrap();
        assert_eq!(*w.staged::<ArtInterruption>(), interruption("2024-02-10", "Stock-out"));

        w.stage_path::<ArtInterruption>("duration", "").unwrap();
        assert!(!w.staged::<ArtInterruption>().duration.is_set());

        let err = w
            .stage_path::<ArtInterruption>("durationNumber", "three")
            .expect_err("not numeric");
        assert!(matches!(err, CoreError::Records(_)));
        assert_eq!(w.staged::<ArtInterruption>().duration_number, 3);

        let err = w
            .stage_path::<TbEpisode>("drug1Id", "4")
            .expect_err("treatment field on a TB episode");
        assert!(matches!(err, CoreError::UnknownField(f) if f == "drug1Id"));
        assert_eq!(w.version(), 0, "staging never touches the draft");
    }

    #[test]
    fn submit_requires_the_review_step() {
        let mut w = wizard();
        assert!(matches!(w.begin_submission(), Err(CoreError::NotAtReviewStep)));
        assert_eq!(w.phase(), WizardPhase::Editing);
    }

    #[tokio::test]
    async fn failed_submission_keeps_draft_and_step_for_retry() {
        let store = InMemoryStore::new();
        store.set_submit_fault(Some(SubmitFault::Unavailable)).await;

        let mut w = wizard();
        w.update(DraftField::NationalId("MW-1234".into())).unwrap();
        at_review(&mut w);
        let before = w.snapshot();

        let err = w.submit(&store).await.expect_err("collaborator down");
        assert!(matches!(err, CoreError::Store(_)));
        assert_eq!(*w.snapshot(), *before);
        assert_eq!(w.step(), WizardStep::Review);
        assert_eq!(w.phase(), WizardPhase::Editing);

        store.set_submit_fault(Some(SubmitFault::NotCreated)).await;
        let err = w.submit(&store).await.expect_err("not created");
        assert!(matches!(err, CoreError::NotCreated));

        store.set_submit_fault(None).await;
        let receipt = w.submit(&store).await.expect("retry succeeds");
        assert!(receipt.created);
        assert_eq!(store.submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_submit_leaves_the_wizard_editable() {
        let store = InMemoryStore::new();
        store.set_submit_fault(Some(SubmitFault::Stall)).await;

        let mut w = wizard();
        at_review(&mut w);
        tokio::select! {
            biased;
            _ = w.submit(&store) => panic!("a stalled collaborator never answers"),
            _ = std::future::ready(()) => {}
        }

        assert_eq!(w.phase(), WizardPhase::Editing);
        w.update(DraftField::NationalId("MW-5678".into()))
            .expect("edits accepted after cancellation");

        store.set_submit_fault(None).await;
        let receipt = w.submit(&store).await.expect("resubmits");
        assert!(receipt.created);
        assert_eq!(store.submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_facility_reload_keeps_the_loaded_list() {
        let store = InMemoryStore::new().with_facilities(vec![Facility {
            id: FacilityId::new(2).unwrap(),
            name: "Zomba Central Hospital".into(),
        }]);
        let mut w = wizard();
        w.load_facilities(&store).await.expect("loads");

        store.fail_lookups(true).await;
        let err = w.load_facilities(&store).await.expect_err("lookup down");
        assert!(matches!(err, CoreError::Store(StoreError::Unavailable(_))));
        assert_eq!(w.facilities().len(), 1);
        assert_eq!(w.facilities()[0].name, "Zomba Central Hospital");
    }

    #[tokio::test]
    async fn facilities_are_loaded_from_the_collaborator() {
        let store = InMemoryStore::new().with_facilities(vec![Facility {
            id: FacilityId::new(1).unwrap(),
            name: "Kamuzu Central Hospital".into(),
        }]);
        let mut w = wizard();
        let facilities = w.load_facilities(&store).await.expect("loads");
        assert_eq!(facilities.len(), 1);

        w.update_path("facilityId", "1").unwrap();
        assert_eq!(w.draft().facility_id, Some(FacilityId::new(1).unwrap()));
    }
}
