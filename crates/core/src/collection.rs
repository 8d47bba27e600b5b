//! Collection editors for the repeatable sub-collections of a patient draft.
//!
//! Responsibilities:
//! - Hold one staged candidate per collection, isolated from the committed entries
//! - Append the candidate when it passes its kind's completeness predicate
//! - Remove committed entries by position
//!
//! Committed sequences are never modified in place: every operation returns a new sequence and
//! the caller swaps it into the draft. An incomplete candidate is not an error; the commit is a
//! no-op and the candidate stays staged for correction.

use crate::{CoreError, CoreResult};
use drt_records::SubCollectionEntry;

/// Result of attempting to commit a staged candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitOutcome<E> {
    /// The candidate was complete; this is the new committed sequence.
    Appended(Vec<E>),
    /// The candidate was incomplete; nothing changed.
    Retained,
}

impl<E> CommitOutcome<E> {
    pub fn is_appended(&self) -> bool {
        matches!(self, CommitOutcome::Appended(_))
    }
}

/// Append `candidate` to `committed` if it is complete.
pub fn commit_entry<E: SubCollectionEntry>(committed: &[E], candidate: &E) -> CommitOutcome<E> {
    if !candidate.is_complete() {
        return CommitOutcome::Retained;
    }
    let mut next = Vec::with_capacity(committed.len() + 1);
    next.extend_from_slice(committed);
    next.push(candidate.clone());
    CommitOutcome::Appended(next)
}

/// `committed` without the element at `index`, others in their original order.
///
/// # Errors
///
/// Returns [`CoreError::IndexOutOfRange`] if `index` is not a valid position.
pub fn remove_entry<E: Clone>(committed: &[E], index: usize) -> CoreResult<Vec<E>> {
    if index >= committed.len() {
        return Err(CoreError::IndexOutOfRange {
            index,
            len: committed.len(),
        });
    }
    Ok(committed
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, entry)| entry.clone())
        .collect())
}

/// Editor for one sub-collection kind: owns the staged candidate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectionEditor<E: SubCollectionEntry> {
    staged: E,
}

impl<E: SubCollectionEntry> CollectionEditor<E> {
    pub fn new() -> Self {
        Self {
            staged: E::default(),
        }
    }

    /// Replace the staged candidate. No validation happens here.
    pub fn stage(&mut self, candidate: E) {
        self.staged = candidate;
    }

    /// Edit the staged candidate in place.
    pub fn stage_with(&mut self, edit: impl FnOnce(&mut E)) {
        edit(&mut self.staged);
    }

    pub fn staged(&self) -> &E {
        &self.staged
    }

    /// Commit the staged candidate against `committed`.
    ///
    /// On success the staged candidate is reset to its empty default. On rejection it is kept.
    pub fn commit(&mut self, committed: &[E]) -> CommitOutcome<E> {
        let outcome = commit_entry(committed, &self.staged);
        match &outcome {
            CommitOutcome::Appended(entries) => {
                tracing::info!(kind = %E::KIND, len = entries.len(), "entry committed");
                self.staged = E::default();
            }
            CommitOutcome::Retained => {
                tracing::debug!(kind = %E::KIND, "incomplete entry retained");
            }
        }
        outcome
    }

    pub fn remove_at(&self, committed: &[E], index: usize) -> CoreResult<Vec<E>> {
        remove_entry(committed, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drt_records::{AdherenceVisit, LookupId, MonitoringTest, TreatmentEpisode};
    use proptest::prelude::*;

    fn test_entry(kind: u32, date: &str, result: &str) -> MonitoringTest {
        MonitoringTest {
            test_type_id: LookupId::new(kind),
            test_date: date.into(),
            result: result.into(),
        }
    }

    #[test]
    fn complete_candidate_is_appended_and_staging_reset() {
        let mut editor = CollectionEditor::<MonitoringTest>::new();
        editor.stage(test_entry(2, "2025-01-04", "1200 copies/ml"));

        let CommitOutcome::Appended(entries) = editor.commit(&[]) else {
            panic!("expected the complete test to be appended");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].result, "1200 copies/ml");
        assert_eq!(editor.staged(), &MonitoringTest::default());
    }

    #[test]
    fn incomplete_candidate_is_retained() {
        let mut editor = CollectionEditor::<TreatmentEpisode>::new();
        editor.stage_with(|t| t.start_date = "2024-06-01".into());

        assert_eq!(editor.commit(&[]), CommitOutcome::Retained);
        assert_eq!(editor.staged().start_date, "2024-06-01", "kept for correction");

        editor.stage_with(|t| t.drug1_id = LookupId::new(11));
        assert!(editor.commit(&[]).is_appended());
    }

    #[test]
    fn committed_input_is_not_modified() {
        let committed = vec![test_entry(1, "2025-01-01", "a")];
        let outcome = commit_entry(&committed, &test_entry(3, "2025-02-01", "b"));
        assert!(outcome.is_appended());
        assert_eq!(committed.len(), 1);
    }

    #[test]
    fn adherence_visit_with_zero_missed_doses_is_complete() {
        let visit = AdherenceVisit {
            scheduled_visit_date: "2025-03-01".into(),
            actual_visit_date: "2025-03-03".into(),
            dose_missed: 0,
            ..AdherenceVisit::default()
        };
        assert!(commit_entry(&[], &visit).is_appended());
    }

    #[test]
    fn remove_out_of_range_fails() {
        let committed = vec![test_entry(1, "2025-01-01", "a")];
        let err = remove_entry(&committed, 1).expect_err("only index 0 exists");
        assert!(matches!(err, CoreError::IndexOutOfRange { index: 1, len: 1 }));

        let err = remove_entry::<MonitoringTest>(&[], 0).expect_err("empty");
        assert!(matches!(err, CoreError::IndexOutOfRange { index: 0, len: 0 }));
    }

    fn arb_test() -> impl Strategy<Value = MonitoringTest> {
        (1u32..20, "[0-9]{4}-[0-9]{2}-[0-9]{2}", "[a-z]{1,8}")
            .prop_map(|(kind, date, result)| test_entry(kind, &date, &result))
    }

    fn arb_incomplete_test() -> impl Strategy<Value = MonitoringTest> {
        (0u32..3, prop::bool::ANY, prop::bool::ANY).prop_map(|(kind, has_date, has_result)| {
            let date = if has_date { "2025-01-01" } else { "" };
            // at least one required part must be missing
            let result = if has_result && (kind == 0 || !has_date) { "x" } else { "" };
            test_entry(kind, date, result)
        })
    }

    proptest! {
        #[test]
        fn rejected_commits_never_change_length(
            committed in prop::collection::vec(arb_test(), 0..6),
            candidate in arb_incomplete_test(),
            attempts in 1usize..10,
        ) {
            let mut editor = CollectionEditor::new();
            editor.stage(candidate.clone());
            for _ in 0..attempts {
                prop_assert_eq!(editor.commit(&committed), CommitOutcome::Retained);
            }
            prop_assert_eq!(editor.staged(), &candidate);
        }

        #[test]
        fn remove_preserves_relative_order(
            entries in prop::collection::vec(arb_test(), 1..12),
            pick in any::<prop::sample::Index>(),
        ) {
            let mut editor = CollectionEditor::new();
            let mut committed: Vec<MonitoringTest> = Vec::new();
            for entry in &entries {
                editor.stage(entry.clone());
                match editor.commit(&committed) {
                    CommitOutcome::Appended(next) => committed = next,
                    CommitOutcome::Retained => prop_assert!(false, "complete entry rejected"),
                }
            }

            let index = pick.index(committed.len());
            let after = editor.remove_at(&committed, index).unwrap();

            let mut expected = entries.clone();
            expected.remove(index);
            prop_assert_eq!(after, expected);
        }
    }
}
