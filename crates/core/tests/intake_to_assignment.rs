//! End-to-end flows through the public API against the in-memory collaborator.

use drt_core::{
    Advance, AssignmentDispatcher, CoreConfig, CoreError, DispatchPolicy, InMemoryStore,
    IntakeWizard, ReviewerDirectory, WizardPhase, WizardStep,
};
use drt_records::{
    ApplicationId, ArtInterruption, LookupId, MonitoringTest, Reviewer, ReviewerId,
    StatusEntry,
};
use std::sync::Arc;

fn reviewer(id: u64, first: &str, last: &str) -> Reviewer {
    Reviewer {
        id: ReviewerId::new(id).unwrap(),
        title: "Dr.".into(),
        first_name: first.into(),
        last_name: last.into(),
    }
}

async fn submitted_application(store: &InMemoryStore) -> ApplicationId {
    let mut wizard = IntakeWizard::open(Arc::new(CoreConfig::default()));
    wizard.update_path("firstname", "Thandiwe").unwrap();
    wizard.update_path("lastname", "Banda").unwrap();
    wizard.jump_to(7).unwrap();
    let receipt = wizard.submit(store).await.expect("submission accepted");
    receipt.application_id.expect("collaborator assigns an id")
}

#[tokio::test]
async fn age_is_submitted_when_date_of_birth_is_not_available() {
    let store = InMemoryStore::new();
    let mut wizard = IntakeWizard::open(Arc::new(CoreConfig::default()));

    wizard.update_path("dateOfBirth", "1990-04-02").unwrap();
    wizard.update_path("dateOfBirthEstimated", "0").unwrap();
    wizard.update_path("age", "34").unwrap();
    wizard.jump_to(7).unwrap();
    wizard.submit(&store).await.expect("submitted");

    let submissions = store.submissions().await;
    assert_eq!(submissions.len(), 1);
    let json = serde_json::to_value(&submissions[0]).unwrap();
    assert_eq!(json["patient"]["age"], 34);
    assert!(json["patient"].get("dateOfBirth").is_none());
    assert!(matches!(wizard.phase(), WizardPhase::Submitted { .. }));
}

#[tokio::test]
async fn full_intake_walk_with_gated_interruptions_step() {
    let store = InMemoryStore::new();
    let mut wizard = IntakeWizard::open(Arc::new(CoreConfig::default()));

    assert!(matches!(wizard.next(), Advance::Advanced(WizardStep::PatientInfo)));
    wizard.update_path("nationalId", "MW-00912").unwrap();
    wizard.update_path("gender", "FNP").unwrap();
    wizard.next();

    wizard
        .stage(MonitoringTest {
            test_type_id: LookupId::new(1),
            test_date: "2024-11-02".into(),
            result: "Detectable".into(),
        })
        .unwrap();
    assert!(wizard.commit::<MonitoringTest>().unwrap().is_appended());

    wizard.jump_to(5).unwrap();
    wizard
        .stage_with::<ArtInterruption>(|i| {
            i.date_stopped = "2024-06-01".into();
            i.duration = LookupId::new(2);
            i.duration_number = 3;
            i.reason_for_stopping = " ".into();
        })
        .unwrap();
    assert!(wizard.commit::<ArtInterruption>().unwrap().is_appended());
    assert!(matches!(wizard.next(), Advance::Refused(_)));

    wizard.remove::<ArtInterruption>(0).unwrap();
    assert!(matches!(wizard.next(), Advance::Advanced(WizardStep::Adherence)));
    assert!(matches!(wizard.next(), Advance::Advanced(WizardStep::Review)));

    wizard.submit(&store).await.expect("submitted");
    let err = wizard
        .update_path("firstname", "late edit")
        .expect_err("terminal");
    assert!(matches!(err, CoreError::AlreadySubmitted));

    let payload = &store.submissions().await[0];
    assert_eq!(payload.patient.test_monitoring.len(), 1);
    assert!(payload.patient.art_interruption.is_empty());
}

#[tokio::test]
async fn second_assignment_failure_leaves_only_the_first_record() {
    let store = Arc::new(InMemoryStore::new().with_reviewers(vec![
        reviewer(7, "Tom", "Mwale"),
        reviewer(9, "Grace", "Phiri"),
        reviewer(11, "Alinafe", "Tembo"),
    ]));
    let application = submitted_application(&store).await;
    let dispatcher = AssignmentDispatcher::new(Arc::new(CoreConfig::default()), Arc::clone(&store));

    let directory = ReviewerDirectory::load(store.as_ref()).await.unwrap();
    let mut selection = dispatcher.open_selection(application).await.unwrap();
    for r in directory.all() {
        selection.toggle(r.id);
    }
    selection.set_lead(ReviewerId::new(9).unwrap());

    store.fail_assignment_request(2).await;
    let err = dispatcher.dispatch(&selection).await.expect_err("second request fails");

    assert!(matches!(
        err,
        CoreError::PartialAssignment {
            rolled_back: false,
            ..
        }
    ));
    let records = store.assignments().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reviewer_id, ReviewerId::new(7).unwrap());
    assert_eq!(store.assignment_requests().await, 2, "third never attempted");
    assert_eq!(selection.len(), 3, "selection kept for retry");
}

#[tokio::test]
async fn compensating_policy_leaves_no_partial_panel() {
    let store = Arc::new(InMemoryStore::new());
    let application = submitted_application(&store).await;
    let cfg = CoreConfig::new(2, DispatchPolicy::Compensate, 32).unwrap();
    let dispatcher = AssignmentDispatcher::new(Arc::new(cfg), Arc::clone(&store));

    let mut selection = dispatcher.open_selection(application).await.unwrap();
    for id in [7, 9, 11] {
        selection.toggle(ReviewerId::new(id).unwrap());
    }
    selection.set_lead(ReviewerId::new(7).unwrap());

    store.fail_assignment_request(2).await;
    dispatcher.dispatch(&selection).await.expect_err("fails");
    assert!(store.assignments().await.is_empty());

    let report = dispatcher.dispatch(&selection).await.expect("retry succeeds");
    assert_eq!(report.receipts.len(), 3);
}

#[tokio::test]
async fn assigned_applications_cannot_be_reopened_for_selection() {
    let store = Arc::new(InMemoryStore::new());
    let application = submitted_application(&store).await;
    store
        .push_status(application, StatusEntry::new("Pending review", "2999-12-31"))
        .await
        .unwrap();

    let dispatcher = AssignmentDispatcher::new(Arc::new(CoreConfig::default()), store);
    let err = dispatcher
        .open_selection(application)
        .await
        .expect_err("no longer New");
    assert!(matches!(err, CoreError::NotAssignable { status } if status == "Pending review"));
}
