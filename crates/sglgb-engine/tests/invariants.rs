//! Property tests: lifecycle invariants hold under arbitrary operation
//! sequences, and rejected operations leave the assessment untouched.

use chrono::Utc;
use proptest::prelude::*;
use sglgb_engine::{compute_validation, StateMachine};
use sglgb_types::*;

#[derive(Clone, Debug)]
enum Op {
    SetAnswer(usize, ComplianceAnswer),
    Attach(usize),
    Remove(usize),
    Record(usize, Option<ValidationStatus>, bool),
    Close,
    Submit,
    Finalize,
}

fn answer() -> impl Strategy<Value = ComplianceAnswer> {
    prop_oneof![
        Just(ComplianceAnswer::Yes),
        Just(ComplianceAnswer::No),
        Just(ComplianceAnswer::NotApplicable),
    ]
}

fn verdict() -> impl Strategy<Value = Option<ValidationStatus>> {
    prop_oneof![
        3 => Just(Some(ValidationStatus::Pass)),
        1 => Just(Some(ValidationStatus::Fail)),
        1 => Just(Some(ValidationStatus::Conditional)),
        1 => Just(None),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..7usize, answer()).prop_map(|(i, a)| Op::SetAnswer(i, a)),
        2 => (0..7usize).prop_map(Op::Attach),
        1 => (0..7usize).prop_map(Op::Remove),
        4 => (0..7usize, verdict(), any::<bool>()).prop_map(|(i, v, c)| Op::Record(i, v, c)),
        1 => Just(Op::Close),
        2 => Just(Op::Submit),
        1 => Just(Op::Finalize),
    ]
}

fn blgu() -> Actor {
    Actor::blgu("blgu", &BarangayId::new("b-1"))
}

fn mov() -> MovFile {
    MovFile {
        id: MovFileId::generate(),
        filename: "evidence.pdf".into(),
        size: 1,
        content_type: "application/pdf".into(),
        storage_path: "mem/evidence.pdf".into(),
        uploaded_at: Utc::now(),
        uploaded_by: UserId::new("blgu"),
    }
}

fn apply(sm: &StateMachine, a: &mut Assessment, op: &Op) -> LifecycleResult<()> {
    let now = Utc::now();
    match op {
        Op::SetAnswer(i, answer) => {
            let id = a.responses[*i].id.clone();
            sm.set_answer(a, &blgu(), &id, *answer, now)
        }
        Op::Attach(i) => {
            let id = a.responses[*i].id.clone();
            sm.attach_evidence(a, &blgu(), &id, mov(), now)
        }
        Op::Remove(i) => {
            let response = &a.responses[*i];
            let id = response.id.clone();
            let file_id = response
                .mov_files
                .first()
                .map(|f| f.id.clone())
                .unwrap_or_else(|| MovFileId::new("absent"));
            sm.remove_evidence(a, &blgu(), &id, &file_id, now).map(|_| ())
        }
        Op::Record(i, status, with_comment) => {
            let response = &a.responses[*i];
            let id = response.id.clone();
            let assessor = Actor::assessor("assessor", &response.governance_area_id);
            let comment = with_comment.then(|| "please revise".to_string());
            sm.record_validation(a, &assessor, &id, *status, comment, None, now)
                .map(|_| ())
        }
        Op::Close => sm.close_review(a, &Actor::admin("admin"), now).map(|_| ()),
        Op::Submit => sm.submit(a, &blgu(), now),
        Op::Finalize => sm.finalize(a, &Actor::admin("admin"), now).map(|_| ()),
    }
}

fn check_invariants(a: &Assessment) {
    if matches!(
        a.status,
        AssessmentStatus::Validated | AssessmentStatus::Finalized
    ) {
        assert_eq!(a.validations.len(), a.responses.len());
        assert!(a.validations.values().all(|v| v.is_pass()));
    }

    for record in a.validations.values() {
        if record.status() == Some(ValidationStatus::Conditional) {
            assert!(record.public_comment().is_some_and(|c| !c.trim().is_empty()));
        }
    }

    for response in &a.responses {
        if response.status() == ResponseStatus::Completed {
            assert!(response.answer.is_some());
            assert!(
                response.answer != Some(ComplianceAnswer::Yes)
                    || !response.mov_files.is_empty()
            );
        }
        if response.is_flagged_for_rework() {
            assert_eq!(a.status, AssessmentStatus::NeedsRework);
        }
    }

    assert_eq!(a.status == AssessmentStatus::Finalized, a.seal.is_some());
    if a.status == AssessmentStatus::Submitted {
        assert!(a.submitted_at.is_some());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn lifecycle_invariants_hold(ops in prop::collection::vec(op(), 1..80)) {
        let sm = StateMachine::default();
        let mut a = Assessment::create(
            BarangayId::new("b-1"),
            PeriodId::new("p-1"),
            &IndicatorCatalogue::builtin(),
            &Actor::admin("admin"),
        );

        for op in &ops {
            let before = a.clone();
            if apply(&sm, &mut a, op).is_err() {
                prop_assert_eq!(&a, &before, "rejected {:?} changed the assessment", op);
            }
            check_invariants(&a);
        }
    }

    #[test]
    fn submission_gate_matches_submit(ops in prop::collection::vec(op(), 0..40)) {
        let sm = StateMachine::default();
        let mut a = Assessment::create(
            BarangayId::new("b-1"),
            PeriodId::new("p-1"),
            &IndicatorCatalogue::builtin(),
            &Actor::admin("admin"),
        );
        for op in &ops {
            let _ = apply(&sm, &mut a, op);
        }

        let summary = compute_validation(&a);
        let result = sm.submit(&mut a.clone(), &blgu(), Utc::now());
        if a.status.is_unlocked() {
            prop_assert_eq!(summary.can_submit, result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }

    #[test]
    fn finalized_assessments_reject_every_mutation(op in op()) {
        let sm = StateMachine::default();
        let mut a = Assessment::create(
            BarangayId::new("b-1"),
            PeriodId::new("p-1"),
            &IndicatorCatalogue::builtin(),
            &Actor::admin("admin"),
        );
        let ids: Vec<ResponseId> = a.responses.iter().map(|r| r.id.clone()).collect();
        for id in &ids {
            sm.set_answer(&mut a, &blgu(), id, ComplianceAnswer::No, Utc::now()).unwrap();
        }
        sm.submit(&mut a, &blgu(), Utc::now()).unwrap();
        for response in a.responses.clone() {
            let assessor = Actor::assessor("assessor", &response.governance_area_id);
            sm.record_validation(&mut a, &assessor, &response.id, Some(ValidationStatus::Pass), None, None, Utc::now())
                .unwrap();
        }
        sm.close_review(&mut a, &Actor::admin("admin"), Utc::now()).unwrap();
        sm.finalize(&mut a, &Actor::admin("admin"), Utc::now()).unwrap();

        let before = a.clone();
        let err = apply(&sm, &mut a, &op).unwrap_err();
        prop_assert!(
            matches!(err, LifecycleError::AssessmentFinalized { .. } | LifecycleError::EvidenceNotFound { .. }),
            "unexpected error {:?}", err
        );
        prop_assert_eq!(a, before);
    }
}
