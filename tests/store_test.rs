// tests/store_test.rs — Integration test: SQLite round-trip (store CRUD)

use chrono::Utc;
use pretty_assertions::assert_eq;

use gavel::core::types::{
    Answer, Evaluation, EvaluationRun, Judge, Question, QuestionKind, RunStatus, Submission,
    Verdict,
};
use gavel::store::{EvaluationStore, JudgeStore, Store, SubmissionStore};

fn test_store() -> Store {
    Store::open_in_memory().unwrap()
}

fn question(id: &str, kind: QuestionKind, text: &str) -> Question {
    Question {
        id: id.into(),
        kind,
        text: text.into(),
    }
}

fn evaluation(submission_id: &str, question_id: &str, judge_id: &str) -> Evaluation {
    Evaluation {
        id: uuid::Uuid::new_v4().to_string(),
        submission_id: submission_id.into(),
        question_id: question_id.into(),
        judge_id: judge_id.into(),
        verdict: Some(Verdict::Pass),
        reasoning: Some("fine".into()),
        error: None,
        execution_time_ms: Some(12),
        created_at: Utc::now(),
    }
}

#[test]
fn test_open_creates_db_file_and_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("gavel.db");

    let store = Store::open(&path).unwrap();
    let judge = Judge::new("disk", "i", "m");
    store.insert_judge(&judge).unwrap();
    drop(store);

    assert!(path.exists());
    // reopening runs no migrations twice and finds the data
    let reopened = Store::open(&path).unwrap();
    assert!(reopened.get_judge(&judge.id).unwrap().is_some());
}

#[test]
fn test_submission_round_trip() {
    let store = test_store();

    let submission = Submission::new(
        "q1",
        vec![
            question("qu1", QuestionKind::SingleChoice, "Pick one."),
            question("qu2", QuestionKind::FreeForm, "Explain."),
        ],
    )
    .with_answer("qu1", Answer::SingleChoice { choice: Some("A".into()) })
    .with_answer(
        "qu2",
        Answer::FreeForm {
            response: Some("Because reasons.".into()),
        },
    );
    store.insert_submission(&submission).unwrap();

    let loaded = store.submissions_for_queue("q1").unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, submission.id);
    // embedded question order survives the round trip
    assert_eq!(loaded[0].questions[0].id, "qu1");
    assert_eq!(loaded[0].questions[1].id, "qu2");
    assert_eq!(loaded[0].answers.len(), 2);

    assert!(store.submissions_for_queue("other-queue").unwrap().is_empty());
}

#[test]
fn test_judge_crud_and_soft_disable() {
    let store = test_store();
    let judge = Judge::new("strict", "Grade strictly.", "gpt-4o-mini");
    store.insert_judge(&judge).unwrap();

    let loaded = store.get_judge(&judge.id).unwrap().unwrap();
    assert!(loaded.active);
    assert_eq!(loaded.name, "strict");

    store.set_judge_active(&judge.id, false).unwrap();
    let disabled = store.get_judge(&judge.id).unwrap().unwrap();
    assert!(!disabled.active);
    assert!(disabled.updated_at >= loaded.updated_at);

    store
        .update_judge_instructions(&judge.id, "Grade very strictly.")
        .unwrap();
    let updated = store.get_judge(&judge.id).unwrap().unwrap();
    assert_eq!(updated.instructions, "Grade very strictly.");

    assert!(store.get_judge("nope").unwrap().is_none());
}

#[test]
fn test_replace_assignments_is_set_replacement() {
    let store = test_store();
    let j1 = Judge::new("a", "i", "m");
    let j2 = Judge::new("b", "i", "m");
    let j3 = Judge::new("c", "i", "m");
    for j in [&j1, &j2, &j3] {
        store.insert_judge(j).unwrap();
    }

    store
        .replace_assignments("q1", "qu1", &[j1.id.clone(), j2.id.clone()])
        .unwrap();
    // replacement, not addition: j1/j2 go away
    store
        .replace_assignments("q1", "qu1", &[j3.id.clone()])
        .unwrap();

    let assignments = store.assignments_for_queue("q1").unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].judge_id, j3.id);
}

#[test]
fn test_replace_assignments_empty_clears_pair() {
    let store = test_store();
    let j1 = Judge::new("a", "i", "m");
    store.insert_judge(&j1).unwrap();
    store
        .replace_assignments("q1", "qu1", &[j1.id.clone()])
        .unwrap();
    store.replace_assignments("q1", "qu1", &[]).unwrap();
    assert!(store.assignments_for_queue("q1").unwrap().is_empty());
}

#[test]
fn test_delete_judge_cascades_assignments_keeps_evaluations() {
    let store = test_store();
    let judge = Judge::new("a", "i", "m");
    store.insert_judge(&judge).unwrap();

    let submission = Submission::new("q1", vec![question("qu1", QuestionKind::FreeForm, "?")]);
    store.insert_submission(&submission).unwrap();
    store
        .replace_assignments("q1", "qu1", &[judge.id.clone()])
        .unwrap();
    store
        .insert_evaluation(&evaluation(&submission.id, "qu1", &judge.id))
        .unwrap();

    store.delete_judge(&judge.id).unwrap();

    assert!(store.assignments_for_queue("q1").unwrap().is_empty());
    // historical evaluations stay queryable after the judge is gone
    let evals = store.evaluations_for_submission(&submission.id).unwrap();
    assert_eq!(evals.len(), 1);
    assert_eq!(evals[0].judge_id, judge.id);
}

#[test]
fn test_delete_submission_cascades_evaluations() {
    let store = test_store();
    let submission = Submission::new("q1", vec![question("qu1", QuestionKind::FreeForm, "?")]);
    store.insert_submission(&submission).unwrap();
    store
        .insert_evaluation(&evaluation(&submission.id, "qu1", "j1"))
        .unwrap();

    store.delete_submission(&submission.id).unwrap();

    assert!(store.submissions_for_queue("q1").unwrap().is_empty());
    assert!(store
        .evaluations_for_submission(&submission.id)
        .unwrap()
        .is_empty());
}

#[test]
fn test_failed_evaluation_round_trip() {
    let store = test_store();
    let submission = Submission::new("q1", vec![question("qu1", QuestionKind::FreeForm, "?")]);
    store.insert_submission(&submission).unwrap();

    let mut eval = evaluation(&submission.id, "qu1", "j1");
    eval.verdict = None;
    eval.reasoning = None;
    eval.error = Some("Provider 'x' error: HTTP 500".into());
    store.insert_evaluation(&eval).unwrap();

    let loaded = store.evaluations_for_submission(&submission.id).unwrap();
    assert_eq!(loaded[0].verdict, None);
    assert_eq!(loaded[0].error.as_deref(), Some("Provider 'x' error: HTTP 500"));
}

#[test]
fn test_run_lifecycle_and_exactly_once_finalization() {
    let store = test_store();
    let run = EvaluationRun::new("q1");
    store.insert_run(&run).unwrap();

    store.set_run_total(&run.id, 3).unwrap();
    store.update_run_progress(&run.id, 1, 0).unwrap();
    store.update_run_progress(&run.id, 2, 1).unwrap();

    let first_done = Utc::now();
    store
        .finalize_run(&run.id, RunStatus::Completed, first_done)
        .unwrap();

    // a second finalization must not move the stamp or flip the status
    store
        .finalize_run(&run.id, RunStatus::Failed, Utc::now())
        .unwrap();
    // nor may counters move after the terminal transition
    store.update_run_progress(&run.id, 99, 99).unwrap();
    store.set_run_total(&run.id, 99).unwrap();

    let loaded = store.get_run(&run.id).unwrap().unwrap();
    assert_eq!(loaded.status, RunStatus::Completed);
    assert_eq!(loaded.total_evaluations, 3);
    assert_eq!(loaded.completed_evaluations, 2);
    assert_eq!(loaded.failed_evaluations, 1);
    assert_eq!(
        loaded.completed_at.unwrap().timestamp(),
        first_done.timestamp()
    );
}

#[test]
fn test_recent_runs_newest_first() {
    let store = test_store();
    let mut older = EvaluationRun::new("q1");
    older.started_at = Utc::now() - chrono::Duration::minutes(5);
    let newer = EvaluationRun::new("q2");
    store.insert_run(&older).unwrap();
    store.insert_run(&newer).unwrap();

    let runs = store.recent_runs(10).unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].id, newer.id);
    assert_eq!(runs[1].id, older.id);

    assert_eq!(store.recent_runs(1).unwrap().len(), 1);
}
