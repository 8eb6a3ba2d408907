// src/core/resolver.rs — Resolve a queue's assignments into a worklist

use tracing::warn;

use super::types::EvalItem;
use crate::infra::errors::GavelError;
use crate::store::{AssignmentStore, JudgeStore, SubmissionStore};

/// Enumerate every (submission, question, judge) triple that must be
/// evaluated for a queue.
///
/// Order is deterministic for a consistent store snapshot: submissions in
/// store order, questions in their embedded order, judges sorted by id.
/// Questions with no assigned judges contribute nothing; so do inactive
/// judges. An assignment pointing at a judge that no longer exists is a
/// data anomaly: logged and skipped, never fatal.
///
/// Store failures are fatal to resolution and reported as a single
/// `Resolution` error.
pub fn resolve(
    queue_id: &str,
    submissions: &dyn SubmissionStore,
    assignments: &dyn AssignmentStore,
    judges: &dyn JudgeStore,
) -> Result<Vec<EvalItem>, GavelError> {
    let subs = submissions
        .submissions_for_queue(queue_id)
        .map_err(|e| GavelError::Resolution(format!("loading submissions: {e}")))?;

    let mut items = Vec::new();
    for submission in &subs {
        for question in &submission.questions {
            let judge_ids = assignments
                .judges_for_question(queue_id, &question.id)
                .map_err(|e| GavelError::Resolution(format!("loading assignments: {e}")))?;

            for judge_id in judge_ids {
                let judge = judges
                    .get_judge(&judge_id)
                    .map_err(|e| GavelError::Resolution(format!("loading judge: {e}")))?;

                let judge = match judge {
                    Some(j) => j,
                    None => {
                        warn!(
                            queue_id,
                            question_id = %question.id,
                            judge_id = %judge_id,
                            "assignment references a missing judge, skipping"
                        );
                        continue;
                    }
                };
                if !judge.active {
                    continue;
                }

                items.push(EvalItem {
                    submission_id: submission.id.clone(),
                    question: question.clone(),
                    answer: submission.answers.get(&question.id).cloned(),
                    judge,
                });
            }
        }
    }
    Ok(items)
}
