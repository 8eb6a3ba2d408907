// src/core/run.rs — Run orchestration: dispatch, rollup, finalization

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::StreamExt;
use tracing::{debug, error, info};

use super::types::{EvalItem, Evaluation, EvaluationRun, RunStatus, Verdict};
use super::{prompt, resolver, verdict};
use crate::infra::errors::GavelError;
use crate::provider::invoker::ModelInvoker;
use crate::store::{AssignmentStore, EvaluationStore, JudgeStore, SubmissionStore};

/// Tuning for one orchestration pass.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Max in-flight model calls. 1 reproduces strictly sequential dispatch.
    pub concurrency: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Used when a judge record does not name a model.
    pub default_model: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            temperature: 0.1,
            max_tokens: 1024,
            default_model: String::new(),
        }
    }
}

/// Cooperative cancellation for an in-flight run. Cancelling stops new
/// dispatches from being issued; in-flight calls finish and their records
/// are still persisted.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one dispatched triple, joined back into the run record.
struct DispatchOutcome {
    item: EvalItem,
    result: Result<verdict::ParsedVerdict, GavelError>,
    elapsed_ms: u64,
}

/// Drives one evaluation pass over a queue: resolve the worklist, dispatch
/// every triple through render → invoke → parse, persist one evaluation
/// record per triple, and finalize the run exactly once.
///
/// The runner task is the single writer of the run's counters; worker
/// outcomes are joined back here one at a time regardless of dispatch
/// concurrency.
pub struct EvaluationRunner {
    invoker: ModelInvoker,
    options: RunOptions,
}

impl EvaluationRunner {
    pub fn new(invoker: ModelInvoker, options: RunOptions) -> Self {
        Self { invoker, options }
    }

    /// The caller-facing entry point. Blocks until the run is terminal and
    /// returns the finalized run record.
    ///
    /// Re-invoking for the same queue creates a new run and a fresh batch
    /// of evaluation records; prior runs are never deduplicated against.
    /// Per-triple provider and parse failures are captured as data on the
    /// evaluation rows; only a resolution failure produces an `Err`, with
    /// the run record finalized as `failed` first.
    pub async fn run_evaluations<S>(
        &self,
        queue_id: &str,
        store: &S,
    ) -> Result<EvaluationRun, GavelError>
    where
        S: SubmissionStore + JudgeStore + AssignmentStore + EvaluationStore,
    {
        self.run_with_cancel(queue_id, store, &CancelFlag::new())
            .await
    }

    pub async fn run_with_cancel<S>(
        &self,
        queue_id: &str,
        store: &S,
        cancel: &CancelFlag,
    ) -> Result<EvaluationRun, GavelError>
    where
        S: SubmissionStore + JudgeStore + AssignmentStore + EvaluationStore,
    {
        let mut run = EvaluationRun::new(queue_id);
        store.insert_run(&run)?;
        info!(run_id = %run.id, queue_id, "evaluation run started");

        let items = match resolver::resolve(queue_id, store, store, store) {
            Ok(items) => items,
            Err(e) => {
                // Fatal: no evaluations attempted, run goes straight to failed
                error!(run_id = %run.id, "worklist resolution failed: {e}");
                let done = Utc::now();
                run.status = RunStatus::Failed;
                run.completed_at = Some(done);
                store.finalize_run(&run.id, RunStatus::Failed, done)?;
                return Err(e);
            }
        };

        run.total_evaluations = items.len() as u32;
        store.set_run_total(&run.id, run.total_evaluations)?;

        match self.dispatch_all(&mut run, items, store, cancel).await {
            Ok(()) => {
                // Every dispatched triple has a persisted outcome; an
                // all-failures run is still a completed run.
                let done = Utc::now();
                run.status = RunStatus::Completed;
                run.completed_at = Some(done);
                store.finalize_run(&run.id, RunStatus::Completed, done)?;
                info!(
                    run_id = %run.id,
                    total = run.total_evaluations,
                    completed = run.completed_evaluations,
                    failed = run.failed_evaluations,
                    "evaluation run completed"
                );
                Ok(run)
            }
            Err(e) => {
                // Persistence broke mid-run; don't leave the record running
                error!(run_id = %run.id, "run aborted: {e}");
                let done = Utc::now();
                run.status = RunStatus::Failed;
                run.completed_at = Some(done);
                store.finalize_run(&run.id, RunStatus::Failed, done)?;
                Err(e)
            }
        }
    }

    /// Dispatch every triple through a bounded worker pool and join the
    /// outcomes into the run record. Returns only once all issued dispatches
    /// have a persisted outcome.
    async fn dispatch_all<S>(
        &self,
        run: &mut EvaluationRun,
        items: Vec<EvalItem>,
        store: &S,
        cancel: &CancelFlag,
    ) -> Result<(), GavelError>
    where
        S: EvaluationStore,
    {
        let mut outcomes = futures::stream::iter(items)
            .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
            .map(|item| self.dispatch_one(item))
            .buffer_unordered(self.options.concurrency.max(1));

        while let Some(outcome) = outcomes.next().await {
            self.record_outcome(run, outcome, store)?;
        }
        Ok(())
    }

    /// One triple: render → invoke → parse. Never touches the store.
    async fn dispatch_one(&self, item: EvalItem) -> DispatchOutcome {
        let text = prompt::render(&item.judge.instructions, &item.question, item.answer.as_ref());
        let model_id = if item.judge.model_id.is_empty() {
            self.options.default_model.as_str()
        } else {
            item.judge.model_id.as_str()
        };

        let started = Instant::now();
        let result = match self
            .invoker
            .invoke(
                &text,
                model_id,
                self.options.temperature,
                self.options.max_tokens,
            )
            .await
        {
            Ok(invocation) => verdict::parse(&invocation.raw_text),
            Err(e) => Err(e),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        DispatchOutcome {
            item,
            result,
            elapsed_ms,
        }
    }

    /// Persist one evaluation record and advance exactly one counter.
    fn record_outcome<S>(
        &self,
        run: &mut EvaluationRun,
        outcome: DispatchOutcome,
        store: &S,
    ) -> Result<(), GavelError>
    where
        S: EvaluationStore,
    {
        let (verdict, reasoning, error): (Option<Verdict>, Option<String>, Option<String>) =
            match outcome.result {
                Ok(parsed) => {
                    run.completed_evaluations += 1;
                    (Some(parsed.verdict), Some(parsed.reasoning), None)
                }
                Err(e) => {
                    run.failed_evaluations += 1;
                    debug!(
                        submission_id = %outcome.item.submission_id,
                        question_id = %outcome.item.question.id,
                        judge_id = %outcome.item.judge.id,
                        "evaluation dispatch failed: {e}"
                    );
                    (None, None, Some(e.to_string()))
                }
            };

        store.insert_evaluation(&Evaluation {
            id: uuid::Uuid::new_v4().to_string(),
            submission_id: outcome.item.submission_id,
            question_id: outcome.item.question.id,
            judge_id: outcome.item.judge.id,
            verdict,
            reasoning,
            error,
            execution_time_ms: Some(outcome.elapsed_ms),
            created_at: Utc::now(),
        })?;
        store.update_run_progress(&run.id, run.completed_evaluations, run.failed_evaluations)?;
        Ok(())
    }
}
