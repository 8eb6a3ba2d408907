// src/store/mod.rs — SQLite persistence

pub mod schema;

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::core::types::{
    Evaluation, EvaluationRun, Judge, JudgeAssignment, RunStatus, Submission, Verdict,
};

/// Read access to submissions. The pipeline never writes through this.
pub trait SubmissionStore {
    fn submissions_for_queue(&self, queue_id: &str) -> anyhow::Result<Vec<Submission>>;
}

/// Read access to judge records.
pub trait JudgeStore {
    fn get_judge(&self, id: &str) -> anyhow::Result<Option<Judge>>;
}

/// Read access to the (queue, question) → judges mapping.
pub trait AssignmentStore {
    /// Judge ids assigned to one question within a queue, sorted by id so
    /// resolution order is reproducible.
    fn judges_for_question(&self, queue_id: &str, question_id: &str)
        -> anyhow::Result<Vec<String>>;
}

/// Append-only evaluation records plus the run aggregate they roll up into.
pub trait EvaluationStore {
    fn insert_evaluation(&self, eval: &Evaluation) -> anyhow::Result<()>;
    fn insert_run(&self, run: &EvaluationRun) -> anyhow::Result<()>;
    fn set_run_total(&self, run_id: &str, total: u32) -> anyhow::Result<()>;
    fn update_run_progress(&self, run_id: &str, completed: u32, failed: u32)
        -> anyhow::Result<()>;
    /// Terminal transition. A no-op if the run was already finalized, so the
    /// completed_at stamp is written exactly once.
    fn finalize_run(
        &self,
        run_id: &str,
        status: RunStatus,
        completed_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    fn get_run(&self, run_id: &str) -> anyhow::Result<Option<EvaluationRun>>;
}

/// SQLite-backed store implementing every pipeline seam.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        schema::run_migrations(&conn)?;
        Ok(Self::new(conn))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::run_migrations(&conn)?;
        Ok(Self::new(conn))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // -- Submissions --

    pub fn insert_submission(&self, submission: &Submission) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO submissions (id, queue_id, questions, answers, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                submission.id,
                submission.queue_id,
                serde_json::to_string(&submission.questions)?,
                serde_json::to_string(&submission.answers)?,
                submission.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Deletes the submission as a whole unit; its evaluations cascade.
    pub fn delete_submission(&self, id: &str) -> anyhow::Result<()> {
        self.conn
            .execute("DELETE FROM submissions WHERE id = ?1", [id])?;
        Ok(())
    }

    // -- Judges --

    pub fn insert_judge(&self, judge: &Judge) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO judges (id, name, instructions, model_id, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                judge.id,
                judge.name,
                judge.instructions,
                judge.model_id,
                judge.active,
                judge.created_at.to_rfc3339(),
                judge.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_judges(&self) -> anyhow::Result<Vec<Judge>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, instructions, model_id, active, created_at, updated_at
             FROM judges ORDER BY created_at, id",
        )?;
        let judges = stmt
            .query_map([], judge_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(judges)
    }

    pub fn update_judge_instructions(&self, id: &str, instructions: &str) -> anyhow::Result<()> {
        self.conn.execute(
            "UPDATE judges SET instructions = ?1, updated_at = ?2 WHERE id = ?3",
            params![instructions, Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Soft disable: the normal way to retire a judge. Historical
    /// evaluations and assignments stay in place; the resolver just stops
    /// producing triples for it.
    pub fn set_judge_active(&self, id: &str, active: bool) -> anyhow::Result<()> {
        self.conn.execute(
            "UPDATE judges SET active = ?1, updated_at = ?2 WHERE id = ?3",
            params![active, Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Hard delete. Assignments cascade; evaluations survive.
    pub fn delete_judge(&self, id: &str) -> anyhow::Result<()> {
        self.conn.execute("DELETE FROM judges WHERE id = ?1", [id])?;
        Ok(())
    }

    // -- Assignments --

    /// Replace the judge set for one (queue, question) pair. Set
    /// replacement, not additive: prior assignments for the pair go away.
    pub fn replace_assignments(
        &self,
        queue_id: &str,
        question_id: &str,
        judge_ids: &[String],
    ) -> anyhow::Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM judge_assignments WHERE queue_id = ?1 AND question_id = ?2",
            params![queue_id, question_id],
        )?;
        for judge_id in judge_ids {
            tx.execute(
                "INSERT INTO judge_assignments (queue_id, question_id, judge_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![queue_id, question_id, judge_id, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn assignments_for_queue(&self, queue_id: &str) -> anyhow::Result<Vec<JudgeAssignment>> {
        let mut stmt = self.conn.prepare(
            "SELECT queue_id, question_id, judge_id, created_at
             FROM judge_assignments WHERE queue_id = ?1
             ORDER BY question_id, judge_id",
        )?;
        let assignments = stmt
            .query_map([queue_id], |row| {
                Ok(JudgeAssignment {
                    queue_id: row.get(0)?,
                    question_id: row.get(1)?,
                    judge_id: row.get(2)?,
                    created_at: parse_ts(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assignments)
    }

    // -- Evaluations --

    pub fn evaluations_for_submission(
        &self,
        submission_id: &str,
    ) -> anyhow::Result<Vec<Evaluation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, submission_id, question_id, judge_id, verdict, reasoning, error,
                    execution_time_ms, created_at
             FROM evaluations WHERE submission_id = ?1 ORDER BY created_at, id",
        )?;
        let evals = stmt
            .query_map([submission_id], evaluation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(evals)
    }

    pub fn evaluations_for_queue(&self, queue_id: &str) -> anyhow::Result<Vec<Evaluation>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.submission_id, e.question_id, e.judge_id, e.verdict, e.reasoning,
                    e.error, e.execution_time_ms, e.created_at
             FROM evaluations e
             JOIN submissions s ON s.id = e.submission_id
             WHERE s.queue_id = ?1 ORDER BY e.created_at, e.id",
        )?;
        let evals = stmt
            .query_map([queue_id], evaluation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(evals)
    }

    // -- Runs --

    pub fn recent_runs(&self, limit: u32) -> anyhow::Result<Vec<EvaluationRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, queue_id, status, total_evaluations, completed_evaluations,
                    failed_evaluations, started_at, completed_at
             FROM evaluation_runs ORDER BY started_at DESC LIMIT ?1",
        )?;
        let runs = stmt
            .query_map([limit], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }
}

impl SubmissionStore for Store {
    fn submissions_for_queue(&self, queue_id: &str) -> anyhow::Result<Vec<Submission>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, queue_id, questions, answers, created_at
             FROM submissions WHERE queue_id = ?1 ORDER BY created_at, id",
        )?;
        let rows = stmt
            .query_map([queue_id], |row| {
                let questions: String = row.get(2)?;
                let answers: String = row.get(3)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    questions,
                    answers,
                    parse_ts(row, 4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut submissions = Vec::with_capacity(rows.len());
        for (id, queue_id, questions, answers, created_at) in rows {
            submissions.push(Submission {
                id,
                queue_id,
                questions: serde_json::from_str(&questions)?,
                answers: serde_json::from_str::<HashMap<String, _>>(&answers)?,
                created_at,
            });
        }
        Ok(submissions)
    }
}

impl JudgeStore for Store {
    fn get_judge(&self, id: &str) -> anyhow::Result<Option<Judge>> {
        let judge = self
            .conn
            .query_row(
                "SELECT id, name, instructions, model_id, active, created_at, updated_at
                 FROM judges WHERE id = ?1",
                [id],
                judge_from_row,
            )
            .optional()?;
        Ok(judge)
    }
}

impl AssignmentStore for Store {
    fn judges_for_question(
        &self,
        queue_id: &str,
        question_id: &str,
    ) -> anyhow::Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT judge_id FROM judge_assignments
             WHERE queue_id = ?1 AND question_id = ?2 ORDER BY judge_id",
        )?;
        let ids = stmt
            .query_map(params![queue_id, question_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

impl EvaluationStore for Store {
    fn insert_evaluation(&self, eval: &Evaluation) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO evaluations (id, submission_id, question_id, judge_id, verdict,
                                      reasoning, error, execution_time_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                eval.id,
                eval.submission_id,
                eval.question_id,
                eval.judge_id,
                eval.verdict.map(|v| v.as_str()),
                eval.reasoning,
                eval.error,
                eval.execution_time_ms,
                eval.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn insert_run(&self, run: &EvaluationRun) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO evaluation_runs (id, queue_id, status, total_evaluations,
                 completed_evaluations, failed_evaluations, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run.id,
                run.queue_id,
                run.status.as_str(),
                run.total_evaluations,
                run.completed_evaluations,
                run.failed_evaluations,
                run.started_at.to_rfc3339(),
                run.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn set_run_total(&self, run_id: &str, total: u32) -> anyhow::Result<()> {
        self.conn.execute(
            "UPDATE evaluation_runs SET total_evaluations = ?1
             WHERE id = ?2 AND completed_at IS NULL",
            params![total, run_id],
        )?;
        Ok(())
    }

    fn update_run_progress(
        &self,
        run_id: &str,
        completed: u32,
        failed: u32,
    ) -> anyhow::Result<()> {
        self.conn.execute(
            "UPDATE evaluation_runs
             SET completed_evaluations = ?1, failed_evaluations = ?2
             WHERE id = ?3 AND completed_at IS NULL",
            params![completed, failed, run_id],
        )?;
        Ok(())
    }

    fn finalize_run(
        &self,
        run_id: &str,
        status: RunStatus,
        completed_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.conn.execute(
            "UPDATE evaluation_runs SET status = ?1, completed_at = ?2
             WHERE id = ?3 AND completed_at IS NULL",
            params![status.as_str(), completed_at.to_rfc3339(), run_id],
        )?;
        Ok(())
    }

    fn get_run(&self, run_id: &str) -> anyhow::Result<Option<EvaluationRun>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, queue_id, status, total_evaluations, completed_evaluations,
                        failed_evaluations, started_at, completed_at
                 FROM evaluation_runs WHERE id = ?1",
                [run_id],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }
}

// -- Row mapping --

fn parse_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn judge_from_row(row: &Row<'_>) -> rusqlite::Result<Judge> {
    Ok(Judge {
        id: row.get(0)?,
        name: row.get(1)?,
        instructions: row.get(2)?,
        model_id: row.get(3)?,
        active: row.get(4)?,
        created_at: parse_ts(row, 5)?,
        updated_at: parse_ts(row, 6)?,
    })
}

fn evaluation_from_row(row: &Row<'_>) -> rusqlite::Result<Evaluation> {
    let verdict: Option<String> = row.get(4)?;
    Ok(Evaluation {
        id: row.get(0)?,
        submission_id: row.get(1)?,
        question_id: row.get(2)?,
        judge_id: row.get(3)?,
        verdict: verdict.as_deref().and_then(Verdict::parse),
        reasoning: row.get(5)?,
        error: row.get(6)?,
        execution_time_ms: row.get(7)?,
        created_at: parse_ts(row, 8)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<EvaluationRun> {
    let status: String = row.get(2)?;
    let completed_at: Option<String> = row.get(7)?;
    Ok(EvaluationRun {
        id: row.get(0)?,
        queue_id: row.get(1)?,
        status: RunStatus::parse(&status).unwrap_or(RunStatus::Failed),
        total_evaluations: row.get(3)?,
        completed_evaluations: row.get(4)?,
        failed_evaluations: row.get(5)?,
        started_at: parse_ts(row, 6)?,
        completed_at: completed_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc)),
    })
}
