// src/core/types.rs — Core domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One respondent's set of answers to a queue's questions.
///
/// Immutable once ingested; deleted only as a whole unit (which cascades
/// its evaluations). Questions are embedded, not independently stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub queue_id: String,
    pub questions: Vec<Question>,
    /// Keyed by question id. A missing entry means the respondent left the
    /// question blank.
    pub answers: std::collections::HashMap<String, Answer>,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(queue_id: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            queue_id: queue_id.into(),
            questions,
            answers: std::collections::HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_answer(mut self, question_id: impl Into<String>, answer: Answer) -> Self {
        self.answers.insert(question_id.into(), answer);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    SingleChoiceWithReasoning,
    MultipleChoice,
    FreeForm,
}

/// An answer variant keyed by question kind. Any field may be absent; the
/// prompt renderer omits missing fields rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    SingleChoice {
        choice: Option<String>,
    },
    SingleChoiceWithReasoning {
        choice: Option<String>,
        reasoning: Option<String>,
    },
    MultipleChoice {
        choices: Vec<String>,
    },
    FreeForm {
        response: Option<String>,
    },
}

/// A named configuration pairing an instruction prompt with a target model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judge {
    pub id: String,
    pub name: String,
    pub instructions: String,
    pub model_id: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Judge {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            instructions: instructions.into(),
            model_id: model_id.into(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// "This judge must evaluate this question within this queue."
/// Unique per (queue, question, judge) combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeAssignment {
    pub queue_id: String,
    pub question_id: String,
    pub judge_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
    Inconclusive,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Inconclusive => "inconclusive",
        }
    }

    /// Canonicalize a raw verdict string. Whitespace and case are forgiven;
    /// anything else is not a verdict.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass" => Some(Verdict::Pass),
            "fail" => Some(Verdict::Fail),
            "inconclusive" => Some(Verdict::Inconclusive),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted result of one judge evaluating one submission's answer to
/// one question. Append-only: re-running creates new records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: String,
    pub submission_id: String,
    pub question_id: String,
    pub judge_id: String,
    /// None when the dispatch failed before a verdict could be extracted.
    pub verdict: Option<Verdict>,
    pub reasoning: Option<String>,
    pub error: Option<String>,
    pub execution_time_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

/// One orchestration pass over a queue's current assignments.
///
/// Counters move monotonically while `Running`; once `completed_at` is set
/// the status is terminal and the counters are frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRun {
    pub id: String,
    pub queue_id: String,
    pub status: RunStatus,
    pub total_evaluations: u32,
    pub completed_evaluations: u32,
    pub failed_evaluations: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl EvaluationRun {
    pub fn new(queue_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            queue_id: queue_id.into(),
            status: RunStatus::Running,
            total_evaluations: 0,
            completed_evaluations: 0,
            failed_evaluations: 0,
            started_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// One unit of work resolved for a run: a judge evaluating one question of
/// one submission.
#[derive(Debug, Clone)]
pub struct EvalItem {
    pub submission_id: String,
    pub question: Question,
    pub answer: Option<Answer>,
    pub judge: Judge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_canonicalization() {
        assert_eq!(Verdict::parse("pass"), Some(Verdict::Pass));
        assert_eq!(Verdict::parse("  FAIL \n"), Some(Verdict::Fail));
        assert_eq!(Verdict::parse("Inconclusive"), Some(Verdict::Inconclusive));
        assert_eq!(Verdict::parse("maybe"), None);
        assert_eq!(Verdict::parse(""), None);
    }

    #[test]
    fn test_run_starts_running() {
        let run = EvaluationRun::new("q1");
        assert_eq!(run.status, RunStatus::Running);
        assert!(!run.status.is_terminal());
        assert!(run.completed_at.is_none());
        assert_eq!(run.total_evaluations, 0);
    }

    #[test]
    fn test_answer_serde_tagged() {
        let a = Answer::SingleChoiceWithReasoning {
            choice: Some("B".into()),
            reasoning: None,
        };
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("single_choice_with_reasoning"));
        let back: Answer = serde_json::from_str(&json).unwrap();
        match back {
            Answer::SingleChoiceWithReasoning { choice, reasoning } => {
                assert_eq!(choice.as_deref(), Some("B"));
                assert!(reasoning.is_none());
            }
            _ => panic!("wrong variant"),
        }
    }
}
