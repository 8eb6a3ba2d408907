// src/core/playground.rs — Ad-hoc prompt iteration without persisted runs

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

use super::types::{Answer, Question, Verdict};
use super::{prompt, verdict};
use crate::provider::invoker::ModelInvoker;

/// An unsaved answer to try a judge prompt against, optionally labeled with
/// the verdict the operator expects.
#[derive(Debug, Clone)]
pub struct PlaygroundSample {
    pub question: Question,
    pub answer: Option<Answer>,
    pub expected_verdict: Option<Verdict>,
}

/// Result of evaluating one sample. Nothing here is persisted as an
/// evaluation record; it goes straight back to the caller.
#[derive(Debug, Clone)]
pub struct PlaygroundResult {
    pub verdict: Option<Verdict>,
    pub reasoning: Option<String>,
    pub error: Option<String>,
    pub latency_ms: Option<u64>,
    /// Whether the parsed verdict matched the sample's expected one.
    /// None when the sample carried no expectation or the dispatch failed.
    pub matched_expected: Option<bool>,
    pub from_cache: bool,
}

impl PlaygroundResult {
    fn succeeded(&self) -> bool {
        self.verdict.is_some()
    }
}

/// One saved iteration of a judge prompt, kept for comparison while
/// the operator tunes instructions before promoting them into a judge.
#[derive(Debug, Clone)]
pub struct PromptVersion {
    pub content: String,
    /// Fraction of expectation-labeled samples whose verdict matched.
    pub success_rate: f32,
    pub created_at: DateTime<Utc>,
}

/// Bounded (prompt, model) → outcome cache, evicted oldest-first. Rapid
/// iteration re-evaluates the same samples constantly; identical calls are
/// served from here instead of the provider.
struct ResultCache {
    capacity: usize,
    entries: HashMap<u64, (Verdict, String)>,
    order: VecDeque<u64>,
}

impl ResultCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: u64) -> Option<&(Verdict, String)> {
        self.entries.get(&key)
    }

    fn insert(&mut self, key: u64, value: (Verdict, String)) {
        if self.entries.contains_key(&key) {
            return;
        }
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(key, value);
        self.order.push_back(key);
    }
}

const CACHE_CAPACITY: usize = 64;

/// Runs the same render → invoke → parse triple as a real run, against
/// unsaved samples.
pub struct PlaygroundEvaluator {
    invoker: ModelInvoker,
    temperature: f32,
    max_tokens: u32,
    cache: ResultCache,
    history: Vec<PromptVersion>,
}

impl PlaygroundEvaluator {
    pub fn new(invoker: ModelInvoker, temperature: f32, max_tokens: u32) -> Self {
        Self {
            invoker,
            temperature,
            max_tokens,
            cache: ResultCache::new(CACHE_CAPACITY),
            history: Vec::new(),
        }
    }

    /// Evaluate one sample against candidate judge instructions.
    pub async fn evaluate_sample(
        &mut self,
        instructions: &str,
        sample: &PlaygroundSample,
        model_id: &str,
    ) -> PlaygroundResult {
        let text = prompt::render(instructions, &sample.question, sample.answer.as_ref());
        let key = cache_key(&text, model_id);

        if let Some((verdict, reasoning)) = self.cache.get(key) {
            return PlaygroundResult {
                verdict: Some(*verdict),
                reasoning: Some(reasoning.clone()),
                error: None,
                latency_ms: None,
                matched_expected: sample.expected_verdict.map(|e| e == *verdict),
                from_cache: true,
            };
        }

        let invocation = match self
            .invoker
            .invoke(&text, model_id, self.temperature, self.max_tokens)
            .await
        {
            Ok(inv) => inv,
            Err(e) => {
                return PlaygroundResult {
                    verdict: None,
                    reasoning: None,
                    error: Some(e.to_string()),
                    latency_ms: None,
                    matched_expected: None,
                    from_cache: false,
                }
            }
        };

        match verdict::parse(&invocation.raw_text) {
            Ok(parsed) => {
                self.cache
                    .insert(key, (parsed.verdict, parsed.reasoning.clone()));
                PlaygroundResult {
                    verdict: Some(parsed.verdict),
                    reasoning: Some(parsed.reasoning),
                    error: None,
                    latency_ms: Some(invocation.latency_ms),
                    matched_expected: sample.expected_verdict.map(|e| e == parsed.verdict),
                    from_cache: false,
                }
            }
            Err(e) => PlaygroundResult {
                verdict: None,
                reasoning: None,
                error: Some(e.to_string()),
                latency_ms: Some(invocation.latency_ms),
                matched_expected: None,
                from_cache: false,
            },
        }
    }

    /// Evaluate a batch sequentially, invoking `progress` after each item
    /// with the zero-based index and its result.
    pub async fn evaluate_batch<F>(
        &mut self,
        instructions: &str,
        samples: &[PlaygroundSample],
        model_id: &str,
        mut progress: F,
    ) -> Vec<PlaygroundResult>
    where
        F: FnMut(usize, &PlaygroundResult),
    {
        let mut results = Vec::with_capacity(samples.len());
        for (i, sample) in samples.iter().enumerate() {
            let result = self.evaluate_sample(instructions, sample, model_id).await;
            progress(i, &result);
            results.push(result);
        }
        results
    }

    /// Append the current instructions and their batch outcome to the
    /// prompt-version history.
    pub fn record_version(&mut self, instructions: &str, results: &[PlaygroundResult]) {
        let labeled = results
            .iter()
            .filter(|r| r.succeeded() && r.matched_expected.is_some())
            .count();
        let matched = results
            .iter()
            .filter(|r| r.matched_expected == Some(true))
            .count();
        let success_rate = if labeled == 0 {
            0.0
        } else {
            matched as f32 / labeled as f32
        };

        self.history.push(PromptVersion {
            content: instructions.to_string(),
            success_rate,
            created_at: Utc::now(),
        });
    }

    pub fn history(&self) -> &[PromptVersion] {
        &self.history
    }
}

fn cache_key(prompt_text: &str, model_id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    prompt_text.hash(&mut hasher);
    model_id.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::QuestionKind;
    use crate::infra::errors::GavelError;
    use crate::provider::{CompletionRequest, CompletionResponse, ModelProvider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Counts calls so cache hits are observable.
    struct CountingProvider {
        response: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelProvider for CountingProvider {
        fn id(&self) -> &str {
            "counting"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, GavelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompletionResponse {
                content: self.response.clone(),
            })
        }
    }

    fn evaluator(response: &str) -> (PlaygroundEvaluator, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            response: response.into(),
            calls: AtomicUsize::new(0),
        });
        let invoker = ModelInvoker::new(provider.clone(), Duration::from_secs(5));
        (PlaygroundEvaluator::new(invoker, 0.1, 256), provider)
    }

    fn sample(text: &str, expected: Option<Verdict>) -> PlaygroundSample {
        PlaygroundSample {
            question: Question {
                id: "qu1".into(),
                kind: QuestionKind::FreeForm,
                text: text.into(),
            },
            answer: Some(Answer::FreeForm {
                response: Some("An answer.".into()),
            }),
            expected_verdict: expected,
        }
    }

    #[tokio::test]
    async fn test_sample_matches_expected() {
        let (mut eval, _) = evaluator(r#"{"verdict": "pass", "reasoning": "Good."}"#);
        let result = eval
            .evaluate_sample("Grade this.", &sample("Q?", Some(Verdict::Pass)), "m1")
            .await;
        assert_eq!(result.verdict, Some(Verdict::Pass));
        assert_eq!(result.matched_expected, Some(true));
        assert!(!result.from_cache);
    }

    #[tokio::test]
    async fn test_sample_mismatch_reported() {
        let (mut eval, _) = evaluator(r#"{"verdict": "fail", "reasoning": "Bad."}"#);
        let result = eval
            .evaluate_sample("Grade this.", &sample("Q?", Some(Verdict::Pass)), "m1")
            .await;
        assert_eq!(result.matched_expected, Some(false));
    }

    #[tokio::test]
    async fn test_identical_sample_served_from_cache() {
        let (mut eval, provider) = evaluator(r#"{"verdict": "pass", "reasoning": "ok"}"#);
        let s = sample("Q?", None);
        let first = eval.evaluate_sample("Grade.", &s, "m1").await;
        let second = eval.evaluate_sample("Grade.", &s, "m1").await;
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.verdict, Some(Verdict::Pass));
    }

    #[tokio::test]
    async fn test_different_model_misses_cache() {
        let (mut eval, provider) = evaluator(r#"{"verdict": "pass", "reasoning": "ok"}"#);
        let s = sample("Q?", None);
        eval.evaluate_sample("Grade.", &s, "m1").await;
        eval.evaluate_sample("Grade.", &s, "m2").await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_parse_failures_are_not_cached() {
        let (mut eval, provider) = evaluator("no verdict here at all");
        let s = sample("Q?", None);
        let first = eval.evaluate_sample("Grade.", &s, "m1").await;
        let second = eval.evaluate_sample("Grade.", &s, "m1").await;
        assert!(first.error.is_some());
        assert!(!second.from_cache);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_batch_reports_progress_in_order() {
        let (mut eval, _) = evaluator(r#"{"verdict": "pass", "reasoning": "ok"}"#);
        let samples = vec![
            sample("Q1?", Some(Verdict::Pass)),
            sample("Q2?", Some(Verdict::Fail)),
        ];
        let mut seen = Vec::new();
        let results = eval
            .evaluate_batch("Grade.", &samples, "m1", |i, _| seen.push(i))
            .await;
        assert_eq!(seen, vec![0, 1]);
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_record_version_success_rate() {
        let (mut eval, _) = evaluator(r#"{"verdict": "pass", "reasoning": "ok"}"#);
        let samples = vec![
            sample("Q1?", Some(Verdict::Pass)),
            sample("Q2?", Some(Verdict::Fail)),
            sample("Q3?", None),
        ];
        let results = eval.evaluate_batch("v1", &samples, "m1", |_, _| {}).await;
        eval.record_version("v1", &results);

        let history = eval.history();
        assert_eq!(history.len(), 1);
        // one matched out of two labeled samples; the unlabeled one is excluded
        assert!((history[0].success_rate - 0.5).abs() < f32::EPSILON);
        assert_eq!(history[0].content, "v1");
    }

    #[test]
    fn test_cache_evicts_oldest_on_overflow() {
        let mut cache = ResultCache::new(2);
        cache.insert(1, (Verdict::Pass, "a".into()));
        cache.insert(2, (Verdict::Fail, "b".into()));
        cache.insert(3, (Verdict::Pass, "c".into()));
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
    }
}
