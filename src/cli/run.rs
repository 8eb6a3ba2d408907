// src/cli/run.rs — Run evaluations for a queue

use std::sync::Arc;
use std::time::Duration;

use crate::core::run::{EvaluationRunner, RunOptions};
use crate::infra::config::Config;
use crate::provider::invoker::ModelInvoker;
use crate::provider::ModelProvider;
use crate::store::Store;

pub async fn run_queue(
    queue_id: &str,
    provider: Arc<dyn ModelProvider>,
    config: &Config,
    store: &Store,
    concurrency: Option<usize>,
) -> anyhow::Result<()> {
    let invoker = ModelInvoker::new(
        provider,
        Duration::from_secs(config.run.timeout_seconds),
    );
    let options = RunOptions {
        concurrency: concurrency.unwrap_or(config.run.concurrency),
        temperature: config.run.temperature,
        max_tokens: config.run.max_tokens,
        default_model: config.provider.default_model.clone(),
    };

    let runner = EvaluationRunner::new(invoker, options);
    let run = runner.run_evaluations(queue_id, store).await?;

    println!("run {}", run.id);
    println!("  queue:     {}", run.queue_id);
    println!("  status:    {}", run.status.as_str());
    println!("  total:     {}", run.total_evaluations);
    println!("  completed: {}", run.completed_evaluations);
    println!("  failed:    {}", run.failed_evaluations);
    if run.failed_evaluations > 0 {
        println!();
        println!(
            "  {} evaluation(s) recorded an error; inspect with `gavel status --run {}`",
            run.failed_evaluations, run.id
        );
    }
    Ok(())
}
