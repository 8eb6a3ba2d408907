// src/cli/status.rs — Run status display

use crate::store::{EvaluationStore, Store};

/// List recent runs, or show one run with its per-submission verdicts.
pub fn show_status(store: &Store, run_id: Option<&str>, limit: u32) -> anyhow::Result<()> {
    match run_id {
        Some(id) => show_run(store, id),
        None => list_runs(store, limit),
    }
}

fn list_runs(store: &Store, limit: u32) -> anyhow::Result<()> {
    let runs = store.recent_runs(limit)?;
    if runs.is_empty() {
        println!("no runs recorded");
        return Ok(());
    }

    for run in runs {
        println!(
            "{}  {}  {:>9}  {}/{} ok, {} failed",
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.id,
            run.status.as_str(),
            run.completed_evaluations,
            run.total_evaluations,
            run.failed_evaluations,
        );
    }
    Ok(())
}

fn show_run(store: &Store, run_id: &str) -> anyhow::Result<()> {
    let run = store
        .get_run(run_id)?
        .ok_or_else(|| anyhow::anyhow!("run '{run_id}' not found"))?;

    println!("run {}", run.id);
    println!("  queue:     {}", run.queue_id);
    println!("  status:    {}", run.status.as_str());
    println!(
        "  progress:  {}/{} completed, {} failed",
        run.completed_evaluations, run.total_evaluations, run.failed_evaluations
    );
    println!("  started:   {}", run.started_at.to_rfc3339());
    if let Some(done) = run.completed_at {
        println!("  finished:  {}", done.to_rfc3339());
    }

    let evals = store.evaluations_for_queue(&run.queue_id)?;
    if !evals.is_empty() {
        println!();
        println!("  evaluations for queue '{}':", run.queue_id);
        for e in evals {
            match (&e.verdict, &e.error) {
                (Some(v), _) => println!(
                    "    {}  {}  {} → {}",
                    e.submission_id, e.question_id, e.judge_id, v
                ),
                (None, Some(err)) => println!(
                    "    {}  {}  {} → error: {}",
                    e.submission_id, e.question_id, e.judge_id, err
                ),
                (None, None) => {}
            }
        }
    }
    Ok(())
}
