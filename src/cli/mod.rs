// src/cli/mod.rs — CLI definition (clap derive)

pub mod judges;
pub mod run;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gavel", about = "Run LLM-judge evaluations over submission queues", version)]
pub struct Cli {
    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run evaluations for every assigned triple in a queue
    Run {
        /// Queue to evaluate
        queue_id: String,
        /// Max in-flight model calls (1 = sequential)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
    /// Show recent runs, or one run in detail
    Status {
        /// Run id to inspect
        #[arg(long)]
        run: Option<String>,
        /// How many recent runs to list
        #[arg(long, default_value = "10")]
        limit: u32,
    },
    /// List judges and their active flags
    Judges,
}
