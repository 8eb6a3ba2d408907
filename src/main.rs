// src/main.rs — Gavel entry point

use std::sync::Arc;

use clap::Parser;

use gavel::cli::{Cli, Commands};
use gavel::infra::config::Config;
use gavel::infra::logger;
use gavel::provider::openai_compat::OpenAICompatProvider;
use gavel::store::Store;

#[tokio::main]
async fn main() {
    // Respects RUST_LOG
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    let store = Store::open(&config.db_path())?;

    match cli.command {
        Commands::Run {
            queue_id,
            concurrency,
        } => {
            let api_key = config.api_key().ok_or_else(|| {
                anyhow::anyhow!(
                    "no API key found; set {} or adjust [provider] api_key_env",
                    config.provider.api_key_env
                )
            })?;
            let provider = Arc::new(OpenAICompatProvider::new(
                "openai-compat",
                api_key,
                config.provider.base_url.clone(),
            ));
            gavel::cli::run::run_queue(&queue_id, provider, &config, &store, concurrency).await
        }
        Commands::Status { run, limit } => {
            gavel::cli::status::show_status(&store, run.as_deref(), limit)
        }
        Commands::Judges => gavel::cli::judges::list_judges(&store),
    }
}
