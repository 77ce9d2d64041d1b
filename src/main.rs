//! SmartGPT - answer a question through a generate / critique / resolve pipeline
//!
//! Several candidate answers are generated concurrently, a researcher prompt
//! lists their flaws, a resolver prompt on the premium model improves the
//! best one, and a final call extracts only the improved answer. Every run
//! leaves a transcript in the conversations directory.

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod conversation;
mod core;
mod providers;

use crate::cli::{Args, ConsoleReporter};
use crate::config::{Config, PipelineConfig, Settings};
use crate::core::SmartGpt;

/// Settings file picked up from the working directory when `--config` is absent
const DEFAULT_SETTINGS_FILE: &str = "smartgpt.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartgpt=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let settings = load_settings(args.config.as_deref())?;

    let config = Config::from_env(&settings.api);
    let provider =
        providers::from_config(&config).context("Cannot set up the completion API client")?;

    let output_count = match args.outputs {
        Some(count) => count,
        None => cli::prompt_output_count(&mut io::stdin().lock(), &mut io::stdout())
            .context("Failed to read the output count")?,
    };
    let question = match args.question {
        Some(question) => question,
        None => cli::prompt_question(&mut io::stdin().lock(), &mut io::stdout())
            .context("Failed to read the question")?,
    };

    tracing::info!(
        outputs = %output_count,
        premium = args.premium,
        base_url = %config.openai_base_url,
        "Starting SmartGPT run"
    );

    let pipeline = SmartGpt::new(provider, PipelineConfig::new(output_count, args.premium), &settings)
        .with_reporter(Arc::new(ConsoleReporter));

    let report = pipeline.run(&question).await.context("SmartGPT run failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", cli::render_report(&report, &settings.models));
    }

    Ok(())
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None if Path::new(DEFAULT_SETTINGS_FILE).exists() => Settings::from_file(Path::new(DEFAULT_SETTINGS_FILE))
            .with_context(|| format!("Failed to load settings from {}", DEFAULT_SETTINGS_FILE)),
        None => Ok(Settings::default()),
    }
}
