//! SpecGraph - specification-driven feature documents
//!
//! CLI entry point for the specify, plan, tasks and clarify pipelines.

use std::fs;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use specgraph::cli::{Cli, Command, generate_after_help, get_log_path};
use specgraph::config::Config;
use specgraph::interview;
use specgraph::llm::create_client;
use specgraph::pipeline::{ClarifyOutcome, ClarifyPipeline, PipelineContext, PlanPipeline, SpecifyPipeline, TasksPipeline};
use specgraph::prompts::PromptLoader;
use specgraph::store::{ArtifactFile, ArtifactStore};

fn parse_level(level: Option<&str>) -> tracing::Level {
    match level.map(|s| s.to_uppercase()) {
        None => tracing::Level::INFO,
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = parse_level(cli_log_level.or(config_log_level));

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "❌ Error:".red(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate()?;
    info!(model = %config.llm.model, "SpecGraph loaded config");

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let specs_dir = cli.specs_dir.clone().unwrap_or_else(|| config.store.specs_dir.clone());
    let store = ArtifactStore::new(specs_dir);
    let ctx = PipelineContext::new(llm, store, PromptLoader::new(&config.prompts.dir));

    debug!(command = ?cli.command, "run: dispatching command");
    match cli.command {
        Command::Specify { feature_description } => cmd_specify(ctx, &feature_description).await,
        Command::Plan { technical_constraints } => {
            cmd_plan(ctx, technical_constraints.as_deref().unwrap_or_default()).await
        }
        Command::Tasks => cmd_tasks(ctx).await,
        Command::Clarify { accept_suggested } => cmd_clarify(ctx, accept_suggested).await,
    }
}

async fn cmd_specify(ctx: PipelineContext, feature_description: &str) -> Result<()> {
    println!("{}", "Generating specification...".blue());
    let outcome = SpecifyPipeline::new(ctx).run(feature_description).await.into_result()?;

    println!("{}", "✅ Specification created".green());
    println!("   Spec Number: {:03}", outcome.spec_number);
    println!("   Location: {}", outcome.specification_file().display());
    println!();
    println!("Next: run {} to write an implementation plan", "sg plan".cyan());
    Ok(())
}

async fn cmd_plan(ctx: PipelineContext, technical_constraints: &str) -> Result<()> {
    println!("{}", "Generating implementation plan...".blue());
    let outcome = PlanPipeline::new(ctx).run(technical_constraints).await.into_result()?;

    println!("{}", "✅ Plan created".green());
    println!("   Location: {}", outcome.plan_file.display());
    println!();
    println!("Next: run {} to break the plan into tasks", "sg tasks".cyan());
    Ok(())
}

async fn cmd_tasks(ctx: PipelineContext) -> Result<()> {
    println!("{}", "Generating task list...".blue());
    let outcome = TasksPipeline::new(ctx).run().await.into_result()?;

    println!("{}", "✅ Tasks created".green());
    println!("   Location: {}", outcome.tasks_file.display());
    Ok(())
}

async fn cmd_clarify(ctx: PipelineContext, accept_suggested: bool) -> Result<()> {
    let pipeline = ClarifyPipeline::new(ctx);

    println!("{}", "Analyzing specification...".blue());
    let ClarifyOutcome::Questions(questions) = pipeline.run(None).await.into_result()? else {
        return Ok(());
    };

    if questions.is_empty() {
        println!("{}", "✅ No clarifications needed".green());
        return Ok(());
    }

    let answers = interview::collect_answers(&questions, accept_suggested)?;

    println!();
    println!("{}", "Updating specification...".blue());
    match pipeline.run(Some(answers)).await.into_result()? {
        ClarifyOutcome::Updated { spec_directory } => {
            println!("{}", "✅ Specification updated with clarifications".green());
            println!("   Location: {}", spec_directory.join(ArtifactFile::Specification.file_name()).display());
        }
        ClarifyOutcome::Questions(_) => {
            println!("{}", "✅ No clarifications needed".green());
        }
    }
    Ok(())
}
