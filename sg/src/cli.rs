//! CLI command definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::LlmConfig;

/// SpecGraph - specification-driven feature documents
#[derive(Parser)]
#[command(
    name = "sg",
    about = "Generate specifications, plans and task lists with an LLM",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Directory holding the numbered artifact sets (overrides config)
    #[arg(long = "specs-dir", global = true, value_name = "DIR")]
    pub specs_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new numbered specification from a feature description
    Specify {
        /// What the feature should do, in plain language
        feature_description: String,
    },

    /// Write an implementation plan for the latest specification
    Plan {
        /// Technical constraints or preferences (languages, storage, ...)
        technical_constraints: Option<String>,
    },

    /// Break the latest specification and plan into tasks
    Tasks,

    /// Ask clarification questions and merge the answers into the latest specification
    Clarify {
        /// Use every suggested answer without prompting
        #[arg(short = 'y', long)]
        accept_suggested: bool,
    },
}

/// Path of the log file written by `sg`
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("specgraph")
        .join("logs")
        .join("specgraph.log")
}

/// Help footer showing the log location and API key status
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let key_env = LlmConfig::default().api_key_env;
    let key_icon = if std::env::var(&key_env).is_ok() {
        "\u{2705}"
    } else {
        "\u{274C}"
    };

    format!(
        "Environment:\n  {} {}\n\nLogs are written to: {}",
        key_icon,
        key_env,
        get_log_path().display()
    )
}
