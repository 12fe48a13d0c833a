//! SpecGraph - specification-driven feature documents
//!
//! SpecGraph drives a language model through a fixed documentation chain for
//! one feature at a time. Every stage reads earlier artifacts from a numbered
//! directory, sends a templated prompt, and stores the response as the next
//! artifact:
//!
//! ```text
//! specs/
//! └── 001-add-csv-export/
//!     ├── specification.md   # sg specify
//!     ├── plan.md            # sg plan
//!     └── tasks.md           # sg tasks
//! ```
//!
//! `sg clarify` asks follow-up questions about the latest specification and
//! merges the answers back into it.
//!
//! # Modules
//!
//! - [`store`] - Numbered artifact directories
//! - [`pipeline`] - The specify, plan, tasks and clarify pipelines
//! - [`llm`] - LLM client trait and Anthropic implementation
//! - [`prompts`] - Prompt templates
//! - [`interview`] - Interactive answer collection
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod interview;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod store;

pub use config::{Config, LlmConfig};
pub use error::PipelineError;
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, MockLlmClient, create_client};
pub use pipeline::{
    AnswerMap, ClarificationQuestion, ClarifyOutcome, ClarifyPipeline, PipelineContext, PlanPipeline, SpecifyPipeline,
    Stage, TasksPipeline,
};
pub use prompts::PromptLoader;
pub use store::{ArtifactFile, ArtifactStore};
