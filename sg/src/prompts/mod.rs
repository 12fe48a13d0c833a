//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the pipelines.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (override, `.specgraph/prompts/` by default)
//! 2. Embedded fallback in code
//!
//! User prompts use Handlebars syntax; system prompts are plain text.

pub mod embedded;
mod loader;

pub use loader::{Prompt, PromptContext, PromptLoader};
