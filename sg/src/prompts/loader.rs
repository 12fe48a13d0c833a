//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults, and renders them with Handlebars.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::pipeline::QaPair;

/// The prompts each pipeline step sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Specify,
    Plan,
    Tasks,
    Clarify,
    ClarifyUpdate,
}

impl Prompt {
    /// Template name of the user prompt
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Specify => "specify",
            Self::Plan => "plan",
            Self::Tasks => "tasks",
            Self::Clarify => "clarify",
            Self::ClarifyUpdate => "clarify-update",
        }
    }

    /// Template name of the system prompt
    pub fn system_template_name(&self) -> &'static str {
        match self {
            Self::Specify => "specify-system",
            Self::Plan => "plan-system",
            Self::Tasks => "tasks-system",
            Self::Clarify => "clarify-system",
            Self::ClarifyUpdate => "clarify-update-system",
        }
    }

    /// Output token budget for the call
    pub fn max_tokens(&self) -> u32 {
        match self {
            Self::Specify | Self::Plan | Self::Clarify => 4096,
            Self::Tasks | Self::ClarifyUpdate => 8192,
        }
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.template_name())
    }
}

/// Variables available to the user prompt templates
///
/// Fields a template does not use are left out of the serialized context.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_constraints: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clarifications: Vec<QaPair>,
}

impl PromptContext {
    pub fn specify(feature_description: &str) -> Self {
        Self {
            feature_description: Some(feature_description.to_string()),
            ..Default::default()
        }
    }

    pub fn plan(specification: &str, technical_constraints: &str) -> Self {
        Self {
            specification: Some(specification.to_string()),
            technical_constraints: Some(technical_constraints.to_string()),
            ..Default::default()
        }
    }

    pub fn tasks(specification: &str, plan: &str) -> Self {
        Self {
            specification: Some(specification.to_string()),
            plan: Some(plan.to_string()),
            ..Default::default()
        }
    }

    pub fn clarify(specification: &str) -> Self {
        Self {
            specification: Some(specification.to_string()),
            ..Default::default()
        }
    }

    pub fn clarify_update(specification: &str, clarifications: Vec<QaPair>) -> Self {
        Self {
            specification: Some(specification.to_string()),
            clarifications,
            ..Default::default()
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directory (e.g., `.specgraph/prompts/`)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `dir` for `{name}.pmt` overrides
    ///
    /// A directory that does not exist is ignored.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let exists = dir.is_dir();
        debug!(?dir, %exists, "PromptLoader::new: called");

        Self {
            hbs: Self::engine(),
            override_dir: exists.then(|| dir.to_path_buf()),
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are markdown, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs.set_strict_mode(true);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Override: `{dir}/{name}.pmt`
    /// 2. Embedded fallback
    pub fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt override {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: no override");
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// System prompt for a step (used as-is, never rendered)
    pub fn system(&self, prompt: Prompt) -> Result<String> {
        debug!(%prompt, "PromptLoader::system: called");
        self.load_template(prompt.system_template_name())
    }

    /// Render the user prompt for a step
    pub fn render(&self, prompt: Prompt, context: &PromptContext) -> Result<String> {
        debug!(%prompt, "PromptLoader::render: called");
        let name = prompt.template_name();
        let template = self.load_template(name)?;
        info!("Rendering template '{}'", name);

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", name, e))
    }
}
