//! Pipelines - specify, plan, tasks and clarify
//!
//! Every pipeline is a short sequence of steps over a mutable state record:
//!
//! ```text
//! specify:  validate → generate → persist → done
//! plan:     load → generate → persist → done
//! tasks:    load → generate → persist → done
//! clarify:  load → analyze → { done | update → save → done }
//! ```
//!
//! A step either fills in its fields on the state or fails. The first failure
//! is recorded in the state's `error` field and ends the run; nothing that an
//! earlier step produced is rolled back. Runs are strictly sequential.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::prompts::{Prompt, PromptContext, PromptLoader};
use crate::store::ArtifactStore;

macro_rules! impl_pipeline_state {
    ($state:ty) => {
        impl $crate::pipeline::PipelineState for $state {
            fn set_stage(&mut self, stage: $crate::pipeline::Stage) {
                self.stage = stage;
            }

            fn stage(&self) -> $crate::pipeline::Stage {
                self.stage
            }

            fn set_error(&mut self, error: $crate::error::PipelineError) {
                self.error = Some(error);
            }
        }
    };
}

pub(crate) use impl_pipeline_state;

mod clarify;
mod extract;
mod plan;
mod specify;
mod tasks;

pub use clarify::{
    AnswerMap, Category, ClarificationQuestion, ClarifyOutcome, ClarifyPipeline, ClarifyState, QaPair,
    build_qa_pairs, parse_questions,
};
pub use extract::{extract_json_block, strip_markdown_fence};
pub use plan::{PlanOutcome, PlanPipeline, PlanState};
pub use specify::{MIN_DESCRIPTION_LEN, SpecifyOutcome, SpecifyPipeline, SpecifyState};
pub use tasks::{TasksOutcome, TasksPipeline, TasksState};

/// Step a pipeline run reached
///
/// On failure this is the step that failed; on success it is `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Validate,
    Load,
    Generate,
    Persist,
    Analyze,
    Update,
    Save,
    Done,
}

/// Shared collaborators handed to every pipeline
#[derive(Clone)]
pub struct PipelineContext {
    pub llm: Arc<dyn LlmClient>,
    pub store: ArtifactStore,
    pub prompts: Arc<PromptLoader>,
}

impl PipelineContext {
    pub fn new(llm: Arc<dyn LlmClient>, store: ArtifactStore, prompts: PromptLoader) -> Self {
        Self {
            llm,
            store,
            prompts: Arc::new(prompts),
        }
    }

    /// Render the prompt pair for `prompt` and call the model
    ///
    /// Returns the response text verbatim.
    pub(crate) async fn generate(&self, prompt: Prompt, context: &PromptContext) -> Result<String, PipelineError> {
        debug!(%prompt, "PipelineContext::generate: called");
        let system = self
            .prompts
            .system(prompt)
            .map_err(|e| PipelineError::Template(e.to_string()))?;
        let user = self
            .prompts
            .render(prompt, context)
            .map_err(|e| PipelineError::Template(e.to_string()))?;

        let request = CompletionRequest::single_turn(system, user, prompt.max_tokens());
        let response = self.llm.complete(request).await?;
        info!(
            %prompt,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "Model call complete"
        );

        response
            .content
            .ok_or_else(|| LlmError::InvalidResponse("Model returned no text content".to_string()).into())
    }
}

/// Common bookkeeping for pipeline state records
pub(crate) trait PipelineState {
    fn set_stage(&mut self, stage: Stage);
    fn stage(&self) -> Stage;
    fn set_error(&mut self, error: PipelineError);
}

/// Record the outcome of a run on its state
///
/// `Ok` moves the state to `Done`; an error is stored and the stage is left
/// at the step that failed.
pub(crate) fn settle<S: PipelineState>(name: &str, state: &mut S, result: Result<(), PipelineError>) {
    match result {
        Ok(()) => {
            debug!(pipeline = %name, "settle: done");
            state.set_stage(Stage::Done);
        }
        Err(e) => {
            warn!(pipeline = %name, stage = ?state.stage(), error = ?e, "Pipeline failed");
            state.set_error(e);
        }
    }
}
