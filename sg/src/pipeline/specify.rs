//! Specify pipeline - feature description to a new numbered specification

use std::path::PathBuf;

use tracing::{debug, info};

use super::{PipelineContext, Stage, settle};
use crate::error::PipelineError;
use crate::prompts::{Prompt, PromptContext};
use crate::store::ArtifactFile;

/// Shortest accepted feature description, in characters after trimming
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// State threaded through a specify run
#[derive(Debug)]
pub struct SpecifyState {
    pub feature_description: String,
    pub specification: Option<String>,
    pub spec_directory: Option<PathBuf>,
    pub spec_number: Option<u64>,
    pub stage: Stage,
    pub error: Option<PipelineError>,
}

super::impl_pipeline_state!(SpecifyState);

/// What a successful specify run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifyOutcome {
    pub spec_number: u64,
    pub spec_directory: PathBuf,
}

impl SpecifyOutcome {
    pub fn specification_file(&self) -> PathBuf {
        self.spec_directory.join(ArtifactFile::Specification.file_name())
    }
}

impl SpecifyState {
    fn new(feature_description: &str) -> Self {
        Self {
            feature_description: feature_description.to_string(),
            specification: None,
            spec_directory: None,
            spec_number: None,
            stage: Stage::Start,
            error: None,
        }
    }

    pub fn into_result(self) -> Result<SpecifyOutcome, PipelineError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        match (self.spec_number, self.spec_directory) {
            (Some(spec_number), Some(spec_directory)) => Ok(SpecifyOutcome {
                spec_number,
                spec_directory,
            }),
            _ => Err(PipelineError::NotFound("Specify run produced no specification".to_string())),
        }
    }
}

/// Check a feature description before anything external is called
pub fn validate_description(description: &str) -> Result<(), PipelineError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::Validation("Feature description cannot be empty".to_string()));
    }
    if trimmed.chars().count() < MIN_DESCRIPTION_LEN {
        return Err(PipelineError::Validation(format!(
            "Feature description is too short (minimum {} characters)",
            MIN_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

/// Generates a specification and stores it as a new artifact set
pub struct SpecifyPipeline {
    ctx: PipelineContext,
}

impl SpecifyPipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self, feature_description: &str) -> SpecifyState {
        debug!(len = feature_description.len(), "SpecifyPipeline::run: called");
        let mut state = SpecifyState::new(feature_description);
        let result = self.execute(&mut state).await;
        settle("specify", &mut state, result);
        state
    }

    async fn execute(&self, state: &mut SpecifyState) -> Result<(), PipelineError> {
        state.stage = Stage::Validate;
        validate_description(&state.feature_description)?;

        state.stage = Stage::Generate;
        let specification = self
            .ctx
            .generate(Prompt::Specify, &PromptContext::specify(&state.feature_description))
            .await?;
        state.specification = Some(specification);

        state.stage = Stage::Persist;
        let (dir, number) = self.ctx.store.allocate(&state.feature_description)?;
        state.spec_directory = Some(dir.clone());
        state.spec_number = Some(number);

        let file = dir.join(ArtifactFile::Specification.file_name());
        let text = state.specification.as_deref().unwrap_or_default();
        self.ctx.store.write(&file, text)?;
        info!(number, file = %file.display(), "Specification saved");
        Ok(())
    }
}
