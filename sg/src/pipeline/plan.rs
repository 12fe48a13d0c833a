//! Plan pipeline - latest specification to an implementation plan

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{PipelineContext, Stage, settle};
use crate::error::PipelineError;
use crate::prompts::{Prompt, PromptContext};
use crate::store::{ArtifactFile, ArtifactStore};

#[derive(Debug)]
pub struct PlanState {
    pub technical_constraints: String,
    pub spec_directory: Option<PathBuf>,
    pub specification: Option<String>,
    pub plan: Option<String>,
    pub plan_file: Option<PathBuf>,
    pub stage: Stage,
    pub error: Option<PipelineError>,
}

super::impl_pipeline_state!(PlanState);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    pub plan_file: PathBuf,
}

impl PlanState {
    fn new(technical_constraints: &str) -> Self {
        Self {
            technical_constraints: technical_constraints.to_string(),
            spec_directory: None,
            specification: None,
            plan: None,
            plan_file: None,
            stage: Stage::Start,
            error: None,
        }
    }

    pub fn into_result(self) -> Result<PlanOutcome, PipelineError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.plan_file
            .map(|plan_file| PlanOutcome { plan_file })
            .ok_or_else(|| PipelineError::NotFound("Plan run produced no plan".to_string()))
    }
}

/// Locate the latest artifact set and read its specification
///
/// Shared by the plan and clarify pipelines.
pub(crate) fn load_latest_specification(store: &ArtifactStore) -> Result<(PathBuf, String), PipelineError> {
    let dir = store
        .find_latest()?
        .ok_or_else(|| PipelineError::NotFound("No specifications found. Run 'sg specify' first.".to_string()))?;
    let specification = read_artifact(store, &dir, ArtifactFile::Specification)?;
    Ok((dir, specification))
}

pub(crate) fn read_artifact(store: &ArtifactStore, dir: &Path, file: ArtifactFile) -> Result<String, PipelineError> {
    let path = store.require(dir, file)?;
    store.read(&path)
}

/// Generates `plan.md` next to the latest specification
pub struct PlanPipeline {
    ctx: PipelineContext,
}

impl PlanPipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Run with optional free-text constraints; an empty string means none
    pub async fn run(&self, technical_constraints: &str) -> PlanState {
        debug!(
            constraints_len = technical_constraints.len(),
            "PlanPipeline::run: called"
        );
        let mut state = PlanState::new(technical_constraints);
        let result = self.execute(&mut state).await;
        settle("plan", &mut state, result);
        state
    }

    async fn execute(&self, state: &mut PlanState) -> Result<(), PipelineError> {
        state.stage = Stage::Load;
        let (dir, specification) = load_latest_specification(&self.ctx.store)?;
        state.spec_directory = Some(dir.clone());

        state.stage = Stage::Generate;
        let context = PromptContext::plan(&specification, &state.technical_constraints);
        state.specification = Some(specification);
        let plan = self.ctx.generate(Prompt::Plan, &context).await?;

        state.stage = Stage::Persist;
        let file = dir.join(ArtifactFile::Plan.file_name());
        self.ctx.store.write(&file, &plan)?;
        state.plan = Some(plan);
        state.plan_file = Some(file.clone());
        info!(file = %file.display(), "Plan saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::prompts::PromptLoader;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ArtifactStore) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("specs"));
        (dir, store)
    }

    fn pipeline(store: &ArtifactStore, mock: Arc<MockLlmClient>) -> PlanPipeline {
        PlanPipeline::new(PipelineContext::new(mock, store.clone(), PromptLoader::embedded_only()))
    }

    #[tokio::test]
    async fn test_empty_store_fails_before_model_call() {
        let (_dir, store) = setup();
        let mock = Arc::new(MockLlmClient::with_texts(["unused"]));

        let state = pipeline(&store, mock.clone()).run("").await;

        assert_eq!(state.stage, Stage::Load);
        match state.error {
            Some(PipelineError::NotFound(msg)) => assert!(msg.contains("No specifications found")),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_latest_set_without_specification_fails() {
        let (_dir, store) = setup();
        fs::create_dir_all(store.root().join("001-has-spec")).unwrap();
        fs::write(store.root().join("001-has-spec/specification.md"), "# One").unwrap();
        fs::create_dir_all(store.root().join("002-empty")).unwrap();
        let mock = Arc::new(MockLlmClient::with_texts(["unused"]));

        let state = pipeline(&store, mock.clone()).run("").await;

        match state.error {
            Some(PipelineError::NotFound(msg)) => {
                assert!(msg.contains("002-empty"));
                assert!(msg.contains("Run 'sg specify' first"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_plan_written_to_latest_set() {
        let (_dir, store) = setup();
        for name in ["001-first", "003-third", "002-second"] {
            fs::create_dir_all(store.root().join(name)).unwrap();
            fs::write(store.root().join(name).join("specification.md"), format!("# {name}")).unwrap();
        }
        let mock = Arc::new(MockLlmClient::with_texts(["# Plan\n"]));

        let outcome = pipeline(&store, mock.clone())
            .run("Use PostgreSQL")
            .await
            .into_result()
            .unwrap();

        assert_eq!(outcome.plan_file, store.root().join("003-third/plan.md"));
        assert_eq!(fs::read_to_string(&outcome.plan_file).unwrap(), "# Plan\n");

        let user = mock.requests()[0].user_text().unwrap().to_string();
        assert!(user.contains("# 003-third"));
        assert!(user.contains("Use PostgreSQL"));
    }

    #[tokio::test]
    async fn test_rerun_overwrites_plan() {
        let (_dir, store) = setup();
        fs::create_dir_all(store.root().join("001-x")).unwrap();
        fs::write(store.root().join("001-x/specification.md"), "# Spec").unwrap();
        let mock = Arc::new(MockLlmClient::with_texts(["first", "second"]));

        let p = pipeline(&store, mock);
        p.run("").await.into_result().unwrap();
        let outcome = p.run("").await.into_result().unwrap();

        assert_eq!(fs::read_to_string(outcome.plan_file).unwrap(), "second");
    }
}
