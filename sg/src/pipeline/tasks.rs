//! Tasks pipeline - specification and plan to a task list

use std::path::PathBuf;

use tracing::{debug, info};

use super::plan::read_artifact;
use super::{PipelineContext, Stage, settle};
use crate::error::PipelineError;
use crate::prompts::{Prompt, PromptContext};
use crate::store::ArtifactFile;

#[derive(Debug)]
pub struct TasksState {
    pub spec_directory: Option<PathBuf>,
    pub specification: Option<String>,
    pub plan: Option<String>,
    pub tasks: Option<String>,
    pub tasks_file: Option<PathBuf>,
    pub stage: Stage,
    pub error: Option<PipelineError>,
}

super::impl_pipeline_state!(TasksState);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TasksOutcome {
    pub tasks_file: PathBuf,
}

impl TasksState {
    fn new() -> Self {
        Self {
            spec_directory: None,
            specification: None,
            plan: None,
            tasks: None,
            tasks_file: None,
            stage: Stage::Start,
            error: None,
        }
    }

    pub fn into_result(self) -> Result<TasksOutcome, PipelineError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.tasks_file
            .map(|tasks_file| TasksOutcome { tasks_file })
            .ok_or_else(|| PipelineError::NotFound("Tasks run produced no task list".to_string()))
    }
}

/// Generates `tasks.md` from the latest specification and plan
pub struct TasksPipeline {
    ctx: PipelineContext,
}

impl TasksPipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> TasksState {
        debug!("TasksPipeline::run: called");
        let mut state = TasksState::new();
        let result = self.execute(&mut state).await;
        settle("tasks", &mut state, result);
        state
    }

    async fn execute(&self, state: &mut TasksState) -> Result<(), PipelineError> {
        let store = &self.ctx.store;

        state.stage = Stage::Load;
        let dir = store
            .find_latest()?
            .ok_or_else(|| PipelineError::NotFound("No specifications found. Run 'sg specify' first.".to_string()))?;
        state.spec_directory = Some(dir.clone());
        // Both prerequisites are checked before either is read
        store.require(&dir, ArtifactFile::Specification)?;
        store.require(&dir, ArtifactFile::Plan)?;
        let specification = read_artifact(store, &dir, ArtifactFile::Specification)?;
        let plan = read_artifact(store, &dir, ArtifactFile::Plan)?;

        state.stage = Stage::Generate;
        let tasks = self
            .ctx
            .generate(Prompt::Tasks, &PromptContext::tasks(&specification, &plan))
            .await?;
        state.specification = Some(specification);
        state.plan = Some(plan);

        state.stage = Stage::Persist;
        let file = dir.join(ArtifactFile::Tasks.file_name());
        store.write(&file, &tasks)?;
        state.tasks = Some(tasks);
        state.tasks_file = Some(file.clone());
        info!(file = %file.display(), "Tasks saved");
        Ok(())
    }
}
