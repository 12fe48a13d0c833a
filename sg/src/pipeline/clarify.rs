//! Clarify pipeline - question analysis and answer merge
//!
//! The first phase asks the model for at most five clarification questions
//! about the latest specification. When answers are supplied, the second
//! phase merges them into the specification and overwrites it in place.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::extract::{extract_json_block, strip_markdown_fence};
use super::plan::load_latest_specification;
use super::{PipelineContext, Stage, settle};
use crate::error::PipelineError;
use crate::prompts::{Prompt, PromptContext};
use crate::store::ArtifactFile;

/// Answers keyed by question id
pub type AnswerMap = BTreeMap<u32, String>;

/// Focus area a clarification question belongs to
///
/// The six known areas come from the analysis prompt. The model is not bound
/// by it, so any other label is kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    UserExperience,
    DataHandling,
    ErrorStates,
    CrossFeature,
    Performance,
    Security,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Self::UserExperience => "User Experience Edge Cases",
            Self::DataHandling => "Data Handling & Validation",
            Self::ErrorStates => "Error States & Failure Modes",
            Self::CrossFeature => "Cross-Feature Interactions",
            Self::Performance => "Performance & Scale",
            Self::Security => "Security & Privacy",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        match label.as_str() {
            "User Experience Edge Cases" => Self::UserExperience,
            "Data Handling & Validation" => Self::DataHandling,
            "Error States & Failure Modes" => Self::ErrorStates,
            "Cross-Feature Interactions" => Self::CrossFeature,
            "Performance & Scale" => Self::Performance,
            "Security & Privacy" => Self::Security,
            _ => Self::Other(label),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationQuestion {
    pub id: u32,
    pub category: Category,
    pub question: String,
    pub context: String,
    pub suggested_answer: String,
}

/// An answered question, as fed to the update prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaPair {
    pub id: u32,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
struct QuestionSet {
    #[serde(default)]
    questions: Vec<ClarificationQuestion>,
}

/// Parse the analysis response into questions, in response order
pub fn parse_questions(response: &str) -> Result<Vec<ClarificationQuestion>, PipelineError> {
    let json = extract_json_block(response);
    let set: QuestionSet = serde_json::from_str(json)
        .map_err(|e| PipelineError::Parse(format!("Failed to parse questions from model response: {}", e)))?;
    debug!(count = set.questions.len(), "parse_questions: parsed");
    Ok(set.questions)
}

/// Pair answers with the questions they belong to
///
/// Answers whose id matches no question are dropped. Fails when nothing is left.
pub fn build_qa_pairs(questions: &[ClarificationQuestion], answers: &AnswerMap) -> Result<Vec<QaPair>, PipelineError> {
    let pairs: Vec<QaPair> = questions
        .iter()
        .filter_map(|q| {
            answers.get(&q.id).map(|answer| QaPair {
                id: q.id,
                question: q.question.clone(),
                answer: answer.clone(),
            })
        })
        .collect();

    let dropped = answers.keys().filter(|id| !questions.iter().any(|q| q.id == **id)).count();
    if dropped > 0 {
        debug!(dropped, "build_qa_pairs: ignoring answers for unknown questions");
    }

    if pairs.is_empty() {
        return Err(PipelineError::Validation(
            "No answers provided to update specification".to_string(),
        ));
    }
    Ok(pairs)
}

#[derive(Debug)]
pub struct ClarifyState {
    pub answers: Option<AnswerMap>,
    pub spec_directory: Option<PathBuf>,
    pub specification: Option<String>,
    pub questions: Vec<ClarificationQuestion>,
    pub qa_pairs: Vec<QaPair>,
    pub updated_specification: Option<String>,
    pub stage: Stage,
    pub error: Option<PipelineError>,
}

super::impl_pipeline_state!(ClarifyState);

/// Result of a clarify run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarifyOutcome {
    /// Questions to put to the user; empty when nothing needs clarifying
    Questions(Vec<ClarificationQuestion>),
    /// Answers were merged into the specification in this directory
    Updated { spec_directory: PathBuf },
}

impl ClarifyState {
    fn new(answers: Option<AnswerMap>) -> Self {
        Self {
            answers,
            spec_directory: None,
            specification: None,
            questions: Vec::new(),
            qa_pairs: Vec::new(),
            updated_specification: None,
            stage: Stage::Start,
            error: None,
        }
    }

    pub fn into_result(self) -> Result<ClarifyOutcome, PipelineError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        match (self.updated_specification, self.spec_directory) {
            (Some(_), Some(spec_directory)) => Ok(ClarifyOutcome::Updated { spec_directory }),
            _ => Ok(ClarifyOutcome::Questions(self.questions)),
        }
    }
}

/// Asks clarification questions and merges answers back into the specification
pub struct ClarifyPipeline {
    ctx: PipelineContext,
}

impl ClarifyPipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    /// Run analysis, then merge `answers` when supplied
    ///
    /// An empty answer map counts as not supplied.
    pub async fn run(&self, answers: Option<AnswerMap>) -> ClarifyState {
        let answers = answers.filter(|a| !a.is_empty());
        debug!(answers = answers.as_ref().map(|a| a.len()), "ClarifyPipeline::run: called");
        let mut state = ClarifyState::new(answers);
        let result = self.execute(&mut state).await;
        settle("clarify", &mut state, result);
        state
    }

    async fn execute(&self, state: &mut ClarifyState) -> Result<(), PipelineError> {
        state.stage = Stage::Load;
        let (dir, specification) = load_latest_specification(&self.ctx.store)?;
        state.spec_directory = Some(dir.clone());

        state.stage = Stage::Analyze;
        let response = self
            .ctx
            .generate(Prompt::Clarify, &PromptContext::clarify(&specification))
            .await?;
        state.specification = Some(specification);
        state.questions = parse_questions(&response)?;
        info!(count = state.questions.len(), "Clarification questions generated");

        if state.questions.is_empty() {
            debug!("ClarifyPipeline::execute: nothing to clarify");
            return Ok(());
        }
        let Some(answers) = state.answers.as_ref() else {
            debug!("ClarifyPipeline::execute: no answers, returning questions");
            return Ok(());
        };

        state.stage = Stage::Update;
        state.qa_pairs = build_qa_pairs(&state.questions, answers)?;
        let context = PromptContext::clarify_update(
            state.specification.as_deref().unwrap_or_default(),
            state.qa_pairs.clone(),
        );
        let response = self.ctx.generate(Prompt::ClarifyUpdate, &context).await?;
        let updated = strip_markdown_fence(&response);

        state.stage = Stage::Save;
        let file = dir.join(ArtifactFile::Specification.file_name());
        self.ctx.store.write(&file, &updated)?;
        state.updated_specification = Some(updated);
        info!(file = %file.display(), pairs = state.qa_pairs.len(), "Specification updated with clarifications");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::prompts::PromptLoader;
    use crate::store::ArtifactStore;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    const TWO_QUESTIONS: &str = r#"```json
{
  "questions": [
    {
      "id": 1,
      "category": "Data Handling & Validation",
      "question": "What is the maximum export size?",
      "context": "Large reports may time out",
      "suggested_answer": "10,000 rows"
    },
    {
      "id": 2,
      "category": "Security & Privacy",
      "question": "Who may export?",
      "context": "Reports contain customer data",
      "suggested_answer": "Admins only"
    }
  ]
}
```"#;

    fn questions() -> Vec<ClarificationQuestion> {
        parse_questions(TWO_QUESTIONS).unwrap()
    }

    fn setup() -> (TempDir, ArtifactStore) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("specs"));
        fs::create_dir_all(store.root().join("001-csv-export")).unwrap();
        fs::write(store.root().join("001-csv-export/specification.md"), "# CSV Export").unwrap();
        (dir, store)
    }

    fn pipeline(store: &ArtifactStore, mock: Arc<MockLlmClient>) -> ClarifyPipeline {
        ClarifyPipeline::new(PipelineContext::new(mock, store.clone(), PromptLoader::embedded_only()))
    }

    #[test]
    fn test_parse_questions_keeps_order_and_fields() {
        let qs = questions();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].id, 1);
        assert_eq!(qs[0].category, Category::DataHandling);
        assert_eq!(qs[1].category, Category::Security);
        assert_eq!(qs[1].suggested_answer, "Admins only");
    }

    #[test]
    fn test_parse_questions_rejects_plain_text() {
        assert!(matches!(parse_questions("no json here"), Err(PipelineError::Parse(_))));
    }

    #[test]
    fn test_parse_questions_keeps_unlisted_category() {
        let response = r#"{"questions": [{"id": 1, "category": "Security and Privacy", "question": "q", "context": "c", "suggested_answer": "a"}]}"#;
        let qs = parse_questions(response).unwrap();

        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].category, Category::Other("Security and Privacy".to_string()));
        assert_eq!(qs[0].category.to_string(), "Security and Privacy");
    }

    #[test]
    fn test_parse_questions_rejects_non_string_category() {
        let response = r#"{"questions": [{"id": 1, "category": 7, "question": "q", "context": "c", "suggested_answer": "a"}]}"#;
        assert!(matches!(parse_questions(response), Err(PipelineError::Parse(_))));
    }

    #[test]
    fn test_parse_questions_missing_key_is_empty() {
        assert!(parse_questions("{}").unwrap().is_empty());
    }

    #[test]
    fn test_category_display_matches_wire_name() {
        for category in [
            Category::UserExperience,
            Category::DataHandling,
            Category::ErrorStates,
            Category::CrossFeature,
            Category::Performance,
            Category::Security,
            Category::Other("Accessibility".to_string()),
        ] {
            let wire = serde_json::to_string(&category).unwrap();
            assert_eq!(wire, format!("\"{}\"", category));
        }
    }

    #[test]
    fn test_build_qa_pairs_drops_unanswered() {
        let answers = AnswerMap::from([(1, "yes".to_string())]);
        let pairs = build_qa_pairs(&questions(), &answers).unwrap();

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].id, 1);
        assert_eq!(pairs[0].question, "What is the maximum export size?");
        assert_eq!(pairs[0].answer, "yes");
    }

    #[test]
    fn test_build_qa_pairs_unknown_ids_only() {
        let answers = AnswerMap::from([(99, "x".to_string())]);
        assert!(matches!(
            build_qa_pairs(&questions(), &answers),
            Err(PipelineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_no_questions_ends_without_update() {
        let (_dir, store) = setup();
        let mock = Arc::new(MockLlmClient::with_texts(["```json\n{\"questions\":[]}\n```"]));

        let answers = AnswerMap::from([(1, "yes".to_string())]);
        let state = pipeline(&store, mock.clone()).run(Some(answers)).await;

        assert_eq!(mock.call_count(), 1);
        assert_eq!(state.stage, Stage::Done);
        assert_eq!(state.into_result().unwrap(), ClarifyOutcome::Questions(vec![]));
    }

    #[tokio::test]
    async fn test_without_answers_returns_questions() {
        let (_dir, store) = setup();
        let mock = Arc::new(MockLlmClient::with_texts([TWO_QUESTIONS]));

        let outcome = pipeline(&store, mock.clone()).run(None).await.into_result().unwrap();

        assert_eq!(outcome, ClarifyOutcome::Questions(questions()));
        assert_eq!(mock.call_count(), 1);
        assert_eq!(
            fs::read_to_string(store.root().join("001-csv-export/specification.md")).unwrap(),
            "# CSV Export"
        );
    }

    #[tokio::test]
    async fn test_empty_answer_map_counts_as_none() {
        let (_dir, store) = setup();
        let mock = Arc::new(MockLlmClient::with_texts([TWO_QUESTIONS]));

        let outcome = pipeline(&store, mock.clone())
            .run(Some(AnswerMap::new()))
            .await
            .into_result()
            .unwrap();

        assert!(matches!(outcome, ClarifyOutcome::Questions(ref qs) if qs.len() == 2));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_answers_merged_and_saved() {
        let (_dir, store) = setup();
        let mock = Arc::new(MockLlmClient::with_texts([
            TWO_QUESTIONS,
            "```markdown\n# CSV Export\n\n## Clarifications\n- Admins only\n```\n",
        ]));

        let answers = AnswerMap::from([(2, "Admins only".to_string()), (7, "stray".to_string())]);
        let state = pipeline(&store, mock.clone()).run(Some(answers)).await;

        assert_eq!(state.qa_pairs.len(), 1);
        let outcome = state.into_result().unwrap();
        let dir = store.root().join("001-csv-export");
        assert_eq!(outcome, ClarifyOutcome::Updated { spec_directory: dir.clone() });
        assert_eq!(
            fs::read_to_string(dir.join("specification.md")).unwrap(),
            "# CSV Export\n\n## Clarifications\n- Admins only"
        );

        let update = &mock.requests()[1];
        assert_eq!(update.max_tokens, 8192);
        let user = update.user_text().unwrap();
        assert!(user.contains("**Q2: Who may export?**"));
        assert!(!user.contains("Q1:"));
    }

    #[tokio::test]
    async fn test_unknown_answers_fail_without_second_call() {
        let (_dir, store) = setup();
        let mock = Arc::new(MockLlmClient::with_texts([TWO_QUESTIONS, "unused"]));

        let answers = AnswerMap::from([(99, "x".to_string())]);
        let state = pipeline(&store, mock.clone()).run(Some(answers)).await;

        assert_eq!(state.stage, Stage::Update);
        assert!(matches!(state.error, Some(PipelineError::Validation(_))));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_analysis() {
        let (_dir, store) = setup();
        let mock = Arc::new(MockLlmClient::with_texts(["no json here"]));

        let state = pipeline(&store, mock).run(None).await;

        assert_eq!(state.stage, Stage::Analyze);
        assert!(matches!(state.into_result(), Err(PipelineError::Parse(_))));
    }
}
