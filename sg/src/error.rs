//! Pipeline error types

use std::path::PathBuf;
use thiserror::Error;

use crate::llm::LlmError;

/// Errors a pipeline run can end with
///
/// Messages are shown to the user verbatim.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad caller input (description too short, nothing to merge)
    #[error("{0}")]
    Validation(String),

    /// Missing prerequisite artifact or empty store
    #[error("{0}")]
    NotFound(String),

    /// Model response not in the expected structured format
    #[error("{0}")]
    Parse(String),

    /// Model call failed
    #[error("LLM request failed")]
    Gateway(#[from] LlmError),

    /// Filesystem failure
    #[error("Failed to {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Prompt template could not be loaded or rendered
    #[error("Prompt template error: {0}")]
    Template(String),
}

impl PipelineError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = PipelineError::Validation("Feature description cannot be empty".to_string());
        assert_eq!(err.to_string(), "Feature description cannot be empty");
    }

    #[test]
    fn test_io_message_names_path() {
        let err = PipelineError::io(
            "write",
            "/tmp/specs/001-x/plan.md",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );

        let msg = format!("{:#}", eyre::Report::new(err));
        assert!(msg.contains("write"));
        assert!(msg.contains("/tmp/specs/001-x/plan.md"));
        assert_eq!(msg.matches("denied").count(), 1);
    }

    #[test]
    fn test_gateway_wraps_llm_error() {
        let err: PipelineError = LlmError::InvalidResponse("empty".to_string()).into();
        assert!(matches!(err, PipelineError::Gateway(_)));

        let msg = format!("{:#}", eyre::Report::new(err));
        assert_eq!(msg, "LLM request failed: Invalid response: empty");
    }
}
