//! Error types for the learning plan pipeline.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The learner profile was rejected before any generation happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid profile field `{field}`: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// The model service kept failing at the transport level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("LLM invocation failed after {attempts} attempt(s): {last_cause}")]
pub struct LlmInvocationError {
    pub attempts: usize,
    pub last_cause: String,
}

/// The model kept answering, but never with content that passed the schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{schema} output failed validation after {attempts} attempt(s): {violation}")]
pub struct SchemaValidationError {
    pub schema: &'static str,
    pub attempts: usize,
    pub violation: String,
    /// Raw text of the last rejected response.
    pub last_payload: String,
}

/// Failure of a single generation call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Invocation(#[from] LlmInvocationError),

    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
}

/// One of the three independent generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Roadmap,
    Quiz,
    Explanation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Roadmap => "roadmap",
            Stage::Quiz => "quiz",
            Stage::Explanation => "explanation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: GenerationError,
}

/// One or more stages failed; the plan was not assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("learning plan generation failed in {}", describe_failures(.failures))]
pub struct AggregationError {
    pub failures: Vec<StageFailure>,
}

impl AggregationError {
    pub fn failed_stages(&self) -> Vec<Stage> {
        self.failures.iter().map(|f| f.stage).collect()
    }

    pub fn error_for(&self, stage: Stage) -> Option<&GenerationError> {
        self.failures
            .iter()
            .find(|f| f.stage == stage)
            .map(|f| &f.error)
    }
}

fn describe_failures(failures: &[StageFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.stage, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Top-level error returned to callers of the pipeline.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error("learning plan generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("configuration error: {0}")]
    Config(String),
}
