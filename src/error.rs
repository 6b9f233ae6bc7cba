//! Error taxonomy for the planner
//!
//! Every failure kind the planner can report stays distinguishable at the
//! call site: missing history, malformed data, a failed generation, or a
//! storage failure.

use thiserror::Error;

use crate::db::StorageError;
use crate::llm::LlmError;

/// Data-integrity failures in workout or feedback values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedInput {
  #[error("Malformed weight: '{0}'")]
  Weight(String),

  #[error("Unrecognized reps value: '{0}'")]
  Reps(String),

  #[error("Difficulty must be between 1 and 5, got {0}")]
  Difficulty(i64),

  #[error("Soreness level must be between 1 and 5, got {0}")]
  Soreness(i64),

  #[error("Unknown weekday: '{0}'")]
  Weekday(String),

  #[error("Exercise '{0}' must prescribe at least one set")]
  Sets(String),

  #[error("Feedback for {0} lists no exercises")]
  EmptyFeedback(String),
}

#[derive(Error, Debug)]
pub enum PlanError {
  /// No previous workout, feedback or profile to plan from
  #[error("Missing prior data: {0}")]
  MissingPriorData(String),

  #[error(transparent)]
  MalformedInput(#[from] MalformedInput),

  #[error("Generation failed: {0}")]
  GenerationFailed(#[from] LlmError),

  #[error("Storage failure: {0}")]
  Storage(#[from] StorageError),
}

impl PlanError {
  pub fn missing(what: impl Into<String>) -> Self {
    PlanError::MissingPriorData(what.into())
  }

  /// Stable kind label for logs and CLI output
  pub fn kind(&self) -> &'static str {
    match self {
      PlanError::MissingPriorData(_) => "missing_prior_data",
      PlanError::MalformedInput(_) => "malformed_input",
      PlanError::GenerationFailed(_) => "generation_failed",
      PlanError::Storage(_) => "storage_failure",
    }
  }
}
