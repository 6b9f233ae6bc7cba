//! Command handlers behind the CLI subcommands
//!
//! Handlers return `Result<_, String>` so the binary can print failures
//! directly; planner errors are prefixed with their kind.

pub mod users;
pub mod workouts;

use crate::db::{AppState, SqliteStore};
use crate::error::PlanError;
use crate::llm::GeminiClient;
use crate::planner::WorkoutPlanner;

/// Planner backed by the app database and the configured Gemini client
pub(crate) fn planner(state: &AppState) -> Result<WorkoutPlanner<SqliteStore, GeminiClient>, String> {
  let generator =
    GeminiClient::from_config(&state.config).map_err(|e| format!("Failed to create Gemini client: {}", e))?;
  Ok(WorkoutPlanner::new(
    SqliteStore::new(state.db.clone()),
    generator,
    state.config.generation_timeout,
  ))
}

pub(crate) fn plan_error(e: PlanError) -> String {
  format!("{}: {}", e.kind(), e)
}
