use crate::commands::{plan_error, planner};
use crate::db::{AppState, SqliteStore, WorkoutStore};
use crate::models::{DailyWorkout, DailyWorkoutFeedback, Weekday};
use crate::planner::PlannedWorkout;

/// ---------------------------------------------------------------------------
/// Weekly Plan Commands
/// ---------------------------------------------------------------------------

/// Return this week's plan, generating it first if incomplete
pub async fn generate_week(state: &AppState, user_id: i64) -> Result<Vec<DailyWorkout>, String> {
  let store = SqliteStore::new(state.db.clone());
  let existing = store
    .count_current_week(user_id)
    .await
    .map_err(|e| format!("Failed to count workouts: {}", e))?;

  // Only build a generator when one is needed
  if existing >= Weekday::ALL.len() as i64 {
    return get_week(state, user_id).await;
  }

  planner(state)?.generate_week(user_id).await.map_err(plan_error)
}

/// Current week, Monday to Sunday, rest days filled in
pub async fn get_week(state: &AppState, user_id: i64) -> Result<Vec<DailyWorkout>, String> {
  let week = SqliteStore::new(state.db.clone())
    .load_current_week(user_id)
    .await
    .map_err(|e| format!("Failed to fetch weekly workout: {}", e))?;

  if week.iter().all(DailyWorkout::is_rest_day) {
    return Err(format!("No workouts found for user {} in the current week", user_id));
  }

  Ok(week)
}

/// ---------------------------------------------------------------------------
/// Feedback and Next Workout
/// ---------------------------------------------------------------------------

/// Store feedback given as JSON; returns the workout it was attached to
pub async fn submit_feedback(state: &AppState, user_id: i64, feedback_json: &str) -> Result<i64, String> {
  let feedback: DailyWorkoutFeedback =
    serde_json::from_str(feedback_json).map_err(|e| format!("Invalid feedback: {}", e))?;

  crate::planner::submit_feedback(&SqliteStore::new(state.db.clone()), user_id, &feedback)
    .await
    .map_err(plan_error)
}

/// Decide, produce and persist next week's workout for `day`
pub async fn next_workout(state: &AppState, user_id: i64, day: Weekday) -> Result<PlannedWorkout, String> {
  planner(state)?
    .decide_and_produce_workout(user_id, day)
    .await
    .map_err(plan_error)
}
