//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - A scripted generator standing in for the model

use crate::config::AppConfig;
use crate::db::{AppState, SqliteStore, WorkoutStore};
use crate::directives::build_directives;
use crate::generation::{RegenerationContext, WorkoutGenerator};
use crate::llm::LlmError;
use crate::models::{
  DailyWorkout, DailyWorkoutFeedback, Difficulty, Exercise, ExerciseFeedback, ExperienceLevel, FitnessGoal,
  Gender, GymStrength, Reps, UserProfile, Weekday, Weight,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// App state over `pool` with a fixed config; no API key unless given
pub fn mock_app_state(pool: &SqlitePool) -> AppState {
  AppState {
    db: pool.clone(),
    config: mock_config(None),
  }
}

pub fn mock_config(api_base: Option<&str>) -> AppConfig {
  AppConfig {
    database_url: "sqlite::memory:".to_string(),
    gemini_api_key: api_base.map(|_| "test-key".to_string()),
    gemini_model: crate::llm::DEFAULT_MODEL.to_string(),
    gemini_api_base: url::Url::parse(api_base.unwrap_or(crate::llm::DEFAULT_API_BASE)).expect("valid url"),
    generation_timeout: std::time::Duration::from_secs(5),
  }
}

/// Insert the mock profile and return its id
pub async fn seed_test_user(store: &SqliteStore) -> i64 {
  store
    .save_user(&mock_user_profile())
    .await
    .expect("Failed to seed user")
}

/// Store a workout created `days_ago` and, if given, feedback attached to it
pub async fn seed_test_history(
  store: &SqliteStore,
  user_id: i64,
  workout: &DailyWorkout,
  feedback: Option<&DailyWorkoutFeedback>,
  days_ago: i64,
) -> i64 {
  let workout_id = store
    .save_workout_at(user_id, workout, datetime_days_ago(days_ago))
    .await
    .expect("Failed to seed workout");

  if let Some(feedback) = feedback {
    store
      .save_feedback_for(user_id, workout_id, feedback)
      .await
      .expect("Failed to seed feedback");
  }

  workout_id
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Gym-context profile aiming to build muscle
pub fn mock_user_profile() -> UserProfile {
  UserProfile {
    name: "Jordan".to_string(),
    age: Some(29),
    height_cm: 180.0,
    weight_kg: 82.5,
    fat_percentage: Some(18.0),
    experience_level: ExperienceLevel::Intermediate,
    equipment: vec!["barbells".to_string(), "dumbbells".to_string(), "bench".to_string()],
    fitness_goal: Some(FitnessGoal::BuildMuscle),
    gender: Gender::Other,
    gym_strength: Some(GymStrength {
      bench_press_max: 80.0,
      squat_max: 110.0,
      deadlift_max: 140.0,
    }),
    home_strength: None,
  }
}

/// Three exercises covering barbell, dumbbell and bodyweight/AMRAP handling
pub fn mock_workout(day: Weekday) -> DailyWorkout {
  DailyWorkout {
    day,
    exercises: vec![
      Exercise::new("Barbell Bench Press", 3, Reps::Count(10), Weight::Kilograms(45.0)),
      Exercise::new("Dumbbell Lateral Raise", 3, Reps::Count(12), Weight::Kilograms(7.5)),
      Exercise::new("Push-Up", 3, Reps::Amrap, Weight::Bodyweight),
    ],
  }
}

/// Feedback completing every exercise of `mock_workout` at one difficulty
pub fn mock_feedback(day: Weekday, difficulty: u8) -> DailyWorkoutFeedback {
  let difficulty = Difficulty::new(difficulty).expect("difficulty in range");
  DailyWorkoutFeedback {
    day,
    feedback: mock_workout(day)
      .exercises
      .into_iter()
      .map(|exercise| ExerciseFeedback {
        name: exercise.name,
        sets_completed: exercise.sets,
        reps_completed: exercise.reps,
        difficulty,
        notes: None,
        soreness_level: None,
      })
      .collect(),
  }
}

/// Monday context built from "too hard" feedback
pub fn mock_regeneration_context() -> RegenerationContext {
  let previous = mock_workout(Weekday::Monday);
  let feedback = mock_feedback(Weekday::Monday, 4);
  let directives = build_directives(&feedback, &previous);
  RegenerationContext::new(
    mock_user_profile(),
    previous.clone(),
    vec![previous, mock_workout(Weekday::Wednesday)],
    feedback,
    directives,
  )
}

/// ---------------------------------------------------------------------------
/// Scripted Generator
/// ---------------------------------------------------------------------------

/// Returns canned model text and records what it was asked
#[derive(Default)]
pub struct ScriptedGenerator {
  day_reply: Option<String>,
  week_reply: Option<String>,
  delay: Option<std::time::Duration>,
  pub day_requests: Mutex<Vec<RegenerationContext>>,
  pub week_requests: AtomicUsize,
}

impl ScriptedGenerator {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_day_reply(mut self, reply: impl Into<String>) -> Self {
    self.day_reply = Some(reply.into());
    self
  }

  pub fn with_week_reply(mut self, reply: impl Into<String>) -> Self {
    self.week_reply = Some(reply.into());
    self
  }

  pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn day_calls(&self) -> usize {
    self.day_requests.lock().expect("lock poisoned").len()
  }

  pub fn week_calls(&self) -> usize {
    self.week_requests.load(Ordering::SeqCst)
  }

  async fn reply(&self, reply: &Option<String>) -> Result<String, LlmError> {
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    reply
      .clone()
      .ok_or_else(|| LlmError::Api("no scripted reply".to_string()))
  }
}

#[async_trait]
impl WorkoutGenerator for ScriptedGenerator {
  async fn generate_day(&self, context: &RegenerationContext) -> Result<String, LlmError> {
    self.day_requests.lock().expect("lock poisoned").push(context.clone());
    self.reply(&self.day_reply).await
  }

  async fn generate_week(&self, _profile: &UserProfile) -> Result<String, LlmError> {
    self.week_requests.fetch_add(1, Ordering::SeqCst);
    self.reply(&self.week_reply).await
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Create a DateTime N days ago from now
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('users', 'workouts', 'feedback', 'conversations')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 4, "Expected 4 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_history_attaches_feedback() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());
    let user = seed_test_user(&store).await;

    let feedback = mock_feedback(Weekday::Monday, 3);
    let workout_id = seed_test_history(&store, user, &mock_workout(Weekday::Monday), Some(&feedback), 10).await;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback WHERE workout_id = ?1")
      .bind(workout_id)
      .fetch_one(&pool)
      .await
      .expect("Failed to count feedback");

    assert_eq!(count, 3);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let profile = mock_user_profile();
    assert_eq!(profile.training_context(), crate::models::TrainingContext::Gym);

    let workout = mock_workout(Weekday::Friday);
    let feedback = mock_feedback(Weekday::Friday, 3);
    assert_eq!(workout.exercises.len(), feedback.feedback.len());
    assert!(!crate::decision::needs_modification(&feedback, &workout));
  }
}
