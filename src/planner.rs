//! Weekly workout orchestrator
//!
//! Per (user, day) the planner walks
//! `AwaitingDecision -> Progressing | Regenerating -> Normalized -> Persisted`.
//!
//! Key principles:
//! - Missing history is fatal for the day; nothing is invented in its place
//! - A failed or timed-out generation fails the day, never falls back to progression
//! - Nothing is persisted unless every exercise of the day parsed and normalized

use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::db::WorkoutStore;
use crate::decision::needs_modification;
use crate::directives::build_directives;
use crate::error::{MalformedInput, PlanError};
use crate::generation::{parse_daily_workout, parse_weekly_workouts, RegenerationContext, WorkoutGenerator};
use crate::llm::LlmError;
use crate::models::{DailyWorkout, DailyWorkoutFeedback, TrainingContext, UserProfile, Weekday};
use crate::progression::progress;
use crate::weight::normalize_workout;

/// ---------------------------------------------------------------------------
/// Plan State
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
  AwaitingDecision,
  Progressing,
  Regenerating,
  Normalized,
  Persisted,
}

impl PlanState {
  pub fn as_str(&self) -> &'static str {
    match self {
      PlanState::AwaitingDecision => "awaiting_decision",
      PlanState::Progressing => "progressing",
      PlanState::Regenerating => "regenerating",
      PlanState::Normalized => "normalized",
      PlanState::Persisted => "persisted",
    }
  }
}

/// How the day was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanPath {
  Progressed,
  Regenerated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedWorkout {
  pub workout_id: i64,
  pub path: PlanPath,
  pub workout: DailyWorkout,
}

/// ---------------------------------------------------------------------------
/// Planner
/// ---------------------------------------------------------------------------

pub struct WorkoutPlanner<S, G> {
  store: S,
  generator: G,
  generation_timeout: Duration,
}

impl<S: WorkoutStore, G: WorkoutGenerator> WorkoutPlanner<S, G> {
  pub fn new(store: S, generator: G, generation_timeout: Duration) -> Self {
    Self {
      store,
      generator,
      generation_timeout,
    }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn generator(&self) -> &G {
    &self.generator
  }

  /// Produce and persist next week's workout for `day`
  #[instrument(skip(self))]
  pub async fn decide_and_produce_workout(&self, user_id: i64, day: Weekday) -> Result<PlannedWorkout, PlanError> {
    enter(PlanState::AwaitingDecision, user_id, day);

    let previous = self
      .store
      .load_previous_workout(user_id, day)
      .await?
      .ok_or_else(|| PlanError::missing(format!("no workout for {} from the previous week", day)))?;
    let feedback = self
      .store
      .load_feedback(user_id, day)
      .await?
      .ok_or_else(|| PlanError::missing(format!("no feedback for {} from the previous week", day)))?;

    let (path, workout) = if needs_modification(&feedback, &previous) {
      enter(PlanState::Regenerating, user_id, day);
      let workout = self.regenerate(user_id, previous, feedback).await?;
      (PlanPath::Regenerated, workout)
    } else {
      enter(PlanState::Progressing, user_id, day);
      (PlanPath::Progressed, normalize_workout(&progress(&previous)))
    };
    enter(PlanState::Normalized, user_id, day);

    let workout_id = self.store.save_workout(user_id, &workout).await?;
    enter(PlanState::Persisted, user_id, day);

    self
      .store
      .record_conversation(
        user_id,
        Some(workout_id),
        &format!("Generated next workout for {}", day),
        &serde_json::json!(&workout),
      )
      .await?;

    info!(user_id, %day, workout_id, path = ?path, "Workout planned");
    Ok(PlannedWorkout {
      workout_id,
      path,
      workout,
    })
  }

  async fn regenerate(
    &self,
    user_id: i64,
    previous: DailyWorkout,
    feedback: DailyWorkoutFeedback,
  ) -> Result<DailyWorkout, PlanError> {
    let day = previous.day;
    let profile = self.load_profile(user_id).await?;
    let previous_week = self.store.load_previous_week(user_id).await?;

    let directives = build_directives(&feedback, &previous);
    debug!(user_id, %day, directives = directives.len(), "Built adjustment directives");

    let context = RegenerationContext::new(profile, previous, previous_week, feedback, directives);
    let raw = self.with_timeout(self.generator.generate_day(&context)).await?;
    let workout = parse_daily_workout(&raw, day)?;

    warn_on_sentinels(&context.profile, &workout);
    Ok(workout)
  }

  /// Return this week's plan, generating and storing one if it is incomplete
  #[instrument(skip(self))]
  pub async fn generate_week(&self, user_id: i64) -> Result<Vec<DailyWorkout>, PlanError> {
    let existing = self.store.count_current_week(user_id).await?;
    if existing >= Weekday::ALL.len() as i64 {
      info!(user_id, existing, "Returning existing week");
      return Ok(self.store.load_current_week(user_id).await?);
    }

    let profile = self.load_profile(user_id).await?;
    let raw = self.with_timeout(self.generator.generate_week(&profile)).await?;
    let week = parse_weekly_workouts(&raw)?;

    for workout in &week {
      warn_on_sentinels(&profile, workout);
    }

    self.store.save_week(user_id, &week).await?;

    info!(user_id, days = week.len(), "Generated and saved week");
    Ok(week)
  }

  /// Attach feedback to this week's workout for its day; returns the workout id
  pub async fn submit_feedback(&self, user_id: i64, feedback: &DailyWorkoutFeedback) -> Result<i64, PlanError> {
    submit_feedback(&self.store, user_id, feedback).await
  }

  async fn load_profile(&self, user_id: i64) -> Result<UserProfile, PlanError> {
    self
      .store
      .load_user(user_id)
      .await?
      .ok_or_else(|| PlanError::missing(format!("no profile for user {}", user_id)))
  }

  async fn with_timeout<F>(&self, call: F) -> Result<String, PlanError>
  where
    F: Future<Output = Result<String, LlmError>>,
  {
    match tokio::time::timeout(self.generation_timeout, call).await {
      Ok(result) => result.map_err(|e| {
        error!(error = %e, "Generation failed");
        PlanError::from(e)
      }),
      Err(_) => {
        error!(timeout = ?self.generation_timeout, "Generation timed out");
        Err(LlmError::Timeout(self.generation_timeout).into())
      }
    }
  }
}

/// Feedback only needs storage, so it is usable without a generator
#[instrument(skip(store, feedback), fields(day = %feedback.day))]
pub async fn submit_feedback<S: WorkoutStore>(
  store: &S,
  user_id: i64,
  feedback: &DailyWorkoutFeedback,
) -> Result<i64, PlanError> {
  // Zero stored rows would read back as "no feedback" next week
  if feedback.feedback.is_empty() {
    return Err(MalformedInput::EmptyFeedback(feedback.day.to_string()).into());
  }

  let workout_id = store
    .save_feedback(user_id, feedback)
    .await?
    .ok_or_else(|| PlanError::missing(format!("no workout for {} in the current week", feedback.day)))?;

  store
    .record_conversation(
      user_id,
      Some(workout_id),
      &format!("Submitted feedback for {}", feedback.day),
      &serde_json::json!(feedback),
    )
    .await?;

  info!(user_id, workout_id, entries = feedback.feedback.len(), "Feedback submitted");
  Ok(workout_id)
}

fn enter(state: PlanState, user_id: i64, day: Weekday) {
  debug!(user_id, %day, state = state.as_str(), "Plan state");
}

/// Gym exercises are expected to carry a tracked weight
fn warn_on_sentinels(profile: &UserProfile, workout: &DailyWorkout) {
  if profile.training_context() != TrainingContext::Gym {
    return;
  }
  for exercise in workout.exercises.iter().filter(|e| e.weight.is_sentinel()) {
    warn!(
      day = %workout.day,
      exercise = %exercise.name,
      weight = %exercise.weight,
      "Gym exercise has no tracked weight"
    );
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
