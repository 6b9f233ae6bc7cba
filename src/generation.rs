//! Generation collaborator interface and payload parsing
//!
//! A generator turns planning context into raw model text. Parsing that text
//! happens here so every generator implementation gets the same checks:
//! structural problems are generation failures, bad values are malformed input.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::directives::ExerciseDirective;
use crate::error::PlanError;
use crate::llm::{extract_json, LlmError};
use crate::models::{
  DailyWorkout, DailyWorkoutFeedback, Exercise, ExercisePayload, TrainingContext, UserProfile, Weekday,
};
use crate::weight::normalize_workout;

/// Everything the generator needs to rewrite one day
#[derive(Debug, Clone, Serialize)]
pub struct RegenerationContext {
  pub profile: UserProfile,
  pub training_context: TrainingContext,
  pub target_day: Weekday,
  pub previous_workout: DailyWorkout,
  /// Last week's full plan, for keeping the weekly split intact
  pub previous_week: Vec<DailyWorkout>,
  pub feedback: DailyWorkoutFeedback,
  pub directives: Vec<ExerciseDirective>,
  /// Rendered directive sentences, in directive order
  pub adjustment_notes: Vec<String>,
}

impl RegenerationContext {
  pub fn new(
    profile: UserProfile,
    previous_workout: DailyWorkout,
    previous_week: Vec<DailyWorkout>,
    feedback: DailyWorkoutFeedback,
    directives: Vec<ExerciseDirective>,
  ) -> Self {
    let adjustment_notes = directives.iter().map(|d| d.instruction()).collect();
    Self {
      training_context: profile.training_context(),
      target_day: previous_workout.day,
      profile,
      previous_workout,
      previous_week,
      feedback,
      directives,
      adjustment_notes,
    }
  }

  /// Serialize to JSON for the prompt
  pub fn to_json(&self) -> String {
    serde_json::to_string_pretty(self).unwrap_or_default()
  }
}

#[async_trait]
pub trait WorkoutGenerator: Send + Sync {
  /// Raw model output for one regenerated day
  async fn generate_day(&self, context: &RegenerationContext) -> Result<String, LlmError>;

  /// Raw model output for a full Monday-Sunday week
  async fn generate_week(&self, profile: &UserProfile) -> Result<String, LlmError>;
}

#[derive(Debug, Deserialize)]
struct DayPayload {
  day: String,
  #[serde(default)]
  exercises: Vec<ExercisePayload>,
}

impl DayPayload {
  fn into_workout(self) -> Result<DailyWorkout, PlanError> {
    let day: Weekday = self
      .day
      .parse()
      .map_err(|_| LlmError::Parse(format!("Unknown day in generated workout: '{}'", self.day)))?;

    let exercises = self
      .exercises
      .into_iter()
      .map(Exercise::try_from)
      .collect::<Result<Vec<_>, _>>()?;

    Ok(normalize_workout(&DailyWorkout { day, exercises }))
  }
}

/// Parse and normalize one generated day. Any malformed exercise fails the whole day.
pub fn parse_daily_workout(raw: &str, expected_day: Weekday) -> Result<DailyWorkout, PlanError> {
  let json = extract_json(raw)?;
  let payload: DayPayload =
    serde_json::from_str(&json).map_err(|e| LlmError::Parse(format!("{}: {}", e, json)))?;

  let workout = payload.into_workout()?;
  if workout.day != expected_day {
    return Err(
      LlmError::Parse(format!(
        "Generated workout is for {}, expected {}",
        workout.day, expected_day
      ))
      .into(),
    );
  }

  Ok(workout)
}

/// Parse and normalize a generated week
pub fn parse_weekly_workouts(raw: &str) -> Result<Vec<DailyWorkout>, PlanError> {
  let json = extract_json(raw)?;
  let payloads: Vec<DayPayload> =
    serde_json::from_str(&json).map_err(|e| LlmError::Parse(format!("{}: {}", e, json)))?;

  if payloads.is_empty() {
    return Err(LlmError::Parse("Generated week is empty".to_string()).into());
  }

  let mut week = payloads
    .into_iter()
    .map(DayPayload::into_workout)
    .collect::<Result<Vec<_>, _>>()?;

  week.sort_by_key(|w| w.day);
  if week.windows(2).any(|pair| pair[0].day == pair[1].day) {
    return Err(LlmError::Parse("Generated week repeats a day".to_string()).into());
  }

  Ok(week)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::MalformedInput;
  use crate::models::{Reps, Weight};
  use crate::test_utils::mock_regeneration_context;

  #[test]
  fn test_parse_daily_workout_normalizes() {
    let raw = r#"```json
{"day": "Monday", "exercises": [
  {"name": "Barbell Bench Press", "sets": 3, "reps": 8, "weight": "47kg"},
  {"name": "Lateral Raise", "sets": 3, "reps": "AMRAP", "weight": "6kg"},
  {"name": "Plank", "sets": 3, "reps": 45}
]}
```"#;

    let workout = parse_daily_workout(raw, Weekday::Monday).unwrap();
    assert_eq!(workout.exercises[0].weight, Weight::Kilograms(45.0));
    assert_eq!(workout.exercises[1].weight, Weight::Kilograms(5.0));
    assert_eq!(workout.exercises[1].reps, Reps::Amrap);
    assert_eq!(workout.exercises[2].weight, Weight::NotApplicable);
  }

  #[test]
  fn test_parse_daily_workout_not_json() {
    let err = parse_daily_workout("I cannot help with that.", Weekday::Monday).unwrap_err();
    assert!(matches!(err, PlanError::GenerationFailed(_)));
  }

  #[test]
  fn test_parse_daily_workout_schema_mismatch() {
    let err = parse_daily_workout(r#"{"workout": []}"#, Weekday::Monday).unwrap_err();
    assert!(matches!(err, PlanError::GenerationFailed(LlmError::Parse(_))));
  }

  #[test]
  fn test_parse_daily_workout_wrong_day() {
    let err = parse_daily_workout(r#"{"day": "Tuesday", "exercises": []}"#, Weekday::Monday).unwrap_err();
    assert!(matches!(err, PlanError::GenerationFailed(_)));
  }

  #[test]
  fn test_parse_daily_workout_malformed_weight_fails_whole_day() {
    let raw = r#"{"day": "Monday", "exercises": [
      {"name": "Barbell Squat", "sets": 3, "reps": 5, "weight": "80kg"},
      {"name": "Leg Curl", "sets": 3, "reps": 10, "weight": "medium"}
    ]}"#;
    let err = parse_daily_workout(raw, Weekday::Monday).unwrap_err();
    assert!(matches!(
      err,
      PlanError::MalformedInput(MalformedInput::Weight(ref w)) if w == "medium"
    ));
  }

  #[test]
  fn test_parse_daily_workout_unrecognized_reps() {
    let raw = r#"{"day": "Monday", "exercises": [
      {"name": "Burpee", "sets": 3, "reps": "to failure", "weight": "bodyweight"}
    ]}"#;
    let err = parse_daily_workout(raw, Weekday::Monday).unwrap_err();
    assert!(matches!(err, PlanError::MalformedInput(MalformedInput::Reps(_))));
  }

  #[test]
  fn test_parse_weekly_workouts_sorted() {
    let raw = r#"[
      {"day": "Wednesday", "exercises": [{"name": "Deadlift", "sets": 3, "reps": 5, "weight": "101kg"}]},
      {"day": "Monday", "exercises": []},
      {"day": "Tuesday", "exercises": [{"name": "Overhead Press", "sets": 3, "reps": 8, "weight": "31kg"}]}
    ]"#;

    let week = parse_weekly_workouts(raw).unwrap();
    let days: Vec<Weekday> = week.iter().map(|w| w.day).collect();
    assert_eq!(days, vec![Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday]);
    assert!(week[0].is_rest_day());
    assert_eq!(week[1].exercises[0].weight, Weight::Kilograms(30.0));
    assert_eq!(week[2].exercises[0].weight, Weight::Kilograms(100.0));
  }

  #[test]
  fn test_parse_weekly_workouts_rejects_duplicates_and_empty() {
    let dup = r#"[{"day": "Monday", "exercises": []}, {"day": "monday", "exercises": []}]"#;
    assert!(matches!(parse_weekly_workouts(dup), Err(PlanError::GenerationFailed(_))));
    assert!(matches!(parse_weekly_workouts("[]"), Err(PlanError::GenerationFailed(_))));
  }

  #[test]
  fn test_regeneration_context_renders_directives() {
    let context = mock_regeneration_context();
    assert_eq!(context.target_day, Weekday::Monday);
    assert_eq!(context.adjustment_notes.len(), context.directives.len());

    let json = context.to_json();
    assert!(json.contains("\"target_day\": \"Monday\""));
    assert!(json.contains("\"training_context\": \"gym\""));
  }
}
