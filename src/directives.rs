//! Adjustment directives that accompany a regeneration request
//!
//! The generator is free to honor these or not; what is guaranteed here is
//! that they are computed consistently from the feedback.

use serde::{Deserialize, Serialize};

use crate::decision::{is_under_completed, prescribed_exercises, Prescription};
use crate::models::{DailyWorkout, DailyWorkoutFeedback, Exercise, ExerciseFeedback, Weight};
use crate::weight::{step_down, step_up};

/// Words in free-text notes that indicate strain rather than fatigue
const STRAIN_TERMS: &[&str] = &[
  "strain",
  "pain",
  "discomfort",
  "hurt",
  "injur",
  "tweak",
  "pinch",
  "sharp",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityDirective {
  /// Weight up one increment, or reps +1-2
  Increase,
  /// Weight down one increment, or reps/sets -1-2
  Decrease,
  /// Same intensity, optionally +1 rep
  Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDirective {
  pub exercise: String,
  pub intensity: IntensityDirective,
  /// One increment above or below the prescribed load, when the load is tracked
  #[serde(skip_serializing_if = "Option::is_none")]
  pub suggested_weight: Option<Weight>,
  /// Soreness 4-5: ease off exercises that share this one's muscle group
  pub reduce_related_muscle_group: bool,
  /// Notes mention strain: swap for a comparable exercise, never drop outright
  pub substitute: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}

impl ExerciseDirective {
  /// Advisory sentence(s) for the generator
  pub fn instruction(&self) -> String {
    let mut lines = Vec::new();

    let intensity = match (self.intensity, self.suggested_weight) {
      (IntensityDirective::Increase, Some(w)) => format!(
        "Increase intensity for {}: raise the weight to {} or add 1-2 reps.",
        self.exercise, w
      ),
      (IntensityDirective::Increase, None) => {
        format!("Increase intensity for {}: add 1-2 reps.", self.exercise)
      }
      (IntensityDirective::Decrease, Some(w)) => format!(
        "Decrease intensity for {}: lower the weight to {}, or cut 1-2 reps or a set.",
        self.exercise, w
      ),
      (IntensityDirective::Decrease, None) => format!(
        "Decrease intensity for {}: cut 1-2 reps or a set.",
        self.exercise
      ),
      (IntensityDirective::Hold, _) => format!(
        "Keep {} at the same intensity; optionally add 1 rep.",
        self.exercise
      ),
    };
    lines.push(intensity);

    if self.reduce_related_muscle_group {
      lines.push(format!(
        "High soreness after {}: reduce intensity for exercises targeting the same muscle group.",
        self.exercise
      ));
    }

    if self.substitute {
      lines.push(format!(
        "Notes on {} report strain or discomfort ({}): substitute a comparable, less taxing exercise for the same muscle group instead of dropping it.",
        self.exercise,
        self.notes.as_deref().unwrap_or("no details")
      ));
    }

    lines.join(" ")
  }
}

/// Free-text notes that read like strain or discomfort
pub fn mentions_strain(notes: &str) -> bool {
  let lower = notes.to_lowercase();
  STRAIN_TERMS.iter().any(|term| lower.contains(term))
}

/// One directive per feedback entry, in feedback order
pub fn build_directives(feedback: &DailyWorkoutFeedback, previous: &DailyWorkout) -> Vec<ExerciseDirective> {
  let prescribed = prescribed_exercises(previous);

  feedback
    .feedback
    .iter()
    .map(|entry| directive_for(entry, prescribed.get(entry.name.as_str()).copied()))
    .collect()
}

/// Intensity and suggested weight both come from the same prescribed entry
fn directive_for(entry: &ExerciseFeedback, prescribed: Option<&Exercise>) -> ExerciseDirective {
  let target = prescribed.map(Prescription::of).unwrap_or(Prescription::NONE);
  let under_completed = is_under_completed(entry, target);

  let intensity = if entry.difficulty.is_too_hard() || under_completed {
    IntensityDirective::Decrease
  } else if entry.difficulty.is_too_easy() {
    IntensityDirective::Increase
  } else {
    IntensityDirective::Hold
  };

  let suggested_weight = prescribed.and_then(|exercise| {
    let class = exercise.equipment_class();
    match (intensity, exercise.weight) {
      (_, w) if w.is_sentinel() => None,
      (IntensityDirective::Increase, w) => Some(step_up(w, class)),
      (IntensityDirective::Decrease, w) => Some(step_down(w, class)),
      (IntensityDirective::Hold, _) => None,
    }
  });

  ExerciseDirective {
    exercise: entry.name.clone(),
    intensity,
    suggested_weight,
    reduce_related_muscle_group: entry.soreness_level.is_some_and(|s| s.is_high()),
    substitute: entry.notes.as_deref().is_some_and(mentions_strain),
    notes: entry.notes.clone(),
  }
}
