//! Decide whether a day can be progressed mechanically or must be regenerated

use std::collections::HashMap;

use crate::models::{DailyWorkout, DailyWorkoutFeedback, Exercise, ExerciseFeedback, Reps};

/// Sets and reps prescribed for one exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prescription {
  pub sets: u32,
  pub reps: Reps,
}

impl Prescription {
  /// Stand-in for feedback that names no prescribed exercise
  pub const NONE: Prescription = Prescription {
    sets: 0,
    reps: Reps::Count(0),
  };

  pub fn of(exercise: &Exercise) -> Self {
    Prescription {
      sets: exercise.sets,
      reps: exercise.reps,
    }
  }
}

/// Exercise name -> prescribed exercise, built from last week's day.
/// When a name repeats, the later entry wins.
pub fn prescribed_exercises(previous: &DailyWorkout) -> HashMap<&str, &Exercise> {
  previous.exercises.iter().map(|e| (e.name.as_str(), e)).collect()
}

/// Prescription for a feedback entry, `Prescription::NONE` when unprescribed
fn prescription_for(prescribed: &HashMap<&str, &Exercise>, name: &str) -> Prescription {
  prescribed
    .get(name)
    .map(|exercise| Prescription::of(exercise))
    .unwrap_or(Prescription::NONE)
}

/// Fewer sets or reps than prescribed. Only compared when both sides are
/// numeric; an AMRAP on either side means no under-completion can be claimed.
pub fn is_under_completed(feedback: &ExerciseFeedback, prescribed: Prescription) -> bool {
  match (feedback.reps_completed, prescribed.reps) {
    (Reps::Count(done), Reps::Count(target)) => {
      feedback.sets_completed < prescribed.sets || done < target
    }
    _ => false,
  }
}

/// True when any exercise was not rated "appropriate" or was under-completed.
/// False means the whole day is eligible for mechanical progression.
pub fn needs_modification(feedback: &DailyWorkoutFeedback, previous: &DailyWorkout) -> bool {
  let prescribed = prescribed_exercises(previous);

  feedback.feedback.iter().any(|entry| {
    !entry.difficulty.is_appropriate() || is_under_completed(entry, prescription_for(&prescribed, &entry.name))
  })
}
