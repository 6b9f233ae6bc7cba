//! Mechanical Progression Policy
//!
//! Applied when last week's feedback shows the day was handled as prescribed.
//! Every exercise advances by the smallest realistic step:
//! - numeric reps +1, AMRAP stays AMRAP
//! - tracked weight +1 equipment increment, sentinels untouched
//! - sets never change
//!
//! Key principles:
//! - Pure: no storage, no generator, never fails on well-formed input
//! - Day and exercise order are preserved
//! - The barbell floor is not re-applied here; normalization does that afterwards

use crate::models::{DailyWorkout, Exercise, Reps};
use crate::weight::step_up;

/// Progress a whole day
pub fn progress(workout: &DailyWorkout) -> DailyWorkout {
    DailyWorkout {
        day: workout.day,
        exercises: workout.exercises.iter().map(progress_exercise).collect(),
    }
}

/// Progress one exercise by a single step
pub fn progress_exercise(exercise: &Exercise) -> Exercise {
    Exercise {
        name: exercise.name.clone(),
        sets: exercise.sets,
        reps: next_reps(exercise.reps),
        weight: step_up(exercise.weight, exercise.equipment_class()),
        equipment: exercise.equipment,
    }
}

/// +1 rep; AMRAP is never incremented
pub fn next_reps(reps: Reps) -> Reps {
    match reps {
        Reps::Count(n) => Reps::Count(n.saturating_add(1)),
        Reps::Amrap => Reps::Amrap,
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
