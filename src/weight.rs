//! Weight normalization
//!
//! Keeps every prescribed load on an increment that real equipment can
//! produce. Barbell lifts move in 5 kg steps and never go below the empty
//! bar; dumbbells, cables and machines move in 2.5 kg steps.
//!
//! Rounding is half away from zero (`f64::round`), so 22.5 kg on a barbell
//! becomes 25.0 kg and 11.25 kg on a dumbbell becomes 12.5 kg.

use serde::{Deserialize, Serialize};

use crate::error::MalformedInput;
use crate::models::{DailyWorkout, Exercise, Weight};

pub const BARBELL_INCREMENT_KG: f64 = 5.0;
pub const STANDARD_INCREMENT_KG: f64 = 2.5;
/// Unloaded Olympic bar
pub const EMPTY_BAR_KG: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentClass {
  Barbell,
  Dumbbell,
  CableMachine,
}

impl EquipmentClass {
  /// Classify from the exercise name. Used when an exercise carries no explicit tag.
  ///
  /// Precedence: "Barbell", or "Press" without "Dumbbell", is a barbell lift;
  /// then "Dumbbell", "Raise" or "Extension"; everything else is cable/machine.
  pub fn classify(exercise_name: &str) -> Self {
    let has = |needle: &str| exercise_name.contains(needle);

    if has("Barbell") || (has("Press") && !has("Dumbbell")) {
      EquipmentClass::Barbell
    } else if has("Dumbbell") || has("Raise") || has("Extension") {
      EquipmentClass::Dumbbell
    } else {
      EquipmentClass::CableMachine
    }
  }

  pub fn increment(&self) -> f64 {
    match self {
      EquipmentClass::Barbell => BARBELL_INCREMENT_KG,
      EquipmentClass::Dumbbell | EquipmentClass::CableMachine => STANDARD_INCREMENT_KG,
    }
  }

  pub fn floor(&self) -> Option<f64> {
    match self {
      EquipmentClass::Barbell => Some(EMPTY_BAR_KG),
      _ => None,
    }
  }

  /// Nearest multiple of the increment, ignoring the floor.
  /// Never returns -0.0, which would print as "-0.0kg".
  pub fn snap(&self, kg: f64) -> f64 {
    let increment = self.increment();
    let snapped = (kg / increment).round() * increment;
    if snapped == 0.0 {
      0.0
    } else {
      snapped
    }
  }

  /// Nearest multiple of the increment, clamped to the floor
  pub fn round(&self, kg: f64) -> f64 {
    let snapped = self.snap(kg);
    match self.floor() {
      Some(floor) => snapped.max(floor),
      None => snapped,
    }
  }
}

/// Round a weight for the given class. Sentinels pass through unchanged.
pub fn normalize(weight: Weight, class: EquipmentClass) -> Weight {
  match weight {
    Weight::Kilograms(kg) => Weight::Kilograms(class.round(kg)),
    sentinel => sentinel,
  }
}

/// Normalize a raw weight string for a named exercise, e.g. `("47kg", "Barbell Row") -> "45.0kg"`
pub fn normalize_str(weight: &str, exercise_name: &str) -> Result<String, MalformedInput> {
  let parsed: Weight = weight.parse()?;
  Ok(normalize(parsed, EquipmentClass::classify(exercise_name)).to_string())
}

pub fn normalize_exercise(exercise: &Exercise) -> Exercise {
  Exercise {
    weight: normalize(exercise.weight, exercise.equipment_class()),
    ..exercise.clone()
  }
}

pub fn normalize_workout(workout: &DailyWorkout) -> DailyWorkout {
  DailyWorkout {
    day: workout.day,
    exercises: workout.exercises.iter().map(normalize_exercise).collect(),
  }
}

/// One increment heavier, snapped to the grid
pub fn step_up(weight: Weight, class: EquipmentClass) -> Weight {
  match weight {
    Weight::Kilograms(kg) => Weight::Kilograms(class.snap(kg + class.increment())),
    sentinel => sentinel,
  }
}

/// One increment lighter, never below the class floor or zero
pub fn step_down(weight: Weight, class: EquipmentClass) -> Weight {
  match weight {
    Weight::Kilograms(kg) => {
      let lighter = class.round(kg - class.increment()).max(0.0);
      Weight::Kilograms(lighter)
    }
    sentinel => sentinel,
  }
}
