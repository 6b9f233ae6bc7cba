use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
  Male,
  Female,
  Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessGoal {
  LoseWeight,
  BuildMuscle,
  StayFit,
  ImproveEndurance,
  IncreaseFlexibility,
}

impl FitnessGoal {
  pub fn as_str(&self) -> &'static str {
    match self {
      FitnessGoal::LoseWeight => "lose_weight",
      FitnessGoal::BuildMuscle => "build_muscle",
      FitnessGoal::StayFit => "stay_fit",
      FitnessGoal::ImproveEndurance => "improve_endurance",
      FitnessGoal::IncreaseFlexibility => "increase_flexibility",
    }
  }
}

/// Stored as 1 (beginner), 2 (intermediate), 3 (expert)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ExperienceLevel {
  #[default]
  Beginner,
  Intermediate,
  Expert,
}

impl TryFrom<u8> for ExperienceLevel {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      1 => Ok(Self::Beginner),
      2 => Ok(Self::Intermediate),
      3 => Ok(Self::Expert),
      _ => Err(format!("Unknown experience level: {}", value)),
    }
  }
}

impl From<ExperienceLevel> for u8 {
  fn from(level: ExperienceLevel) -> Self {
    match level {
      ExperienceLevel::Beginner => 1,
      ExperienceLevel::Intermediate => 2,
      ExperienceLevel::Expert => 3,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GymStrength {
  pub bench_press_max: f64,
  pub squat_max: f64,
  pub deadlift_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeStrength {
  pub pushups_reps: u32,
  pub pullups_reps: u32,
  pub bodyweight_squats_reps: u32,
}

/// Where the user trains, derived from their equipment list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingContext {
  Gym,
  Home,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub name: String,
  #[serde(default)]
  pub age: Option<u32>,
  pub height_cm: f64,
  pub weight_kg: f64,
  #[serde(default)]
  pub fat_percentage: Option<f64>,
  #[serde(default)]
  pub experience_level: ExperienceLevel,
  #[serde(default)]
  pub equipment: Vec<String>,
  #[serde(default)]
  pub fitness_goal: Option<FitnessGoal>,
  pub gender: Gender,
  #[serde(default)]
  pub gym_strength: Option<GymStrength>,
  #[serde(default)]
  pub home_strength: Option<HomeStrength>,
}

impl UserProfile {
  /// Gym iff the equipment list has barbells or dumbbells
  pub fn training_context(&self) -> TrainingContext {
    let has_free_weights = self
      .equipment
      .iter()
      .any(|e| e.eq_ignore_ascii_case("barbells") || e.eq_ignore_ascii_case("dumbbells"));
    if has_free_weights {
      TrainingContext::Gym
    } else {
      TrainingContext::Home
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::mock_user_profile;
  use serde_json::json;

  #[test]
  fn test_training_context_from_equipment() {
    let mut profile = mock_user_profile();
    profile.equipment = vec!["barbells".into(), "bench".into()];
    assert_eq!(profile.training_context(), TrainingContext::Gym);

    profile.equipment = vec!["yoga mat".into()];
    assert_eq!(profile.training_context(), TrainingContext::Home);

    profile.equipment.clear();
    assert_eq!(profile.training_context(), TrainingContext::Home);
  }

  #[test]
  fn test_profile_defaults() {
    let profile: UserProfile = serde_json::from_value(json!({
      "name": "Alex",
      "height_cm": 175.0,
      "weight_kg": 72.5,
      "gender": "other"
    }))
    .unwrap();

    assert_eq!(profile.experience_level, ExperienceLevel::Beginner);
    assert!(profile.equipment.is_empty());
    assert!(profile.fitness_goal.is_none());
  }

  #[test]
  fn test_experience_level_wire_format() {
    let level: ExperienceLevel = serde_json::from_value(json!(2)).unwrap();
    assert_eq!(level, ExperienceLevel::Intermediate);
    assert!(serde_json::from_value::<ExperienceLevel>(json!(4)).is_err());
  }
}
