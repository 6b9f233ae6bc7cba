use serde::{Deserialize, Serialize};

use super::workout::{Reps, Weekday};
use crate::error::MalformedInput;

/// Perceived difficulty on a 1-5 scale: 1-2 too easy, 3 appropriate, 4-5 too hard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
  pub fn new(value: u8) -> Result<Self, MalformedInput> {
    Self::try_from(i64::from(value))
  }

  pub fn value(&self) -> u8 {
    self.0
  }

  pub fn is_too_easy(&self) -> bool {
    self.0 <= 2
  }

  pub fn is_appropriate(&self) -> bool {
    self.0 == 3
  }

  pub fn is_too_hard(&self) -> bool {
    self.0 >= 4
  }
}

impl TryFrom<i64> for Difficulty {
  type Error = MalformedInput;

  fn try_from(value: i64) -> Result<Self, Self::Error> {
    match value {
      1..=5 => Ok(Difficulty(value as u8)),
      _ => Err(MalformedInput::Difficulty(value)),
    }
  }
}

impl From<Difficulty> for u8 {
  fn from(d: Difficulty) -> Self {
    d.0
  }
}

/// Soreness on a 1-5 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Soreness(u8);

impl Soreness {
  pub fn new(value: u8) -> Result<Self, MalformedInput> {
    Self::try_from(i64::from(value))
  }

  pub fn value(&self) -> u8 {
    self.0
  }

  /// 4 or 5
  pub fn is_high(&self) -> bool {
    self.0 >= 4
  }
}

impl TryFrom<i64> for Soreness {
  type Error = MalformedInput;

  fn try_from(value: i64) -> Result<Self, Self::Error> {
    match value {
      1..=5 => Ok(Soreness(value as u8)),
      _ => Err(MalformedInput::Soreness(value)),
    }
  }
}

impl From<Soreness> for u8 {
  fn from(s: Soreness) -> Self {
    s.0
  }
}

/// What the user actually did for one prescribed exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseFeedback {
  /// Matched against the prescribed exercise by exact name
  pub name: String,
  pub sets_completed: u32,
  pub reps_completed: Reps,
  pub difficulty: Difficulty,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub soreness_level: Option<Soreness>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWorkoutFeedback {
  pub day: Weekday,
  pub feedback: Vec<ExerciseFeedback>,
}
