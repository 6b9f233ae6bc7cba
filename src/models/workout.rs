use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MalformedInput;
use crate::weight::EquipmentClass;

/// ---------------------------------------------------------------------------
/// Weekday
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Weekday {
  Monday,
  Tuesday,
  Wednesday,
  Thursday,
  Friday,
  Saturday,
  Sunday,
}

impl Weekday {
  pub const ALL: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Weekday::Monday => "Monday",
      Weekday::Tuesday => "Tuesday",
      Weekday::Wednesday => "Wednesday",
      Weekday::Thursday => "Thursday",
      Weekday::Friday => "Friday",
      Weekday::Saturday => "Saturday",
      Weekday::Sunday => "Sunday",
    }
  }

  /// The local weekday right now
  pub fn today() -> Self {
    use chrono::Datelike;
    chrono::Local::now().weekday().into()
  }
}

impl From<chrono::Weekday> for Weekday {
  fn from(day: chrono::Weekday) -> Self {
    match day {
      chrono::Weekday::Mon => Weekday::Monday,
      chrono::Weekday::Tue => Weekday::Tuesday,
      chrono::Weekday::Wed => Weekday::Wednesday,
      chrono::Weekday::Thu => Weekday::Thursday,
      chrono::Weekday::Fri => Weekday::Friday,
      chrono::Weekday::Sat => Weekday::Saturday,
      chrono::Weekday::Sun => Weekday::Sunday,
    }
  }
}

impl fmt::Display for Weekday {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Weekday {
  type Err = MalformedInput;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    Weekday::ALL
      .into_iter()
      .find(|d| d.as_str().eq_ignore_ascii_case(trimmed))
      .ok_or_else(|| MalformedInput::Weekday(s.to_string()))
  }
}

impl TryFrom<String> for Weekday {
  type Error = MalformedInput;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Weekday> for String {
  fn from(day: Weekday) -> Self {
    day.as_str().to_string()
  }
}

/// ---------------------------------------------------------------------------
/// Reps: a rep count or AMRAP
/// ---------------------------------------------------------------------------

pub const AMRAP: &str = "AMRAP";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reps {
  Count(u32),
  /// As many reps as possible
  Amrap,
}

impl Reps {
  /// Parse the loosely-typed wire value: an integer or the AMRAP sentinel.
  /// Integral floats and digit strings are accepted since model output is not strict about either.
  pub fn from_value(value: &serde_json::Value) -> Result<Self, MalformedInput> {
    match value {
      serde_json::Value::Number(n) => {
        if let Some(v) = n.as_u64() {
          return u32::try_from(v)
            .map(Reps::Count)
            .map_err(|_| MalformedInput::Reps(n.to_string()));
        }
        match n.as_f64() {
          Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Ok(Reps::Count(f as u32)),
          _ => Err(MalformedInput::Reps(n.to_string())),
        }
      }
      serde_json::Value::String(s) => s.parse(),
      other => Err(MalformedInput::Reps(other.to_string())),
    }
  }

  pub fn to_value(self) -> serde_json::Value {
    match self {
      Reps::Count(n) => serde_json::Value::from(n),
      Reps::Amrap => serde_json::Value::from(AMRAP),
    }
  }
}

impl fmt::Display for Reps {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Reps::Count(n) => write!(f, "{}", n),
      Reps::Amrap => f.write_str(AMRAP),
    }
  }
}

impl FromStr for Reps {
  type Err = MalformedInput;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case(AMRAP) {
      return Ok(Reps::Amrap);
    }
    trimmed
      .parse::<u32>()
      .map(Reps::Count)
      .map_err(|_| MalformedInput::Reps(s.to_string()))
  }
}

impl Serialize for Reps {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    match self {
      Reps::Count(n) => serializer.serialize_u32(*n),
      Reps::Amrap => serializer.serialize_str(AMRAP),
    }
  }
}

impl<'de> Deserialize<'de> for Reps {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let value = serde_json::Value::deserialize(deserializer)?;
    Reps::from_value(&value).map_err(serde::de::Error::custom)
  }
}

/// ---------------------------------------------------------------------------
/// Weight: kilograms or one of the untracked sentinels
/// ---------------------------------------------------------------------------

pub const BODYWEIGHT: &str = "bodyweight";
pub const NOT_APPLICABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Weight {
  Kilograms(f64),
  Bodyweight,
  #[default]
  NotApplicable,
}

impl Weight {
  pub fn kilograms(&self) -> Option<f64> {
    match self {
      Weight::Kilograms(kg) => Some(*kg),
      _ => None,
    }
  }

  pub fn is_sentinel(&self) -> bool {
    !matches!(self, Weight::Kilograms(_))
  }
}

impl fmt::Display for Weight {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Weight::Kilograms(kg) => write!(f, "{:.1}kg", kg),
      Weight::Bodyweight => f.write_str(BODYWEIGHT),
      Weight::NotApplicable => f.write_str(NOT_APPLICABLE),
    }
  }
}

impl FromStr for Weight {
  type Err = MalformedInput;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case(BODYWEIGHT) {
      return Ok(Weight::Bodyweight);
    }
    if trimmed.eq_ignore_ascii_case(NOT_APPLICABLE) {
      return Ok(Weight::NotApplicable);
    }

    let magnitude = trimmed
      .strip_suffix("kg")
      .or_else(|| trimmed.strip_suffix("KG"))
      .or_else(|| trimmed.strip_suffix("Kg"))
      .unwrap_or(trimmed)
      .trim();

    match magnitude.parse::<f64>() {
      // abs() folds "-0" into 0.0
      Ok(kg) if kg.is_finite() && kg >= 0.0 => Ok(Weight::Kilograms(kg.abs())),
      _ => Err(MalformedInput::Weight(s.to_string())),
    }
  }
}

impl Serialize for Weight {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Weight {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

/// ---------------------------------------------------------------------------
/// Exercise
/// ---------------------------------------------------------------------------

/// Loosely-typed exercise as it arrives from the generator or the database.
/// Converting it into an `Exercise` is where malformed values are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExercisePayload {
  pub name: String,
  pub sets: u32,
  pub reps: serde_json::Value,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub weight: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub equipment: Option<EquipmentClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExercisePayload", into = "ExercisePayload")]
pub struct Exercise {
  pub name: String,
  pub sets: u32,
  pub reps: Reps,
  pub weight: Weight,
  /// Explicit equipment tag; when absent the class is derived from the name
  pub equipment: Option<EquipmentClass>,
}

impl Exercise {
  pub fn new(name: impl Into<String>, sets: u32, reps: Reps, weight: Weight) -> Self {
    Self {
      name: name.into(),
      sets,
      reps,
      weight,
      equipment: None,
    }
  }

  pub fn with_equipment(mut self, equipment: EquipmentClass) -> Self {
    self.equipment = Some(equipment);
    self
  }

  /// Equipment class used for increments: the explicit tag, else the name heuristic
  pub fn equipment_class(&self) -> EquipmentClass {
    self
      .equipment
      .unwrap_or_else(|| EquipmentClass::classify(&self.name))
  }
}

impl TryFrom<ExercisePayload> for Exercise {
  type Error = MalformedInput;

  fn try_from(payload: ExercisePayload) -> Result<Self, Self::Error> {
    if payload.sets == 0 {
      return Err(MalformedInput::Sets(payload.name));
    }

    let reps = Reps::from_value(&payload.reps)?;
    if reps == Reps::Count(0) {
      return Err(MalformedInput::Reps("0".to_string()));
    }

    let weight = match payload.weight.as_deref() {
      Some(raw) => raw.parse()?,
      None => Weight::NotApplicable,
    };

    Ok(Self {
      name: payload.name,
      sets: payload.sets,
      reps,
      weight,
      equipment: payload.equipment,
    })
  }
}

impl From<Exercise> for ExercisePayload {
  fn from(exercise: Exercise) -> Self {
    Self {
      name: exercise.name,
      sets: exercise.sets,
      reps: exercise.reps.to_value(),
      weight: Some(exercise.weight.to_string()),
      equipment: exercise.equipment,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Daily Workout
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWorkout {
  pub day: Weekday,
  pub exercises: Vec<Exercise>,
}

impl DailyWorkout {
  pub fn rest_day(day: Weekday) -> Self {
    Self {
      day,
      exercises: Vec::new(),
    }
  }

  pub fn is_rest_day(&self) -> bool {
    self.exercises.is_empty()
  }
}
