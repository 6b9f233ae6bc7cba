//! SQLite persistence for users, workouts, feedback and the conversation log
//!
//! Week windows are computed from `created_at`, which is always written from
//! Rust as a fixed-width RFC3339 UTC string so range comparisons in SQL are
//! plain string comparisons.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::models::{
  DailyWorkout, DailyWorkoutFeedback, Difficulty, Exercise, ExerciseFeedback, Reps, Soreness, UserProfile,
  Weekday,
};

pub type DbPool = SqlitePool;

/// Application state: database pool plus loaded configuration
pub struct AppState {
  pub db: DbPool,
  pub config: AppConfig,
}

#[derive(Error, Debug)]
pub enum StorageError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration failed: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Corrupt stored data: {0}")]
  Decode(String),
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(db_url: &str) -> Result<DbPool, StorageError> {
  info!(db_url, "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}

/// Format used for every stored timestamp
pub fn timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// ---------------------------------------------------------------------------
/// Storage Interface
/// ---------------------------------------------------------------------------

/// "Previous week" is 14 to 7 days ago, "current week" the last 7 days.
#[async_trait]
pub trait WorkoutStore: Send + Sync {
  async fn save_user(&self, profile: &UserProfile) -> Result<i64, StorageError>;

  async fn load_user(&self, user_id: i64) -> Result<Option<UserProfile>, StorageError>;

  async fn save_workout(&self, user_id: i64, workout: &DailyWorkout) -> Result<i64, StorageError>;

  /// Save every day with its conversation entry, all or nothing. Returns the
  /// workout ids in input order.
  async fn save_week(&self, user_id: i64, week: &[DailyWorkout]) -> Result<Vec<i64>, StorageError>;

  /// Most recent workout for `day` from the previous week
  async fn load_previous_workout(&self, user_id: i64, day: Weekday) -> Result<Option<DailyWorkout>, StorageError>;

  /// Every workout from the previous week, newest first
  async fn load_previous_week(&self, user_id: i64) -> Result<Vec<DailyWorkout>, StorageError>;

  /// Feedback attached to the workout `load_previous_workout` returns.
  /// None when that workout is missing or has no feedback.
  async fn load_feedback(&self, user_id: i64, day: Weekday) -> Result<Option<DailyWorkoutFeedback>, StorageError>;

  /// Attach feedback to this week's workout for its day. Returns the workout
  /// id, or None when there is no such workout.
  async fn save_feedback(&self, user_id: i64, feedback: &DailyWorkoutFeedback) -> Result<Option<i64>, StorageError>;

  async fn count_current_week(&self, user_id: i64) -> Result<i64, StorageError>;

  /// Monday to Sunday, most recent workout per day, rest days filled in
  async fn load_current_week(&self, user_id: i64) -> Result<Vec<DailyWorkout>, StorageError>;

  async fn record_conversation(
    &self,
    user_id: i64,
    workout_id: Option<i64>,
    action: &str,
    data: &serde_json::Value,
  ) -> Result<i64, StorageError>;
}

/// ---------------------------------------------------------------------------
/// SQLite Implementation
/// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct SqliteStore {
  pool: DbPool,
}

impl SqliteStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }

  /// Insert a workout with an explicit creation time
  pub async fn save_workout_at(
    &self,
    user_id: i64,
    workout: &DailyWorkout,
    created_at: DateTime<Utc>,
  ) -> Result<i64, StorageError> {
    let mut conn = self.pool.acquire().await?;
    insert_workout(&mut conn, user_id, workout, created_at).await
  }

  /// Insert a feedback row set against a known workout
  pub async fn save_feedback_for(
    &self,
    user_id: i64,
    workout_id: i64,
    feedback: &DailyWorkoutFeedback,
  ) -> Result<(), StorageError> {
    let now = timestamp(Utc::now());
    let mut tx = self.pool.begin().await?;

    for entry in &feedback.feedback {
      sqlx::query(
        r#"
        INSERT INTO feedback (
          user_id, workout_id, exercise_name, sets_completed, reps_completed,
          difficulty, notes, soreness_level, created_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
      )
      .bind(user_id)
      .bind(workout_id)
      .bind(&entry.name)
      .bind(entry.sets_completed as i64)
      .bind(entry.reps_completed.to_string())
      .bind(entry.difficulty.value() as i64)
      .bind(&entry.notes)
      .bind(entry.soreness_level.map(|s| s.value() as i64))
      .bind(&now)
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;
    Ok(())
  }

  /// Most recent workout id for `day` with `from <= created_at < to`
  async fn latest_workout_between(
    &self,
    user_id: i64,
    day: Weekday,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
  ) -> Result<Option<(i64, DailyWorkout)>, StorageError> {
    let row: Option<(i64, String, String)> = sqlx::query_as(
      r#"
      SELECT id, day, exercises_json
      FROM workouts
      WHERE user_id = ?1 AND day = ?2 AND created_at >= ?3 AND created_at < ?4
      ORDER BY created_at DESC, id DESC
      LIMIT 1
      "#,
    )
    .bind(user_id)
    .bind(day.as_str())
    .bind(timestamp(from))
    .bind(timestamp(to))
    .fetch_optional(&self.pool)
    .await?;

    row
      .map(|(id, day, exercises)| decode_workout(&day, &exercises).map(|w| (id, w)))
      .transpose()
  }

  /// Workouts with `created_at >= from`, optionally bounded above, newest first
  async fn workouts_since(
    &self,
    user_id: i64,
    from: DateTime<Utc>,
    to: Option<DateTime<Utc>>,
  ) -> Result<Vec<DailyWorkout>, StorageError> {
    let rows: Vec<(String, String)> = sqlx::query_as(
      r#"
      SELECT day, exercises_json
      FROM workouts
      WHERE user_id = ?1 AND created_at >= ?2 AND (?3 IS NULL OR created_at < ?3)
      ORDER BY created_at DESC, id DESC
      "#,
    )
    .bind(user_id)
    .bind(timestamp(from))
    .bind(to.map(timestamp))
    .fetch_all(&self.pool)
    .await?;

    rows
      .iter()
      .map(|(day, exercises)| decode_workout(day, exercises))
      .collect()
  }
}

/// Window boundaries relative to now
fn previous_week_window() -> (DateTime<Utc>, DateTime<Utc>) {
  let now = Utc::now();
  (now - Duration::days(14), now - Duration::days(7))
}

fn current_week_start() -> DateTime<Utc> {
  Utc::now() - Duration::days(7)
}

async fn insert_workout(
  conn: &mut SqliteConnection,
  user_id: i64,
  workout: &DailyWorkout,
  created_at: DateTime<Utc>,
) -> Result<i64, StorageError> {
  let exercises_json =
    serde_json::to_string(&workout.exercises).map_err(|e| StorageError::Decode(e.to_string()))?;

  let result = sqlx::query(
    r#"
    INSERT INTO workouts (user_id, day, exercises_json, created_at)
    VALUES (?1, ?2, ?3, ?4)
    "#,
  )
  .bind(user_id)
  .bind(workout.day.as_str())
  .bind(exercises_json)
  .bind(timestamp(created_at))
  .execute(&mut *conn)
  .await?;

  Ok(result.last_insert_rowid())
}

async fn insert_conversation(
  conn: &mut SqliteConnection,
  user_id: i64,
  workout_id: Option<i64>,
  action: &str,
  data: &serde_json::Value,
) -> Result<i64, StorageError> {
  let result = sqlx::query(
    r#"
    INSERT INTO conversations (user_id, workout_id, action, data_json, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
  )
  .bind(user_id)
  .bind(workout_id)
  .bind(action)
  .bind(data.to_string())
  .bind(timestamp(Utc::now()))
  .execute(&mut *conn)
  .await?;

  Ok(result.last_insert_rowid())
}

fn decode_workout(day: &str, exercises_json: &str) -> Result<DailyWorkout, StorageError> {
  let day: Weekday = day.parse().map_err(|e| StorageError::Decode(format!("{}", e)))?;
  let exercises: Vec<Exercise> = serde_json::from_str(exercises_json)
    .map_err(|e| StorageError::Decode(format!("Workout exercises for {}: {}", day, e)))?;
  Ok(DailyWorkout { day, exercises })
}

type FeedbackRow = (String, i64, String, i64, Option<String>, Option<i64>);

fn decode_feedback((name, sets, reps, difficulty, notes, soreness): FeedbackRow) -> Result<ExerciseFeedback, StorageError> {
  let decode = |e: crate::error::MalformedInput| StorageError::Decode(format!("Feedback for {}: {}", name, e));

  Ok(ExerciseFeedback {
    sets_completed: u32::try_from(sets)
      .map_err(|_| StorageError::Decode(format!("Negative sets for {}: {}", name, sets)))?,
    reps_completed: reps.parse::<Reps>().map_err(decode)?,
    difficulty: Difficulty::try_from(difficulty).map_err(decode)?,
    soreness_level: soreness.map(Soreness::try_from).transpose().map_err(decode)?,
    notes,
    name,
  })
}

#[async_trait]
impl WorkoutStore for SqliteStore {
  async fn save_user(&self, profile: &UserProfile) -> Result<i64, StorageError> {
    let profile_json = serde_json::to_string(profile).map_err(|e| StorageError::Decode(e.to_string()))?;

    let result = sqlx::query("INSERT INTO users (name, profile_json, created_at) VALUES (?1, ?2, ?3)")
      .bind(&profile.name)
      .bind(profile_json)
      .bind(timestamp(Utc::now()))
      .execute(&self.pool)
      .await?;

    Ok(result.last_insert_rowid())
  }

  async fn load_user(&self, user_id: i64) -> Result<Option<UserProfile>, StorageError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT profile_json FROM users WHERE id = ?1")
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await?;

    row
      .map(|(json,)| {
        serde_json::from_str(&json).map_err(|e| StorageError::Decode(format!("User {}: {}", user_id, e)))
      })
      .transpose()
  }

  async fn save_workout(&self, user_id: i64, workout: &DailyWorkout) -> Result<i64, StorageError> {
    self.save_workout_at(user_id, workout, Utc::now()).await
  }

  async fn save_week(&self, user_id: i64, week: &[DailyWorkout]) -> Result<Vec<i64>, StorageError> {
    let now = Utc::now();
    let mut tx = self.pool.begin().await?;
    let mut ids = Vec::with_capacity(week.len());

    for workout in week {
      let workout_id = insert_workout(&mut tx, user_id, workout, now).await?;
      insert_conversation(
        &mut tx,
        user_id,
        Some(workout_id),
        &format!("Generated workout for {}", workout.day),
        &serde_json::json!(workout),
      )
      .await?;
      ids.push(workout_id);
    }

    tx.commit().await?;
    debug!(user_id, days = ids.len(), "Week stored");
    Ok(ids)
  }

  async fn load_previous_workout(&self, user_id: i64, day: Weekday) -> Result<Option<DailyWorkout>, StorageError> {
    let (from, to) = previous_week_window();
    Ok(self.latest_workout_between(user_id, day, from, to).await?.map(|(_, w)| w))
  }

  async fn load_previous_week(&self, user_id: i64) -> Result<Vec<DailyWorkout>, StorageError> {
    let (from, to) = previous_week_window();
    self.workouts_since(user_id, from, Some(to)).await
  }

  async fn load_feedback(&self, user_id: i64, day: Weekday) -> Result<Option<DailyWorkoutFeedback>, StorageError> {
    let (from, to) = previous_week_window();
    let Some((workout_id, _)) = self.latest_workout_between(user_id, day, from, to).await? else {
      return Ok(None);
    };

    let rows: Vec<FeedbackRow> = sqlx::query_as(
      r#"
      SELECT exercise_name, sets_completed, reps_completed, difficulty, notes, soreness_level
      FROM feedback
      WHERE workout_id = ?1
      ORDER BY id
      "#,
    )
    .bind(workout_id)
    .fetch_all(&self.pool)
    .await?;

    if rows.is_empty() {
      return Ok(None);
    }

    let feedback = rows.into_iter().map(decode_feedback).collect::<Result<Vec<_>, _>>()?;
    Ok(Some(DailyWorkoutFeedback { day, feedback }))
  }

  async fn save_feedback(&self, user_id: i64, feedback: &DailyWorkoutFeedback) -> Result<Option<i64>, StorageError> {
    let now = Utc::now();
    // Upper bound is open-ended; anything written "now" must still match
    let found = self
      .latest_workout_between(user_id, feedback.day, current_week_start(), now + Duration::seconds(1))
      .await?;

    let Some((workout_id, _)) = found else {
      return Ok(None);
    };

    self.save_feedback_for(user_id, workout_id, feedback).await?;
    debug!(user_id, workout_id, entries = feedback.feedback.len(), "Feedback stored");
    Ok(Some(workout_id))
  }

  async fn count_current_week(&self, user_id: i64) -> Result<i64, StorageError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workouts WHERE user_id = ?1 AND created_at >= ?2")
      .bind(user_id)
      .bind(timestamp(current_week_start()))
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }

  async fn load_current_week(&self, user_id: i64) -> Result<Vec<DailyWorkout>, StorageError> {
    let mut latest: HashMap<Weekday, DailyWorkout> = HashMap::new();
    for workout in self.workouts_since(user_id, current_week_start(), None).await? {
      // Rows are newest first
      latest.entry(workout.day).or_insert(workout);
    }

    Ok(
      Weekday::ALL
        .iter()
        .map(|day| latest.remove(day).unwrap_or_else(|| DailyWorkout::rest_day(*day)))
        .collect(),
    )
  }

  async fn record_conversation(
    &self,
    user_id: i64,
    workout_id: Option<i64>,
    action: &str,
    data: &serde_json::Value,
  ) -> Result<i64, StorageError> {
    let mut conn = self.pool.acquire().await?;
    insert_conversation(&mut conn, user_id, workout_id, action, data).await
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
