use crate::db::{AppState, SqliteStore, WorkoutStore};
use crate::models::UserProfile;

/// Store a new profile from its JSON representation
pub async fn create_user(state: &AppState, profile_json: &str) -> Result<i64, String> {
  let profile: UserProfile =
    serde_json::from_str(profile_json).map_err(|e| format!("Invalid user profile: {}", e))?;

  SqliteStore::new(state.db.clone())
    .save_user(&profile)
    .await
    .map_err(|e| format!("Failed to save user: {}", e))
}

pub async fn get_user(state: &AppState, user_id: i64) -> Result<UserProfile, String> {
  SqliteStore::new(state.db.clone())
    .load_user(user_id)
    .await
    .map_err(|e| format!("Failed to load user: {}", e))?
    .ok_or_else(|| format!("User {} not found", user_id))
}
