pub mod commands;
pub mod config;
pub mod db;
pub mod decision;
pub mod directives;
pub mod error;
pub mod generation;
pub mod llm;
pub mod models;
pub mod planner;
pub mod progression;
pub mod weight;

#[cfg(test)]
mod test_utils;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use db::AppState;
use models::Weekday;

#[derive(Parser)]
#[command(
  name = "workout-planner",
  about = "Feedback-driven weekly workout planner",
  long_about = "Generate weekly workouts, record feedback, and progress or regenerate each day from that feedback"
)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Store a user profile and print its id
  CreateUser {
    /// Path to a JSON profile
    #[arg(long)]
    profile: PathBuf,
  },
  /// Print a stored user profile
  User {
    #[arg(long)]
    user: i64,
  },
  /// Generate this week's workouts unless a full week already exists
  GenerateWeek {
    #[arg(long)]
    user: i64,
  },
  /// Show this week's workouts, Monday to Sunday
  Week {
    #[arg(long)]
    user: i64,
  },
  /// Record feedback for one of this week's days
  Feedback {
    #[arg(long)]
    user: i64,
    /// Path to a JSON daily feedback document
    #[arg(long)]
    file: PathBuf,
  },
  /// Progress or regenerate next week's workout for a day
  Next {
    #[arg(long)]
    user: i64,
    /// Defaults to today
    #[arg(long)]
    day: Option<Weekday>,
  },
}

/// Logs go to stderr; stdout carries JSON only
fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

fn read_file(path: &PathBuf) -> Result<String, String> {
  std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
  let json = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize output: {}", e))?;
  println!("{}", json);
  Ok(())
}

async fn dispatch(state: &AppState, command: Command) -> Result<(), String> {
  match command {
    Command::CreateUser { profile } => {
      let user_id = commands::users::create_user(state, &read_file(&profile)?).await?;
      print_json(&serde_json::json!({ "user_id": user_id }))
    }
    Command::User { user } => print_json(&commands::users::get_user(state, user).await?),
    Command::GenerateWeek { user } => print_json(&commands::workouts::generate_week(state, user).await?),
    Command::Week { user } => print_json(&commands::workouts::get_week(state, user).await?),
    Command::Feedback { user, file } => {
      let workout_id = commands::workouts::submit_feedback(state, user, &read_file(&file)?).await?;
      print_json(&serde_json::json!({ "workout_id": workout_id, "message": "Feedback submitted" }))
    }
    Command::Next { user, day } => {
      let day = day.unwrap_or_else(Weekday::today);
      print_json(&commands::workouts::next_workout(state, user, day).await?)
    }
  }
}

async fn run_cli(cli: Cli) -> Result<(), String> {
  let config = AppConfig::from_env().map_err(|e| e.to_string())?;
  let pool = db::initialize_db(&config.database_url)
    .await
    .map_err(|e| format!("Failed to initialize database: {}", e))?;

  let state = AppState { db: pool, config };
  let result = dispatch(&state, cli.command).await;
  state.db.close().await;
  result
}

pub fn run() -> ExitCode {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();
  init_tracing();

  let cli = Cli::parse();

  let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
    Ok(runtime) => runtime,
    Err(e) => {
      eprintln!("Failed to start async runtime: {}", e);
      return ExitCode::FAILURE;
    }
  };

  match runtime.block_on(run_cli(cli)) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      error!(error = %e, "Command failed");
      eprintln!("{}", e);
      ExitCode::FAILURE
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cli_parses_next_with_day() {
    let cli = Cli::try_parse_from(["workout-planner", "next", "--user", "3", "--day", "friday"]).unwrap();
    assert!(matches!(cli.command, Command::Next { user: 3, day: Some(Weekday::Friday) }));

    let cli = Cli::try_parse_from(["workout-planner", "next", "--user", "3"]).unwrap();
    assert!(matches!(cli.command, Command::Next { day: None, .. }));
  }

  #[test]
  fn test_cli_rejects_unknown_day() {
    assert!(Cli::try_parse_from(["workout-planner", "next", "--user", "3", "--day", "someday"]).is_err());
    assert!(Cli::try_parse_from(["workout-planner", "week"]).is_err());
  }

  #[test]
  fn test_cli_parses_user() {
    let cli = Cli::try_parse_from(["workout-planner", "user", "--user", "9"]).unwrap();
    assert!(matches!(cli.command, Command::User { user: 9 }));
  }
}
