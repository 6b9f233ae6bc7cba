//! Runtime configuration loaded from the environment
//!
//! `.env` is read by `run()` before this is called, so values there behave
//! exactly like exported variables.

use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::llm::{DEFAULT_API_BASE, DEFAULT_MODEL};

/// ---------------------------------------------------------------------------
/// Defaults
/// ---------------------------------------------------------------------------

pub const DEFAULT_DATABASE_URL: &str = "sqlite://workout-planner.db?mode=rwc";
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
  #[error("Invalid value for {var}: '{value}'")]
  Invalid { var: String, value: String },
}

impl ConfigError {
  fn invalid(var: &str, value: &str) -> Self {
    ConfigError::Invalid {
      var: var.to_string(),
      value: value.to_string(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_url: String,
  /// Only needed by commands that call the generator
  pub gemini_api_key: Option<String>,
  pub gemini_model: String,
  pub gemini_api_base: Url,
  pub generation_timeout: Duration,
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let api_base = env_or("GEMINI_API_BASE", DEFAULT_API_BASE);
    let gemini_api_base = Url::parse(&api_base)
      .ok()
      .filter(|url| matches!(url.scheme(), "http" | "https"))
      .ok_or_else(|| ConfigError::invalid("GEMINI_API_BASE", &api_base))?;

    let timeout = env_or("GENERATION_TIMEOUT_SECS", &DEFAULT_GENERATION_TIMEOUT_SECS.to_string());
    let timeout_secs = timeout
      .trim()
      .parse::<u64>()
      .ok()
      .filter(|secs| *secs > 0)
      .ok_or_else(|| ConfigError::invalid("GENERATION_TIMEOUT_SECS", &timeout))?;

    Ok(Self {
      database_url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
      gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|key| !key.trim().is_empty()),
      gemini_model: env_or("GEMINI_MODEL", DEFAULT_MODEL),
      gemini_api_base,
      generation_timeout: Duration::from_secs(timeout_secs),
    })
  }
}

/// Unset and empty are both treated as "use the default"
fn env_or(var: &str, default: &str) -> String {
  env::var(var)
    .ok()
    .filter(|value| !value.trim().is_empty())
    .unwrap_or_else(|| default.to_string())
}
