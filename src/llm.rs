//! LLM integration for workout generation
//!
//! This module handles communication with the Gemini API. The model only
//! proposes workouts; every weight it returns is parsed and normalized by
//! the planner before anything is persisted.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::AppConfig;
use crate::generation::{RegenerationContext, WorkoutGenerator};
use crate::models::UserProfile;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DAY_MAX_TOKENS: u32 = 2048;
const WEEK_MAX_TOKENS: u32 = 8192;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum LlmError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),

  #[error("Generation timed out after {0:?}")]
  Timeout(Duration),
}

/// ---------------------------------------------------------------------------
/// Gemini API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
  system_instruction: GeminiContent,
  contents: Vec<GeminiContent>,
  generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
  #[serde(skip_serializing_if = "Option::is_none")]
  role: Option<String>,
  #[serde(default)]
  parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
  #[serde(default)]
  text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  max_output_tokens: u32,
  temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
  usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
  content: Option<GeminiContent>,
  #[allow(dead_code)]
  finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
  #[serde(default)]
  pub prompt_token_count: u32,
  #[serde(default)]
  pub candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
  error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Gemini Client
/// ---------------------------------------------------------------------------

pub struct GeminiClient {
  client: Client,
  api_key: String,
  model: String,
  api_base: String,
}

impl GeminiClient {
  pub fn new(api_key: impl Into<String>, model: impl Into<String>, api_base: impl Into<String>) -> Self {
    Self {
      client: Client::new(),
      api_key: api_key.into(),
      model: model.into(),
      api_base: api_base.into().trim_end_matches('/').to_string(),
    }
  }

  /// Create a client from loaded configuration; fails if no API key is set
  pub fn from_config(config: &AppConfig) -> Result<Self, LlmError> {
    let api_key = config.gemini_api_key.clone().ok_or(LlmError::MissingApiKey)?;
    Ok(Self::new(api_key, &config.gemini_model, config.gemini_api_base.as_str()))
  }

  fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.api_base, self.model)
  }

  /// Call Gemini with a system prompt and user message
  #[instrument(skip(self, system_prompt, user_message), fields(model = %self.model))]
  pub async fn complete(
    &self,
    system_prompt: &str,
    user_message: &str,
    max_tokens: u32,
  ) -> Result<(String, UsageMetadata), LlmError> {
    let request = GeminiRequest {
      system_instruction: GeminiContent {
        role: None,
        parts: vec![GeminiPart {
          text: Some(system_prompt.to_string()),
        }],
      },
      contents: vec![GeminiContent {
        role: Some("user".to_string()),
        parts: vec![GeminiPart {
          text: Some(user_message.to_string()),
        }],
      }],
      generation_config: GenerationConfig {
        max_output_tokens: max_tokens,
        temperature: 0.4,
      },
    };

    debug!("Sending request to Gemini API");

    let response = self
      .client
      .post(self.endpoint())
      .header("x-goog-api-key", &self.api_key)
      .header("content-type", "application/json")
      .json(&request)
      .send()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    if !status.is_success() {
      error!(status = %status, "Gemini API error");
      if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(&body) {
        return Err(LlmError::Api(error_resp.error.message));
      }
      return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
    }

    let gemini_response: GeminiResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

    // Concatenate the text parts of the first candidate
    let text: String = gemini_response
      .candidates
      .first()
      .and_then(|c| c.content.as_ref())
      .map(|content| {
        content
          .parts
          .iter()
          .filter_map(|p| p.text.as_deref())
          .collect::<Vec<_>>()
          .join("")
      })
      .filter(|t| !t.trim().is_empty())
      .ok_or_else(|| LlmError::Parse("No text content in response".to_string()))?;

    let usage = gemini_response.usage_metadata.unwrap_or_default();
    debug!(
      prompt_tokens = usage.prompt_token_count,
      output_tokens = usage.candidates_token_count,
      "Received Gemini response"
    );

    Ok((text, usage))
  }
}

#[async_trait]
impl WorkoutGenerator for GeminiClient {
  async fn generate_day(&self, context: &RegenerationContext) -> Result<String, LlmError> {
    let system_prompt = include_str!("prompts/trainer_system.txt");

    let user_message = format!(
      r#"Generate the {day} workout for next week, adjusting last week's {day} according to the feedback and directives.

PLANNING CONTEXT:
{context}

Respond with valid JSON in this exact format:
{{
  "day": "{day}",
  "exercises": [
    {{"name": "Exercise Name", "sets": 3, "reps": 10, "weight": "40kg"}}
  ]
}}"#,
      day = context.target_day,
      context = context.to_json()
    );

    let (text, _usage) = self.complete(system_prompt, &user_message, DAY_MAX_TOKENS).await?;
    Ok(text)
  }

  async fn generate_week(&self, profile: &UserProfile) -> Result<String, LlmError> {
    let system_prompt = include_str!("prompts/trainer_system.txt");
    let profile_json = serde_json::to_string_pretty(profile).map_err(|e| LlmError::Parse(e.to_string()))?;

    let user_message = format!(
      r#"Generate a full week's workout routine (Monday to Sunday) for this user.

USER PROFILE:
{}

Respond with a valid JSON array of seven objects, one per day, each in the format:
{{"day": "Monday", "exercises": [{{"name": "Exercise Name", "sets": 3, "reps": 10, "weight": "40kg"}}]}}
Use an empty exercises list for rest days."#,
      profile_json
    );

    let (text, _usage) = self.complete(system_prompt, &user_message, WEEK_MAX_TOKENS).await?;
    Ok(text)
  }
}

/// Extract JSON from a model response (handles markdown code blocks)
pub fn extract_json(text: &str) -> Result<String, LlmError> {
  let trimmed = text.trim();

  // Try direct parse first
  if trimmed.starts_with('{') || trimmed.starts_with('[') {
    return Ok(trimmed.to_string());
  }

  // Look for JSON in code blocks
  if let Some(start) = text.find("```json") {
    let start = start + 7;
    if let Some(end) = text[start..].find("```") {
      return Ok(text[start..start + end].trim().to_string());
    }
  }

  // Look for plain code blocks
  if let Some(start) = text.find("```") {
    let start = start + 3;
    // Skip language identifier if present
    let content_start = text[start..]
      .find('\n')
      .map(|i| start + i + 1)
      .unwrap_or(start);
    if let Some(end) = text[content_start..].find("```") {
      return Ok(text[content_start..content_start + end].trim().to_string());
    }
  }

  // Last resort: first opening bracket to the matching last closing one
  let open = text.find(['{', '[']);
  if let Some(start) = open {
    let closer = if text[start..].starts_with('[') { ']' } else { '}' };
    if let Some(end) = text.rfind(closer) {
      if end > start {
        return Ok(text[start..=end].to_string());
      }
    }
  }

  Err(LlmError::Parse("Could not extract JSON from response".to_string()))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
