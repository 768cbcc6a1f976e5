//! Chat assistant backed by a hosted generative model.

use chrono::{DateTime, Local};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::config::{AssistantConfig, Config};

const SYSTEM_INSTRUCTION: &str = "You are \"Nuswally Bot\", a knowledgeable, compassionate, and humble Islamic assistant for the application \"Nuswally Lillah\".

Your goals:
1. Provide accurate information based on the Quran and authentic Hadith.
2. Be respectful of different schools of thought (Madhabs). If there is a difference of opinion, briefly mention it.
3. For specific Fiqh rulings (legal verdicts), always advise the user to consult a local scholar or Imam, while providing general knowledge.
4. Tone: Gentle, encouraging, and dignified.
5. Structure: Use Markdown for clarity (bullet points, bold text).
6. Citations: Whenever possible, mention the Surah/Verse number or the Hadith collection.

If the user asks about something harmful, hateful, or extremist, gently redirect them to the principles of peace and mercy in Islam, or refuse to answer if it violates safety policies.";

/// Returned when the model answers with no text.
pub const EMPTY_REPLY: &str = "I apologize, I could not generate a response at this moment.";
/// Shown in place of a reply whenever the request fails.
pub const APOLOGY: &str =
  "I apologize, but I am having trouble connecting at the moment. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  User,
  Model,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
  pub id: String,
  pub role: Role,
  pub content: String,
  pub timestamp: DateTime<Local>,
  pub is_error: bool,
}

impl ChatMessage {
  fn new(role: Role, content: String, is_error: bool) -> Self {
    let timestamp = Local::now();
    Self {
      id: timestamp.timestamp_millis().to_string(),
      role,
      content,
      timestamp,
      is_error,
    }
  }

  pub fn user(content: &str) -> Self {
    Self::new(Role::User, content.to_string(), false)
  }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
  system_instruction: Content<'a>,
  contents: [Content<'a>; 1],
  generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
  #[serde(skip_serializing_if = "Option::is_none")]
  role: Option<&'a str>,
  parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
  text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
  thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
  text: Option<String>,
}

/// First candidate's text, or the stock reply when there is none.
fn reply_text(body: &str) -> Result<String> {
  let response: GenerateResponse =
    serde_json::from_str(body).map_err(|e| eyre!("Failed to parse model response: {}", e))?;

  let text: String = response
    .candidates
    .into_iter()
    .next()
    .and_then(|c| c.content)
    .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
    .unwrap_or_default();

  if text.trim().is_empty() {
    Ok(EMPTY_REPLY.to_string())
  } else {
    Ok(text)
  }
}

#[derive(Clone)]
pub struct AssistantClient {
  client: reqwest::Client,
  endpoint: String,
  api_key: String,
}

impl AssistantClient {
  pub fn new(config: &AssistantConfig, api_key: String) -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("nuswally/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      endpoint: format!(
        "{}/models/{}:generateContent",
        config.base_url.trim_end_matches('/'),
        config.model
      ),
      api_key,
    })
  }

  pub async fn ask(&self, prompt: &str) -> Result<String> {
    let request = GenerateRequest {
      system_instruction: Content {
        role: None,
        parts: [Part {
          text: SYSTEM_INSTRUCTION,
        }],
      },
      contents: [Content {
        role: Some("user"),
        parts: [Part { text: prompt }],
      }],
      generation_config: GenerationConfig {
        thinking_config: ThinkingConfig { thinking_budget: 0 },
      },
    };

    let response = self
      .client
      .post(&self.endpoint)
      .header("x-goog-api-key", &self.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| eyre!("Failed to reach assistant: {}", e))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| eyre!("Failed to read assistant response: {}", e))?;

    if !status.is_success() {
      return Err(eyre!("Assistant returned {}: {}", status, body));
    }

    reply_text(&body)
  }
}

/// Turns every prompt into exactly one model message, never an error.
pub struct Assistant {
  client: Option<AssistantClient>,
}

impl Assistant {
  pub fn new(client: Option<AssistantClient>) -> Self {
    Self { client }
  }

  /// Build from config and the API key environment variables. A missing key
  /// is not fatal; every reply is then the apology.
  pub fn from_config(config: &AssistantConfig) -> Self {
    let client = match Config::get_api_key() {
      Ok(key) => match AssistantClient::new(config, key) {
        Ok(client) => Some(client),
        Err(e) => {
          error!(error = %e, "Failed to create assistant client");
          None
        }
      },
      Err(e) => {
        warn!(error = %e, "Assistant disabled");
        None
      }
    };
    Self::new(client)
  }

  pub async fn reply(&self, prompt: &str) -> ChatMessage {
    let Some(client) = &self.client else {
      return ChatMessage::new(Role::Model, APOLOGY.to_string(), true);
    };

    match client.ask(prompt).await {
      Ok(text) => ChatMessage::new(Role::Model, text, false),
      Err(e) => {
        error!(error = %e, "Assistant request failed");
        ChatMessage::new(Role::Model, APOLOGY.to_string(), true)
      }
    }
  }
}
