//! Minimal OpenAI chat-completions client used for the parent report.
//!
//! Calls are instrumented and log model names, latencies and response sizes (not contents).
//! The API key is never logged.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::Prompts;
use crate::error::ServiceError;
use crate::util::fill_template;

const SERVICE: &str = "openai";

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub report_model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let report_model =
      std::env::var("OPENAI_REPORT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    Self::new(api_key, base_url, report_model)
  }

  pub fn new(api_key: String, base_url: String, report_model: String) -> Option<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .ok()?;
    Some(Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string(), report_model })
  }

  /// Plain-text chat completion.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_plain(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<String, ServiceError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "pintarcilik-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| ServiceError::http(SERVICE, e))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or(body);
      return Err(ServiceError::Status { service: SERVICE, status, message });
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| ServiceError::decode(SERVICE, e))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    Ok(body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string())
  }

  /// Developmental summary for parents, Markdown allowed. May be empty.
  #[instrument(level = "info", skip(self, prompts, history_json), fields(model = %self.report_model, history_len = history_json.len()))]
  pub async fn parent_report(
    &self,
    prompts: &Prompts,
    child_name: &str,
    history_json: &str,
  ) -> Result<String, ServiceError> {
    let user = fill_template(
      &prompts.report_user_template,
      &[("child_name", child_name), ("history_json", history_json)],
    );
    let start = Instant::now();
    let text = self.chat_plain(&self.report_model, &prompts.report_system, &user, 0.7).await?;
    info!(elapsed = ?start.elapsed(), text_len = text.len(), "Parent report received");
    Ok(text)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_error_message() {
    let body = r#"{"error":{"message":"Invalid API key","type":"auth"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Invalid API key"));
    assert_eq!(extract_openai_error("<html>"), None);
  }

  #[test]
  fn reads_first_choice_content() {
    let raw = r###"{"choices":[{"message":{"content":"  ## Laporan  "}}],"usage":{"total_tokens":12}}"###;
    let body: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
    let text = body.choices.first().and_then(|c| c.message.content.clone()).unwrap_or_default();
    assert_eq!(text.trim(), "## Laporan");
  }

  #[test]
  fn base_url_is_normalized() {
    let oa = OpenAI::new("k".into(), "http://localhost:9/v1/".into(), "m".into()).expect("client");
    assert_eq!(oa.base_url, "http://localhost:9/v1");
  }
}
