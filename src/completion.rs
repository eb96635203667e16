//! Completion fetcher: one prompt in, one raw completion string out.
//!
//! Two hosted providers are supported, both over plain HTTPS + JSON:
//!   - OpenAI-style `chat/completions` (`choices[0].message.content`)
//!   - Gemini `generateContent` (`candidates[0].content.parts[0].text`)
//!
//! Calls are instrumented and log model names, latencies and response sizes (not contents).
//! There are no retries here; the user retries by asking again.
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::config::GenerationCfg;
use crate::util::trunc_for_log;

const UA: &str = "lifemate-backend/0.1";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
  #[error("prompt is empty")]
  InvalidInput,
  #[error("network failure: {0}")]
  NetworkFailure(String),
  #[error("upstream error (HTTP {status}): {message}")]
  UpstreamError { status: u16, message: String },
  #[error("completion contained no text")]
  EmptyResponse,
}

/// Anything that can turn a prompt into completion text.
#[async_trait]
pub trait CompletionFetcher: Send + Sync {
  async fn fetch(&self, prompt: &str) -> Result<String, FetchError>;

  /// Short label for logs ("openai:gpt-4o-mini").
  fn describe(&self) -> String;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
  OpenAi,
  Gemini,
}

impl Provider {
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "openai" => Some(Provider::OpenAi),
      "gemini" | "google" => Some(Provider::Gemini),
      _ => None,
    }
  }

  fn label(self) -> &'static str {
    match self {
      Provider::OpenAi => "openai",
      Provider::Gemini => "gemini",
    }
  }
}

#[derive(Clone)]
pub struct HttpCompletionFetcher {
  pub provider: Provider,
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub system: String,
  pub temperature: f32,
  pub max_tokens: u32,
}

impl HttpCompletionFetcher {
  pub fn new(
    provider: Provider,
    api_key: String,
    base_url: String,
    model: String,
    system: String,
    generation: &GenerationCfg,
  ) -> Result<Self, FetchError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(generation.timeout_secs))
      .build()
      .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;
    Ok(Self {
      provider,
      client,
      api_key,
      base_url: base_url.trim_end_matches('/').to_string(),
      model,
      system,
      temperature: generation.temperature,
      max_tokens: generation.max_tokens,
    })
  }

  /// Pick the provider from LLM_PROVIDER and read its key/base/model from env.
  /// Returns None when the selected provider has no API key.
  pub fn from_env(system: &str, generation: &GenerationCfg) -> Option<Self> {
    let provider = std::env::var("LLM_PROVIDER")
      .ok()
      .and_then(|p| Provider::parse(&p))
      .unwrap_or(Provider::OpenAi);

    let (key_var, base_var, model_var, base_default, model_default) = match provider {
      Provider::OpenAi => ("OPENAI_API_KEY", "OPENAI_BASE_URL", "OPENAI_MODEL", "https://api.openai.com/v1", "gpt-4o-mini"),
      Provider::Gemini => (
        "GEMINI_API_KEY",
        "GEMINI_BASE_URL",
        "GEMINI_MODEL",
        "https://generativelanguage.googleapis.com/v1beta",
        "gemini-1.5-flash",
      ),
    };
    let api_key = std::env::var(key_var).ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var(base_var).unwrap_or_else(|_| base_default.into());
    let model = std::env::var(model_var).unwrap_or_else(|_| model_default.into());

    match Self::new(provider, api_key, base_url, model, system.to_string(), generation) {
      Ok(f) => Some(f),
      Err(e) => {
        error!(target: "llm", error = %e, "Failed to build HTTP client");
        None
      }
    }
  }

  fn request(&self, prompt: &str) -> reqwest::RequestBuilder {
    let builder = match self.provider {
      Provider::OpenAi => {
        let body = ChatCompletionRequest {
          model: &self.model,
          messages: vec![
            ChatMessageReq { role: "system", content: &self.system },
            ChatMessageReq { role: "user", content: prompt },
          ],
          temperature: self.temperature,
          max_tokens: self.max_tokens,
        };
        self.client
          .post(format!("{}/chat/completions", self.base_url))
          .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
          .json(&body)
      }
      Provider::Gemini => {
        let body = GenerateContentRequest {
          system_instruction: GeminiContent { parts: vec![GeminiPart { text: &self.system }] },
          contents: vec![GeminiContent { parts: vec![GeminiPart { text: prompt }] }],
          generation_config: GeminiGenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_tokens,
          },
        };
        self.client
          .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
          .query(&[("key", self.api_key.as_str())])
          .json(&body)
      }
    };
    builder.header(USER_AGENT, UA).header(CONTENT_TYPE, "application/json")
  }
}

#[async_trait]
impl CompletionFetcher for HttpCompletionFetcher {
  #[instrument(level = "info", skip(self, prompt), fields(provider = self.provider.label(), model = %self.model, prompt_len = prompt.len()))]
  async fn fetch(&self, prompt: &str) -> Result<String, FetchError> {
    if prompt.trim().is_empty() {
      return Err(FetchError::InvalidInput);
    }

    let start = Instant::now();
    let res = self.request(prompt).send().await.map_err(|e| FetchError::NetworkFailure(e.to_string()))?;

    let status = res.status();
    let body = res.text().await.map_err(|e| FetchError::NetworkFailure(e.to_string()))?;
    let elapsed = start.elapsed();

    if !status.is_success() {
      let message = provider_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      error!(target: "llm", ?elapsed, status = status.as_u16(), %message, "Completion request failed");
      return Err(FetchError::UpstreamError { status: status.as_u16(), message });
    }

    let json: Value = serde_json::from_str(&body).map_err(|_| FetchError::EmptyResponse)?;
    if let Some(message) = provider_error(&body) {
      return Err(FetchError::UpstreamError { status: status.as_u16(), message });
    }
    if let Some(usage) = json.get("usage") {
      let prompt_tokens = usage.get("prompt_tokens").and_then(serde_json::Value::as_u64);
      let completion_tokens = usage.get("completion_tokens").and_then(serde_json::Value::as_u64);
      let total_tokens = usage.get("total_tokens").and_then(serde_json::Value::as_u64);
      info!(target: "llm", ?prompt_tokens, ?completion_tokens, ?total_tokens, "Completion usage");
    }

    let text = completion_text(&json).ok_or(FetchError::EmptyResponse)?;
    info!(target: "llm", ?elapsed, response_len = text.len(), "Completion received");
    Ok(text)
  }

  fn describe(&self) -> String {
    format!("{}:{}", self.provider.label(), self.model)
  }
}

/// Pull the completion text out of either provider's response body.
/// Blank text counts as absent.
pub fn completion_text(body: &Value) -> Option<String> {
  let openai = body.pointer("/choices/0/message/content").and_then(Value::as_str);
  let gemini = || body.pointer("/candidates/0/content/parts/0/text").and_then(Value::as_str);
  openai
    .or_else(gemini)
    .filter(|t| !t.trim().is_empty())
    .map(str::to_string)
}

/// Extract a readable message from a provider error payload (`{"error": {"message": ..}}`
/// or `{"error": "..."}`).
fn provider_error(body: &str) -> Option<String> {
  let v: Value = serde_json::from_str(body).ok()?;
  let err = v.get("error")?;
  err.get("message")
    .and_then(Value::as_str)
    .or_else(|| err.as_str())
    .map(str::to_string)
}

// --- Request DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessageReq<'a>>,
  temperature: f32,
  max_tokens: u32,
}
#[derive(Serialize)]
struct ChatMessageReq<'a> { role: &'static str, content: &'a str }

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
  system_instruction: GeminiContent<'a>,
  contents: Vec<GeminiContent<'a>>,
  generation_config: GeminiGenerationConfig,
}
#[derive(Serialize)]
struct GeminiContent<'a> { parts: Vec<GeminiPart<'a>> }
#[derive(Serialize)]
struct GeminiPart<'a> { text: &'a str }
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig { temperature: f32, max_output_tokens: u32 }

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::Matcher;
  use serde_json::json;

  fn fetcher(provider: Provider, base_url: String) -> HttpCompletionFetcher {
    HttpCompletionFetcher::new(
      provider,
      "test-key".into(),
      base_url,
      "test-model".into(),
      "Reply with JSON only.".into(),
      &GenerationCfg::default(),
    )
    .unwrap()
  }

  #[test]
  fn reads_both_provider_shapes() {
    let openai = json!({ "choices": [{ "message": { "content": "[1]" } }] });
    let gemini = json!({ "candidates": [{ "content": { "parts": [{ "text": "[2]" }] } }] });
    assert_eq!(completion_text(&openai).as_deref(), Some("[1]"));
    assert_eq!(completion_text(&gemini).as_deref(), Some("[2]"));
    assert_eq!(completion_text(&json!({ "choices": [] })), None);
    assert_eq!(completion_text(&json!({ "choices": [{ "message": { "content": "  " } }] })), None);
  }

  #[tokio::test]
  async fn empty_prompt_is_rejected_without_a_call() {
    let f = fetcher(Provider::OpenAi, "http://127.0.0.1:9".into());
    assert_eq!(f.fetch("   ").await, Err(FetchError::InvalidInput));
  }

  #[tokio::test]
  async fn openai_success_returns_unmodified_text() {
    let mut server = mockito::Server::new_async().await;
    let content = "```json\n[{\"title\":\"x\"}]\n```";
    let mock = server
      .mock("POST", "/chat/completions")
      .match_header("authorization", "Bearer test-key")
      .match_body(Matcher::PartialJson(json!({ "model": "test-model" })))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(json!({ "choices": [{ "message": { "content": content } }], "usage": { "total_tokens": 12 } }).to_string())
      .create_async()
      .await;

    let f = fetcher(Provider::OpenAi, server.url());
    assert_eq!(f.fetch("give me tasks").await.unwrap(), content);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn gemini_success_uses_generate_content() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/models/test-model:generateContent")
      .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
      .with_status(200)
      .with_body(json!({ "candidates": [{ "content": { "parts": [{ "text": "hello" }] } }] }).to_string())
      .create_async()
      .await;

    let f = fetcher(Provider::Gemini, server.url());
    assert_eq!(f.fetch("hi").await.unwrap(), "hello");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn non_success_status_is_upstream_error() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/chat/completions")
      .with_status(429)
      .with_body(json!({ "error": { "message": "rate limited" } }).to_string())
      .create_async()
      .await;

    let f = fetcher(Provider::OpenAi, server.url());
    assert_eq!(
      f.fetch("hi").await,
      Err(FetchError::UpstreamError { status: 429, message: "rate limited".into() })
    );
  }

  #[tokio::test]
  async fn error_payload_with_ok_status_is_upstream_error() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/chat/completions")
      .with_status(200)
      .with_body(json!({ "error": "quota exceeded" }).to_string())
      .create_async()
      .await;

    let f = fetcher(Provider::OpenAi, server.url());
    assert!(matches!(f.fetch("hi").await, Err(FetchError::UpstreamError { status: 200, .. })));
  }

  #[tokio::test]
  async fn missing_text_is_empty_response() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/chat/completions")
      .with_status(200)
      .with_body(json!({ "choices": [{ "message": { "content": null } }] }).to_string())
      .create_async()
      .await;

    let f = fetcher(Provider::OpenAi, server.url());
    assert_eq!(f.fetch("hi").await, Err(FetchError::EmptyResponse));
  }

  #[tokio::test]
  async fn unreachable_host_is_network_failure() {
    // Port 9 (discard) is closed on test hosts.
    let f = fetcher(Provider::OpenAi, "http://127.0.0.1:9".into());
    assert!(matches!(f.fetch("hi").await, Err(FetchError::NetworkFailure(_))));
  }

  #[test]
  fn provider_names() {
    assert_eq!(Provider::parse("OpenAI"), Some(Provider::OpenAi));
    assert_eq!(Provider::parse("gemini"), Some(Provider::Gemini));
    assert_eq!(Provider::parse("ollama"), None);
  }
}
