//! Loading agent configuration (prompt templates + generation settings) from TOML.
//!
//! See `AgentConfig`, `Prompts` and `GenerationCfg` for expected schema. Every
//! field has a default, so a partial file only overrides what it names.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub generation: GenerationCfg,
}

/// Per-feature prompt templates. `{placeholder}` values are filled by `util::fill_template`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub system: String,
  /// `{topic}`
  pub quiz_template: String,
  /// `{subject}`
  pub tasks_template: String,
  /// `{goal}`
  pub yoga_template: String,
  /// `{symptoms}`
  pub symptom_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system: "You are LifeMate, a friendly personal-productivity assistant. When asked for JSON, reply with JSON only.".into(),
      quiz_template: "Generate 5 multiple-choice quiz questions about '{topic}'. Return ONLY a JSON array wrapped in ```json fences. Each item: {\"question\": string, \"options\": [4 strings], \"correctAnswer\": string (one of options), \"explanation\": string}.".into(),
      tasks_template: "Break down studying '{subject}' into 5 short, actionable study tasks. Return ONLY a JSON array of objects with a \"title\" string field.".into(),
      yoga_template: "Recommend 3 yoga poses for this goal: {goal}. Return ONLY a JSON array. Each item: {\"title\": string, \"description\": string, \"reason\": string, \"youtubeSearchTerm\": string}.".into(),
      symptom_template: "A user reports these symptoms: {symptoms}. Give a short, cautious, non-diagnostic overview of possible causes and self-care tips, and say when to see a doctor. Plain text, no JSON.".into(),
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GenerationCfg {
  pub temperature: f32,
  pub max_tokens: u32,
  pub timeout_secs: u64,
}

impl Default for GenerationCfg {
  fn default() -> Self {
    Self { temperature: 0.7, max_tokens: 1024, timeout_secs: 30 }
  }
}

/// Parse a TOML document into `AgentConfig`.
pub fn parse_agent_config(s: &str) -> Result<AgentConfig, toml::de::Error> {
  toml::from_str::<AgentConfig>(s)
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_agent_config(&s) {
      Ok(cfg) => {
        info!(target: "lifemate", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lifemate", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lifemate", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
