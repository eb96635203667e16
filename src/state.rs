//! Application state shared by HTTP and WebSocket handlers.
//!
//! This module owns:
//!   - the generation pipeline (completion fetcher + optional video search)
//!   - the prompt templates (from TOML or defaults)
//!   - the notification store (constructed once, passed by handle)
//!   - the study-task board and the yoga practice log
//!
//! Without an LLM key every generation resolves to the bundled fallback data.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::completion::{CompletionFetcher, HttpCompletionFetcher};
use crate::config::{load_agent_config_from_env, Prompts};
use crate::notifications::NotificationStore;
use crate::pipeline::Generator;
use crate::streak::PracticeLog;
use crate::tasks::{InMemoryTaskStore, TaskBoard, TaskStore};
use crate::video::VideoSearch;

pub struct AppState {
  pub generator: Generator,
  pub prompts: Prompts,
  pub notifications: Arc<NotificationStore>,
  pub tasks: TaskBoard,
  pub practice: RwLock<PracticeLog>,
}

impl AppState {
  /// Build state from env: load config, init the completion provider, video search and stores.
  #[instrument(level = "info", skip_all)]
  pub fn from_env() -> Self {
    let cfg = load_agent_config_from_env().unwrap_or_default();

    let fetcher = HttpCompletionFetcher::from_env(&cfg.prompts.system, &cfg.generation);
    match &fetcher {
      Some(f) => info!(target: "lifemate", provider = %f.describe(), base_url = %f.base_url, "LLM enabled."),
      None => warn!(target: "lifemate", "LLM disabled (no API key for LLM_PROVIDER). Serving fallback content."),
    }
    let videos = VideoSearch::from_env();
    if videos.is_none() {
      info!(target: "lifemate", "Video search disabled (no YOUTUBE_API_KEY).");
    }

    let fetcher = fetcher.map(|f| Arc::new(f) as Arc<dyn CompletionFetcher>);
    Self::with_parts(
      Generator::new(fetcher, videos),
      cfg.prompts,
      Arc::new(NotificationStore::from_env()),
      Arc::new(InMemoryTaskStore::default()),
    )
  }

  pub fn with_parts(
    generator: Generator,
    prompts: Prompts,
    notifications: Arc<NotificationStore>,
    task_store: Arc<dyn TaskStore>,
  ) -> Self {
    Self {
      generator,
      prompts,
      notifications,
      tasks: TaskBoard::new(task_store),
      practice: RwLock::new(PracticeLog::default()),
    }
  }
}
