//! In-app notification store with pub/sub.
//!
//! One store is built at startup and handed around through `AppState`; nothing
//! reaches it through a global. History is optionally mirrored to a JSON file
//! (NOTIFICATIONS_PATH) so it survives restarts. Persistence is best effort:
//! failures are logged and the in-memory state stays authoritative.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info, instrument};
use uuid::Uuid;

const HISTORY_LIMIT: usize = 100;
const CHANNEL_CAPACITY: usize = 32;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  Info,
  Warning,
  Success,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id: String,
  pub kind: NotificationKind,
  pub message: String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub read: bool,
}

#[derive(Debug, Error)]
pub enum NotificationError {
  #[error("notification file IO: {0}")]
  Io(#[from] std::io::Error),
  #[error("notification file format: {0}")]
  Format(#[from] serde_json::Error),
}

pub struct NotificationStore {
  items: RwLock<Vec<Notification>>,
  tx: broadcast::Sender<Notification>,
  path: Option<PathBuf>,
}

impl NotificationStore {
  pub fn in_memory() -> Self {
    Self::with_items(Vec::new(), None)
  }

  fn with_items(items: Vec<Notification>, path: Option<PathBuf>) -> Self {
    let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
    Self { items: RwLock::new(items), tx, path }
  }

  /// Open a file-backed store. A missing file starts empty; an unreadable one
  /// is logged and also starts empty.
  pub fn open(path: PathBuf) -> Self {
    let items = match load(&path) {
      Ok(items) => {
        info!(target: "notifications", path = %path.display(), count = items.len(), "Loaded notifications");
        items
      }
      Err(NotificationError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
      Err(e) => {
        error!(target: "notifications", path = %path.display(), error = %e, "Failed to load notifications; starting empty");
        Vec::new()
      }
    };
    Self::with_items(items, Some(path))
  }

  /// NOTIFICATIONS_PATH selects a file-backed store; otherwise in-memory.
  pub fn from_env() -> Self {
    match std::env::var("NOTIFICATIONS_PATH") {
      Ok(p) if !p.trim().is_empty() => Self::open(PathBuf::from(p)),
      _ => Self::in_memory(),
    }
  }

  #[instrument(level = "debug", skip(self, message))]
  pub async fn publish(&self, kind: NotificationKind, message: impl Into<String> + Send) -> Notification {
    let n = Notification {
      id: Uuid::new_v4().to_string(),
      kind,
      message: message.into(),
      created_at: Utc::now(),
      read: false,
    };
    {
      let mut items = self.items.write().await;
      items.insert(0, n.clone());
      items.truncate(HISTORY_LIMIT);
      self.persist(&items).await;
    }
    // No subscribers is fine.
    let _ = self.tx.send(n.clone());
    n
  }

  /// Newest first.
  pub async fn list(&self) -> Vec<Notification> {
    self.items.read().await.clone()
  }

  pub async fn unread_count(&self) -> usize {
    self.items.read().await.iter().filter(|n| !n.read).count()
  }

  /// Returns false for an unknown id.
  pub async fn mark_read(&self, id: &str) -> bool {
    let mut items = self.items.write().await;
    let Some(n) = items.iter_mut().find(|n| n.id == id) else {
      return false;
    };
    n.read = true;
    self.persist(&items).await;
    true
  }

  pub async fn clear(&self) {
    let mut items = self.items.write().await;
    items.clear();
    self.persist(&items).await;
  }

  pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
    self.tx.subscribe()
  }

  async fn persist(&self, items: &[Notification]) {
    let Some(path) = &self.path else { return };
    if let Err(e) = save(path, items).await {
      error!(target: "notifications", path = %path.display(), error = %e, "Failed to persist notifications");
    }
  }
}

fn load(path: &Path) -> Result<Vec<Notification>, NotificationError> {
  let s = std::fs::read_to_string(path)?;
  Ok(serde_json::from_str(&s)?)
}

async fn save(path: &Path, items: &[Notification]) -> Result<(), NotificationError> {
  let body = serde_json::to_vec_pretty(items)?;
  tokio::fs::write(path, body).await?;
  Ok(())
}
