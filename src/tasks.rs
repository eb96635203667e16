//! Study-task board with optimistic, two-phase completion toggles.
//!
//! The board owns local task state; a `TaskStore` is the persistence backend.
//! `toggle` flips the local flag first, then issues the write, and rolls the
//! flag back if the write fails.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::domain::StudyTask;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
  #[error("task {0} not found")]
  NotFound(String),
  #[error("task store write failed: {0}")]
  WriteFailed(String),
}

/// Persistence backend for task completion state.
#[async_trait]
pub trait TaskStore: Send + Sync {
  async fn save_completed(&self, id: &str, completed: bool) -> Result<(), StoreError>;
}

/// Backend that keeps the last written state in memory.
#[derive(Default)]
pub struct InMemoryTaskStore {
  written: RwLock<HashMap<String, bool>>,
}

impl InMemoryTaskStore {
  #[cfg(test)]
  pub async fn completed(&self, id: &str) -> Option<bool> {
    self.written.read().await.get(id).copied()
  }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
  async fn save_completed(&self, id: &str, completed: bool) -> Result<(), StoreError> {
    self.written.write().await.insert(id.to_string(), completed);
    Ok(())
  }
}

pub struct TaskBoard {
  tasks: RwLock<Vec<StudyTask>>,
  store: Arc<dyn TaskStore>,
}

impl TaskBoard {
  pub fn new(store: Arc<dyn TaskStore>) -> Self {
    Self { tasks: RwLock::new(Vec::new()), store }
  }

  pub async fn list(&self) -> Vec<StudyTask> {
    self.tasks.read().await.clone()
  }

  /// Append generated tasks, skipping ids already on the board.
  pub async fn add_all(&self, new_tasks: &[StudyTask]) -> usize {
    let mut tasks = self.tasks.write().await;
    let mut added = 0;
    for t in new_tasks {
      if !tasks.iter().any(|existing| existing.id == t.id) {
        tasks.push(t.clone());
        added += 1;
      }
    }
    added
  }

  /// Flip `completed` locally, persist, and roll back on a failed write.
  /// Returns the task as it stands after the write succeeded.
  #[instrument(level = "info", skip(self), fields(%id))]
  pub async fn toggle(&self, id: &str) -> Result<StudyTask, StoreError> {
    // Phase 1: optimistic local update.
    let updated = {
      let mut tasks = self.tasks.write().await;
      let task = tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
      task.completed = !task.completed;
      task.clone()
    };

    // Phase 2: backend write.
    match self.store.save_completed(id, updated.completed).await {
      Ok(()) => {
        info!(target: "tasks", %id, completed = updated.completed, "Task toggled");
        Ok(updated)
      }
      Err(e) => {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
          task.completed = !updated.completed;
        }
        warn!(target: "tasks", %id, error = %e, "Task write failed; rolled back local state");
        Err(e)
      }
    }
  }
}
