//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{QuizQuestion, StudyTask, TextResult, ValidatedResult, VideoRef, YogaRecommendation};
use crate::notifications::Notification;

/// A generation result for any schema, tagged with the schema name.
#[derive(Debug, Serialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum Generated {
  Quiz(ValidatedResult<QuizQuestion>),
  Tasks(ValidatedResult<StudyTask>),
  Yoga(ValidatedResult<YogaRecommendation>),
  Text(TextResult),
}

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  Generate { schema: String, prompt: String },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  Result { payload: Generated },
  Notification { notification: Notification },
  Error { message: String },
}

//
// HTTP request/response DTOs
//

#[derive(Deserialize)]
pub struct QuizIn {
  pub topic: String,
}

#[derive(Deserialize)]
pub struct TasksIn {
  pub subject: String,
}

#[derive(Deserialize)]
pub struct YogaIn {
  pub goal: String,
}

#[derive(Deserialize)]
pub struct SymptomsIn {
  pub symptoms: String,
}

#[derive(Deserialize)]
pub struct GenerateIn {
  pub prompt: String,
}

#[derive(Deserialize)]
pub struct PracticeIn {
  #[serde(default)]
  pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
  pub q: String,
}

#[derive(Serialize)]
pub struct VideosOut {
  pub videos: Vec<VideoRef>,
  /// True when the sample videos were served instead of live results.
  pub fallback: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsOut {
  pub unread: usize,
  pub items: Vec<Notification>,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
  pub llm: bool,
}
