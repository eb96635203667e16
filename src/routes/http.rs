//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::domain::{QuizQuestion, StudyTask, TextResult, ValidatedResult, YogaRecommendation};
use crate::logic::*;
use crate::protocol::*;
use crate::schema::SchemaDescriptor;
use crate::seeds::{fallback_for, FallbackDataset};
use crate::state::AppState;
use crate::streak::StreakSummary;
use crate::tasks::StoreError;

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
  (status, Json(json!({ "error": message.into() })))
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, llm: state.generator.is_live() })
}

#[instrument(level = "info", skip(state, body), fields(topic_len = body.topic.len()))]
pub async fn http_post_quiz(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuizIn>,
) -> Json<ValidatedResult<QuizQuestion>> {
  let result = do_quiz(&state, &body.topic).await;
  info!(target: "lifemate", items = result.items.len(), source = ?result.source, "HTTP quiz served");
  Json(result)
}

#[instrument(level = "info", skip(state, body), fields(subject_len = body.subject.len()))]
pub async fn http_post_generate_tasks(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TasksIn>,
) -> Json<ValidatedResult<StudyTask>> {
  let result = do_tasks(&state, &body.subject).await;
  info!(target: "lifemate", items = result.items.len(), source = ?result.source, "HTTP tasks served");
  Json(result)
}

#[instrument(level = "info", skip(state, body), fields(goal_len = body.goal.len()))]
pub async fn http_post_yoga(
  State(state): State<Arc<AppState>>,
  Json(body): Json<YogaIn>,
) -> Json<ValidatedResult<YogaRecommendation>> {
  let result = do_yoga(&state, &body.goal).await;
  info!(target: "lifemate", items = result.items.len(), source = ?result.source, "HTTP yoga advice served");
  Json(result)
}

#[instrument(level = "info", skip(state, body), fields(symptoms_len = body.symptoms.len()))]
pub async fn http_post_symptoms(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SymptomsIn>,
) -> Json<TextResult> {
  Json(do_symptoms(&state, &body.symptoms).await)
}

#[instrument(level = "info", skip(state, body), fields(%schema, prompt_len = body.prompt.len()))]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  Path(schema): Path<String>,
  Json(body): Json<GenerateIn>,
) -> Result<Json<Generated>, ApiError> {
  do_generate(&state, &schema, &body.prompt).await.map(Json).map_err(|e| {
    warn!(target: "lifemate", error = %e, "Rejected generate request");
    api_error(StatusCode::BAD_REQUEST, e.to_string())
  })
}

/// The bundled sample dataset for a schema, for offline previews.
#[instrument(level = "info")]
pub async fn http_get_samples(Path(schema): Path<String>) -> Result<Json<FallbackDataset>, ApiError> {
  schema
    .parse::<SchemaDescriptor>()
    .map(|s| Json(fallback_for(s)))
    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_tasks(State(state): State<Arc<AppState>>) -> Json<Vec<StudyTask>> {
  Json(state.tasks.list().await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_toggle_task(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<StudyTask>, ApiError> {
  match do_toggle_task(&state, &id).await {
    Ok(task) => Ok(Json(task)),
    Err(e @ StoreError::NotFound(_)) => Err(api_error(StatusCode::NOT_FOUND, e.to_string())),
    Err(e @ StoreError::WriteFailed(_)) => Err(api_error(StatusCode::BAD_GATEWAY, e.to_string())),
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_practice(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PracticeIn>,
) -> Json<StreakSummary> {
  Json(do_record_practice(&state, body.date).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_streak(State(state): State<Arc<AppState>>) -> Json<StreakSummary> {
  Json(do_streak(&state).await)
}

#[instrument(level = "info", skip(state), fields(q_len = q.q.len()))]
pub async fn http_get_videos(
  State(state): State<Arc<AppState>>,
  Query(q): Query<VideoQuery>,
) -> Json<VideosOut> {
  Json(do_video_search(&state, &q.q).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_notifications(State(state): State<Arc<AppState>>) -> Json<NotificationsOut> {
  let items = state.notifications.list().await;
  let unread = state.notifications.unread_count().await;
  Json(NotificationsOut { unread, items })
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_notification_read(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  if state.notifications.mark_read(&id).await {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(api_error(StatusCode::NOT_FOUND, format!("notification {id} not found")))
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_notifications(State(state): State<Arc<AppState>>) -> StatusCode {
  state.notifications.clear().await;
  StatusCode::NO_CONTENT
}
