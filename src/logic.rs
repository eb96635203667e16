//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Filling feature prompt templates and running the generation pipeline
//!   - Surfacing fallback results to the user as a notification
//!   - Task toggles, yoga practice/streaks, and video search

use chrono::{Local, NaiveDate};
use tracing::{info, instrument, warn};

use crate::domain::{QuizQuestion, Source, StudyTask, TextResult, ValidatedResult, YogaRecommendation};
use crate::notifications::NotificationKind;
use crate::protocol::{Generated, VideosOut};
use crate::schema::{SchemaDescriptor, SchemaError};
use crate::seeds::fallback_videos;
use crate::state::AppState;
use crate::streak::StreakSummary;
use crate::tasks::StoreError;
use crate::util::fill_template;

/// Blank input yields a blank prompt, which the fetcher rejects as invalid input.
fn prompt_for(tpl: &str, key: &str, value: &str) -> String {
  let value = value.trim();
  if value.is_empty() { String::new() } else { fill_template(tpl, &[(key, value)]) }
}

/// Tell the user when they are looking at sample content.
async fn surface_source(state: &AppState, feature: &str, source: Source) {
  if source == Source::Fallback {
    state
      .notifications
      .publish(
        NotificationKind::Warning,
        format!("Using sample content for {feature}: live generation is unavailable right now."),
      )
      .await;
  }
}

#[instrument(level = "info", skip(state, topic), fields(topic_len = topic.len()))]
pub async fn do_quiz(state: &AppState, topic: &str) -> ValidatedResult<QuizQuestion> {
  let prompt = prompt_for(&state.prompts.quiz_template, "topic", topic);
  let result = state.generator.generate_quiz(&prompt).await;
  surface_source(state, "quiz", result.source).await;
  result
}

/// Generated tasks also land on the task board.
#[instrument(level = "info", skip(state, subject), fields(subject_len = subject.len()))]
pub async fn do_tasks(state: &AppState, subject: &str) -> ValidatedResult<StudyTask> {
  let prompt = prompt_for(&state.prompts.tasks_template, "subject", subject);
  let result = state.generator.generate_tasks(&prompt).await;
  let added = state.tasks.add_all(&result.items).await;
  info!(target: "tasks", added, "Tasks added to board");
  surface_source(state, "study tasks", result.source).await;
  result
}

#[instrument(level = "info", skip(state, goal), fields(goal_len = goal.len()))]
pub async fn do_yoga(state: &AppState, goal: &str) -> ValidatedResult<YogaRecommendation> {
  let prompt = prompt_for(&state.prompts.yoga_template, "goal", goal);
  let result = state.generator.generate_yoga_advice(&prompt).await;
  surface_source(state, "yoga advice", result.source).await;
  result
}

#[instrument(level = "info", skip(state, symptoms), fields(symptoms_len = symptoms.len()))]
pub async fn do_symptoms(state: &AppState, symptoms: &str) -> TextResult {
  let prompt = prompt_for(&state.prompts.symptom_template, "symptoms", symptoms);
  let result = state.generator.generate_text(&prompt).await;
  surface_source(state, "symptom analysis", result.source).await;
  result
}

/// Raw prompt against a schema named by the caller. An unknown name is a caller bug.
#[instrument(level = "info", skip(state, prompt), fields(%schema, prompt_len = prompt.len()))]
pub async fn do_generate(state: &AppState, schema: &str, prompt: &str) -> Result<Generated, SchemaError> {
  let schema: SchemaDescriptor = schema.parse()?;
  let g = &state.generator;
  let out = match schema {
    SchemaDescriptor::QuizQuestionList => Generated::Quiz(g.generate_quiz(prompt).await),
    SchemaDescriptor::TaskTitleList => {
      let result = g.generate_tasks(prompt).await;
      state.tasks.add_all(&result.items).await;
      Generated::Tasks(result)
    }
    SchemaDescriptor::YogaRecommendationList => Generated::Yoga(g.generate_yoga_advice(prompt).await),
    SchemaDescriptor::FreeformText => Generated::Text(g.generate_text(prompt).await),
  };
  let source = match &out {
    Generated::Quiz(r) => r.source,
    Generated::Tasks(r) => r.source,
    Generated::Yoga(r) => r.source,
    Generated::Text(t) => t.source,
  };
  surface_source(state, schema.name(), source).await;
  Ok(out)
}

pub async fn do_toggle_task(state: &AppState, id: &str) -> Result<StudyTask, StoreError> {
  state.tasks.toggle(id).await
}

/// Record practice for `date` (default: today, local time) and return the updated streak.
#[instrument(level = "info", skip(state))]
pub async fn do_record_practice(state: &AppState, date: Option<NaiveDate>) -> StreakSummary {
  let today = Local::now().date_naive();
  let day = date.unwrap_or(today);
  let mut log = state.practice.write().await;
  if log.record(day) {
    info!(target: "lifemate", %day, "Yoga practice recorded");
  }
  let summary = log.summary(today);
  drop(log);
  if summary.practiced_today && summary.current > 1 && date.is_none() {
    state
      .notifications
      .publish(NotificationKind::Success, format!("{}-day yoga streak!", summary.current))
      .await;
  }
  summary
}

pub async fn do_streak(state: &AppState) -> StreakSummary {
  state.practice.read().await.summary(Local::now().date_naive())
}

/// Live search when configured; sample videos otherwise or on failure.
#[instrument(level = "info", skip(state, q), fields(q_len = q.len()))]
pub async fn do_video_search(state: &AppState, q: &str) -> VideosOut {
  if let Some(vs) = state.generator.videos() {
    if !q.trim().is_empty() {
      match vs.search(q.trim(), 6).await {
        Ok(videos) => return VideosOut { videos, fallback: false },
        Err(e) => warn!(target: "video", error = %e, "Video search failed; serving sample videos"),
      }
    }
  }
  VideosOut { videos: fallback_videos(), fallback: true }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  use crate::config::Prompts;
  use crate::notifications::NotificationStore;
  use crate::pipeline::Generator;
  use crate::tasks::InMemoryTaskStore;

  fn offline_state() -> AppState {
    AppState::with_parts(
      Generator::default(),
      Prompts::default(),
      Arc::new(NotificationStore::in_memory()),
      Arc::new(InMemoryTaskStore::default()),
    )
  }

  #[test]
  fn blank_values_give_blank_prompts() {
    assert_eq!(prompt_for("About {topic}", "topic", "  "), "");
    assert_eq!(prompt_for("About {topic}", "topic", " rust "), "About rust");
  }

  #[tokio::test]
  async fn fallback_results_raise_a_warning() {
    let state = offline_state();
    let quiz = do_quiz(&state, "geography").await;
    assert!(quiz.is_fallback());

    let notes = state.notifications.list().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::Warning);
    assert!(notes[0].message.contains("quiz"));
  }

  #[tokio::test]
  async fn generated_tasks_join_the_board() {
    let state = offline_state();
    do_tasks(&state, "algebra").await;
    let board = state.tasks.list().await;
    assert_eq!(board.len(), 5);
    assert!(do_toggle_task(&state, &board[0].id).await.unwrap().completed);
  }

  #[tokio::test]
  async fn repeated_task_generations_all_land_on_the_board() {
    use async_trait::async_trait;
    use crate::completion::{CompletionFetcher, FetchError};

    struct TwoTitles;

    #[async_trait]
    impl CompletionFetcher for TwoTitles {
      async fn fetch(&self, _prompt: &str) -> Result<String, FetchError> {
        Ok(r#"["A","B"]"#.into())
      }
      fn describe(&self) -> String {
        "two-titles".into()
      }
    }

    let fetcher: Arc<dyn CompletionFetcher> = Arc::new(TwoTitles);
    let state = AppState::with_parts(
      Generator::new(Some(fetcher), None),
      Prompts::default(),
      Arc::new(NotificationStore::in_memory()),
      Arc::new(InMemoryTaskStore::default()),
    );

    let mut returned = Vec::new();
    for _ in 0..50 {
      let batch = do_tasks(&state, "chemistry").await;
      assert_eq!(batch.source, Source::Ai);
      returned.extend(batch.items.into_iter().map(|t| t.id));
    }

    let board: Vec<String> = state.tasks.list().await.into_iter().map(|t| t.id).collect();
    assert_eq!(board.len(), 100);
    assert_eq!(board, returned);

    let toggled = do_toggle_task(&state, &returned[99]).await.unwrap();
    assert_eq!(toggled.id, returned[99]);
    assert!(toggled.completed);
  }

  #[tokio::test]
  async fn unknown_schema_is_an_error_not_a_fallback() {
    let state = offline_state();
    assert_eq!(
      do_generate(&state, "horoscope", "x").await.err(),
      Some(SchemaError::Unknown("horoscope".into()))
    );
    assert!(state.notifications.list().await.is_empty());
  }

  #[tokio::test]
  async fn practice_updates_streak() {
    let state = offline_state();
    let today = Local::now().date_naive();
    let yesterday = today.pred_opt().unwrap();
    do_record_practice(&state, Some(yesterday)).await;
    let s = do_record_practice(&state, None).await;
    assert_eq!(s.current, 2);
    assert!(s.practiced_today);
    assert_eq!(do_streak(&state).await, s);
  }

  #[tokio::test]
  async fn video_search_without_key_serves_samples() {
    let out = do_video_search(&offline_state(), "sun salutation").await;
    assert!(out.fallback);
    assert_eq!(out.videos.len(), 3);
  }
}
