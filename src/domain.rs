//! Domain models handed to the dashboard: quiz questions, study tasks, yoga
//! recommendations, free text, and the `source` tag that marks live vs. sample data.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::schema::SchemaDescriptor;

/// Where did a result come from?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Source {
  Ai,       // parsed and validated from a live completion
  Fallback, // bundled sample data
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
  pub id: String,
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub explanation: Option<String>,
  pub source: Source,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudyTask {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub completed: bool,
  pub source: Source,
}

/// A video attached to a recommendation by the video-search enrichment step.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
  pub video_id: String,
  pub title: String,
  pub thumbnail_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct YogaRecommendation {
  pub id: String,
  pub title: String,
  pub description: String,
  pub reason: String,
  pub youtube_search_term: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub video: Option<VideoRef>,
  pub source: Source,
}

/// Result of a `FreeformText` request (e.g. symptom analysis).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TextResult {
  pub text: String,
  pub source: Source,
}

/// A validated list plus the tag callers surface to the user.
/// Every item carries the same tag as the list.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ValidatedResult<T> {
  pub items: Vec<T>,
  pub source: Source,
}

impl<T> ValidatedResult<T> {
  pub fn ai(items: Vec<T>) -> Self {
    Self { items, source: Source::Ai }
  }

  pub fn fallback(items: Vec<T>) -> Self {
    Self { items, source: Source::Fallback }
  }

  pub fn is_fallback(&self) -> bool {
    self.source == Source::Fallback
  }
}

/// A typed record produced by the extraction pipeline for one list schema.
pub trait Record: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
  const SCHEMA: SchemaDescriptor;

  /// The bundled dataset used when live generation fails.
  fn fallback() -> Vec<Self>;
}

impl Record for QuizQuestion {
  const SCHEMA: SchemaDescriptor = SchemaDescriptor::QuizQuestionList;
  fn fallback() -> Vec<Self> { crate::seeds::fallback_quiz() }
}

impl Record for StudyTask {
  const SCHEMA: SchemaDescriptor = SchemaDescriptor::TaskTitleList;
  fn fallback() -> Vec<Self> { crate::seeds::fallback_tasks() }
}

impl Record for YogaRecommendation {
  const SCHEMA: SchemaDescriptor = SchemaDescriptor::YogaRecommendationList;
  fn fallback() -> Vec<Self> { crate::seeds::fallback_yoga() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn source_serializes_as_lowercase_tag() {
    assert_eq!(serde_json::to_value(Source::Ai).unwrap(), json!("ai"));
    assert_eq!(serde_json::to_value(Source::Fallback).unwrap(), json!("fallback"));
  }

  #[test]
  fn quiz_question_uses_camel_case_keys() {
    let q = QuizQuestion {
      id: "quiz-1-0".into(),
      question: "2 + 2?".into(),
      options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
      correct_answer: "4".into(),
      explanation: None,
      source: Source::Ai,
    };
    let v = serde_json::to_value(&q).unwrap();
    assert_eq!(v["correctAnswer"], json!("4"));
    assert!(v.get("explanation").is_none());
  }
}
