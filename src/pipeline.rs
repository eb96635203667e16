//! Generation pipeline: prompt -> completion -> extracted JSON -> validated records.
//!
//! Per request: `Idle -> Fetching -> Extracting -> Validating -> Done`. Any
//! error short-circuits to the schema's fallback dataset, so the public
//! `generate_*` functions always resolve. Requests share no mutable state.

use std::{fmt, sync::Arc};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::completion::{CompletionFetcher, FetchError};
use crate::domain::{QuizQuestion, Record, Source, StudyTask, TextResult, ValidatedResult, YogaRecommendation};
use crate::extract::{extract, strip_fences, ExtractionError};
use crate::seeds::fallback_text;
use crate::util::trunc_for_log;
use crate::validate::{validate, ValidationError};
use crate::video::VideoSearch;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
  Idle,
  Fetching,
  Extracting,
  Validating,
  Done,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Stage::Idle => "idle",
      Stage::Fetching => "fetching",
      Stage::Extracting => "extracting",
      Stage::Validating => "validating",
      Stage::Done => "done",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("no completion provider configured")]
  Disabled,
  #[error(transparent)]
  Fetch(#[from] FetchError),
  #[error(transparent)]
  Extract(#[from] ExtractionError),
  #[error(transparent)]
  Validate(#[from] ValidationError),
}

impl PipelineError {
  /// The stage that was running when the request failed.
  pub fn stage(&self) -> Stage {
    match self {
      PipelineError::Disabled | PipelineError::Fetch(_) => Stage::Fetching,
      PipelineError::Extract(_) => Stage::Extracting,
      PipelineError::Validate(_) => Stage::Validating,
    }
  }
}

#[derive(Clone, Default)]
pub struct Generator {
  fetcher: Option<Arc<dyn CompletionFetcher>>,
  videos: Option<VideoSearch>,
}

impl Generator {
  pub fn new(fetcher: Option<Arc<dyn CompletionFetcher>>, videos: Option<VideoSearch>) -> Self {
    Self { fetcher, videos }
  }

  pub fn is_live(&self) -> bool {
    self.fetcher.is_some()
  }

  pub fn videos(&self) -> Option<&VideoSearch> {
    self.videos.as_ref()
  }

  async fn fetch(&self, prompt: &str) -> Result<String, PipelineError> {
    let fetcher = self.fetcher.as_ref().ok_or(PipelineError::Disabled)?;
    Ok(fetcher.fetch(prompt).await?)
  }

  /// Run every stage for one list schema, surfacing the first error.
  #[instrument(level = "info", skip(self, prompt), fields(schema = %T::SCHEMA, prompt_len = prompt.len()))]
  pub async fn run<T: Record>(&self, prompt: &str) -> Result<Vec<T>, PipelineError> {
    let mut stage = Stage::Idle;
    debug!(target: "pipeline", %stage);

    stage = Stage::Fetching;
    debug!(target: "pipeline", %stage);
    let raw = self.fetch(prompt).await?;

    stage = Stage::Extracting;
    debug!(target: "pipeline", %stage, raw = %trunc_for_log(&raw, 120));
    let payload = extract(&raw, T::SCHEMA.container())?;

    stage = Stage::Validating;
    debug!(target: "pipeline", %stage, span_len = payload.span.len());
    let items = validate::<T>(&payload.value)?;

    stage = Stage::Done;
    debug!(target: "pipeline", %stage, items = items.len());
    Ok(items)
  }

  /// Never fails: any pipeline error resolves to `T::fallback()`.
  pub async fn generate<T: Record>(&self, prompt: &str) -> ValidatedResult<T> {
    match self.run::<T>(prompt).await {
      Ok(items) => {
        info!(target: "pipeline", schema = %T::SCHEMA, items = items.len(), source = "ai", "Generation succeeded");
        ValidatedResult::ai(items)
      }
      Err(e) => {
        warn!(target: "pipeline", schema = %T::SCHEMA, stage = %e.stage(), error = %e, "Generation failed; serving fallback");
        ValidatedResult::fallback(T::fallback())
      }
    }
  }

  pub async fn generate_quiz(&self, prompt: &str) -> ValidatedResult<QuizQuestion> {
    self.generate(prompt).await
  }

  pub async fn generate_tasks(&self, prompt: &str) -> ValidatedResult<StudyTask> {
    self.generate(prompt).await
  }

  /// Yoga advice, with a best-effort video attached to each AI recommendation.
  pub async fn generate_yoga_advice(&self, prompt: &str) -> ValidatedResult<YogaRecommendation> {
    let mut result = self.generate::<YogaRecommendation>(prompt).await;
    if let (Source::Ai, Some(videos)) = (result.source, &self.videos) {
      result.items = videos.enrich(result.items).await;
    }
    result
  }

  /// Free text (e.g. symptom analysis). Fences are stripped; blank or failed
  /// completions resolve to the fallback notice.
  #[instrument(level = "info", skip(self, prompt), fields(prompt_len = prompt.len()))]
  pub async fn generate_text(&self, prompt: &str) -> TextResult {
    match self.fetch(prompt).await {
      Ok(raw) => {
        let text = strip_fences(&raw).trim();
        if text.is_empty() {
          warn!(target: "pipeline", schema = "text", "Completion was only a fence; serving fallback");
          return fallback_text();
        }
        TextResult { text: text.to_string(), source: Source::Ai }
      }
      Err(e) => {
        warn!(target: "pipeline", schema = "text", stage = %e.stage(), error = %e, "Generation failed; serving fallback");
        fallback_text()
      }
    }
  }
}
