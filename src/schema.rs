//! Schema descriptors for the structured results the dashboard asks the model for.
//!
//! A descriptor names the expected container (array / text) and the required
//! fields of each item. Field names are the camelCase keys the prompts ask for;
//! a snake_case alias is accepted because models drift between the two.

use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

/// Which of the known result shapes a caller expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaDescriptor {
  QuizQuestionList,
  TaskTitleList,
  YogaRecommendationList,
  FreeformText,
}

/// Top-level JSON container a schema expects to find in a completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
  Array,
  /// Single-record mode of the extractor and validator. None of the
  /// dashboard schemas use it yet.
  #[allow(dead_code)]
  Object,
  /// No JSON at all: the completion text is the result.
  Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
  /// A string that is non-empty after trimming.
  NonEmptyString,
  /// An array whose elements are all strings (possibly empty unless `exact_len` says otherwise).
  StringArray { exact_len: Option<usize> },
  /// A non-empty string equal to one element of the named string-array field of the same item.
  MemberOf(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
  pub name: &'static str,
  pub alias: Option<&'static str>,
  pub kind: FieldKind,
}

const QUIZ_FIELDS: &[FieldSpec] = &[
  FieldSpec { name: "question", alias: None, kind: FieldKind::NonEmptyString },
  FieldSpec { name: "options", alias: None, kind: FieldKind::StringArray { exact_len: Some(4) } },
  FieldSpec { name: "correctAnswer", alias: Some("correct_answer"), kind: FieldKind::MemberOf("options") },
];

const TASK_FIELDS: &[FieldSpec] = &[
  FieldSpec { name: "title", alias: None, kind: FieldKind::NonEmptyString },
];

const YOGA_FIELDS: &[FieldSpec] = &[
  FieldSpec { name: "title", alias: None, kind: FieldKind::NonEmptyString },
  FieldSpec { name: "description", alias: None, kind: FieldKind::NonEmptyString },
  FieldSpec { name: "reason", alias: None, kind: FieldKind::NonEmptyString },
  FieldSpec { name: "youtubeSearchTerm", alias: Some("youtube_search_term"), kind: FieldKind::NonEmptyString },
];

/// Optional fields carried through normalization when present: (canonical, alias).
const QUIZ_OPTIONAL: &[(&str, Option<&str>)] = &[("explanation", None)];

impl SchemaDescriptor {
  pub const ALL: [SchemaDescriptor; 4] = [
    SchemaDescriptor::QuizQuestionList,
    SchemaDescriptor::TaskTitleList,
    SchemaDescriptor::YogaRecommendationList,
    SchemaDescriptor::FreeformText,
  ];

  /// Short name used in ids, logs and the HTTP surface.
  pub fn name(self) -> &'static str {
    match self {
      SchemaDescriptor::QuizQuestionList => "quiz",
      SchemaDescriptor::TaskTitleList => "tasks",
      SchemaDescriptor::YogaRecommendationList => "yoga",
      SchemaDescriptor::FreeformText => "text",
    }
  }

  pub fn container(self) -> Container {
    match self {
      SchemaDescriptor::FreeformText => Container::Text,
      _ => Container::Array,
    }
  }

  pub fn required_fields(self) -> &'static [FieldSpec] {
    match self {
      SchemaDescriptor::QuizQuestionList => QUIZ_FIELDS,
      SchemaDescriptor::TaskTitleList => TASK_FIELDS,
      SchemaDescriptor::YogaRecommendationList => YOGA_FIELDS,
      SchemaDescriptor::FreeformText => &[],
    }
  }

  pub fn optional_fields(self) -> &'static [(&'static str, Option<&'static str>)] {
    match self {
      SchemaDescriptor::QuizQuestionList => QUIZ_OPTIONAL,
      _ => &[],
    }
  }

  /// Task lists may come back as a plain array of titles.
  pub fn accepts_bare_strings(self) -> bool {
    matches!(self, SchemaDescriptor::TaskTitleList)
  }
}

impl fmt::Display for SchemaDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Programmer error: a schema name that does not match any known descriptor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
  #[error("unknown schema descriptor: {0:?}")]
  Unknown(String),
}

impl FromStr for SchemaDescriptor {
  type Err = SchemaError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let key = s.trim().to_ascii_lowercase();
    SchemaDescriptor::ALL
      .into_iter()
      .find(|d| d.name() == key)
      .ok_or_else(|| SchemaError::Unknown(s.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_round_trip_through_from_str() {
    for d in SchemaDescriptor::ALL {
      assert_eq!(d.name().parse::<SchemaDescriptor>(), Ok(d));
    }
    assert_eq!(" Quiz ".parse::<SchemaDescriptor>(), Ok(SchemaDescriptor::QuizQuestionList));
  }

  #[test]
  fn unknown_name_is_a_schema_error() {
    assert_eq!(
      "horoscope".parse::<SchemaDescriptor>(),
      Err(SchemaError::Unknown("horoscope".into()))
    );
  }

  #[test]
  fn quiz_answer_must_come_from_options() {
    let answer = SchemaDescriptor::QuizQuestionList
      .required_fields()
      .iter()
      .find(|f| f.name == "correctAnswer")
      .map(|f| f.kind);
    assert_eq!(answer, Some(FieldKind::MemberOf("options")));
  }

  #[test]
  fn freeform_text_has_no_json_container() {
    assert_eq!(SchemaDescriptor::FreeformText.container(), Container::Text);
    assert!(SchemaDescriptor::FreeformText.required_fields().is_empty());
  }
}
