//! Bundled fallback datasets.
//!
//! These guarantee the dashboard always has something to show when the model
//! is unavailable or returns unusable output. Every item is tagged `fallback`.

use serde::Serialize;

use crate::domain::{QuizQuestion, Source, StudyTask, TextResult, VideoRef, YogaRecommendation};
use crate::schema::SchemaDescriptor;

/// The fallback dataset for one schema.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "schema", content = "items", rename_all = "snake_case")]
pub enum FallbackDataset {
  Quiz(Vec<QuizQuestion>),
  Tasks(Vec<StudyTask>),
  Yoga(Vec<YogaRecommendation>),
  Text(TextResult),
}

pub fn fallback_for(schema: SchemaDescriptor) -> FallbackDataset {
  match schema {
    SchemaDescriptor::QuizQuestionList => FallbackDataset::Quiz(fallback_quiz()),
    SchemaDescriptor::TaskTitleList => FallbackDataset::Tasks(fallback_tasks()),
    SchemaDescriptor::YogaRecommendationList => FallbackDataset::Yoga(fallback_yoga()),
    SchemaDescriptor::FreeformText => FallbackDataset::Text(fallback_text()),
  }
}

fn quiz(n: usize, question: &str, options: [&str; 4], answer: &str, explanation: &str) -> QuizQuestion {
  QuizQuestion {
    id: format!("fallback-quiz-{n}"),
    question: question.into(),
    options: options.iter().map(|o| o.to_string()).collect(),
    correct_answer: answer.into(),
    explanation: Some(explanation.into()),
    source: Source::Fallback,
  }
}

pub fn fallback_quiz() -> Vec<QuizQuestion> {
  vec![
    quiz(1, "What is the capital of France?", ["Paris", "London", "Berlin", "Madrid"], "Paris",
      "Paris has been the capital of France since the 10th century."),
    quiz(2, "Which planet is known as the Red Planet?", ["Venus", "Mars", "Jupiter", "Saturn"], "Mars",
      "Iron oxide on its surface gives Mars its reddish colour."),
    quiz(3, "What is the largest ocean on Earth?", ["Atlantic Ocean", "Indian Ocean", "Arctic Ocean", "Pacific Ocean"], "Pacific Ocean",
      "The Pacific covers roughly a third of the planet's surface."),
    quiz(4, "Who wrote 'Romeo and Juliet'?", ["Charles Dickens", "William Shakespeare", "Jane Austen", "Mark Twain"], "William Shakespeare",
      "Shakespeare wrote the play in the 1590s."),
    quiz(5, "What is the chemical symbol for water?", ["H2O", "CO2", "O2", "NaCl"], "H2O",
      "A water molecule has two hydrogen atoms and one oxygen atom."),
  ]
}

pub fn fallback_tasks() -> Vec<StudyTask> {
  [
    "Review lecture notes for 30 minutes",
    "Complete one practice problem set",
    "Summarize a chapter in your own words",
    "Make flashcards for key terms",
    "Take a 10-minute break and stretch",
  ]
  .iter()
  .enumerate()
  .map(|(i, title)| StudyTask {
    id: format!("fallback-tasks-{}", i + 1),
    title: title.to_string(),
    completed: false,
    source: Source::Fallback,
  })
  .collect()
}

fn yoga(n: usize, title: &str, description: &str, reason: &str, term: &str) -> YogaRecommendation {
  YogaRecommendation {
    id: format!("fallback-yoga-{n}"),
    title: title.into(),
    description: description.into(),
    reason: reason.into(),
    youtube_search_term: term.into(),
    video: None,
    source: Source::Fallback,
  }
}

pub fn fallback_yoga() -> Vec<YogaRecommendation> {
  vec![
    yoga(1, "Child's Pose",
      "Kneel, sit back on your heels and fold forward with arms extended.",
      "Gently stretches the back and calms the nervous system.",
      "child's pose yoga tutorial"),
    yoga(2, "Cat-Cow",
      "On hands and knees, alternate arching and rounding the spine with the breath.",
      "Mobilizes the spine and relieves tension in the neck and back.",
      "cat cow pose yoga"),
    yoga(3, "Downward-Facing Dog",
      "From hands and knees, lift the hips up and back into an inverted V.",
      "Stretches hamstrings and calves while strengthening the shoulders.",
      "downward dog yoga beginners"),
  ]
}

/// Sample search results served when video search is unavailable.
pub fn fallback_videos() -> Vec<VideoRef> {
  [
    ("v7AYKMP6rOE", "Yoga For Complete Beginners - 20 Minute Home Yoga Workout"),
    ("4pKly2JojMw", "10 Minute Morning Yoga for Beginners"),
    ("sTANio_2E0Q", "Yoga For Flexibility - 15 Minute Stretch"),
  ]
  .iter()
  .map(|(id, title)| VideoRef {
    video_id: id.to_string(),
    title: title.to_string(),
    thumbnail_url: format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"),
  })
  .collect()
}

pub fn fallback_text() -> TextResult {
  TextResult {
    text: "AI analysis is unavailable right now. This is sample content: rest, stay hydrated, \
           and consult a healthcare professional if symptoms persist or worsen."
      .into(),
    source: Source::Fallback,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn first_quiz_question_is_the_capital_of_france() {
    let q = fallback_quiz();
    assert_eq!(q.len(), 5);
    assert_eq!(q[0].question, "What is the capital of France?");
    assert_eq!(q[0].correct_answer, "Paris");
  }

  #[test]
  fn fallback_quiz_is_internally_consistent() {
    for q in fallback_quiz() {
      assert_eq!(q.options.len(), 4);
      assert!(q.options.contains(&q.correct_answer), "{}", q.question);
      assert_eq!(q.source, Source::Fallback);
    }
  }

  #[test]
  fn every_dataset_is_non_empty_and_tagged() {
    assert_eq!(fallback_tasks().len(), 5);
    assert!(fallback_tasks().iter().all(|t| t.source == Source::Fallback && !t.completed));
    assert_eq!(fallback_yoga().len(), 3);
    assert!(fallback_yoga().iter().all(|y| y.source == Source::Fallback));
    assert_eq!(fallback_videos().len(), 3);
    assert_eq!(fallback_text().source, Source::Fallback);
  }

  #[test]
  fn fallback_for_matches_schema() {
    assert!(matches!(fallback_for(SchemaDescriptor::QuizQuestionList), FallbackDataset::Quiz(v) if v.len() == 5));
    assert!(matches!(fallback_for(SchemaDescriptor::TaskTitleList), FallbackDataset::Tasks(_)));
    assert!(matches!(fallback_for(SchemaDescriptor::YogaRecommendationList), FallbackDataset::Yoga(_)));
    assert!(matches!(fallback_for(SchemaDescriptor::FreeformText), FallbackDataset::Text(_)));
  }
}
