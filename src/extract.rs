//! Structured extraction: find the JSON a model was asked to return inside
//! whatever it actually returned (markdown fences, a polite preamble, trailing
//! commentary) and parse it.
//!
//! Algorithm:
//! 1. `` ```json `` fence present: take what follows it up to the next `` ``` `` (or the end).
//! 2. Otherwise a bare `` ``` `` pair: take what sits between the first two.
//! 3. Otherwise the raw text as-is.
//! 4. Slice from the first opening bracket of the expected container to the
//!    last matching closing bracket.
//! 5. Parse.
//!
//! Pure: no I/O, no allocation beyond the returned span.

use serde_json::Value;
use thiserror::Error;

use crate::schema::Container;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum ExtractionError {
  #[error("no JSON {0} found in completion")]
  NoJsonFound(&'static str),
  /// `span` is kept for diagnostics only; it is never shown to users.
  #[error("malformed JSON in completion: {source}")]
  MalformedJson {
    span: String,
    #[source]
    source: serde_json::Error,
  },
}

/// The substring judged to be JSON and its parsed (not yet validated) value.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPayload {
  pub span: String,
  pub value: Value,
}

impl Container {
  fn brackets(self) -> Option<(char, char)> {
    match self {
      Container::Array => Some(('[', ']')),
      Container::Object => Some(('{', '}')),
      Container::Text => None,
    }
  }

  fn label(self) -> &'static str {
    match self {
      Container::Array => "array",
      Container::Object => "object",
      Container::Text => "value",
    }
  }
}

/// Remove a markdown code fence around the payload, if there is one.
pub fn strip_fences(raw: &str) -> &str {
  if let Some(start) = raw.find(JSON_FENCE) {
    let rest = &raw[start + JSON_FENCE.len()..];
    let end = rest.find(FENCE).unwrap_or(rest.len());
    return rest[..end].trim();
  }
  if let Some(start) = raw.find(FENCE) {
    let rest = &raw[start + FENCE.len()..];
    if let Some(end) = rest.find(FENCE) {
      return rest[..end].trim();
    }
  }
  raw
}

/// Slice `text` from the first opening bracket to the last closing one.
/// A missing (or misplaced) closing bracket keeps the tail so parsing reports it.
fn slice_container(text: &str, container: Container) -> Option<&str> {
  let Some((open, close)) = container.brackets() else {
    return Some(text.trim());
  };
  let start = text.find(open)?;
  match text.rfind(close) {
    Some(end) if end > start => Some(&text[start..=end]),
    _ => Some(&text[start..]),
  }
}

pub fn extract(raw: &str, container: Container) -> Result<ExtractedPayload, ExtractionError> {
  let unfenced = strip_fences(raw);
  let span = slice_container(unfenced, container)
    .ok_or(ExtractionError::NoJsonFound(container.label()))?;

  match serde_json::from_str::<Value>(span) {
    Ok(value) => Ok(ExtractedPayload { span: span.to_string(), value }),
    Err(source) => Err(ExtractionError::MalformedJson { span: span.to_string(), source }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn clean_json_is_returned_unchanged() {
    for s in [r#"[{"a":1},{"b":[1,2]}]"#, "[]", r#"["x", "y"]"#] {
      assert_eq!(extract(s, Container::Array).unwrap().span, s);
    }
    let obj = r#"{"a":{"b":[1]}}"#;
    assert_eq!(extract(obj, Container::Object).unwrap().span, obj);
  }

  #[test]
  fn json_fence_is_stripped() {
    let p = extract("```json\n[{\"a\":1}]\n```", Container::Array).unwrap();
    assert_eq!(p.value, json!([{"a": 1}]));
  }

  #[test]
  fn bare_fence_is_stripped() {
    let p = extract("Sure!\n```\n[{\"a\":1}]\n```\nEnjoy.", Container::Array).unwrap();
    assert_eq!(p.value, json!([{"a": 1}]));
  }

  #[test]
  fn unterminated_json_fence_keeps_the_rest() {
    let p = extract("```json\n[1, 2, 3]", Container::Array).unwrap();
    assert_eq!(p.value, json!([1, 2, 3]));
  }

  #[test]
  fn surrounding_prose_is_ignored() {
    let p = extract("Here is your data: [{\"a\":1}] Hope this helps!", Container::Array).unwrap();
    assert_eq!(p.value, json!([{"a": 1}]));
  }

  #[test]
  fn nested_brackets_use_the_last_closer() {
    let p = extract("Result: [[1], [2, [3]]] done", Container::Array).unwrap();
    assert_eq!(p.value, json!([[1], [2, [3]]]));
  }

  #[test]
  fn object_container_slices_braces() {
    let p = extract("Answer -> {\"ok\": true} <- end", Container::Object).unwrap();
    assert_eq!(p.value, json!({"ok": true}));
  }

  #[test]
  fn trailing_comma_is_malformed() {
    match extract("[{\"a\":1,}]", Container::Array) {
      Err(ExtractionError::MalformedJson { span, .. }) => assert_eq!(span, "[{\"a\":1,}]"),
      other => panic!("expected MalformedJson, got {other:?}"),
    }
  }

  #[test]
  fn prose_without_brackets_is_not_parsed() {
    assert!(matches!(
      extract("I'm sorry, I can't help with that.", Container::Array),
      Err(ExtractionError::NoJsonFound("array"))
    ));
  }

  #[test]
  fn missing_closer_is_malformed_not_missing() {
    assert!(matches!(
      extract("Here: [{\"a\": 1}", Container::Array),
      Err(ExtractionError::MalformedJson { .. })
    ));
  }

  #[test]
  fn strip_fences_is_a_no_op_without_fences() {
    assert_eq!(strip_fences("plain text"), "plain text");
    assert_eq!(strip_fences("one ``` fence only"), "one ``` fence only");
  }
}
