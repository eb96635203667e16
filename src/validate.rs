//! Shape validation and normalization of parsed completions.
//!
//! Items that miss a required field (or carry the wrong kind of value) are
//! dropped one by one; the batch only fails when nothing survives. Survivors
//! are rewritten under canonical field names, get a fresh local id and the
//! `ai` source tag, and are then deserialized into the typed record.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::domain::{Record, Source};
use crate::schema::{Container, FieldKind, FieldSpec, SchemaDescriptor};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
  #[error("schema {schema} expects a JSON {expected}, got {found}")]
  WrongShape { schema: SchemaDescriptor, expected: &'static str, found: &'static str },
  #[error("none of the {total} {schema} items had every required field")]
  NoValidItems { schema: SchemaDescriptor, total: usize },
}

fn kind_name(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

fn lookup<'a>(obj: &'a Map<String, Value>, name: &str, alias: Option<&str>) -> Option<&'a Value> {
  obj.get(name).or_else(|| alias.and_then(|a| obj.get(a)))
}

fn non_empty_str(v: &Value) -> Option<&str> {
  v.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn check_field(obj: &Map<String, Value>, out: &Map<String, Value>, spec: &FieldSpec) -> Option<Value> {
  let v = lookup(obj, spec.name, spec.alias)?;
  match spec.kind {
    FieldKind::NonEmptyString => non_empty_str(v).map(|s| json!(s)),
    FieldKind::StringArray { exact_len } => {
      let arr = v.as_array()?;
      if exact_len.is_some_and(|n| arr.len() != n) {
        return None;
      }
      let items: Option<Vec<&str>> = arr.iter().map(|e| e.as_str().map(str::trim)).collect();
      items.map(|items| json!(items))
    }
    FieldKind::MemberOf(field) => {
      let s = non_empty_str(v)?;
      let allowed = out.get(field)?.as_array()?;
      allowed.iter().any(|a| a.as_str() == Some(s)).then(|| json!(s))
    }
  }
}

/// Check one element against `schema` and rewrite it under canonical field
/// names. `None` means the element is dropped.
pub fn normalize_item(item: &Value, schema: SchemaDescriptor) -> Option<Map<String, Value>> {
  let wrapped;
  let obj = match item {
    Value::Object(obj) => obj,
    Value::String(_) if schema.accepts_bare_strings() => {
      let mut m = Map::new();
      m.insert("title".into(), item.clone());
      wrapped = m;
      &wrapped
    }
    _ => return None,
  };

  let fields = schema.required_fields();
  let mut out = Map::new();
  // MemberOf refers to sibling fields, so those are checked last.
  let (deferred, direct): (Vec<&FieldSpec>, Vec<&FieldSpec>) =
    fields.iter().partition(|f| matches!(f.kind, FieldKind::MemberOf(_)));
  for spec in direct.into_iter().chain(deferred) {
    let value = check_field(obj, &out, spec)?;
    out.insert(spec.name.to_string(), value);
  }

  for (name, alias) in schema.optional_fields() {
    if let Some(s) = lookup(obj, name, *alias).and_then(non_empty_str) {
      out.insert(name.to_string(), json!(s));
    }
  }
  Some(out)
}

/// Process-wide sequence so ids stay unique across batches stamped in the same millisecond.
static ID_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_id(schema: SchemaDescriptor, stamp: i64) -> String {
  format!("{}-{}-{}", schema.name(), stamp, ID_SEQ.fetch_add(1, Ordering::Relaxed))
}

/// Validate `parsed` against `T::SCHEMA`, stamping ids with the current time.
pub fn validate<T: Record>(parsed: &Value) -> Result<Vec<T>, ValidationError> {
  validate_at::<T>(parsed, Utc::now().timestamp_millis())
}

/// Same as [`validate`] with an explicit id timestamp (unix millis).
pub fn validate_at<T: Record>(parsed: &Value, stamp: i64) -> Result<Vec<T>, ValidationError> {
  let schema = T::SCHEMA;
  let items: Vec<&Value> = match (schema.container(), parsed) {
    (Container::Array, Value::Array(items)) => items.iter().collect(),
    (Container::Object, Value::Object(_)) => vec![parsed],
    (Container::Array, other) => {
      return Err(ValidationError::WrongShape { schema, expected: "array", found: kind_name(other) })
    }
    (Container::Object, other) => {
      return Err(ValidationError::WrongShape { schema, expected: "object", found: kind_name(other) })
    }
    (Container::Text, other) => {
      return Err(ValidationError::WrongShape { schema, expected: "text", found: kind_name(other) })
    }
  };

  let total = items.len();
  let mut out = Vec::with_capacity(total);
  for (pos, item) in items.into_iter().enumerate() {
    let Some(mut fields) = normalize_item(item, schema) else {
      debug!(target: "pipeline", %schema, pos, "Dropping item missing required fields");
      continue;
    };
    fields.insert("id".into(), json!(next_id(schema, stamp)));
    fields.insert("source".into(), json!(Source::Ai));
    match serde_json::from_value::<T>(Value::Object(fields)) {
      Ok(record) => out.push(record),
      Err(e) => debug!(target: "pipeline", %schema, pos, error = %e, "Dropping item that failed to deserialize"),
    }
  }

  if out.is_empty() {
    return Err(ValidationError::NoValidItems { schema, total });
  }
  debug!(target: "pipeline", %schema, kept = out.len(), dropped = total - out.len(), "Validated items");
  Ok(out)
}
