//! JSON documents written to stdout.
//!
//! Callers always get a JSON document back: the build results, or an error
//! document of the form `{"doc_builder": [-1, "", "<Kind>: <message>"]}`.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use docbuild_lib::{BuildError, BuildResult, ConfigError, OverrideError, StateError};

/// Key of the error document.
pub const ERROR_KEY: &str = "doc_builder";

/// Category name for an error coming out of a command.
pub fn error_kind(err: &anyhow::Error) -> &'static str {
  if let Some(err) = err.downcast_ref::<BuildError>() {
    err.kind()
  } else if err.downcast_ref::<StateError>().is_some() {
    "StateError"
  } else if err.downcast_ref::<OverrideError>().is_some() {
    "OverrideError"
  } else if err.downcast_ref::<ConfigError>().is_some() {
    "ConfigError"
  } else {
    "Error"
  }
}

pub fn error_document(kind: &str, message: &str) -> Value {
  let mut doc = Map::new();
  doc.insert(ERROR_KEY.to_string(), json!([-1, "", format!("{}: {}", kind, message)]));
  Value::Object(doc)
}

pub fn error_document_for(err: &anyhow::Error) -> Value {
  error_document(error_kind(err), &format!("{:#}", err))
}

pub fn results_document(results: &BTreeMap<String, BuildResult>) -> Value {
  serde_json::to_value(results).unwrap_or_else(|e| error_document("RenderError", &e.to_string()))
}
