//! Project-supplied overrides (a YAML file in the repository).
//!
//! Only a whitelisted subset of `core` may be overridden; anything else in
//! the document is dropped.

use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

use super::{BuildState, CoreState};

/// `core` fields a project may override from its repository.
pub const OVERRIDABLE_CORE_FIELDS: &[&str] = &[
  "language",
  "name",
  "analytics_code",
  "canonical_url",
  "single_version",
  "virtualenv",
  "interpreter",
  "system_packages",
  "documentation_type",
  "requirements_file",
  "config_path",
];

#[derive(Debug, Error)]
pub enum OverrideError {
  #[error("failed to parse overrides: {0}")]
  Parse(#[source] serde_yaml::Error),

  #[error("invalid override value: {0}")]
  Invalid(#[source] serde_json::Error),
}

/// Parse an overrides document.
pub fn parse_overrides(text: &str) -> Result<Value, OverrideError> {
  serde_yaml::from_str(text).map_err(OverrideError::Parse)
}

impl BuildState {
  /// Merge whitelisted `core` keys from `doc` into this state.
  pub fn apply_overrides(&mut self, doc: &Value) -> Result<(), OverrideError> {
    let Some(mapping) = doc.as_mapping() else {
      debug!("overrides document is not a mapping, ignoring");
      return Ok(());
    };

    for (key, _) in mapping.iter().filter(|(key, _)| key.as_str() != Some("core")) {
      debug!(key = ?key, "dropping override section");
    }

    let Some(core) = mapping.get("core").and_then(Value::as_mapping) else {
      return Ok(());
    };

    let mut merged = serde_json::to_value(&self.core).map_err(OverrideError::Invalid)?;
    let Some(fields) = merged.as_object_mut() else {
      return Ok(());
    };

    for (key, value) in core {
      match key.as_str().filter(|k| OVERRIDABLE_CORE_FIELDS.contains(k)) {
        Some(field) => {
          let value = serde_json::to_value(value).map_err(OverrideError::Invalid)?;
          debug!(field, "applying override");
          fields.insert(field.to_string(), value);
        }
        None => debug!(key = ?key, "dropping override key"),
      }
    }

    self.core = serde_json::from_value::<CoreState>(merged).map_err(OverrideError::Invalid)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::kong_state;

  #[test]
  fn update_config() {
    let mut state = kong_state("/srv");
    let doc = parse_overrides("core:\n  analytics_code: Wootles\n").unwrap();

    state.apply_overrides(&doc).unwrap();

    assert_eq!(state.core.analytics_code.as_deref(), Some("Wootles"));
  }

  #[test]
  fn non_whitelisted_keys_are_dropped() {
    let mut state = kong_state("/srv");
    let before = state.clone();
    let doc = parse_overrides(
      r#"
core:
  version: hacked
  versions: [a, b]
  bogus: 1
fs:
  root: /etc
settings:
  api_host: https://evil.example
"#,
    )
    .unwrap();

    state.apply_overrides(&doc).unwrap();

    assert_eq!(state, before);
  }

  #[test]
  fn several_whitelisted_keys() {
    let mut state = kong_state("/srv");
    let doc = parse_overrides(
      r#"
core:
  language: de
  virtualenv: false
  requirements_file: docs/requirements.txt
"#,
    )
    .unwrap();

    state.apply_overrides(&doc).unwrap();

    assert_eq!(state.core.language, "de");
    assert!(!state.core.virtualenv);
    assert_eq!(state.core.requirements_file(), Some("docs/requirements.txt"));
  }

  #[test]
  fn wrong_type_is_an_error() {
    let mut state = kong_state("/srv");
    let doc = parse_overrides("core:\n  virtualenv: [1, 2]\n").unwrap();

    assert!(matches!(state.apply_overrides(&doc), Err(OverrideError::Invalid(_))));
  }

  #[test]
  fn empty_document_is_a_no_op() {
    let mut state = kong_state("/srv");
    let before = state.clone();
    state.apply_overrides(&parse_overrides("").unwrap()).unwrap();
    assert_eq!(state, before);
  }
}
