use std::path::Path;

use serde::{Deserialize, Serialize};

/// Project-level build settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreState {
  pub language: String,
  pub versions: Vec<String>,
  /// `(label, url)` pairs for downloadable formats.
  pub downloads: Vec<(String, String)>,
  pub name: Option<String>,
  pub project: Option<String>,
  /// Version slug being built.
  pub version: String,
  pub analytics_code: Option<String>,
  pub canonical_url: Option<String>,
  pub single_version: bool,
  pub virtualenv: bool,
  pub interpreter: String,
  pub system_packages: bool,
  pub documentation_type: String,
  pub requirements_file: Option<String>,
  pub config_path: Option<String>,
}

impl Default for CoreState {
  fn default() -> Self {
    Self {
      language: "en".to_string(),
      versions: Vec::new(),
      downloads: Vec::new(),
      name: None,
      project: None,
      version: "latest".to_string(),
      analytics_code: None,
      canonical_url: None,
      single_version: false,
      virtualenv: true,
      interpreter: "python2".to_string(),
      system_packages: false,
      documentation_type: "sphinx".to_string(),
      requirements_file: None,
      config_path: None,
    }
  }
}

impl CoreState {
  /// Requirements file relative to the checkout, if one is configured.
  pub fn requirements_file(&self) -> Option<&str> {
    self.requirements_file.as_deref().filter(|s| !s.is_empty())
  }

  /// Pinned config entry point relative to the checkout, if any.
  pub fn config_path(&self) -> Option<&Path> {
    self.config_path.as_deref().filter(|s| !s.is_empty()).map(Path::new)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_strings_mean_unset() {
    let core = CoreState {
      requirements_file: Some(String::new()),
      config_path: Some(String::new()),
      ..CoreState::default()
    };
    assert_eq!(core.requirements_file(), None);
    assert_eq!(core.config_path(), None);

    let core = CoreState {
      requirements_file: Some("requirements.txt".to_string()),
      config_path: Some("docs/conf.py".to_string()),
      ..CoreState::default()
    };
    assert_eq!(core.requirements_file(), Some("requirements.txt"));
    assert_eq!(core.config_path(), Some(Path::new("docs/conf.py")));
  }

  #[test]
  fn missing_fields_take_defaults() {
    let core: CoreState = serde_json::from_str(r#"{"language":"de"}"#).unwrap();
    assert_eq!(core.language, "de");
    assert_eq!(core.interpreter, "python2");
    assert!(core.virtualenv);
    assert_eq!(core.version, "latest");
  }
}
