use serde::{Deserialize, Serialize};

/// Site-wide settings rendered into the build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsState {
  pub api_host: String,
  pub media_url: String,
  pub static_path: String,
  pub template_path: Option<String>,
  pub production_domain: String,
}

impl Default for SettingsState {
  fn default() -> Self {
    Self {
      api_host: "https://readthedocs.org".to_string(),
      media_url: "https://media.readthedocs.org".to_string(),
      static_path: "/static/".to_string(),
      template_path: None,
      production_domain: "readthedocs.org".to_string(),
    }
  }
}
