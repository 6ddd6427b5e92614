//! Execution configuration: where build commands run.
//!
//! Values come from defaults, then `DOCBUILD_*` environment variables, then
//! whatever the caller sets on top (CLI flags).

use thiserror::Error;

use crate::consts::DOCKER_IMAGE;

pub const ENV_USE_DOCKER: &str = "DOCBUILD_USE_DOCKER";
pub const ENV_DOCKER_BIN: &str = "DOCBUILD_DOCKER_BIN";
pub const ENV_DOCKER_IMAGE: &str = "DOCBUILD_DOCKER_IMAGE";
pub const ENV_DOCKER_USER: &str = "DOCBUILD_DOCKER_USER";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid value for {var}: {value:?} (expected true/false/1/0/yes/no)")]
  InvalidValue { var: &'static str, value: String },
}

/// Container settings for [`crate::DockerEnvironment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerConfig {
  pub binary: String,
  pub image: String,
  pub user: Option<String>,
  pub remove: bool,
}

impl Default for DockerConfig {
  fn default() -> Self {
    Self {
      binary: "docker".to_string(),
      image: DOCKER_IMAGE.to_string(),
      user: None,
      remove: true,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionConfig {
  pub use_docker: bool,
  pub docker: DockerConfig,
}

impl ExecutionConfig {
  /// Defaults overlaid with the `DOCBUILD_*` environment variables.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Ok(value) = std::env::var(ENV_USE_DOCKER) {
      config.use_docker = parse_bool(ENV_USE_DOCKER, &value)?;
    }
    if let Some(binary) = non_empty_var(ENV_DOCKER_BIN) {
      config.docker.binary = binary;
    }
    if let Some(image) = non_empty_var(ENV_DOCKER_IMAGE) {
      config.docker.image = image;
    }
    if let Some(user) = non_empty_var(ENV_DOCKER_USER) {
      config.docker.user = Some(user);
    }

    Ok(config)
  }
}

fn non_empty_var(var: &str) -> Option<String> {
  std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
  match value.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Ok(true),
    "" | "0" | "false" | "no" | "off" => Ok(false),
    _ => Err(ConfigError::InvalidValue {
      var,
      value: value.to_string(),
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const ALL_VARS: [&str; 4] = [ENV_USE_DOCKER, ENV_DOCKER_BIN, ENV_DOCKER_IMAGE, ENV_DOCKER_USER];

  #[test]
  #[serial]
  fn defaults_without_env() {
    temp_env::with_vars(ALL_VARS.map(|v| (v, None::<&str>)), || {
      let config = ExecutionConfig::from_env().unwrap();
      assert!(!config.use_docker);
      assert_eq!(config.docker.binary, "docker");
      assert_eq!(config.docker.image, "rtfd-build");
      assert_eq!(config.docker.user, None);
      assert!(config.docker.remove);
    });
  }

  #[test]
  #[serial]
  fn env_overrides_defaults() {
    temp_env::with_vars(
      [
        (ENV_USE_DOCKER, Some("yes")),
        (ENV_DOCKER_BIN, Some("/usr/local/bin/podman")),
        (ENV_DOCKER_IMAGE, Some("docs-build:2")),
        (ENV_DOCKER_USER, Some("docs")),
      ],
      || {
        let config = ExecutionConfig::from_env().unwrap();
        assert!(config.use_docker);
        assert_eq!(config.docker.binary, "/usr/local/bin/podman");
        assert_eq!(config.docker.image, "docs-build:2");
        assert_eq!(config.docker.user.as_deref(), Some("docs"));
      },
    );
  }

  #[test]
  #[serial]
  fn empty_values_are_ignored() {
    temp_env::with_vars([(ENV_DOCKER_IMAGE, Some("")), (ENV_DOCKER_USER, Some(""))], || {
      let config = ExecutionConfig::from_env().unwrap();
      assert_eq!(config.docker.image, "rtfd-build");
      assert_eq!(config.docker.user, None);
    });
  }

  #[test]
  #[serial]
  fn invalid_bool_is_rejected() {
    temp_env::with_var(ENV_USE_DOCKER, Some("sometimes"), || {
      let err = ExecutionConfig::from_env().unwrap_err();
      assert!(err.to_string().contains(ENV_USE_DOCKER));
    });
  }
}
