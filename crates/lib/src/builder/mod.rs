//! Builders: one output format's trip from checkout to artifact.
//!
//! A [`Builder`] walks a fixed set of stages for a single [`OutputFormat`]:
//!
//! 1. `setup_environment`: isolated interpreter plus toolchain and project deps
//! 2. `append_build_config`: append generated settings to the project's `conf.py`
//! 3. `build`: run the generator (and LaTeX for PDF)
//! 4. `move_artifacts`: relocate output into the artifact layout
//! 5. `clean`: drop the generator's output directory
//!
//! Each stage is independently callable; [`crate::pipeline`] strings them
//! together and decides when to stop.

mod artifacts;
mod build;
pub mod conf;
mod format;

pub use format::OutputFormat;

use std::collections::BTreeMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::command::{CommandError, CommandLine, CommandResult};
use crate::consts::{SETUP_FILE, TOOLCHAIN_PACKAGES, VIRTUALENV_BIN};
use crate::environment::{BuildEnvironment, ExecRequest};
use crate::filesystem::{FilesystemError, Version};
use crate::state::BuildState;
use crate::util;

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Filesystem(#[from] FilesystemError),

  #[error(transparent)]
  Command(#[from] CommandError),

  #[error("unknown output format: {0}")]
  UnknownFormat(String),

  #[error("environment setup failed in: {}", stages.iter().map(Stage::as_str).collect::<Vec<_>>().join(", "))]
  EnvironmentSetup { stages: Vec<Stage> },

  #[error("not moving docs: build output {} does not exist", path.display())]
  ArtifactRelocation { path: PathBuf },

  #[error("io error at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write archive {}: {source}", path.display())]
  Archive {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },

  #[error("failed to render build config: {0}")]
  Render(#[source] serde_json::Error),
}

impl BuildError {
  /// Category name reported to callers.
  pub fn kind(&self) -> &'static str {
    match self {
      BuildError::Filesystem(e) if e.is_config_missing() => "ConfigMissingError",
      BuildError::Filesystem(_) => "FilesystemError",
      BuildError::Command(_) => "ExecutionError",
      BuildError::UnknownFormat(_) => "UnknownFormatError",
      BuildError::EnvironmentSetup { .. } => "EnvironmentSetupError",
      BuildError::ArtifactRelocation { .. } => "ArtifactRelocationError",
      BuildError::Io { .. } => "IoError",
      BuildError::Archive { .. } => "ArchiveError",
      BuildError::Render(_) => "RenderError",
    }
  }

  /// Whether the whole build must stop rather than record a failed stage.
  pub fn is_fatal(&self) -> bool {
    matches!(self, BuildError::Filesystem(e) if e.is_config_missing())
  }

  fn io(path: &Path) -> impl FnOnce(io::Error) -> BuildError + '_ {
    move |source| BuildError::Io {
      path: path.to_path_buf(),
      source,
    }
  }
}

/// Named pipeline steps, ordered as they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
  Env,
  DependencyInstall,
  Requirements,
  ProjectInstall,
  Build,
  Move,
}

impl Stage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::Env => "env",
      Stage::DependencyInstall => "dependency-install",
      Stage::Requirements => "requirements",
      Stage::ProjectInstall => "project-install",
      Stage::Build => "build",
      Stage::Move => "move",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Per-stage results of a build. A missing stage did not apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildResult(BTreeMap<Stage, CommandResult>);

impl BuildResult {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, stage: Stage, result: CommandResult) {
    self.0.insert(stage, result);
  }

  pub fn get(&self, stage: Stage) -> Option<&CommandResult> {
    self.0.get(&stage)
  }

  pub fn extend(&mut self, other: BuildResult) {
    self.0.extend(other.0);
  }

  pub fn iter(&self) -> impl Iterator<Item = (Stage, &CommandResult)> {
    self.0.iter().map(|(stage, result)| (*stage, result))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// True when every recorded stage succeeded.
  pub fn is_success(&self) -> bool {
    self.0.values().all(CommandResult::successful)
  }

  pub fn failed_stages(&self) -> Vec<Stage> {
    self.iter().filter(|(_, r)| r.failed()).map(|(s, _)| s).collect()
  }
}

/// Where a builder is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
  Created,
  EnvironmentReady,
  ConfigAppended,
  Built,
  Moved,
  Cleaned,
  Failed,
}

/// Drives one output format for one build state.
///
/// Builders hold no state between builds; make a new one per invocation.
pub struct Builder<'a> {
  state: &'a BuildState,
  format: OutputFormat,
  env: &'a mut dyn BuildEnvironment,
  status: BuilderState,
}

impl<'a> Builder<'a> {
  pub fn new(state: &'a BuildState, format: OutputFormat, env: &'a mut dyn BuildEnvironment) -> Self {
    Self {
      state,
      format,
      env,
      status: BuilderState::Created,
    }
  }

  /// Builder for a registry key such as `sphinx_pdf`.
  pub fn for_key(state: &'a BuildState, key: &str, env: &'a mut dyn BuildEnvironment) -> Result<Self, BuildError> {
    Ok(Self::new(state, OutputFormat::from_key(key)?, env))
  }

  pub fn format(&self) -> OutputFormat {
    self.format
  }

  pub fn status(&self) -> BuilderState {
    self.status
  }

  pub fn version(&self) -> Version<'a> {
    self.state.version()
  }

  /// Artifact directory for this format and version.
  pub fn target(&self) -> PathBuf {
    self.version().artifact_path(self.format.key())
  }

  /// Directory the generator writes to.
  pub fn output_path(&self) -> Result<PathBuf, BuildError> {
    Ok(self.version().conf_dir()?.join(self.format.output_dir()))
  }

  /// Create the isolated environment and install toolchain and project.
  ///
  /// Sub-steps do not short-circuit: every applicable step runs and the
  /// results say which failed.
  pub fn setup_environment(&mut self) -> Result<BuildResult, BuildError> {
    let mut results = BuildResult::new();
    let state = self.state;
    let core = &state.core;
    if !core.virtualenv {
      self.status = BuilderState::EnvironmentReady;
      return Ok(results);
    }

    let version = self.version();
    let env_path = version.env_path();
    let checkout = version.checkout_path();

    let stale = env_path.join("build");
    if stale.exists() {
      info!(path = %stale.display(), "removing existing build dir");
      util::fs::remove_tree(&stale).map_err(BuildError::io(&stale))?;
    }

    let site_packages = if core.system_packages {
      "--system-site-packages"
    } else {
      "--no-site-packages"
    };
    let venv = CommandLine::argv([
      VIRTUALENV_BIN.to_string(),
      "-p".to_string(),
      core.interpreter.clone(),
      site_packages.to_string(),
      path_arg(&env_path),
    ]);
    results.insert(Stage::Env, self.execute(ExecRequest::new(venv)));

    let pip = path_arg(&version.env_bin("pip"));
    let mut install = vec![pip.clone(), "install".to_string(), "-U".to_string()];
    if core.system_packages {
      install.push("-I".to_string());
    }
    install.extend(TOOLCHAIN_PACKAGES.iter().map(|p| p.to_string()));
    results.insert(
      Stage::DependencyInstall,
      self.execute(ExecRequest::new(CommandLine::Argv(install))),
    );

    if let Some(requirements) = core.requirements_file() {
      let result = match version.checkout_file(Path::new(requirements)) {
        Ok(_) => {
          let cmd = CommandLine::argv([pip.as_str(), "install", "--exists-action=w", "-r", requirements]);
          self.execute(ExecRequest::new(cmd).cwd(checkout))
        }
        Err(err) => {
          warn!(error = %err, "refusing requirements file");
          CommandResult::from_error(&err)
        }
      };
      results.insert(Stage::Requirements, result);
    }

    if checkout.join(SETUP_FILE).is_file() {
      let python = path_arg(&version.env_bin("python"));
      let cmd = CommandLine::argv([python.as_str(), SETUP_FILE, "install", "--force"]);
      results.insert(Stage::ProjectInstall, self.execute(ExecRequest::new(cmd).cwd(checkout)));
    }

    let failed = results.failed_stages();
    if failed.is_empty() {
      self.status = BuilderState::EnvironmentReady;
    } else {
      let error = BuildError::EnvironmentSetup { stages: failed };
      warn!(error = %error, "environment setup incomplete");
      self.status = BuilderState::Failed;
    }
    Ok(results)
  }

  /// Append the generated configuration to the project's `conf.py`.
  ///
  /// Existing content is kept byte for byte; the fragment follows a newline.
  pub fn append_build_config(&mut self) -> Result<(), BuildError> {
    let outcome = self.try_append_build_config();
    self.status = match outcome {
      Ok(()) => BuilderState::ConfigAppended,
      Err(_) => BuilderState::Failed,
    };
    outcome
  }

  fn try_append_build_config(&self) -> Result<(), BuildError> {
    let conf = self.version().conf_file()?;
    let fragment = conf::render(self.state).map_err(BuildError::Render)?;

    let mut file = OpenOptions::new()
      .append(true)
      .open(&conf)
      .map_err(BuildError::io(&conf))?;
    file.write_all(b"\n").map_err(BuildError::io(&conf))?;
    file.write_all(fragment.as_bytes()).map_err(BuildError::io(&conf))?;

    info!(conf = %conf.display(), "appended build config");
    Ok(())
  }

  /// Run the generator for this format.
  pub fn build(&mut self) -> Result<CommandResult, BuildError> {
    let outcome = match self.format {
      OutputFormat::Pdf => self.build_pdf(),
      _ => self.build_html(),
    };
    self.status = match &outcome {
      Ok(result) if result.successful() => BuilderState::Built,
      _ => BuilderState::Failed,
    };
    outcome
  }

  /// Relocate the generator's output into the artifact layout.
  pub fn move_artifacts(&mut self) -> Result<CommandResult, BuildError> {
    let outcome = self.relocate();
    self.status = match &outcome {
      Ok(_) => BuilderState::Moved,
      Err(_) => BuilderState::Failed,
    };
    outcome
  }

  /// Remove the generator's output directory, if any.
  pub fn clean(&mut self) -> Result<(), BuildError> {
    let output = self.output_path()?;
    if output.exists() {
      util::fs::remove_tree(&output).map_err(BuildError::io(&output))?;
      info!(path = %output.display(), "removed build output");
    }
    self.status = BuilderState::Cleaned;
    Ok(())
  }

  /// Run one command; a command that cannot start becomes a failed result.
  fn execute(&mut self, request: ExecRequest) -> CommandResult {
    match self.env.execute(request) {
      Ok(result) => result,
      Err(err) => {
        warn!(error = %err, env = self.env.kind(), "command could not run");
        CommandResult::from_error(&err)
      }
    }
  }

  /// The generator binary: inside the isolated environment when one is used.
  fn sphinx_build(&self) -> String {
    if self.state.core.virtualenv {
      path_arg(&self.version().env_bin("sphinx-build"))
    } else {
      "sphinx-build".to_string()
    }
  }

  fn language_flag(&self) -> String {
    format!("language={}", self.state.core.language)
  }
}

fn path_arg(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}
