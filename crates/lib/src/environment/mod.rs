//! Build environments decide *how* a command runs: directly on the host or
//! wrapped in a container.

mod docker;
mod local;

pub use docker::DockerEnvironment;
pub use local::LocalEnvironment;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::command::{CommandError, CommandLine, CommandResult, Mount};
use crate::config::ExecutionConfig;
use crate::state::BuildState;

/// One command to execute, with everything it needs around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
  pub command: CommandLine,
  pub cwd: Option<PathBuf>,
  pub environment: BTreeMap<String, String>,
  pub input: Option<String>,
  /// Container name; ignored by the local environment.
  pub name: Option<String>,
  /// Extra bind mounts; ignored by the local environment.
  pub mounts: Vec<Mount>,
}

impl ExecRequest {
  pub fn new(command: impl Into<CommandLine>) -> Self {
    Self {
      command: command.into(),
      cwd: None,
      environment: BTreeMap::new(),
      input: None,
      name: None,
      mounts: Vec::new(),
    }
  }

  pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.environment.insert(key.into(), value.into());
    self
  }

  pub fn input(mut self, input: impl Into<String>) -> Self {
    self.input = Some(input.into());
    self
  }

  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn mount(mut self, mount: Mount) -> Self {
    self.mounts.push(mount);
    self
  }
}

/// Runs build commands somewhere.
///
/// `execute` takes `&mut self` so one environment never has two commands in
/// flight; callers wanting parallel builds use one environment per build.
pub trait BuildEnvironment {
  /// Short name for logs (`local`, `docker`).
  fn kind(&self) -> &'static str;

  /// Run `request` to completion. A non-zero exit is `Ok`.
  fn execute(&mut self, request: ExecRequest) -> Result<CommandResult, CommandError>;
}

impl<E: BuildEnvironment + ?Sized> BuildEnvironment for Box<E> {
  fn kind(&self) -> &'static str {
    (**self).kind()
  }

  fn execute(&mut self, request: ExecRequest) -> Result<CommandResult, CommandError> {
    (**self).execute(request)
  }
}

/// Pick the environment `config` asks for.
pub fn for_config(state: &BuildState, config: &ExecutionConfig) -> Box<dyn BuildEnvironment> {
  if config.use_docker {
    Box::new(DockerEnvironment::new(state, config.docker.clone()))
  } else {
    Box::new(LocalEnvironment::new())
  }
}
