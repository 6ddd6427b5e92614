use tracing::debug;

use super::{BuildEnvironment, ExecRequest};
use crate::command::{BuildCommand, CommandError, CommandResult};

/// Runs commands directly on the build host.
#[derive(Debug, Default)]
pub struct LocalEnvironment;

impl LocalEnvironment {
  pub fn new() -> Self {
    Self
  }
}

impl BuildEnvironment for LocalEnvironment {
  fn kind(&self) -> &'static str {
    "local"
  }

  fn execute(&mut self, request: ExecRequest) -> Result<CommandResult, CommandError> {
    let mut cmd = BuildCommand::new(request.command).environment(request.environment);
    if let Some(cwd) = request.cwd {
      cmd = cmd.cwd(cwd);
    }
    if request.name.is_some() || !request.mounts.is_empty() {
      debug!("local environment ignores container name and mounts");
    }

    cmd.run(request.input.as_deref())?;
    Ok(cmd.into_result())
  }
}
