//! Commands wrapped in an ephemeral container.
//!
//! [`DockerBuildCommand::command_line`] renders the `docker run` line used in
//! logs and results. Rendering is deterministic so identical inputs always
//! produce the identical line. Execution spawns the same invocation as an
//! argument vector, so no host shell ever sees the wrapped command.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use super::{BuildCommand, CommandError, CommandLine, CommandResult, SHELL};
use crate::consts::DOCKER_IMAGE;

/// A host directory bind-mounted read/write into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
  pub host: PathBuf,
  pub container: PathBuf,
}

impl Mount {
  pub fn new(host: impl Into<PathBuf>, container: impl Into<PathBuf>) -> Self {
    Self {
      host: host.into(),
      container: container.into(),
    }
  }
}

impl fmt::Display for Mount {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.host.display(), self.container.display())
  }
}

/// Quote `arg` for a POSIX shell, leaving plain words untouched.
pub fn shell_quote(arg: &str) -> String {
  let plain = !arg.is_empty()
    && arg
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
  if plain {
    arg.to_string()
  } else {
    format!("'{}'", arg.replace('\'', r"'\''"))
  }
}

/// A command executed inside a fresh container.
#[derive(Debug)]
pub struct DockerBuildCommand {
  command: CommandLine,
  name: Option<String>,
  mounts: Vec<Mount>,
  user: Option<String>,
  image: String,
  remove: bool,
  binary: String,
  workdir: Option<String>,
  environment: BTreeMap<String, String>,
  inner: Option<BuildCommand>,
  live: bool,
}

impl DockerBuildCommand {
  pub fn new(command: impl Into<CommandLine>) -> Self {
    Self {
      command: command.into(),
      name: None,
      mounts: Vec::new(),
      user: None,
      image: DOCKER_IMAGE.to_string(),
      remove: true,
      binary: "docker".to_string(),
      workdir: None,
      environment: BTreeMap::new(),
      inner: None,
      live: false,
    }
  }

  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn mounts(mut self, mounts: impl IntoIterator<Item = Mount>) -> Self {
    self.mounts.extend(mounts);
    self
  }

  pub fn user(mut self, user: impl Into<String>) -> Self {
    self.user = Some(user.into());
    self
  }

  pub fn image(mut self, image: impl Into<String>) -> Self {
    self.image = image.into();
    self
  }

  /// Whether docker removes the container when it exits (`--rm=true`).
  pub fn remove(mut self, remove: bool) -> Self {
    self.remove = remove;
    self
  }

  /// Container runtime executable, `docker` unless overridden.
  pub fn binary(mut self, binary: impl Into<String>) -> Self {
    self.binary = binary.into();
    self
  }

  /// Working directory inside the container.
  pub fn workdir(mut self, dir: impl Into<String>) -> Self {
    self.workdir = Some(dir.into());
    self
  }

  pub fn environment(mut self, env: BTreeMap<String, String>) -> Self {
    self.environment.extend(env);
    self
  }

  /// `run` options up to and including the image, unquoted.
  fn run_options(&self) -> Vec<String> {
    let mut args = vec!["run".to_string(), "-i".to_string()];
    for mount in &self.mounts {
      args.push("-v".to_string());
      args.push(mount.to_string());
    }
    if let Some(name) = &self.name {
      args.push(format!("--name={}", name));
    }
    if let Some(user) = &self.user {
      args.push(format!("--user={}", user));
    }
    if let Some(dir) = &self.workdir {
      args.push("-w".to_string());
      args.push(dir.clone());
    }
    for (key, value) in &self.environment {
      args.push("-e".to_string());
      args.push(format!("{}={}", key, value));
    }
    if self.remove {
      args.push("--rm=true".to_string());
    }
    args.push(self.image.clone());
    args
  }

  /// Render the full `docker run` line.
  pub fn command_line(&self) -> String {
    let mut parts = vec![self.binary.clone()];
    parts.extend(self.run_options().iter().map(|arg| shell_quote(arg)));
    parts.push(self.command.to_line());
    parts.join(" ")
  }

  /// Argument vector that launches the container.
  ///
  /// A shell-form command is interpreted by the container's `/bin/sh`; nothing
  /// in it reaches a shell on the host.
  pub fn argv(&self) -> Vec<String> {
    let mut argv = vec![self.binary.clone()];
    argv.extend(self.run_options());
    match &self.command {
      CommandLine::Shell(line) => argv.extend([SHELL.to_string(), "-c".to_string(), line.clone()]),
      CommandLine::Argv(args) => argv.extend(args.iter().cloned()),
    }
    argv
  }

  /// Launch the container, wait for it, and tear it down.
  ///
  /// The container is removed after the command finishes whether or not it
  /// succeeded, including when launching fails part way.
  pub fn run(&mut self, input: Option<&str>) -> Result<&CommandResult, CommandError> {
    let argv = self.argv();

    self.live = true;
    let guard = ContainerGuard::new(&self.binary, self.name.as_deref());
    let outcome = self.inner.insert(BuildCommand::new(CommandLine::Argv(argv))).run(input);
    drop(guard);
    self.live = false;

    outcome
  }

  /// Run `body` as a scoped block around this command.
  ///
  /// The container is released when the block ends, and a failure of the
  /// block is appended to the captured error text.
  pub fn scoped<T, E: fmt::Display>(&mut self, body: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, CommandError> {
    let outcome = body(self);
    self.release();
    match outcome {
      Ok(value) => Ok(value),
      Err(err) => {
        let message = err.to_string();
        let line = self.command_line();
        self
          .inner
          .get_or_insert_with(|| BuildCommand::new(CommandLine::Shell(line.clone())))
          .record_error(&message);
        Err(CommandError::Aborted { cmd: line, message })
      }
    }
  }

  /// Whether a container started by this command may still exist.
  pub fn is_live(&self) -> bool {
    self.live
  }

  pub fn result(&self) -> Option<&CommandResult> {
    self.inner.as_ref().and_then(BuildCommand::result)
  }

  pub fn into_result(self) -> CommandResult {
    match self.inner {
      Some(inner) => inner.into_result(),
      None => CommandResult::new(-1, "", "container never started"),
    }
  }

  pub fn output(&self) -> &str {
    self.inner.as_ref().map(BuildCommand::output).unwrap_or("")
  }

  pub fn error(&self) -> &str {
    self.inner.as_ref().map(BuildCommand::error).unwrap_or("")
  }

  pub fn successful(&self) -> bool {
    self.inner.as_ref().is_some_and(BuildCommand::successful)
  }

  fn release(&mut self) {
    if self.live {
      drop(ContainerGuard::new(&self.binary, self.name.as_deref()));
      self.live = false;
    }
  }
}

/// Removes a named container when dropped.
///
/// Unnamed containers rely on `--rm=true`; named ones are force-removed so a
/// later command reusing the name never collides with a leftover.
struct ContainerGuard<'a> {
  binary: &'a str,
  name: Option<&'a str>,
}

impl<'a> ContainerGuard<'a> {
  fn new(binary: &'a str, name: Option<&'a str>) -> Self {
    Self { binary, name }
  }
}

impl Drop for ContainerGuard<'_> {
  fn drop(&mut self) {
    let Some(name) = self.name else {
      return;
    };
    let status = Command::new(self.binary)
      .args(["rm", "-f", name])
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .status();
    debug!(container = %name, status = ?status, "container released");
  }
}
