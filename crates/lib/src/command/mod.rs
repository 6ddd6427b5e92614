//! External command execution.
//!
//! A [`BuildCommand`] runs one process to completion and captures its exit
//! code, stdout and stderr into a [`CommandResult`]. A non-zero exit is a
//! normal result; only a process that cannot be started at all is an error.
//!
//! Commands come in two shapes:
//! - [`CommandLine::Shell`]: a command string handed to `/bin/sh -c`
//! - [`CommandLine::Argv`]: an argument vector spawned directly

mod docker;
mod result;

pub use docker::{DockerBuildCommand, Mount, shell_quote};
pub use result::CommandResult;

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;

use thiserror::Error;
use tracing::{debug, info};

/// Interpreter for [`CommandLine::Shell`] commands, inside or outside a container.
pub(crate) const SHELL: &str = "/bin/sh";

/// Errors raised while running a command.
///
/// A command that runs and exits non-zero is *not* an error; see
/// [`CommandResult::failed`].
#[derive(Debug, Error)]
pub enum CommandError {
  /// The process could not be started (missing binary, permission denied).
  #[error("failed to start `{cmd}`: {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: io::Error,
  },

  /// Talking to a running process failed.
  #[error("io error while running `{cmd}`: {source}")]
  Io {
    cmd: String,
    #[source]
    source: io::Error,
  },

  /// The scoped block wrapped around the command failed.
  #[error("`{cmd}` aborted: {message}")]
  Aborted { cmd: String, message: String },
}

/// What to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
  /// Interpreted by `/bin/sh -c`.
  Shell(String),
  /// Spawned directly, first element is the program.
  Argv(Vec<String>),
}

impl CommandLine {
  pub fn argv<I, S>(args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    CommandLine::Argv(args.into_iter().map(Into::into).collect())
  }

  /// Render the command as a single shell line.
  ///
  /// Argv elements are quoted only when they would not survive the shell
  /// unchanged, so simple commands render exactly as typed.
  pub fn to_line(&self) -> String {
    match self {
      CommandLine::Shell(line) => line.clone(),
      CommandLine::Argv(args) => args.iter().map(|a| shell_quote(a)).collect::<Vec<_>>().join(" "),
    }
  }

  /// Apply `f` to the shell string or to every argv element.
  pub fn map_text(&self, f: impl Fn(&str) -> String) -> Self {
    match self {
      CommandLine::Shell(line) => CommandLine::Shell(f(line)),
      CommandLine::Argv(args) => CommandLine::Argv(args.iter().map(|a| f(a.as_str())).collect()),
    }
  }
}

impl fmt::Display for CommandLine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_line())
  }
}

impl From<&str> for CommandLine {
  fn from(line: &str) -> Self {
    CommandLine::Shell(line.to_string())
  }
}

impl From<String> for CommandLine {
  fn from(line: String) -> Self {
    CommandLine::Shell(line)
  }
}

impl From<Vec<String>> for CommandLine {
  fn from(args: Vec<String>) -> Self {
    CommandLine::Argv(args)
  }
}

impl From<Vec<&str>> for CommandLine {
  fn from(args: Vec<&str>) -> Self {
    CommandLine::argv(args)
  }
}

impl From<&[&str]> for CommandLine {
  fn from(args: &[&str]) -> Self {
    CommandLine::argv(args.iter().copied())
  }
}

/// A single external command and, once run, its captured result.
#[derive(Debug)]
pub struct BuildCommand {
  command: CommandLine,
  cwd: Option<PathBuf>,
  environment: BTreeMap<String, String>,
  result: Option<CommandResult>,
}

impl BuildCommand {
  pub fn new(command: impl Into<CommandLine>) -> Self {
    Self {
      command: command.into(),
      cwd: None,
      environment: BTreeMap::new(),
      result: None,
    }
  }

  /// Working directory for the child process only.
  pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// Variables layered on top of the inherited environment.
  pub fn environment(mut self, env: BTreeMap<String, String>) -> Self {
    self.environment.extend(env);
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.environment.insert(key.into(), value.into());
    self
  }

  pub fn command(&self) -> &CommandLine {
    &self.command
  }

  pub fn environment_vars(&self) -> &BTreeMap<String, String> {
    &self.environment
  }

  pub fn working_dir(&self) -> Option<&Path> {
    self.cwd.as_deref()
  }

  /// Run the command to completion, feeding `input` to its stdin.
  ///
  /// A failure to start the process is returned as [`CommandError::Spawn`];
  /// the stored result then carries exit code `-1` and the OS error text so
  /// callers can still inspect [`BuildCommand::error`].
  pub fn run(&mut self, input: Option<&str>) -> Result<&CommandResult, CommandError> {
    let line = self.command.to_line();
    info!(cmd = %line, cwd = ?self.cwd, "running command");

    let mut process = match self.process() {
      Ok(process) => process,
      Err(source) => return Err(self.spawn_failed(line, source)),
    };
    process
      .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
      .stdout(Stdio::piped())
      .stderr(Stdio::piped());

    let mut child = match process.spawn() {
      Ok(child) => child,
      Err(source) => return Err(self.spawn_failed(line, source)),
    };

    let output = match collect(&mut child, input) {
      Ok(output) => output,
      Err(source) => {
        // Never leave a child behind on an error path.
        let _ = child.kill();
        let _ = child.wait();
        self.result = Some(CommandResult::from_error(&source));
        return Err(CommandError::Io { cmd: line, source });
      }
    };

    let result = CommandResult::new(
      exit_code(output.status),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr),
    );

    if result.failed() {
      debug!(cmd = %line, code = result.exit_code, stderr = %result.error, "command failed");
    } else {
      debug!(cmd = %line, "command succeeded");
    }

    Ok(&*self.result.insert(result))
  }

  /// Run `body` against this command as a scoped block.
  ///
  /// If `body` fails, its error text is appended to the captured error
  /// output and [`CommandError::Aborted`] is returned.
  pub fn scoped<T, E: fmt::Display>(&mut self, body: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, CommandError> {
    match body(self) {
      Ok(value) => Ok(value),
      Err(err) => {
        let message = err.to_string();
        self.record_error(&message);
        Err(CommandError::Aborted {
          cmd: self.command.to_line(),
          message,
        })
      }
    }
  }

  pub fn result(&self) -> Option<&CommandResult> {
    self.result.as_ref()
  }

  /// Consume the command, returning its result or a failure if it never ran.
  pub fn into_result(self) -> CommandResult {
    self
      .result
      .unwrap_or_else(|| CommandResult::new(-1, "", format!("command never ran: {}", self.command)))
  }

  pub fn exit_code(&self) -> Option<i32> {
    self.result.as_ref().map(|r| r.exit_code)
  }

  pub fn output(&self) -> &str {
    self.result.as_ref().map(|r| r.output.as_str()).unwrap_or("")
  }

  pub fn error(&self) -> &str {
    self.result.as_ref().map(|r| r.error.as_str()).unwrap_or("")
  }

  pub fn successful(&self) -> bool {
    self.result.as_ref().is_some_and(CommandResult::successful)
  }

  pub fn failed(&self) -> bool {
    !self.successful()
  }

  pub(crate) fn record_error(&mut self, message: &str) {
    let result = self.result.get_or_insert_with(|| CommandResult::new(-1, "", ""));
    if !result.error.is_empty() && !result.error.ends_with('\n') {
      result.error.push('\n');
    }
    result.error.push_str(message);
  }

  fn spawn_failed(&mut self, cmd: String, source: io::Error) -> CommandError {
    debug!(cmd = %cmd, error = %source, "command could not be started");
    self.result = Some(CommandResult::from_error(&source));
    CommandError::Spawn { cmd, source }
  }

  fn process(&self) -> io::Result<Command> {
    let mut process = match &self.command {
      CommandLine::Shell(line) => {
        let mut process = Command::new(SHELL);
        process.arg("-c").arg(line);
        process
      }
      CommandLine::Argv(args) => {
        let (program, rest) = args
          .split_first()
          .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;
        let mut process = Command::new(program);
        process.args(rest);
        process
      }
    };

    if let Some(cwd) = &self.cwd {
      process.current_dir(cwd);
    }
    process.envs(&self.environment);
    Ok(process)
  }
}

/// Feed stdin from a separate thread so a chatty child cannot deadlock on a full pipe.
fn collect(child: &mut Child, input: Option<&str>) -> io::Result<std::process::Output> {
  let writer = match (child.stdin.take(), input) {
    (Some(mut stdin), Some(data)) => {
      let data = data.to_owned();
      Some(thread::spawn(move || match stdin.write_all(data.as_bytes()) {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
        _ => Ok(()),
      }))
    }
    _ => None,
  };

  let mut stdout = Vec::new();
  let mut stderr = Vec::new();
  let out_pipe = child.stdout.take();
  let err_pipe = child.stderr.take();
  let err_reader = err_pipe.map(|mut pipe| {
    thread::spawn(move || {
      let mut buf = Vec::new();
      io::Read::read_to_end(&mut pipe, &mut buf).map(|_| buf)
    })
  });
  if let Some(mut pipe) = out_pipe {
    io::Read::read_to_end(&mut pipe, &mut stdout)?;
  }
  if let Some(handle) = err_reader {
    stderr = handle.join().map_err(|_| io::Error::other("stderr reader panicked"))??;
  }

  let status = child.wait()?;

  if let Some(handle) = writer {
    handle.join().map_err(|_| io::Error::other("stdin writer panicked"))??;
  }

  Ok(std::process::Output { status, stdout, stderr })
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
  use std::os::unix::process::ExitStatusExt;
  status.code().or_else(|| status.signal().map(|sig| -sig)).unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
  status.code().unwrap_or(-1)
}
