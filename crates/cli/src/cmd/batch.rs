//! Implementation of the `docbuild batch` command.
//!
//! Each state document builds on its own blocking task. Builds share nothing,
//! so documents whose paths collide with an earlier document in the batch are
//! rejected instead of built.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use docbuild_lib::{BuildState, ExecutionConfig};

use super::run::{build_state, execution_config, load_state};
use crate::ExecArgs;
use crate::output::{error_document, error_document_for, results_document};

pub fn cmd_batch(states: &[PathBuf], exec: &ExecArgs) -> Result<()> {
  let config = match execution_config(exec) {
    Ok(config) => config,
    Err(err) => {
      for _ in states {
        println!("{}", error_document_for(&err));
      }
      return Ok(());
    }
  };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let docs = rt.block_on(run_all(states, config));
  for doc in docs {
    println!("{}", doc);
  }
  Ok(())
}

enum Job {
  Ready(BuildState),
  Done(Value),
}

async fn run_all(paths: &[PathBuf], config: ExecutionConfig) -> Vec<Value> {
  let mut claimed: Vec<(usize, Vec<PathBuf>)> = Vec::new();
  let mut jobs = Vec::with_capacity(paths.len());

  for (index, path) in paths.iter().enumerate() {
    let job = match load_state(path, None) {
      Err(err) => Job::Done(error_document_for(&err)),
      Ok(state) => {
        let owned = owned_paths(&state);
        match claimed.iter().find(|(_, other)| overlaps(&owned, other)) {
          Some((first, _)) => {
            warn!(input = %path.display(), conflicts_with = first, "paths collide with an earlier build");
            Job::Done(error_document(
              "ConflictError",
              &format!("build paths collide with input #{}", first + 1),
            ))
          }
          None => {
            claimed.push((index, owned));
            Job::Ready(state)
          }
        }
      }
    };
    jobs.push(job);
  }

  let mut handles = Vec::with_capacity(jobs.len());
  for job in jobs {
    let config = config.clone();
    handles.push(match job {
      Job::Done(doc) => Err(doc),
      Job::Ready(state) => Ok(tokio::task::spawn_blocking(move || {
        match build_state(&state, &[], &config) {
          Ok(results) => results_document(&results),
          Err(err) => error_document_for(&err),
        }
      })),
    });
  }

  let mut docs = Vec::with_capacity(handles.len());
  for handle in handles {
    let doc = match handle {
      Err(doc) => doc,
      Ok(task) => task_document(task.await),
    };
    docs.push(doc);
  }
  info!(count = docs.len(), "batch finished");
  docs
}

/// A build task that died still yields a document for its slot.
fn task_document(joined: Result<Value, JoinError>) -> Value {
  joined.unwrap_or_else(|err| {
    error!(error = %err, "build task panicked");
    error_document("ExecutionError", &format!("build task panicked: {}", err))
  })
}

/// Directories a build writes to.
fn owned_paths(state: &BuildState) -> Vec<PathBuf> {
  let version = state.version();
  vec![
    version.checkout_path().to_path_buf(),
    version.env_path(),
    state.fs.artifact_path.join(&state.core.version),
  ]
}

fn overlaps(a: &[PathBuf], b: &[PathBuf]) -> bool {
  a.iter().any(|x| b.iter().any(|y| nested(x, y) || nested(y, x)))
}

fn nested(inner: &Path, outer: &Path) -> bool {
  inner.starts_with(outer)
}
