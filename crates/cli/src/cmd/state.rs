//! Implementation of the `docbuild state` command.

use std::path::Path;

use anyhow::Result;

use super::run::load_state;

/// Print the canonical JSON form of a state document, overrides applied.
pub fn cmd_state(state: &Path, overrides: Option<&Path>) -> Result<()> {
  let state = load_state(state, overrides)?;
  println!("{}", state.to_json()?);
  Ok(())
}
