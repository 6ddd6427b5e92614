use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of one external command.
///
/// Serialized as the `[exit_code, output, error]` triple expected by callers
/// of the build CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i32, String, String)", into = "(i32, String, String)")]
pub struct CommandResult {
  pub exit_code: i32,
  pub output: String,
  pub error: String,
}

impl CommandResult {
  pub fn new(exit_code: i32, output: impl Into<String>, error: impl Into<String>) -> Self {
    Self {
      exit_code,
      output: output.into(),
      error: error.into(),
    }
  }

  /// A successful result carrying only an informational message.
  pub fn message(output: impl Into<String>) -> Self {
    Self::new(0, output, "")
  }

  /// A failed result for an operation that never produced an exit status.
  pub fn from_error(err: &impl fmt::Display) -> Self {
    Self::new(-1, "", err.to_string())
  }

  pub fn successful(&self) -> bool {
    self.exit_code == 0
  }

  pub fn failed(&self) -> bool {
    !self.successful()
  }

  /// Fold another result into this one: exit codes add up, text is concatenated.
  pub fn merge(&mut self, other: &CommandResult) {
    self.exit_code += other.exit_code;
    self.output.push_str(&other.output);
    self.error.push_str(&other.error);
  }
}

impl From<(i32, String, String)> for CommandResult {
  fn from((exit_code, output, error): (i32, String, String)) -> Self {
    Self {
      exit_code,
      output,
      error,
    }
  }
}

impl From<CommandResult> for (i32, String, String) {
  fn from(result: CommandResult) -> Self {
    (result.exit_code, result.output, result.error)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn success_follows_exit_code() {
    assert!(CommandResult::new(0, "", "").successful());
    assert!(CommandResult::new(1, "", "").failed());
    assert!(CommandResult::new(-1, "", "").failed());
  }

  #[test]
  fn merge_sums_codes_and_concatenates_text() {
    let mut result = CommandResult::new(0, "latex ", "");
    result.merge(&CommandResult::new(1, "pass1 ", "warn "));
    result.merge(&CommandResult::new(2, "pass2", "err"));

    assert_eq!(result, CommandResult::new(3, "latex pass1 pass2", "warn err"));
  }

  #[test]
  fn serializes_as_triple() {
    let result = CommandResult::new(-1, "", "ConfigMissingError: boom");
    let json = serde_json::to_string(&result).unwrap();
    assert_eq!(json, r#"[-1,"","ConfigMissingError: boom"]"#);

    let back: CommandResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
  }
}
