mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_batch, cmd_run, cmd_state};

/// docbuild - documentation build pipeline
///
/// Reads a JSON build state and prints JSON results; logs go to stderr.
#[derive(Parser)]
#[command(name = "docbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build documentation for one state document
  Run {
    /// Path to the build state JSON (`-` for stdin)
    #[arg(default_value = "-")]
    state: PathBuf,

    /// YAML overrides merged into the state before building
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Extra output format to build after the primary one (repeatable)
    #[arg(long = "format", value_name = "KEY")]
    formats: Vec<String>,

    #[command(flatten)]
    exec: ExecArgs,
  },

  /// Print the canonical form of a state document
  State {
    /// Path to the build state JSON (`-` for stdin)
    #[arg(default_value = "-")]
    state: PathBuf,

    /// YAML overrides merged into the state
    #[arg(long)]
    overrides: Option<PathBuf>,
  },

  /// Build several independent state documents concurrently
  Batch {
    /// Build state JSON files
    #[arg(required = true)]
    states: Vec<PathBuf>,

    #[command(flatten)]
    exec: ExecArgs,
  },
}

/// Where build commands run.
#[derive(Args, Debug, Clone, Default)]
pub struct ExecArgs {
  /// Run every command in a container
  #[arg(long)]
  docker: bool,

  /// Container image
  #[arg(long)]
  image: Option<String>,

  /// User to run as inside the container
  #[arg(long)]
  user: Option<String>,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Run {
      state,
      overrides,
      formats,
      exec,
    } => cmd_run(&state, overrides.as_deref(), &formats, &exec),
    Commands::State { state, overrides } => cmd_state(&state, overrides.as_deref()),
    Commands::Batch { states, exec } => cmd_batch(&states, &exec),
  }
}
