//! docbuild-lib: documentation build pipeline
//!
//! This crate turns a versioned source checkout into rendered documentation:
//! - `BuildState`: typed configuration snapshot handed in by the caller
//! - `BuildCommand`/`BuildEnvironment`: run toolchain commands on the host or in a container
//! - `FilesystemProject`/`Version`: on-disk layout and config entry point lookup
//! - `Builder`: one output format's stages (setup, config, build, move, clean)
//! - `pipeline`: drives the stages and collects a `BuildResult`

pub mod builder;
pub mod command;
pub mod config;
pub mod consts;
pub mod environment;
pub mod filesystem;
pub mod pipeline;
pub mod state;
pub mod util;

pub use builder::{BuildError, BuildResult, Builder, BuilderState, OutputFormat, Stage};
pub use command::{BuildCommand, CommandError, CommandLine, CommandResult, DockerBuildCommand, Mount};
pub use config::{ConfigError, DockerConfig, ExecutionConfig};
pub use environment::{BuildEnvironment, DockerEnvironment, ExecRequest, LocalEnvironment};
pub use filesystem::{FilesystemError, FilesystemProject, Version};
pub use state::{BuildState, CoreState, OverrideError, SettingsState, StateError, VcsState};
