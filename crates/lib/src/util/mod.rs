//! Shared utilities.
//!
//! Filesystem helpers used when relocating artifacts, plus test helpers.

pub mod fs;

#[cfg(test)]
pub mod testutil;
