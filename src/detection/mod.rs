//! Detection implementation submodule.
//!
//! This module contains the process-level pieces the detectors are built on:
//!
//! - `ProcessRunner`: injectable capability for running an external command
//! - `SystemRunner`: the real runner (PATH lookup, spawn, timeout)
//! - `probe`: total function turning one invocation into an optional banner
//! - `parse_version`: regex-based semver extraction from a banner

mod parser;
mod path_finder;
mod probe;
mod runner;

pub(crate) use parser::parse_version;
pub(crate) use probe::{first_line, probe};
#[cfg(test)]
pub(crate) use probe::fake;
pub use runner::{ProcessOutput, ProcessRunner, SystemRunner};
