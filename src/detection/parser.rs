//! Version banner parsing with regex extraction.

use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

static SEMVER_TRIPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("Invalid regex pattern"));

/// Parse a semantic version from a version banner.
///
/// Extracts the first `major.minor.patch` triple from arbitrary text:
///
/// - `v20.11.0` -> 20.11.0
/// - `Python 3.12.1` -> 3.12.1
/// - `cargo 1.77.0 (3fe68eabf 2024-02-29)` -> 1.77.0
///
/// Returns `None` when no triple is present or it is not valid semver.
pub(crate) fn parse_version(output: &str) -> Option<Version> {
    let caps = SEMVER_TRIPLE.captures(output)?;
    Version::parse(caps.get(0)?.as_str()).ok()
}
