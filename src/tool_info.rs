//! Scan result types: per-tool results and the aggregate report.

use crate::detection::parse_version;
use crate::ToolKind;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Outcome of a single tool detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// A candidate command produced a version banner.
    Found,
    /// No candidate produced any output.
    Missing,
    /// Reserved for a future version-constraint policy. Never produced.
    WrongVersion,
}

/// One detector's result.
///
/// Exactly one `ToolInfo` is produced per registered [`ToolKind`], whether
/// or not the tool was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Stable display name, e.g. `"Node.js"`.
    pub name: String,

    /// First line of the version banner, trimmed. `None` when missing.
    pub version_found: Option<String>,

    /// Detection outcome.
    pub status: ToolStatus,

    /// Reserved; always `None` until a version-constraint policy exists.
    pub version_required: Option<String>,
}

impl ToolInfo {
    /// A result for a tool whose probe produced `version`.
    pub fn found(kind: ToolKind, version: impl Into<String>) -> Self {
        Self {
            name: kind.display_name().to_string(),
            version_found: Some(version.into()),
            status: ToolStatus::Found,
            version_required: None,
        }
    }

    /// A result for a tool none of whose candidates responded.
    pub fn missing(kind: ToolKind) -> Self {
        Self {
            name: kind.display_name().to_string(),
            version_found: None,
            status: ToolStatus::Missing,
            version_required: None,
        }
    }

    /// Semantic version embedded in the raw banner, if any.
    ///
    /// Banners come in many shapes (`v20.11.0`, `git version 2.43.0`,
    /// `go version go1.22.1 linux/amd64`); the first `major.minor.patch`
    /// triple is extracted. Two-component versions yield `None`.
    ///
    /// ```rust
    /// use envscan_daemon::{ToolInfo, ToolKind};
    ///
    /// let info = ToolInfo::found(ToolKind::Git, "git version 2.43.0");
    /// assert_eq!(info.parsed_version().unwrap().to_string(), "2.43.0");
    /// assert!(ToolInfo::missing(ToolKind::Git).parsed_version().is_none());
    /// ```
    pub fn parsed_version(&self) -> Option<Version> {
        self.version_found.as_deref().and_then(parse_version)
    }

    /// Whether the tool was found.
    pub fn is_found(&self) -> bool {
        self.status == ToolStatus::Found
    }
}

/// Local Git identity. Each field is `None` when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitConfig {
    /// `git config user.name`
    pub name: Option<String>,
    /// `git config user.email`
    pub email: Option<String>,
}

/// Aggregate result of one environment scan.
///
/// `tools` always holds exactly [`ToolKind::COUNT`] entries in registration
/// order. `scanned_at` is serialized as float seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Per-tool results in registration order.
    pub tools: Vec<ToolInfo>,

    /// Local Git identity.
    pub git_config: GitConfig,

    /// Wall-clock time at which all results were joined.
    #[serde(with = "unix_seconds")]
    pub scanned_at: SystemTime,
}

impl ScanReport {
    /// Number of tools found.
    pub fn found_count(&self) -> usize {
        self.tools.iter().filter(|t| t.is_found()).count()
    }
}

mod unix_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        serializer.serialize_f64(secs)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SystemTime, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        let offset = Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)?;
        Ok(UNIX_EPOCH + offset)
    }
}
