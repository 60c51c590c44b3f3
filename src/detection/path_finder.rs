//! PATH-based executable lookup with fallback locations.

use std::path::{Path, PathBuf};

/// System fallback paths to check if executable not found in PATH.
const FALLBACK_PATHS: &[&str] = &["/usr/local/bin", "/usr/bin"];

/// Find an executable by name.
///
/// Tries the system PATH via the `which` crate first (this also resolves
/// `npm.cmd`-style shims on Windows), then a few common locations that
/// daemons launched outside a login shell tend to miss.
///
/// Absolute or relative paths are checked as-is by `which`.
pub(crate) fn find_executable(name: &str) -> Option<PathBuf> {
    if let Ok(path) = which::which(name) {
        return Some(path);
    }

    // explicit paths are never retried elsewhere
    if Path::new(name).components().count() > 1 {
        return None;
    }

    for dir in FALLBACK_PATHS {
        let path = PathBuf::from(dir).join(name);
        if path.is_file() {
            return Some(path);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let home_paths = [
            format!("{}/.local/bin/{}", home, name),
            format!("{}/bin/{}", home, name),
        ];
        for p in home_paths {
            let path = PathBuf::from(&p);
            if path.is_file() {
                return Some(path);
            }
        }
    }

    None
}
