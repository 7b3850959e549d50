//! Temp-directory helpers for the string store's backing slab files.

use crate::error::DedupError;
use std::path::{Path, PathBuf};

/// Resolve the temp directory to use: `cli_value` if given, otherwise the package default
/// (`./.pw-dedup-temp`).
pub fn resolve_temp_dir(cli_value: Option<&Path>) -> PathBuf {
    match cli_value {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(crate::utils::config::PackagePaths::get().default_temp_dir_name()),
    }
}

/// Create `dir` (and any missing parents), failing with `DedupError::OpenFailed` on error.
pub fn ensure_dir(dir: &Path) -> Result<(), DedupError> {
    std::fs::create_dir_all(dir).map_err(|e| DedupError::OpenFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Best-effort recursive removal of `dir`. Logs a warning rather than failing the process;
/// by the time this runs the store's useful work is already done.
pub fn remove_dir_best_effort(dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(dir) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("failed to remove temp directory {}: {}", dir.display(), e);
        }
    }
}
