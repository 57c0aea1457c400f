//! File system helpers

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{Result, TlsError};

/// Check that a path exists and is a regular file
pub fn check_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(TlsError::read(format!("file not found: {}", path.display())));
    }

    if !path.is_file() {
        return Err(TlsError::read(format!("path is not a file: {}", path.display())));
    }

    Ok(())
}

/// Read a whole file, mapping failures to `CertificateRead`
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    check_file_exists(path)?;

    fs::read(path).map_err(|e| TlsError::read(format!("cannot read {}: {}", path.display(), e)))
}

/// Resolve `path` against an optional base directory
///
/// Absolute paths are returned unchanged.
pub fn resolve_path(base: Option<&Path>, path: &Path) -> PathBuf {
    match base {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}
