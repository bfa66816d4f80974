//! Atomic file writes used by the Spec Store (C1, spec.md §4.1).
//!
//! Writes go to a sibling temp file, are `fsync`'d, then renamed over the
//! target; a write is never partially visible. Cross-filesystem renames
//! (EXDEV) fall back to copy→fsync→replace.

use crate::error::{SddError, SddResult};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Outcome of an atomic write, surfaced so callers can log/warn on the
/// uncommon paths without treating them as failures.
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    pub used_cross_filesystem_fallback: bool,
    pub warnings: Vec<String>,
}

/// Atomically write `content` to `path` using temp-file + fsync + rename.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> SddResult<AtomicWriteResult> {
    let mut result = AtomicWriteResult::default();
    let normalized = normalize_line_endings(content);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SddError::IoError {
            path: Some(parent.as_std_path().to_path_buf()),
            source,
        })?;
    }

    let temp_dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let mut temp_file = NamedTempFile::new_in(temp_dir).map_err(|source| SddError::IoError {
        path: Some(temp_dir.as_std_path().to_path_buf()),
        source,
    })?;

    temp_file
        .write_all(normalized.as_bytes())
        .map_err(|source| SddError::IoError {
            path: Some(path.as_std_path().to_path_buf()),
            source,
        })?;
    temp_file.as_file().sync_all().map_err(|source| SddError::IoError {
        path: Some(path.as_std_path().to_path_buf()),
        source,
    })?;

    let temp_path = temp_file.path().to_path_buf();
    match temp_file.persist(path.as_std_path()) {
        Ok(_) => {}
        Err(persist_err) if is_cross_filesystem_error(&persist_err.error) => {
            result.used_cross_filesystem_fallback = true;
            result
                .warnings
                .push("used cross-filesystem fallback (copy→fsync→replace)".to_string());
            cross_filesystem_copy(&temp_path, path)?;
        }
        Err(persist_err) => {
            return Err(SddError::IoError {
                path: Some(path.as_std_path().to_path_buf()),
                source: persist_err.error,
            });
        }
    }

    Ok(result)
}

/// Atomically move a whole file between directories, falling back to a
/// copy+fsync+remove when `from` and `to` are on different filesystems
/// (spec.md §4.1 `move`: "must not be interrupted mid-operation").
pub fn move_file_atomic(from: &Utf8Path, to: &Utf8Path) -> SddResult<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|source| SddError::IoError {
            path: Some(parent.as_std_path().to_path_buf()),
            source,
        })?;
    }
    match fs::rename(from.as_std_path(), to.as_std_path()) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_filesystem_error(&e) => {
            let content = fs::read(from.as_std_path()).map_err(|source| SddError::IoError {
                path: Some(from.as_std_path().to_path_buf()),
                source,
            })?;
            let text = String::from_utf8_lossy(&content).into_owned();
            write_file_atomic(to, &text)?;
            fs::remove_file(from.as_std_path()).map_err(|source| SddError::IoError {
                path: Some(from.as_std_path().to_path_buf()),
                source,
            })?;
            Ok(())
        }
        Err(source) => Err(SddError::IoError {
            path: Some(from.as_std_path().to_path_buf()),
            source,
        }),
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(unix)]
fn is_cross_filesystem_error(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(18) // EXDEV
}

#[cfg(windows)]
fn is_cross_filesystem_error(_err: &std::io::Error) -> bool {
    false
}

fn cross_filesystem_copy(temp_path: &Path, target: &Utf8Path) -> SddResult<()> {
    let content = fs::read(temp_path).map_err(|source| SddError::IoError {
        path: Some(temp_path.to_path_buf()),
        source,
    })?;
    let target_dir = target.parent().unwrap_or_else(|| Utf8Path::new("."));
    let mut target_temp = NamedTempFile::new_in(target_dir).map_err(|source| SddError::IoError {
        path: Some(target_dir.as_std_path().to_path_buf()),
        source,
    })?;
    target_temp.write_all(&content).map_err(|source| SddError::IoError {
        path: Some(target.as_std_path().to_path_buf()),
        source,
    })?;
    target_temp.as_file().sync_all().map_err(|source| SddError::IoError {
        path: Some(target.as_std_path().to_path_buf()),
        source,
    })?;
    target_temp
        .persist(target.as_std_path())
        .map_err(|e| SddError::IoError {
            path: Some(target.as_std_path().to_path_buf()),
            source: e.error,
        })?;
    let _ = fs::remove_file(temp_path);
    Ok(())
}
