//! File locking for the Spec Store (C1, spec.md §4.1 and §5).
//!
//! One exclusive advisory lock per `spec_id`, held for the duration of a C7
//! transaction. Lock acquisition uses atomic `O_EXCL` file creation to avoid
//! TOCTOU races, with stale-lock detection (lock held by a dead or very old
//! process) and a configurable acquisition timeout. Grounded on
//! `crates/xchecker-lock` in the teacher.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::process;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Default threshold above which a lock is considered stale (spec.md §4.1).
pub const DEFAULT_STALE_THRESHOLD_SECS: u64 = 3600;

/// Default lock acquisition timeout (spec.md §5): "File-lock acquisition has
/// a default 10 s timeout; on expiry the CLI exits with `LockContention`".
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub created_at: u64,
    pub spec_id: String,
}

impl LockInfo {
    #[must_use]
    pub fn age_secs(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        now.saturating_sub(self.created_at)
    }

    #[must_use]
    pub fn is_stale(&self, threshold_secs: u64) -> bool {
        self.age_secs() > threshold_secs || !process_alive(self.pid)
    }
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock for spec '{spec_id}' held by pid {pid}, age {age_secs}s")]
    Held {
        spec_id: String,
        pid: u32,
        age_secs: u64,
    },
    #[error("timed out after {0:?} waiting for lock")]
    Timeout(Duration),
    #[error("lock file is corrupted: {0}")]
    Corrupted(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Best-effort liveness check. Linux-only `/proc` probe; any other
/// platform (or a probe failure) conservatively assumes the process is
/// alive so a live lock is never mistaken for stale.
fn process_alive(pid: u32) -> bool {
    #[cfg(target_os = "linux")]
    {
        Utf8PathBuf::from(format!("/proc/{pid}")).exists()
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = pid;
        true
    }
}

fn lock_path(specs_root: &Utf8Path, spec_id: &str) -> Utf8PathBuf {
    specs_root.join(".locks").join(format!("{spec_id}.lock"))
}

/// An acquired exclusive lock for one `spec_id`. Releasing happens on drop
/// (fd lock release + lock-file removal); transactions hold it for their
/// entire load→mutate→validate→save scope (spec.md §5).
pub struct SpecLock {
    path: Utf8PathBuf,
    _fd_lock: RwLock<fs::File>,
}

impl SpecLock {
    /// Acquire the lock for `spec_id`, retrying stale-lock takeover until
    /// `timeout` elapses.
    pub fn acquire(
        specs_root: &Utf8Path,
        spec_id: &str,
        timeout: Duration,
    ) -> Result<Self, LockError> {
        let path = lock_path(specs_root, spec_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let deadline = Instant::now() + timeout;
        loop {
            match fs::OpenOptions::new().create_new(true).write(true).open(path.as_std_path()) {
                Ok(file) => return Self::finalize(path, file, spec_id),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    match Self::existing_lock_info(&path)? {
                        Some(info) if info.is_stale(DEFAULT_STALE_THRESHOLD_SECS) => {
                            let _ = fs::remove_file(path.as_std_path());
                            continue;
                        }
                        Some(info) => {
                            if Instant::now() >= deadline {
                                return Err(LockError::Held {
                                    spec_id: spec_id.to_string(),
                                    pid: info.pid,
                                    age_secs: info.age_secs(),
                                });
                            }
                            std::thread::sleep(Duration::from_millis(50));
                        }
                        None => continue, // lock file vanished mid-read; retry
                    }
                }
                Err(e) => return Err(LockError::Io(e)),
            }
            if Instant::now() >= deadline {
                return Err(LockError::Timeout(timeout));
            }
        }
    }

    fn existing_lock_info(path: &Utf8Path) -> Result<Option<LockInfo>, LockError> {
        match fs::read_to_string(path.as_std_path()) {
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| LockError::Corrupted(e.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LockError::Io(e)),
        }
    }

    fn finalize(path: Utf8PathBuf, file: fs::File, spec_id: &str) -> Result<Self, LockError> {
        let info = LockInfo {
            pid: process::id(),
            created_at: Utc::now().timestamp() as u64,
            spec_id: spec_id.to_string(),
        };
        let json = serde_json::to_string_pretty(&info).map_err(|e| LockError::Corrupted(e.to_string()))?;

        let mut rw = RwLock::new(file);
        {
            let mut guard = rw
                .try_write()
                .map_err(|_| LockError::Held {
                    spec_id: spec_id.to_string(),
                    pid: info.pid,
                    age_secs: 0,
                })?;
            guard.write_all(json.as_bytes())?;
            guard.flush()?;
            guard.sync_all()?;
        }

        Ok(SpecLock { path, _fd_lock: rw })
    }
}

impl Drop for SpecLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(self.path.as_std_path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn acquires_and_releases() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let lock = SpecLock::acquire(root, "demo-001", Duration::from_secs(1)).unwrap();
        assert!(lock.path.exists());
        drop(lock);
        assert!(!lock_path(root, "demo-001").exists());
    }

    #[test]
    #[serial]
    fn second_acquire_times_out_while_first_is_held() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let _first = SpecLock::acquire(root, "demo-001", Duration::from_secs(1)).unwrap();

        let err = SpecLock::acquire(root, "demo-001", Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, LockError::Held { .. } | LockError::Timeout(_)));
    }

    #[test]
    #[serial]
    fn stale_lock_is_reclaimed() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let path = lock_path(root, "demo-001");
        fs::create_dir_all(path.parent().unwrap().as_std_path()).unwrap();
        let stale = LockInfo {
            pid: 999_999, // very unlikely to be a live pid
            created_at: 0,
            spec_id: "demo-001".into(),
        };
        fs::write(path.as_std_path(), serde_json::to_string(&stale).unwrap()).unwrap();

        let lock = SpecLock::acquire(root, "demo-001", Duration::from_secs(2)).unwrap();
        assert!(lock.path.exists());
    }
}
