//! C1 Spec Store (spec.md §4.1): persist exactly one JSON document per
//! `spec_id` in exactly one bucket directory, read and write atomically.
//!
//! Grounded on `xchecker-lock` (locking) and
//! `xchecker-utils/src/atomic_write.rs` (temp-file+fsync+rename), adapted
//! from "write one config/session file" to "locate across four lifecycle
//! buckets, load/save/move one spec document".

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use sdd_lock::SpecLock;
use sdd_model::{Document, SpecStatus};
use sdd_utils::atomic_write::{move_file_atomic, write_file_atomic};
use sdd_utils::paths::BUCKET_PRECEDENCE;
use sdd_utils::{SddError, SddResult};
use std::thread;
use std::time::Duration;

const READ_RETRIES: u32 = 2;
const READ_RETRY_BACKOFF: Duration = Duration::from_millis(50);

fn bucket_from_status(status: SpecStatus) -> &'static str {
    status.bucket()
}

fn status_from_bucket(bucket: &str) -> Option<SpecStatus> {
    match bucket {
        "pending" => Some(SpecStatus::Pending),
        "active" => Some(SpecStatus::Active),
        "completed" => Some(SpecStatus::Completed),
        "archived" => Some(SpecStatus::Archived),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    pub backup: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions { backup: true }
    }
}

/// Atomic, lock-guarded access to spec documents under one specs root.
pub struct SpecStore {
    specs_root: Utf8PathBuf,
    lock_timeout: Duration,
}

impl SpecStore {
    #[must_use]
    pub fn new(specs_root: impl Into<Utf8PathBuf>) -> Self {
        SpecStore {
            specs_root: specs_root.into(),
            lock_timeout: sdd_lock::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn specs_root(&self) -> &Utf8Path {
        &self.specs_root
    }

    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    fn spec_path(&self, bucket: &str, spec_id: &str) -> Utf8PathBuf {
        self.specs_root.join(bucket).join(format!("{spec_id}.json"))
    }

    /// Search all four lifecycle buckets in precedence order
    /// (`active`, `pending`, `completed`, `archived`); on multiple
    /// matches, return the first by precedence and log a warning.
    pub fn locate(&self, spec_id: &str) -> SddResult<(Utf8PathBuf, SpecStatus)> {
        let mut matches = Vec::new();
        for bucket in BUCKET_PRECEDENCE {
            let path = self.spec_path(bucket, spec_id);
            if path.exists() {
                matches.push((path, status_from_bucket(bucket).expect("known bucket")));
            }
        }
        match matches.len() {
            0 => Err(SddError::NotFound(format!("spec '{spec_id}' not found in any bucket"))),
            1 => Ok(matches.into_iter().next().unwrap()),
            _ => {
                tracing::warn!(
                    spec_id,
                    count = matches.len(),
                    "spec found in multiple buckets; using highest-precedence match"
                );
                Ok(matches.into_iter().next().unwrap())
            }
        }
    }

    /// Read and parse the document for `spec_id`, retrying twice with a
    /// 50 ms backoff on transient IO errors (spec.md §4.1).
    pub fn load(&self, spec_id: &str) -> SddResult<Document> {
        let (path, _bucket) = self.locate(spec_id)?;
        self.load_path(&path)
    }

    fn load_path(&self, path: &Utf8Path) -> SddResult<Document> {
        let mut last_err = None;
        for attempt in 0..=READ_RETRIES {
            match std::fs::read_to_string(path.as_std_path()) {
                Ok(raw) => return Self::parse(&raw),
                Err(e) => {
                    last_err = Some(e);
                    if attempt < READ_RETRIES {
                        thread::sleep(READ_RETRY_BACKOFF);
                    }
                }
            }
        }
        Err(SddError::IoError {
            path: Some(path.as_std_path().to_path_buf()),
            source: last_err.expect("loop always sets last_err before exhausting retries"),
        })
    }

    fn parse(raw: &str) -> SddResult<Document> {
        serde_json::from_str::<Document>(raw).map_err(|e| SddError::MalformedSpec {
            reason: e.to_string(),
            byte_offset: Some(e.column()),
        })
    }

    /// Validate a document's schema version is within the range this
    /// binary supports, independent of JSON-level parse success.
    pub fn check_schema_version(doc: &Document) -> SddResult<()> {
        let version = doc.metadata.version;
        if !sdd_model::SUPPORTED_VERSION_RANGE.contains(&version) {
            return Err(SddError::MalformedSpec {
                reason: format!(
                    "schema version {version} outside supported range {:?}",
                    sdd_model::SUPPORTED_VERSION_RANGE
                ),
                byte_offset: None,
            });
        }
        Ok(())
    }

    /// Acquire the per-spec lock, optionally back up the existing file,
    /// bump `metadata.last_updated`, and write atomically.
    pub fn save(&self, spec_id: &str, document: &mut Document, options: SaveOptions) -> SddResult<()> {
        let _lock = SpecLock::acquire(&self.specs_root, spec_id, self.lock_timeout).map_err(|e| {
            lock_error_to_sdd(spec_id, e)
        })?;
        self.persist_locked(spec_id, document, options)
    }

    /// Same as [`SpecStore::save`] but without acquiring the lock itself:
    /// for callers (C7) that already hold a `SpecLock` across a whole
    /// load→mutate→validate→save transaction and must not re-acquire it.
    pub fn persist_locked(&self, spec_id: &str, document: &mut Document, options: SaveOptions) -> SddResult<()> {
        let bucket = bucket_from_status(document.metadata.status);
        let path = self.spec_path(bucket, spec_id);

        if options.backup && path.exists() {
            let timestamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
            let backup_path = path.with_extension(format!("json.backup.{timestamp}"));
            if let Err(source) = std::fs::copy(path.as_std_path(), backup_path.as_std_path()) {
                return Err(SddError::IoError {
                    path: Some(backup_path.as_std_path().to_path_buf()),
                    source,
                });
            }
        }

        document.metadata.last_updated = Some(Utc::now());

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| SddError::Internal(format!("failed to serialize document: {e}")))?;
        write_file_atomic(&path, &json)?;
        Ok(())
    }

    /// Move a spec's file between lifecycle buckets, under lock.
    pub fn move_spec(&self, spec_id: &str, target_bucket: SpecStatus) -> SddResult<Utf8PathBuf> {
        let _lock = SpecLock::acquire(&self.specs_root, spec_id, self.lock_timeout).map_err(|e| {
            lock_error_to_sdd(spec_id, e)
        })?;
        self.move_spec_locked(spec_id, target_bucket)
    }

    /// Same as [`SpecStore::move_spec`] but without acquiring the lock
    /// itself; see [`SpecStore::persist_locked`].
    pub fn move_spec_locked(&self, spec_id: &str, target_bucket: SpecStatus) -> SddResult<Utf8PathBuf> {
        let (current_path, current_status) = self.locate(spec_id)?;
        if current_status == target_bucket {
            return Ok(current_path);
        }
        let target_path = self.spec_path(bucket_from_status(target_bucket), spec_id);
        move_file_atomic(&current_path, &target_path)?;
        Ok(target_path)
    }
}

fn lock_error_to_sdd(spec_id: &str, err: sdd_lock::LockError) -> SddError {
    match err {
        sdd_lock::LockError::Held { pid, age_secs, .. } => SddError::LockContention {
            spec_id: spec_id.to_string(),
            holder_pid: pid,
            holder_age_secs: age_secs,
        },
        sdd_lock::LockError::Timeout(_) => SddError::LockContention {
            spec_id: spec_id.to_string(),
            holder_pid: 0,
            holder_age_secs: 0,
        },
        sdd_lock::LockError::Corrupted(reason) => {
            SddError::Internal(format!("lock file corrupted for {spec_id}: {reason}"))
        }
        sdd_lock::LockError::Io(source) => SddError::IoError { path: None, source },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdd_model::Document;
    use tempfile::TempDir;

    fn store() -> (TempDir, SpecStore) {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, SpecStore::new(root))
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_dir, store) = store();
        let mut doc = Document::new("demo-001");
        doc.metadata.status = SpecStatus::Active;
        store.save("demo-001", &mut doc, SaveOptions::default()).unwrap();

        let loaded = store.load("demo-001").unwrap();
        assert_eq!(loaded.spec_id, "demo-001");
        assert_eq!(loaded.status(), SpecStatus::Active);
        assert!(loaded.metadata.last_updated.is_some());
    }

    #[test]
    fn locate_fails_with_not_found_for_unknown_spec() {
        let (_dir, store) = store();
        let err = store.locate("nope").unwrap_err();
        assert!(matches!(err, SddError::NotFound(_)));
    }

    #[test]
    fn move_spec_relocates_the_file_across_buckets() {
        let (_dir, store) = store();
        let mut doc = Document::new("demo-001");
        doc.metadata.status = SpecStatus::Pending;
        store.save("demo-001", &mut doc, SaveOptions::default()).unwrap();

        let new_path = store.move_spec("demo-001", SpecStatus::Active).unwrap();
        assert!(new_path.exists());
        let (located, status) = store.locate("demo-001").unwrap();
        assert_eq!(located, new_path);
        assert_eq!(status, SpecStatus::Active);
    }

    #[test]
    fn save_writes_a_backup_when_file_already_exists() {
        let (dir, store) = store();
        let mut doc = Document::new("demo-001");
        doc.metadata.status = SpecStatus::Active;
        store.save("demo-001", &mut doc, SaveOptions::default()).unwrap();
        store.save("demo-001", &mut doc, SaveOptions::default()).unwrap();

        let active_dir = dir.path().join("active");
        let has_backup = std::fs::read_dir(active_dir)
            .unwrap()
            .filter_map(Result::ok)
            .any(|e| e.file_name().to_string_lossy().contains(".backup."));
        assert!(has_backup);
    }

    #[test]
    fn malformed_json_surfaces_as_malformed_spec() {
        let (dir, store) = store();
        let active_dir = dir.path().join("active");
        std::fs::create_dir_all(&active_dir).unwrap();
        std::fs::write(active_dir.join("demo-001.json"), "{not json").unwrap();

        let err = store.load("demo-001").unwrap_err();
        assert!(matches!(err, SddError::MalformedSpec { .. }));
    }
}
