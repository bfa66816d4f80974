//! C7 Modification Transactor (spec.md §4.7): apply structured
//! mutations to a spec document atomically, with dry-run preview and
//! rollback-by-omission on validation failure.
//!
//! Transaction protocol: load under lock (C1) → clone → apply ops in
//! order against the clone → validate the clone (C2) → recompute
//! derived state is folded into each op's own propagation (C3) → on
//! `dry_run`, discard and return a diff; otherwise persist (C1) and
//! release the lock.

mod apply;
mod template;

use std::collections::BTreeMap;

use sdd_lock::SpecLock;
use sdd_model::{Document, ModificationOp, NodeId};
use sdd_store::{SaveOptions, SpecStore};
use sdd_utils::error::IssueSummary;
use sdd_utils::{SddError, SddResult};
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct TransactionOptions {
    pub dry_run: bool,
    pub require_valid_after: bool,
    pub backup: bool,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        TransactionOptions {
            dry_run: false,
            require_valid_after: true,
            backup: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionReport {
    pub ops_applied: Vec<String>,
    pub ops_noop: Vec<String>,
    pub auto_completions: Vec<NodeId>,
    pub dry_run: bool,
    pub preview_changes: Option<Value>,
}

/// Applies the op vocabulary to documents owned by a [`SpecStore`],
/// holding one [`SpecLock`] per transaction.
pub struct Transactor {
    store: SpecStore,
}

impl Transactor {
    #[must_use]
    pub fn new(store: SpecStore) -> Self {
        Transactor { store }
    }

    /// Run a batch of ops as a single transaction against `spec_id`'s
    /// existing document.
    pub fn apply(
        &self,
        spec_id: &str,
        ops: &[ModificationOp],
        options: TransactionOptions,
    ) -> SddResult<TransactionReport> {
        let _lock = self.acquire_lock(spec_id)?;
        let original = self.store.load(spec_id)?;
        SpecStore::check_schema_version(&original)?;
        self.run_transaction(spec_id, original, ops, options)
    }

    /// `create_spec` has no existing document to load; run it as a
    /// transaction against a fresh, empty one.
    pub fn create(
        &self,
        spec_id: &str,
        title: &str,
        template: &str,
        options: TransactionOptions,
    ) -> SddResult<TransactionReport> {
        let _lock = self.acquire_lock(spec_id)?;
        let blank = Document::new(String::new());
        let op = ModificationOp::CreateSpec {
            spec_id: spec_id.to_string(),
            title: title.to_string(),
            template: template.to_string(),
        };
        self.run_transaction(spec_id, blank, std::slice::from_ref(&op), options)
    }

    fn acquire_lock(&self, spec_id: &str) -> SddResult<SpecLock> {
        SpecLock::acquire(self.store.specs_root(), spec_id, self.store.lock_timeout())
            .map_err(|e| lock_error_to_sdd(spec_id, e))
    }

    fn run_transaction(
        &self,
        spec_id: &str,
        original: Document,
        ops: &[ModificationOp],
        options: TransactionOptions,
    ) -> SddResult<TransactionReport> {
        let original_bucket_status = original.metadata.status;
        let mut doc = original.clone();
        let mut ops_applied = Vec::new();
        let mut ops_noop = Vec::new();
        let mut auto_completions = Vec::new();

        for (index, op) in ops.iter().enumerate() {
            match apply::apply_one(&mut doc, op, &mut auto_completions) {
                Ok(true) => ops_applied.push(op.name().to_string()),
                Ok(false) => ops_noop.push(op.name().to_string()),
                Err(reason) => {
                    return Err(SddError::UserError(format!(
                        "op {index} ({}) failed: {reason}",
                        op.name()
                    )))
                }
            }
        }

        if options.require_valid_after {
            let issues = sdd_validate::validate(&doc);
            if sdd_validate::has_errors(&issues) {
                let issues: Vec<IssueSummary> = issues.iter().map(|i| i.to_summary()).collect();
                return Err(SddError::ValidationFailed { issues, rollback: true });
            }
        }

        if options.dry_run {
            return Ok(TransactionReport {
                ops_applied,
                ops_noop,
                auto_completions,
                dry_run: true,
                preview_changes: Some(build_preview(&original, &doc)),
            });
        }

        if doc.metadata.status != original_bucket_status && self.store.locate(spec_id).is_ok() {
            // A move_spec op changed the lifecycle bucket; relocate the
            // file before writing updated content into the new bucket.
            self.store.move_spec_locked(spec_id, doc.metadata.status)?;
        }

        self.store
            .persist_locked(spec_id, &mut doc, SaveOptions { backup: options.backup })?;

        Ok(TransactionReport {
            ops_applied,
            ops_noop,
            auto_completions,
            dry_run: false,
            preview_changes: None,
        })
    }
}

fn build_preview(original: &Document, mutated: &Document) -> Value {
    let original_statuses: BTreeMap<&NodeId, sdd_model::NodeStatus> =
        original.iter_nodes().map(|n| (&n.id, n.status)).collect();

    let mut status_changes = Vec::new();
    for node in mutated.iter_nodes() {
        match original_statuses.get(&node.id) {
            Some(prev) if *prev != node.status => {
                status_changes.push(serde_json::json!({
                    "node_id": node.id.as_str(),
                    "from": format!("{:?}", prev),
                    "to": format!("{:?}", node.status),
                }));
            }
            None => {
                status_changes.push(serde_json::json!({
                    "node_id": node.id.as_str(),
                    "from": Value::Null,
                    "to": format!("{:?}", node.status),
                }));
            }
            _ => {}
        }
    }

    serde_json::json!({
        "before_counts": original.counts,
        "after_counts": mutated.counts,
        "node_status_changes": status_changes,
    })
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
    use camino::Utf8PathBuf;
    use sdd_model::{JournalEntryType, NodeStatus, SpecStatus};
    use tempfile::TempDir;

    fn transactor() -> (TempDir, Transactor) {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, Transactor::new(SpecStore::new(root)))
    }

    #[test]
    fn create_then_next_builds_the_requested_template() {
        let (_dir, tx) = transactor();
        let report = tx.create("demo-001", "Demo", "2x3", TransactionOptions::default()).unwrap();
        assert_eq!(report.ops_applied, vec!["create_spec"]);

        let doc = tx.store.load("demo-001").unwrap();
        assert_eq!(doc.hierarchy.len(), 2);
        assert_eq!(doc.hierarchy[0].children.len(), 3);
    }

    #[test]
    fn complete_task_journals_the_task_and_auto_completes_the_phase() {
        let (_dir, tx) = transactor();
        tx.create("demo-001", "Demo", "1x1", TransactionOptions::default()).unwrap();

        let op = ModificationOp::CompleteTask {
            node_id: NodeId::task(1, 1, None),
            journal_title: "Did it".into(),
            journal_content: "done".into(),
            entry_type: JournalEntryType::Note,
        };
        let report = tx.apply("demo-001", &[op], TransactionOptions::default()).unwrap();
        assert_eq!(report.auto_completions, vec![NodeId::phase(1)]);

        let doc = tx.store.load("demo-001").unwrap();
        assert_eq!(doc.hierarchy[0].status, NodeStatus::Completed);
        assert_eq!(doc.journal.len(), 2);
    }

    #[test]
    fn a_batch_with_an_unknown_node_rolls_back_with_no_writes() {
        let (_dir, tx) = transactor();
        tx.create("demo-001", "Demo", "1x2", TransactionOptions::default()).unwrap();

        let ops = vec![
            ModificationOp::SetStatus {
                node_id: NodeId::task(1, 1, None),
                status: NodeStatus::Completed,
                note: None,
            },
            ModificationOp::SetStatus {
                node_id: NodeId::task(9, 9, None),
                status: NodeStatus::Completed,
                note: None,
            },
        ];
        let err = tx.apply("demo-001", &ops, TransactionOptions::default()).unwrap_err();
        assert!(matches!(err, SddError::UserError(_)));

        let doc = tx.store.load("demo-001").unwrap();
        assert_eq!(doc.hierarchy[0].children[0].status, NodeStatus::Pending);
    }

    #[test]
    fn dry_run_does_not_persist_changes() {
        let (_dir, tx) = transactor();
        tx.create("demo-001", "Demo", "1x1", TransactionOptions::default()).unwrap();

        let op = ModificationOp::SetStatus {
            node_id: NodeId::task(1, 1, None),
            status: NodeStatus::InProgress,
            note: None,
        };
        let options = TransactionOptions { dry_run: true, ..TransactionOptions::default() };
        let report = tx.apply("demo-001", &[op], options).unwrap();
        assert!(report.preview_changes.is_some());

        let doc = tx.store.load("demo-001").unwrap();
        assert_eq!(doc.hierarchy[0].children[0].status, NodeStatus::Pending);
    }

    #[test]
    fn setting_status_to_its_current_value_is_a_noop() {
        let (_dir, tx) = transactor();
        tx.create("demo-001", "Demo", "1x1", TransactionOptions::default()).unwrap();

        let op = ModificationOp::SetStatus {
            node_id: NodeId::task(1, 1, None),
            status: NodeStatus::Pending,
            note: None,
        };
        let report = tx.apply("demo-001", &[op], TransactionOptions::default()).unwrap();
        assert_eq!(report.ops_noop, vec!["set_status"]);
        assert!(report.ops_applied.is_empty());
    }

    #[test]
    fn move_spec_relocates_the_document_to_the_target_bucket() {
        let (_dir, tx) = transactor();
        tx.create("demo-001", "Demo", "1x1", TransactionOptions::default()).unwrap();

        let op = ModificationOp::MoveSpec {
            spec_id: "demo-001".into(),
            target_bucket: SpecStatus::Active,
        };
        tx.apply("demo-001", &[op], TransactionOptions::default()).unwrap();

        let (_, bucket) = tx.store.locate("demo-001").unwrap();
        assert_eq!(bucket, SpecStatus::Active);
    }
}
