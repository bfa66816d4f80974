//! C6 Journal & Verification Log (spec.md §4.6): append-only event
//! recording and verification-outcome recording with retry policy.
//!
//! This crate mutates an in-memory `Document` only; callers own the
//! load-under-lock / persist lifecycle (C1) and the clone/validate
//! sequencing (C7).

use chrono::{DateTime, Utc};

use sdd_engine::{propagate_from_leaf, AutoCompletion, Index};
use sdd_model::{
    Document, JournalEntry, JournalEntryType, Node, NodeId, NodeStatus, VerificationResult,
    VerificationStatus,
};
use sdd_utils::clock::next_timestamp;

/// Outcome of [`record`]: either the terminal result was persisted, or a
/// retry is owed to the caller before a terminal outcome can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded {
        new_status: NodeStatus,
        auto_completions: Vec<NodeId>,
    },
    RetryOwed {
        remaining_retries: u32,
    },
}

/// Append `entry` to the document journal, enforcing monotonic
/// timestamps (I9) by threading the last entry's timestamp through
/// [`next_timestamp`].
pub fn append(doc: &mut Document, mut entry: JournalEntry) -> &JournalEntry {
    let last = doc.journal.last().map(|e| e.timestamp);
    entry.timestamp = next_timestamp(last);
    if let Some(task_id) = &entry.task_id {
        clear_needs_journaling(doc, task_id);
    }
    doc.journal.push(entry);
    doc.journal.last().expect("just pushed")
}

/// Record a verification outcome on `verify_id`'s node per spec.md
/// §4.6: success completes the node, failure reverts to
/// `on_failure.revert_status` (defaulting to `blocked`) unless retries
/// remain, and auto-completion of the parent is propagated and
/// journaled.
pub fn record(
    doc: &mut Document,
    verify_id: &NodeId,
    result: VerificationResult,
    remaining_retries: Option<u32>,
) -> Option<RecordOutcome> {
    let index = Index::build(doc);
    let path = index.path_of(verify_id)?.to_vec();

    if result.status == VerificationStatus::Failed {
        if let Some(retries) = remaining_retries {
            if retries > 0 {
                return Some(RecordOutcome::RetryOwed {
                    remaining_retries: retries - 1,
                });
            }
        }
    }

    let node = sdd_engine::index::node_at_mut(doc, &path)?;
    let revert_status = node
        .metadata
        .on_failure
        .as_ref()
        .and_then(|p| p.revert_status);
    node.metadata.verification_result = Some(result.clone());
    node.status = match result.status {
        VerificationStatus::Passed => NodeStatus::Completed,
        VerificationStatus::Failed => revert_status.unwrap_or(NodeStatus::Blocked),
        VerificationStatus::Partial => NodeStatus::InProgress,
    };
    let new_status = node.status;

    let completions = propagate_from_leaf(doc, &index, verify_id);
    for AutoCompletion(ref completed_id) in &completions {
        let entry = JournalEntry::new(
            Utc::now(),
            JournalEntryType::StatusChange,
            format!("{completed_id} auto-completed"),
            format!("All children of {completed_id} completed; status derived automatically."),
        )
        .for_node(completed_id.clone());
        append(doc, entry);
    }

    Some(RecordOutcome::Recorded {
        new_status,
        auto_completions: completions.into_iter().map(|AutoCompletion(id)| id).collect(),
    })
}

/// Mark `leaf_id` as needing a journal entry: any leaf status change
/// not accompanied, in the same transaction, by a journal entry
/// mentioning that `task_id` (I10).
pub fn mark_needs_journaling(doc: &mut Document, leaf_id: &NodeId) {
    if let Some(node) = find_node_mut(doc, leaf_id) {
        node.metadata.needs_journaling = true;
    }
}

fn clear_needs_journaling(doc: &mut Document, task_id: &NodeId) {
    if let Some(node) = find_node_mut(doc, task_id) {
        node.metadata.needs_journaling = false;
    }
}

fn find_node_mut<'a>(doc: &'a mut Document, id: &NodeId) -> Option<&'a mut Node> {
    let index = Index::build(doc);
    let path = index.path_of(id)?.to_vec();
    sdd_engine::index::node_at_mut(doc, &path)
}

/// Whether `timestamp` would violate I9's non-decreasing rule if
/// appended next, i.e. whether [`next_timestamp`] would need to bump it.
#[must_use]
pub fn would_regress(doc: &Document, timestamp: DateTime<Utc>) -> bool {
    doc.journal.last().is_some_and(|e| timestamp <= e.timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdd_model::{Counts, Dependencies, NodeMetadata, NodeType, OnFailurePolicy};

    fn verify_leaf(id: &str) -> Node {
        Node {
            id: NodeId::from(id),
            node_type: NodeType::Verify,
            title: id.to_string(),
            description: None,
            status: NodeStatus::Pending,
            metadata: NodeMetadata::default(),
            children: Vec::new(),
            dependencies: Dependencies::default(),
            counts: Counts::leaf(NodeStatus::Pending),
        }
    }

    fn doc_with_single_verify() -> Document {
        let mut phase = Node {
            id: NodeId::phase(1),
            node_type: NodeType::Phase,
            title: "Phase 1".into(),
            description: None,
            status: NodeStatus::Pending,
            metadata: NodeMetadata::default(),
            children: Vec::new(),
            dependencies: Dependencies::default(),
            counts: Counts::default(),
        };
        phase.children.push(verify_leaf("verify-1-1"));
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase);
        doc
    }

    #[test]
    fn passed_result_completes_the_node_and_auto_completes_the_parent() {
        let mut doc = doc_with_single_verify();
        let result = VerificationResult {
            date: Utc::now(),
            status: VerificationStatus::Passed,
            output: Some("ok".into()),
            notes: None,
        };
        let outcome = record(&mut doc, &NodeId::verify(1, 1, None), result, None).unwrap();
        assert_eq!(
            outcome,
            RecordOutcome::Recorded {
                new_status: NodeStatus::Completed,
                auto_completions: vec![NodeId::phase(1)],
            }
        );
        assert_eq!(doc.hierarchy[0].status, NodeStatus::Completed);
        assert_eq!(doc.journal.len(), 1);
    }

    #[test]
    fn failed_result_without_revert_status_blocks_the_node() {
        let mut doc = doc_with_single_verify();
        let result = VerificationResult {
            date: Utc::now(),
            status: VerificationStatus::Failed,
            output: None,
            notes: Some("boom".into()),
        };
        let outcome = record(&mut doc, &NodeId::verify(1, 1, None), result, None).unwrap();
        assert_eq!(
            outcome,
            RecordOutcome::Recorded {
                new_status: NodeStatus::Blocked,
                auto_completions: vec![],
            }
        );
    }

    #[test]
    fn failed_result_with_retries_owes_a_retry_instead_of_persisting() {
        let mut doc = doc_with_single_verify();
        doc.hierarchy[0].children[0].metadata.on_failure = Some(OnFailurePolicy {
            max_retries: Some(2),
            ..OnFailurePolicy::default()
        });
        let result = VerificationResult {
            date: Utc::now(),
            status: VerificationStatus::Failed,
            output: None,
            notes: None,
        };
        let outcome = record(&mut doc, &NodeId::verify(1, 1, None), result, Some(2)).unwrap();
        assert_eq!(outcome, RecordOutcome::RetryOwed { remaining_retries: 1 });
        // status untouched while a retry is owed
        assert_eq!(doc.hierarchy[0].children[0].status, NodeStatus::Pending);
    }

    #[test]
    fn appending_clears_needs_journaling_on_the_referenced_task() {
        let mut doc = doc_with_single_verify();
        doc.hierarchy[0].children[0].metadata.needs_journaling = true;
        let entry = JournalEntry::new(Utc::now(), JournalEntryType::Note, "t", "c")
            .for_node(NodeId::verify(1, 1, None));
        append(&mut doc, entry);
        assert!(!doc.hierarchy[0].children[0].metadata.needs_journaling);
    }

    #[test]
    fn appended_entries_never_regress_in_timestamp() {
        let mut doc = Document::new("demo-001");
        let far_future = Utc::now() + chrono::Duration::days(1);
        append(&mut doc, JournalEntry::new(far_future, JournalEntryType::Note, "a", "a"));
        append(&mut doc, JournalEntry::new(Utc::now(), JournalEntryType::Note, "b", "b"));
        assert!(doc.journal[1].timestamp > doc.journal[0].timestamp);
    }
}
