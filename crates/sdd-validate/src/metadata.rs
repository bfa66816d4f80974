//! The `metadata` validator (spec.md §4.2: I8, I9, I10) and the
//! `metadata.ensure` auto-fixer.

use sdd_model::{Document, JournalEntry, Node, NodeStatus, NodeType};

use crate::issue::Issue;

pub fn validate(doc: &Document) -> Vec<Issue> {
    let mut issues = Vec::new();
    for phase in &doc.hierarchy {
        check_node(phase, &doc.journal, &mut issues);
    }
    issues
}

fn check_node(node: &Node, journal: &[JournalEntry], issues: &mut Vec<Issue>) {
    // I8: verification_result present iff a non-pending verify node.
    if node.node_type == NodeType::Verify {
        let has_result = node.metadata.verification_result.is_some();
        let should_have = node.status != NodeStatus::Pending;
        if has_result != should_have {
            issues.push(Issue::error(
                "metadata.verification_result_mismatch",
                node.id.as_str(),
                "verification_result must be present iff the verify node is not pending",
            ));
        }
    }

    // I9: started_at/completed_at presence tracks status.
    if matches!(node.status, NodeStatus::InProgress | NodeStatus::Completed)
        && node.metadata.started_at.is_none()
    {
        issues.push(Issue::error(
            "metadata.missing_started_at",
            node.id.as_str(),
            "started_at must be set once a node has left pending",
        ));
    }
    if node.status == NodeStatus::Completed && node.metadata.completed_at.is_none() {
        issues.push(Issue::error(
            "metadata.missing_completed_at",
            node.id.as_str(),
            "completed_at must be set once a node is completed",
        ));
    }
    if let (Some(started), Some(completed)) = (node.metadata.started_at, node.metadata.completed_at) {
        if completed < started {
            issues.push(Issue::error(
                "metadata.non_monotonic_timestamps",
                node.id.as_str(),
                "completed_at precedes started_at",
            ));
        }
    }

    // I10: needs_journaling should be false once a journal entry covers
    // this node's latest status-affecting timestamp.
    if node.metadata.needs_journaling {
        let latest_change = node.metadata.completed_at.or(node.metadata.started_at);
        let journaled_since = latest_change.is_none_or(|since| {
            journal
                .iter()
                .any(|e| e.task_id.as_ref() == Some(&node.id) && e.timestamp >= since)
        });
        if journaled_since {
            issues.push(Issue::warning(
                "metadata.stale_needs_journaling",
                node.id.as_str(),
                "needs_journaling is set but a covering journal entry already exists",
            ));
        }
    }

    for child in &node.children {
        check_node(child, journal, issues);
    }
}

/// `metadata.ensure`: a no-op today because `Node::metadata` is always
/// present via `#[serde(default)]`; kept as an explicit, idempotent pass
/// so future optional-metadata schema changes have a fixer to extend.
pub fn ensure(_doc: &mut Document) {}

#[cfg(test)]
mod tests {
    use super::*;
    use sdd_model::{Counts, Dependencies, NodeId, NodeMetadata, VerificationResult, VerificationStatus};

    fn verify_node(status: NodeStatus, with_result: bool) -> Node {
        Node {
            id: NodeId::verify(1, 1, None),
            node_type: NodeType::Verify,
            title: "Run tests".into(),
            description: None,
            status,
            metadata: NodeMetadata {
                verification_result: with_result.then(|| VerificationResult {
                    date: chrono::Utc::now(),
                    status: VerificationStatus::Passed,
                    output: None,
                    notes: None,
                }),
                ..NodeMetadata::default()
            },
            children: Vec::new(),
            dependencies: Dependencies::default(),
            counts: Counts::leaf(status),
        }
    }

    #[test]
    fn pending_verify_with_a_result_is_an_error() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(verify_node(NodeStatus::Pending, true));
        let issues = validate(&doc);
        assert!(issues.iter().any(|i| i.code == "metadata.verification_result_mismatch"));
    }

    #[test]
    fn completed_verify_without_a_result_is_an_error() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(verify_node(NodeStatus::Completed, false));
        let issues = validate(&doc);
        assert!(issues.iter().any(|i| i.code == "metadata.verification_result_mismatch"));
    }
}
