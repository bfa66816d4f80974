//! `progress_summary` (spec.md §4.9): the document's rolled-up counts
//! plus whichever phase is currently being worked.

use chrono::{DateTime, Utc};
use sdd_model::{Document, NodeStatus, NodeType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub blocked: u64,
    pub percent: u8,
    pub current_phase: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// The document's cached `counts` are already maintained by C3 on every
/// mutation (I7); this just reshapes them plus picks out the one phase
/// (if any) that's `in_progress` for UI display.
#[must_use]
pub fn progress_summary(doc: &Document) -> ProgressSummary {
    let counts = doc.counts;
    let current_phase = doc
        .hierarchy
        .iter()
        .find(|n| n.node_type == NodeType::Phase && n.status == NodeStatus::InProgress)
        .map(|n| n.id.as_str().to_string());

    ProgressSummary {
        total: counts.total,
        completed: counts.completed,
        pending: counts.pending,
        in_progress: counts.in_progress,
        blocked: counts.blocked,
        percent: counts.percent,
        current_phase,
        last_updated: doc.metadata.last_updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdd_model::{Counts, Dependencies, Node, NodeId, NodeMetadata};

    fn phase(status: NodeStatus) -> Node {
        Node {
            id: NodeId::phase(1),
            node_type: NodeType::Phase,
            title: "Phase One".into(),
            description: None,
            status,
            metadata: NodeMetadata::default(),
            children: Vec::new(),
            dependencies: Dependencies::default(),
            counts: Counts::default(),
        }
    }

    #[test]
    fn reports_the_in_progress_phase_as_current() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase(NodeStatus::InProgress));
        let summary = progress_summary(&doc);
        assert_eq!(summary.current_phase.as_deref(), Some("phase-1"));
    }

    #[test]
    fn no_in_progress_phase_leaves_current_phase_unset() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase(NodeStatus::Pending));
        let summary = progress_summary(&doc);
        assert_eq!(summary.current_phase, None);
    }

    #[test]
    fn empty_document_has_zero_percent() {
        let doc = Document::new("demo-001");
        let summary = progress_summary(&doc);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.percent, 0);
    }
}
