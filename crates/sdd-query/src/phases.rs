//! `list_phases` (spec.md §4.9): the top-level phases with their cached
//! counts, no descent into children required.

use sdd_model::{Counts, Document, NodeId, NodeStatus, NodeType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseSummary {
    pub id: NodeId,
    pub title: String,
    pub status: NodeStatus,
    pub counts: Counts,
}

#[must_use]
pub fn list_phases(doc: &Document) -> Vec<PhaseSummary> {
    doc.hierarchy
        .iter()
        .filter(|n| n.node_type == NodeType::Phase)
        .map(|n| PhaseSummary {
            id: n.id.clone(),
            title: n.title.clone(),
            status: n.status,
            counts: n.counts,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdd_model::{Dependencies, Document, Node, NodeMetadata};

    #[test]
    fn lists_only_top_level_phases_in_document_order() {
        let mut doc = Document::new("demo-001");
        for n in 1..=2 {
            doc.hierarchy.push(Node {
                id: NodeId::phase(n),
                node_type: NodeType::Phase,
                title: format!("Phase {n}"),
                description: None,
                status: NodeStatus::Pending,
                metadata: NodeMetadata::default(),
                children: Vec::new(),
                dependencies: Dependencies::default(),
                counts: Counts::default(),
            });
        }
        let phases = list_phases(&doc);
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].id, NodeId::phase(1));
        assert_eq!(phases[1].id, NodeId::phase(2));
    }
}
