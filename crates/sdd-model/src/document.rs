//! The top-level spec document (spec.md §3).

use serde::{Deserialize, Serialize};

use crate::journal::JournalEntry;
use crate::metadata::{DocumentMetadata, SUPPORTED_VERSION_RANGE};
use crate::node::{Counts, Node};
use crate::status::SpecStatus;

/// One spec document as persisted by C1: metadata (which carries
/// lifecycle `status`), the node hierarchy, the append-only journal,
/// and document-level rolled-up counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub spec_id: String,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hierarchy: Vec<Node>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub journal: Vec<JournalEntry>,
    #[serde(default)]
    pub counts: Counts,
}

impl Document {
    #[must_use]
    pub fn new(spec_id: impl Into<String>) -> Self {
        Document {
            spec_id: spec_id.into(),
            metadata: DocumentMetadata {
                version: *SUPPORTED_VERSION_RANGE.end(),
                ..DocumentMetadata::default()
            },
            hierarchy: Vec::new(),
            journal: Vec::new(),
            counts: Counts::default(),
        }
    }

    #[must_use]
    pub fn status(&self) -> SpecStatus {
        self.metadata.status
    }

    /// Depth-first iterator over every node in the document.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &Node> {
        self.hierarchy.iter().flat_map(Node::iter)
    }

    #[must_use]
    pub fn find_node(&self, id: &crate::node_id::NodeId) -> Option<&Node> {
        self.iter_nodes().find(|n| &n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_id::NodeId;

    #[test]
    fn new_document_has_no_nodes_and_pending_status() {
        let doc = Document::new("demo-001");
        assert_eq!(doc.status(), SpecStatus::Pending);
        assert_eq!(doc.iter_nodes().count(), 0);
    }

    #[test]
    fn find_node_searches_the_whole_tree() {
        let mut doc = Document::new("demo-001");
        let mut phase = crate::node::Node {
            id: NodeId::phase(1),
            node_type: crate::node::NodeType::Phase,
            title: "Phase One".into(),
            description: None,
            status: crate::status::NodeStatus::Pending,
            metadata: Default::default(),
            children: Vec::new(),
            dependencies: Default::default(),
            counts: Counts::default(),
        };
        let task = crate::node::Node {
            id: NodeId::task(1, 1, None),
            node_type: crate::node::NodeType::Task,
            title: "Do the thing".into(),
            description: None,
            status: crate::status::NodeStatus::Pending,
            metadata: Default::default(),
            children: Vec::new(),
            dependencies: Default::default(),
            counts: Counts::leaf(crate::status::NodeStatus::Pending),
        };
        phase.children.push(task);
        doc.hierarchy.push(phase);

        assert!(doc.find_node(&NodeId::task(1, 1, None)).is_some());
        assert!(doc.find_node(&NodeId::task(9, 9, None)).is_none());
    }
}
