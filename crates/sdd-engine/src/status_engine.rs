//! C3 Progress & Status Engine (spec.md §4.3): after a leaf mutation,
//! walk up via the [`Index`]'s parent paths recomputing counts and
//! status for each ancestor. O(depth) per mutation.

use sdd_model::{Counts, Document, Node, NodeId, NodeStatus};

use crate::index::{node_at_mut, Index};

/// An ancestor transitioned to `completed` as a side effect of
/// propagation; C6 journals this as an `AutoCompletion` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoCompletion(pub NodeId);

/// I4/I5, mirrored here for real-time propagation; `sdd-validate`'s
/// `status.derive` enforces the same formula as a standalone fixer for
/// documents whose status never got propagated incrementally.
fn derive_non_leaf_status(current: NodeStatus, children: &[Node]) -> NodeStatus {
    if current == NodeStatus::Blocked {
        return NodeStatus::Blocked; // I6
    }
    if !children.is_empty() && children.iter().all(|c| c.status == NodeStatus::Completed) {
        return NodeStatus::Completed;
    }
    if children
        .iter()
        .any(|c| matches!(c.status, NodeStatus::InProgress | NodeStatus::Completed))
    {
        return NodeStatus::InProgress;
    }
    NodeStatus::Pending
}

/// Propagate a status/counts change from `leaf_id` up to the document
/// root. Returns the ids of ancestors that transitioned to `completed`.
pub fn propagate_from_leaf(doc: &mut Document, index: &Index, leaf_id: &NodeId) -> Vec<AutoCompletion> {
    let mut completions = Vec::new();
    for path in index.ancestor_paths(leaf_id) {
        let Some(node) = node_at_mut(doc, &path) else { continue };
        let was_completed = node.status == NodeStatus::Completed;

        let child_counts: Vec<Counts> = node.children.iter().map(|c| c.counts).collect();
        node.counts = Counts::combine(&child_counts);
        let new_status = derive_non_leaf_status(node.status, &node.children);
        node.status = new_status;

        if !was_completed && new_status == NodeStatus::Completed {
            completions.push(AutoCompletion(node.id.clone()));
        }
    }

    let child_counts: Vec<Counts> = doc.hierarchy.iter().map(|p| p.counts).collect();
    doc.counts = Counts::combine(&child_counts);

    completions
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdd_model::{Dependencies, NodeMetadata, NodeType};

    fn leaf(id: &str, status: NodeStatus) -> Node {
        Node {
            id: NodeId::from(id),
            node_type: NodeType::Task,
            title: id.to_string(),
            description: None,
            status,
            metadata: NodeMetadata::default(),
            children: Vec::new(),
            dependencies: Dependencies::default(),
            counts: Counts::leaf(status),
        }
    }

    fn doc_with_two_tasks() -> Document {
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
        phase.children.push(leaf("task-1-1", NodeStatus::Pending));
        phase.children.push(leaf("task-1-2", NodeStatus::Pending));
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase);
        doc
    }

    #[test]
    fn completing_all_leaves_auto_completes_the_phase() {
        let mut doc = doc_with_two_tasks();
        let index = Index::build(&doc);

        doc.hierarchy[0].children[0].status = NodeStatus::Completed;
        propagate_from_leaf(&mut doc, &index, &NodeId::task(1, 1, None));
        assert_eq!(doc.hierarchy[0].status, NodeStatus::InProgress);

        doc.hierarchy[0].children[1].status = NodeStatus::Completed;
        let completions = propagate_from_leaf(&mut doc, &index, &NodeId::task(1, 2, None));
        assert_eq!(doc.hierarchy[0].status, NodeStatus::Completed);
        assert_eq!(completions, vec![AutoCompletion(NodeId::phase(1))]);
    }

    #[test]
    fn document_counts_reflect_the_new_leaf_state() {
        let mut doc = doc_with_two_tasks();
        let index = Index::build(&doc);
        doc.hierarchy[0].children[0].status = NodeStatus::Completed;
        propagate_from_leaf(&mut doc, &index, &NodeId::task(1, 1, None));
        assert_eq!(doc.counts.completed, 1);
        assert_eq!(doc.counts.total, 2);
    }
}
