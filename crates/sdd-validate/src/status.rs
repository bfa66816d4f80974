//! The `status.derive` auto-fixer (spec.md §4.2, I4/I5): recompute
//! non-leaf statuses from their children. Leaves and explicitly
//! `blocked` nodes are left untouched (I6).

use sdd_model::{Document, Node, NodeStatus};

/// Derive `node`'s status per I4/I5, given its children already hold
/// correct statuses (call bottom-up).
fn derive_non_leaf_status(node: &Node) -> NodeStatus {
    if node.status == NodeStatus::Blocked {
        return NodeStatus::Blocked; // I6: blocked never derives from children.
    }
    let all_completed = node.children.iter().all(|c| c.status == NodeStatus::Completed);
    if all_completed && !node.children.is_empty() {
        return NodeStatus::Completed;
    }
    let any_active = node
        .children
        .iter()
        .any(|c| matches!(c.status, NodeStatus::InProgress | NodeStatus::Completed));
    if any_active {
        return NodeStatus::InProgress;
    }
    NodeStatus::Pending
}

fn fix_node(node: &mut Node) {
    for child in &mut node.children {
        fix_node(child);
    }
    if !node.is_leaf() {
        node.status = derive_non_leaf_status(node);
    }
}

/// Idempotent: a second call with no leaf changes produces no further
/// change.
pub fn derive(doc: &mut Document) {
    for phase in &mut doc.hierarchy {
        fix_node(phase);
    }
}
