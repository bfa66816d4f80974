//! Hierarchy nodes (spec.md §3): phases, groups, tasks, and verify nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::metadata::NodeMetadata;
use crate::node_id::NodeId;

pub use crate::status::NodeType;
use crate::status::NodeStatus;

/// Hard and soft dependency edges out of one node (feeds C4's graph).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependencies {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub blocked_by: BTreeSet<NodeId>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub soft_depends: BTreeSet<NodeId>,
}

impl Dependencies {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocked_by.is_empty() && self.soft_depends.is_empty()
    }
}

/// Rolled-up descendant counts, recomputed by C3 after every mutation (I5).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub blocked: u64,
    pub percent: u8,
}

impl Counts {
    #[must_use]
    pub fn leaf(status: NodeStatus) -> Self {
        let mut c = Counts {
            total: 1,
            ..Counts::default()
        };
        match status {
            NodeStatus::Pending => c.pending = 1,
            NodeStatus::InProgress => c.in_progress = 1,
            NodeStatus::Completed => {
                c.completed = 1;
                c.percent = 100;
            }
            NodeStatus::Blocked => c.blocked = 1,
        }
        c
    }

    #[must_use]
    pub fn combine(children: &[Counts]) -> Self {
        let mut out = Counts::default();
        for c in children {
            out.total += c.total;
            out.completed += c.completed;
            out.pending += c.pending;
            out.in_progress += c.in_progress;
            out.blocked += c.blocked;
        }
        out.percent = if out.total == 0 {
            0
        } else {
            ((out.completed * 100) / out.total) as u8
        };
        out
    }
}

/// One node in the spec hierarchy tree.
///
/// `sdd-model` keeps this as a plain, serde-friendly recursive tree
/// (owned `children`, no parent pointers). `sdd-engine` builds an
/// index/arena view on top for O(depth) traversal; this crate stays a
/// data model, not a traversal engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: NodeStatus,
    #[serde(default)]
    pub metadata: NodeMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Dependencies::is_empty")]
    pub dependencies: Dependencies,
    #[serde(default)]
    pub counts: Counts,
}

impl Node {
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first iterator over this node and all descendants.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        NodeIter { stack: vec![self] }
    }
}

struct NodeIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn counts_combine_computes_percent() {
        let combined = Counts::combine(&[
            Counts::leaf(NodeStatus::Completed),
            Counts::leaf(NodeStatus::Pending),
        ]);
        assert_eq!(combined.total, 2);
        assert_eq!(combined.completed, 1);
        assert_eq!(combined.percent, 50);
    }

    #[test]
    fn counts_combine_of_empty_is_zero_percent() {
        let combined = Counts::combine(&[]);
        assert_eq!(combined.total, 0);
        assert_eq!(combined.percent, 0);
    }

    #[test]
    fn node_iter_visits_self_and_descendants() {
        let mut root = leaf("task-1-1", NodeStatus::Pending);
        root.node_type = NodeType::Group;
        root.children.push(leaf("task-1-1-1", NodeStatus::Completed));
        let ids: Vec<_> = root.iter().map(|n| n.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["task-1-1", "task-1-1-1"]);
    }
}
