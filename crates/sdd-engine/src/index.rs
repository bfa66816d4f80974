//! An index over a `Document`'s tree, built once per transaction, so C3
//! and C5 never re-scan the whole document to find a node or its
//! ancestors (spec.md §9: "build an in-memory tree with explicit parent
//! references ... so §4.3 and §4.5 do not repeatedly re-scan").
//!
//! `sdd-model` keeps a plain nested `Vec<Node>` tree (serde-friendly, no
//! parent pointers); this index layers a `NodeId -> path` arena on top,
//! where a path is the sequence of child indices from the document root
//! down to the node. Ancestor walks become O(depth) slice truncations
//! instead of document re-scans.

use std::collections::HashMap;

use sdd_model::{Document, Node, NodeId};

#[derive(Debug, Default)]
pub struct Index {
    paths: HashMap<NodeId, Vec<usize>>,
}

impl Index {
    #[must_use]
    pub fn build(doc: &Document) -> Self {
        let mut paths = HashMap::new();
        for (i, phase) in doc.hierarchy.iter().enumerate() {
            index_node(phase, vec![i], &mut paths);
        }
        Index { paths }
    }

    #[must_use]
    pub fn path_of(&self, id: &NodeId) -> Option<&[usize]> {
        self.paths.get(id).map(Vec::as_slice)
    }

    /// Paths of every strict ancestor of `id`, ordered nearest-parent
    /// first (index 0 is the immediate parent, last is the root phase).
    #[must_use]
    pub fn ancestor_paths(&self, id: &NodeId) -> Vec<Vec<usize>> {
        let Some(path) = self.path_of(id) else { return Vec::new() };
        let mut out = Vec::new();
        let mut len = path.len().saturating_sub(1);
        while len > 0 {
            out.push(path[..len].to_vec());
            len -= 1;
        }
        out
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.paths.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.paths.keys()
    }
}

fn index_node(node: &Node, path: Vec<usize>, paths: &mut HashMap<NodeId, Vec<usize>>) {
    paths.insert(node.id.clone(), path.clone());
    for (i, child) in node.children.iter().enumerate() {
        let mut child_path = path.clone();
        child_path.push(i);
        index_node(child, child_path, paths);
    }
}

/// Get an immutable reference to the node at `path` within `doc`.
#[must_use]
pub fn node_at<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a Node> {
    let (&first, rest) = path.split_first()?;
    let mut node = doc.hierarchy.get(first)?;
    for &i in rest {
        node = node.children.get(i)?;
    }
    Some(node)
}

/// Get a mutable reference to the node at `path` within `doc`.
pub fn node_at_mut<'a>(doc: &'a mut Document, path: &[usize]) -> Option<&'a mut Node> {
    let (&first, rest) = path.split_first()?;
    let mut node = doc.hierarchy.get_mut(first)?;
    for &i in rest {
        node = node.children.get_mut(i)?;
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdd_model::{Counts, Dependencies, NodeMetadata, NodeStatus, NodeType};

    fn leaf(id: &str) -> Node {
        Node {
            id: NodeId::from(id),
            node_type: NodeType::Task,
            title: id.to_string(),
            description: None,
            status: NodeStatus::Pending,
            metadata: NodeMetadata::default(),
            children: Vec::new(),
            dependencies: Dependencies::default(),
            counts: Counts::default(),
        }
    }

    fn sample_doc() -> Document {
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
        phase.children.push(leaf("task-1-1"));
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase);
        doc
    }

    #[test]
    fn path_of_resolves_a_nested_leaf() {
        let doc = sample_doc();
        let index = Index::build(&doc);
        assert_eq!(index.path_of(&NodeId::task(1, 1, None)), Some([0usize, 0].as_slice()));
    }

    #[test]
    fn ancestor_paths_includes_only_the_phase() {
        let doc = sample_doc();
        let index = Index::build(&doc);
        let ancestors = index.ancestor_paths(&NodeId::task(1, 1, None));
        assert_eq!(ancestors, vec![vec![0]]);
    }

    #[test]
    fn node_at_resolves_and_node_at_mut_can_write() {
        let mut doc = sample_doc();
        let path = vec![0, 0];
        assert_eq!(node_at(&doc, &path).unwrap().id, NodeId::task(1, 1, None));
        node_at_mut(&mut doc, &path).unwrap().status = NodeStatus::Completed;
        assert_eq!(node_at(&doc, &path).unwrap().status, NodeStatus::Completed);
    }
}
