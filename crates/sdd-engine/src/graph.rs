//! C4 Dependency Graph (spec.md §4.4): hard/soft dependency resolution,
//! cycle & orphan detection, readiness queries.
//!
//! Adjacency is built lazily from the [`Index`] and memoized on the
//! `Graph` value itself; callers rebuild a `Graph` when the document's
//! modification counter advances (spec.md: "memoized per document
//! version").

use std::collections::{BTreeMap, BTreeSet, HashMap};

use sdd_model::{Document, NodeId, NodeStatus};
use serde::Serialize;

use crate::index::Index;

pub struct Graph<'a> {
    doc: &'a Document,
    index: &'a Index,
    hard: HashMap<NodeId, BTreeSet<NodeId>>,
    soft: HashMap<NodeId, BTreeSet<NodeId>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blocker {
    pub node_id: NodeId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Orphan {
    pub node_id: NodeId,
    pub missing_ref: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bottleneck {
    pub node_id: NodeId,
    pub fanout: usize,
}

impl<'a> Graph<'a> {
    #[must_use]
    pub fn build(doc: &'a Document, index: &'a Index) -> Self {
        let mut hard = HashMap::new();
        let mut soft = HashMap::new();
        for node in doc.iter_nodes() {
            hard.insert(node.id.clone(), node.dependencies.blocked_by.clone());
            soft.insert(node.id.clone(), node.dependencies.soft_depends.clone());
        }
        Graph { doc, index, hard, soft }
    }

    fn status_of(&self, id: &NodeId) -> Option<NodeStatus> {
        let path = self.index.path_of(id)?;
        crate::index::node_at(self.doc, path).map(|n| n.status)
    }

    fn nearest_blocked_ancestor(&self, id: &NodeId) -> Option<NodeId> {
        for path in self.index.ancestor_paths(id) {
            if let Some(node) = crate::index::node_at(self.doc, &path) {
                if node.status == NodeStatus::Blocked {
                    return Some(node.id.clone());
                }
            }
        }
        None
    }

    /// `pending`, all hard deps resolved to `completed`, no ancestor
    /// `blocked`.
    #[must_use]
    pub fn is_ready(&self, id: &NodeId) -> bool {
        let Some(status) = self.status_of(id) else { return false };
        if status != NodeStatus::Pending {
            return false;
        }
        let all_hard_complete = self
            .hard
            .get(id)
            .is_none_or(|deps| deps.iter().all(|d| self.status_of(d) == Some(NodeStatus::Completed)));
        all_hard_complete && self.nearest_blocked_ancestor(id).is_none()
    }

    #[must_use]
    pub fn blockers_of(&self, id: &NodeId) -> Vec<Blocker> {
        let mut out = Vec::new();
        if let Some(deps) = self.hard.get(id) {
            for dep in deps {
                if self.status_of(dep) != Some(NodeStatus::Completed) {
                    out.push(Blocker {
                        node_id: dep.clone(),
                        reason: "hard dependency not completed".to_string(),
                    });
                }
            }
        }
        if let Some(ancestor) = self.nearest_blocked_ancestor(id) {
            out.push(Blocker {
                node_id: ancestor,
                reason: "nearest blocked ancestor".to_string(),
            });
        }
        out
    }

    #[must_use]
    pub fn orphans(&self) -> Vec<Orphan> {
        let mut out = Vec::new();
        for (id, deps) in self.hard.iter().chain(self.soft.iter()) {
            for dep in deps {
                if !self.index.contains(dep) {
                    out.push(Orphan {
                        node_id: id.clone(),
                        missing_ref: dep.clone(),
                    });
                }
            }
        }
        out.sort_by(|a, b| a.node_id.cmp(&b.node_id).then(a.missing_ref.cmp(&b.missing_ref)));
        out
    }

    /// Reverse-hard-indegree (how many nodes name this one as a hard
    /// dependency) exceeding `threshold`.
    #[must_use]
    pub fn bottlenecks(&self, threshold: usize) -> Vec<Bottleneck> {
        let mut indegree: BTreeMap<NodeId, usize> = BTreeMap::new();
        for deps in self.hard.values() {
            for dep in deps {
                *indegree.entry(dep.clone()).or_insert(0) += 1;
            }
        }
        let mut out: Vec<Bottleneck> = indegree
            .into_iter()
            .filter(|(_, fanout)| *fanout > threshold)
            .map(|(node_id, fanout)| Bottleneck { node_id, fanout })
            .collect();
        out.sort_by(|a, b| b.fanout.cmp(&a.fanout).then(a.node_id.cmp(&b.node_id)));
        out
    }

    /// Tarjan's SCC over the hard-dependency graph; components of size
    /// >= 2 and self-loops, ordered by their smallest contained ID.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<NodeId>> {
        let mut tarjan = Tarjan::new(&self.hard);
        for id in self.hard.keys() {
            if !tarjan.indices.contains_key(id) {
                tarjan.strongconnect(id);
            }
        }
        let mut components: Vec<Vec<NodeId>> = tarjan
            .components
            .into_iter()
            .filter(|c| c.len() >= 2 || (c.len() == 1 && self.hard.get(&c[0]).is_some_and(|d| d.contains(&c[0]))))
            .collect();
        for c in &mut components {
            c.sort();
        }
        components.sort_by(|a, b| a[0].cmp(&b[0]));
        components
    }
}

struct Tarjan<'a> {
    hard: &'a HashMap<NodeId, BTreeSet<NodeId>>,
    indices: HashMap<NodeId, usize>,
    lowlink: HashMap<NodeId, usize>,
    on_stack: HashMap<NodeId, bool>,
    stack: Vec<NodeId>,
    counter: usize,
    components: Vec<Vec<NodeId>>,
}

impl<'a> Tarjan<'a> {
    fn new(hard: &'a HashMap<NodeId, BTreeSet<NodeId>>) -> Self {
        Tarjan {
            hard,
            indices: HashMap::new(),
            lowlink: HashMap::new(),
            on_stack: HashMap::new(),
            stack: Vec::new(),
            counter: 0,
            components: Vec::new(),
        }
    }

    fn strongconnect(&mut self, v: &NodeId) {
        self.indices.insert(v.clone(), self.counter);
        self.lowlink.insert(v.clone(), self.counter);
        self.counter += 1;
        self.stack.push(v.clone());
        self.on_stack.insert(v.clone(), true);

        if let Some(successors) = self.hard.get(v).cloned() {
            for w in successors {
                if !self.indices.contains_key(&w) {
                    self.strongconnect(&w);
                    let w_low = self.lowlink[&w];
                    let v_low = self.lowlink[v];
                    self.lowlink.insert(v.clone(), v_low.min(w_low));
                } else if *self.on_stack.get(&w).unwrap_or(&false) {
                    let w_idx = self.indices[&w];
                    let v_low = self.lowlink[v];
                    self.lowlink.insert(v.clone(), v_low.min(w_idx));
                }
            }
        }

        if self.lowlink[v] == self.indices[v] {
            let mut component = Vec::new();
            loop {
                let w = self.stack.pop().expect("stack non-empty while closing a component");
                self.on_stack.insert(w.clone(), false);
                let done = w == *v;
                component.push(w);
                if done {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdd_model::{Counts, Dependencies, Node, NodeMetadata, NodeType};
    use std::collections::BTreeSet;

    fn task(id: &str, status: NodeStatus, blocked_by: &[&str]) -> Node {
        Node {
            id: NodeId::from(id),
            node_type: NodeType::Task,
            title: id.to_string(),
            description: None,
            status,
            metadata: NodeMetadata::default(),
            children: Vec::new(),
            dependencies: Dependencies {
                blocked_by: blocked_by.iter().map(|s| NodeId::from(*s)).collect::<BTreeSet<_>>(),
                soft_depends: BTreeSet::new(),
            },
            counts: Counts::leaf(status),
        }
    }

    fn phase(children: Vec<Node>) -> Node {
        Node {
            id: NodeId::phase(1),
            node_type: NodeType::Phase,
            title: "Phase".into(),
            description: None,
            status: NodeStatus::Pending,
            metadata: NodeMetadata::default(),
            children,
            dependencies: Dependencies::default(),
            counts: Counts::default(),
        }
    }

    #[test]
    fn is_ready_requires_hard_deps_completed() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase(vec![
            task("task-1-1", NodeStatus::Pending, &[]),
            task("task-1-2", NodeStatus::Pending, &["task-1-1"]),
        ]));
        let index = Index::build(&doc);
        let graph = Graph::build(&doc, &index);
        assert!(graph.is_ready(&NodeId::task(1, 1, None)));
        assert!(!graph.is_ready(&NodeId::task(1, 2, None)));
    }

    #[test]
    fn cycles_detects_a_two_node_cycle() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase(vec![
            task("task-1-1", NodeStatus::Pending, &["task-1-2"]),
            task("task-1-2", NodeStatus::Pending, &["task-1-1"]),
        ]));
        let index = Index::build(&doc);
        let graph = Graph::build(&doc, &index);
        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 2);
    }

    #[test]
    fn orphans_lists_missing_references() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase(vec![task("task-1-1", NodeStatus::Pending, &["task-9-9"])]));
        let index = Index::build(&doc);
        let graph = Graph::build(&doc, &index);
        let orphans = graph.orphans();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].missing_ref, NodeId::task(9, 9, None));
    }

    #[test]
    fn bottlenecks_reports_high_fanout_nodes() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase(vec![
            task("task-1-1", NodeStatus::Pending, &[]),
            task("task-1-2", NodeStatus::Pending, &["task-1-1"]),
            task("task-1-3", NodeStatus::Pending, &["task-1-1"]),
        ]));
        let index = Index::build(&doc);
        let graph = Graph::build(&doc, &index);
        let bottlenecks = graph.bottlenecks(1);
        assert_eq!(bottlenecks[0].node_id, NodeId::task(1, 1, None));
        assert_eq!(bottlenecks[0].fanout, 2);
    }
}
