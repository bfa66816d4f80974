//! C5 Task Scheduler (spec.md §4.5): deterministic "next actionable
//! task" selection.

use sdd_model::{Document, Node, NodeId, NodeStatus, NodeType, TaskCategory};

use crate::graph::Graph;
use crate::index::Index;

#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    pub phase_id: Option<u32>,
    pub task_category: Option<TaskCategory>,
    pub skill: Option<String>,
}

impl TaskFilters {
    fn any_set(&self) -> bool {
        self.phase_id.is_some() || self.task_category.is_some() || self.skill.is_some()
    }

    fn matches(&self, node: &Node) -> bool {
        if let Some(phase_id) = self.phase_id {
            if node.id.phase_number() != Some(phase_id) {
                return false;
            }
        }
        if let Some(category) = self.task_category {
            if node.metadata.task_category != Some(category) {
                return false;
            }
        }
        if let Some(skill) = &self.skill {
            if node.metadata.skill.as_deref() != Some(skill.as_str()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerOutcome {
    Next { task_id: NodeId, rationale: &'static str },
    SpecComplete,
    AllBlocked { count_blocked: usize, count_in_progress: usize },
    NothingMatches,
}

struct Candidate<'a> {
    node: &'a Node,
    has_in_progress_sibling: bool,
    completed_soft_depends: usize,
}

/// Select the single most appropriate next leaf to act on, per the
/// deterministic tie-break in spec.md §4.5.
#[must_use]
pub fn next_task(doc: &Document, filters: &TaskFilters) -> SchedulerOutcome {
    let index = Index::build(doc);
    let graph = Graph::build(doc, &index);

    let leaves: Vec<&Node> = doc.iter_nodes().filter(|n| n.is_leaf()).collect();

    if leaves.is_empty() {
        return SchedulerOutcome::SpecComplete;
    }
    if leaves.iter().all(|n| n.status == NodeStatus::Completed) {
        return SchedulerOutcome::SpecComplete;
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for leaf in &leaves {
        if leaf.status != NodeStatus::Pending || !graph.is_ready(&leaf.id) {
            continue;
        }
        // Exclude verify leaves unless their associated task is completed.
        if leaf.node_type == NodeType::Verify && !associated_task_completed(doc, &index, leaf) {
            continue;
        }
        if !filters.matches(leaf) {
            continue;
        }
        candidates.push(Candidate {
            node: leaf,
            has_in_progress_sibling: sibling_in_progress(doc, &index, &leaf.id),
            completed_soft_depends: leaf
                .dependencies
                .soft_depends
                .iter()
                .filter(|d| doc.find_node(d).map(|n| n.status) == Some(NodeStatus::Completed))
                .count(),
        });
    }

    if candidates.is_empty() {
        if filters.any_set() {
            return SchedulerOutcome::NothingMatches;
        }
        let count_blocked = leaves.iter().filter(|n| n.status == NodeStatus::Blocked).count();
        let count_in_progress = leaves.iter().filter(|n| n.status == NodeStatus::InProgress).count();
        return SchedulerOutcome::AllBlocked { count_blocked, count_in_progress };
    }

    candidates.sort_by(|a, b| {
        let phase_a = a.node.id.phase_number().unwrap_or(u32::MAX);
        let phase_b = b.node.id.phase_number().unwrap_or(u32::MAX);
        phase_a
            .cmp(&phase_b)
            .then(b.has_in_progress_sibling.cmp(&a.has_in_progress_sibling))
            .then(a.completed_soft_depends.cmp(&b.completed_soft_depends).reverse())
            .then(a.node.id.cmp(&b.node.id))
    });

    let winner = &candidates[0];
    let rationale = if candidates.iter().filter(|c| c.node.id.phase_number() == winner.node.id.phase_number()).count() == 1 {
        "lowest-phase"
    } else if winner.has_in_progress_sibling {
        "active-sibling"
    } else if winner.completed_soft_depends > 0 {
        "continuation"
    } else {
        "lexicographic"
    };

    SchedulerOutcome::Next {
        task_id: winner.node.id.clone(),
        rationale,
    }
}

fn sibling_in_progress(doc: &Document, index: &Index, leaf_id: &NodeId) -> bool {
    let Some(path) = index.path_of(leaf_id) else { return false };
    let Some((&_last, parent_path)) = path.split_last() else { return false };
    let Some(parent) = (if parent_path.is_empty() {
        None
    } else {
        crate::index::node_at(doc, parent_path)
    }) else {
        return doc
            .hierarchy
            .iter()
            .any(|n| &n.id != leaf_id && n.status == NodeStatus::InProgress);
    };
    parent.children.iter().any(|c| &c.id != leaf_id && c.status == NodeStatus::InProgress)
}

/// A `verify` leaf's associated task is its nearest task-typed ancestor
/// or, lacking one, its preceding task sibling.
fn associated_task_completed(doc: &Document, index: &Index, verify: &Node) -> bool {
    for path in index.ancestor_paths(&verify.id) {
        if let Some(ancestor) = crate::index::node_at(doc, &path) {
            if ancestor.node_type == NodeType::Task {
                return ancestor.status == NodeStatus::Completed;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdd_model::{Counts, Dependencies, NodeMetadata};

    fn task(id: &str, status: NodeStatus) -> Node {
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

    fn phase(n: u32, children: Vec<Node>) -> Node {
        Node {
            id: NodeId::phase(n),
            node_type: NodeType::Phase,
            title: format!("Phase {n}"),
            description: None,
            status: NodeStatus::Pending,
            metadata: NodeMetadata::default(),
            children,
            dependencies: Dependencies::default(),
            counts: Counts::default(),
        }
    }

    #[test]
    fn picks_the_lowest_numbered_phase_first() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase(2, vec![task("task-2-1", NodeStatus::Pending)]));
        doc.hierarchy.push(phase(1, vec![task("task-1-1", NodeStatus::Pending)]));

        let outcome = next_task(&doc, &TaskFilters::default());
        assert_eq!(
            outcome,
            SchedulerOutcome::Next {
                task_id: NodeId::task(1, 1, None),
                rationale: "lowest-phase",
            }
        );
    }

    #[test]
    fn returns_spec_complete_when_every_leaf_is_done() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase(1, vec![task("task-1-1", NodeStatus::Completed)]));
        assert_eq!(next_task(&doc, &TaskFilters::default()), SchedulerOutcome::SpecComplete);
    }

    #[test]
    fn returns_all_blocked_when_nothing_ready_but_not_done() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase(1, vec![task("task-1-1", NodeStatus::Blocked)]));
        assert_eq!(
            next_task(&doc, &TaskFilters::default()),
            SchedulerOutcome::AllBlocked { count_blocked: 1, count_in_progress: 0 }
        );
    }

    #[test]
    fn filters_excluding_everything_yield_nothing_matches() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase(1, vec![task("task-1-1", NodeStatus::Pending)]));
        let filters = TaskFilters {
            phase_id: Some(9),
            ..TaskFilters::default()
        };
        assert_eq!(next_task(&doc, &filters), SchedulerOutcome::NothingMatches);
    }
}
