//! `query_tasks`, `get_task`, `task_info` (spec.md §4.9).

use sdd_engine::{Blocker, Graph, Index};
use sdd_model::{
    Document, JournalEntry, Node, NodeId, NodeStatus, NodeType, TaskCategory, VerificationResult,
};
use sdd_utils::{SddError, SddResult};
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<NodeStatus>,
    pub node_type: Option<NodeType>,
    pub parent: Option<NodeId>,
    pub skill: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    pub id: NodeId,
    pub node_type: NodeType,
    pub title: String,
    pub status: NodeStatus,
    pub skill: Option<String>,
    pub task_category: Option<TaskCategory>,
}

impl TaskView {
    fn from_node(node: &Node) -> Self {
        TaskView {
            id: node.id.clone(),
            node_type: node.node_type,
            title: node.title.clone(),
            status: node.status,
            skill: node.metadata.skill.clone(),
            task_category: node.metadata.task_category,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskInfo {
    pub task: TaskView,
    pub blockers: Vec<Blocker>,
    pub dependents: Vec<NodeId>,
    pub soft_depends: Vec<NodeId>,
    pub verification_result: Option<VerificationResult>,
    pub journal_entries: Vec<JournalEntry>,
}

/// Depth-first walk pairing every node with its immediate parent's ID
/// (`None` for the top-level phases), so `parent` filtering doesn't need
/// `sdd-engine`'s index for a query this simple.
fn collect_with_parent<'a>(nodes: &'a [Node], parent: Option<&'a NodeId>, out: &mut Vec<(&'a Node, Option<&'a NodeId>)>) {
    for node in nodes {
        out.push((node, parent));
        collect_with_parent(&node.children, Some(&node.id), out);
    }
}

#[must_use]
pub fn query_tasks(doc: &Document, filter: &TaskFilter) -> Vec<TaskView> {
    let mut pairs = Vec::new();
    collect_with_parent(&doc.hierarchy, None, &mut pairs);

    pairs
        .into_iter()
        .filter(|(node, _)| filter.status.is_none_or(|s| node.status == s))
        .filter(|(node, _)| filter.node_type.is_none_or(|t| node.node_type == t))
        .filter(|(node, _)| filter.skill.as_deref().is_none_or(|s| node.metadata.skill.as_deref() == Some(s)))
        .filter(|(_, parent)| {
            filter.parent.as_ref().is_none_or(|want| parent.is_some_and(|p| p == want))
        })
        .map(|(node, _)| TaskView::from_node(node))
        .collect()
}

pub fn get_task(doc: &Document, id: &NodeId) -> SddResult<TaskView> {
    doc.find_node(id)
        .map(TaskView::from_node)
        .ok_or_else(|| SddError::NotFound(id.as_str().to_string()))
}

pub fn task_info(doc: &Document, id: &NodeId) -> SddResult<TaskInfo> {
    let node = doc.find_node(id).ok_or_else(|| SddError::NotFound(id.as_str().to_string()))?;
    let index = Index::build(doc);
    let graph = Graph::build(doc, &index);

    let dependents = doc
        .iter_nodes()
        .filter(|n| n.dependencies.blocked_by.contains(id))
        .map(|n| n.id.clone())
        .collect();

    let journal_entries = doc
        .journal
        .iter()
        .filter(|e| e.task_id.as_ref() == Some(id))
        .cloned()
        .collect();

    Ok(TaskInfo {
        task: TaskView::from_node(node),
        blockers: graph.blockers_of(id),
        dependents,
        soft_depends: node.dependencies.soft_depends.iter().cloned().collect(),
        verification_result: node.metadata.verification_result.clone(),
        journal_entries,
    })
}
