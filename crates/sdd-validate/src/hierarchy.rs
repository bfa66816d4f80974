//! The `hierarchy` validator (spec.md §4.2): I1, I2, I3, plus structural
//! placement rules (verify attachment, max depth, verify/task ordering).

use std::collections::{HashMap, HashSet};

use sdd_model::{Document, Node, NodeId, NodeType};

use crate::issue::Issue;

const MAX_DEPTH: usize = 6;

pub fn validate(doc: &Document) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut seen_ids: HashMap<&str, usize> = HashMap::new();
    let all_ids: HashSet<&NodeId> = doc.iter_nodes().map(|n| &n.id).collect();

    for phase in &doc.hierarchy {
        walk(phase, None, 1, &mut seen_ids, &all_ids, &mut issues);
    }

    if let Some(cycle) = find_cycle(doc) {
        issues.push(Issue::error(
            "hierarchy.cycle",
            cycle.join(" -> "),
            "hard-dependency graph contains a cycle",
        ));
    }

    issues
}

fn walk<'a>(
    node: &'a Node,
    parent_type: Option<NodeType>,
    depth: usize,
    seen_ids: &mut HashMap<&'a str, usize>,
    all_ids: &HashSet<&'a NodeId>,
    issues: &mut Vec<Issue>,
) {
    // I1: shape matches declared type, and document-unique.
    if !node.id.matches_type(node.node_type) {
        issues.push(Issue::error(
            "hierarchy.id_shape_mismatch",
            node.id.as_str(),
            format!("id does not match declared type {:?}", node.node_type),
        ));
    }
    let occurrences = seen_ids.entry(node.id.as_str()).or_insert(0);
    *occurrences += 1;
    if *occurrences > 1 {
        issues.push(Issue::error(
            "hierarchy.duplicate_id",
            node.id.as_str(),
            "node id is not unique document-wide",
        ));
    }

    if depth > MAX_DEPTH {
        issues.push(Issue::error(
            "hierarchy.max_depth_exceeded",
            node.id.as_str(),
            format!("node exceeds maximum depth of {MAX_DEPTH}"),
        ));
    }

    // verify nodes attach to tasks or phases, not groups.
    if node.node_type == NodeType::Verify && parent_type == Some(NodeType::Group) {
        issues.push(Issue::error(
            "hierarchy.verify_under_group",
            node.id.as_str(),
            "verify nodes must attach to a task or phase, not a group",
        ));
    }

    // I2: every referenced dependency ID resolves.
    for dep in node.dependencies.blocked_by.iter().chain(node.dependencies.soft_depends.iter()) {
        if !all_ids.contains(dep) {
            issues.push(Issue::error(
                "hierarchy.orphan_dependency",
                node.id.as_str(),
                format!("dependency '{dep}' does not exist in this document"),
            ));
        }
    }

    check_verify_tail_segment(node, issues);

    for child in &node.children {
        walk(child, Some(node.node_type), depth + 1, seen_ids, all_ids, issues);
    }
}

/// `verify` children may only appear as a trailing run among a node's
/// children, never interleaved with `task` children.
fn check_verify_tail_segment(node: &Node, issues: &mut Vec<Issue>) {
    let mut seen_verify = false;
    for child in &node.children {
        match child.node_type {
            NodeType::Verify => seen_verify = true,
            NodeType::Task if seen_verify => {
                issues.push(Issue::error(
                    "hierarchy.verify_not_trailing",
                    node.id.as_str(),
                    "verify children must form a trailing segment, not be interleaved with tasks",
                ));
                break;
            }
            _ => {}
        }
    }
}

/// I3: the hard-dependency graph (`blocked_by` edges) is a DAG.
fn find_cycle(doc: &Document) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let nodes: HashMap<&str, &Node> = doc.iter_nodes().map(|n| (n.id.as_str(), n)).collect();

    fn visit<'a>(
        id: &'a str,
        nodes: &HashMap<&'a str, &'a Node>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        if let Some(Mark::Done) = marks.get(id) {
            return None;
        }
        if stack.contains(&id) {
            let start = stack.iter().position(|x| *x == id).unwrap();
            let mut cycle: Vec<String> = stack[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(id.to_string());
            return Some(cycle);
        }
        stack.push(id);
        marks.insert(id, Mark::Visiting);
        if let Some(node) = nodes.get(id) {
            for dep in &node.dependencies.blocked_by {
                if let Some(cycle) = visit(dep.as_str(), nodes, marks, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.pop();
        marks.insert(id, Mark::Done);
        None
    }

    let mut stack = Vec::new();
    for id in nodes.keys() {
        if let Some(cycle) = visit(id, &nodes, &mut marks, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

/// The ancestor a node's own ID shape implies, independent of where it
/// is currently nested (e.g. `task-2-3` implies `group-2-3` if one
/// exists, else `phase-2`).
fn expected_parent_id(id: &NodeId, all_ids: &HashSet<&NodeId>) -> Option<NodeId> {
    let parts: Vec<&str> = id.as_str().split('-').collect();
    match parts.as_slice() {
        ["group", n, _] => Some(NodeId::phase(n.parse().ok()?)),
        [kind, n, m] | [kind, n, m, _] if *kind == "task" || *kind == "verify" => {
            let group_id = NodeId::group(n.parse().ok()?, m.parse().ok()?);
            if all_ids.contains(&group_id) {
                Some(group_id)
            } else {
                Some(NodeId::phase(n.parse().ok()?))
            }
        }
        _ => None,
    }
}

/// `hierarchy.reparent`: detach any node whose current nesting doesn't
/// match the ancestor implied by its own ID, and reattach it under that
/// ancestor if one exists in the document. Always returns the warnings
/// describing what moved (or would move); only mutates `doc.hierarchy`
/// when `apply` is true, per the CLI's `fix --apply` gate.
pub fn reparent(doc: &mut Document, apply: bool) -> Vec<Issue> {
    let all_ids: HashSet<NodeId> = doc.iter_nodes().map(|n| n.id.clone()).collect();
    let all_ids_ref: HashSet<&NodeId> = all_ids.iter().collect();

    let mut misplaced = Vec::new();
    collect_misplaced(&doc.hierarchy, None, &all_ids_ref, &mut misplaced);

    let mut issues = Vec::new();
    for (node_id, expected) in &misplaced {
        issues.push(Issue::warning(
            "hierarchy.reparent",
            node_id.as_str(),
            format!("node should be reparented under '{expected}'"),
        ));
    }

    if apply {
        for (node_id, expected) in misplaced {
            if let Some(detached) = detach(&mut doc.hierarchy, &node_id) {
                attach(&mut doc.hierarchy, &expected, detached);
            }
        }
    }
    issues
}

fn collect_misplaced(
    nodes: &[Node],
    actual_parent_id: Option<&NodeId>,
    all_ids: &HashSet<&NodeId>,
    out: &mut Vec<(NodeId, NodeId)>,
) {
    for node in nodes {
        if let Some(expected) = expected_parent_id(&node.id, all_ids) {
            if Some(&expected) != actual_parent_id && all_ids.contains(&expected) {
                out.push((node.id.clone(), expected));
            }
        }
        collect_misplaced(&node.children, Some(&node.id), all_ids, out);
    }
}

fn detach(nodes: &mut Vec<Node>, target: &NodeId) -> Option<Node> {
    if let Some(pos) = nodes.iter().position(|n| &n.id == target) {
        return Some(nodes.remove(pos));
    }
    for node in nodes.iter_mut() {
        if let Some(found) = detach(&mut node.children, target) {
            return Some(found);
        }
    }
    None
}

fn attach(nodes: &mut Vec<Node>, parent: &NodeId, child: Node) -> bool {
    for node in nodes.iter_mut() {
        if &node.id == parent {
            node.children.push(child);
            return true;
        }
        if attach(&mut node.children, parent, child.clone()) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdd_model::{Counts, Dependencies, NodeMetadata, NodeStatus};
    use std::collections::BTreeSet;

    fn task(id: &str, blocked_by: &[&str]) -> Node {
        Node {
            id: NodeId::from(id),
            node_type: NodeType::Task,
            title: id.to_string(),
            description: None,
            status: NodeStatus::Pending,
            metadata: NodeMetadata::default(),
            children: Vec::new(),
            dependencies: Dependencies {
                blocked_by: blocked_by.iter().map(|s| NodeId::from(*s)).collect::<BTreeSet<_>>(),
                soft_depends: BTreeSet::new(),
            },
            counts: Counts::leaf(NodeStatus::Pending),
        }
    }

    fn phase_with(children: Vec<Node>) -> Node {
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
    fn orphan_dependency_is_an_error() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase_with(vec![task("task-1-1", &["task-9-9"])]));
        let issues = validate(&doc);
        assert!(issues.iter().any(|i| i.code == "hierarchy.orphan_dependency"));
    }

    #[test]
    fn self_referencing_dependency_is_a_cycle() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase_with(vec![
            task("task-1-1", &["task-1-2"]),
            task("task-1-2", &["task-1-1"]),
        ]));
        let issues = validate(&doc);
        assert!(issues.iter().any(|i| i.code == "hierarchy.cycle"));
    }

    #[test]
    fn acyclic_dependencies_report_no_cycle() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase_with(vec![task("task-1-1", &[]), task("task-1-2", &["task-1-1"])]));
        let issues = validate(&doc);
        assert!(!issues.iter().any(|i| i.code == "hierarchy.cycle"));
    }
}
