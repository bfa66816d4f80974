//! `create_spec`'s `template` parameter (spec.md §4.7, scenario S1): a
//! lightweight `"<phases>x<tasks_per_phase>"` shorthand (e.g. `"2x3"`)
//! that generates an empty hierarchy with no dependencies between
//! tasks. Anything else (including `"blank"` or an unparseable string)
//! produces a document with no hierarchy at all, matching `create_spec`
//! with no template.

use sdd_model::{Counts, Dependencies, Node, NodeId, NodeMetadata, NodeStatus, NodeType};

/// Build the hierarchy described by `template`, or an empty vec if the
/// template is `"blank"`/unrecognized.
#[must_use]
pub fn build_hierarchy(template: &str) -> Vec<Node> {
    let Some((phases, tasks_per_phase)) = parse(template) else {
        return Vec::new();
    };

    (1..=phases)
        .map(|phase_n| {
            let children = (1..=tasks_per_phase)
                .map(|task_n| new_task(NodeId::task(phase_n, task_n, None), format!("Task {phase_n}.{task_n}")))
                .collect();
            new_phase(NodeId::phase(phase_n), format!("Phase {phase_n}"), children)
        })
        .collect()
}

fn parse(template: &str) -> Option<(u32, u32)> {
    let (phases, tasks) = template.split_once('x')?;
    Some((phases.trim().parse().ok()?, tasks.trim().parse().ok()?))
}

fn new_task(id: NodeId, title: String) -> Node {
    Node {
        id,
        node_type: NodeType::Task,
        title,
        description: None,
        status: NodeStatus::Pending,
        metadata: NodeMetadata::default(),
        children: Vec::new(),
        dependencies: Dependencies::default(),
        counts: Counts::leaf(NodeStatus::Pending),
    }
}

fn new_phase(id: NodeId, title: String, children: Vec<Node>) -> Node {
    let counts = Counts::combine(&children.iter().map(|c| c.counts).collect::<Vec<_>>());
    Node {
        id,
        node_type: NodeType::Phase,
        title,
        description: None,
        status: NodeStatus::Pending,
        metadata: NodeMetadata::default(),
        children,
        dependencies: Dependencies::default(),
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_by_three_builds_two_phases_of_three_tasks() {
        let hierarchy = build_hierarchy("2x3");
        assert_eq!(hierarchy.len(), 2);
        assert_eq!(hierarchy[0].children.len(), 3);
        assert_eq!(hierarchy[1].children[2].id, NodeId::task(2, 3, None));
    }

    #[test]
    fn blank_template_produces_no_hierarchy() {
        assert!(build_hierarchy("blank").is_empty());
        assert!(build_hierarchy("not-a-template").is_empty());
    }
}
