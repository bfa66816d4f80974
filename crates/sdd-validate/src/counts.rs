//! The `counts` validator and its `counts.recalculate` auto-fixer
//! (spec.md §4.2, I7).

use sdd_model::{Counts, Document, Node};

use crate::issue::Issue;

pub fn validate(doc: &Document) -> Vec<Issue> {
    let mut issues = Vec::new();
    for phase in &doc.hierarchy {
        check_node(phase, &mut issues);
    }
    let expected = recompute_document_counts(doc);
    if expected != doc.counts {
        issues.push(
            Issue::warning(
                "counts.document_mismatch",
                "<document>",
                "document-level counts do not match the bottom-up aggregation",
            )
            .fixable(),
        );
    }
    issues
}

fn check_node(node: &Node, issues: &mut Vec<Issue>) {
    if !node.is_leaf() {
        let expected = recompute_node_counts(node);
        if expected != node.counts {
            issues.push(
                Issue::warning(
                    "counts.node_mismatch",
                    node.id.as_str(),
                    "stored counts do not match the bottom-up aggregation of descendants",
                )
                .fixable(),
            );
        }
    }
    for child in &node.children {
        check_node(child, issues);
    }
}

fn recompute_node_counts(node: &Node) -> Counts {
    if node.is_leaf() {
        return Counts::leaf(node.status);
    }
    let child_counts: Vec<Counts> = node.children.iter().map(recompute_node_counts).collect();
    Counts::combine(&child_counts)
}

fn recompute_document_counts(doc: &Document) -> Counts {
    let child_counts: Vec<Counts> = doc.hierarchy.iter().map(recompute_node_counts).collect();
    Counts::combine(&child_counts)
}

/// `counts.recalculate`: regenerate every node's `counts` bottom-up, then
/// the document's. Idempotent: a second call is a no-op.
pub fn recalculate(doc: &mut Document) {
    fn fix_node(node: &mut Node) -> Counts {
        if node.is_leaf() {
            let counts = Counts::leaf(node.status);
            node.counts = counts;
            return counts;
        }
        let child_counts: Vec<Counts> = node.children.iter_mut().map(fix_node).collect();
        let combined = Counts::combine(&child_counts);
        node.counts = combined;
        combined
    }

    let child_counts: Vec<Counts> = doc.hierarchy.iter_mut().map(fix_node).collect();
    doc.counts = Counts::combine(&child_counts);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdd_model::{Dependencies, NodeId, NodeMetadata, NodeStatus, NodeType};

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
            counts: Counts::default(), // deliberately wrong/stale
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
    fn stale_counts_are_flagged_as_fixable() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase(vec![leaf("task-1-1", NodeStatus::Completed)]));
        let issues = validate(&doc);
        assert!(issues.iter().any(|i| i.code == "counts.node_mismatch" && i.auto_fixable));
    }

    #[test]
    fn recalculate_fixes_mismatches_and_is_idempotent() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(phase(vec![
            leaf("task-1-1", NodeStatus::Completed),
            leaf("task-1-2", NodeStatus::Pending),
        ]));

        recalculate(&mut doc);
        assert!(validate(&doc).is_empty());

        let before = doc.clone();
        recalculate(&mut doc);
        assert_eq!(doc, before);
    }
}
