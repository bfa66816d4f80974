//! The `structural` validator (spec.md §4.2): schema shape, enum values,
//! required fields. Most of this is enforced by `serde` at parse time
//! already; what's left is checks serde can't express as a type.

use sdd_model::{Document, Node, NodeType};

use crate::issue::Issue;

pub fn validate(doc: &Document) -> Vec<Issue> {
    let mut issues = Vec::new();
    if doc.spec_id.trim().is_empty() {
        issues.push(Issue::error("structural.empty_spec_id", "spec_id", "spec_id must not be empty"));
    }
    if doc.spec_id != doc.spec_id.to_lowercase() {
        issues.push(Issue::error(
            "structural.spec_id_casing",
            "spec_id",
            "spec_id must be lowercase kebab-case",
        ));
    }
    for phase in &doc.hierarchy {
        validate_node(phase, &mut issues);
    }
    issues
}

fn validate_node(node: &Node, issues: &mut Vec<Issue>) {
    if node.title.trim().is_empty() {
        issues.push(Issue::error(
            "structural.empty_title",
            node.id.as_str(),
            "node title must not be empty",
        ));
    }
    if node.node_type == NodeType::Phase && node.children.is_empty() {
        issues.push(Issue::warning(
            "structural.empty_phase",
            node.id.as_str(),
            "phase has no children",
        ));
    }
    for child in &node.children {
        validate_node(child, issues);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdd_model::Document;

    #[test]
    fn empty_spec_id_is_an_error() {
        let doc = Document::new("");
        let issues = validate(&doc);
        assert!(issues.iter().any(|i| i.code == "structural.empty_spec_id"));
    }

    #[test]
    fn uppercase_spec_id_is_an_error() {
        let doc = Document::new("Demo-001");
        let issues = validate(&doc);
        assert!(issues.iter().any(|i| i.code == "structural.spec_id_casing"));
    }
}
