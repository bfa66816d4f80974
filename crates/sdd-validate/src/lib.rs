//! C2 Spec Model & Invariants (spec.md §4.2): validators that check the
//! in-memory `Document` tree against I1–I10, plus idempotent auto-fixers
//! applied only when a C7 preview requests them.

pub mod counts;
pub mod hierarchy;
pub mod issue;
pub mod metadata;
pub mod structural;
pub mod status;

pub use issue::{has_errors, Issue};

use sdd_model::Document;

/// Run every validator and return the combined issue list. Order:
/// structural, hierarchy, counts, metadata (matches spec.md §4.2).
#[must_use]
pub fn validate(doc: &Document) -> Vec<Issue> {
    let mut issues = structural::validate(doc);
    issues.extend(hierarchy::validate(doc));
    issues.extend(counts::validate(doc));
    issues.extend(metadata::validate(doc));
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_freshly_created_empty_document_has_no_issues() {
        let doc = Document::new("demo-001");
        assert!(validate(&doc).is_empty());
    }
}
