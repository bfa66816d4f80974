//! Node IDs and their shapes (spec.md §3, invariant I1).
//!
//! Shapes: `phase-N`, `group-N-M`, `task-N-M[-K]`, `verify-N-M[-K]`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::node::NodeType;

static PHASE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^phase-(\d+)$").unwrap());
static GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^group-(\d+)-(\d+)$").unwrap());
static TASK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^task-(\d+)-(\d+)(?:-(\d+))?$").unwrap());
static VERIFY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^verify-(\d+)-(\d+)(?:-(\d+))?$").unwrap());

/// A document-unique, stable node identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        NodeId(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Does this ID's shape match its declared [`NodeType`] (I1)?
    #[must_use]
    pub fn matches_type(&self, node_type: NodeType) -> bool {
        match node_type {
            NodeType::Phase => PHASE_RE.is_match(&self.0),
            NodeType::Group => GROUP_RE.is_match(&self.0),
            NodeType::Task => TASK_RE.is_match(&self.0),
            NodeType::Verify => VERIFY_RE.is_match(&self.0),
        }
    }

    /// The enclosing phase number, used by the scheduler's primary
    /// tie-break (spec.md §4.5 rule a).
    #[must_use]
    pub fn phase_number(&self) -> Option<u32> {
        PHASE_RE
            .captures(&self.0)
            .or_else(|| GROUP_RE.captures(&self.0))
            .or_else(|| TASK_RE.captures(&self.0))
            .or_else(|| VERIFY_RE.captures(&self.0))
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Construct a child task/verify ID under `group-N-M` as `task-N-M` or,
    /// with `seq`, `task-N-M-K`.
    #[must_use]
    pub fn task(n: u32, m: u32, seq: Option<u32>) -> Self {
        match seq {
            Some(k) => NodeId(format!("task-{n}-{m}-{k}")),
            None => NodeId(format!("task-{n}-{m}")),
        }
    }

    #[must_use]
    pub fn verify(n: u32, m: u32, seq: Option<u32>) -> Self {
        match seq {
            Some(k) => NodeId(format!("verify-{n}-{m}-{k}")),
            None => NodeId(format!("verify-{n}-{m}")),
        }
    }

    #[must_use]
    pub fn group(n: u32, m: u32) -> Self {
        NodeId(format!("group-{n}-{m}"))
    }

    #[must_use]
    pub fn phase(n: u32) -> Self {
        NodeId(format!("phase-{n}"))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_match_their_declared_type() {
        assert!(NodeId::from("phase-1").matches_type(NodeType::Phase));
        assert!(NodeId::from("group-1-2").matches_type(NodeType::Group));
        assert!(NodeId::from("task-1-2").matches_type(NodeType::Task));
        assert!(NodeId::from("task-1-2-3").matches_type(NodeType::Task));
        assert!(NodeId::from("verify-1-2-3").matches_type(NodeType::Verify));
        assert!(!NodeId::from("task-1-2").matches_type(NodeType::Phase));
        assert!(!NodeId::from("phase-x").matches_type(NodeType::Phase));
    }

    #[test]
    fn phase_number_extracted_from_any_shape() {
        assert_eq!(NodeId::from("phase-3").phase_number(), Some(3));
        assert_eq!(NodeId::from("task-3-1-2").phase_number(), Some(3));
        assert_eq!(NodeId::from("not-an-id").phase_number(), None);
    }

    #[test]
    fn constructors_round_trip_through_the_regexes() {
        let id = NodeId::task(2, 1, Some(3));
        assert_eq!(id.as_str(), "task-2-1-3");
        assert!(id.matches_type(NodeType::Task));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn task_ids_always_match_task_type(n in 0u32..1000, m in 0u32..1000, k in proptest::option::of(0u32..1000)) {
            let id = NodeId::task(n, m, k);
            prop_assert!(id.matches_type(NodeType::Task));
            prop_assert_eq!(id.phase_number(), Some(n));
        }

        #[test]
        fn phase_ids_never_match_non_phase_types(n in 0u32..1000) {
            let id = NodeId::phase(n);
            prop_assert!(id.matches_type(NodeType::Phase));
            prop_assert!(!id.matches_type(NodeType::Group));
            prop_assert!(!id.matches_type(NodeType::Task));
            prop_assert!(!id.matches_type(NodeType::Verify));
        }
    }
}
