//! Per-node and per-document metadata (spec.md §3).
//!
//! Both metadata structs keep an `extra` flattened bag so that fields
//! written by a newer schema version round-trip unchanged through an
//! older binary (I-ROUNDTRIP, P1).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::RangeInclusive;

use crate::status::{SpecStatus, TaskCategory, VerificationStatus};

/// Schema versions this binary can both read and write (spec.md §3,
/// "supplemented" schema negotiation). A document above the max is
/// from a newer write this binary can't produce; below the min is too
/// old to auto-migrate. Both ends of `load()` return `MalformedSpec`.
pub const SUPPORTED_VERSION_RANGE: RangeInclusive<u32> = 1..=1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: SpecStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_preferences: Option<SessionPreferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        DocumentMetadata {
            title: None,
            description: None,
            status: SpecStatus::Pending,
            created_at: None,
            last_updated: None,
            owner: None,
            priority: None,
            version: *SUPPORTED_VERSION_RANGE.end(),
            session_preferences: None,
            git: None,
            extra: Map::new(),
        }
    }
}

/// Author-settable session preferences. Fields stay `Option` so their
/// *absence* is distinguishable from an explicit default — C10's
/// `should_offer_commit` only defaults `commit_cadence` to `Manual`
/// when the field was never set at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_cadence: Option<crate::status::CommitCadence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_verify: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commits: Vec<CommitRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr: Option<PrMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrMetadata {
    pub number: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub sha: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Fields recognized on node `metadata` (spec.md §3); anything else is
/// preserved opaquely via `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_category: Option<TaskCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    /// Shell command a `verify` node executes (spec.md §3, §4.8).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<OnFailurePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_result: Option<VerificationResult>,
    /// Set by C3 when a status change occurs without an accompanying
    /// journal entry (spec.md §4.6's `needs_journaling` trigger).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub needs_journaling: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commits: Vec<CommitRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Retry/continuation policy for a `verify` node's failed run
/// (spec.md §3 `on_failure` mapping).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnFailurePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_status: Option<crate::status::NodeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub continue_on_failure: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub consult: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub date: DateTime<Utc>,
    pub status: VerificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_metadata_round_trips_unknown_fields() {
        let json = serde_json::json!({
            "task_category": "test",
            "from_the_future": "kept as-is"
        });
        let meta: NodeMetadata = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(meta.extra.get("from_the_future").unwrap(), "kept as-is");
        let back = serde_json::to_value(&meta).unwrap();
        assert_eq!(back.get("from_the_future").unwrap(), "kept as-is");
    }

    #[test]
    fn session_preferences_absent_vs_explicit_manual_differ() {
        let unset: SessionPreferences = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(unset.commit_cadence.is_none());
        let explicit: SessionPreferences =
            serde_json::from_value(serde_json::json!({"commit_cadence": "manual"})).unwrap();
        assert_eq!(explicit.commit_cadence, Some(crate::status::CommitCadence::Manual));
    }

    #[test]
    fn document_metadata_defaults_to_current_schema_version() {
        let meta = DocumentMetadata::default();
        assert_eq!(meta.version, *SUPPORTED_VERSION_RANGE.end());
        assert_eq!(meta.status, SpecStatus::Pending);
    }
}
