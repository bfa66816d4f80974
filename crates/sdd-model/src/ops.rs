//! The modification-op vocabulary applied by C7 (spec.md §4.7).
//!
//! REDESIGN FLAG: the original "kind"-tagged dictionary of free-form
//! fields becomes a closed, exhaustive enum here, so a new op can't be
//! half-specified and the transactor never matches on a string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::node_id::NodeId;
use crate::status::{JournalEntryType, NodeStatus, SpecStatus, VerificationStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModificationOp {
    CreateSpec {
        spec_id: String,
        title: String,
        template: String,
    },
    SetStatus {
        node_id: NodeId,
        status: NodeStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    CompleteTask {
        node_id: NodeId,
        journal_title: String,
        journal_content: String,
        entry_type: JournalEntryType,
    },
    MarkBlocked {
        node_id: NodeId,
        reason: String,
        #[serde(rename = "type")]
        blocker_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ticket: Option<String>,
    },
    Unblock {
        node_id: NodeId,
        resolution: String,
    },
    AddJournal {
        spec_id: String,
        entry_type: JournalEntryType,
        title: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node_id: Option<NodeId>,
    },
    BulkJournal {
        spec_id: String,
        entries: Vec<JournalEntryInput>,
    },
    AddVerification {
        verify_id: NodeId,
        result: VerificationStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    ExecuteVerification {
        verify_id: NodeId,
    },
    UpdateMetadata {
        node_id: NodeId,
        fields: BTreeMap<String, Value>,
    },
    MoveSpec {
        spec_id: String,
        target_bucket: SpecStatus,
    },
    CreateNode {
        parent_id: NodeId,
        node_spec: NodeSpec,
    },
    RemoveNode {
        node_id: NodeId,
    },
    RecalculateCounts {
        spec_id: String,
    },
    SyncMetadata {
        spec_id: String,
    },
    SetGitMetadata {
        spec_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_branch: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        commit: Option<String>,
    },
}

impl ModificationOp {
    /// Name used in journal entries and `--json` op summaries.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ModificationOp::CreateSpec { .. } => "create_spec",
            ModificationOp::SetStatus { .. } => "set_status",
            ModificationOp::CompleteTask { .. } => "complete_task",
            ModificationOp::MarkBlocked { .. } => "mark_blocked",
            ModificationOp::Unblock { .. } => "unblock",
            ModificationOp::AddJournal { .. } => "add_journal",
            ModificationOp::BulkJournal { .. } => "bulk_journal",
            ModificationOp::AddVerification { .. } => "add_verification",
            ModificationOp::ExecuteVerification { .. } => "execute_verification",
            ModificationOp::UpdateMetadata { .. } => "update_metadata",
            ModificationOp::MoveSpec { .. } => "move_spec",
            ModificationOp::CreateNode { .. } => "create_node",
            ModificationOp::RemoveNode { .. } => "remove_node",
            ModificationOp::RecalculateCounts { .. } => "recalculate_counts",
            ModificationOp::SyncMetadata { .. } => "sync_metadata",
            ModificationOp::SetGitMetadata { .. } => "set_git_metadata",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntryInput {
    pub entry_type: JournalEntryType,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// The shape of a new node passed to `create_node`, before an ID or
/// counts have been assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub node_type: crate::status::NodeType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_status_round_trips_through_tagged_json() {
        let op = ModificationOp::SetStatus {
            node_id: NodeId::task(1, 1, None),
            status: NodeStatus::Completed,
            note: Some("done".into()),
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["kind"], "set_status");
        let back: ModificationOp = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let json = serde_json::json!({"kind": "not_a_real_op"});
        let result: Result<ModificationOp, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn name_matches_the_tagged_kind_string() {
        let op = ModificationOp::RecalculateCounts {
            spec_id: "demo-001".into(),
        };
        assert_eq!(op.name(), "recalculate_counts");
    }
}
