//! Enumerations from spec.md §3.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Phase,
    Group,
    Task,
    Verify,
}

impl NodeType {
    #[must_use]
    pub fn is_leaf_type(self) -> bool {
        matches!(self, NodeType::Task | NodeType::Verify)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecStatus {
    Pending,
    Active,
    Completed,
    Archived,
}

impl SpecStatus {
    /// Bucket directory name for this lifecycle state (spec.md §6.2).
    #[must_use]
    pub fn bucket(self) -> &'static str {
        match self {
            SpecStatus::Pending => "pending",
            SpecStatus::Active => "active",
            SpecStatus::Completed => "completed",
            SpecStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Implementation,
    Test,
    Doc,
    Research,
    Verification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationStatus {
    Passed,
    Failed,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitCadence {
    Task,
    Phase,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalEntryType {
    Decision,
    Deviation,
    Blocker,
    Note,
    StatusChange,
    Verification,
    System,
}
