//! Journal entries (spec.md §3, C6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::node_id::NodeId;
use crate::status::JournalEntryType;

/// One append-only journal record. Timestamps are monotonic within a
/// document (I9) even across entries recorded on different days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub entry_type: JournalEntryType,
    pub title: String,
    pub content: String,
    /// Optional associated node; if present, must resolve (I2-adjacent
    /// check performed by C2, not enforced at the type level).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl JournalEntry {
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        entry_type: JournalEntryType,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        JournalEntry {
            timestamp,
            entry_type,
            title: title.into(),
            content: content.into(),
            task_id: None,
            author: None,
            metadata: Map::new(),
        }
    }

    #[must_use]
    pub fn for_node(mut self, task_id: NodeId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    #[must_use]
    pub fn by(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_methods_set_optional_fields() {
        let entry = JournalEntry::new(Utc::now(), JournalEntryType::Note, "Title", "hello")
            .for_node(NodeId::task(1, 1, None))
            .by("student");
        assert_eq!(entry.task_id, Some(NodeId::task(1, 1, None)));
        assert_eq!(entry.author.as_deref(), Some("student"));
    }
}
