//! `list_blockers` (spec.md §4.9): every `blocked` leaf, with the reason
//! and metadata recorded by the `mark_blocked` op (spec.md §4.7).

use chrono::{DateTime, Utc};
use sdd_model::{Document, JournalEntryType, NodeId, NodeStatus};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockerEntry {
    pub task_id: NodeId,
    pub reason: String,
    pub blocker_type: Option<String>,
    pub ticket: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

#[must_use]
pub fn list_blockers(doc: &Document) -> Vec<BlockerEntry> {
    doc.iter_nodes()
        .filter(|n| n.status == NodeStatus::Blocked)
        .map(|n| {
            let latest = doc
                .journal
                .iter()
                .rev()
                .find(|e| e.entry_type == JournalEntryType::Blocker && e.task_id.as_ref() == Some(&n.id));

            BlockerEntry {
                task_id: n.id.clone(),
                reason: latest.map(|e| e.content.clone()).unwrap_or_else(|| "blocked".to_string()),
                blocker_type: n.metadata.extra.get("blocker_type").and_then(|v| v.as_str()).map(str::to_string),
                ticket: n.metadata.extra.get("blocker_ticket").and_then(|v| v.as_str()).map(str::to_string),
                since: latest.map(|e| e.timestamp),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sdd_model::{Counts, Dependencies, JournalEntry, Node, NodeMetadata, NodeType};
    use serde_json::Value;

    fn blocked_task(id: &str) -> Node {
        let mut metadata = NodeMetadata::default();
        metadata.extra.insert("blocker_type".to_string(), Value::String("external".to_string()));
        metadata.extra.insert("blocker_ticket".to_string(), Value::String("JIRA-1".to_string()));
        Node {
            id: NodeId::from(id),
            node_type: NodeType::Task,
            title: id.to_string(),
            description: None,
            status: NodeStatus::Blocked,
            metadata,
            children: Vec::new(),
            dependencies: Dependencies::default(),
            counts: Counts::leaf(NodeStatus::Blocked),
        }
    }

    #[test]
    fn reports_reason_and_ticket_from_journal_and_metadata() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(blocked_task("task-1-1"));
        doc.journal.push(
            JournalEntry::new(Utc::now(), JournalEntryType::Blocker, "task-1-1 blocked", "waiting on vendor")
                .for_node(NodeId::task(1, 1, None)),
        );

        let blockers = list_blockers(&doc);
        assert_eq!(blockers.len(), 1);
        assert_eq!(blockers[0].reason, "waiting on vendor");
        assert_eq!(blockers[0].blocker_type.as_deref(), Some("external"));
        assert_eq!(blockers[0].ticket.as_deref(), Some("JIRA-1"));
    }

    #[test]
    fn falls_back_to_a_generic_reason_when_no_journal_entry_exists() {
        let mut doc = Document::new("demo-001");
        doc.hierarchy.push(blocked_task("task-1-1"));
        let blockers = list_blockers(&doc);
        assert_eq!(blockers[0].reason, "blocked");
        assert!(blockers[0].since.is_none());
    }
}
