//! Per-op mutation logic for the transactor (spec.md §4.7's operation
//! vocabulary). Each function mutates `doc` in place and returns
//! `Ok(true)` if it had an effect, `Ok(false)` if it was a silent
//! no-op (idempotency), or `Err(reason)` to fail the whole transaction.

use std::collections::BTreeMap;
use std::process::Command;

use chrono::Utc;
use serde_json::Value;

use sdd_engine::{propagate_from_leaf, AutoCompletion, Index};
use sdd_model::{
    CommitRef, Document, JournalEntry, JournalEntryType, ModificationOp, Node, NodeId,
    NodeMetadata, NodeSpec, NodeStatus, NodeType, OnFailurePolicy, SpecStatus, VerificationResult,
    VerificationStatus,
};
use sdd_utils::canonical::content_hash;

use crate::template;

pub(crate) fn apply_one(
    doc: &mut Document,
    op: &ModificationOp,
    auto_completions: &mut Vec<NodeId>,
) -> Result<bool, String> {
    match op {
        ModificationOp::CreateSpec { spec_id, title, template } => {
            create_spec(doc, spec_id, title, template)
        }
        ModificationOp::SetStatus { node_id, status, note } => {
            set_status(doc, node_id, *status, note.as_deref(), auto_completions)
        }
        ModificationOp::CompleteTask {
            node_id,
            journal_title,
            journal_content,
            entry_type,
        } => complete_task(doc, node_id, journal_title, journal_content, *entry_type, auto_completions),
        ModificationOp::MarkBlocked {
            node_id,
            reason,
            blocker_type,
            ticket,
        } => mark_blocked(doc, node_id, reason, blocker_type, ticket.as_deref()),
        ModificationOp::Unblock { node_id, resolution } => unblock(doc, node_id, resolution),
        ModificationOp::AddJournal {
            spec_id: _,
            entry_type,
            title,
            content,
            node_id,
        } => Ok(add_journal(doc, *entry_type, title, content, node_id.clone(), None)),
        ModificationOp::BulkJournal { spec_id: _, entries } => {
            let mut any = false;
            for entry in entries {
                if add_journal(doc, entry.entry_type, &entry.title, &entry.content, entry.node_id.clone(), entry.timestamp) {
                    any = true;
                }
            }
            Ok(any)
        }
        ModificationOp::AddVerification { verify_id, result, detail } => {
            add_verification(doc, verify_id, *result, detail.clone(), auto_completions)
        }
        ModificationOp::ExecuteVerification { verify_id } => {
            execute_verification(doc, verify_id, auto_completions)
        }
        ModificationOp::UpdateMetadata { node_id, fields } => update_metadata(doc, node_id, fields),
        ModificationOp::MoveSpec { spec_id: _, target_bucket } => move_spec(doc, *target_bucket),
        ModificationOp::CreateNode { parent_id, node_spec } => create_node(doc, parent_id, node_spec),
        ModificationOp::RemoveNode { node_id } => remove_node(doc, node_id),
        ModificationOp::RecalculateCounts { spec_id: _ } => {
            let before = doc.counts;
            sdd_validate::counts::recalculate(doc);
            Ok(doc.counts != before)
        }
        ModificationOp::SyncMetadata { spec_id: _ } => {
            sdd_validate::metadata::ensure(doc);
            Ok(false)
        }
        ModificationOp::SetGitMetadata {
            spec_id: _,
            branch_name,
            base_branch,
            commit,
        } => set_git_metadata(doc, branch_name.as_deref(), base_branch.as_deref(), commit.as_deref()),
    }
}

fn node_path(doc: &Document, id: &NodeId) -> Result<Vec<usize>, String> {
    let index = Index::build(doc);
    index
        .path_of(id)
        .map(<[usize]>::to_vec)
        .ok_or_else(|| format!("unknown node id '{id}'"))
}

fn node_mut<'a>(doc: &'a mut Document, id: &NodeId) -> Result<&'a mut Node, String> {
    let path = node_path(doc, id)?;
    sdd_engine::index::node_at_mut(doc, &path).ok_or_else(|| format!("unknown node id '{id}'"))
}

fn create_spec(doc: &mut Document, spec_id: &str, title: &str, template: &str) -> Result<bool, String> {
    if !doc.spec_id.is_empty() || !doc.hierarchy.is_empty() {
        return Err("create_spec may only run against an empty document".to_string());
    }
    doc.spec_id = spec_id.to_string();
    doc.metadata.title = Some(title.to_string());
    doc.metadata.created_at = Some(Utc::now());
    doc.hierarchy = template::build_hierarchy(template);
    let child_counts: Vec<_> = doc.hierarchy.iter().map(|n| n.counts).collect();
    doc.counts = sdd_model::Counts::combine(&child_counts);
    Ok(true)
}

fn set_status(
    doc: &mut Document,
    node_id: &NodeId,
    status: NodeStatus,
    note: Option<&str>,
    auto_completions: &mut Vec<NodeId>,
) -> Result<bool, String> {
    let path = node_path(doc, node_id)?;
    let node = sdd_engine::index::node_at_mut(doc, &path).expect("path just resolved");
    if node.status == status {
        return Ok(false);
    }
    node.status = status;
    if let Some(note) = note {
        node.metadata.extra.insert("status_note".to_string(), Value::String(note.to_string()));
    }
    node.metadata.needs_journaling = true;

    let index = Index::build(doc);
    let completions = propagate_from_leaf(doc, &index, node_id);
    journal_completions(doc, &completions);
    auto_completions.extend(completions.into_iter().map(|AutoCompletion(id)| id));
    Ok(true)
}

fn complete_task(
    doc: &mut Document,
    node_id: &NodeId,
    journal_title: &str,
    journal_content: &str,
    entry_type: JournalEntryType,
    auto_completions: &mut Vec<NodeId>,
) -> Result<bool, String> {
    let path = node_path(doc, node_id)?;
    let node = sdd_engine::index::node_at_mut(doc, &path).expect("path just resolved");
    let already_complete = node.status == NodeStatus::Completed;
    node.status = NodeStatus::Completed;
    node.metadata.completed_at = Some(Utc::now());

    add_journal(doc, entry_type, journal_title, journal_content, Some(node_id.clone()), None);

    let index = Index::build(doc);
    let completions = propagate_from_leaf(doc, &index, node_id);
    journal_completions(doc, &completions);
    auto_completions.extend(completions.into_iter().map(|AutoCompletion(id)| id));
    Ok(!already_complete)
}

fn mark_blocked(
    doc: &mut Document,
    node_id: &NodeId,
    reason: &str,
    blocker_type: &str,
    ticket: Option<&str>,
) -> Result<bool, String> {
    let node = node_mut(doc, node_id)?;
    if node.status == NodeStatus::Blocked {
        return Ok(false);
    }
    node.status = NodeStatus::Blocked;
    node.metadata.extra.insert("blocker_type".to_string(), Value::String(blocker_type.to_string()));
    if let Some(ticket) = ticket {
        node.metadata.extra.insert("blocker_ticket".to_string(), Value::String(ticket.to_string()));
    }
    add_journal(
        doc,
        JournalEntryType::Blocker,
        &format!("{node_id} blocked"),
        reason,
        Some(node_id.clone()),
        None,
    );
    Ok(true)
}

fn unblock(doc: &mut Document, node_id: &NodeId, resolution: &str) -> Result<bool, String> {
    let node = node_mut(doc, node_id)?;
    if node.status != NodeStatus::Blocked {
        return Ok(false);
    }
    node.status = NodeStatus::Pending;
    add_journal(
        doc,
        JournalEntryType::Note,
        &format!("{node_id} unblocked"),
        resolution,
        Some(node_id.clone()),
        None,
    );
    Ok(true)
}

/// Append a journal entry unless one with the same (entry_type, title,
/// content, task_id) content hash was already the last entry appended
/// within the same wall-clock second (idempotency, spec.md §4.7).
fn add_journal(
    doc: &mut Document,
    entry_type: JournalEntryType,
    title: &str,
    content: &str,
    task_id: Option<NodeId>,
    timestamp: Option<chrono::DateTime<Utc>>,
) -> bool {
    let key = content_hash(&(entry_type as u8, title, content, &task_id));
    if let Some(last) = doc.journal.last() {
        let last_key = content_hash(&(last.entry_type as u8, &last.title, &last.content, &last.task_id));
        if last_key == key && (Utc::now() - last.timestamp).num_seconds().abs() < 1 {
            return false;
        }
    }
    let mut entry = JournalEntry::new(timestamp.unwrap_or_else(Utc::now), entry_type, title, content);
    if let Some(task_id) = task_id {
        entry = entry.for_node(task_id);
    }
    sdd_journal::append(doc, entry);
    true
}

fn journal_completions(doc: &mut Document, completions: &[AutoCompletion]) {
    for AutoCompletion(id) in completions {
        add_journal(
            doc,
            JournalEntryType::StatusChange,
            &format!("{id} auto-completed"),
            &format!("All children of {id} completed; status derived automatically."),
            Some(id.clone()),
            None,
        );
    }
}

fn add_verification(
    doc: &mut Document,
    verify_id: &NodeId,
    result: VerificationStatus,
    detail: Option<String>,
    auto_completions: &mut Vec<NodeId>,
) -> Result<bool, String> {
    let verification = VerificationResult {
        date: Utc::now(),
        status: result,
        output: detail.clone(),
        notes: detail,
    };
    match sdd_journal::record(doc, verify_id, verification, None) {
        Some(sdd_journal::RecordOutcome::Recorded { auto_completions: completed, .. }) => {
            journal_completions_by_id(doc, &completed);
            auto_completions.extend(completed);
            Ok(true)
        }
        Some(sdd_journal::RecordOutcome::RetryOwed { .. }) => {
            unreachable!("add_verification passes remaining_retries=None")
        }
        None => Err(format!("unknown verify id '{verify_id}'")),
    }
}

fn journal_completions_by_id(doc: &mut Document, ids: &[NodeId]) {
    for id in ids {
        add_journal(
            doc,
            JournalEntryType::StatusChange,
            &format!("{id} auto-completed"),
            &format!("All children of {id} completed; status derived automatically."),
            Some(id.clone()),
            None,
        );
    }
}

/// Run the verify node's `metadata.command` as a subprocess, honoring
/// `on_failure.max_retries` (spec.md §4.6), and persist only the
/// terminal outcome.
fn execute_verification(
    doc: &mut Document,
    verify_id: &NodeId,
    auto_completions: &mut Vec<NodeId>,
) -> Result<bool, String> {
    let node = node_mut(doc, verify_id)?;
    let command = node
        .metadata
        .command
        .clone()
        .ok_or_else(|| format!("{verify_id} has no metadata.command to execute"))?;
    let mut remaining = node.metadata.on_failure.as_ref().and_then(|p| p.max_retries);

    loop {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .output()
            .map_err(|e| format!("failed to spawn verification command for {verify_id}: {e}"))?;

        let status = if output.status.success() {
            VerificationStatus::Passed
        } else {
            VerificationStatus::Failed
        };
        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let result = VerificationResult {
            date: Utc::now(),
            status,
            output: Some(combined),
            notes: None,
        };

        match sdd_journal::record(doc, verify_id, result, remaining) {
            Some(sdd_journal::RecordOutcome::Recorded { auto_completions: completed, .. }) => {
                journal_completions_by_id(doc, &completed);
                auto_completions.extend(completed);
                return Ok(true);
            }
            Some(sdd_journal::RecordOutcome::RetryOwed { remaining_retries }) => {
                remaining = Some(remaining_retries);
                continue;
            }
            None => return Err(format!("unknown verify id '{verify_id}'")),
        }
    }
}

fn update_metadata(doc: &mut Document, node_id: &NodeId, fields: &BTreeMap<String, Value>) -> Result<bool, String> {
    let node = node_mut(doc, node_id)?;
    let before = node.metadata.clone();
    for (key, value) in fields {
        apply_metadata_field(&mut node.metadata, key, value.clone())?;
    }
    Ok(node.metadata != before)
}

fn apply_metadata_field(meta: &mut NodeMetadata, key: &str, value: Value) -> Result<(), String> {
    match key {
        "file_path" => meta.file_path = from_value(value, key)?,
        "task_category" => meta.task_category = from_value(value, key)?,
        "estimated_hours" => meta.estimated_hours = from_value(value, key)?,
        "actual_hours" => meta.actual_hours = from_value(value, key)?,
        "skill" => meta.skill = from_value(value, key)?,
        "command" => meta.command = from_value(value, key)?,
        "on_failure" => meta.on_failure = from_value::<Option<OnFailurePolicy>>(value, key)?,
        "verification_result" => meta.verification_result = from_value(value, key)?,
        "needs_journaling" => meta.needs_journaling = serde_json::from_value(value).map_err(|e| e.to_string())?,
        "commits" => meta.commits = serde_json::from_value::<Vec<CommitRef>>(value).map_err(|e| e.to_string())?,
        "started_at" => meta.started_at = from_value(value, key)?,
        "completed_at" => meta.completed_at = from_value(value, key)?,
        _ => {
            meta.extra.insert(key.to_string(), value);
        }
    }
    Ok(())
}

fn from_value<T: serde::de::DeserializeOwned>(value: Value, key: &str) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("invalid value for '{key}': {e}"))
}

fn move_spec(doc: &mut Document, target_bucket: SpecStatus) -> Result<bool, String> {
    if doc.metadata.status == target_bucket {
        return Ok(false);
    }
    doc.metadata.status = target_bucket;
    Ok(true)
}

fn create_node(doc: &mut Document, parent_id: &NodeId, spec: &NodeSpec) -> Result<bool, String> {
    let new_id = next_child_id(doc, parent_id, spec.node_type, spec.sequence)?;
    let node = Node {
        id: new_id,
        node_type: spec.node_type,
        title: spec.title.clone(),
        description: spec.description.clone(),
        status: NodeStatus::Pending,
        metadata: NodeMetadata::default(),
        children: Vec::new(),
        dependencies: sdd_model::Dependencies::default(),
        counts: sdd_model::Counts::leaf(NodeStatus::Pending),
    };

    if parent_id.as_str() == "root" {
        doc.hierarchy.push(node);
        return Ok(true);
    }
    let path = node_path(doc, parent_id)?;
    let parent = sdd_engine::index::node_at_mut(doc, &path).expect("path just resolved");
    parent.children.push(node);
    Ok(true)
}

fn next_child_id(doc: &Document, parent_id: &NodeId, node_type: NodeType, sequence: Option<u32>) -> Result<NodeId, String> {
    if parent_id.as_str() == "root" {
        let n = sequence.unwrap_or_else(|| doc.hierarchy.len() as u32 + 1);
        return Ok(NodeId::phase(n));
    }
    let parent = doc.find_node(parent_id).ok_or_else(|| format!("unknown parent id '{parent_id}'"))?;
    let Some(n) = parent_id.phase_number() else {
        return Err(format!("parent '{parent_id}' has no enclosing phase number"));
    };
    let m = match parent.node_type {
        NodeType::Phase => sequence.unwrap_or_else(|| parent.children.len() as u32 + 1),
        NodeType::Group => parent_id
            .as_str()
            .rsplit('-')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1),
        _ => return Err(format!("'{parent_id}' cannot have children created under it")),
    };
    let seq = if parent.node_type == NodeType::Group {
        Some(sequence.unwrap_or_else(|| parent.children.len() as u32 + 1))
    } else {
        sequence
    };
    match node_type {
        NodeType::Task => Ok(NodeId::task(n, m, seq)),
        NodeType::Verify => Ok(NodeId::verify(n, m, seq)),
        NodeType::Group => Ok(NodeId::group(n, m)),
        NodeType::Phase => Err("nested phases are not a valid hierarchy shape".to_string()),
    }
}

fn remove_node(doc: &mut Document, node_id: &NodeId) -> Result<bool, String> {
    if let Some(pos) = doc.hierarchy.iter().position(|n| &n.id == node_id) {
        doc.hierarchy.remove(pos);
        return Ok(true);
    }
    if detach_from(&mut doc.hierarchy, node_id) {
        Ok(true)
    } else {
        Err(format!("unknown node id '{node_id}'"))
    }
}

fn detach_from(nodes: &mut Vec<Node>, target: &NodeId) -> bool {
    if let Some(pos) = nodes.iter().position(|n| &n.id == target) {
        nodes.remove(pos);
        return true;
    }
    nodes.iter_mut().any(|n| detach_from(&mut n.children, target))
}

fn set_git_metadata(
    doc: &mut Document,
    branch_name: Option<&str>,
    base_branch: Option<&str>,
    commit: Option<&str>,
) -> Result<bool, String> {
    let git = doc.metadata.git.get_or_insert_with(Default::default);
    let mut changed = false;
    if let Some(branch_name) = branch_name {
        if git.branch_name.as_deref() != Some(branch_name) {
            git.branch_name = Some(branch_name.to_string());
            changed = true;
        }
    }
    if let Some(base_branch) = base_branch {
        if git.base_branch.as_deref() != Some(base_branch) {
            git.base_branch = Some(base_branch.to_string());
            changed = true;
        }
    }
    if let Some(sha) = commit {
        git.commits.push(CommitRef {
            sha: sha.to_string(),
            timestamp: Utc::now(),
            message: String::new(),
        });
        changed = true;
    }
    Ok(changed)
}
