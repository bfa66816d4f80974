//! Progress-mutating commands: `update-status`, `complete-task`,
//! `mark-blocked`, `unblock-task`, `add-journal`, `add-verification`
//! (spec.md §6.1, §4.6, §4.7).

use sdd_model::{JournalEntryType, ModificationOp, NodeId, NodeStatus, VerificationStatus};
use sdd_transactor::{TransactionOptions, TransactionReport};
use sdd_utils::SddResult;
use serde::Serialize;

use crate::cli::context::Context;
use crate::cli::output;

#[derive(Debug, Serialize)]
struct OpResult {
    ops_applied: Vec<String>,
    ops_noop: Vec<String>,
    auto_completions: Vec<String>,
}

impl From<TransactionReport> for OpResult {
    fn from(report: TransactionReport) -> Self {
        OpResult {
            ops_applied: report.ops_applied,
            ops_noop: report.ops_noop,
            auto_completions: report.auto_completions.iter().map(|id| id.as_str().to_string()).collect(),
        }
    }
}

fn apply_and_emit(ctx: &Context, spec_id: &str, op: ModificationOp, noop_text: &str) -> SddResult<()> {
    let report: OpResult = ctx.transactor().apply(spec_id, &[op], TransactionOptions::default())?.into();
    output::emit(ctx.json, ctx.quiet, &report, || {
        if report.ops_applied.is_empty() {
            noop_text.to_string()
        } else {
            format!("applied: {}", report.ops_applied.join(", "))
        }
    });
    Ok(())
}

pub fn update_status(ctx: &Context, spec_id: String, task_id: String, status: NodeStatus, note: Option<String>) -> SddResult<()> {
    let op = ModificationOp::SetStatus { node_id: NodeId::from(task_id.as_str()), status, note };
    apply_and_emit(ctx, &spec_id, op, "status already matched; no change")
}

pub fn complete_task(
    ctx: &Context,
    spec_id: String,
    task_id: String,
    journal_title: String,
    journal_content: String,
    entry_type: JournalEntryType,
) -> SddResult<()> {
    let op = ModificationOp::CompleteTask {
        node_id: NodeId::from(task_id.as_str()),
        journal_title,
        journal_content,
        entry_type,
    };
    let report = ctx.transactor().apply(&spec_id, &[op], TransactionOptions::default())?;
    let applied = !report.ops_applied.is_empty();
    let phase_also_completed = report.auto_completions.iter().any(|id| id.as_str().starts_with("phase-"));
    let result: OpResult = report.into();
    output::emit(ctx.json, ctx.quiet, &result, || {
        if result.ops_applied.is_empty() {
            "task was already completed".to_string()
        } else {
            format!("applied: {}", result.ops_applied.join(", "))
        }
    });

    if applied {
        let event = if phase_also_completed { crate::cli::git_hook::GitEvent::PhaseCompleted } else { crate::cli::git_hook::GitEvent::TaskCompleted };
        crate::cli::git_hook::after_completion(ctx, &spec_id, event, &format!("sdd: complete {task_id}"));
    }
    Ok(())
}

pub fn mark_blocked(
    ctx: &Context,
    spec_id: String,
    task_id: String,
    reason: String,
    blocker_type: String,
    ticket: Option<String>,
) -> SddResult<()> {
    let op = ModificationOp::MarkBlocked {
        node_id: NodeId::from(task_id.as_str()),
        reason,
        blocker_type,
        ticket,
    };
    apply_and_emit(ctx, &spec_id, op, "task was already blocked")
}

pub fn unblock_task(ctx: &Context, spec_id: String, task_id: String, resolution: String) -> SddResult<()> {
    let op = ModificationOp::Unblock { node_id: NodeId::from(task_id.as_str()), resolution };
    apply_and_emit(ctx, &spec_id, op, "task was not blocked")
}

pub fn add_journal(
    ctx: &Context,
    spec_id: String,
    title: String,
    content: String,
    entry_type: JournalEntryType,
    task_id: Option<String>,
) -> SddResult<()> {
    let op = ModificationOp::AddJournal {
        spec_id: spec_id.clone(),
        entry_type,
        title,
        content,
        node_id: task_id.map(|id| NodeId::from(id.as_str())),
    };
    apply_and_emit(ctx, &spec_id, op, "an identical entry was already the most recent journal entry")
}

pub fn add_verification(ctx: &Context, spec_id: String, verify_id: String, result: VerificationStatus, detail: Option<String>) -> SddResult<()> {
    let op = ModificationOp::AddVerification { verify_id: NodeId::from(verify_id.as_str()), result, detail };
    apply_and_emit(ctx, &spec_id, op, "verification already recorded with the same outcome")
}
