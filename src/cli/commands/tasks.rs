//! Task discovery commands: `next-task`, `prepare-task`, `task-info`,
//! `check-deps` (spec.md §6.1, §4.5, §4.9).

use sdd_engine::scheduler::{SchedulerOutcome, TaskFilters};
use sdd_engine::{Graph, Index};
use sdd_model::{ModificationOp, NodeId, TaskCategory};
use sdd_transactor::TransactionOptions;
use sdd_utils::{SddError, SddResult};
use serde::Serialize;

use crate::cli::context::Context;
use crate::cli::output;

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum NextTaskResult {
    Next { task_id: String, rationale: &'static str },
    SpecComplete,
    AllBlocked { count_blocked: usize, count_in_progress: usize },
    NothingMatches,
}

pub fn next_task(
    ctx: &Context,
    spec_id: String,
    phase: Option<u32>,
    category: Option<TaskCategory>,
    skill: Option<String>,
) -> SddResult<()> {
    let doc = ctx.store().load(&spec_id)?;
    let filters = TaskFilters { phase_id: phase, task_category: category, skill };
    let outcome = sdd_engine::next_task(&doc, &filters);

    let result = match outcome {
        SchedulerOutcome::Next { task_id, rationale } => NextTaskResult::Next { task_id: task_id.as_str().to_string(), rationale },
        SchedulerOutcome::SpecComplete => NextTaskResult::SpecComplete,
        SchedulerOutcome::AllBlocked { count_blocked, count_in_progress } => {
            NextTaskResult::AllBlocked { count_blocked, count_in_progress }
        }
        SchedulerOutcome::NothingMatches => NextTaskResult::NothingMatches,
    };

    output::emit(ctx.json, ctx.quiet, &result, || match &result {
        NextTaskResult::Next { task_id, rationale } => format!("{task_id} ({rationale})"),
        NextTaskResult::SpecComplete => "spec complete: no actionable leaves remain".to_string(),
        NextTaskResult::AllBlocked { count_blocked, count_in_progress } => {
            format!("nothing ready: {count_blocked} blocked, {count_in_progress} in progress")
        }
        NextTaskResult::NothingMatches => "no task matches the given filters".to_string(),
    });
    Ok(())
}

pub fn prepare_task(ctx: &Context, spec_id: String, task_id: String) -> SddResult<()> {
    let node_id = NodeId::from(task_id.as_str());
    let op = ModificationOp::SetStatus {
        node_id: node_id.clone(),
        status: sdd_model::NodeStatus::InProgress,
        note: None,
    };
    ctx.transactor().apply(&spec_id, &[op], TransactionOptions::default())?;

    let doc = ctx.store().load(&spec_id)?;
    let info = sdd_query::task_info(&doc, &node_id)?;
    output::emit(ctx.json, ctx.quiet, &info, || format!("{} marked in_progress", info.task.id.as_str()));
    Ok(())
}

pub fn task_info(ctx: &Context, spec_id: String, task_id: String) -> SddResult<()> {
    let doc = ctx.store().load(&spec_id)?;
    let info = sdd_query::task_info(&doc, &NodeId::from(task_id.as_str()))?;
    output::emit(ctx.json, ctx.quiet, &info, || {
        format!(
            "{} [{:?}] — {} blocker(s), {} dependent(s), {} journal entries",
            info.task.id.as_str(),
            info.task.status,
            info.blockers.len(),
            info.dependents.len(),
            info.journal_entries.len(),
        )
    });
    Ok(())
}

pub fn check_deps(ctx: &Context, spec_id: String, task_id: String) -> SddResult<()> {
    let doc = ctx.store().load(&spec_id)?;
    let node_id = NodeId::from(task_id.as_str());
    if doc.find_node(&node_id).is_none() {
        return Err(SddError::NotFound(node_id.as_str().to_string()));
    }
    let index = Index::build(&doc);
    let graph = Graph::build(&doc, &index);
    let blockers = graph.blockers_of(&node_id);
    let ready = graph.is_ready(&node_id);

    #[derive(Debug, Serialize)]
    struct CheckDepsResult {
        task_id: String,
        ready: bool,
        blockers: Vec<sdd_engine::Blocker>,
    }
    let result = CheckDepsResult { task_id: node_id.as_str().to_string(), ready, blockers };
    output::emit(ctx.json, ctx.quiet, &result, || {
        if result.ready {
            format!("{} is ready", result.task_id)
        } else {
            let reasons: Vec<String> = result.blockers.iter().map(|b| format!("{} ({})", b.node_id, b.reason)).collect();
            format!("{} blocked by: {}", result.task_id, reasons.join(", "))
        }
    });
    Ok(())
}
