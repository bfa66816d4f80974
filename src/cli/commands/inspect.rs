//! Read-only inspection commands: `progress`, `status-report`,
//! `list-phases`, `query-tasks`, `list-blockers`, `analyze-deps`
//! (spec.md §6.1, §4.4, §4.9).

use sdd_engine::{Graph, Index};
use sdd_model::{NodeId, NodeStatus, NodeType};
use sdd_query::TaskFilter;
use sdd_utils::SddResult;
use serde::Serialize;

use crate::cli::context::Context;
use crate::cli::output;

pub fn progress(ctx: &Context, spec_id: String) -> SddResult<()> {
    let doc = ctx.store().load(&spec_id)?;
    let summary = sdd_query::progress_summary(&doc);
    output::emit(ctx.json, ctx.quiet, &summary, || {
        format!(
            "{}% ({}/{} completed, {} in progress, {} blocked)",
            summary.percent, summary.completed, summary.total, summary.in_progress, summary.blocked
        )
    });
    Ok(())
}

pub fn status_report(ctx: &Context, spec_id: String) -> SddResult<()> {
    let doc = ctx.store().load(&spec_id)?;
    let report = sdd_query::status_report(&doc);
    output::emit(ctx.json, ctx.quiet, &report, || report.to_string());
    Ok(())
}

pub fn list_phases(ctx: &Context, spec_id: String) -> SddResult<()> {
    let doc = ctx.store().load(&spec_id)?;
    let phases = sdd_query::list_phases(&doc);
    output::emit(ctx.json, ctx.quiet, &phases, || {
        phases
            .iter()
            .map(|p| format!("{} [{:?}] {}% — {}", p.id.as_str(), p.status, p.counts.percent, p.title))
            .collect::<Vec<_>>()
            .join("\n")
    });
    Ok(())
}

pub fn query_tasks(
    ctx: &Context,
    spec_id: String,
    status: Option<NodeStatus>,
    node_type: Option<NodeType>,
    parent: Option<String>,
    skill: Option<String>,
) -> SddResult<()> {
    let doc = ctx.store().load(&spec_id)?;
    let filter = TaskFilter {
        status,
        node_type,
        parent: parent.map(|id| NodeId::from(id.as_str())),
        skill,
    };
    let tasks = sdd_query::query_tasks(&doc, &filter);
    output::emit(ctx.json, ctx.quiet, &tasks, || {
        if tasks.is_empty() {
            "no tasks match the given filters".to_string()
        } else {
            tasks.iter().map(|t| format!("{} [{:?}] {}", t.id.as_str(), t.status, t.title)).collect::<Vec<_>>().join("\n")
        }
    });
    Ok(())
}

pub fn list_blockers(ctx: &Context, spec_id: String) -> SddResult<()> {
    let doc = ctx.store().load(&spec_id)?;
    let blockers = sdd_query::list_blockers(&doc);
    output::emit(ctx.json, ctx.quiet, &blockers, || {
        if blockers.is_empty() {
            "no blocked tasks".to_string()
        } else {
            blockers.iter().map(|b| format!("{} — {}", b.task_id.as_str(), b.reason)).collect::<Vec<_>>().join("\n")
        }
    });
    Ok(())
}

#[derive(Debug, Serialize)]
struct DepsAnalysis {
    cycles: Vec<Vec<String>>,
    orphans: Vec<sdd_engine::Orphan>,
    bottlenecks: Vec<sdd_engine::Bottleneck>,
}

pub fn analyze_deps(ctx: &Context, spec_id: String, bottleneck_threshold: usize) -> SddResult<()> {
    let doc = ctx.store().load(&spec_id)?;
    let index = Index::build(&doc);
    let graph = Graph::build(&doc, &index);

    let analysis = DepsAnalysis {
        cycles: graph.cycles().into_iter().map(|c| c.iter().map(|id| id.as_str().to_string()).collect()).collect(),
        orphans: graph.orphans(),
        bottlenecks: graph.bottlenecks(bottleneck_threshold),
    };

    output::emit(ctx.json, ctx.quiet, &analysis, || {
        let mut lines = Vec::new();
        if analysis.cycles.is_empty() {
            lines.push("no cycles".to_string());
        } else {
            for cycle in &analysis.cycles {
                lines.push(format!("cycle: {}", cycle.join(" -> ")));
            }
        }
        for orphan in &analysis.orphans {
            lines.push(format!("orphan: {} references missing {}", orphan.node_id, orphan.missing_ref));
        }
        for bottleneck in &analysis.bottlenecks {
            lines.push(format!("bottleneck: {} (fanout {})", bottleneck.node_id, bottleneck.fanout));
        }
        lines.join("\n")
    });
    Ok(())
}
