//! Spec lifecycle commands: `create`, `activate`, `move-spec`,
//! `complete-spec`, `list-specs`, `find-specs` (spec.md §6.1, §4.1).

use sdd_model::{ModificationOp, SpecStatus};
use sdd_transactor::TransactionOptions;
use sdd_utils::SddResult;
use serde::Serialize;

use crate::cli::context::Context;
use crate::cli::{listing, output, spec_id};

#[derive(Debug, Serialize)]
struct CreateResult {
    spec_id: String,
    title: String,
    template: String,
    ops_applied: Vec<String>,
}

pub fn create(ctx: &Context, title: String, id: Option<String>, template: String) -> SddResult<()> {
    let resolved_id = match id {
        Some(id) => id,
        None => spec_id::generate(&title, &listing::existing_ids(&ctx.config.specs_root)),
    };

    let report = ctx.transactor().create(&resolved_id, &title, &template, TransactionOptions::default())?;
    let result = CreateResult {
        spec_id: resolved_id.clone(),
        title,
        template,
        ops_applied: report.ops_applied,
    };
    output::emit(ctx.json, ctx.quiet, &result, || format!("created spec '{}' in pending", result.spec_id));
    Ok(())
}

#[derive(Debug, Serialize)]
struct MoveResult {
    spec_id: String,
    bucket: SpecStatus,
}

fn move_to(ctx: &Context, spec_id: &str, bucket: SpecStatus) -> SddResult<()> {
    let op = ModificationOp::MoveSpec {
        spec_id: spec_id.to_string(),
        target_bucket: bucket,
    };
    ctx.transactor().apply(spec_id, &[op], TransactionOptions::default())?;
    let result = MoveResult { spec_id: spec_id.to_string(), bucket };
    output::emit(ctx.json, ctx.quiet, &result, || format!("{} -> {:?}", result.spec_id, result.bucket));
    Ok(())
}

pub fn activate(ctx: &Context, spec_id: String) -> SddResult<()> {
    move_to(ctx, &spec_id, SpecStatus::Active)
}

pub fn move_spec(ctx: &Context, spec_id: String, bucket: SpecStatus) -> SddResult<()> {
    move_to(ctx, &spec_id, bucket)
}

pub fn complete_spec(ctx: &Context, spec_id: String) -> SddResult<()> {
    move_to(ctx, &spec_id, SpecStatus::Completed)?;
    crate::cli::git_hook::after_completion(ctx, &spec_id, crate::cli::git_hook::GitEvent::SpecCompleted, &format!("sdd: complete spec {spec_id}"));
    Ok(())
}

pub fn list_specs(ctx: &Context, bucket: Option<SpecStatus>) -> SddResult<()> {
    let mut specs = listing::list_all(&ctx.config.specs_root);
    if let Some(bucket) = bucket {
        specs.retain(|s| s.status == bucket);
    }
    output::emit(ctx.json, ctx.quiet, &specs, || {
        if specs.is_empty() {
            "no specs found".to_string()
        } else {
            specs
                .iter()
                .map(|s| format!("{} [{:?}] {}% — {}", s.spec_id, s.status, s.percent, s.title.as_deref().unwrap_or("")))
                .collect::<Vec<_>>()
                .join("\n")
        }
    });
    Ok(())
}

pub fn find_specs(ctx: &Context, query: String) -> SddResult<()> {
    let specs = listing::find(&ctx.config.specs_root, &query);
    output::emit(ctx.json, ctx.quiet, &specs, || {
        if specs.is_empty() {
            format!("no specs matching '{query}'")
        } else {
            specs.iter().map(|s| format!("{} — {}", s.spec_id, s.title.as_deref().unwrap_or(""))).collect::<Vec<_>>().join("\n")
        }
    });
    Ok(())
}
