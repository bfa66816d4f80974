//! Batch modification commands: `apply-modifications`, `parse-review`
//! (spec.md §6.1, §6.4).

use camino::Utf8PathBuf;
use sdd_model::ModificationOp;
use sdd_transactor::{TransactionOptions, TransactionReport};
use sdd_utils::{SddError, SddResult};
use serde::{Deserialize, Serialize};

use crate::cli::context::Context;
use crate::cli::output;
use crate::cli::review_parser;

/// The `--from ops.json` shape (spec.md §6.4): `{"modifications": [...]}`.
#[derive(Debug, Deserialize)]
struct ModificationBatch {
    modifications: Vec<ModificationOp>,
}

#[derive(Debug, Serialize)]
struct BatchResult {
    ops_applied: Vec<String>,
    ops_noop: Vec<String>,
    auto_completions: Vec<String>,
    dry_run: bool,
}

impl From<TransactionReport> for BatchResult {
    fn from(report: TransactionReport) -> Self {
        BatchResult {
            ops_applied: report.ops_applied,
            ops_noop: report.ops_noop,
            auto_completions: report.auto_completions.iter().map(|id| id.as_str().to_string()).collect(),
            dry_run: report.dry_run,
        }
    }
}

fn run_batch(ctx: &Context, spec_id: &str, ops: Vec<ModificationOp>, dry_run: bool) -> SddResult<()> {
    let options = TransactionOptions { dry_run, ..TransactionOptions::default() };
    let result: BatchResult = ctx.transactor().apply(spec_id, &ops, options)?.into();
    output::emit(ctx.json, ctx.quiet, &result, || {
        format!(
            "{}{} op(s) applied, {} no-op, {} auto-completion(s)",
            if result.dry_run { "[dry run] " } else { "" },
            result.ops_applied.len(),
            result.ops_noop.len(),
            result.auto_completions.len(),
        )
    });
    Ok(())
}

pub fn apply_modifications(ctx: &Context, spec_id: String, from: Utf8PathBuf, dry_run: bool) -> SddResult<()> {
    let raw = std::fs::read_to_string(from.as_std_path())
        .map_err(|source| SddError::IoError { path: Some(from.as_std_path().to_path_buf()), source })?;
    let batch: ModificationBatch = serde_json::from_str(&raw)
        .map_err(|e| SddError::UserError(format!("malformed modification batch at {from}: {e}")))?;
    run_batch(ctx, &spec_id, batch.modifications, dry_run)
}

pub fn parse_review(ctx: &Context, spec_id: String, review: Utf8PathBuf, dry_run: bool) -> SddResult<()> {
    let markdown = std::fs::read_to_string(review.as_std_path())
        .map_err(|source| SddError::IoError { path: Some(review.as_std_path().to_path_buf()), source })?;
    let ops = review_parser::parse(&spec_id, &markdown).map_err(SddError::UserError)?;
    run_batch(ctx, &spec_id, ops, dry_run)
}
