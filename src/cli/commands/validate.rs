//! Commands that operate directly on a spec JSON file rather than a
//! spec id in the store: `validate`, `fix`, `report`, `stats`
//! (spec.md §6.1, §4.2).

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use sdd_model::{Document, NodeStatus, NodeType};
use sdd_utils::{SddError, SddResult};
use serde::Serialize;

use crate::cli::context::Context;
use crate::cli::output;

fn load_document(spec_file: &Utf8PathBuf) -> SddResult<Document> {
    let raw = std::fs::read_to_string(spec_file.as_std_path()).map_err(|source| SddError::IoError {
        path: Some(spec_file.as_std_path().to_path_buf()),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|e| SddError::MalformedSpec {
        reason: e.to_string(),
        byte_offset: Some(e.column()),
    })
}

fn write_document(spec_file: &Utf8PathBuf, doc: &Document) -> SddResult<()> {
    let json = serde_json::to_string_pretty(doc).map_err(|e| SddError::Internal(format!("failed to serialize document: {e}")))?;
    sdd_utils::atomic_write::write_file_atomic(spec_file, &json)
}

pub fn validate(ctx: &Context, spec_file: Utf8PathBuf) -> SddResult<()> {
    let doc = load_document(&spec_file)?;
    let issues = sdd_validate::validate(&doc);
    let has_errors = sdd_validate::has_errors(&issues);

    output::emit(ctx.json, ctx.quiet, &issues, || {
        if issues.is_empty() {
            format!("{} is valid", doc.spec_id)
        } else {
            let mut lines = vec![format!("{} issue(s) found in {}:", issues.len(), doc.spec_id)];
            lines.extend(issues.iter().map(|i| format!("  [{:?}] {} {}: {}", i.severity, i.code, i.location, i.message)));
            lines.join("\n")
        }
    });
    let _ = has_errors;
    Ok(())
}

#[derive(Debug, Serialize)]
struct FixResult {
    dry_run: bool,
    applied: bool,
    remaining_issues: usize,
}

pub fn fix(ctx: &Context, spec_file: Utf8PathBuf, dry_run: bool, apply: bool) -> SddResult<()> {
    let mut doc = load_document(&spec_file)?;

    sdd_validate::status::derive(&mut doc);
    sdd_validate::counts::recalculate(&mut doc);
    sdd_validate::metadata::ensure(&mut doc);
    let reparent_issues = sdd_validate::hierarchy::reparent(&mut doc, apply && !dry_run);

    let remaining = sdd_validate::validate(&doc);

    if !dry_run {
        write_document(&spec_file, &doc)?;
    }

    let result = FixResult {
        dry_run,
        applied: !dry_run,
        remaining_issues: remaining.len(),
    };
    output::emit(ctx.json, ctx.quiet, &result, || {
        let mut lines = vec![format!(
            "{} {} fixes for {}; {} issue(s) remain",
            if dry_run { "previewed" } else { "applied" },
            if dry_run { "proposed" } else { "" },
            doc.spec_id,
            result.remaining_issues,
        )];
        lines.extend(reparent_issues.iter().map(|i| format!("  {}: {}", i.location, i.message)));
        lines.join("\n")
    });
    Ok(())
}

pub fn report(ctx: &Context, spec_file: Utf8PathBuf) -> SddResult<()> {
    let doc = load_document(&spec_file)?;
    let issues = sdd_validate::validate(&doc);

    let mut markdown = format!("# Validation report: {}\n\n", doc.spec_id);
    if issues.is_empty() {
        markdown.push_str("No issues found.\n");
    } else {
        markdown.push_str(&format!("{} issue(s) found.\n\n", issues.len()));
        for issue in &issues {
            markdown.push_str(&format!("- **[{:?}] {}** `{}`: {}\n", issue.severity, issue.code, issue.location, issue.message));
        }
    }

    let reports_dir = Utf8PathBuf::from(".reports");
    std::fs::create_dir_all(reports_dir.as_std_path()).map_err(|source| SddError::IoError {
        path: Some(reports_dir.as_std_path().to_path_buf()),
        source,
    })?;
    let report_path = reports_dir.join(format!("{}-validation-report.md", doc.spec_id));
    sdd_utils::atomic_write::write_file_atomic(&report_path, &markdown)?;

    #[derive(Debug, Serialize)]
    struct ReportResult {
        spec_id: String,
        report_path: String,
        issue_count: usize,
    }
    let result = ReportResult {
        spec_id: doc.spec_id.clone(),
        report_path: report_path.to_string(),
        issue_count: issues.len(),
    };
    output::emit(ctx.json, ctx.quiet, &result, || format!("wrote {}", result.report_path));
    Ok(())
}

#[derive(Debug, Serialize)]
struct StatsResult {
    spec_id: String,
    total: u64,
    by_status: BTreeMap<String, u64>,
    by_type: BTreeMap<String, u64>,
}

pub fn stats(ctx: &Context, spec_file: Utf8PathBuf) -> SddResult<()> {
    let doc = load_document(&spec_file)?;

    let mut by_status: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_type: BTreeMap<String, u64> = BTreeMap::new();
    let mut total = 0u64;
    for node in doc.iter_nodes() {
        total += 1;
        *by_status.entry(status_key(node.status)).or_insert(0) += 1;
        *by_type.entry(type_key(node.node_type)).or_insert(0) += 1;
    }

    let result = StatsResult { spec_id: doc.spec_id.clone(), total, by_status, by_type };
    output::emit(ctx.json, ctx.quiet, &result, || {
        let mut lines = vec![format!("{} — {} node(s)", result.spec_id, result.total)];
        for (status, count) in &result.by_status {
            lines.push(format!("  {status}: {count}"));
        }
        for (node_type, count) in &result.by_type {
            lines.push(format!("  {node_type}: {count}"));
        }
        lines.join("\n")
    });
    Ok(())
}

fn status_key(status: NodeStatus) -> String {
    format!("{status:?}")
}

fn type_key(node_type: NodeType) -> String {
    format!("{node_type:?}")
}
