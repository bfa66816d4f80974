//! The `sdd` CLI (spec.md §6.1): argument parsing, config discovery,
//! and dispatch to the command handlers in `commands::*`. Everything
//! that understands specs lives in the `sdd-*` component crates; this
//! module only wires a [`Context`] and renders results per §6.6/§7.

pub mod args;
pub mod commands;
pub mod context;
mod git_hook;
pub mod listing;
pub mod output;
pub mod review_parser;
pub mod spec_id;

use camino::Utf8PathBuf;
use clap::Parser;
use sdd_config::discovery::{self, ConfigOverrides};
use sdd_utils::exit_codes::error_to_exit_code;
use sdd_utils::{logging, ExitCode, SddError, SddResult};

use args::{Cli, Commands};
use context::Context;

/// Parse arguments, discover config, dispatch, and render the outcome.
/// Returns `Err(code)` for `main` to translate into a process exit.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose || cli.debug);

    let cli_json = cli.json;
    let result = build_context(&cli).and_then(|ctx| dispatch(&ctx, cli.command));

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            output::emit_error(cli_json, &e);
            Err(error_to_exit_code(&e))
        }
    }
}

fn build_context(cli: &Cli) -> SddResult<Context> {
    let cwd = std::env::current_dir().map_err(|source| SddError::IoError { path: None, source })?;
    let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|p| SddError::Internal(format!("cwd is not valid UTF-8: {}", p.display())))?;

    let overrides = ConfigOverrides {
        specs_root: cli.specs_root.clone(),
        config_path: cli.config_path.clone(),
        json: if cli.json { Some(true) } else { None },
    };
    let discovered = discovery::discover_from(&cwd, &overrides)?;
    for issue in &discovered.issues {
        tracing::warn!(location = %issue.location, message = %issue.message, "config issue");
    }

    let json = cli.json || discovered.config.output.json;
    Ok(Context { config: discovered.config, json, quiet: cli.quiet })
}

fn dispatch(ctx: &Context, command: Commands) -> SddResult<()> {
    use commands::{cache, consult, inspect, lifecycle, modify, progress, tasks, validate};

    match command {
        // ---- Spec lifecycle ----
        Commands::Create { title, id, template } => lifecycle::create(ctx, title, id, template),
        Commands::Activate { spec_id } => lifecycle::activate(ctx, spec_id),
        Commands::MoveSpec { spec_id, bucket } => lifecycle::move_spec(ctx, spec_id, bucket.into()),
        Commands::CompleteSpec { spec_id } => lifecycle::complete_spec(ctx, spec_id),
        Commands::ListSpecs { bucket } => lifecycle::list_specs(ctx, bucket.map(Into::into)),
        Commands::FindSpecs { query } => lifecycle::find_specs(ctx, query),

        // ---- Task discovery ----
        Commands::NextTask { spec_id, phase, category, skill } => {
            tasks::next_task(ctx, spec_id, phase, category.map(Into::into), skill)
        }
        Commands::PrepareTask { spec_id, task_id } => tasks::prepare_task(ctx, spec_id, task_id),
        Commands::TaskInfo { spec_id, task_id } => tasks::task_info(ctx, spec_id, task_id),
        Commands::CheckDeps { spec_id, task_id } => tasks::check_deps(ctx, spec_id, task_id),

        // ---- Progress ----
        Commands::UpdateStatus { spec_id, task_id, status, note } => {
            progress::update_status(ctx, spec_id, task_id, status.into(), note)
        }
        Commands::CompleteTask { spec_id, task_id, journal_title, journal_content, entry_type } => {
            progress::complete_task(ctx, spec_id, task_id, journal_title, journal_content, entry_type.into())
        }
        Commands::MarkBlocked { spec_id, task_id, reason, blocker_type, ticket } => {
            progress::mark_blocked(ctx, spec_id, task_id, reason, blocker_type, ticket)
        }
        Commands::UnblockTask { spec_id, task_id, resolution } => progress::unblock_task(ctx, spec_id, task_id, resolution),
        Commands::AddJournal { spec_id, title, content, entry_type, task_id } => {
            progress::add_journal(ctx, spec_id, title, content, entry_type.into(), task_id)
        }
        Commands::AddVerification { spec_id, verify_id, result, detail } => {
            progress::add_verification(ctx, spec_id, verify_id, result.into(), detail)
        }

        // ---- Inspection ----
        Commands::Progress { spec_id } => inspect::progress(ctx, spec_id),
        Commands::StatusReport { spec_id } => inspect::status_report(ctx, spec_id),
        Commands::ListPhases { spec_id } => inspect::list_phases(ctx, spec_id),
        Commands::QueryTasks { spec_id, status, node_type, parent, skill } => {
            inspect::query_tasks(ctx, spec_id, status.map(Into::into), node_type.map(Into::into), parent, skill)
        }
        Commands::ListBlockers { spec_id } => inspect::list_blockers(ctx, spec_id),
        Commands::AnalyzeDeps { spec_id, bottleneck_threshold } => inspect::analyze_deps(ctx, spec_id, bottleneck_threshold),

        // ---- Validation ----
        Commands::Validate { spec_file } => validate::validate(ctx, spec_file),
        Commands::Fix { spec_file, dry_run, apply } => validate::fix(ctx, spec_file, dry_run, apply),
        Commands::Report { spec_file } => validate::report(ctx, spec_file),
        Commands::Stats { spec_file } => validate::stats(ctx, spec_file),

        // ---- Modification ----
        Commands::ApplyModifications { spec_id, from, dry_run } => modify::apply_modifications(ctx, spec_id, from, dry_run),
        Commands::ParseReview { spec_id, review, dry_run } => modify::parse_review(ctx, spec_id, review, dry_run),

        // ---- Consultation ----
        Commands::PlanReview { spec_id, tools, fallback } => consult::plan_review(ctx, spec_id, tools, fallback),
        Commands::FidelityReview { spec_id, node_id, tools, fallback } => {
            consult::fidelity_review(ctx, spec_id, node_id, tools, fallback)
        }
        Commands::ListReviewTools => consult::list_review_tools(ctx),

        // ---- Cache ----
        Commands::CacheInfo => cache::cache_info(ctx),
        Commands::CacheClear { spec_id, review_type } => cache::cache_clear(ctx, spec_id, review_type),
    }
}
