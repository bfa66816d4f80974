//! Wiring the `GitPort` outbound port (spec.md §4.10) into the two
//! lifecycle points that call for it: after `complete-task` and after
//! `complete-spec`. Kept at the CLI layer rather than inside
//! `sdd-transactor` so C7 stays synchronous and lock-scoped; this runs
//! strictly after a transaction has already committed, and every
//! failure here is swallowed into a journal `note` — it never unwinds
//! the command that triggered it (§4.10: "non-blocking to the C7
//! transaction outcome").

use std::sync::Once;

use camino::Utf8Path;
use sdd_model::{JournalEntryType, ModificationOp};
use sdd_ports::{commit, has_changes, should_offer_commit};
pub use sdd_ports::GitEvent;
use sdd_transactor::TransactionOptions;

use crate::cli::context::Context;

static WARNED_ABSENT_CADENCE: Once = Once::new();

/// `sdd_model`'s document-metadata cadence (serde-shaped for §3's
/// `session_preferences`) mapped to `sdd_ports`'s port-facing enum;
/// the two are kept as separate types so neither crate depends on the
/// other for a three-variant enum.
fn to_port_cadence(cadence: sdd_model::CommitCadence) -> sdd_ports::CommitCadence {
    match cadence {
        sdd_model::CommitCadence::Task => sdd_ports::CommitCadence::Task,
        sdd_model::CommitCadence::Phase => sdd_ports::CommitCadence::Phase,
        sdd_model::CommitCadence::Manual => sdd_ports::CommitCadence::Manual,
    }
}

/// Offer (and, if accepted implicitly by cadence policy, perform) a
/// commit after `event` fires for `spec_id`. Best-effort: every
/// failure is recorded as a journal note and logged, never surfaced to
/// the caller.
pub fn after_completion(ctx: &Context, spec_id: &str, event: GitEvent, message: &str) {
    let doc = match ctx.store().load(spec_id) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(spec_id, error = %e, "git hook: could not reload spec after completion");
            return;
        }
    };

    let cadence = match doc.metadata.session_preferences.as_ref().and_then(|p| p.commit_cadence) {
        Some(cadence) => to_port_cadence(cadence),
        None => {
            WARNED_ABSENT_CADENCE.call_once(|| {
                tracing::warn!(
                    spec_id,
                    "metadata.session_preferences.commit_cadence is unset; defaulting to 'manual' (spec.md §9 open question)"
                );
            });
            sdd_ports::CommitCadence::Manual
        }
    };

    if !should_offer_commit(cadence, event) {
        return;
    }

    let repo_root = Utf8Path::new(".");
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::warn!(error = %e, "git hook: failed to start an async runtime");
            return;
        }
    };

    let outcome = runtime.block_on(async {
        match has_changes(repo_root).await {
            Ok(false) => None,
            Ok(true) => Some(commit(repo_root, message).await),
            Err(e) => Some(Err(e)),
        }
    });

    let Some(result) = outcome else { return };

    let note = match result {
        Ok(sha) => {
            tracing::info!(spec_id, sha = %sha, "git hook: committed");
            format!("git: committed {sha} ({message})")
        }
        Err(e) => {
            tracing::warn!(spec_id, error = %e, "git hook: commit failed");
            format!("git: commit attempt failed: {e}")
        }
    };

    let op = ModificationOp::AddJournal {
        spec_id: spec_id.to_string(),
        entry_type: JournalEntryType::System,
        title: "git hook".to_string(),
        content: note,
        node_id: None,
    };
    if let Err(e) = ctx.transactor().apply(spec_id, &[op], TransactionOptions::default()) {
        tracing::warn!(spec_id, error = %e, "git hook: failed to journal outcome");
    }
}
