//! Structured logging infrastructure (ambient concern, SPEC_FULL.md A2).
//!
//! Compact output by default; `--verbose` switches to a format carrying
//! `spec_id`, `node_id`, and `duration_ms` fields on every span.

use std::io::IsTerminal;
use tracing::{Level, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Whether colored output should be used: only when stdout is a TTY and
/// `NO_COLOR` is unset.
#[must_use]
pub fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the global tracing subscriber. Idempotent: a second call is a
/// silent no-op (tests may call this more than once).
pub fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("sdd=debug,info")
        } else {
            EnvFilter::new("sdd=info,warn")
        }
    });

    // Always write to stderr: stdout is reserved for command output (and,
    // in `--json` mode, exactly one JSON document per spec.md §6.6).
    let result = if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
            .try_init()
    };
    // A double-init only happens in test harnesses sharing one process.
    let _ = result;
}

/// Span wrapping one C7 transaction: `load -> mutate -> validate -> save`.
#[must_use]
pub fn transaction_span(spec_id: &str, op_count: usize) -> tracing::Span {
    span!(Level::INFO, "transaction", spec_id = %spec_id, op_count = %op_count)
}

/// Span wrapping one C5 scheduler decision.
#[must_use]
pub fn scheduler_span(spec_id: &str) -> tracing::Span {
    span!(Level::INFO, "next_task", spec_id = %spec_id)
}

/// Span wrapping one C8 provider subprocess invocation.
#[must_use]
pub fn provider_span(tool: &str, model: &str) -> tracing::Span {
    span!(Level::INFO, "consult", tool = %tool, model = %model)
}

/// Log a completed C1 save with its duration.
pub fn log_save_complete(spec_id: &str, bucket: &str, duration_ms: u128) {
    info!(spec_id = %spec_id, bucket = %bucket, duration_ms = %duration_ms, "spec saved");
}
