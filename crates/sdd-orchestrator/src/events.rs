//! Consultation progress events (spec.md §4.8, §6.6): emitted as a
//! provider invocation starts, finishes, or fails, so a CLI caller can
//! render a progress line per tool.
//!
//! Streaming `token_chunk` events are not emitted: `sdd-llm::invoke`
//! reads a provider's stdout to completion rather than line-by-line, so
//! there is nothing to stream until the call already has a final
//! result — at which point `Completed` carries it directly.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { tool: String },
    Completed { tool: String, elapsed_s: f64, from_cache: bool },
    Failed { tool: String, category: sdd_utils::error::ProviderFailureCategory },
}

/// Sink for progress events; `&dyn Fn` rather than a trait object with
/// state, since every implementation so far (C10's `UiPort`, tests) is
/// a stateless render-and-forget callback.
pub type ProgressSink<'a> = dyn Fn(ProgressEvent) + Send + Sync + 'a;

pub fn noop_sink(_event: ProgressEvent) {}
