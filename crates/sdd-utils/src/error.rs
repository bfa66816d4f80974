//! Crate-wide error taxonomy.
//!
//! `SddError` is the single error type returned across component boundaries
//! (C1–C9). Library code never panics or calls `std::process::exit`; only
//! the CLI's `main` maps an `SddError` to an [`ExitCode`](crate::exit_codes::ExitCode)
//! and prints [`display_for_user`](SddError::display_for_user).
//!
//! Kinds match spec.md §7 exactly: `UserError`, `ValidationFailed`,
//! `LockContention`, `MalformedSpec`, `NotFound`, `DependencyBlocked`,
//! `CycleDetected`, `ConsultationFailed`, `ExternalToolNotFound`, `IoError`,
//! `Internal`.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Severity of a validation [`Issue`]; duplicated here (rather than depending
/// on `sdd-validate`) so the base error type has no upward dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

/// A flattened validation issue, enough to render in an error without
/// `sdd-utils` depending on `sdd-validate`'s richer `Issue` type.
#[derive(Debug, Clone, Serialize)]
pub struct IssueSummary {
    pub severity: IssueSeverity,
    pub code: String,
    pub location: String,
    pub message: String,
}

/// Category of a single provider failure inside a `ConsultationFailed` batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFailureCategory {
    NotInstalled,
    Timeout,
    NonzeroExit,
    MalformedOutput,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderFailure {
    pub tool: String,
    pub category: ProviderFailureCategory,
    pub stderr_tail: String,
}

#[derive(Error, Debug)]
pub enum SddError {
    /// Bad arguments, missing required fields, unknown spec/task/verify ID.
    #[error("{0}")]
    UserError(String),

    /// C2 returned one or more `error`-severity issues.
    #[error("validation failed: {} issue(s)", issues.len())]
    ValidationFailed {
        issues: Vec<IssueSummary>,
        rollback: bool,
    },

    /// Could not acquire the file lock within the configured timeout.
    #[error("could not acquire lock for {spec_id} (held by pid {holder_pid}, age {holder_age_secs}s)")]
    LockContention {
        spec_id: String,
        holder_pid: u32,
        holder_age_secs: u64,
    },

    /// JSON parse failed or schema `version` unsupported.
    #[error("malformed spec: {reason}")]
    MalformedSpec {
        reason: String,
        byte_offset: Option<usize>,
    },

    /// Spec or node missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation would violate dependency readiness.
    #[error("operation on {node_id} blocked by: {}", blockers.join(", "))]
    DependencyBlocked { node_id: String, blockers: Vec<String> },

    /// Structural operation would introduce a cycle.
    #[error("cycle detected: {}", cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },

    /// All providers in a consultation batch failed.
    #[error("consultation failed: all {} provider(s) failed", failures.len())]
    ConsultationFailed { failures: Vec<ProviderFailure> },

    /// Configured provider command missing from PATH.
    #[error("external tool not found on PATH: {0}")]
    ExternalToolNotFound(String),

    /// Underlying filesystem or subprocess IO error.
    #[error("io error at {path:?}: {source}")]
    IoError {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// Invariant violation or defensive assertion; always a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SddError {
    /// User-facing single-line message plus an optional remediation hint,
    /// rendered as `Error: <message>` in text mode (§7).
    #[must_use]
    pub fn display_for_user(&self) -> String {
        match self {
            SddError::ValidationFailed { rollback, .. } if *rollback => {
                format!("Error: {self}\nRun 'sdd fix <spec>' to auto-repair")
            }
            SddError::LockContention { .. } => {
                format!("Error: {self}\nAnother sdd process is working on this spec; retry shortly")
            }
            SddError::MalformedSpec { .. } => {
                format!("Error: {self}\nRun 'sdd validate <spec_file>' for details")
            }
            _ => format!("Error: {self}"),
        }
    }

    /// JSON rendering for `--json` mode: `{"error": {"kind", "message", "details"}}`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let kind = self.kind_name();
        let details = match self {
            SddError::ValidationFailed { issues, rollback } => {
                serde_json::json!({ "issues": issues, "rollback": rollback })
            }
            SddError::LockContention {
                spec_id,
                holder_pid,
                holder_age_secs,
            } => serde_json::json!({
                "spec_id": spec_id,
                "holder_pid": holder_pid,
                "holder_age_secs": holder_age_secs,
            }),
            SddError::MalformedSpec { reason, byte_offset } => {
                serde_json::json!({ "reason": reason, "byte_offset": byte_offset })
            }
            SddError::DependencyBlocked { node_id, blockers } => {
                serde_json::json!({ "node_id": node_id, "blockers": blockers })
            }
            SddError::CycleDetected { cycle } => serde_json::json!({ "cycle": cycle }),
            SddError::ConsultationFailed { failures } => serde_json::json!({ "failures": failures }),
            _ => serde_json::Value::Null,
        };
        serde_json::json!({
            "error": {
                "kind": kind,
                "message": self.to_string(),
                "details": details,
            }
        })
    }

    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            SddError::UserError(_) => "UserError",
            SddError::ValidationFailed { .. } => "ValidationFailed",
            SddError::LockContention { .. } => "LockContention",
            SddError::MalformedSpec { .. } => "MalformedSpec",
            SddError::NotFound(_) => "NotFound",
            SddError::DependencyBlocked { .. } => "DependencyBlocked",
            SddError::CycleDetected { .. } => "CycleDetected",
            SddError::ConsultationFailed { .. } => "ConsultationFailed",
            SddError::ExternalToolNotFound(_) => "ExternalToolNotFound",
            SddError::IoError { .. } => "IoError",
            SddError::Internal(_) => "Internal",
        }
    }
}

pub type SddResult<T> = Result<T, SddError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failed_hints_at_fix() {
        let err = SddError::ValidationFailed {
            issues: vec![],
            rollback: true,
        };
        assert!(err.display_for_user().contains("sdd fix"));
    }

    #[test]
    fn json_rendering_includes_kind_and_message() {
        let err = SddError::NotFound("task-1-1".into());
        let json = err.to_json();
        assert_eq!(json["error"]["kind"], "NotFound");
        assert!(json["error"]["message"].as_str().unwrap().contains("task-1-1"));
    }

    #[test]
    fn cycle_detected_renders_chain() {
        let err = SddError::CycleDetected {
            cycle: vec!["task-1-1".into(), "task-1-2".into()],
        };
        assert_eq!(err.to_string(), "cycle detected: task-1-1 -> task-1-2");
    }
}
