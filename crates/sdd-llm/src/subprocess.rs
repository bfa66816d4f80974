//! Provider subprocess invocation (spec.md §6.5): spawn the configured
//! command, write the prompt to stdin, consume stdout/stderr under a
//! timeout, and normalize the result to a [`ToolResponse`].
//!
//! Grounded on `xchecker-llm`'s backend adapters for the overall shape
//! (`ToolResponse` in, `ToolResponse` out) but not on `claude_cli.rs`'s
//! `Runner`/WSL machinery — the subprocess protocol here is generic
//! across any PATH-reachable tool, so it talks to `tokio::process`
//! directly instead of one bespoke Rust type per CLI.

use std::time::{Duration, Instant};

use sdd_utils::error::{ProviderFailureCategory, ProviderFailure};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::protocol::parse_stdout;
use crate::types::{ProviderRequest, ToolResponse};

/// Trailing stderr bytes kept for a failure's `stderr_tail` (spec.md §6.5).
const STDERR_TAIL_BYTES: usize = 64 * 1024;

/// Grace period between a polite termination request and a hard kill
/// (spec.md §4.8/§5).
const KILL_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// A provider invocation's full outcome: the normalized [`ToolResponse`]
/// plus, on failure, the category and stderr tail the orchestrator needs
/// to assemble a `ConsultationFailed` batch (spec.md §7).
#[derive(Debug, Clone)]
pub struct Invocation {
    pub response: ToolResponse,
    pub failure: Option<ProviderFailure>,
}

/// Invoke one provider. Never returns `Err` for a provider-side failure
/// (not installed, timeout, nonzero exit, malformed output) — those are
/// reported as `Invocation::failure` so a caller fanning out to several
/// providers can keep going. `Err` is reserved for invariant violations
/// (spawning `tokio::process` itself failing for a reason other than
/// "not found", e.g. permission denied).
pub async fn invoke(request: &ProviderRequest) -> sdd_utils::SddResult<Invocation> {
    if which::which(&request.command).is_err() {
        return Ok(not_installed(request));
    }

    tracing::debug!(tool = %request.tool, command = %request.command, model = %request.model, "invoking provider");
    let started = Instant::now();
    let mut child = match Command::new(&request.command)
        .args(&request.flags)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(not_installed(request)),
        Err(source) => {
            return Err(sdd_utils::SddError::IoError { path: None, source });
        }
    };

    let stdin_payload = match &request.system_prompt {
        Some(system) => format!("{system}\n\n{}", request.prompt),
        None => request.prompt.clone(),
    };
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(stdin_payload.as_bytes()).await;
        let _ = stdin.shutdown().await;
    }

    // Read stdout/stderr on their own tasks rather than via
    // `wait_with_output` so `child` stays ours to kill on timeout below.
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stdout_pipe {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stderr_pipe {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    });

    let wait_outcome = tokio::time::timeout(request.timeout, child.wait()).await;

    let elapsed_s = started.elapsed().as_secs_f64();

    let status = match wait_outcome {
        Ok(Ok(status)) => status,
        Ok(Err(source)) => return Err(sdd_utils::SddError::IoError { path: None, source }),
        Err(_) => {
            // Polite termination, then a hard kill after a grace period
            // (spec.md §4.8/§5).
            let _ = child.start_kill();
            if tokio::time::timeout(KILL_GRACE_PERIOD, child.wait()).await.is_err() {
                let _ = child.kill().await;
            }
            stdout_task.abort();
            stderr_task.abort();
            return Ok(timeout(request, elapsed_s));
        }
    };

    let stdout_bytes = stdout_task.await.unwrap_or_default();
    let stderr_bytes = stderr_task.await.unwrap_or_default();
    let output = std::process::Output { status, stdout: stdout_bytes, stderr: stderr_bytes };

    let stderr_tail = tail(&output.stderr, STDERR_TAIL_BYTES);

    if !output.status.success() {
        return Ok(Invocation {
            response: ToolResponse {
                tool: request.tool.clone(),
                model: request.model.clone(),
                text: String::new(),
                elapsed_s,
                success: false,
                error: Some(format!("exit status {}", output.status)),
                from_cache: false,
            },
            failure: Some(ProviderFailure {
                tool: request.tool.clone(),
                category: ProviderFailureCategory::NonzeroExit,
                stderr_tail,
            }),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed = parse_stdout(&stdout);

    if let Some(message) = parsed.protocol_error {
        return Ok(Invocation {
            response: ToolResponse {
                tool: request.tool.clone(),
                model: request.model.clone(),
                text: String::new(),
                elapsed_s,
                success: false,
                error: Some(message),
                from_cache: false,
            },
            failure: Some(ProviderFailure {
                tool: request.tool.clone(),
                category: ProviderFailureCategory::MalformedOutput,
                stderr_tail,
            }),
        });
    }

    Ok(Invocation {
        response: ToolResponse {
            tool: request.tool.clone(),
            model: request.model.clone(),
            text: parsed.text,
            elapsed_s,
            success: true,
            error: None,
            from_cache: false,
        },
        failure: None,
    })
}

fn not_installed(request: &ProviderRequest) -> Invocation {
    Invocation {
        response: ToolResponse {
            tool: request.tool.clone(),
            model: request.model.clone(),
            text: String::new(),
            elapsed_s: 0.0,
            success: false,
            error: Some(format!("'{}' not found on PATH", request.command)),
            from_cache: false,
        },
        failure: Some(ProviderFailure {
            tool: request.tool.clone(),
            category: ProviderFailureCategory::NotInstalled,
            stderr_tail: String::new(),
        }),
    }
}

fn timeout(request: &ProviderRequest, elapsed_s: f64) -> Invocation {
    Invocation {
        response: ToolResponse {
            tool: request.tool.clone(),
            model: request.model.clone(),
            text: String::new(),
            elapsed_s,
            success: false,
            error: Some(format!("timed out after {:.1}s", request.timeout.as_secs_f64())),
            from_cache: false,
        },
        failure: Some(ProviderFailure {
            tool: request.tool.clone(),
            category: ProviderFailureCategory::Timeout,
            stderr_tail: String::new(),
        }),
    }
}

fn tail(bytes: &[u8], max: usize) -> String {
    let start = bytes.len().saturating_sub(max);
    String::from_utf8_lossy(&bytes[start..]).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(command: &str, flags: Vec<&str>) -> ProviderRequest {
        ProviderRequest {
            tool: "test-tool".to_string(),
            command: command.to_string(),
            flags: flags.into_iter().map(String::from).collect(),
            model: "test-model".to_string(),
            prompt: "hello".to_string(),
            system_prompt: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn reports_not_installed_for_a_missing_binary() {
        let req = request("sdd-definitely-not-a-real-binary", vec![]);
        let outcome = invoke(&req).await.unwrap();
        assert!(!outcome.response.success);
        assert_eq!(
            outcome.failure.map(|f| f.category),
            Some(ProviderFailureCategory::NotInstalled)
        );
    }

    #[tokio::test]
    async fn reports_nonzero_exit() {
        let req = request("false", vec![]);
        let outcome = invoke(&req).await.unwrap();
        assert!(!outcome.response.success);
        assert_eq!(
            outcome.failure.map(|f| f.category),
            Some(ProviderFailureCategory::NonzeroExit)
        );
    }

    #[tokio::test]
    async fn reports_timeout_on_a_slow_command() {
        let mut req = request("sleep", vec!["2"]);
        req.timeout = Duration::from_millis(50);
        let outcome = invoke(&req).await.unwrap();
        assert!(!outcome.response.success);
        assert_eq!(
            outcome.failure.map(|f| f.category),
            Some(ProviderFailureCategory::Timeout)
        );
    }

    #[tokio::test]
    async fn succeeds_for_a_zero_exit_command() {
        let req = request("true", vec![]);
        let outcome = invoke(&req).await.unwrap();
        assert!(outcome.response.success);
        assert!(outcome.failure.is_none());
        assert!(!outcome.response.from_cache);
    }
}
