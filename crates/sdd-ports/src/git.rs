//! GitPort (spec.md §4.10): invoked by C7 after `complete_task` and
//! `complete_spec`, gated by session preferences. Every operation is
//! non-blocking to the transaction outcome — callers record a failure
//! as a journal `note` entry and move on, never rolling back.
//!
//! No teacher module talks to git directly; this is built straight
//! from the spec.md §4.10 contract, using the same argv-only
//! `tokio::process` invocation style as `sdd-llm::subprocess` (no
//! shell, no string interpolation into a command line).

use camino::Utf8Path;
use sdd_utils::{SddError, SddResult};

/// `session_preferences.commit_cadence` (spec.md §3): how often C7
/// should offer to commit after a completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitCadence {
    Task,
    Phase,
    Manual,
}

/// The completion event that triggered a GitPort check (spec.md §4.10:
/// "invoked by C7 after `complete_task` and `complete_spec`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitEvent {
    TaskCompleted,
    PhaseCompleted,
    SpecCompleted,
}

/// `should_offer_commit(cadence, event) -> bool` (spec.md §4.10).
/// `Manual` never offers. `Task` offers on every completion, the
/// finest grain available. `Phase` only offers once a phase or the
/// whole spec completes, skipping the noisier per-task granularity.
#[must_use]
pub fn should_offer_commit(cadence: CommitCadence, event: GitEvent) -> bool {
    match cadence {
        CommitCadence::Manual => false,
        CommitCadence::Task => true,
        CommitCadence::Phase => matches!(event, GitEvent::PhaseCompleted | GitEvent::SpecCompleted),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub url: String,
    pub number: u64,
}

async fn run_git(repo_root: &Utf8Path, args: &[&str]) -> SddResult<std::process::Output> {
    tracing::debug!(repo_root = %repo_root, args = ?args, "running git");
    tokio::process::Command::new("git")
        .arg("-C")
        .arg(repo_root.as_str())
        .args(args)
        .output()
        .await
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => SddError::ExternalToolNotFound("git".to_string()),
            _ => SddError::IoError { path: Some(repo_root.as_std_path().to_path_buf()), source },
        })
}

/// Does the working tree at `repo_root` have any uncommitted changes?
pub async fn has_changes(repo_root: &Utf8Path) -> SddResult<bool> {
    let output = run_git(repo_root, &["status", "--porcelain"]).await?;
    if !output.status.success() {
        return Err(git_failure("git status", &output));
    }
    Ok(!output.stdout.is_empty())
}

/// Stage every change and commit with `message`, returning the new commit's SHA.
pub async fn commit(repo_root: &Utf8Path, message: &str) -> SddResult<String> {
    let add = run_git(repo_root, &["add", "-A"]).await?;
    if !add.status.success() {
        return Err(git_failure("git add", &add));
    }
    let commit = run_git(repo_root, &["commit", "-m", message]).await?;
    if !commit.status.success() {
        return Err(git_failure("git commit", &commit));
    }
    let rev_parse = run_git(repo_root, &["rev-parse", "HEAD"]).await?;
    if !rev_parse.status.success() {
        return Err(git_failure("git rev-parse", &rev_parse));
    }
    Ok(String::from_utf8_lossy(&rev_parse.stdout).trim().to_string())
}

/// Push `branch` to its configured upstream (or `origin` if none is set).
pub async fn push(repo_root: &Utf8Path, branch: &str) -> SddResult<()> {
    let output = run_git(repo_root, &["push", "origin", branch]).await?;
    if !output.status.success() {
        return Err(git_failure("git push", &output));
    }
    Ok(())
}

/// Open a pull request via the `gh` CLI. `gh` is a separate
/// PATH-reachable tool, not part of `git` itself, so a missing `gh`
/// surfaces its own `ExternalToolNotFound`.
pub async fn create_pr(repo_root: &Utf8Path, title: &str, body: &str, base: &str) -> SddResult<PullRequest> {
    let output = tokio::process::Command::new("gh")
        .arg("-C")
        .arg(repo_root.as_str())
        .args(["pr", "create", "--title", title, "--body", body, "--base", base, "--json", "url,number"])
        .output()
        .await
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => SddError::ExternalToolNotFound("gh".to_string()),
            _ => SddError::IoError { path: Some(repo_root.as_std_path().to_path_buf()), source },
        })?;

    if !output.status.success() {
        return Err(git_failure("gh pr create", &output));
    }

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| SddError::Internal(format!("malformed 'gh pr create' output: {e}")))?;
    let url = value.get("url").and_then(serde_json::Value::as_str).unwrap_or_default().to_string();
    let number = value.get("number").and_then(serde_json::Value::as_u64).unwrap_or_default();
    Ok(PullRequest { url, number })
}

fn git_failure(step: &str, output: &std::process::Output) -> SddError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    SddError::Internal(format!("{step} failed (exit {}): {}", output.status, stderr.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_cadence_never_offers() {
        assert!(!should_offer_commit(CommitCadence::Manual, GitEvent::SpecCompleted));
        assert!(!should_offer_commit(CommitCadence::Manual, GitEvent::TaskCompleted));
    }

    #[test]
    fn task_cadence_offers_on_every_event() {
        assert!(should_offer_commit(CommitCadence::Task, GitEvent::TaskCompleted));
        assert!(should_offer_commit(CommitCadence::Task, GitEvent::PhaseCompleted));
        assert!(should_offer_commit(CommitCadence::Task, GitEvent::SpecCompleted));
    }

    #[test]
    fn phase_cadence_skips_individual_tasks() {
        assert!(!should_offer_commit(CommitCadence::Phase, GitEvent::TaskCompleted));
        assert!(should_offer_commit(CommitCadence::Phase, GitEvent::PhaseCompleted));
        assert!(should_offer_commit(CommitCadence::Phase, GitEvent::SpecCompleted));
    }

    #[tokio::test]
    async fn has_changes_reports_false_for_a_clean_repo() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        run_git(&root, &["init"]).await.unwrap();
        run_git(&root, &["config", "user.email", "test@example.com"]).await.unwrap();
        run_git(&root, &["config", "user.name", "test"]).await.unwrap();
        assert!(!has_changes(&root).await.unwrap());
    }

    #[tokio::test]
    async fn has_changes_reports_true_after_an_untracked_file_is_added() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        run_git(&root, &["init"]).await.unwrap();
        std::fs::write(root.join("new_file.txt").as_std_path(), "hello").unwrap();
        assert!(has_changes(&root).await.unwrap());
    }

    #[tokio::test]
    async fn commit_produces_a_resolvable_sha() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        run_git(&root, &["init"]).await.unwrap();
        run_git(&root, &["config", "user.email", "test@example.com"]).await.unwrap();
        run_git(&root, &["config", "user.name", "test"]).await.unwrap();
        std::fs::write(root.join("file.txt").as_std_path(), "content").unwrap();
        let sha = commit(&root, "test commit").await.unwrap();
        assert_eq!(sha.len(), 40);
    }
}
