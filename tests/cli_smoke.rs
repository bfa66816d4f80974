//! End-to-end smoke tests driving the `sdd` binary through a full
//! create → activate → next-task → complete-task → progress cycle,
//! each command invoked as a real subprocess with `--specs-root`
//! pointed at an isolated temp directory and `--json` for assertions.

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

fn sdd(root: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("sdd").unwrap();
    cmd.arg("--json").arg("--specs-root").arg(root);
    cmd
}

fn json(output: std::process::Output) -> Value {
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout should be one JSON document")
}

#[test]
fn full_lifecycle_reaches_completion() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    let created = json(sdd(root).args(["create", "Demo Feature", "--id", "demo-smoke", "--template", "1x2"]).output().unwrap());
    assert_eq!(created["spec_id"], "demo-smoke");

    let activated = json(sdd(root).args(["activate", "demo-smoke"]).output().unwrap());
    assert_eq!(activated["bucket"], "active");

    let next = json(sdd(root).args(["next-task", "demo-smoke"]).output().unwrap());
    assert_eq!(next["outcome"], "next");
    assert_eq!(next["task_id"], "task-1-1");

    let completed = json(sdd(root)
        .args(["complete-task", "demo-smoke", "task-1-1", "--journal-content", "implemented the happy path"])
        .output()
        .unwrap());
    assert_eq!(completed["ops_applied"], serde_json::json!(["complete_task"]));

    let progress = json(sdd(root).args(["progress", "demo-smoke"]).output().unwrap());
    assert_eq!(progress["completed"], 1);
    assert_eq!(progress["total"], 2);

    let second = json(sdd(root)
        .args(["complete-task", "demo-smoke", "task-1-2", "--journal-content", "implemented the rest"])
        .output()
        .unwrap());
    let auto_completions: Vec<String> = serde_json::from_value(second["auto_completions"].clone()).unwrap();
    assert!(auto_completions.contains(&"phase-1".to_string()));

    let spec_progress = json(sdd(root).args(["progress", "demo-smoke"]).output().unwrap());
    assert_eq!(spec_progress["percent"], 100);

    let final_state = json(sdd(root).args(["complete-spec", "demo-smoke"]).output().unwrap());
    assert_eq!(final_state["bucket"], "completed");

    let listed = json(sdd(root).args(["list-specs", "--bucket", "completed"]).output().unwrap());
    let specs = listed.as_array().unwrap();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0]["spec_id"], "demo-smoke");
}

#[test]
fn unknown_task_id_exits_nonzero_with_a_structured_error() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    sdd(root).args(["create", "Demo", "--id", "demo-err", "--template", "1x1"]).output().unwrap();

    let output = sdd(root).args(["task-info", "demo-err", "task-9-9"]).output().unwrap();
    assert!(!output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["error"]["kind"], "NotFound");
}

#[test]
fn mark_blocked_then_unblock_round_trips_through_status() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    sdd(root).args(["create", "Demo", "--id", "demo-block", "--template", "1x1"]).output().unwrap();

    let blocked = json(sdd(root)
        .args(["mark-blocked", "demo-block", "task-1-1", "--reason", "waiting on API", "--type", "external"])
        .output()
        .unwrap());
    assert_eq!(blocked["ops_applied"], serde_json::json!(["mark_blocked"]));

    let blockers = json(sdd(root).args(["list-blockers", "demo-block"]).output().unwrap());
    assert_eq!(blockers.as_array().unwrap().len(), 1);

    let unblocked = json(sdd(root)
        .args(["unblock-task", "demo-block", "task-1-1", "--resolution", "API shipped"])
        .output()
        .unwrap());
    assert_eq!(unblocked["ops_applied"], serde_json::json!(["unblock"]));
}
