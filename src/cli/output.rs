//! Rendering the single-document output contract (spec.md §6.6): in
//! `--json` mode every command writes exactly one JSON document to
//! stdout and nothing else; in text mode output is free-form.

use serde::Serialize;
use sdd_utils::SddError;

/// Emit a command's result: one JSON document in `--json` mode, or
/// `text()` (computed lazily, since building it is wasted work in JSON
/// mode) otherwise.
pub fn emit<T: Serialize>(json: bool, quiet: bool, value: &T, text: impl FnOnce() -> String) {
    if json {
        match serde_json::to_string(value) {
            Ok(line) => println!("{line}"),
            Err(e) => println!("{}", SddError::Internal(format!("failed to serialize result: {e}")).to_json()),
        }
    } else if !quiet {
        println!("{}", text());
    }
}

/// Render an error per spec.md §7: a single JSON document in `--json`
/// mode, or an `Error:` line (plus remediation hint) in text mode.
pub fn emit_error(json: bool, error: &SddError) {
    if json {
        println!("{}", error.to_json());
    } else {
        eprintln!("{}", error.display_for_user());
    }
}
