//! `parse-review` (spec.md §6.4): turn a Markdown review document into
//! the modification batch C7 applies. Ordered `##` section headers
//! name an op kind; each section's bullet lines are parsed into one op
//! of that kind.
//!
//! Recognized sections (header text, case/space-insensitive):
//!   ## Set Status
//!     - task-1-1 -> completed: optional note
//!   ## Mark Blocked
//!     - task-2-1: reason text (type: external, ticket: JIRA-42)
//!   ## Unblock
//!     - task-2-1: resolution text
//!   ## Add Journal
//!     - [decision] task-1-1: Title :: content
//!   ## Add Verification
//!     - verify-1-1: PASSED (optional detail)

use sdd_model::{JournalEntryType, ModificationOp, NodeId, NodeStatus, VerificationStatus};

fn normalize_header(line: &str) -> String {
    line.trim_start_matches('#').trim().to_lowercase().replace(' ', "_")
}

fn strip_bullet(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* "))
}

fn parse_node_status(raw: &str) -> Result<NodeStatus, String> {
    match raw.trim().to_lowercase().as_str() {
        "pending" => Ok(NodeStatus::Pending),
        "in_progress" | "in-progress" => Ok(NodeStatus::InProgress),
        "completed" | "complete" => Ok(NodeStatus::Completed),
        "blocked" => Ok(NodeStatus::Blocked),
        other => Err(format!("unknown status '{other}'")),
    }
}

fn parse_verification_status(raw: &str) -> Result<VerificationStatus, String> {
    match raw.trim().to_uppercase().as_str() {
        "PASSED" => Ok(VerificationStatus::Passed),
        "FAILED" => Ok(VerificationStatus::Failed),
        "PARTIAL" => Ok(VerificationStatus::Partial),
        other => Err(format!("unknown verification result '{other}'")),
    }
}

fn parse_journal_entry_type(raw: &str) -> JournalEntryType {
    match raw.trim().to_lowercase().as_str() {
        "decision" => JournalEntryType::Decision,
        "deviation" => JournalEntryType::Deviation,
        "blocker" => JournalEntryType::Blocker,
        "status_change" | "status-change" => JournalEntryType::StatusChange,
        "verification" => JournalEntryType::Verification,
        "system" => JournalEntryType::System,
        _ => JournalEntryType::Note,
    }
}

fn parse_set_status(line: &str) -> Result<ModificationOp, String> {
    let (id_part, rest) = line.split_once("->").ok_or_else(|| format!("expected 'id -> status': {line}"))?;
    let (status_part, note) = match rest.split_once(':') {
        Some((s, n)) => (s, Some(n.trim().to_string()).filter(|s| !s.is_empty())),
        None => (rest, None),
    };
    Ok(ModificationOp::SetStatus {
        node_id: NodeId::from(id_part.trim()),
        status: parse_node_status(status_part)?,
        note,
    })
}

fn parse_mark_blocked(line: &str) -> Result<ModificationOp, String> {
    let (id_part, rest) = line.split_once(':').ok_or_else(|| format!("expected 'id: reason': {line}"))?;
    let (reason, tags) = match rest.split_once('(') {
        Some((r, t)) => (r.trim(), t.trim_end_matches(')')),
        None => (rest.trim(), ""),
    };
    let mut blocker_type = "other".to_string();
    let mut ticket = None;
    for part in tags.split(',') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("type:") {
            blocker_type = value.trim().to_string();
        } else if let Some(value) = part.strip_prefix("ticket:") {
            ticket = Some(value.trim().to_string());
        }
    }
    Ok(ModificationOp::MarkBlocked {
        node_id: NodeId::from(id_part.trim()),
        reason: reason.to_string(),
        blocker_type,
        ticket,
    })
}

fn parse_unblock(line: &str) -> Result<ModificationOp, String> {
    let (id_part, resolution) = line.split_once(':').ok_or_else(|| format!("expected 'id: resolution': {line}"))?;
    Ok(ModificationOp::Unblock {
        node_id: NodeId::from(id_part.trim()),
        resolution: resolution.trim().to_string(),
    })
}

fn parse_add_journal(spec_id: &str, line: &str) -> Result<ModificationOp, String> {
    let mut rest = line.trim();
    let mut entry_type = JournalEntryType::Note;
    if let Some(stripped) = rest.strip_prefix('[') {
        let (tag, after) = stripped.split_once(']').ok_or_else(|| format!("unterminated '[...]' tag: {line}"))?;
        entry_type = parse_journal_entry_type(tag);
        rest = after.trim_start();
    }
    let (id_part, after_id) = rest.split_once(':').ok_or_else(|| format!("expected 'id: title :: content': {line}"))?;
    let (title, content) = after_id.split_once("::").ok_or_else(|| format!("expected 'title :: content': {line}"))?;
    Ok(ModificationOp::AddJournal {
        spec_id: spec_id.to_string(),
        entry_type,
        title: title.trim().to_string(),
        content: content.trim().to_string(),
        node_id: Some(NodeId::from(id_part.trim())).filter(|_| !id_part.trim().is_empty()),
    })
}

fn parse_add_verification(line: &str) -> Result<ModificationOp, String> {
    let (id_part, rest) = line.split_once(':').ok_or_else(|| format!("expected 'verify-id: RESULT': {line}"))?;
    let (result_part, detail) = match rest.split_once('(') {
        Some((r, d)) => (r.trim(), Some(d.trim_end_matches(')').trim().to_string()).filter(|s| !s.is_empty())),
        None => (rest.trim(), None),
    };
    Ok(ModificationOp::AddVerification {
        verify_id: NodeId::from(id_part.trim()),
        result: parse_verification_status(result_part)?,
        detail,
    })
}

/// Parse a Markdown review document into the ops it describes.
pub fn parse(spec_id: &str, markdown: &str) -> Result<Vec<ModificationOp>, String> {
    let mut ops = Vec::new();
    let mut section = String::new();

    for (lineno, raw_line) in markdown.lines().enumerate() {
        let line = raw_line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        if line.trim_start().starts_with("## ") {
            section = normalize_header(line);
            continue;
        }
        let Some(bullet) = strip_bullet(line) else { continue };
        if bullet.is_empty() {
            continue;
        }

        let op = match section.as_str() {
            "set_status" => parse_set_status(bullet),
            "mark_blocked" => parse_mark_blocked(bullet),
            "unblock" => parse_unblock(bullet),
            "add_journal" => parse_add_journal(spec_id, bullet),
            "add_verification" => parse_add_verification(bullet),
            "" => Err(format!("bullet outside any '## <op kind>' section on line {}", lineno + 1)),
            other => Err(format!("unrecognized review section '{other}' on line {}", lineno + 1)),
        };
        ops.push(op.map_err(|e| format!("line {}: {e}", lineno + 1))?);
    }

    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_review_across_every_section() {
        let markdown = "\
## Set Status
- task-1-1 -> completed: looks good

## Mark Blocked
- task-2-1: waiting on vendor (type: external, ticket: JIRA-42)

## Unblock
- task-2-1: vendor replied

## Add Journal
- [decision] task-1-1: Chose approach :: went with option B

## Add Verification
- verify-1-1: PASSED (clean run)
";
        let ops = parse("demo-001", markdown).unwrap();
        assert_eq!(ops.len(), 5);
        assert!(matches!(ops[0], ModificationOp::SetStatus { status: NodeStatus::Completed, .. }));
        assert!(matches!(ops[1], ModificationOp::MarkBlocked { .. }));
        assert!(matches!(ops[2], ModificationOp::Unblock { .. }));
        assert!(matches!(ops[3], ModificationOp::AddJournal { .. }));
        assert!(matches!(ops[4], ModificationOp::AddVerification { result: VerificationStatus::Passed, .. }));
    }

    #[test]
    fn a_bullet_before_any_section_header_is_an_error() {
        let err = parse("demo-001", "- task-1-1 -> completed").unwrap_err();
        assert!(err.contains("outside any"));
    }

    #[test]
    fn an_unrecognized_status_is_rejected() {
        let markdown = "## Set Status\n- task-1-1 -> not-a-status\n";
        let err = parse("demo-001", markdown).unwrap_err();
        assert!(err.contains("unknown status"));
    }
}
