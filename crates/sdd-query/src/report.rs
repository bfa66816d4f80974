//! `status_report` (spec.md §4.9): a single serializable record combining
//! progress, phases, and blockers, with a text rendering for non-`--json`
//! output (spec.md §6.6).

use std::fmt;

use sdd_model::{Document, SpecStatus};
use serde::Serialize;

use crate::blockers::{list_blockers, BlockerEntry};
use crate::phases::{list_phases, PhaseSummary};
use crate::progress::{progress_summary, ProgressSummary};

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub spec_id: String,
    pub status: SpecStatus,
    pub progress: ProgressSummary,
    pub phases: Vec<PhaseSummary>,
    pub blockers: Vec<BlockerEntry>,
}

#[must_use]
pub fn status_report(doc: &Document) -> StatusReport {
    StatusReport {
        spec_id: doc.spec_id.clone(),
        status: doc.status(),
        progress: progress_summary(doc),
        phases: list_phases(doc),
        blockers: list_blockers(doc),
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{:?}] — {}%", self.spec_id, self.status, self.progress.percent)?;
        writeln!(
            f,
            "  {} total, {} completed, {} in progress, {} pending, {} blocked",
            self.progress.total,
            self.progress.completed,
            self.progress.in_progress,
            self.progress.pending,
            self.progress.blocked,
        )?;
        for phase in &self.phases {
            writeln!(f, "  {} {:?} ({}%) — {}", phase.id.as_str(), phase.status, phase.counts.percent, phase.title)?;
        }
        for blocker in &self.blockers {
            writeln!(f, "  blocked: {} — {}", blocker.task_id.as_str(), blocker.reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_non_empty_text_summary_for_an_empty_document() {
        let doc = Document::new("demo-001");
        let report = status_report(&doc);
        let text = report.to_string();
        assert!(text.contains("demo-001"));
        assert!(text.contains("0%"));
    }
}
