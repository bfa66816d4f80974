//! C9 Query Surface (spec.md §4.9): read-only computed views over an
//! already-loaded `Document`. Every function here is pure — no I/O, no
//! locking, no mutation — so the CLI's read paths (`progress`,
//! `status-report`, `list-phases`, `query-tasks`, `task-info`,
//! `list-blockers`) can skip C7's transaction machinery entirely.
//!
//! Grounded on `xchecker-status`'s pattern of building one serializable
//! summary struct from state that's already loaded in memory.

mod blockers;
mod phases;
mod progress;
mod report;
mod tasks;

pub use blockers::{list_blockers, BlockerEntry};
pub use phases::{list_phases, PhaseSummary};
pub use progress::{progress_summary, ProgressSummary};
pub use report::{status_report, StatusReport};
pub use tasks::{get_task, query_tasks, task_info, TaskFilter, TaskInfo, TaskView};
