//! Pure, in-memory computation over a loaded `Document`: the index/arena
//! view (no I/O), status propagation (C3), the dependency graph (C4), and
//! the task scheduler (C5). Nothing here touches the filesystem or
//! acquires locks; callers own the `SpecStore`/`SpecLock` lifecycle and
//! pass the loaded `Document` in.

pub mod graph;
pub mod index;
pub mod scheduler;
pub mod status_engine;

pub use graph::{Blocker, Bottleneck, Graph, Orphan};
pub use index::Index;
pub use scheduler::{next_task, SchedulerOutcome, TaskFilters};
pub use status_engine::{propagate_from_leaf, AutoCompletion};
