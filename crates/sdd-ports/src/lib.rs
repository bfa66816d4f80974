//! C10 Git & UI Ports (spec.md §4.10): two narrow outbound contracts
//! so the core engine never hard-codes a VCS or an output style.

mod git;
mod ui;

pub use git::{commit, create_pr, has_changes, push, should_offer_commit, CommitCadence, GitEvent, PullRequest};
pub use ui::{PlainUi, RichUi, TableData, TreeNode, UiEvent, UiPort};
