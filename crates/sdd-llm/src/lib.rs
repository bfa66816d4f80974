//! C8 provider abstraction (spec.md §4.8, §6.5): the common
//! `ToolResponse` shape and the subprocess invocation that produces it.
//!
//! This crate knows how to run a single provider. Fan-out across
//! several providers (`single`/`parallel`/`with_fallback`), the
//! on-disk response cache, and model resolution against `sdd-config`
//! live one layer up, in the orchestrator.

mod protocol;
mod subprocess;
mod types;

pub use protocol::{parse_stdout, ParsedOutput};
pub use subprocess::{invoke, Invocation};
pub use types::{Message, ProviderRequest, Role, ToolResponse};
