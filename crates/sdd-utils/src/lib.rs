//! Error taxonomy, exit codes, logging, atomic writes, canonical hashing, and
//! path discovery shared by every other `sdd` crate.

pub mod atomic_write;
pub mod canonical;
pub mod clock;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod paths;

pub use error::{SddError, SddResult};
pub use exit_codes::ExitCode;
