//! The spec document data model (spec.md §3): nodes, dependencies,
//! metadata, journal entries, and the modification-op vocabulary.
//!
//! Kept deliberately "dumb": plain recursive trees, serde round-trips,
//! no traversal indices and no mutation logic. Those live in
//! `sdd-engine` and `sdd-transactor` respectively.

pub mod document;
pub mod journal;
pub mod metadata;
pub mod node;
pub mod node_id;
pub mod ops;
pub mod status;

pub use document::Document;
pub use journal::JournalEntry;
pub use metadata::{
    CommitRef, DocumentMetadata, GitMetadata, NodeMetadata, OnFailurePolicy, PrMetadata,
    SessionPreferences, VerificationResult, SUPPORTED_VERSION_RANGE,
};
pub use node::{Counts, Dependencies, Node};
pub use node_id::NodeId;
pub use ops::{JournalEntryInput, ModificationOp, NodeSpec};
pub use status::{
    CommitCadence, JournalEntryType, NodeStatus, NodeType, SpecStatus, TaskCategory, VerificationStatus,
};
