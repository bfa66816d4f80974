//! The `sdd` argument grammar (spec.md §6.1): one root command, global
//! flags on every subcommand, and a `Commands` enum covering spec
//! lifecycle, task discovery, progress, inspection, validation,
//! modification, consultation, and cache management.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "sdd", version, about = "Spec-driven development engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit machine-readable JSON instead of formatted text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Emit verbose tracing spans carrying spec/node/duration fields.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable ANSI color regardless of terminal detection.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Emit debug-level tracing in addition to info/warn.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Override the discovered `specs_root` for this invocation.
    #[arg(long = "specs-root", global = true)]
    pub specs_root: Option<Utf8PathBuf>,

    /// Load configuration from this file instead of discovering one.
    #[arg(long = "config", global = true)]
    pub config_path: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum CliNodeStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl From<CliNodeStatus> for sdd_model::NodeStatus {
    fn from(value: CliNodeStatus) -> Self {
        match value {
            CliNodeStatus::Pending => sdd_model::NodeStatus::Pending,
            CliNodeStatus::InProgress => sdd_model::NodeStatus::InProgress,
            CliNodeStatus::Completed => sdd_model::NodeStatus::Completed,
            CliNodeStatus::Blocked => sdd_model::NodeStatus::Blocked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum CliNodeType {
    Phase,
    Group,
    Task,
    Verify,
}

impl From<CliNodeType> for sdd_model::NodeType {
    fn from(value: CliNodeType) -> Self {
        match value {
            CliNodeType::Phase => sdd_model::NodeType::Phase,
            CliNodeType::Group => sdd_model::NodeType::Group,
            CliNodeType::Task => sdd_model::NodeType::Task,
            CliNodeType::Verify => sdd_model::NodeType::Verify,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum CliTaskCategory {
    Implementation,
    Test,
    Doc,
    Research,
    Verification,
}

impl From<CliTaskCategory> for sdd_model::TaskCategory {
    fn from(value: CliTaskCategory) -> Self {
        match value {
            CliTaskCategory::Implementation => sdd_model::TaskCategory::Implementation,
            CliTaskCategory::Test => sdd_model::TaskCategory::Test,
            CliTaskCategory::Doc => sdd_model::TaskCategory::Doc,
            CliTaskCategory::Research => sdd_model::TaskCategory::Research,
            CliTaskCategory::Verification => sdd_model::TaskCategory::Verification,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPERCASE")]
pub enum CliVerificationStatus {
    Passed,
    Failed,
    Partial,
}

impl From<CliVerificationStatus> for sdd_model::VerificationStatus {
    fn from(value: CliVerificationStatus) -> Self {
        match value {
            CliVerificationStatus::Passed => sdd_model::VerificationStatus::Passed,
            CliVerificationStatus::Failed => sdd_model::VerificationStatus::Failed,
            CliVerificationStatus::Partial => sdd_model::VerificationStatus::Partial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum CliJournalEntryType {
    Decision,
    Deviation,
    Blocker,
    Note,
    StatusChange,
    Verification,
    System,
}

impl From<CliJournalEntryType> for sdd_model::JournalEntryType {
    fn from(value: CliJournalEntryType) -> Self {
        match value {
            CliJournalEntryType::Decision => sdd_model::JournalEntryType::Decision,
            CliJournalEntryType::Deviation => sdd_model::JournalEntryType::Deviation,
            CliJournalEntryType::Blocker => sdd_model::JournalEntryType::Blocker,
            CliJournalEntryType::Note => sdd_model::JournalEntryType::Note,
            CliJournalEntryType::StatusChange => sdd_model::JournalEntryType::StatusChange,
            CliJournalEntryType::Verification => sdd_model::JournalEntryType::Verification,
            CliJournalEntryType::System => sdd_model::JournalEntryType::System,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    // ---- Spec lifecycle ----
    /// Create a new spec in the `pending` bucket.
    Create {
        /// Human-readable title; the spec id is slugified from it unless `--id` is given.
        title: String,
        #[arg(long)]
        id: Option<String>,
        /// `NxM` (phases x tasks-per-phase) or `blank`.
        #[arg(long, default_value = "blank")]
        template: String,
    },
    /// Move a spec from `pending` to `active`.
    Activate { spec_id: String },
    /// Move a spec to an arbitrary lifecycle bucket.
    MoveSpec {
        spec_id: String,
        bucket: CliSpecBucket,
    },
    /// Mark a spec `completed` and move it to the `completed` bucket.
    CompleteSpec { spec_id: String },
    /// List every spec, optionally filtered to one bucket.
    ListSpecs {
        #[arg(long)]
        bucket: Option<CliSpecBucket>,
    },
    /// List specs whose id or title contains `query`.
    FindSpecs { query: String },

    // ---- Task discovery ----
    /// Select the next actionable task (spec.md §4.5).
    NextTask {
        spec_id: String,
        #[arg(long)]
        phase: Option<u32>,
        #[arg(long)]
        category: Option<CliTaskCategory>,
        #[arg(long)]
        skill: Option<String>,
    },
    /// Mark a task `in_progress` and print its full detail.
    PrepareTask { spec_id: String, task_id: String },
    /// Print full detail for one task: metadata, blockers, journal.
    TaskInfo { spec_id: String, task_id: String },
    /// Report a task's blockers and readiness.
    CheckDeps { spec_id: String, task_id: String },

    // ---- Progress ----
    /// Set a node's status directly.
    UpdateStatus {
        spec_id: String,
        task_id: String,
        status: CliNodeStatus,
        #[arg(long)]
        note: Option<String>,
    },
    /// Complete a task with a required journal entry.
    CompleteTask {
        spec_id: String,
        task_id: String,
        #[arg(long, default_value = "Task completed")]
        journal_title: String,
        #[arg(long)]
        journal_content: String,
        #[arg(long, value_enum, default_value = "note")]
        entry_type: CliJournalEntryType,
    },
    /// Mark a task `blocked`.
    MarkBlocked {
        spec_id: String,
        task_id: String,
        #[arg(long)]
        reason: String,
        #[arg(long = "type")]
        blocker_type: String,
        #[arg(long)]
        ticket: Option<String>,
    },
    /// Clear a task's `blocked` status.
    UnblockTask {
        spec_id: String,
        task_id: String,
        #[arg(long)]
        resolution: String,
    },
    /// Append a free-standing journal entry.
    AddJournal {
        spec_id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long, value_enum, default_value = "note")]
        entry_type: CliJournalEntryType,
        #[arg(long)]
        task_id: Option<String>,
    },
    /// Record a verification outcome.
    AddVerification {
        spec_id: String,
        verify_id: String,
        result: CliVerificationStatus,
        #[arg(long)]
        detail: Option<String>,
    },

    // ---- Inspection ----
    /// Print rolled-up progress counts.
    Progress { spec_id: String },
    /// Print a full status report (progress, phases, blockers).
    StatusReport { spec_id: String },
    /// List top-level phases with their counts.
    ListPhases { spec_id: String },
    /// List tasks matching a filter.
    QueryTasks {
        spec_id: String,
        #[arg(long)]
        status: Option<CliNodeStatus>,
        #[arg(long = "type")]
        node_type: Option<CliNodeType>,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        skill: Option<String>,
    },
    /// List every currently blocked node.
    ListBlockers { spec_id: String },
    /// Report cycles, orphans, and bottlenecks in the dependency graph.
    AnalyzeDeps {
        spec_id: String,
        #[arg(long, default_value_t = 3)]
        bottleneck_threshold: usize,
    },

    // ---- Validation (operates on a spec JSON file directly) ----
    /// Validate a spec file against I1-I10, reporting issues.
    Validate { spec_file: Utf8PathBuf },
    /// Apply idempotent auto-fixers to a spec file.
    Fix {
        spec_file: Utf8PathBuf,
        #[arg(long)]
        dry_run: bool,
        /// Persist any hierarchy reparenting `fix` proposes (default: warn only).
        #[arg(long)]
        apply: bool,
    },
    /// Write a Markdown validation report alongside the spec file.
    Report { spec_file: Utf8PathBuf },
    /// Print node/status/type counts for a spec file.
    Stats { spec_file: Utf8PathBuf },

    // ---- Modification ----
    /// Apply a batch of modification ops from a JSON file.
    ApplyModifications {
        spec_id: String,
        #[arg(long)]
        from: Utf8PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Parse a Markdown review into a modification batch and apply it.
    ParseReview {
        spec_id: String,
        #[arg(long)]
        review: Utf8PathBuf,
        #[arg(long)]
        dry_run: bool,
    },

    // ---- Consultation ----
    /// Consult one or more providers for a plan review.
    PlanReview {
        spec_id: String,
        #[arg(long, value_delimiter = ',')]
        tools: Vec<String>,
        #[arg(long)]
        fallback: bool,
    },
    /// Consult one or more providers for a fidelity review of a task or phase.
    FidelityReview {
        spec_id: String,
        node_id: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tools: Vec<String>,
        #[arg(long)]
        fallback: bool,
    },
    /// List the configured, enabled review tools.
    ListReviewTools,

    // ---- Cache ----
    /// Summarize the on-disk consultation response cache.
    CacheInfo,
    /// Clear cached consultation responses.
    CacheClear {
        #[arg(long = "spec-id")]
        spec_id: Option<String>,
        #[arg(long = "review-type")]
        review_type: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum CliSpecBucket {
    Pending,
    Active,
    Completed,
    Archived,
}

impl From<CliSpecBucket> for sdd_model::SpecStatus {
    fn from(value: CliSpecBucket) -> Self {
        match value {
            CliSpecBucket::Pending => sdd_model::SpecStatus::Pending,
            CliSpecBucket::Active => sdd_model::SpecStatus::Active,
            CliSpecBucket::Completed => sdd_model::SpecStatus::Completed,
            CliSpecBucket::Archived => sdd_model::SpecStatus::Archived,
        }
    }
}
