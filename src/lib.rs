//! The `sdd` command-line tool: a thin dispatch layer over the
//! `sdd-*` component crates (spec.md §6.1). Everything that actually
//! understands specs, invariants, scheduling, or consultation lives in
//! those crates; this crate only parses arguments, wires a `Context`,
//! and renders results.

pub mod cli;
