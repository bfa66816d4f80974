//! UiPort (spec.md §4.10): a pure sink for C9/C7/C8 output. The core
//! never hard-codes a choice between a rich terminal and plain text —
//! callers pick an implementation and pass `&dyn UiPort` down.
//!
//! Grounded on `xchecker-gate`'s JSON-vs-text dual rendering
//! (`json.rs`'s `GateJsonOutput` alongside its plain summary strings),
//! generalized here into one port with one event enum instead of a
//! bespoke wrapper type per command.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    ResultLine { text: String },
    Table { table: TableData },
    Tree { root: TreeNode },
    Progress { tool: String, phase: String, percent: Option<u8> },
    Warning { text: String },
    Error { text: String },
    JsonDump { value: serde_json::Value },
}

/// A sink for [`UiEvent`]s. Implementations never return an error or
/// mutate engine state — rendering failures (e.g. a broken pipe) are
/// swallowed, matching "pure sink" in spec.md §4.10.
pub trait UiPort {
    fn print(&self, event: &UiEvent);
}

/// Rich-terminal rendering: trees are indented, tables are column
/// aligned, warnings/errors get a prefix. No color/ANSI codes here —
/// those belong to a terminal-capability-aware wrapper one layer up,
/// not to the port contract itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct RichUi;

impl UiPort for RichUi {
    fn print(&self, event: &UiEvent) {
        match event {
            UiEvent::ResultLine { text } => println!("{text}"),
            UiEvent::Table { table } => print_table(table),
            UiEvent::Tree { root } => print_tree(root, 0),
            UiEvent::Progress { tool, phase, percent } => match percent {
                Some(percent) => println!("[{tool}] {phase} ({percent}%)"),
                None => println!("[{tool}] {phase}"),
            },
            UiEvent::Warning { text } => eprintln!("Warning: {text}"),
            UiEvent::Error { text } => eprintln!("Error: {text}"),
            UiEvent::JsonDump { value } => {
                if let Ok(pretty) = serde_json::to_string_pretty(value) {
                    println!("{pretty}");
                }
            }
        }
    }
}

fn print_table(table: &TableData) {
    let mut widths: Vec<usize> = table.headers.iter().map(String::len).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.len());
            }
        }
    }
    let render_row = |cells: &[String]| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths.get(i).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
            .join("  ")
    };
    println!("{}", render_row(&table.headers));
    for row in &table.rows {
        println!("{}", render_row(row));
    }
}

fn print_tree(node: &TreeNode, depth: usize) {
    println!("{}{}", "  ".repeat(depth), node.label);
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

/// Plain rendering: one line per event, always `--json`-friendly via
/// [`UiEvent`]'s own `Serialize` derive; no layout computation.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainUi;

impl UiPort for PlainUi {
    fn print(&self, event: &UiEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(_) => println!("{event:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rich_and_plain_both_accept_every_event_variant() {
        let events = vec![
            UiEvent::ResultLine { text: "done".to_string() },
            UiEvent::Table { table: TableData { headers: vec!["a".to_string()], rows: vec![] } },
            UiEvent::Tree { root: TreeNode { label: "root".to_string(), children: vec![] } },
            UiEvent::Progress { tool: "claude".to_string(), phase: "review".to_string(), percent: Some(50) },
            UiEvent::Warning { text: "careful".to_string() },
            UiEvent::Error { text: "broken".to_string() },
            UiEvent::JsonDump { value: serde_json::json!({"a": 1}) },
        ];
        for event in &events {
            RichUi.print(event);
            PlainUi.print(event);
        }
    }

    #[test]
    fn plain_ui_emits_valid_json_lines() {
        let event = UiEvent::ResultLine { text: "hello".to_string() };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "result_line");
        assert_eq!(parsed["text"], "hello");
    }
}
