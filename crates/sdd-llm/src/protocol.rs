//! Provider subprocess protocol (spec.md §6.5): stdout is consumed
//! until EOF; each line is either a JSON object `{"type": "chunk" |
//! "done" | "error", ...}` or opaque text. Exit code zero plus any
//! received text is success.

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    pub text: String,
    pub protocol_error: Option<String>,
}

/// Accumulate the textual payload from a provider's stdout. If every
/// non-empty line parses as a recognized protocol object, the result is
/// the concatenation of `chunk` payloads (an `error` line's message, if
/// any, is surfaced separately); otherwise the raw output is treated as
/// opaque text verbatim.
#[must_use]
pub fn parse_stdout(raw: &str) -> ParsedOutput {
    let lines: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return ParsedOutput::default();
    }

    let parsed: Vec<Option<Value>> = lines.iter().map(|l| serde_json::from_str::<Value>(l).ok()).collect();

    let is_protocol = parsed.iter().all(|v| {
        v.as_ref()
            .and_then(|v| v.get("type"))
            .and_then(Value::as_str)
            .is_some_and(|t| matches!(t, "chunk" | "done" | "error"))
    });

    if !is_protocol {
        return ParsedOutput { text: raw.trim().to_string(), protocol_error: None };
    }

    let mut text = String::new();
    let mut protocol_error = None;
    for value in parsed.into_iter().flatten() {
        match value.get("type").and_then(Value::as_str) {
            Some("chunk") => {
                if let Some(chunk) = value.get("text").or_else(|| value.get("content")).and_then(Value::as_str) {
                    text.push_str(chunk);
                }
            }
            Some("error") => {
                protocol_error = Some(
                    value
                        .get("message")
                        .or_else(|| value.get("error"))
                        .and_then(Value::as_str)
                        .unwrap_or("provider reported an error")
                        .to_string(),
                );
            }
            _ => {}
        }
    }
    ParsedOutput { text, protocol_error }
}
