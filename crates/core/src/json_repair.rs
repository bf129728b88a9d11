//! JSON Repairer
//!
//! Best-effort closer for JSON text that was cut off mid-document. The
//! repairer never rewrites existing content: it only appends the closing
//! tokens needed to balance the document, dropping at most one dangling
//! escape backslash and one dangling trailing comma first.
//!
//! Closing tokens are appended in reverse nesting order, so
//! `{"a": [{"b": 1` becomes `{"a": [{"b": 1}]}`. A successful repair is not
//! a promise the result parses; callers still run a real parser over it.

use std::fmt;

use serde::Serialize;

/// A single mutation applied by [`repair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairKind {
    DroppedDanglingEscape,
    ClosedString,
    DroppedTrailingComma,
    ClosedArray,
    ClosedObject,
}

impl fmt::Display for RepairKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RepairKind::DroppedDanglingEscape => "dropped dangling escape",
            RepairKind::ClosedString => "closed unclosed string",
            RepairKind::DroppedTrailingComma => "dropped trailing comma",
            RepairKind::ClosedArray => "closed unclosed array",
            RepairKind::ClosedObject => "closed unclosed object",
        };
        f.write_str(label)
    }
}

/// Result of a repair pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    pub repaired_text: String,
    pub applied_repairs: Vec<RepairKind>,
}

impl RepairOutcome {
    /// True when the input needed no changes.
    pub fn is_noop(&self) -> bool {
        self.applied_repairs.is_empty()
    }

    /// Human-readable labels, in application order.
    pub fn labels(&self) -> Vec<String> {
        self.applied_repairs.iter().map(ToString::to_string).collect()
    }
}

/// Close any unclosed string, arrays and objects at the end of `text`.
///
/// Applying `repair` to its own output is a no-op.
pub fn repair(text: &str) -> RepairOutcome {
    let mut openers: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;

    for byte in text.bytes() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escape_next = true,
            b'"' => in_string = !in_string,
            _ if in_string => {}
            b'{' | b'[' => openers.push(byte),
            b'}' => close_innermost(&mut openers, b'{'),
            b']' => close_innermost(&mut openers, b'['),
            _ => {}
        }
    }

    let mut repaired = text.to_string();
    let mut applied = Vec::new();

    if in_string {
        if escape_next {
            repaired.pop();
            applied.push(RepairKind::DroppedDanglingEscape);
        }
        repaired.push('"');
        applied.push(RepairKind::ClosedString);
    }

    if !openers.is_empty() {
        let kept = repaired.trim_end().len();
        if repaired[..kept].ends_with(',') {
            repaired.truncate(kept - 1);
            applied.push(RepairKind::DroppedTrailingComma);
        }
    }

    while let Some(opener) = openers.pop() {
        if opener == b'[' {
            repaired.push(']');
            applied.push(RepairKind::ClosedArray);
        } else {
            repaired.push('}');
            applied.push(RepairKind::ClosedObject);
        }
    }

    RepairOutcome {
        repaired_text: repaired,
        applied_repairs: applied,
    }
}

/// Pop the innermost opener matching `opener`. Unmatched closers are
/// ignored: they leave nothing to close at end of input.
fn close_innermost(openers: &mut Vec<u8>, opener: u8) {
    if let Some(pos) = openers.iter().rposition(|&b| b == opener) {
        openers.remove(pos);
    }
}
