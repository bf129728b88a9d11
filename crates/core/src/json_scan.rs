//! Structural JSON Scanner
//!
//! Single left-to-right pass over a text buffer that tracks string-literal
//! context and `{}` / `[]` nesting depth without invoking a JSON parser.
//! Used to decide whether a model completion was cut off mid-document.
//!
//! All structural characters are ASCII, so the scan walks bytes: UTF-8
//! continuation bytes can never be mistaken for a quote, brace or backslash.

/// Result of a structural scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanResult {
    /// Net `{` minus `}` seen outside string literals.
    pub open_braces: i64,
    /// Net `[` minus `]` seen outside string literals.
    pub open_brackets: i64,
    /// The text ended inside a string literal.
    pub in_string: bool,
    /// A closing token drove one of the counters below zero at some point.
    pub went_negative: bool,
}

impl ScanResult {
    /// The text ends with an unclosed string, object or array.
    ///
    /// Negative depth is not truncation; it means the text carries extra
    /// closers and is reported through `went_negative` instead.
    pub fn is_truncated(&self) -> bool {
        self.open_braces > 0 || self.open_brackets > 0 || self.in_string
    }

    /// Every string, object and array opened was closed, and nothing closed
    /// that was never opened.
    pub fn is_balanced(&self) -> bool {
        !self.is_truncated() && !self.went_negative && self.open_braces == 0 && self.open_brackets == 0
    }
}

/// Scan `text` and report its structural state at end of input.
///
/// Inside a string literal, a backslash makes the following character
/// literal, so `\"` does not end the string and `\\` is a single escaped
/// backslash. Braces and brackets inside strings are ignored.
pub fn scan(text: &str) -> ScanResult {
    let mut result = ScanResult::default();
    let mut escape_next = false;

    for byte in text.bytes() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match byte {
            b'\\' if result.in_string => escape_next = true,
            b'"' => result.in_string = !result.in_string,
            _ if result.in_string => {}
            b'{' => result.open_braces += 1,
            b'}' => result.open_braces -= 1,
            b'[' => result.open_brackets += 1,
            b']' => result.open_brackets -= 1,
            _ => {}
        }
        if result.open_braces < 0 || result.open_brackets < 0 {
            result.went_negative = true;
        }
    }

    result
}
