//! Content-to-router bridge query
//!
//! Content running inside a surface picks its display. The router evaluates
//! a script expression in the surface and reads back either `null` or a
//! string-encoded integer display index.

use crate::ids::OutputIndex;

/// What a display query answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayAnswer {
    /// Content named a display index
    Explicit(OutputIndex),
    /// Content named an integer no display can have (negative or too large)
    Unaddressable,
    /// Content returned `null` (no preference)
    NoPreference,
    /// Content returned something that is not a display index
    Malformed,
}

impl DisplayAnswer {
    /// Parse a raw script result
    ///
    /// Script engines hand back JSON-ish strings, so a quoted number
    /// (`"\"2\""`) is accepted as well as a bare one.
    pub fn parse(payload: &str) -> Self {
        let trimmed = payload.trim();
        if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
            return DisplayAnswer::NoPreference;
        }

        let unquoted = trimmed
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(trimmed);

        let (negative, digits) = match unquoted.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, unquoted),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return DisplayAnswer::Malformed;
        }

        // "-0" is still zero
        if negative && digits.bytes().any(|b| b != b'0') {
            return DisplayAnswer::Unaddressable;
        }

        match digits.parse::<usize>() {
            Ok(index) => DisplayAnswer::Explicit(OutputIndex(index)),
            Err(_) => DisplayAnswer::Unaddressable,
        }
    }

    /// Display to use, with `fallback` standing in for null and malformed answers
    ///
    /// An unaddressable answer resolves to [`OutputIndex::UNADDRESSABLE`],
    /// which the router leaves unrouted.
    pub fn resolve(self, fallback: OutputIndex) -> OutputIndex {
        match self {
            DisplayAnswer::Explicit(index) => index,
            DisplayAnswer::Unaddressable => OutputIndex::UNADDRESSABLE,
            DisplayAnswer::NoPreference | DisplayAnswer::Malformed => fallback,
        }
    }
}

/// Display index for a raw payload, falling back to the main window
pub fn display_index_from_payload(payload: &str) -> OutputIndex {
    DisplayAnswer::parse(payload).resolve(OutputIndex::MAIN)
}
