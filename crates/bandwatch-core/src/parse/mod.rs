//! Lenient parsers for the two step outputs.
//!
//! Neither parser fails: malformed input is either carried through (price
//! rows) or dropped (range lines), and every such decision is reported as a
//! [`Diagnostic`] next to the parsed values.

mod ranges;
mod records;

use std::fmt::{Display, Formatter};

use serde::Serialize;

pub use ranges::{parse_support_ranges, ParsedRanges, SUPPORT_MARKER};
pub use records::{parse_price_records, ParsedRecords};

/// A row or line that was tolerated rather than rejected. `line` is 1-based
/// within the text it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Price row with fewer than seven fields; trailing fields are absent.
    MissingFields { line: u64, found: usize },
    /// Price row with more than seven fields; extra fields are ignored.
    ExtraFields { line: u64, found: usize },
    /// Numeric price column that does not parse as a number.
    NonNumeric {
        line: u64,
        column: &'static str,
        value: String,
    },
    /// Timestamp that is neither a date nor a date-time.
    BadTimestamp { line: u64, value: String },
    /// Row the CSV reader could not decode; it is skipped.
    Unreadable { line: u64, message: String },
    /// Marker line whose band is inverted; it is skipped.
    InvalidRange { line: u64, text: String },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields { line, found } => {
                write!(f, "line {line}: {found} of 7 fields present")
            }
            Self::ExtraFields { line, found } => {
                write!(f, "line {line}: {found} fields, extra fields ignored")
            }
            Self::NonNumeric {
                line,
                column,
                value,
            } => write!(f, "line {line}: {column} is not numeric: '{value}'"),
            Self::BadTimestamp { line, value } => {
                write!(f, "line {line}: unparseable timestamp '{value}'")
            }
            Self::Unreadable { line, message } => write!(f, "line {line}: skipped: {message}"),
            Self::InvalidRange { line, text } => {
                write!(f, "line {line}: invalid support range '{text}'")
            }
        }
    }
}
