//! Protocol error types
//!
//! Errors that can occur when decoding line protocol text.

use std::fmt;

use thiserror::Error;

/// Maximum number of bytes of the offending line kept for error messages
const MAX_CONTEXT_LEN: usize = 64;

/// What went wrong while decoding a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Line has no measurement name
    MissingMeasurement,
    /// Tag is missing `=` or has an empty key/value
    InvalidTag,
    /// Line has no field set
    MissingFields,
    /// Field is missing `=` or has an empty key
    InvalidField,
    /// Field value is not a valid float, integer, string or boolean
    InvalidFieldValue,
    /// String field value has no closing quote
    UnterminatedString,
    /// Timestamp is not a valid integer
    InvalidTimestamp,
    /// Timestamp overflows 64-bit nanoseconds once scaled by the precision
    TimestampOutOfRange,
    /// Unexpected bytes after the timestamp
    TrailingData,
    /// Measurement, tag or field text is not valid UTF-8
    InvalidUtf8,
}

impl ParseErrorKind {
    /// Short human description
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingMeasurement => "missing measurement",
            Self::InvalidTag => "invalid tag",
            Self::MissingFields => "missing fields",
            Self::InvalidField => "invalid field",
            Self::InvalidFieldValue => "invalid field value",
            Self::UnterminatedString => "unterminated string",
            Self::InvalidTimestamp => "invalid timestamp",
            Self::TimestampOutOfRange => "timestamp out of range",
            Self::TrailingData => "unexpected data after timestamp",
            Self::InvalidUtf8 => "invalid utf-8",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to decode one line of a batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("metric parse error: {kind} at {line}:{column}: {context:?}")]
pub struct ParseError {
    /// Error category
    pub kind: ParseErrorKind,
    /// 1-indexed line number within the decoded chunk
    pub line: usize,
    /// 1-indexed byte column within the line
    pub column: usize,
    /// Leading part of the offending line
    pub context: String,
}

impl ParseError {
    /// Create an error for `line_text`, truncating the context
    pub fn new(kind: ParseErrorKind, line: usize, column: usize, line_text: &[u8]) -> Self {
        let end = line_text.len().min(MAX_CONTEXT_LEN);
        Self {
            kind,
            line,
            column,
            context: String::from_utf8_lossy(&line_text[..end]).into_owned(),
        }
    }
}
