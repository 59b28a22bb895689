//! Lineport Protocol - Line protocol data model and codec
//!
//! This crate provides the types that flow from the listener to the collectors:
//! - `Metric` - One decoded measurement (name, tags, fields, timestamp)
//! - `FieldValue` - Typed field values (float, integer, unsigned, string, boolean)
//! - `Precision` - Unit used to interpret raw timestamps
//! - `LineParser` - Decoder for batches of line protocol text
//!
//! # Wire Format
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...] [timestamp]
//! ```
//!
//! # Design Principles
//!
//! - **Per-request decoder**: `LineParser` holds only the precision and the
//!   request's time origin, so it is cheap to build and never shared
//! - **Error isolation**: Every line is attempted; good lines are returned
//!   alongside the first failure
//! - **Canonical encoding**: `Metric::to_line_protocol` sorts tags and escapes
//!   the same characters the parser unescapes

mod error;
mod escape;
mod metric;
mod parser;
mod precision;

pub use error::{ParseError, ParseErrorKind};
pub use metric::{FieldValue, Metric};
pub use parser::LineParser;
pub use precision::Precision;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ParseError>;
