//! Decoded measurement types

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::escape::{escape_key, escape_measurement, escape_string_value};

/// A value that can be stored in a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit floating point (`1.5`, `1`, `-2e3`)
    Float(f64),
    /// 64-bit signed integer (`42i`)
    Integer(i64),
    /// 64-bit unsigned integer (`42u`)
    UInteger(u64),
    /// UTF-8 string (`"text"`)
    String(String),
    /// Boolean (`t`, `true`, `F`, ...)
    Boolean(bool),
}

impl FieldValue {
    /// Format this value for line protocol
    pub fn to_line_protocol(&self) -> String {
        match self {
            FieldValue::Float(v) => format!("{}", v),
            FieldValue::Integer(v) => format!("{}i", v),
            FieldValue::UInteger(v) => format!("{}u", v),
            FieldValue::String(v) => format!("\"{}\"", escape_string_value(v)),
            FieldValue::Boolean(v) => v.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line_protocol())
    }
}

/// One decoded measurement
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Measurement name
    pub name: String,
    /// Tag set, kept sorted by key
    pub tags: BTreeMap<String, String>,
    /// Field set in input order
    pub fields: Vec<(String, FieldValue)>,
    /// Nanoseconds since the Unix epoch
    pub timestamp: i64,
}

impl Metric {
    /// Create a metric with no tags or fields
    pub fn new(name: impl Into<String>, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
            fields: Vec::new(),
            timestamp,
        }
    }

    /// Set a tag, replacing any existing value under the same key
    pub fn add_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Append a field
    pub fn add_field(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.push((key.into(), value));
    }

    /// Look up a tag value
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Look up the first field with this key
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Timestamp as a UTC date-time
    pub fn time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.timestamp)
    }

    /// Encode as a single line protocol line (without trailing newline)
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape_measurement(&self.name);

        for (key, value) in &self.tags {
            line.push(',');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&escape_key(value));
        }

        line.push(' ');

        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&value.to_line_protocol());
        }

        line.push(' ');
        line.push_str(&self.timestamp.to_string());
        line
    }
}
