//! Line protocol decoder
//!
//! A `LineParser` is built per request from the request's timestamp precision
//! and captured start time. It holds no other state, so any number of parsers
//! can decode concurrently.

use crate::error::{ParseError, ParseErrorKind};
use crate::escape::unescape;
use crate::metric::{FieldValue, Metric};
use crate::precision::Precision;

/// Decoder for batches of newline-separated line protocol
#[derive(Debug, Clone, Copy)]
pub struct LineParser {
    precision: Precision,
    default_timestamp: i64,
}

impl LineParser {
    /// Create a parser for one request
    ///
    /// `time_origin_ns` is used for lines without a timestamp, truncated to
    /// `precision`.
    pub fn new(precision: Precision, time_origin_ns: i64) -> Self {
        Self {
            precision,
            default_timestamp: precision.truncate(time_origin_ns),
        }
    }

    /// Timestamp precision applied to raw timestamps
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Decode every line in `input`
    ///
    /// Lines that fail are skipped; the metrics from the remaining lines are
    /// returned in input order together with the first error encountered.
    pub fn parse(&self, input: &[u8]) -> (Vec<Metric>, Option<ParseError>) {
        let mut metrics = Vec::new();
        let mut first_error = None;

        for (idx, raw) in input.split(|&b| b == b'\n').enumerate() {
            let line = raw.strip_suffix(b"\r").unwrap_or(raw);
            let start = line
                .iter()
                .position(|b| !matches!(b, b' ' | b'\t'))
                .unwrap_or(line.len());
            if start == line.len() || line[start] == b'#' {
                continue;
            }

            match self.parse_line(line, start, idx + 1) {
                Ok(metric) => metrics.push(metric),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        (metrics, first_error)
    }

    fn parse_line(&self, line: &[u8], start: usize, line_no: usize) -> Result<Metric, ParseError> {
        let mut cur = Cursor {
            line,
            pos: start,
            line_no,
        };

        // measurement
        let (name, stop) = cur.take_until(b", ", b", ");
        if name.is_empty() {
            return Err(cur.error(ParseErrorKind::MissingMeasurement));
        }
        let name = cur.text(name, b", ")?;
        let mut metric = Metric::new(name, self.default_timestamp);

        // tags
        if stop == Some(b',') {
            cur.pos += 1;
            loop {
                let (key, stop) = cur.take_until(b",= ", b",= ");
                if key.is_empty() || stop != Some(b'=') {
                    return Err(cur.error(ParseErrorKind::InvalidTag));
                }
                let key = cur.text(key, b",= ")?;
                cur.pos += 1;

                let (value, stop) = cur.take_until(b", ", b",= ");
                if value.is_empty() {
                    return Err(cur.error(ParseErrorKind::InvalidTag));
                }
                let value = cur.text(value, b",= ")?;
                metric.add_tag(key, value);

                match stop {
                    Some(b',') => cur.pos += 1,
                    Some(_) => break,
                    None => return Err(cur.error(ParseErrorKind::MissingFields)),
                }
            }
        }

        cur.skip_spaces();
        if cur.at_end() {
            return Err(cur.error(ParseErrorKind::MissingFields));
        }

        // fields
        loop {
            let (key, stop) = cur.take_until(b",= ", b",= ");
            if key.is_empty() || stop != Some(b'=') {
                return Err(cur.error(ParseErrorKind::InvalidField));
            }
            let key = cur.text(key, b",= ")?;
            cur.pos += 1;

            let value = if cur.peek() == Some(b'"') {
                cur.string_value()?
            } else {
                let value_start = cur.pos;
                let (raw, _) = cur.take_until(b", ", b"");
                parse_scalar(raw).ok_or_else(|| {
                    ParseError::new(ParseErrorKind::InvalidFieldValue, line_no, value_start + 1, line)
                })?
            };
            metric.add_field(key, value);

            match cur.peek() {
                Some(b',') => cur.pos += 1,
                Some(b' ') | None => break,
                Some(_) => return Err(cur.error(ParseErrorKind::InvalidFieldValue)),
            }
        }

        // timestamp
        cur.skip_spaces();
        if cur.at_end() {
            return Ok(metric);
        }
        let ts_start = cur.pos;
        let (raw, _) = cur.take_until(b" ", b"");
        let raw = std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| {
                ParseError::new(ParseErrorKind::InvalidTimestamp, line_no, ts_start + 1, line)
            })?;
        cur.skip_spaces();
        if !cur.at_end() {
            return Err(cur.error(ParseErrorKind::TrailingData));
        }
        metric.timestamp = self.precision.to_nanos(raw).ok_or_else(|| {
            ParseError::new(ParseErrorKind::TimestampOutOfRange, line_no, ts_start + 1, line)
        })?;

        Ok(metric)
    }
}

/// Position within one line
struct Cursor<'a> {
    line: &'a [u8],
    pos: usize,
    line_no: usize,
}

impl<'a> Cursor<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.line.len()
    }

    fn peek(&self) -> Option<u8> {
        self.line.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.line_no, self.pos + 1, self.line)
    }

    /// Advance to the next unescaped byte in `stops`
    ///
    /// A backslash skips the following byte only when it is in `escapable`.
    /// Returns the raw (still escaped) token and the stop byte, `None` at end
    /// of line.
    fn take_until(&mut self, stops: &[u8], escapable: &[u8]) -> (&'a [u8], Option<u8>) {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'\\' && self.line.get(self.pos + 1).is_some_and(|n| escapable.contains(n)) {
                self.pos += 2;
                continue;
            }
            if stops.contains(&b) {
                return (&self.line[start..self.pos], Some(b));
            }
            self.pos += 1;
        }
        (&self.line[start..], None)
    }

    fn text(&self, raw: &[u8], escapable: &[u8]) -> Result<String, ParseError> {
        String::from_utf8(unescape(raw, escapable))
            .map_err(|_| self.error(ParseErrorKind::InvalidUtf8))
    }

    /// Read a double-quoted string value starting at the opening quote
    fn string_value(&mut self) -> Result<FieldValue, ParseError> {
        let open = self.pos;
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedString,
                        self.line_no,
                        open + 1,
                        self.line,
                    ));
                }
                Some(b'\\') if matches!(self.line.get(self.pos + 1), Some(b'"' | b'\\')) => {
                    out.push(self.line[self.pos + 1]);
                    self.pos += 2;
                }
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b) => {
                    out.push(b);
                    self.pos += 1;
                }
            }
        }
        String::from_utf8(out)
            .map(FieldValue::String)
            .map_err(|_| self.error(ParseErrorKind::InvalidUtf8))
    }
}

/// Parse an unquoted field value
fn parse_scalar(raw: &[u8]) -> Option<FieldValue> {
    let s = std::str::from_utf8(raw).ok()?;
    match s {
        "t" | "T" | "true" | "True" | "TRUE" => return Some(FieldValue::Boolean(true)),
        "f" | "F" | "false" | "False" | "FALSE" => return Some(FieldValue::Boolean(false)),
        "" => return None,
        _ => {}
    }

    if let Some(int) = s.strip_suffix('i') {
        return int.parse().ok().map(FieldValue::Integer);
    }
    if let Some(uint) = s.strip_suffix('u') {
        return uint.parse().ok().map(FieldValue::UInteger);
    }

    // Rust accepts "inf"/"nan" spellings that line protocol does not
    if !s.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
        return None;
    }
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(FieldValue::Float)
}
