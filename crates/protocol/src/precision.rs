//! Timestamp precision
//!
//! The `precision` query parameter selects the unit of raw timestamps.

/// Unit used to interpret a raw numeric timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Precision {
    /// Nanoseconds (default)
    #[default]
    Nanosecond,
    /// Microseconds (`u`)
    Microsecond,
    /// Milliseconds (`ms`)
    Millisecond,
    /// Seconds (`s`)
    Second,
    /// Minutes (`m`)
    Minute,
    /// Hours (`h`)
    Hour,
}

impl Precision {
    /// Parse the `precision` query parameter
    ///
    /// Unknown or empty values fall back to nanoseconds.
    pub fn from_query(value: &str) -> Self {
        match value {
            "u" => Self::Microsecond,
            "ms" => Self::Millisecond,
            "s" => Self::Second,
            "m" => Self::Minute,
            "h" => Self::Hour,
            _ => Self::Nanosecond,
        }
    }

    /// Number of nanoseconds in one unit
    #[inline]
    pub const fn multiplier(&self) -> i64 {
        match self {
            Self::Nanosecond => 1,
            Self::Microsecond => 1_000,
            Self::Millisecond => 1_000_000,
            Self::Second => 1_000_000_000,
            Self::Minute => 60 * 1_000_000_000,
            Self::Hour => 3_600 * 1_000_000_000,
        }
    }

    /// Query-string spelling of this precision
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nanosecond => "ns",
            Self::Microsecond => "u",
            Self::Millisecond => "ms",
            Self::Second => "s",
            Self::Minute => "m",
            Self::Hour => "h",
        }
    }

    /// Scale a raw timestamp to nanoseconds, `None` on overflow
    #[inline]
    pub fn to_nanos(&self, raw: i64) -> Option<i64> {
        raw.checked_mul(self.multiplier())
    }

    /// Round a nanosecond timestamp down to a multiple of this unit
    #[inline]
    pub fn truncate(&self, nanos: i64) -> i64 {
        nanos - nanos.rem_euclid(self.multiplier())
    }
}
