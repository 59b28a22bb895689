//! Byte size values
//!
//! Accepts either a bare integer (bytes) or a string with a unit suffix:
//! `B`, `KB`/`MB`/`GB` (powers of 1000), `KiB`/`MiB`/`GiB` and the short
//! forms `K`/`M`/`G` (powers of 1024).

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// A size in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(pub u64);

impl ByteSize {
    /// Size in bytes
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Size in bytes, saturating on 32-bit targets
    #[inline]
    pub fn as_usize(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }

    /// Size of `n` kibibytes
    pub const fn kib(n: u64) -> Self {
        Self(n * KIB)
    }

    /// Size of `n` mebibytes
    pub const fn mib(n: u64) -> Self {
        Self(n * MIB)
    }
}

impl FromStr for ByteSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len());
        let (num, unit) = s.split_at(split);

        let num: u64 = num
            .parse()
            .map_err(|_| format!("invalid size '{}'", s))?;
        let multiplier = match unit.trim() {
            "" | "B" => 1,
            "KB" => 1_000,
            "MB" => 1_000_000,
            "GB" => 1_000_000_000,
            "K" | "KiB" => KIB,
            "M" | "MiB" => MIB,
            "G" | "GiB" => GIB,
            other => return Err(format!("unknown size unit '{}'", other)),
        };

        num.checked_mul(multiplier)
            .map(ByteSize)
            .ok_or_else(|| format!("size '{}' is too large", s))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0;
        if n >= GIB && n % GIB == 0 {
            write!(f, "{}GiB", n / GIB)
        } else if n >= MIB && n % MIB == 0 {
            write!(f, "{}MiB", n / MIB)
        } else if n >= KIB && n % KIB == 0 {
            write!(f, "{}KiB", n / KIB)
        } else {
            write!(f, "{}B", n)
        }
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ByteSizeVisitor;

        impl Visitor<'_> for ByteSizeVisitor {
            type Value = ByteSize;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a byte count or a size string like \"64KiB\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ByteSize, E> {
                Ok(ByteSize(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ByteSize, E> {
                u64::try_from(v)
                    .map(ByteSize)
                    .map_err(|_| E::custom("size must not be negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ByteSize, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ByteSizeVisitor)
    }
}
