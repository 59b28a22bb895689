//! Metrics output formatters
//!
//! `HumanFormatter` writes short log lines for operators; `JsonFormatter`
//! writes one JSON document per report for log pipelines.

mod human;
mod json;

pub use human::HumanFormatter;
pub use json::JsonFormatter;

use crate::{CollectedMetrics, MetricsRates};

/// Trait for metrics formatters
pub trait MetricsFormatter: Send + Sync {
    /// Format one report; `rates` is `None` on the first collection
    fn format_report(&self, metrics: &CollectedMetrics, rates: Option<&MetricsRates>) -> String;
}

const DECIMAL: (f64, [&str; 3]) = (1000.0, ["K", "M", "G"]);
const BINARY: (f64, [&str; 3]) = (1024.0, [" KB", " MB", " GB"]);

/// Divide `value` down by `base` while it stays at least `base`
///
/// Returns the scaled value and the unit suffix; an empty suffix means the
/// value was below `base` to begin with.
fn scale(value: f64, (base, units): (f64, [&'static str; 3])) -> (f64, &'static str) {
    let mut scaled = value;
    let mut unit = "";
    for next in units {
        if scaled < base {
            break;
        }
        scaled /= base;
        unit = next;
    }
    (scaled, unit)
}

fn render(value: f64, unit: &str, suffix: &str) -> String {
    if unit.is_empty() {
        format!("{:.0}{}", value, suffix)
    } else {
        format!("{:.1}{}{}", value, unit, suffix)
    }
}

/// `500 B/s`, `1.0 KB/s`, `50.0 MB/s`
pub fn format_bytes_per_sec(bytes_per_sec: f64) -> String {
    let (value, unit) = scale(bytes_per_sec, BINARY);
    if unit.is_empty() {
        format!("{:.0} B/s", value)
    } else {
        render(value, unit, "/s")
    }
}

/// `500`, `1.5K`, `1.5M`
pub fn format_count(count: u64) -> String {
    let (value, unit) = scale(count as f64, DECIMAL);
    render(value, unit, "")
}

/// `500/s`, `1.0K/s`, `1.2M/s`
pub fn format_rate(rate: f64) -> String {
    let (value, unit) = scale(rate, DECIMAL);
    render(value, unit, "/s")
}
