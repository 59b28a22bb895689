//! Human-readable metrics formatter
//!
//! # Example Output
//!
//! ```text
//! [metrics] influxdb_listener: 12/s req | 1.2K/s metrics | 80.0 KB/s | in-flight 0 | buffers 3
//! [metrics] influxdb_listener: parse errors 2 | long lines 1 | auth failures 0 | dropped 0
//! [metrics] sinks: stdout (1.2K/s, ok)
//! ```

use super::{MetricsFormatter, format_bytes_per_sec, format_count, format_rate};
use crate::{CollectedMetrics, MetricsRates, SourceRates};
use std::fmt::Write;

/// Human-readable metrics formatter
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter;

impl HumanFormatter {
    /// Create a new human formatter
    pub fn new() -> Self {
        Self
    }

    fn format_source(&self, source: &SourceRates) -> String {
        let mut output = format!(
            "[metrics] {}: {} req | {} metrics | {} | in-flight {} | buffers {}",
            source.id,
            format_rate(source.requests_per_sec),
            format_rate(source.metrics_per_sec),
            format_bytes_per_sec(source.bytes_per_sec),
            source.in_flight,
            format_count(source.buffers_created),
        );

        if source.parse_errors + source.long_lines + source.auth_failures + source.dropped > 0 {
            let _ = write!(
                output,
                "\n[metrics] {}: parse errors {} | long lines {} | auth failures {} | dropped {}",
                source.id, source.parse_errors, source.long_lines, source.auth_failures, source.dropped,
            );
        }

        output
    }

    fn format_sinks(&self, rates: &MetricsRates) -> Option<String> {
        if rates.sinks.is_empty() {
            return None;
        }

        let mut output = String::from("[metrics] sinks:");

        for (i, sink) in rates.sinks.iter().enumerate() {
            if i > 0 {
                output.push_str(" |");
            }

            let _ = write!(output, " {} ({}", sink.id, format_rate(sink.metrics_per_sec));

            if sink.errors > 0 {
                let _ = write!(output, ", {} err", sink.errors);
            } else {
                output.push_str(", ok");
            }

            output.push(')');
        }

        Some(output)
    }
}

impl MetricsFormatter for HumanFormatter {
    fn format_report(&self, _metrics: &CollectedMetrics, rates: Option<&MetricsRates>) -> String {
        let Some(rates) = rates else {
            return "[metrics] collecting baseline...".to_string();
        };

        let mut lines: Vec<String> = rates.sources.iter().map(|s| self.format_source(s)).collect();

        if let Some(line) = self.format_sinks(rates) {
            lines.push(line);
        }

        if lines.is_empty() {
            "[metrics] no activity".to_string()
        } else {
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SinkRates;
    use std::time::Duration;

    fn source_rates(parse_errors: u64) -> SourceRates {
        SourceRates {
            id: "influxdb_listener".into(),
            source_type: "influxdb_listener".into(),
            requests_per_sec: 12.0,
            metrics_per_sec: 1200.0,
            bytes_per_sec: 80.0 * 1024.0,
            in_flight: 0,
            parse_errors,
            long_lines: 0,
            auth_failures: 0,
            dropped: 0,
            buffers_created: 3,
        }
    }

    #[test]
    fn test_format_report_with_rates() {
        let rates = MetricsRates {
            elapsed: Duration::from_secs(10),
            sources: vec![source_rates(0)],
            sinks: vec![SinkRates {
                id: "stdout".into(),
                sink_type: "stdout".into(),
                metrics_per_sec: 1200.0,
                bytes_per_sec: 0.0,
                errors: 0,
            }],
        };

        let output = HumanFormatter::new().format_report(&CollectedMetrics::default(), Some(&rates));

        assert!(output.contains("[metrics] influxdb_listener: 12/s req | 1.2K/s metrics | 80.0 KB/s"));
        assert!(output.contains("buffers 3"));
        assert!(!output.contains("parse errors"));
        assert!(output.contains("[metrics] sinks: stdout (1.2K/s, ok)"));
    }

    #[test]
    fn test_format_report_with_errors() {
        let rates = MetricsRates {
            elapsed: Duration::from_secs(10),
            sources: vec![source_rates(2)],
            sinks: Vec::new(),
        };

        let output = HumanFormatter::new().format_report(&CollectedMetrics::default(), Some(&rates));
        assert!(output.contains("parse errors 2"));
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_format_report_no_rates() {
        let output = HumanFormatter::new().format_report(&CollectedMetrics::default(), None);
        assert!(output.contains("collecting baseline"));
    }
}
