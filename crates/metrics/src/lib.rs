//! Lineport - Metrics
//!
//! Internal counters and periodic reporting.
//!
//! # Overview
//!
//! - `Counter`: relaxed atomic counter used by every component
//! - Provider traits the listener and sinks implement to expose snapshots
//! - `MetricsReporter`: polls providers on an interval and logs the result
//!   through `tracing` in human or JSON form
//!
//! # Metrics Handle Pattern
//!
//! Components keep their counters in an `Arc` and hand out a lightweight
//! handle implementing the provider trait. The handle stays valid after the
//! component's `run()` consumes it.
//!
//! ```text
//! Component (owns Arc<Metrics>)
//!     │
//!     ├──► metrics_handle() → Handle (clones Arc, implements Provider trait)
//!     │
//!     └──► run() [consumes self, Arc keeps metrics alive]
//! ```
//!
//! Snapshots are also the observability hook: a provider may refresh
//! derived counters (such as the listener's `buffers_created`) before
//! copying them out.

mod collected;
pub mod format;
mod reporter;
mod traits;

pub use collected::{
    CollectedMetrics, CollectedSink, CollectedSource, MetricsRates, SinkRates, SourceRates,
};
pub use format::{HumanFormatter, JsonFormatter, MetricsFormatter};
pub use reporter::{MetricsReporter, MetricsReporterBuilder};
pub use traits::{
    SinkMetrics, SinkMetricsProvider, SinkMetricsSnapshot, SourceMetricsProvider,
    SourceMetricsSnapshot,
};

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter wrapper for convenient metric operations
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Create a new counter initialized to 0
    #[inline]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Increment the counter by `val`
    #[inline]
    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    /// Increment the counter by 1
    #[inline]
    pub fn inc(&self) {
        self.add(1);
    }

    /// Overwrite the value (for gauges mirrored from another component)
    #[inline]
    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    /// Get the current value
    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
