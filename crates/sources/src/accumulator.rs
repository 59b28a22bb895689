//! Collector interface
//!
//! The listener hands every decoded metric to an `Accumulator`. Adding must
//! never block the request: an accumulator that cannot take a metric right
//! now refuses it and the listener counts the drop.

use lineport_protocol::Metric;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Downstream collector of decoded metrics
pub trait Accumulator: Send + Sync {
    /// Offer one metric, returning `false` if it was dropped
    fn add_metric(&self, metric: Metric) -> bool;
}

/// Accumulator backed by a bounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelAccumulator {
    tx: mpsc::Sender<Metric>,
}

impl ChannelAccumulator {
    /// Create an accumulator and the receiver a sink drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Metric>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Wrap an existing sender
    pub fn new(tx: mpsc::Sender<Metric>) -> Self {
        Self { tx }
    }
}

impl Accumulator for ChannelAccumulator {
    fn add_metric(&self, metric: Metric) -> bool {
        match self.tx.try_send(metric) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Closed(_)) => {
                tracing::trace!("metric channel closed");
                false
            }
        }
    }
}
