//! Lineport - Sources
//!
//! Network sources that decode incoming data into `Metric`s and hand them
//! to an `Accumulator`.
//!
//! # Available Sources
//!
//! - **Influx listener** - InfluxDB 1.x compatible `/write` endpoint over
//!   HTTP or HTTPS, with gzip bodies and optional Basic auth
//!
//! # Design Principles
//!
//! - **Bounded memory**: Bodies stream through one pooled fixed-size buffer
//! - **Per-request decoding**: No decoder state is shared between requests
//! - **Never block on the collector**: A full queue drops and counts
//!
//! # Example
//!
//! ```ignore
//! use lineport_sources::{ChannelAccumulator, InfluxListener, InfluxListenerConfig};
//! use std::sync::Arc;
//!
//! let (acc, rx) = ChannelAccumulator::channel(10_000);
//! let listener = InfluxListener::new(InfluxListenerConfig::default(), Arc::new(acc));
//! listener.run(cancel_token).await?;
//! ```

mod accumulator;
pub mod influx;

pub use accumulator::{Accumulator, ChannelAccumulator};
pub use influx::{
    InfluxListener, InfluxListenerConfig, InfluxListenerError, ListenerMetrics,
    ListenerMetricsHandle,
};
