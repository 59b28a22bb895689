//! Chunk decoding
//!
//! Turns one chunk of whole lines into metrics and forwards them. A chunk
//! that fails keeps every metric decoded before and after the bad line.

use std::sync::Arc;

use lineport_protocol::{LineParser, Precision};
use tracing::debug;

use super::metrics::ListenerMetrics;
use crate::Accumulator;

/// Why a chunk did not decode cleanly
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Some metrics decoded and were forwarded
    #[error("partial write: unable to parse: {0}")]
    Partial(String),

    /// Nothing in the chunk decoded
    #[error("unable to parse: {0}")]
    Unparsable(String),
}

/// Receiver of well-framed chunks
pub trait RecordSink {
    /// Decode `chunk` and forward the result
    fn decode(&mut self, chunk: &[u8]) -> Result<(), DecodeError>;
}

/// Per-request decoder feeding an `Accumulator`
pub struct ChunkDecoder {
    parser: LineParser,
    database: Option<(String, String)>,
    accumulator: Arc<dyn Accumulator>,
    metrics: Arc<ListenerMetrics>,
}

impl ChunkDecoder {
    /// Create a decoder for one request
    ///
    /// `database` is the configured tag name and the request's `db` value;
    /// both must be non-empty for the tag to be written.
    pub fn new(
        precision: Precision,
        time_origin_ns: i64,
        database: Option<(String, String)>,
        accumulator: Arc<dyn Accumulator>,
        metrics: Arc<ListenerMetrics>,
    ) -> Self {
        Self {
            parser: LineParser::new(precision, time_origin_ns),
            database: database.filter(|(tag, db)| !tag.is_empty() && !db.is_empty()),
            accumulator,
            metrics,
        }
    }
}

impl RecordSink for ChunkDecoder {
    fn decode(&mut self, chunk: &[u8]) -> Result<(), DecodeError> {
        let (decoded, err) = self.parser.parse(chunk);
        let produced = !decoded.is_empty();

        for mut metric in decoded {
            if let Some((tag, db)) = &self.database {
                metric.add_tag(tag.as_str(), db.as_str());
            }
            let accepted = self.accumulator.add_metric(metric);
            self.metrics.metric_offered(accepted);
        }

        let Some(err) = err else {
            return Ok(());
        };

        self.metrics.parse_errors.inc();
        let err = if produced {
            DecodeError::Partial(err.to_string())
        } else {
            DecodeError::Unparsable(err.to_string())
        };
        debug!(error = %err, bytes = chunk.len(), "chunk decode failed");
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChannelAccumulator;
    use lineport_protocol::Metric;
    use tokio::sync::mpsc::Receiver;

    fn decoder(
        precision: Precision,
        database: Option<(&str, &str)>,
    ) -> (ChunkDecoder, Receiver<Metric>, Arc<ListenerMetrics>) {
        let (acc, rx) = ChannelAccumulator::channel(64);
        let metrics = Arc::new(ListenerMetrics::new());
        let dec = ChunkDecoder::new(
            precision,
            0,
            database.map(|(t, d)| (t.to_string(), d.to_string())),
            Arc::new(acc),
            Arc::clone(&metrics),
        );
        (dec, rx, metrics)
    }

    fn drain(rx: &mut Receiver<Metric>) -> Vec<Metric> {
        let mut out = Vec::new();
        while let Ok(m) = rx.try_recv() {
            out.push(m);
        }
        out
    }

    #[test]
    fn test_clean_chunk() {
        let (mut dec, mut rx, metrics) = decoder(Precision::Nanosecond, None);
        dec.decode(b"cpu value=1 1\nmem value=2 2\n").unwrap();

        let got = drain(&mut rx);
        assert_eq!(got.len(), 2);
        assert_eq!(got[1].name, "mem");
        assert_eq!(metrics.metrics_forwarded.get(), 2);
    }

    #[test]
    fn test_partial_chunk_forwards_good_lines() {
        let (mut dec, mut rx, metrics) = decoder(Precision::Nanosecond, None);
        let err = dec.decode(b"cpu value=1 1\nbad\nmem value=2 2\n").unwrap_err();

        assert!(matches!(err, DecodeError::Partial(_)));
        assert!(err.to_string().starts_with("partial write: unable to parse: "));
        assert_eq!(drain(&mut rx).len(), 2);
        assert_eq!(metrics.parse_errors.get(), 1);
    }

    #[test]
    fn test_unparsable_chunk() {
        let (mut dec, mut rx, _) = decoder(Precision::Nanosecond, None);
        let err = dec.decode(b"bad\n").unwrap_err();

        assert!(matches!(err, DecodeError::Unparsable(_)));
        assert!(err.to_string().starts_with("unable to parse: "));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_database_tag_overrides() {
        let (mut dec, mut rx, _) = decoder(Precision::Nanosecond, Some(("database", "mydb")));
        dec.decode(b"cpu,database=other value=1 1\ncpu value=2 2\n").unwrap();

        for m in drain(&mut rx) {
            assert_eq!(m.tag("database"), Some("mydb"));
        }
    }

    #[test]
    fn test_empty_db_leaves_tags_alone() {
        let (mut dec, mut rx, _) = decoder(Precision::Nanosecond, Some(("database", "")));
        dec.decode(b"cpu,database=other value=1 1\n").unwrap();
        assert_eq!(drain(&mut rx)[0].tag("database"), Some("other"));
    }

    #[test]
    fn test_precision_applies() {
        let (mut dec, mut rx, _) = decoder(Precision::Second, None);
        dec.decode(b"cpu value=1 5\n").unwrap();
        assert_eq!(drain(&mut rx)[0].timestamp, 5_000_000_000);
    }

    #[test]
    fn test_dropped_metrics_counted() {
        let (acc, _rx) = ChannelAccumulator::channel(1);
        let metrics = Arc::new(ListenerMetrics::new());
        let mut dec = ChunkDecoder::new(
            Precision::Nanosecond,
            0,
            None,
            Arc::new(acc),
            Arc::clone(&metrics),
        );
        dec.decode(b"a value=1 1\nb value=1 1\nc value=1 1\n").unwrap();

        assert_eq!(metrics.metrics_forwarded.get(), 1);
        assert_eq!(metrics.metrics_dropped.get(), 2);
    }
}
