//! Tests for the null sink

use super::NullSink;
use lineport_metrics::SinkMetricsProvider;
use lineport_protocol::Metric;
use tokio::sync::mpsc;

#[tokio::test]
async fn test_run_counts_until_closed() {
    let (tx, rx) = mpsc::channel(16);
    let sink = NullSink::new(rx);
    let handle = sink.metrics_handle();

    for i in 0..10 {
        tx.send(Metric::new("cpu", i)).await.unwrap();
    }
    drop(tx);

    let snapshot = sink.run().await;
    assert_eq!(snapshot.metrics_received, 10);
    assert_eq!(snapshot.metrics_written, 10);
    assert_eq!(snapshot.bytes_written, 0);

    // handle outlives the sink
    assert_eq!(handle.snapshot().metrics_received, 10);
}

#[tokio::test]
async fn test_empty_channel() {
    let (tx, rx) = mpsc::channel::<Metric>(1);
    drop(tx);
    let snapshot = NullSink::new(rx).run().await;
    assert_eq!(snapshot.metrics_received, 0);
}

#[test]
fn test_handle_identity() {
    let (_tx, rx) = mpsc::channel::<Metric>(1);
    let sink = NullSink::with_name(rx, "discard");
    let handle = sink.metrics_handle();
    assert_eq!(handle.sink_id(), "discard");
    assert_eq!(handle.sink_type(), "null");
    assert_eq!(sink.metrics().snapshot().metrics_received, 0);
}
