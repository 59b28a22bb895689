//! Request body readers
//!
//! The async body is bridged to a blocking `Read` so framing and gzip
//! decoding run on a blocking thread. Reading is bounded two ways: by the
//! read deadline and by the maximum body size.

use std::io::{self, Read};
use std::pin::Pin;

use axum::body::Body;
use bytes::Bytes;
use flate2::read::MultiGzDecoder;
use futures_util::stream::{self, Stream, StreamExt};
use tokio::time::Instant;
use tokio_util::io::{StreamReader, SyncIoBridge};

use super::error::BODY_TOO_LARGE;

type BodyStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Blocking body reader handed to the framing loop
pub type BodyReader = Box<dyn Read + Send>;

type Bridge = SyncIoBridge<StreamReader<BodyStream, Bytes>>;

/// A request body bridged to blocking IO but not yet read from
///
/// Created inside the runtime, turned into a reader on a blocking thread.
/// `MultiGzDecoder::new` reads the gzip header immediately, so nothing that
/// reads may happen before `into_reader`.
pub struct PendingBody {
    bridge: Bridge,
    gzip: bool,
    max_body_size: u64,
}

impl PendingBody {
    /// Build the full reader stack; call from a blocking thread
    pub fn into_reader(self) -> BodyReader {
        let decoded: BodyReader = if self.gzip {
            Box::new(MultiGzDecoder::new(self.bridge))
        } else {
            Box::new(self.bridge)
        };
        Box::new(LimitedReader::new(decoded, self.max_body_size))
    }
}

/// Bridge a request body for blocking reads
///
/// Must be called from within the runtime.
pub fn open(body: Body, gzip: bool, max_body_size: u64, deadline: Instant) -> PendingBody {
    PendingBody {
        bridge: SyncIoBridge::new(StreamReader::new(deadline_stream(body, deadline))),
        gzip,
        max_body_size,
    }
}

/// Body chunks, failing with `TimedOut` once `deadline` passes
fn deadline_stream(body: Body, deadline: Instant) -> BodyStream {
    let chunks = stream::unfold(Some(body.into_data_stream()), move |data| async move {
        let mut data = data?;
        match tokio::time::timeout_at(deadline, data.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(data))),
            Ok(Some(Err(e))) => Some((Err(io::Error::other(e)), None)),
            Ok(None) => None,
            Err(_) => Some((
                Err(io::Error::new(io::ErrorKind::TimedOut, "request body read timed out")),
                None,
            )),
        }
    });
    Box::pin(chunks.fuse())
}

/// Reader that fails once more than `limit` bytes are available
///
/// Ending exactly at the limit is fine; one byte more is an error.
pub struct LimitedReader<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> LimitedReader<R> {
    pub fn new(inner: R, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
        }
    }
}

impl<R: Read> Read for LimitedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.remaining == 0 {
            let mut extra = [0u8; 1];
            return match self.inner.read(&mut extra)? {
                0 => Ok(0),
                _ => Err(io::Error::new(io::ErrorKind::InvalidData, BODY_TOO_LARGE)),
            };
        }

        let max = usize::try_from(self.remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}
