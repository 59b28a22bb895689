//! Line framing over a fixed buffer
//!
//! A request body of any size is read through one pooled buffer of
//! `max_line_size` bytes. After each fill the cursor decides what to do with
//! the buffered bytes:
//!
//! ```text
//!             fill full, has '\n'   ──► Decode up to the last '\n', carry the rest
//!  NORMAL ──► fill full, no '\n'    ──► LongLine, enter DISCARDING
//!             body ended            ──► DecodeFinal of everything buffered
//!
//!  DISCARDING ──► no '\n'  ──► drop the whole fill
//!             ──► '\n'     ──► carry bytes after it, back to NORMAL
//! ```
//!
//! Only the chunk handed to the sink is ever parsed; the tail of an
//! over-length line is skipped up to its terminating newline.

use std::io::{self, Read};

use tracing::debug;

use super::decode::{DecodeError, RecordSink};
use super::error::WriteError;
use super::metrics::ListenerMetrics;

/// Framing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Buffered bytes start at a line boundary
    Normal,
    /// Skipping the rest of a line that did not fit
    Discarding,
}

/// What the reader should do after a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Fill again from `buf_start`
    Continue,
    /// Decode `buf[..end]`, then `consume(end)`
    Decode { end: usize },
    /// Decode `buf[..end]` and finish the request
    DecodeFinal { end: usize },
    /// A line exceeded the buffer and is being dropped
    LongLine,
    /// Body exhausted with nothing left to decode
    Finish,
}

/// Per-request framing state
#[derive(Debug, Clone)]
pub struct FrameCursor {
    state: FrameState,
    buf_start: usize,
    rejected: bool,
}

impl Default for FrameCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCursor {
    pub fn new() -> Self {
        Self {
            state: FrameState::Normal,
            buf_start: 0,
            rejected: false,
        }
    }

    #[inline]
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Offset of the first free byte; bytes before it are carried over
    #[inline]
    pub fn buf_start(&self) -> usize {
        self.buf_start
    }

    /// Whether any chunk or line failed so far
    #[inline]
    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    /// Mark the request as failed without stopping it
    #[inline]
    pub fn reject(&mut self) {
        self.rejected = true;
    }

    /// Decide the next step after a fill
    ///
    /// `filled` is the number of valid bytes at the front of `buf`, carried
    /// bytes included. `at_eof` means the body ended before the buffer was
    /// full. Discarding shifts bytes in place, so `buf` is mutable.
    pub fn advance(&mut self, buf: &mut [u8], filled: usize, at_eof: bool) -> Transition {
        match self.state {
            FrameState::Discarding => {
                match buf[..filled].iter().position(|&b| b == b'\n') {
                    Some(i) => {
                        buf.copy_within(i + 1..filled, 0);
                        self.buf_start = filled - (i + 1);
                        self.state = FrameState::Normal;
                        Transition::Continue
                    }
                    None => {
                        self.buf_start = 0;
                        if at_eof {
                            Transition::Finish
                        } else {
                            Transition::Continue
                        }
                    }
                }
            }
            FrameState::Normal if at_eof => {
                if filled == 0 {
                    Transition::Finish
                } else {
                    Transition::DecodeFinal { end: filled }
                }
            }
            FrameState::Normal => match buf[..filled].iter().rposition(|&b| b == b'\n') {
                Some(i) => Transition::Decode { end: i + 1 },
                None => {
                    self.state = FrameState::Discarding;
                    self.buf_start = 0;
                    self.rejected = true;
                    Transition::LongLine
                }
            },
        }
    }

    /// Drop `buf[..end]`, moving the rest of the filled region to the front
    pub fn consume(&mut self, buf: &mut [u8], end: usize, filled: usize) {
        buf.copy_within(end..filled, 0);
        self.buf_start = filled - end;
    }
}

/// Drives a `FrameCursor` over a body reader
pub struct FrameReader<R> {
    reader: R,
    cursor: FrameCursor,
    eof: bool,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            cursor: FrameCursor::new(),
            eof: false,
        }
    }

    /// Stream the whole body through `buf` into `sink`
    ///
    /// Decode failures in intermediate chunks are remembered and processing
    /// continues; the returned error reflects the worst outcome seen.
    pub fn run<S: RecordSink>(
        mut self,
        buf: &mut [u8],
        sink: &mut S,
        metrics: &ListenerMetrics,
    ) -> Result<(), WriteError> {
        loop {
            let start = self.cursor.buf_start();
            let n = self.fill(&mut buf[start..]).map_err(|e| {
                debug!(error = %e, "body read failed");
                WriteError::read_failure(&e)
            })?;
            metrics.bytes_received(n);

            let filled = start + n;
            let at_eof = filled < buf.len();

            match self.cursor.advance(buf, filled, at_eof) {
                Transition::Continue => {}
                Transition::Decode { end } => {
                    if sink.decode(&buf[..end]).is_err() {
                        self.cursor.reject();
                    }
                    self.cursor.consume(buf, end, filled);
                }
                Transition::LongLine => {
                    metrics.long_lines.inc();
                    debug!(max = buf.len(), "line longer than buffer dropped");
                }
                Transition::DecodeFinal { end } => {
                    return match sink.decode(&buf[..end]) {
                        Ok(()) if self.cursor.is_rejected() => Err(WriteError::Rejected),
                        Ok(()) => Ok(()),
                        Err(e @ DecodeError::Partial(_)) => Err(WriteError::Partial(e.to_string())),
                        Err(e @ DecodeError::Unparsable(_)) => {
                            Err(WriteError::Unparsable(e.to_string()))
                        }
                    };
                }
                Transition::Finish => {
                    return if self.cursor.is_rejected() {
                        Err(WriteError::Rejected)
                    } else {
                        Ok(())
                    };
                }
            }
        }
    }

    /// Read until `buf` is full or the body ends
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut total = 0;
        while total < buf.len() && !self.eof {
            match self.reader.read(&mut buf[total..]) {
                Ok(0) => self.eof = true,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }
}
