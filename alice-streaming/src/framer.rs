//! Newline-delimited record framing.
//!
//! The chat endpoint streams one JSON object per line, but network reads do
//! not respect line boundaries. [`LineFramer`] keeps the unterminated tail of
//! every chunk and prepends it to the next one, so a record is only emitted
//! once its delimiter (or the end of the stream) has been seen.
//!
//! Buffering happens on raw bytes. `\n` never occurs inside a multi-byte
//! UTF-8 sequence, so splitting before decoding keeps characters that
//! straddle two reads intact.

use crate::error::{StreamError, StreamResult};
use futures::Stream;
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Default bound on a single unterminated record.
pub const DEFAULT_MAX_RECORD_BYTES: usize = 10 * 1024 * 1024;

/// Incremental splitter for newline-delimited records.
#[derive(Debug)]
pub struct LineFramer {
    pending: Vec<u8>,
    records: VecDeque<String>,
    max_record_bytes: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    /// Create a framer with the default record size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_record_bytes(DEFAULT_MAX_RECORD_BYTES)
    }

    /// Create a framer that rejects unterminated records larger than `limit`.
    #[must_use]
    pub fn with_max_record_bytes(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            records: VecDeque::new(),
            max_record_bytes: limit,
        }
    }

    /// Feed one chunk of bytes.
    ///
    /// Every record completed by this chunk is queued; the unterminated
    /// remainder stays buffered for the next call. Records queued before an
    /// overflow stay queued.
    pub fn feed(&mut self, chunk: &[u8]) -> StreamResult<()> {
        // Only the new bytes can contain a delimiter we have not seen yet.
        let mut cursor = self.pending.len();
        self.pending.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(offset) = self.pending[cursor..].iter().position(|&b| b == b'\n') {
            let end = cursor + offset;
            if let Some(record) = decode_record(&self.pending[start..end]) {
                self.records.push_back(record);
            }
            start = end + 1;
            cursor = start;
        }
        self.pending.drain(..start);

        if self.pending.len() > self.max_record_bytes {
            self.pending.clear();
            return Err(StreamError::BufferOverflow {
                limit: self.max_record_bytes,
            });
        }

        Ok(())
    }

    /// Feed a string chunk.
    pub fn feed_str(&mut self, s: &str) -> StreamResult<()> {
        self.feed(s.as_bytes())
    }

    /// Call when the stream ends to flush a final, unterminated record.
    pub fn finish(&mut self) {
        let tail = std::mem::take(&mut self.pending);
        if let Some(record) = decode_record(&tail) {
            self.records.push_back(record);
        }
    }

    /// Get the next complete record.
    pub fn next_record(&mut self) -> Option<String> {
        self.records.pop_front()
    }

    /// Check if there are complete records waiting.
    #[must_use]
    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }

    /// Number of buffered bytes not yet terminated by a delimiter.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drain every complete record.
    pub fn drain(&mut self) -> impl Iterator<Item = String> + '_ {
        self.records.drain(..)
    }

    /// Frame a complete sequence of chunks in one shot.
    pub fn frame_all<I, B>(chunks: I) -> StreamResult<Vec<String>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut framer = Self::new();
        for chunk in chunks {
            framer.feed(chunk.as_ref())?;
        }
        framer.finish();
        Ok(framer.drain().collect())
    }
}

/// Turn raw record bytes into text, dropping blank lines.
fn decode_record(line: &[u8]) -> Option<String> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    match std::str::from_utf8(line) {
        Ok(text) => Some(text.to_owned()),
        Err(e) => {
            tracing::warn!(error = %e, "Record is not valid UTF-8, decoding lossily");
            Some(String::from_utf8_lossy(line).into_owned())
        }
    }
}

pin_project! {
    /// Stream adapter that frames a byte stream into NDJSON records.
    ///
    /// Errors from the inner stream are passed through unchanged. A record
    /// overflow ends the stream, but only after every record completed
    /// before it has been yielded.
    pub struct NdjsonStream<S> {
        #[pin]
        inner: S,
        framer: LineFramer,
        overflow: Option<StreamError>,
        finished: bool,
    }
}

impl<S> NdjsonStream<S> {
    /// Create a new record stream from a byte stream.
    pub fn new(inner: S) -> Self {
        Self::with_framer(inner, LineFramer::new())
    }

    /// Create a record stream with a custom framer.
    pub fn with_framer(inner: S, framer: LineFramer) -> Self {
        Self {
            inner,
            framer,
            overflow: None,
            finished: false,
        }
    }
}

impl<S, B, E> Stream for NdjsonStream<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: From<StreamError>,
{
    type Item = Result<String, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            // Return buffered records first
            if let Some(record) = this.framer.next_record() {
                return Poll::Ready(Some(Ok(record)));
            }

            if let Some(error) = this.overflow.take() {
                return Poll::Ready(Some(Err(error.into())));
            }

            if *this.finished {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    if let Err(error) = this.framer.feed(chunk.as_ref()) {
                        *this.overflow = Some(error);
                        *this.finished = true;
                    }
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => {
                    *this.finished = true;
                    this.framer.finish();
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Extension trait for framing byte streams.
pub trait NdjsonStreamExt: Stream + Sized {
    /// Split this byte stream into newline-delimited records.
    fn ndjson_records(self) -> NdjsonStream<Self> {
        NdjsonStream::new(self)
    }
}

impl<S: Stream> NdjsonStreamExt for S {}
