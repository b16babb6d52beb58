use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt;
use std::io::Read;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll};
use tracing::debug;

use super::blocking::{BlockingSource, DEFAULT_CHUNK_SIZE};
use super::error::BodyError;
use super::feed::{self, BodySender, FedSource};

enum BodyKind {
    Memory(Bytes),
    Empty,
    Fed(FedSource),
    Blocking(BlockingSource),
}

impl BodyKind {
    fn name(&self) -> &'static str {
        match self {
            BodyKind::Memory(_) => "memory",
            BodyKind::Empty => "empty",
            BodyKind::Fed(_) => "fed",
            BodyKind::Blocking(_) => "blocking",
        }
    }
}

/// A request or response body that can be drained exactly once.
///
/// Draining goes through `&self` so a handler can pass the request around freely;
/// the first call to [`Body::stream`] or [`Body::bytes`] wins and every later call
/// fails with [`BodyError::AlreadyConsumed`].
pub struct Body {
    kind: Mutex<Option<BodyKind>>,
    consumed: AtomicBool,
    content_length: Option<u64>,
    max_bytes: Option<usize>,
}

impl Body {
    fn from_kind(kind: BodyKind, content_length: Option<u64>) -> Self {
        Self {
            kind: Mutex::new(Some(kind)),
            consumed: AtomicBool::new(false),
            content_length,
            max_bytes: None,
        }
    }

    /// A body already held in memory
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let len = bytes.len() as u64;
        Self::from_kind(BodyKind::Memory(bytes), Some(len))
    }

    /// A body with no content
    #[must_use]
    pub fn empty() -> Self {
        Self::from_kind(BodyKind::Empty, Some(0))
    }

    /// An externally-fed body backed by a queue of at most `bound` chunks.
    ///
    /// The transport keeps the returned [`BodySender`] and pushes chunks as they
    /// arrive; the handler drains the [`Body`].
    #[must_use]
    pub fn channel(content_length: Option<u64>, bound: usize) -> (BodySender, Self) {
        let (sender, source) = feed::channel(bound);
        (sender, Self::from_kind(BodyKind::Fed(source), content_length))
    }

    /// A body pulled from a blocking reader in chunks of `chunk_size` bytes.
    ///
    /// Reads run on the blocking thread pool. The reader is dropped at end of stream,
    /// on the first read error, or when the body is dropped.
    pub fn from_reader<R>(reader: R, content_length: Option<u64>, chunk_size: usize) -> Self
    where
        R: Read + Send + 'static,
    {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self::from_kind(
            BodyKind::Blocking(BlockingSource::new(Box::new(reader), chunk_size)),
            content_length,
        )
    }

    /// Cap the number of bytes this body may yield
    #[must_use]
    pub fn with_max_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_bytes = limit;
        self
    }

    /// Length declared by the producer, if any
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Configured byte limit, if any
    #[must_use]
    pub fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    /// `true` once the body has been drained or handed out as a stream
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed.load(Ordering::Acquire)
    }

    fn take_kind(&self) -> Result<BodyKind, BodyError> {
        if self.consumed.swap(true, Ordering::AcqRel) {
            return Err(BodyError::AlreadyConsumed);
        }
        self.kind
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(BodyError::AlreadyConsumed)
    }

    fn stream_from(&self, kind: BodyKind) -> BodyStream {
        let source = match kind {
            BodyKind::Memory(bytes) => Source::Memory(Some(bytes)),
            BodyKind::Empty => Source::Done,
            BodyKind::Fed(fed) => Source::Fed(fed),
            BodyKind::Blocking(blocking) => Source::Blocking(blocking),
        };
        BodyStream {
            source,
            content_length: self.content_length,
            max_bytes: self.max_bytes,
            received: 0,
        }
    }

    /// Take the body as an incremental stream of chunks.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::AlreadyConsumed`] if the body was drained before.
    pub fn stream(&self) -> Result<BodyStream, BodyError> {
        let kind = self.take_kind()?;
        debug!(kind = kind.name(), content_length = ?self.content_length, "Body streamed");
        Ok(self.stream_from(kind))
    }

    /// Owned variant of [`Body::stream`]
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::AlreadyConsumed`] if the body was drained before.
    pub fn into_stream(self) -> Result<BodyStream, BodyError> {
        self.stream()
    }

    /// Drain the whole body into one contiguous buffer.
    ///
    /// A declared length is reserved up front. A length that does not fit in memory,
    /// exceeds the configured limit or cannot be allocated fails with
    /// [`BodyError::EntityTooLarge`].
    ///
    /// # Errors
    ///
    /// [`BodyError::AlreadyConsumed`], [`BodyError::EntityTooLarge`], or whatever the
    /// underlying source reports.
    pub async fn bytes(&self) -> Result<Bytes, BodyError> {
        let kind = self.take_kind()?;
        debug!(kind = kind.name(), content_length = ?self.content_length, "Body materialized");

        match kind {
            BodyKind::Memory(bytes) => {
                check_limit(bytes.len(), self.max_bytes)?;
                return Ok(bytes);
            }
            BodyKind::Empty => return Ok(Bytes::new()),
            _ => {}
        }

        let mut buf = Vec::new();
        if let Some(declared) = self.content_length {
            let too_large = BodyError::EntityTooLarge { size: declared };
            let len = usize::try_from(declared).map_err(|_| BodyError::EntityTooLarge {
                size: declared,
            })?;
            if isize::try_from(len).is_err() {
                return Err(too_large);
            }
            check_limit(len, self.max_bytes).map_err(|_| too_large)?;
            buf.try_reserve_exact(len)
                .map_err(|_| BodyError::EntityTooLarge { size: declared })?;
        }

        let mut stream = self.stream_from(kind);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buf.try_reserve(chunk.len())
                .map_err(|_| BodyError::EntityTooLarge {
                    size: stream.received,
                })?;
            buf.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(buf))
    }
}

fn check_limit(len: usize, limit: Option<usize>) -> Result<(), BodyError> {
    match limit {
        Some(max) if len > max => Err(BodyError::EntityTooLarge { size: len as u64 }),
        _ => Ok(()),
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from_bytes(text)
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from_bytes(text)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self
            .kind
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or("consumed", BodyKind::name);
        f.debug_struct("Body")
            .field("kind", &kind)
            .field("content_length", &self.content_length)
            .field("max_bytes", &self.max_bytes)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

enum Source {
    Memory(Option<Bytes>),
    Fed(FedSource),
    Blocking(BlockingSource),
    Done,
}

/// Incremental view of a [`Body`].
///
/// Yields non-empty chunks. When a length was declared, a stream that ends early or
/// runs past it finishes with [`BodyError::LengthMismatch`]. After the first error
/// the underlying source is released and the stream yields nothing more.
pub struct BodyStream {
    source: Source,
    content_length: Option<u64>,
    max_bytes: Option<usize>,
    received: u64,
}

impl BodyStream {
    /// Bytes yielded so far
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received
    }

    fn fail(&mut self, err: BodyError) -> Poll<Option<Result<Bytes, BodyError>>> {
        self.source = Source::Done;
        Poll::Ready(Some(Err(err)))
    }
}

impl Stream for BodyStream {
    type Item = Result<Bytes, BodyError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let polled = match &mut this.source {
            Source::Memory(bytes) => Poll::Ready(bytes.take().filter(|b| !b.is_empty()).map(Ok)),
            Source::Fed(fed) => fed.poll_chunk(cx),
            Source::Blocking(blocking) => blocking.poll_chunk(cx),
            Source::Done => return Poll::Ready(None),
        };

        match polled {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => {
                this.received += chunk.len() as u64;
                if let Some(declared) = this.content_length {
                    if this.received > declared {
                        let received = this.received;
                        return this.fail(BodyError::LengthMismatch { declared, received });
                    }
                }
                if let Some(max) = this.max_bytes {
                    if this.received > max as u64 {
                        let size = this.received;
                        return this.fail(BodyError::EntityTooLarge { size });
                    }
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(err))) => this.fail(err),
            Poll::Ready(None) => {
                this.source = Source::Done;
                match this.content_length {
                    Some(declared) if declared != this.received => {
                        Poll::Ready(Some(Err(BodyError::LengthMismatch {
                            declared,
                            received: this.received,
                        })))
                    }
                    _ => Poll::Ready(None),
                }
            }
        }
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            Source::Memory(_) => "memory",
            Source::Fed(_) => "fed",
            Source::Blocking(_) => "blocking",
            Source::Done => "done",
        };
        f.debug_struct("BodyStream")
            .field("source", &source)
            .field("content_length", &self.content_length)
            .field("received", &self.received)
            .finish()
    }
}
