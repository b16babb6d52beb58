//! Externally-fed body: a bounded queue written by the transport and drained by the
//! handler.

use bytes::Bytes;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

use super::error::{BodyError, BodySendError};

type Chunk = Result<Bytes, BodyError>;

/// Producer half of an externally-fed body.
///
/// The queue holds at most `bound` chunks. [`BodySender::send`] suspends while the
/// queue is full, which couples producer speed to consumer speed. Dropping the sender
/// (or calling [`BodySender::finish`]) marks the end of the body.
#[derive(Debug)]
pub struct BodySender {
    tx: mpsc::Sender<Chunk>,
}

impl BodySender {
    /// Queue a chunk, waiting for space if the consumer is behind.
    ///
    /// Empty chunks are accepted and skipped by the consumer.
    ///
    /// # Errors
    ///
    /// Returns [`BodySendError::Closed`] once the consumer has dropped the body.
    pub async fn send(&self, chunk: impl Into<Bytes>) -> Result<(), BodySendError> {
        self.tx
            .send(Ok(chunk.into()))
            .await
            .map_err(|_| BodySendError::Closed)
    }

    /// Queue a chunk without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`BodySendError::Full`] with the chunk when the queue is at capacity and
    /// [`BodySendError::Closed`] when the consumer is gone.
    pub fn try_send(&self, chunk: impl Into<Bytes>) -> Result<(), BodySendError> {
        self.tx.try_send(Ok(chunk.into())).map_err(|err| match err {
            mpsc::error::TrySendError::Full(Ok(chunk)) => BodySendError::Full(chunk),
            mpsc::error::TrySendError::Full(Err(_)) => BodySendError::Full(Bytes::new()),
            mpsc::error::TrySendError::Closed(_) => BodySendError::Closed,
        })
    }

    /// Abort the body; the consumer sees [`BodyError::Aborted`] after any queued chunks.
    pub async fn abort(self, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(reason = %reason, "Body producer aborted");
        // A closed receiver already stopped reading, nothing left to tell it.
        let _ = self.tx.send(Err(BodyError::Aborted { reason })).await;
    }

    /// Signal the end of the body
    pub fn finish(self) {}

    /// Number of chunks currently waiting in the queue
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Maximum number of chunks the queue can hold
    #[must_use]
    pub fn queue_bound(&self) -> usize {
        self.tx.max_capacity()
    }

    /// `true` once the consumer has dropped the body
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the [`Body`](super::Body).
#[derive(Debug)]
pub(crate) struct FedSource {
    rx: mpsc::Receiver<Chunk>,
}

impl FedSource {
    pub(crate) fn poll_chunk(&mut self, cx: &mut Context<'_>) -> Poll<Option<Chunk>> {
        loop {
            match self.rx.poll_recv(cx) {
                Poll::Ready(Some(Ok(chunk))) if chunk.is_empty() => continue,
                Poll::Ready(Some(Err(err))) => {
                    self.rx.close();
                    return Poll::Ready(Some(Err(err)));
                }
                other => return other,
            }
        }
    }
}

/// Create a bounded producer/consumer pair. A bound of zero is raised to one.
pub(crate) fn channel(bound: usize) -> (BodySender, FedSource) {
    let (tx, rx) = mpsc::channel(bound.max(1));
    (BodySender { tx }, FedSource { rx })
}
