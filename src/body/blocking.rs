//! Blocking-source-fed body.
//!
//! Every read of the wrapped `std::io::Read` runs on tokio's blocking pool so the
//! task driving the request never blocks its worker thread. The source travels into
//! the blocking task and back with each chunk; it is dropped (closed) on end of
//! stream, on the first error, or together with an abandoned in-flight read.

use bytes::Bytes;
use std::fmt;
use std::future::Future;
use std::io::{self, Read};
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::BodyError;

/// Default size of a single blocking read
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

pub(crate) type Reader = Box<dyn Read + Send + 'static>;

type PendingRead = JoinHandle<(Reader, io::Result<Bytes>)>;

pub(crate) struct BlockingSource {
    reader: Option<Reader>,
    pending: Option<PendingRead>,
    chunk_size: usize,
    done: bool,
}

impl BlockingSource {
    pub(crate) fn new(reader: Reader, chunk_size: usize) -> Self {
        Self {
            reader: Some(reader),
            pending: None,
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }

    pub(crate) fn poll_chunk(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, BodyError>>> {
        loop {
            if self.done {
                return Poll::Ready(None);
            }

            if let Some(pending) = self.pending.as_mut() {
                let joined = ready!(Pin::new(pending).poll(cx));
                self.pending = None;
                return Poll::Ready(match joined {
                    Ok((reader, Ok(chunk))) if chunk.is_empty() => {
                        drop(reader);
                        self.done = true;
                        debug!("Blocking body source exhausted and closed");
                        None
                    }
                    Ok((reader, Ok(chunk))) => {
                        self.reader = Some(reader);
                        Some(Ok(chunk))
                    }
                    Ok((reader, Err(err))) => {
                        drop(reader);
                        self.done = true;
                        warn!(error = %err, "Blocking body read failed - source closed");
                        Some(Err(BodyError::Io(err)))
                    }
                    Err(join_err) => {
                        self.done = true;
                        warn!(error = %join_err, "Blocking body read task failed");
                        Some(Err(BodyError::Io(io::Error::other(join_err.to_string()))))
                    }
                });
            }

            let Some(mut reader) = self.reader.take() else {
                self.done = true;
                continue;
            };
            let chunk_size = self.chunk_size;
            self.pending = Some(tokio::task::spawn_blocking(move || {
                let result = read_chunk(&mut reader, chunk_size);
                (reader, result)
            }));
        }
    }
}

impl fmt::Debug for BlockingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingSource")
            .field("open", &(self.reader.is_some() || self.pending.is_some()))
            .field("read_in_flight", &self.pending.is_some())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

fn read_chunk(reader: &mut Reader, chunk_size: usize) -> io::Result<Bytes> {
    let mut buf = vec![0u8; chunk_size];
    loop {
        match reader.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                return Ok(Bytes::from(buf));
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}
