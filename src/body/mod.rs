//! # Body Module
//!
//! Streaming request and response bodies.
//!
//! A [`Body`] is a lazy, finite byte sequence that can be drained exactly once,
//! either incrementally through [`Body::stream`] or all at once through
//! [`Body::bytes`]. Four sources are supported:
//!
//! - **Memory** - bytes already loaded ([`Body::from_bytes`])
//! - **Empty** - no content ([`Body::empty`])
//! - **Fed** - a bounded queue pushed by the transport through a [`BodySender`]
//!   ([`Body::channel`]); a full queue suspends the producer
//! - **Blocking** - a `std::io::Read` source read on the blocking thread pool
//!   ([`Body::from_reader`])
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::body::Body;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (tx, body) = Body::channel(Some(11), 4);
//! tokio::spawn(async move {
//!     tx.send("hello ").await.unwrap();
//!     tx.send("world").await.unwrap();
//! });
//! assert_eq!(&body.bytes().await.unwrap()[..], b"hello world");
//! # }
//! ```

mod blocking;
mod core;
mod error;
mod feed;

pub use blocking::DEFAULT_CHUNK_SIZE;
pub use core::{Body, BodyStream};
pub use error::{BodyError, BodySendError};
pub use feed::BodySender;
