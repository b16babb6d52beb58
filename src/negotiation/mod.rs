//! # Content Negotiation Module
//!
//! Selects, among the endpoints registered at one method and route, the one that
//! consumes the request's Content-Type and best satisfies its Accept header.
//!
//! ## Algorithm
//!
//! 1. **Consumer filter** - an endpoint survives when its consumable set matches the
//!    declared Content-Type. With no Content-Type, only endpoints with an empty or
//!    `*/*` consumable set survive. Nothing left answers 415.
//! 2. **Producer filter** - Accept elements are ordered by descending quality (ties
//!    keep header order, `q=0` is dropped). For each, the first surviving endpoint in
//!    registration order that produces a match wins. Nothing left answers 406.
//!
//! After the handler ran, the dispatcher sets `Content-Type` to the winner's only
//! producible type when it declares exactly one and the handler did not set one.
//!
//! Whether charsets take part in matching is configured with
//! [`CharsetMatching`](crate::media::CharsetMatching).

mod core;
mod error;

pub use core::negotiate;
pub use error::NegotiationError;
