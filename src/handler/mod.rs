//! # Handler Module
//!
//! The [`Handler`] trait implemented by application code, and the errors handlers
//! return.
//!
//! A handler fails in one of two ways:
//!
//! - [`HandlerError::Status`] carries a [`StatusError`]; the dispatcher answers with
//!   that status and its headers and no body
//! - [`HandlerError::Internal`] is an unexpected fault; the dispatcher drops the
//!   request and returns the error to its caller
//!
//! Body failures convert automatically: an oversized body becomes 413, anything else
//! is internal.

mod core;
mod error;

pub use core::{Handler, HandlerFuture};
pub use error::{HandlerError, StatusError};
