//! # Media Type Module
//!
//! Parsing, formatting and matching of MIME media types used by content negotiation.
//!
//! ## Overview
//!
//! - **[`MediaType`]** - normalized `type/subtype` plus charset, with `*` wildcards
//! - **[`QualifiedMediaType`]** - one element of an `Accept` header with its quality value
//! - **[`CharsetMatching`]** - whether charsets take part in matching
//!
//! All values are lowercased when parsed, so `APPLICATION/JSON;CHARSET=UTF-8` and
//! `application/json;charset=utf-8` are the same media type. A missing `charset`
//! parameter defaults to `utf-8`.
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::media::{CharsetMatching, MediaType};
//!
//! let plain: MediaType = "text/plain".parse().unwrap();
//! let any_text: MediaType = "text/*".parse().unwrap();
//! assert!(plain.is_match(&any_text, CharsetMatching::Strict));
//! assert_eq!(plain.to_string(), "text/plain;charset=utf-8");
//! ```

mod media_type;
mod quality;

pub use media_type::{matches_any, CharsetMatching, MediaType, MediaTypeError, DEFAULT_CHARSET, WILDCARD};
pub use quality::{parse_accept, sort_by_preference, QualifiedMediaType, Quality};
