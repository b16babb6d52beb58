//! # Router Module
//!
//! Method-and-path routing for the dispatcher.
//!
//! Routes are [`RouteTemplate`](crate::registry::RouteTemplate)s built from static
//! segments and single `{name}` parameters. They are stored in a radix tree so lookup
//! cost follows the path length, not the number of routes.
//!
//! A lookup distinguishes three outcomes, which the dispatcher turns into responses:
//!
//! - [`RouteLookup::NotFound`] - no route has this path (404)
//! - [`RouteLookup::MethodNotAllowed`] - the path exists for other methods (405)
//! - [`RouteLookup::Match`] - the payload plus percent-decoded path parameters
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::registry::RouteTemplate;
//! use brrtdispatch::router::{RouteLookup, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router
//!     .insert(Method::GET, &RouteTemplate::parse("/pets/{id}").unwrap(), "get_pet")
//!     .unwrap();
//!
//! match router.lookup(&Method::GET, "/pets/42") {
//!     RouteLookup::Match { payload, params } => {
//!         assert_eq!(*payload, "get_pet");
//!         assert_eq!(params[0].1, "42");
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod core;
mod radix;
#[cfg(test)]
mod tests;

pub use core::{ParamVec, RouteLookup, Router, MAX_INLINE_PARAMS};
