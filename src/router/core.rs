//! Router core module - hot path for request routing.
//!
//! This module is part of the request hot path. Clippy lints that catch needless
//! string allocations are denied here.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::Method;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::registry::{RouteError, RouteTemplate};

use super::radix::{RadixNode, Search};

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have 4 path params or fewer (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the route tree built at startup;
/// values are per-request data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of looking up a request path
#[derive(Debug)]
pub enum RouteLookup<'a, T> {
    /// No route matches the path
    NotFound,
    /// The path matches but the method is not registered there
    MethodNotAllowed {
        /// Methods registered at the matching route, in registration order
        allowed: Vec<Method>,
    },
    /// The path and method match
    Match {
        /// The registered payload
        payload: &'a T,
        /// Path parameters, percent-decoded, in template order
        params: ParamVec,
    },
}

/// Method-and-path router over an arbitrary payload type.
///
/// The dispatcher stores one endpoint group per `(method, route)`; tests and other
/// callers can store anything.
pub struct Router<T> {
    root: RadixNode<T>,
    len: usize,
}

impl<T> Router<T> {
    /// Empty router
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RadixNode::root(),
            len: 0,
        }
    }

    /// Register `payload` for `method` at `route`.
    ///
    /// # Errors
    ///
    /// [`RouteError::DuplicateRoute`] if the pair is already registered.
    pub fn insert(
        &mut self,
        method: Method,
        route: &RouteTemplate,
        payload: T,
    ) -> Result<(), RouteError> {
        self.root
            .insert(route.segments(), method, payload, route)?;
        self.len += 1;
        Ok(())
    }

    /// Look up a request path (without its query string)
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> RouteLookup<'_, T> {
        let segments: SmallVec<[&str; 16]> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = ParamVec::new();

        match self.root.lookup(&segments, method, &mut params) {
            Search::Found(payload) => RouteLookup::Match { payload, params },
            Search::WrongMethod(allowed) => {
                debug!(method = %method, path = %path, allowed = ?allowed, "Method not allowed");
                RouteLookup::MethodNotAllowed { allowed }
            }
            Search::Missing => {
                debug!(method = %method, path = %path, "No route matched");
                RouteLookup::NotFound
            }
        }
    }

    /// Number of registered `(method, route)` pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Router<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("routes", &self.len).finish()
    }
}
