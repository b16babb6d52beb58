//! # Middleware Module
//!
//! Request hooks and the CORS enforcer.
//!
//! - [`Middleware`] - `before`/`after` hooks the dispatcher runs around handlers
//! - [`TracingMiddleware`] - per-request completion log with status and latency
//! - [`cors`] - CORS policies, preflight synthesis and actual-request decoration

mod core;
pub mod cors;
mod tracing;

pub use core::{Middleware, RequestHead};
pub use cors::{
    AccessDecision, CorsConfigError, CorsPolicy, CorsPolicyBuilder, PrivatePolicy, PublicPolicy,
};
pub use tracing::TracingMiddleware;
