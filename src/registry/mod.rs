//! # Endpoint Registry Module
//!
//! Declares endpoints and builds the immutable table the dispatcher routes against.
//!
//! ## Overview
//!
//! - [`RouteTemplate`] - parsed `/static/{param}` template
//! - [`Endpoint`] - method, route, consumable and producible media types, handler
//! - [`EndpointGroup`] - endpoints sharing a method and route; negotiation picks one
//! - [`EndpointRegistry`] - collects endpoints and an optional CORS policy
//! - [`EndpointTable`] - the built, routed result
//! - [`RouteMethods`] - methods registered per route, consulted by CORS policies
//!
//! Several endpoints may share a method and route when they differ in media types,
//! for example a JSON and a plain-text rendering of the same resource. They are
//! kept in registration order, which breaks negotiation ties.
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::dispatcher::RequestContext;
//! use brrtdispatch::handler::HandlerError;
//! use brrtdispatch::registry::{Endpoint, EndpointRegistry};
//! use brrtdispatch::server::{Request, Response};
//! use http::Method;
//!
//! async fn get_pet(req: Request, _ctx: RequestContext) -> Result<Response, HandlerError> {
//!     let id = req.get_path_param("id").unwrap_or_default().to_string();
//!     Ok(Response::ok(format!("{{\"id\":\"{id}\"}}")))
//! }
//!
//! let table = EndpointRegistry::new()
//!     .with_endpoint(
//!         Endpoint::builder(Method::GET, "/pets/{id}")
//!             .produces("application/json")
//!             .handler(get_pet)
//!             .unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//! assert_eq!(table.endpoint_count(), 1);
//! ```

mod build;
mod endpoint;
mod error;
mod group;
mod route;

pub use build::EndpointRegistry;
pub use endpoint::{Endpoint, EndpointBuilder};
pub use error::RegistryError;
pub use group::{EndpointGroup, EndpointTable};
pub use route::{RouteError, RouteMethods, RouteTemplate, Segment};
