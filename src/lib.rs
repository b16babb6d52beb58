//! # brrtdispatch
//!
//! **brrtdispatch** is a content-negotiating request dispatch core for REST APIs. It
//! sits between a transport that parses HTTP and the application handlers, and
//! decides which handler serves each request.
//!
//! ## Overview
//!
//! Several endpoints may share one route and method when they differ in the media
//! types they consume and produce. For each request the dispatcher routes to that
//! group, negotiates a single endpoint from the `Content-Type` and `Accept`
//! headers, runs its handler and finalizes the response. A pluggable CORS policy
//! wraps every endpoint and synthesizes preflight endpoints. Request and response
//! bodies are streams that never have to be buffered in full.
//!
//! ## Architecture
//!
//! - **[`media`]** - media type parsing, `Accept` qualities and matching
//! - **[`body`]** - single-consumption streaming bodies (memory, empty, fed, blocking)
//! - **[`server`]** - transport-facing request, response, header and query types
//! - **[`router`]** - radix tree path router the endpoint table is built on
//! - **[`registry`]** - endpoint declarations and the immutable endpoint table
//! - **[`negotiation`]** - picks one endpoint of a group (415/406)
//! - **[`middleware`]** - request hooks and the CORS enforcer
//! - **[`handler`]** - the handler trait and its error type
//! - **[`dispatcher`]** - the route, negotiate, execute, finalize state machine
//! - **[`runtime_config`]** - tunables from the environment or a config file
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant T as Transport
//!     participant D as Dispatcher
//!     participant R as Router
//!     participant N as Negotiator
//!     participant H as Handler
//!
//!     T->>D: dispatch(TransportRequest)
//!     D->>R: lookup(method, path)
//!     alt no route / wrong method
//!         R-->>D: NotFound / MethodNotAllowed
//!         D-->>T: 404 / 405 + Allow
//!     end
//!     R-->>D: EndpointGroup + path params
//!     D->>N: negotiate(group, Content-Type, Accept)
//!     alt no consumer / no producer
//!         N-->>D: UnsupportedMediaType / NotAcceptable
//!         D-->>T: 415 / 406
//!     end
//!     N-->>D: Endpoint
//!     D->>H: handle(Request, RequestContext)
//!     H-->>D: Response or HandlerError
//!     D->>D: inject Content-Type, run after-hooks
//!     D-->>T: Response or DispatchError
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtdispatch::dispatcher::{Dispatcher, RequestContext};
//! use brrtdispatch::handler::HandlerError;
//! use brrtdispatch::middleware::CorsPolicyBuilder;
//! use brrtdispatch::registry::{Endpoint, EndpointRegistry};
//! use brrtdispatch::runtime_config::RuntimeConfig;
//! use brrtdispatch::server::{Request, Response, TransportRequest};
//! use http::{Method, StatusCode};
//!
//! async fn as_json(_req: Request, _ctx: RequestContext) -> Result<Response, HandlerError> {
//!     Ok(Response::ok(r#"{"greeting":"hello"}"#))
//! }
//!
//! async fn as_text(_req: Request, _ctx: RequestContext) -> Result<Response, HandlerError> {
//!     Ok(Response::ok("hello"))
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let table = EndpointRegistry::new()
//!     .with_endpoint(
//!         Endpoint::builder(Method::GET, "/greeting")
//!             .produces("application/json")
//!             .handler(as_json)
//!             .unwrap(),
//!     )
//!     .with_endpoint(
//!         Endpoint::builder(Method::GET, "/greeting")
//!             .produces("text/plain")
//!             .handler(as_text)
//!             .unwrap(),
//!     )
//!     .with_cors(CorsPolicyBuilder::public().build().unwrap())
//!     .build()
//!     .unwrap();
//! let dispatcher = Dispatcher::new(table, RuntimeConfig::default());
//!
//! let req = TransportRequest::new(Method::GET, "/greeting")
//!     .header("Accept", "text/plain, application/json;q=0.5");
//! let res = dispatcher.dispatch(req).await.unwrap();
//! assert_eq!(res.status, StatusCode::OK);
//! assert_eq!(res.headers.get("Content-Type"), Some("text/plain;charset=utf-8"));
//! # }
//! ```
//!
//! ## Runtime Considerations
//!
//! The crate runs on tokio. Handlers are async; blocking work belongs in
//! [`RequestContext::spawn_blocking`](dispatcher::RequestContext::spawn_blocking),
//! and blocking body sources are read on the blocking pool automatically. The
//! crate performs no network I/O of its own.

pub mod body;
pub mod dispatcher;
pub mod handler;
pub mod ids;
pub mod logging;
pub mod media;
pub mod middleware;
pub mod negotiation;
pub mod registry;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use body::{Body, BodyError};
pub use dispatcher::{DispatchError, Dispatcher, RequestContext};
pub use handler::{Handler, HandlerError, StatusError};
pub use media::{CharsetMatching, MediaType};
pub use registry::{Endpoint, EndpointRegistry};
pub use runtime_config::RuntimeConfig;
pub use server::{Request, Response, TransportRequest};
