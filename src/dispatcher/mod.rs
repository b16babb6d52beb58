//! # Dispatcher Module
//!
//! Drives every request through four stages, each of which can answer early:
//!
//! 1. **Route lookup** - unknown path answers 404, known path with an unregistered
//!    method answers 405 with an `Allow` header
//! 2. **Content negotiation** - malformed `Content-Type`/`Accept` answers 400, no
//!    consumer answers 415, no acceptable producer answers 406
//! 3. **Handler execution** - the request is assembled (a malformed query answers
//!    400), `before` middleware runs, then the handler runs under the request's
//!    cancellation token and optional timeout
//! 4. **Response finalization** - `Content-Type` is filled in from the endpoint's
//!    single producible type, then `after` middleware runs
//!
//! Responses produced by the dispatcher itself and by handler status errors never
//! carry a body. Internal handler faults, timeouts and cancellation surface as
//! [`DispatchError`] once the request and its body have been dropped.
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::dispatcher::{Dispatcher, RequestContext};
//! use brrtdispatch::handler::HandlerError;
//! use brrtdispatch::registry::{Endpoint, EndpointRegistry};
//! use brrtdispatch::runtime_config::RuntimeConfig;
//! use brrtdispatch::server::{Request, Response, TransportRequest};
//! use http::{Method, StatusCode};
//!
//! async fn hello(_req: Request, _ctx: RequestContext) -> Result<Response, HandlerError> {
//!     Ok(Response::ok("hello"))
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let table = EndpointRegistry::new()
//!     .with_endpoint(
//!         Endpoint::builder(Method::GET, "/hello")
//!             .produces("text/plain")
//!             .handler(hello)
//!             .unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//! let dispatcher = Dispatcher::new(table, RuntimeConfig::default());
//!
//! let res = dispatcher
//!     .dispatch(TransportRequest::new(Method::GET, "/hello"))
//!     .await
//!     .unwrap();
//! assert_eq!(res.status, StatusCode::OK);
//! assert_eq!(res.headers.get("content-type"), Some("text/plain;charset=utf-8"));
//! # }
//! ```

mod context;
mod core;
mod error;

pub use context::RequestContext;
pub use core::Dispatcher;
pub use error::DispatchError;
pub use tokio_util::sync::CancellationToken;
