use futures::future::{BoxFuture, FutureExt};
use std::future::Future;

use crate::dispatcher::RequestContext;
use crate::server::{Request, Response};

use super::error::HandlerError;

/// Future returned by [`Handler::handle`]
pub type HandlerFuture = BoxFuture<'static, Result<Response, HandlerError>>;

/// Application code that turns a negotiated request into a response.
///
/// Any `Fn(Request, RequestContext) -> impl Future<Output = Result<Response,
/// HandlerError>>` closure is a handler:
///
/// ```rust
/// use brrtdispatch::dispatcher::RequestContext;
/// use brrtdispatch::handler::{Handler, HandlerError};
/// use brrtdispatch::server::{Request, Response};
///
/// fn assert_handler<H: Handler>(_: H) {}
///
/// assert_handler(|req: Request, _ctx: RequestContext| async move {
///     let body = req.body.bytes().await?;
///     Ok::<_, HandlerError>(Response::ok(body))
/// });
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handle one request
    fn handle(&self, req: Request, ctx: RequestContext) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
{
    fn handle(&self, req: Request, ctx: RequestContext) -> HandlerFuture {
        (self)(req, ctx).boxed()
    }
}
