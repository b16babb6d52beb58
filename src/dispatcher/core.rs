use arc_swap::ArcSwap;
use http::{Method, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::handler::{HandlerError, HandlerFuture};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::media::{parse_accept, MediaType, WILDCARD};
use crate::middleware::{Middleware, RequestHead};
use crate::negotiation::negotiate;
use crate::registry::{Endpoint, EndpointTable};
use crate::router::RouteLookup;
use crate::runtime_config::RuntimeConfig;
use crate::server::{Request, Response, TransportRequest};

use super::context::RequestContext;
use super::error::DispatchError;

/// How handler execution ended
enum Outcome {
    Done(Result<Response, HandlerError>),
    TimedOut(Duration),
    Cancelled,
}

/// Resolves once `deadline` passes; never without one
async fn expire(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Race the handler against cancellation and the deadline.
///
/// Whichever loses is dropped, and with it the request and its body.
async fn drive(fut: HandlerFuture, ctx: &RequestContext, budget: Option<Duration>) -> Outcome {
    tokio::select! {
        biased;
        result = fut => Outcome::Done(result),
        () = ctx.cancelled() => Outcome::Cancelled,
        () = expire(ctx.deadline()) => Outcome::TimedOut(budget.unwrap_or_default()),
    }
}

/// Comma-separated method list for an `Allow` header
fn allow_header(allowed: &[Method]) -> String {
    allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Routes, negotiates and runs handlers for transport requests.
///
/// The endpoint table sits behind an [`ArcSwap`]: each request loads the current
/// table once, and [`Dispatcher::reload`] swaps in a new one without disturbing
/// requests already in flight.
pub struct Dispatcher {
    table: ArcSwap<EndpointTable>,
    config: RuntimeConfig,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    /// Create a dispatcher over a built endpoint table
    #[must_use]
    pub fn new(table: EndpointTable, config: RuntimeConfig) -> Self {
        info!(
            endpoints = table.endpoint_count(),
            groups = table.group_count(),
            max_body_bytes = ?config.max_body_bytes,
            handler_timeout_ms = ?config.handler_timeout_ms,
            "Dispatcher created"
        );
        Self {
            table: ArcSwap::from_pointee(table),
            config,
            middlewares: Vec::new(),
        }
    }

    /// Register middleware; hooks run in registration order
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        debug!(
            middleware = std::any::type_name_of_val(mw.as_ref()),
            "Middleware added"
        );
        self.middlewares.push(mw);
    }

    /// Atomically replace the endpoint table
    pub fn reload(&self, table: EndpointTable) {
        info!(
            endpoints = table.endpoint_count(),
            groups = table.group_count(),
            "Endpoint table reloaded"
        );
        self.table.store(Arc::new(table));
    }

    /// The current endpoint table
    #[must_use]
    pub fn table(&self) -> Arc<EndpointTable> {
        self.table.load_full()
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Dispatch a request with a fresh context.
    ///
    /// The request id is taken from `X-Request-Id` when it holds a valid ULID.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch_with_context`].
    pub async fn dispatch(&self, req: TransportRequest) -> Result<Response, DispatchError> {
        let request_id = RequestId::from_header_or_new(req.headers.get(REQUEST_ID_HEADER));
        self.dispatch_with_context(req, RequestContext::new(request_id))
            .await
    }

    /// Dispatch a request with a caller-supplied context.
    ///
    /// Routing misses, negotiation failures, malformed headers and handler status
    /// errors all produce an `Ok` response without a body. Cancel the context to
    /// abandon the handler.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Handler`] when the handler fails with an internal fault
    /// - [`DispatchError::Timeout`] when the configured handler timeout expires
    /// - [`DispatchError::Cancelled`] when the context is cancelled mid-handler
    pub async fn dispatch_with_context(
        &self,
        req: TransportRequest,
        ctx: RequestContext,
    ) -> Result<Response, DispatchError> {
        let span = info_span!(
            "dispatch",
            request_id = %ctx.request_id(),
            method = %req.method,
            path = %req.path,
        );
        self.run(req, ctx).instrument(span).await
    }

    async fn run(
        &self,
        req: TransportRequest,
        ctx: RequestContext,
    ) -> Result<Response, DispatchError> {
        let started = Instant::now();
        let table = self.table.load_full();
        let TransportRequest {
            method,
            path,
            query,
            headers,
            body,
        } = req;
        let mut head = RequestHead {
            request_id: ctx.request_id(),
            method: method.clone(),
            path: path.clone(),
            endpoint: None,
        };

        // Route lookup
        let (group, path_params) = match table.lookup(&method, &path) {
            RouteLookup::Match { payload, params } => (payload, params),
            RouteLookup::NotFound => {
                debug!("No route matched");
                return Ok(self.finish(&head, Response::new(StatusCode::NOT_FOUND), started));
            }
            RouteLookup::MethodNotAllowed { allowed } => {
                let allow = allow_header(&allowed);
                debug!(allow = %allow, "Method not allowed");
                let res = Response::new(StatusCode::METHOD_NOT_ALLOWED).with_header("Allow", allow);
                return Ok(self.finish(&head, res, started));
            }
        };
        debug!(
            route = %group.route(),
            candidates = group.endpoints().len(),
            "Route matched"
        );

        // Content negotiation
        let content_type = match headers.get("Content-Type").map(MediaType::parse).transpose() {
            Ok(content_type) => content_type,
            Err(err) => {
                debug!(error = %err, "Malformed Content-Type");
                return Ok(self.finish(&head, Response::new(StatusCode::BAD_REQUEST), started));
            }
        };
        let accept = match parse_accept(headers.get_all("Accept")) {
            Ok(accept) => accept,
            Err(err) => {
                debug!(error = %err, "Malformed Accept");
                return Ok(self.finish(&head, Response::new(StatusCode::BAD_REQUEST), started));
            }
        };
        let endpoint: Arc<Endpoint> = match negotiate(
            group.endpoints(),
            content_type.as_ref(),
            &accept,
            self.config.charset_matching,
        ) {
            Ok(endpoint) => Arc::clone(endpoint),
            Err(err) => {
                debug!(status = err.status().as_u16(), error = %err, "Negotiation failed");
                return Ok(self.finish(&head, Response::new(err.status()), started));
            }
        };
        head.endpoint = Some(Arc::clone(endpoint.name()));

        // Request assembly
        let query = match query.into_params() {
            Ok(query) => query,
            Err(err) => {
                debug!(error = %err, "Malformed query string");
                return Ok(self.finish(&head, Response::new(StatusCode::BAD_REQUEST), started));
            }
        };
        let max_bytes = match (body.max_bytes(), self.config.max_body_bytes) {
            (Some(own), Some(configured)) => Some(own.min(configured)),
            (own, configured) => own.or(configured),
        };
        let request = Request {
            method,
            path,
            path_params,
            query,
            headers,
            body: body.with_max_bytes(max_bytes),
            content_type,
        };

        for mw in &self.middlewares {
            if let Some(res) = mw.before(&head, &request) {
                debug!(
                    middleware = std::any::type_name_of_val(mw.as_ref()),
                    status = res.status.as_u16(),
                    "Middleware returned early response"
                );
                return Ok(self.finish(&head, res, started));
            }
        }

        // Handler execution
        let ctx = match self.config.handler_timeout() {
            Some(timeout) if ctx.remaining().map_or(true, |left| left > timeout) => {
                ctx.with_timeout(timeout)
            }
            _ => ctx,
        };
        let budget = ctx.remaining();
        debug!(endpoint = %endpoint.name(), "Request dispatched to handler");
        let handler_started = Instant::now();
        let outcome = drive(endpoint.handler().handle(request, ctx.clone()), &ctx, budget).await;
        let handler_ms = handler_started.elapsed().as_millis() as u64;

        let mut response = match outcome {
            Outcome::Done(Ok(res)) => res,
            Outcome::Done(Err(HandlerError::Status(err))) => {
                debug!(
                    status = err.status().as_u16(),
                    message = err.message().unwrap_or(""),
                    "Handler returned status error"
                );
                let (status, headers) = err.into_parts();
                Response {
                    status,
                    headers,
                    body: None,
                }
            }
            Outcome::Done(Err(HandlerError::Internal(source))) => {
                error!(
                    endpoint = %endpoint.name(),
                    latency_ms = handler_ms,
                    error = %source,
                    "Handler failed"
                );
                return Err(DispatchError::Handler {
                    request_id: ctx.request_id(),
                    endpoint: Arc::clone(endpoint.name()),
                    source,
                });
            }
            Outcome::TimedOut(timeout) => {
                ctx.cancel();
                warn!(
                    endpoint = %endpoint.name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Handler timed out"
                );
                return Err(DispatchError::Timeout {
                    request_id: ctx.request_id(),
                    endpoint: Arc::clone(endpoint.name()),
                    timeout,
                });
            }
            Outcome::Cancelled => {
                warn!(
                    endpoint = %endpoint.name(),
                    latency_ms = handler_ms,
                    "Request cancelled during handler execution"
                );
                return Err(DispatchError::Cancelled {
                    request_id: ctx.request_id(),
                });
            }
        };
        info!(
            endpoint = %endpoint.name(),
            status = response.status.as_u16(),
            latency_ms = handler_ms,
            "Handler completed"
        );

        // Response finalization
        // A wildcard range is not a valid Content-Type value
        if let [only] = endpoint.produces() {
            let concrete = only.type_() != WILDCARD && only.subtype() != WILDCARD;
            if concrete && response.has_body() && !response.headers.contains("Content-Type") {
                response.headers.insert("Content-Type", only.to_string());
            }
        }
        Ok(self.finish(&head, response, started))
    }

    /// Run `after` hooks on a response the dispatcher is about to return
    fn finish(&self, head: &RequestHead, mut res: Response, started: Instant) -> Response {
        let latency = started.elapsed();
        for mw in &self.middlewares {
            mw.after(head, &mut res, latency);
        }
        res
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoints", &self.table.load().endpoint_count())
            .field("config", &self.config)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_header_keeps_order() {
        assert_eq!(
            allow_header(&[Method::PUT, Method::POST, Method::OPTIONS]),
            "PUT, POST, OPTIONS"
        );
        assert_eq!(allow_header(&[]), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_times_out_pending_handler() {
        let ctx = RequestContext::new(RequestId::new()).with_timeout(Duration::from_millis(50));
        let fut: HandlerFuture = Box::pin(std::future::pending::<Result<Response, HandlerError>>());
        let outcome = drive(fut, &ctx, Some(Duration::from_millis(50))).await;
        assert!(matches!(outcome, Outcome::TimedOut(t) if t == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_drive_prefers_finished_handler() {
        let ctx = RequestContext::new(RequestId::new());
        ctx.cancel();
        let fut: HandlerFuture = Box::pin(async { Ok::<_, HandlerError>(Response::ok("done")) });
        let outcome = drive(fut, &ctx, None).await;
        assert!(matches!(outcome, Outcome::Done(Ok(_))));
    }
}
