use futures::future::FutureExt;
use http::{Method, StatusCode};
use std::sync::Arc;
use tracing::debug;

use crate::dispatcher::RequestContext;
use crate::handler::{Handler, HandlerError, HandlerFuture};
use crate::registry::{RouteMethods, RouteTemplate};
use crate::server::{Headers, Request, Response};

use super::policy::{AccessDecision, CorsPolicy};

/// `Access-Control-Allow-Origin`
pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
/// `Access-Control-Allow-Methods`
pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
/// `Access-Control-Allow-Headers`
pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
/// `Access-Control-Max-Age`
pub const MAX_AGE: &str = "Access-Control-Max-Age";

/// Attach `Access-Control-Allow-Origin` and make caches key on `Origin`
fn allow_origin(headers: &mut Headers, origin: &str) {
    headers.insert(ALLOW_ORIGIN, origin);
    let varies_on_origin = headers
        .get_all("Vary")
        .flat_map(|v| v.split(','))
        .any(|v| v.trim().eq_ignore_ascii_case("origin") || v.trim() == "*");
    if !varies_on_origin {
        headers.append("Vary", "Origin");
    }
}

/// Build the answer to a preflight request
pub(crate) fn preflight_response(
    origin: Option<&str>,
    decision: &AccessDecision,
    max_age: Option<u32>,
) -> Response {
    let mut response = Response::new(StatusCode::NO_CONTENT);

    if !decision.allowed_methods().is_empty() {
        let methods = decision
            .allowed_methods()
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        response.headers.insert(ALLOW_METHODS, methods);
        if let Some(origin) = origin {
            allow_origin(&mut response.headers, origin);
        }
    }
    if !decision.allowed_headers().is_empty() {
        response
            .headers
            .insert(ALLOW_HEADERS, decision.allowed_headers().join(", "));
    }
    if let (Some(seconds), false) = (max_age, decision.is_forbidden()) {
        response.headers.insert(MAX_AGE, seconds.to_string());
    }
    response
}

/// The implicit OPTIONS endpoint synthesized for every route
pub(crate) struct PreflightHandler {
    policy: Arc<dyn CorsPolicy>,
    route: RouteTemplate,
    methods: Arc<RouteMethods>,
}

impl PreflightHandler {
    pub(crate) fn new(
        policy: Arc<dyn CorsPolicy>,
        route: RouteTemplate,
        methods: Arc<RouteMethods>,
    ) -> Self {
        Self {
            policy,
            route,
            methods,
        }
    }
}

impl Handler for PreflightHandler {
    fn handle(&self, req: Request, _ctx: RequestContext) -> HandlerFuture {
        let origin = req.get_header("Origin");
        let decision = self.policy.evaluate(origin, &self.route, &self.methods);
        debug!(
            route = %self.route,
            origin = ?origin,
            allowed_methods = ?decision.allowed_methods(),
            forbidden = decision.is_forbidden(),
            "CORS preflight evaluated"
        );
        let response = preflight_response(origin, &decision, self.policy.max_age());
        async move { Ok(response) }.boxed()
    }
}

/// Wraps a real endpoint's handler and decorates its outcome with
/// `Access-Control-Allow-Origin` when the policy grants the endpoint's method.
///
/// The inner handler runs whatever the decision.
pub(crate) struct CorsHandler {
    inner: Arc<dyn Handler>,
    policy: Arc<dyn CorsPolicy>,
    route: RouteTemplate,
    method: Method,
    methods: Arc<RouteMethods>,
}

impl CorsHandler {
    pub(crate) fn new(
        inner: Arc<dyn Handler>,
        policy: Arc<dyn CorsPolicy>,
        route: RouteTemplate,
        method: Method,
        methods: Arc<RouteMethods>,
    ) -> Self {
        Self {
            inner,
            policy,
            route,
            method,
            methods,
        }
    }
}

impl Handler for CorsHandler {
    fn handle(&self, req: Request, ctx: RequestContext) -> HandlerFuture {
        let origin = req.get_header("Origin").map(str::to_owned);
        let decision = self
            .policy
            .evaluate(origin.as_deref(), &self.route, &self.methods);
        let granted = origin.filter(|_| decision.allows_method(&self.method));
        debug!(
            route = %self.route,
            method = %self.method,
            granted = granted.is_some(),
            "CORS actual request evaluated"
        );

        let inner = self.inner.handle(req, ctx);
        async move {
            match (inner.await, granted) {
                (Ok(mut response), Some(origin)) => {
                    allow_origin(&mut response.headers, &origin);
                    Ok(response)
                }
                (Err(HandlerError::Status(mut err)), Some(origin)) => {
                    allow_origin(err.headers_mut(), &origin);
                    Err(HandlerError::Status(err))
                }
                (outcome, _) => outcome,
            }
        }
        .boxed()
    }
}
