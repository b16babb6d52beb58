use http::Method;
use std::fmt;
use std::sync::Arc;

use crate::router::{RouteLookup, Router};

use super::endpoint::Endpoint;
use super::route::{RouteMethods, RouteTemplate};

/// Sibling endpoints sharing one method and route, in registration order.
///
/// Negotiation picks at most one of them per request.
#[derive(Debug, Clone)]
pub struct EndpointGroup {
    method: Method,
    route: RouteTemplate,
    endpoints: Vec<Arc<Endpoint>>,
}

impl EndpointGroup {
    pub(crate) fn new(method: Method, route: RouteTemplate) -> Self {
        Self {
            method,
            route,
            endpoints: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, endpoint: Arc<Endpoint>) {
        self.endpoints.push(endpoint);
    }

    /// Shared method
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Shared route
    #[must_use]
    pub fn route(&self) -> &RouteTemplate {
        &self.route
    }

    /// Members in registration order
    #[must_use]
    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }
}

/// The immutable result of [`EndpointRegistry::build`](super::EndpointRegistry::build):
/// every endpoint grouped and routed.
pub struct EndpointTable {
    router: Router<EndpointGroup>,
    route_methods: Arc<RouteMethods>,
    endpoint_count: usize,
}

impl EndpointTable {
    pub(crate) fn new(
        router: Router<EndpointGroup>,
        route_methods: Arc<RouteMethods>,
        endpoint_count: usize,
    ) -> Self {
        Self {
            router,
            route_methods,
            endpoint_count,
        }
    }

    /// Route a request to its endpoint group
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> RouteLookup<'_, EndpointGroup> {
        self.router.lookup(method, path)
    }

    /// Registered methods per route (synthesized preflights excluded)
    #[must_use]
    pub fn route_methods(&self) -> &RouteMethods {
        &self.route_methods
    }

    /// Number of endpoints, synthesized ones included
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.endpoint_count
    }

    /// Number of `(method, route)` groups
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.router.len()
    }
}

impl Default for EndpointTable {
    fn default() -> Self {
        Self::new(Router::new(), Arc::new(RouteMethods::new()), 0)
    }
}

impl fmt::Debug for EndpointTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointTable")
            .field("groups", &self.router.len())
            .field("endpoints", &self.endpoint_count)
            .field("route_methods", &self.route_methods)
            .finish()
    }
}
