use http::Method;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::middleware::cors::{CorsHandler, CorsPolicy, PreflightHandler};
use crate::router::Router;

use super::endpoint::Endpoint;
use super::error::RegistryError;
use super::group::{EndpointGroup, EndpointTable};
use super::route::{RouteMethods, RouteTemplate};

/// Collects endpoints and an optional CORS policy, then builds the immutable
/// [`EndpointTable`].
///
/// Building is a pure transformation: the complete endpoint set (CORS wrappers and
/// synthesized preflights included) is produced first and the router is constructed
/// from it once.
#[derive(Default)]
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
    cors: Option<Arc<dyn CorsPolicy>>,
}

impl EndpointRegistry {
    /// Empty registry without CORS
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an endpoint (builder style)
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.register(endpoint);
        self
    }

    /// Add an endpoint
    pub fn register(&mut self, endpoint: Endpoint) {
        self.endpoints.push(endpoint);
    }

    /// Enforce `policy` on every endpoint and synthesize preflight endpoints
    #[must_use]
    pub fn with_cors(mut self, policy: Arc<dyn CorsPolicy>) -> Self {
        self.cors = Some(policy);
        self
    }

    /// Number of endpoints registered so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// `true` if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Build the endpoint table.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Route`] if the router rejects a registration.
    pub fn build(self) -> Result<EndpointTable, RegistryError> {
        let EndpointRegistry { endpoints, cors } = self;

        let mut route_methods = RouteMethods::new();
        for endpoint in &endpoints {
            route_methods.add(endpoint.route(), endpoint.method());
        }
        let route_methods = Arc::new(route_methods);

        let endpoints = match &cors {
            Some(policy) => apply_cors(endpoints, policy, &route_methods),
            None => endpoints,
        };

        let groups = group_endpoints(endpoints);
        let endpoint_count = groups.iter().map(|g| g.endpoints().len()).sum();

        let mut router = Router::new();
        for group in groups {
            let method = group.method().clone();
            let route = group.route().clone();
            router.insert(method, &route, group)?;
        }

        info!(
            endpoints = endpoint_count,
            groups = router.len(),
            cors = cors.is_some(),
            "Endpoint table built"
        );
        Ok(EndpointTable::new(router, route_methods, endpoint_count))
    }
}

/// Wrap every endpoint and append a preflight endpoint per route lacking OPTIONS
fn apply_cors(
    endpoints: Vec<Endpoint>,
    policy: &Arc<dyn CorsPolicy>,
    route_methods: &Arc<RouteMethods>,
) -> Vec<Endpoint> {
    let mut routes: Vec<RouteTemplate> = Vec::new();
    let mut out: Vec<Endpoint> = endpoints
        .into_iter()
        .map(|endpoint| {
            if !routes.contains(endpoint.route()) {
                routes.push(endpoint.route().clone());
            }
            let wrapped = CorsHandler::new(
                Arc::clone(endpoint.handler()),
                Arc::clone(policy),
                endpoint.route().clone(),
                endpoint.method().clone(),
                Arc::clone(route_methods),
            );
            endpoint.with_handler(Arc::new(wrapped))
        })
        .collect();

    for route in routes {
        if route_methods.contains(&route, &Method::OPTIONS) {
            debug!(route = %route, "OPTIONS registered explicitly, preflight not synthesized");
            continue;
        }
        debug!(route = %route, "Synthesizing CORS preflight endpoint");
        let handler = PreflightHandler::new(Arc::clone(policy), route.clone(), Arc::clone(route_methods));
        out.push(Endpoint::unnegotiated(
            Method::OPTIONS,
            route,
            Arc::new(handler),
        ));
    }
    out
}

/// Group by `(method, route)`, keeping first-registration order for groups and members
fn group_endpoints(endpoints: Vec<Endpoint>) -> Vec<EndpointGroup> {
    let mut groups: Vec<EndpointGroup> = Vec::new();
    for endpoint in endpoints {
        let endpoint = Arc::new(endpoint);
        match groups
            .iter_mut()
            .find(|g| g.method() == endpoint.method() && g.route() == endpoint.route())
        {
            Some(group) => group.push(endpoint),
            None => {
                let mut group =
                    EndpointGroup::new(endpoint.method().clone(), endpoint.route().clone());
                group.push(endpoint);
                groups.push(group);
            }
        }
    }
    groups
}

impl fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointRegistry")
            .field("endpoints", &self.endpoints)
            .field("cors", &self.cors.is_some())
            .finish()
    }
}
