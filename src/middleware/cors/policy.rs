use http::Method;

use crate::registry::{RouteMethods, RouteTemplate};

/// Headers granted by a policy built without an explicit header list
pub const DEFAULT_ALLOWED_HEADERS: &[&str] = &["Content-Type", "Authorization"];

/// What a CORS policy grants one origin at one route.
///
/// A decision with no methods and no headers is the forbidden decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessDecision {
    allowed_methods: Vec<Method>,
    allowed_headers: Vec<String>,
}

impl AccessDecision {
    /// Grant these methods and headers
    #[must_use]
    pub fn new(allowed_methods: Vec<Method>, allowed_headers: Vec<String>) -> Self {
        Self {
            allowed_methods,
            allowed_headers,
        }
    }

    /// Grant nothing
    #[must_use]
    pub fn forbidden() -> Self {
        Self::default()
    }

    /// `true` when nothing is granted
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.allowed_methods.is_empty() && self.allowed_headers.is_empty()
    }

    /// `true` if `method` is granted
    #[must_use]
    pub fn allows_method(&self, method: &Method) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Granted methods
    #[must_use]
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed_methods
    }

    /// Granted request headers
    #[must_use]
    pub fn allowed_headers(&self) -> &[String] {
        &self.allowed_headers
    }
}

/// Pluggable cross-origin authorization.
///
/// `evaluate` is called for every preflight and every actual request with the
/// request's `Origin` (if any), the matched route and the methods registered per
/// route. Closures with the same signature are policies too.
pub trait CorsPolicy: Send + Sync + 'static {
    /// Decide what `origin` may do at `route`
    fn evaluate(
        &self,
        origin: Option<&str>,
        route: &RouteTemplate,
        methods: &RouteMethods,
    ) -> AccessDecision;

    /// Seconds a browser may cache a preflight answer
    fn max_age(&self) -> Option<u32> {
        None
    }
}

impl<F> CorsPolicy for F
where
    F: Fn(Option<&str>, &RouteTemplate, &RouteMethods) -> AccessDecision + Send + Sync + 'static,
{
    fn evaluate(
        &self,
        origin: Option<&str>,
        route: &RouteTemplate,
        methods: &RouteMethods,
    ) -> AccessDecision {
        self(origin, route, methods)
    }
}

fn grant(route: &RouteTemplate, methods: &RouteMethods, headers: &[String]) -> AccessDecision {
    let registered = methods.get(route);
    if registered.is_empty() {
        return AccessDecision::forbidden();
    }
    AccessDecision::new(registered.to_vec(), headers.to_vec())
}

/// Grants every registered method to any origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPolicy {
    allowed_headers: Vec<String>,
    max_age: Option<u32>,
}

impl PublicPolicy {
    /// Public policy granting `allowed_headers`
    #[must_use]
    pub fn new(allowed_headers: Vec<String>, max_age: Option<u32>) -> Self {
        Self {
            allowed_headers,
            max_age,
        }
    }
}

impl Default for PublicPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_ALLOWED_HEADERS.iter().map(|h| h.to_string()).collect(),
            None,
        )
    }
}

impl CorsPolicy for PublicPolicy {
    fn evaluate(
        &self,
        _origin: Option<&str>,
        route: &RouteTemplate,
        methods: &RouteMethods,
    ) -> AccessDecision {
        grant(route, methods, &self.allowed_headers)
    }

    fn max_age(&self) -> Option<u32> {
        self.max_age
    }
}

/// Grants every registered method, but only to whitelisted origins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivatePolicy {
    origins: Vec<String>,
    allowed_headers: Vec<String>,
    max_age: Option<u32>,
}

impl PrivatePolicy {
    /// Private policy for `origins` (compared ASCII case-insensitively)
    #[must_use]
    pub fn new(origins: Vec<String>, allowed_headers: Vec<String>, max_age: Option<u32>) -> Self {
        Self {
            origins,
            allowed_headers,
            max_age,
        }
    }

    /// `true` if `origin` is on the whitelist
    #[must_use]
    pub fn is_whitelisted(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o.eq_ignore_ascii_case(origin))
    }
}

impl CorsPolicy for PrivatePolicy {
    fn evaluate(
        &self,
        origin: Option<&str>,
        route: &RouteTemplate,
        methods: &RouteMethods,
    ) -> AccessDecision {
        match origin {
            Some(origin) if self.is_whitelisted(origin) => {
                grant(route, methods, &self.allowed_headers)
            }
            _ => AccessDecision::forbidden(),
        }
    }

    fn max_age(&self) -> Option<u32> {
        self.max_age
    }
}
