use http::Method;
use std::fmt;
use std::sync::Arc;

use crate::handler::Handler;
use crate::media::MediaType;

use super::error::RegistryError;
use super::route::RouteTemplate;

/// One handler registered at a method and route, with the media types it consumes
/// and produces.
///
/// An empty consumable set means the endpoint takes no declared Content-Type; an
/// empty producible set leaves the response type unspecified.
#[derive(Clone)]
pub struct Endpoint {
    method: Method,
    route: RouteTemplate,
    consumes: Vec<MediaType>,
    produces: Vec<MediaType>,
    handler: Arc<dyn Handler>,
    name: Arc<str>,
    negotiated: bool,
}

impl Endpoint {
    /// Start building an endpoint for `method` at `route`
    #[must_use]
    pub fn builder(method: Method, route: &str) -> EndpointBuilder {
        EndpointBuilder {
            method,
            route: route.to_string(),
            consumes: Vec::new(),
            produces: Vec::new(),
            name: None,
        }
    }

    /// Endpoint that bypasses content negotiation (synthesized preflight)
    pub(crate) fn unnegotiated(
        method: Method,
        route: RouteTemplate,
        handler: Arc<dyn Handler>,
    ) -> Self {
        let name = Arc::from(format!("{method} {route} (preflight)"));
        Self {
            method,
            route,
            consumes: Vec::new(),
            produces: Vec::new(),
            handler,
            name,
            negotiated: false,
        }
    }

    /// Same endpoint with its handler replaced
    pub(crate) fn with_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = handler;
        self
    }

    /// HTTP method
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Route template
    #[must_use]
    pub fn route(&self) -> &RouteTemplate {
        &self.route
    }

    /// Media types accepted as request Content-Type
    #[must_use]
    pub fn consumes(&self) -> &[MediaType] {
        &self.consumes
    }

    /// Media types this endpoint can respond with
    #[must_use]
    pub fn produces(&self) -> &[MediaType] {
        &self.produces
    }

    /// The handler
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Diagnostic name used in logs and errors
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// `false` for endpoints that skip both negotiation filters
    #[must_use]
    pub fn is_negotiated(&self) -> bool {
        self.negotiated
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("route", &self.route.key())
            .field(
                "consumes",
                &self.consumes.iter().map(ToString::to_string).collect::<Vec<_>>(),
            )
            .field(
                "produces",
                &self.produces.iter().map(ToString::to_string).collect::<Vec<_>>(),
            )
            .field("negotiated", &self.negotiated)
            .finish()
    }
}

/// Builder returned by [`Endpoint::builder`]; parsing happens in [`EndpointBuilder::handler`]
#[derive(Debug, Clone)]
pub struct EndpointBuilder {
    method: Method,
    route: String,
    consumes: Vec<String>,
    produces: Vec<String>,
    name: Option<String>,
}

impl EndpointBuilder {
    /// Add a consumable media type such as `application/json`
    #[must_use]
    pub fn consumes(mut self, media_type: &str) -> Self {
        self.consumes.push(media_type.to_string());
        self
    }

    /// Add a producible media type
    #[must_use]
    pub fn produces(mut self, media_type: &str) -> Self {
        self.produces.push(media_type.to_string());
        self
    }

    /// Diagnostic name; defaults to `"<METHOD> <route>"`
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Attach the handler and finish.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Route`] for an invalid template and
    /// [`RegistryError::MediaType`] for an unparseable media type.
    pub fn handler<H: Handler>(self, handler: H) -> Result<Endpoint, RegistryError> {
        self.shared_handler(Arc::new(handler))
    }

    /// Like [`EndpointBuilder::handler`] for a handler already behind an `Arc`
    ///
    /// # Errors
    ///
    /// Same as [`EndpointBuilder::handler`].
    pub fn shared_handler(self, handler: Arc<dyn Handler>) -> Result<Endpoint, RegistryError> {
        let route = RouteTemplate::parse(&self.route)?;
        let name: Arc<str> = match self.name {
            Some(name) => Arc::from(name),
            None => Arc::from(format!("{} {route}", self.method)),
        };
        let parse_all = |types: &[String]| -> Result<Vec<MediaType>, RegistryError> {
            types
                .iter()
                .map(|t| {
                    MediaType::parse(t).map_err(|source| RegistryError::MediaType {
                        endpoint: name.to_string(),
                        source,
                    })
                })
                .collect()
        };
        let consumes = parse_all(&self.consumes)?;
        let produces = parse_all(&self.produces)?;

        Ok(Endpoint {
            method: self.method,
            route,
            consumes,
            produces,
            handler,
            name,
            negotiated: true,
        })
    }
}
