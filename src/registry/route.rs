use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A single `{name}` parameter token occupying a whole segment
static PARAM_SEGMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{([A-Za-z_][A-Za-z0-9_.\-]*)\}$").expect("route parameter regex should be valid")
});

/// One segment of a route template
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Matches exactly this text
    Static(String),
    /// Matches any single non-empty segment and captures it under this name
    Param(Arc<str>),
}

/// A parsed route template such as `/pets/{id}/photos`.
///
/// Each segment is either static text or exactly one named parameter. Empty segments
/// (from doubled or trailing slashes) are dropped, so `/pets/` and `/pets` are the
/// same route.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RouteTemplate {
    segments: Vec<Segment>,
}

impl RouteTemplate {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// - [`RouteError::MissingLeadingSlash`] if the template does not start with `/`
    /// - [`RouteError::MultipleParameters`] if a segment holds more than one `{..}` token
    /// - [`RouteError::InvalidSegment`] for stray braces or a bad parameter name
    /// - [`RouteError::DuplicateParameter`] if a name is used twice
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        if !template.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash {
                template: template.to_string(),
            });
        }

        let mut segments = Vec::new();
        for raw in template.split('/').filter(|s| !s.is_empty()) {
            if !raw.contains(['{', '}']) {
                segments.push(Segment::Static(raw.to_string()));
                continue;
            }
            if raw.matches('{').count() > 1 {
                return Err(RouteError::MultipleParameters {
                    template: template.to_string(),
                    segment: raw.to_string(),
                });
            }
            let Some(captures) = PARAM_SEGMENT_REGEX.captures(raw) else {
                return Err(RouteError::InvalidSegment {
                    template: template.to_string(),
                    segment: raw.to_string(),
                });
            };
            let name = &captures[1];
            if segments
                .iter()
                .any(|s| matches!(s, Segment::Param(existing) if existing.as_ref() == name))
            {
                return Err(RouteError::DuplicateParameter {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }
            segments.push(Segment::Param(Arc::from(name)));
        }

        Ok(Self { segments })
    }

    /// Segments in path order
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Parameter names in path order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_ref()),
            Segment::Static(_) => None,
        })
    }

    /// Canonical text form, used as the route identity
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            match segment {
                Segment::Static(text) => write!(f, "/{text}")?,
                Segment::Param(name) => write!(f, "/{{{name}}}")?,
            }
        }
        Ok(())
    }
}

/// Error raised while parsing templates or registering routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The template does not begin with `/`
    MissingLeadingSlash {
        /// The offending template
        template: String,
    },
    /// A segment contains stray braces or an invalid parameter name
    InvalidSegment {
        /// The offending template
        template: String,
        /// The offending segment
        segment: String,
    },
    /// A segment contains more than one parameter token
    MultipleParameters {
        /// The offending template
        template: String,
        /// The offending segment
        segment: String,
    },
    /// A parameter name appears twice in one template
    DuplicateParameter {
        /// The offending template
        template: String,
        /// The repeated name
        name: String,
    },
    /// The same method was registered twice for one route
    DuplicateRoute {
        /// The method
        method: Method,
        /// The route key
        route: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::MissingLeadingSlash { template } => {
                write!(f, "route template '{template}' must start with '/'")
            }
            RouteError::InvalidSegment { template, segment } => {
                write!(f, "route template '{template}' has invalid segment '{segment}'")
            }
            RouteError::MultipleParameters { template, segment } => write!(
                f,
                "route template '{template}': segment '{segment}' holds more than one parameter"
            ),
            RouteError::DuplicateParameter { template, name } => {
                write!(f, "route template '{template}' repeats parameter '{name}'")
            }
            RouteError::DuplicateRoute { method, route } => {
                write!(f, "route {method} {route} is already registered")
            }
        }
    }
}

impl std::error::Error for RouteError {}

/// Registered methods per route, as known once the registry is built.
///
/// This is what CORS policies consult to decide which methods a route allows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMethods {
    by_route: BTreeMap<RouteTemplate, Vec<Method>>,
}

impl RouteMethods {
    /// Empty introspector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `method` for `route`; repeated methods are kept once, first-seen order
    pub fn add(&mut self, route: &RouteTemplate, method: &Method) {
        let methods = self.by_route.entry(route.clone()).or_default();
        if !methods.contains(method) {
            methods.push(method.clone());
        }
    }

    /// Methods registered at `route`, empty if the route is unknown
    #[must_use]
    pub fn get(&self, route: &RouteTemplate) -> &[Method] {
        self.by_route.get(route).map_or(&[], Vec::as_slice)
    }

    /// `true` if `method` is registered at `route`
    #[must_use]
    pub fn contains(&self, route: &RouteTemplate, method: &Method) -> bool {
        self.get(route).contains(method)
    }

    /// Iterate routes with their methods
    pub fn iter(&self) -> impl Iterator<Item = (&RouteTemplate, &[Method])> {
        self.by_route
            .iter()
            .map(|(route, methods)| (route, methods.as_slice()))
    }
}
