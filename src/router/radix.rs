//! Radix tree used by [`Router`](super::Router) for route matching.
//!
//! Each node represents one path segment. Static children match exactly; parameter
//! children match any single segment and record it under their name. Lookup cost is
//! proportional to the path length, not the number of routes.
//!
//! Static children are tried before parameter children, and the search backtracks,
//! so `/users/me` beats `/users/{id}` while `/users/{id}/posts` still matches when a
//! static sibling exists at the same depth.

use http::Method;
use std::borrow::Cow;
use std::sync::Arc;

use crate::registry::{RouteError, RouteTemplate, Segment};

use super::core::ParamVec;

/// Node in the radix tree
#[derive(Debug, Clone)]
pub(crate) struct RadixNode<T> {
    /// The static segment this node represents (empty for the root and parameters)
    segment: Cow<'static, str>,
    /// Payloads registered at this node, per method, in registration order
    routes: Vec<(Method, T)>,
    /// Parameter name if this node captures a segment
    param_name: Option<Arc<str>>,
    /// Static children
    children: Vec<RadixNode<T>>,
    /// Parameter children; different names at the same depth get separate nodes
    param_children: Vec<RadixNode<T>>,
}

/// Outcome of a tree search
pub(crate) enum Search<'a, T> {
    Found(&'a T),
    /// The path exists but not for this method; lists the methods it has
    WrongMethod(Vec<Method>),
    Missing,
}

impl<T> RadixNode<T> {
    pub(crate) fn root() -> Self {
        Self::new(Cow::Borrowed(""))
    }

    fn new(segment: Cow<'static, str>) -> Self {
        Self {
            segment,
            routes: Vec::new(),
            param_name: None,
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn new_param(name: Arc<str>) -> Self {
        Self {
            segment: Cow::Borrowed(""),
            routes: Vec::new(),
            param_name: Some(name),
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    /// Insert a payload at the node reached by `segments`
    pub(crate) fn insert(
        &mut self,
        segments: &[Segment],
        method: Method,
        payload: T,
        template: &RouteTemplate,
    ) -> Result<(), RouteError> {
        let Some((segment, remaining)) = segments.split_first() else {
            if self.routes.iter().any(|(m, _)| *m == method) {
                return Err(RouteError::DuplicateRoute {
                    method,
                    route: template.key(),
                });
            }
            self.routes.push((method, payload));
            return Ok(());
        };

        match segment {
            Segment::Param(name) => {
                let idx = match self
                    .param_children
                    .iter()
                    .position(|c| c.param_name.as_deref() == Some(name.as_ref()))
                {
                    Some(idx) => idx,
                    None => {
                        self.param_children
                            .push(RadixNode::new_param(Arc::clone(name)));
                        self.param_children.len() - 1
                    }
                };
                self.param_children[idx].insert(remaining, method, payload, template)
            }
            Segment::Static(text) => {
                let idx = match self.children.iter().position(|c| c.segment == *text) {
                    Some(idx) => idx,
                    None => {
                        self.children
                            .push(RadixNode::new(Cow::Owned(text.clone())));
                        self.children.len() - 1
                    }
                };
                self.children[idx].insert(remaining, method, payload, template)
            }
        }
    }

    /// Search for a payload matching `segments` and `method`.
    ///
    /// `fallback` remembers the first node whose path matched but whose methods did
    /// not, so the caller can report 405 instead of 404.
    fn search<'a>(
        &'a self,
        segments: &[&str],
        method: &Method,
        params: &mut ParamVec,
        fallback: &mut Option<&'a RadixNode<T>>,
    ) -> Option<&'a T> {
        let Some((segment, remaining)) = segments.split_first() else {
            if let Some((_, payload)) = self.routes.iter().find(|(m, _)| m == method) {
                return Some(payload);
            }
            if fallback.is_none() && !self.routes.is_empty() {
                *fallback = Some(self);
            }
            return None;
        };

        for child in &self.children {
            if child.segment == *segment {
                if let Some(found) = child.search(remaining, method, params, fallback) {
                    return Some(found);
                }
            }
        }

        for param_child in &self.param_children {
            if let Some(name) = &param_child.param_name {
                params.push((Arc::clone(name), decode_segment(segment)));
                if let Some(found) = param_child.search(remaining, method, params, fallback) {
                    return Some(found);
                }
                // Backtrack
                params.pop();
            }
        }

        None
    }

    pub(crate) fn lookup<'a>(
        &'a self,
        segments: &[&str],
        method: &Method,
        params: &mut ParamVec,
    ) -> Search<'a, T> {
        let mut fallback = None;
        match self.search(segments, method, params, &mut fallback) {
            Some(payload) => Search::Found(payload),
            None => match fallback {
                Some(node) => {
                    Search::WrongMethod(node.routes.iter().map(|(m, _)| m.clone()).collect())
                }
                None => Search::Missing,
            },
        }
    }
}

fn decode_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => segment.to_string(),
    }
}
