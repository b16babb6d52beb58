use std::sync::Arc;
use tracing::debug;

use crate::media::{matches_any, sort_by_preference, CharsetMatching, MediaType, QualifiedMediaType};
use crate::registry::Endpoint;

use super::error::NegotiationError;

/// Does `endpoint` produce something matching `acceptable`?
///
/// An endpoint with no declared producible type only satisfies a full `*/*`.
fn produces_match(endpoint: &Endpoint, acceptable: &MediaType, charset: CharsetMatching) -> bool {
    if endpoint.produces().is_empty() {
        return acceptable.is_wildcard();
    }
    endpoint
        .produces()
        .iter()
        .any(|produced| produced.is_match(acceptable, charset))
}

/// Pick the endpoint that serves a request.
///
/// 1. Keep endpoints whose consumable set matches `content_type`; none left is
///    [`NegotiationError::UnsupportedMediaType`].
/// 2. Walk `accept` by descending quality (stable, `q=0` dropped); the first
///    surviving endpoint, in registration order, that produces a match wins. An empty
///    `accept` counts as a single `*/*`. No winner is
///    [`NegotiationError::NotAcceptable`].
///
/// Endpoints that are not negotiated (synthesized preflights) win immediately.
///
/// # Errors
///
/// See above.
pub fn negotiate<'a>(
    endpoints: &'a [Arc<Endpoint>],
    content_type: Option<&MediaType>,
    accept: &[QualifiedMediaType],
    charset: CharsetMatching,
) -> Result<&'a Arc<Endpoint>, NegotiationError> {
    if let Some(passthrough) = endpoints.iter().find(|e| !e.is_negotiated()) {
        return Ok(passthrough);
    }

    let consumers: Vec<&Arc<Endpoint>> = endpoints
        .iter()
        .filter(|e| matches_any(content_type, e.consumes(), charset))
        .collect();
    if consumers.is_empty() {
        debug!(content_type = ?content_type.map(ToString::to_string), "No endpoint consumes request");
        return Err(NegotiationError::UnsupportedMediaType {
            content_type: content_type.cloned(),
        });
    }

    let preferred = sort_by_preference(accept.to_vec());
    let acceptable: Vec<MediaType> = if accept.is_empty() {
        vec![MediaType::any()]
    } else {
        preferred
            .into_iter()
            .map(|q| q.media_type().clone())
            .collect()
    };

    for wanted in &acceptable {
        if let Some(winner) = consumers
            .iter()
            .copied()
            .find(|e| produces_match(e, wanted, charset))
        {
            debug!(endpoint = %winner.name(), acceptable = %wanted, "Negotiated endpoint");
            return Ok(winner);
        }
    }

    debug!(candidates = consumers.len(), "No endpoint produces an acceptable type");
    Err(NegotiationError::NotAcceptable)
}
