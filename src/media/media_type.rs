use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wildcard token accepted for either the type or the subtype
pub const WILDCARD: &str = "*";

/// Charset assumed when a media type carries no `charset` parameter
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Known charset names and the canonical spelling each one normalizes to.
const CHARSET_ALIASES: &[(&str, &str)] = &[
    ("utf-8", "utf-8"),
    ("utf8", "utf-8"),
    ("us-ascii", "us-ascii"),
    ("ascii", "us-ascii"),
    ("iso-8859-1", "iso-8859-1"),
    ("iso_8859-1", "iso-8859-1"),
    ("latin1", "iso-8859-1"),
    ("iso-8859-15", "iso-8859-15"),
    ("windows-1252", "windows-1252"),
    ("cp1252", "windows-1252"),
    ("utf-16", "utf-16"),
    ("utf-16be", "utf-16be"),
    ("utf-16le", "utf-16le"),
    ("utf-32", "utf-32"),
];

/// Whether the charset parameter takes part in media type matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharsetMatching {
    /// Charsets must be identical for two media types to match
    #[default]
    Strict,
    /// Charsets are informational only and never prevent a match
    Ignore,
}

impl CharsetMatching {
    /// Parse from a configuration string (`strict` or `ignore`)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "ignore" => Some(Self::Ignore),
            _ => None,
        }
    }
}

/// Error raised while parsing a media type or an `Accept` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaTypeError {
    /// The `type/subtype` part is missing, empty or has extra `/` separators
    Malformed {
        /// The offending input
        input: String,
    },
    /// A parameter is not a single `key=value` pair
    MalformedParameter {
        /// The offending input
        input: String,
        /// The parameter element that failed to parse
        parameter: String,
    },
    /// The charset parameter names an unknown charset
    UnsupportedCharset {
        /// The charset as written by the client
        charset: String,
    },
    /// A quality value is outside `[0, 1]` or has more than three decimals
    MalformedQuality {
        /// The offending input
        input: String,
        /// The raw `q` value
        value: String,
    },
}

impl fmt::Display for MediaTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaTypeError::Malformed { input } => {
                write!(f, "malformed media type '{input}': expected type/subtype")
            }
            MediaTypeError::MalformedParameter { input, parameter } => {
                write!(
                    f,
                    "malformed media type '{input}': parameter '{parameter}' is not a key=value pair"
                )
            }
            MediaTypeError::UnsupportedCharset { charset } => {
                write!(f, "unsupported charset '{charset}'")
            }
            MediaTypeError::MalformedQuality { input, value } => {
                write!(
                    f,
                    "malformed quality value '{value}' in '{input}': expected 0..1 with at most 3 decimals"
                )
            }
        }
    }
}

impl std::error::Error for MediaTypeError {}

/// A normalized media type: lowercase type, subtype and charset.
///
/// Equality compares the full triple. Use [`MediaType::is_match`] for wildcard-aware
/// comparison during negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    type_: String,
    subtype: String,
    charset: String,
}

impl MediaType {
    /// Create a media type with the default charset
    #[must_use]
    pub fn new(type_: &str, subtype: &str) -> Self {
        Self {
            type_: type_.trim().to_ascii_lowercase(),
            subtype: subtype.trim().to_ascii_lowercase(),
            charset: DEFAULT_CHARSET.to_string(),
        }
    }

    /// The full wildcard `*/*`
    #[must_use]
    pub fn any() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    /// Replace the charset, normalizing known aliases
    ///
    /// # Errors
    ///
    /// Returns [`MediaTypeError::UnsupportedCharset`] for unknown charset names.
    pub fn with_charset(mut self, charset: &str) -> Result<Self, MediaTypeError> {
        self.charset = canonical_charset(charset)?;
        Ok(self)
    }

    /// Parse a media type such as `application/json; charset=UTF-8`.
    ///
    /// Parameters other than `charset` are accepted and discarded.
    ///
    /// # Errors
    ///
    /// Fails when the input is not `type/subtype`, when a parameter is not exactly
    /// one `key=value` pair, or when the charset is unknown.
    pub fn parse(input: &str) -> Result<Self, MediaTypeError> {
        Self::parse_with_params(input).map(|(media_type, _)| media_type)
    }

    /// Parse and also return every parameter except `charset`, in header order.
    pub(crate) fn parse_with_params(
        input: &str,
    ) -> Result<(Self, Vec<(String, String)>), MediaTypeError> {
        let normalized = input.trim().to_ascii_lowercase();
        let mut elements = normalized.split(';');
        let essence = elements.next().unwrap_or_default().trim();

        let mut parts = essence.split('/');
        let (type_, subtype) = match (parts.next(), parts.next(), parts.next()) {
            (Some(t), Some(s), None) if !t.trim().is_empty() && !s.trim().is_empty() => {
                (t.trim(), s.trim())
            }
            _ => {
                return Err(MediaTypeError::Malformed {
                    input: input.to_string(),
                })
            }
        };

        let mut charset = DEFAULT_CHARSET.to_string();
        let mut params = Vec::new();
        for element in elements {
            let element = element.trim();
            if element.is_empty() {
                continue;
            }
            let mut kv = element.split('=');
            let (key, value) = match (kv.next(), kv.next(), kv.next()) {
                (Some(k), Some(v), None) if !k.trim().is_empty() => (k.trim(), unquote(v.trim())),
                _ => {
                    return Err(MediaTypeError::MalformedParameter {
                        input: input.to_string(),
                        parameter: element.to_string(),
                    })
                }
            };
            if key == "charset" {
                charset = canonical_charset(value)?;
            } else {
                params.push((key.to_string(), value.to_string()));
            }
        }

        Ok((
            Self {
                type_: type_.to_string(),
                subtype: subtype.to_string(),
                charset,
            },
            params,
        ))
    }

    /// The primary type, e.g. `application`
    #[must_use]
    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// The subtype, e.g. `json`
    #[must_use]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// The canonical charset name
    #[must_use]
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// `true` for `*/*`
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.type_ == WILDCARD && self.subtype == WILDCARD
    }

    /// Wildcard-aware match.
    ///
    /// Type matches if equal or either side is `*`, subtype likewise. Charsets must be
    /// equal under [`CharsetMatching::Strict`] and are ignored otherwise.
    #[must_use]
    pub fn is_match(&self, other: &MediaType, charset: CharsetMatching) -> bool {
        token_matches(&self.type_, &other.type_)
            && token_matches(&self.subtype, &other.subtype)
            && (charset == CharsetMatching::Ignore || self.charset == other.charset)
    }
}

/// Match an optional media type against a set.
///
/// An absent media type matches a set that is empty or contains `*/*`. A present one
/// matches when any member of the set matches it.
#[must_use]
pub fn matches_any(
    media_type: Option<&MediaType>,
    set: &[MediaType],
    charset: CharsetMatching,
) -> bool {
    match media_type {
        None => set.is_empty() || set.iter().any(MediaType::is_wildcard),
        Some(mt) => set.iter().any(|candidate| candidate.is_match(mt, charset)),
    }
}

fn token_matches(a: &str, b: &str) -> bool {
    a == b || a == WILDCARD || b == WILDCARD
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn canonical_charset(name: &str) -> Result<String, MediaTypeError> {
    let lowered = unquote(name.trim()).to_ascii_lowercase();
    CHARSET_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| (*canonical).to_string())
        .ok_or(MediaTypeError::UnsupportedCharset {
            charset: name.to_string(),
        })
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{};charset={}", self.type_, self.subtype, self.charset)
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mt(s: &str) -> MediaType {
        MediaType::parse(s).unwrap()
    }

    #[test]
    fn test_parse_defaults_charset() {
        let json = mt("application/json");
        assert_eq!(json.type_(), "application");
        assert_eq!(json.subtype(), "json");
        assert_eq!(json.charset(), "utf-8");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            mt("APPLICATION/JSON;CHARSET=UTF-8"),
            mt("application/json;charset=utf-8")
        );
        assert_eq!(mt("  Text/Plain ; charset=\"utf8\" "), mt("text/plain"));
    }

    #[test]
    fn test_round_trip_through_display() {
        for input in [
            "text/plain",
            "application/vnd.api+json;charset=iso-8859-1",
            "*/*",
            "image/*;charset=us-ascii",
        ] {
            let parsed = mt(input);
            assert_eq!(mt(&parsed.to_string()), parsed, "{input}");
        }
    }

    #[test]
    fn test_parse_rejects_malformed_essence() {
        for input in ["", "text", "text/", "/plain", "text/plain/extra", " ; charset=utf-8"] {
            assert!(
                matches!(MediaType::parse(input), Err(MediaTypeError::Malformed { .. })),
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_malformed_parameters() {
        for input in ["text/plain; charset", "text/plain; a=b=c", "text/plain; =x"] {
            assert!(
                matches!(
                    MediaType::parse(input),
                    Err(MediaTypeError::MalformedParameter { .. })
                ),
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_unknown_charset() {
        assert_eq!(
            MediaType::parse("text/plain; charset=klingon"),
            Err(MediaTypeError::UnsupportedCharset {
                charset: "klingon".to_string()
            })
        );
    }

    #[test]
    fn test_extra_parameters_are_ignored() {
        let (parsed, params) = MediaType::parse_with_params("text/html; level=1; q=0.5").unwrap();
        assert_eq!(parsed, mt("text/html"));
        assert_eq!(
            params,
            vec![
                ("level".to_string(), "1".to_string()),
                ("q".to_string(), "0.5".to_string())
            ]
        );
    }

    #[test]
    fn test_wildcard_matching() {
        let plain = mt("text/plain");
        assert!(matches_any(Some(&plain), &[mt("*/*")], CharsetMatching::Strict));
        assert!(matches_any(Some(&plain), &[mt("text/*")], CharsetMatching::Strict));
        assert!(!matches_any(
            Some(&plain),
            &[mt("application/*")],
            CharsetMatching::Strict
        ));
    }

    #[test]
    fn test_absent_type_matches_empty_or_wildcard_set() {
        assert!(matches_any(None, &[], CharsetMatching::Strict));
        assert!(matches_any(None, &[mt("*/*")], CharsetMatching::Strict));
        assert!(!matches_any(None, &[mt("text/plain")], CharsetMatching::Strict));
    }

    #[test]
    fn test_charset_policy() {
        let utf8 = mt("text/plain");
        let latin = mt("text/plain; charset=latin1");
        assert!(!utf8.is_match(&latin, CharsetMatching::Strict));
        assert!(utf8.is_match(&latin, CharsetMatching::Ignore));
    }

    #[test]
    fn test_charset_matching_parse() {
        assert_eq!(CharsetMatching::parse("STRICT"), Some(CharsetMatching::Strict));
        assert_eq!(CharsetMatching::parse("ignore"), Some(CharsetMatching::Ignore));
        assert_eq!(CharsetMatching::parse("sometimes"), None);
    }
}
