use std::fmt;

/// Query string multimap.
///
/// Keys keep first-seen order; repeated keys accumulate their values in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    /// Empty query
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value for `key`
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Last value for `key` ("last write wins", matching `?limit=10&limit=20` → `20`)
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).last().map(String::as_str)
    }

    /// Every value for `key`, in order
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map_or(&[], |(_, values)| values.as_slice())
    }

    /// Iterate keys with their values
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    /// Number of distinct keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no key is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Error raised while parsing a raw query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParseError {
    /// An item has no `=` separator
    MissingEquals {
        /// The offending item
        item: String,
    },
    /// An item does not percent-decode to valid UTF-8
    InvalidEncoding {
        /// The offending item
        item: String,
    },
}

impl fmt::Display for QueryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryParseError::MissingEquals { item } => {
                write!(f, "query item '{item}' is not a key=value pair")
            }
            QueryParseError::InvalidEncoding { item } => {
                write!(f, "query item '{item}' is not valid percent-encoded UTF-8")
            }
        }
    }
}

impl std::error::Error for QueryParseError {}

/// Parse a raw query string such as `a=1&b=2&a=3`.
///
/// A leading `?` is ignored, empty items are skipped and each item is split on its
/// first `=`. Keys and values are percent-decoded with `+` read as a space.
///
/// # Errors
///
/// [`QueryParseError::MissingEquals`] for an item without `=` and
/// [`QueryParseError::InvalidEncoding`] when decoding yields invalid UTF-8.
pub fn parse_query(raw: &str) -> Result<QueryParams, QueryParseError> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let mut params = QueryParams::new();
    for item in raw.split('&').filter(|item| !item.is_empty()) {
        let Some((key, value)) = item.split_once('=') else {
            return Err(QueryParseError::MissingEquals {
                item: item.to_string(),
            });
        };
        params.append(decode(key, item)?, decode(value, item)?);
    }
    Ok(params)
}

fn decode(component: &str, item: &str) -> Result<String, QueryParseError> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| QueryParseError::InvalidEncoding {
            item: item.to_string(),
        })
}
