use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers before heap allocation.
/// Most requests and responses carry 16 headers or fewer.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path.
///
/// Names use `Arc<str>` because the same names (`Content-Type`, `Origin`, CORS
/// headers) repeat on every request and cloning them is a reference-count bump.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Ordered header multimap.
///
/// Lookup is ASCII case-insensitive; names keep the casing they were inserted with
/// so the transport emits them verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: HeaderVec,
}

impl Headers {
    /// Empty header set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `name`
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in insertion order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `true` if at least one value exists for `name`
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Set `name` to a single value, replacing any existing values
    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.entries.push((name, value.into()));
    }

    /// Add a value for `name`, keeping existing ones
    pub fn append(&mut self, name: impl Into<Arc<str>>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Remove every value for `name`, returning how many were removed
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        before - self.entries.len()
    }

    /// Iterate `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// Number of `(name, value)` pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no header is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<Arc<str>>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        headers.extend(iter);
        headers
    }
}

impl<N, V> Extend<(N, V)> for Headers
where
    N: Into<Arc<str>>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (N, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.append(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive_and_preserves_casing() {
        let mut headers = Headers::new();
        headers.append("Content-Type", "application/json");
        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert_eq!(headers.iter().next(), Some(("Content-Type", "application/json")));
    }

    #[test]
    fn test_insert_replaces_and_append_accumulates() {
        let mut headers: Headers = [("Vary", "Accept"), ("vary", "Origin")]
            .into_iter()
            .collect();
        assert_eq!(headers.get_all("VARY").collect::<Vec<_>>(), vec!["Accept", "Origin"]);

        headers.insert("Vary", "Origin");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("vary"), Some("Origin"));
        assert_eq!(headers.remove("VARY"), 1);
        assert!(headers.is_empty());
    }
}
