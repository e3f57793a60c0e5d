//! Cookie header construction.

use std::collections::{BTreeMap, HashMap};

use crate::Headers;

/// Name of the header carrying cookies.
pub const COOKIE: &str = "Cookie";

/// Cookies to send with a single request.
///
/// This is a plain ordered collection, not a jar: nothing here is shared
/// between requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cookies {
    pairs: Vec<(String, String)>,
}

impl Cookies {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cookie.
    #[must_use]
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Add a cookie in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Returns `true` if there are no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over `(name, value)` pairs as added.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Cookies {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for Cookies {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>, S> From<HashMap<K, V, S>> for Cookies {
    fn from(map: HashMap<K, V, S>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> From<BTreeMap<K, V>> for Cookies {
    fn from(map: BTreeMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

/// Build the `Cookie` header value.
///
/// Pairs are joined with `; `. A repeated name keeps its first position and
/// its last value. Returns `None` when there are no cookies.
#[must_use]
pub fn cookie_header(cookies: &Cookies) -> Option<String> {
    let mut merged: Vec<(&str, &str)> = Vec::new();
    for (name, value) in cookies.iter() {
        match merged.iter_mut().find(|(seen, _)| *seen == name) {
            Some(entry) => entry.1 = value,
            None => merged.push((name, value)),
        }
    }

    if merged.is_empty() {
        return None;
    }

    let header = merged
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ");
    Some(header)
}

/// Add the `Cookie` header built from `cookies`.
///
/// Does nothing when there are no cookies, or when a `Cookie` header is
/// already present. Returns `true` if the header was added.
pub fn inject(headers: &mut Headers, cookies: &Cookies) -> bool {
    if headers.contains(COOKIE) {
        return false;
    }
    match cookie_header(cookies) {
        Some(value) => headers.insert_default(COOKIE, value),
        None => false,
    }
}
