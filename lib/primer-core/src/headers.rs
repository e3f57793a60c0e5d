//! Header sets and header merging.
//!
//! [`Headers`] is an ordered header set whose names compare
//! case-insensitively but keep the casing they were first inserted with.
//! [`HeaderSpec`] is what callers write: the same thing, except a value can be
//! `None` to say "do not send this header".

use std::fmt;

use crate::{Error, Result};

// ============================================================================
// Headers
// ============================================================================

/// An ordered, case-insensitive, case-preserving header set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// Get a header value by name, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|index| self.entries.get(index))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if the header is present, ignoring case.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Set a header, replacing any previous value.
    ///
    /// A replaced header keeps its original casing and position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name).and_then(|index| self.entries.get_mut(index)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Set a header only if it is not already present.
    ///
    /// Returns `true` if the header was inserted.
    pub fn insert_default(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, value.into()));
        true
    }

    /// Remove a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name)
            .map(|index| self.entries.remove(index).1)
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every name and value, including those added after the caller's.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] for the first entry that is not valid.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in &self.entries {
            validate(name, value)?;
        }
        Ok(())
    }

    /// Convert into an `http::HeaderMap`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if a name or value is not valid.
    pub fn to_header_map(&self) -> Result<http::HeaderMap> {
        let mut map = http::HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let (name, value) = validate(name, value)?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Caller headers
// ============================================================================

/// Headers as supplied by the caller.
///
/// A `None` value suppresses the header: it is removed from the final set and
/// blocks any derived default of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderSpec {
    entries: Vec<(String, Option<String>)>,
}

impl HeaderSpec {
    /// Create empty caller headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header. Later values replace earlier ones, ignoring case.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.put(name.into(), Some(value.into()));
    }

    /// Mark a header as "do not send".
    pub fn suppress(&mut self, name: impl Into<String>) {
        self.put(name.into(), None);
    }

    fn put(&mut self, name: String, value: Option<String>) {
        match self
            .entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Returns `true` if the caller set or suppressed this header.
    #[must_use]
    pub fn mentions(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// Returns `true` if the caller suppressed this header.
    #[must_use]
    pub fn is_suppressed(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|(key, value)| key.eq_ignore_ascii_case(name) && value.is_none())
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs, including suppressed ones.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, Option<V>)> for HeaderSpec {
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut spec = Self::new();
        for (name, value) in iter {
            spec.put(name.into(), value.map(Into::into));
        }
        spec
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for HeaderSpec {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs
            .into_iter()
            .map(|(name, value)| (name, Some(value)))
            .collect()
    }
}

// ============================================================================
// Merging
// ============================================================================

/// Build the header set for a request from the caller's headers.
///
/// Suppressed entries are left out. Names and values are validated.
///
/// # Errors
///
/// Returns [`Error::InvalidHeader`] if a name or value is not valid.
pub fn caller_headers(caller: &HeaderSpec) -> Result<Headers> {
    let mut headers = Headers::new();
    for (name, value) in caller.iter() {
        if let Some(value) = value {
            validate(name, value)?;
            headers.insert(name, value);
        }
    }
    Ok(headers)
}

/// Add derived defaults to `headers`.
///
/// A default only fills a name the caller neither set nor suppressed.
pub fn apply_defaults<'a>(
    headers: &mut Headers,
    caller: &HeaderSpec,
    derived: impl IntoIterator<Item = (&'a str, &'a str)>,
) {
    for (name, value) in derived {
        if !caller.mentions(name) {
            headers.insert_default(name, value);
        }
    }
}

/// Merge caller headers with derived defaults.
///
/// Caller values always win, the first-seen casing is kept, and suppressed
/// names are absent from the result.
///
/// # Errors
///
/// Returns [`Error::InvalidHeader`] if a caller name or value is not valid.
pub fn merge<'a>(
    caller: &HeaderSpec,
    derived: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<Headers> {
    let mut headers = caller_headers(caller)?;
    apply_defaults(&mut headers, caller, derived);
    Ok(headers)
}

fn validate(name: &str, value: &str) -> Result<(http::HeaderName, http::HeaderValue)> {
    let header_name = http::HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| Error::invalid_header(name, err.to_string()))?;
    if value.starts_with([' ', '\t']) {
        return Err(Error::invalid_header(
            name,
            "value must not start with whitespace",
        ));
    }
    let header_value = http::HeaderValue::from_str(value)
        .map_err(|err| Error::invalid_header(name, err.to_string()))?;
    Ok((header_name, header_value))
}
