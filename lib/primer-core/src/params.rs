//! Parameter encoding for query strings and form bodies.
//!
//! [`encode_params`] turns a [`Data`] value into its
//! `application/x-www-form-urlencoded` wire form. Raw bytes and streams are
//! passed through untouched; key/value pairs are expanded and percent-encoded.
//!
//! Spaces are encoded as `+`, and every byte outside `A-Z a-z 0-9 * - . _` is
//! percent-encoded.
//!
//! # Example
//!
//! ```
//! use primer_core::{Data, EncodedForm, Params, encode_params};
//!
//! let data = Data::from(Params::new().pair("q", "rust http").pair("tag", vec!["a", "b"]));
//! let EncodedForm::Form(encoded) = encode_params(&data).expect("encode") else {
//!     panic!("pairs encode to a form");
//! };
//! assert_eq!(encoded, "q=rust+http&tag=a&tag=b");
//! ```

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use url::form_urlencoded;

use crate::{BodyStream, Error, Result};

// ============================================================================
// Values
// ============================================================================

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParamValue {
    /// No value: the entry is dropped when encoding.
    #[default]
    Null,
    /// UTF-8 text.
    Text(String),
    /// Raw bytes, percent-encoded as-is.
    Bytes(Bytes),
    /// Several values sharing the same key.
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Returns `true` for [`ParamValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn scalar_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(text) => Some(text.as_bytes()),
            Self::Bytes(bytes) => Some(&bytes[..]),
            Self::Null | Self::List(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<Bytes> for ParamValue {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Text(value.to_string())
    }
}

macro_rules! impl_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    Self::Text(value.to_string())
                }
            }
        )*
    };
}

impl_from_display!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char);

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<serde_json::Value> for ParamValue {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        use serde_json::Value;

        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::from(b)),
            Value::Number(n) => Ok(Self::Text(n.to_string())),
            Value::String(s) => Ok(Self::Text(s)),
            Value::Array(items) => items
                .into_iter()
                .map(Self::try_from)
                .collect::<Result<Vec<_>>>()
                .map(Self::List),
            Value::Object(_) => Err(Error::encoding(
                "a mapping cannot be used as a parameter value",
            )),
        }
    }
}

// ============================================================================
// Params
// ============================================================================

/// Ordered key/value parameters.
///
/// Pair sequences keep their order exactly. Maps contribute their iteration
/// order, which is stable for a given map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    pairs: Vec<(String, ParamValue)>,
}

impl Params {
    /// Create empty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key/value pair.
    #[must_use]
    pub fn pair(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.push(key, value);
        self
    }

    /// Append a key/value pair in place.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Build parameters from any serializable value.
    ///
    /// Objects become pairs (in `serde_json` map order); arrays must hold
    /// `[key, value]` pairs.
    pub fn from_serialize<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self> {
        use serde_json::Value;

        match serde_json::to_value(value)? {
            Value::Object(map) => map
                .into_iter()
                .map(|(key, value)| Ok((key, ParamValue::try_from(value)?)))
                .collect::<Result<Vec<_>>>()
                .map(|pairs| Self { pairs }),
            Value::Array(items) => items
                .into_iter()
                .map(pair_from_json)
                .collect::<Result<Vec<_>>>()
                .map(|pairs| Self { pairs }),
            Value::Null => Ok(Self::new()),
            other => Err(Error::encoding(format!(
                "cannot build key/value pairs from {other}"
            ))),
        }
    }

    /// Returns `true` if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of pairs, before list expansion.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Iterate over the pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.pairs.iter().map(|(key, value)| (key.as_str(), value))
    }
}

fn pair_from_json(item: serde_json::Value) -> Result<(String, ParamValue)> {
    use serde_json::Value;

    let Value::Array(pair) = item else {
        return Err(Error::encoding(format!(
            "expected a [key, value] pair, got {item}"
        )));
    };
    let mut pair = pair.into_iter();
    match (pair.next(), pair.next(), pair.next()) {
        (Some(Value::String(key)), Some(value), None) => Ok((key, ParamValue::try_from(value)?)),
        _ => Err(Error::encoding("expected a [key, value] pair")),
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> From<Vec<(K, V)>> for Params {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<ParamValue>, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<ParamValue>, S> From<HashMap<K, V, S>> for Params {
    fn from(map: HashMap<K, V, S>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> From<BTreeMap<K, V>> for Params {
    fn from(map: BTreeMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

// ============================================================================
// Data
// ============================================================================

/// Body or parameter input, tagged once at the API boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// Pre-encoded content, sent verbatim.
    Raw(Bytes),
    /// A readable stream, sent verbatim.
    Stream(BodyStream),
    /// Key/value pairs to form-encode.
    Form(Params),
}

impl Data {
    /// Returns `true` when there is nothing to encode.
    ///
    /// A stream is never considered empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Raw(bytes) => bytes.is_empty(),
            Self::Stream(_) => false,
            Self::Form(params) => params.is_empty(),
        }
    }
}

impl Default for Data {
    fn default() -> Self {
        Self::Form(Params::new())
    }
}

impl From<Params> for Data {
    fn from(params: Params) -> Self {
        Self::Form(params)
    }
}

impl From<BodyStream> for Data {
    fn from(stream: BodyStream) -> Self {
        Self::Stream(stream)
    }
}

impl From<Bytes> for Data {
    fn from(bytes: Bytes) -> Self {
        Self::Raw(bytes)
    }
}

impl From<&'static [u8]> for Data {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Raw(Bytes::from_static(bytes))
    }
}

impl From<&str> for Data {
    fn from(text: &str) -> Self {
        Self::Raw(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl From<String> for Data {
    fn from(text: String) -> Self {
        Self::Raw(Bytes::from(text))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> From<Vec<(K, V)>> for Data {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Self::Form(pairs.into())
    }
}

impl<K: Into<String>, V: Into<ParamValue>, const N: usize> From<[(K, V); N]> for Data {
    fn from(pairs: [(K, V); N]) -> Self {
        Self::Form(pairs.into())
    }
}

impl<K: Into<String>, V: Into<ParamValue>, S> From<HashMap<K, V, S>> for Data {
    fn from(map: HashMap<K, V, S>) -> Self {
        Self::Form(map.into())
    }
}

impl<K: Into<String>, V: Into<ParamValue>> From<BTreeMap<K, V>> for Data {
    fn from(map: BTreeMap<K, V>) -> Self {
        Self::Form(map.into())
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Result of [`encode_params`].
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedForm {
    /// Raw input, unchanged.
    Raw(Bytes),
    /// Stream input, unchanged.
    Stream(BodyStream),
    /// The `application/x-www-form-urlencoded` string.
    Form(String),
}

/// Encode parameters for a query string or a form body.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when a list value contains another list.
pub fn encode_params(data: &Data) -> Result<EncodedForm> {
    match data {
        Data::Raw(bytes) => Ok(EncodedForm::Raw(bytes.clone())),
        Data::Stream(stream) => Ok(EncodedForm::Stream(stream.clone())),
        Data::Form(params) => encode_pairs(params).map(EncodedForm::Form),
    }
}

/// Form-encode key/value pairs.
///
/// List values expand into one pair per element; `Null` values are dropped.
///
/// # Errors
///
/// Returns [`Error::Encoding`] when a list value contains another list.
pub fn encode_pairs(params: &Params) -> Result<String> {
    let mut encoded = String::new();
    for (key, value) in params.iter() {
        match value {
            ParamValue::Null => {}
            ParamValue::Text(_) | ParamValue::Bytes(_) => {
                append_pair(&mut encoded, key, value);
            }
            ParamValue::List(items) => {
                for item in items {
                    match item {
                        ParamValue::Null => {}
                        ParamValue::List(_) => {
                            return Err(Error::encoding(format!(
                                "nested sequence for key '{key}'"
                            )));
                        }
                        ParamValue::Text(_) | ParamValue::Bytes(_) => {
                            append_pair(&mut encoded, key, item);
                        }
                    }
                }
            }
        }
    }
    Ok(encoded)
}

fn append_pair(out: &mut String, key: &str, value: &ParamValue) {
    if !out.is_empty() {
        out.push('&');
    }
    out.extend(form_urlencoded::byte_serialize(key.as_bytes()));
    out.push('=');
    if let Some(bytes) = value.scalar_bytes() {
        out.extend(form_urlencoded::byte_serialize(bytes));
    }
}
