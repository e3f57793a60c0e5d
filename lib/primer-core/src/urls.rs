//! URL composition.

use tracing::trace;
use url::Url;

use crate::params::{Data, EncodedForm, encode_params};
use crate::{Error, Result};

/// Compose the request URL from `url` and the query `params`.
///
/// The URL is parsed (and its host IDNA-normalized); an empty path becomes
/// `/`. Encoded params are appended to any existing query with `&`, and a
/// `?` is only added when the final query is non-empty. URLs with a
/// non-HTTP scheme, such as `mailto:`, are returned unchanged.
///
/// # Errors
///
/// Returns [`Error::MissingUrl`] if the URL is empty, has no scheme or host,
/// or cannot be parsed, and [`Error::Encoding`] if `params` cannot be used as
/// a query string.
///
/// # Example
///
/// ```
/// use primer_core::{Data, compose_url};
///
/// let url = compose_url("https://example.com/search?lang=en", &Data::from(vec![("q", "rust http")]))
///     .expect("valid URL");
/// assert_eq!(url, "https://example.com/search?lang=en&q=rust+http");
/// ```
pub fn compose_url(url: &str, params: &Data) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::missing_url(None, "no URL supplied"));
    }

    // Leave anything that is not HTTP-like alone (mailto:, data:, ...)
    if url.contains(':') && !url.to_ascii_lowercase().starts_with("http") {
        trace!(url, "non-HTTP URL left unchanged");
        return Ok(url.to_string());
    }

    let mut parsed = Url::parse(url).map_err(|err| match err {
        url::ParseError::RelativeUrlWithoutBase => Error::missing_url(
            Some(url),
            format!("no scheme supplied. Perhaps you meant https://{url}?"),
        ),
        url::ParseError::EmptyHost => Error::missing_url(Some(url), "no host supplied"),
        other => Error::missing_url(Some(url), other.to_string()),
    })?;

    if !parsed.has_host() {
        return Err(Error::missing_url(Some(url), "no host supplied"));
    }

    let encoded = encode_query(params)?;
    if !encoded.is_empty() {
        let query = match parsed.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
            _ => encoded,
        };
        parsed.set_query(Some(&query));
    } else if parsed.query() == Some("") {
        parsed.set_query(None);
    }

    Ok(parsed.into())
}

fn encode_query(params: &Data) -> Result<String> {
    match encode_params(params)? {
        EncodedForm::Form(encoded) => Ok(encoded),
        EncodedForm::Raw(bytes) => String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::encoding("query parameters must be valid UTF-8")),
        EncodedForm::Stream(_) => Err(Error::encoding(
            "a stream cannot be used as query parameters",
        )),
    }
}

/// The path and query of `url`, without scheme or host.
///
/// An empty path becomes `/`; `?query` is only appended when the query is
/// non-empty.
#[must_use]
pub fn path_url(url: &str) -> String {
    let (path, query) = match Url::parse(url) {
        Ok(parsed) => (
            parsed.path().to_string(),
            parsed.query().map(str::to_string),
        ),
        Err(_) => split_path_query(url),
    };

    let mut path_url = if path.is_empty() { "/".to_string() } else { path };
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        path_url.push('?');
        path_url.push_str(&query);
    }
    path_url
}

// Best effort for relative references that `Url` refuses.
fn split_path_query(url: &str) -> (String, Option<String>) {
    let without_fragment = url.split_once('#').map_or(url, |(before, _)| before);
    match without_fragment.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (without_fragment.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::{BodyStream, Params};

    fn no_params() -> Data {
        Data::default()
    }

    #[test]
    fn empty_path_defaults_to_slash() {
        let url = compose_url("http://x.com", &no_params()).expect("url");
        check!(url == "http://x.com/");
        check!(path_url(&url) == "/");
    }

    #[test]
    fn path_url_keeps_query() {
        check!(path_url("http://x.com/a?x=1") == "/a?x=1");
        check!(path_url("http://x.com/a?") == "/a");
        check!(path_url("http://x.com/a#frag") == "/a");
        check!(path_url("/relative?y=2") == "/relative?y=2");
        check!(path_url("") == "/");
    }

    #[test]
    fn params_append_to_existing_query() {
        let params = Data::from(vec![("b", "2"), ("c", "x y")]);
        let url = compose_url("https://api.example.com/items?a=1", &params).expect("url");
        check!(url == "https://api.example.com/items?a=1&b=2&c=x+y");
    }

    #[test]
    fn no_question_mark_for_empty_query() {
        let params = Data::from(Params::new().pair("skip", None::<&str>));
        let url = compose_url("https://example.com/path", &params).expect("url");
        check!(url == "https://example.com/path");
    }

    #[test]
    fn dangling_question_mark_is_dropped() {
        let url = compose_url("http://x.com/a?", &no_params()).expect("url");
        check!(url == "http://x.com/a");

        let url = compose_url("http://x.com/a?#top", &no_params()).expect("url");
        check!(url == "http://x.com/a#top");

        let url = compose_url("http://x.com/a?", &Data::from(vec![("b", "2")])).expect("url");
        check!(url == "http://x.com/a?b=2");

        let url = compose_url("http://x.com/a?k=1", &no_params()).expect("url");
        check!(url == "http://x.com/a?k=1");
    }

    #[test]
    fn fragment_is_kept_after_query() {
        let url = compose_url("https://example.com/a#top", &Data::from(vec![("q", "1")]))
            .expect("url");
        check!(url == "https://example.com/a?q=1#top");
    }

    #[test]
    fn raw_params_are_appended() {
        let url = compose_url("http://x.com/", &Data::from("a=1&b")).expect("url");
        check!(url == "http://x.com/?a=1&b");
    }

    #[test]
    fn stream_params_are_rejected() {
        let params = Data::from(BodyStream::new(std::io::empty()));
        let_assert!(Err(err) = compose_url("http://x.com/", &params));
        check!(err.is_encoding());
    }

    #[test]
    fn international_hosts_are_normalized() {
        let url = compose_url("http://bücher.example/", &no_params()).expect("url");
        check!(url == "http://xn--bcher-kva.example/");
    }

    #[test]
    fn non_http_urls_pass_through() {
        let params = Data::from(vec![("ignored", "1")]);
        let url = compose_url("mailto:user@example.com", &params).expect("url");
        check!(url == "mailto:user@example.com");
    }

    #[test]
    fn missing_url_errors() {
        let_assert!(Err(err) = compose_url("   ", &no_params()));
        check!(err.is_missing_url());

        let_assert!(Err(err) = compose_url("example.com/path", &no_params()));
        check!(err.is_missing_url());
        insta::assert_snapshot!(
            err.to_string(),
            @"missing or invalid URL: no scheme supplied. Perhaps you meant https://example.com/path?"
        );

        let_assert!(Err(err) = compose_url("http://", &no_params()));
        check!(err.is_missing_url());
    }
}
