//! Outbound URL construction.
//!
//! The wildcard segment is copied from the inbound URI as received, so
//! percent-escapes and embedded slashes reach the upstream untouched. The
//! query is rebuilt from the parsed pairs in their original order.

use url::form_urlencoded;

/// Inbound path prefix whose remainder is forwarded.
pub const FORWARD_PREFIX: &str = "/tg/s/";

/// Upstream path prefix the wildcard is appended to.
pub const UPSTREAM_PREFIX: &str = "/s/";

/// Return the raw wildcard segment of an inbound path, if it is a forward path.
pub fn wildcard_segment(path: &str) -> Option<&str> {
    path.strip_prefix(FORWARD_PREFIX)
}

/// Decode an inbound query string into ordered pairs, keeping duplicates.
///
/// Escapes that do not decode to UTF-8 are replaced with U+FFFD, so the
/// upstream receives `%EF%BF%BD` in their place.
pub fn parse_query(raw: Option<&str>) -> Vec<(String, String)> {
    match raw {
        Some(raw) => form_urlencoded::parse(raw.as_bytes()).into_owned().collect(),
        None => Vec::new(),
    }
}

/// Build `{base}/s/{wildcard}[?{query}]`.
///
/// The `?` is only emitted when there is at least one pair.
pub fn build_target_url(base: &str, wildcard: &str, query: &[(String, String)]) -> String {
    let mut target = String::with_capacity(base.len() + UPSTREAM_PREFIX.len() + wildcard.len());
    target.push_str(base.trim_end_matches('/'));
    target.push_str(UPSTREAM_PREFIX);
    target.push_str(wildcard);

    if !query.is_empty() {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query)
            .finish();
        target.push('?');
        target.push_str(&encoded);
    }

    target
}
