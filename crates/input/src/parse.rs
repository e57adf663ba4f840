//! Permissive decoders for query strings, url-encoded bodies and cookie headers.
//!
//! None of these fail: malformed input degrades to whatever could be decoded,
//! or to an empty map, and a warning is logged.

use crate::value::{InputMap, InputValue};
use once_cell::sync::Lazy;
use tracing::warn;

/// Nesting up to five levels; encoded brackets such as `user%5Bname%5D` still nest.
static QS_CONFIG: Lazy<serde_qs::Config> = Lazy::new(|| serde_qs::Config::new(5, false));

/// Parses a query string (without the leading `?`).
///
/// Bracket syntax builds nested values through `serde_qs`. Input it rejects,
/// for example a key used both as a scalar and as a map, falls back to flat
/// `serde_urlencoded` pairs where the last occurrence of a key wins. Pairs
/// with an empty name are dropped.
pub fn parse_query(query: &str) -> InputMap {
    let query = query.strip_prefix('?').unwrap_or(query);
    parse_pairs(query.as_bytes())
}

/// Parses an `application/x-www-form-urlencoded` body.
///
/// Invalid utf8 is replaced rather than rejected.
pub fn parse_form(body: &[u8]) -> InputMap {
    parse_pairs(body)
}

fn parse_pairs(input: &[u8]) -> InputMap {
    if input.is_empty() {
        return InputMap::new();
    }

    let mut map = match QS_CONFIG.deserialize_bytes::<InputMap>(input) {
        Ok(map) => map,
        Err(qs_error) => match serde_urlencoded::from_bytes::<Vec<(String, String)>>(input) {
            Ok(pairs) => pairs.into_iter().map(|(k, v)| (k, InputValue::Str(v))).collect(),
            Err(e) => {
                warn!(
                    cause = %e,
                    nested_cause = %qs_error,
                    len = input.len(),
                    "unable to decode url-encoded input, ignored"
                );
                InputMap::new()
            }
        },
    };
    // `=v` has no name, `serde_qs` would keep it as the key `=v`
    map.retain(|key, _| !key.is_empty() && !key.starts_with('='));
    map
}

/// Parses a `Cookie` header value, the first occurrence of a name wins.
pub fn parse_cookies(header: &str) -> InputMap {
    let mut cookies = InputMap::new();
    for pair in header.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = value.trim();
        let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);
        cookies.entry(name.to_owned()).or_insert_with(|| InputValue::from(value));
    }
    cookies
}
