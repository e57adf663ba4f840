//! Request URI detection.
//!
//! Web servers disagree on where the routed path lives. Depending on the
//! setup it is found in `PATH_INFO`, in `ORIG_PATH_INFO` (prefixed with the
//! script name), or only in `REQUEST_URI`, possibly behind a base path, an
//! index file, or even inside the query string when the server can only
//! route through `index.php?`. [`detect`] reconciles these sources into one
//! path, [`strip_url_suffix`] and [`normalize`] finish the job.

use std::borrow::Cow;

use http::Uri;
use tracing::{debug, error, warn};

use crate::config::{BASE_URL, ConfigProvider, INDEX_FILE, QUERY_STRING_INDEX_FILE};
use crate::error::InputError;
use crate::raw::{RawRequestData, keys};

/// The routed path as found in the server variables, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUri {
    pub path: String,
    /// Query string recovered from a pass-through request uri, e.g. `index.php?/users?x=1`.
    pub query: Option<String>,
}

impl RawUri {
    fn path(path: impl Into<String>) -> Self {
        Self { path: path.into(), query: None }
    }
}

/// Finds the routed path in the server variables.
pub fn detect(data: &RawRequestData, config: &dyn ConfigProvider) -> Result<RawUri, InputError> {
    if let Some(path_info) = data.server_str(keys::PATH_INFO).filter(|s| !s.is_empty()) {
        debug!(source = keys::PATH_INFO, path_info, "detected uri");
        return Ok(RawUri::path(path_info));
    }

    if let Some(orig_path_info) = data.server_str(keys::ORIG_PATH_INFO).filter(|s| !s.is_empty()) {
        let path = match data.server_str(keys::SCRIPT_NAME).filter(|s| !s.is_empty()) {
            Some(script_name) => orig_path_info.replace(script_name, ""),
            None => orig_path_info.to_owned(),
        };
        if !path.is_empty() {
            debug!(source = keys::ORIG_PATH_INFO, path = %path, "detected uri");
            return Ok(RawUri::path(path));
        }
    }

    let Some(request_uri) = data.server_str(keys::REQUEST_URI) else {
        error!("no PATH_INFO, ORIG_PATH_INFO or REQUEST_URI available");
        return Err(InputError::UnableToDetectUri);
    };

    let index_file = config.get(INDEX_FILE).filter(|s| !s.is_empty());
    let path = request_path(request_uri);
    let mut uri: &str = if index_file == Some(QUERY_STRING_INDEX_FILE) { request_uri } else { &path };

    if let Some(base_path) = config.get(BASE_URL).and_then(base_path) {
        uri = strip_base_path(uri, &base_path);
    }

    if let Some(index_file) = index_file {
        uri = strip_index_file(uri, index_file);
    }

    let raw = match uri.split_once('?') {
        Some((path, query)) => RawUri { path: path.to_owned(), query: Some(query.to_owned()) },
        None => RawUri::path(uri),
    };
    debug!(source = keys::REQUEST_URI, request_uri, path = %raw.path, query = ?raw.query, "detected uri");
    Ok(raw)
}

/// Removes `suffix` when the text from the last `.` to the end equals it.
pub fn strip_url_suffix(mut path: String, suffix: Option<&str>) -> String {
    let Some(suffix) = suffix.filter(|s| !s.is_empty()) else {
        return path;
    };

    if path.rfind('.').is_some_and(|dot| path[dot..] == *suffix) {
        path.truncate(path.len() - suffix.len());
    }
    path
}

/// Collapses repeated slashes and resolves `..` segments.
///
/// A `..` removes the segment before it and never climbs above the start of
/// the path. Leading and trailing slashes are kept.
///
/// ```
/// use micro_input::uri::normalize;
///
/// assert_eq!(normalize("/a//b/../c"), "/a/c");
/// assert_eq!(normalize("/../../etc/passwd"), "/etc/passwd");
/// ```
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut normalized = String::with_capacity(path.len());
    if path.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(&segments.join("/"));
    if path.ends_with('/') && !segments.is_empty() {
        normalized.push('/');
    }

    // segments such as `x..` still leave a `../` behind
    while normalized.contains("../") || normalized.contains("//") {
        normalized = normalized.replace("../", "/").replace("//", "/");
    }
    normalized
}

/// The path of a request uri, without query and fragment.
fn request_path(request_uri: &str) -> Cow<'_, str> {
    // absolute-form, as sent to proxies
    if let Ok(uri) = request_uri.parse::<Uri>()
        && uri.scheme().is_some()
    {
        return Cow::Owned(absolute_path(&uri, request_uri).to_owned());
    }

    // the request line may not be a valid `Uri`, so only cut at `?` and `#`
    let end = request_uri.find(['?', '#']).unwrap_or(request_uri.len());
    Cow::Borrowed(&request_uri[..end])
}

/// The path component of the configured base url, `None` when it has none.
///
/// `http://example.com/app/` yields `/app/` and `http://example.com` yields
/// nothing. Protocol relative urls such as `//example.com/app` are accepted.
fn base_path(base_url: &str) -> Option<String> {
    let parsed = match base_url.strip_prefix("//") {
        Some(rest) => format!("http://{rest}").parse::<Uri>(),
        None => base_url.parse::<Uri>(),
    };
    let uri = match parsed {
        Ok(uri) => uri,
        Err(e) => {
            warn!(base_url, cause = %e, "base url is not a valid uri, ignored");
            return None;
        }
    };

    let path = if uri.scheme().is_some() { absolute_path(&uri, base_url) } else { uri.path() };
    (!path.is_empty()).then(|| path.to_owned())
}

/// The path of an absolute url, empty when `raw` has nothing after the authority.
///
/// `Uri::path` reports `/` in that case.
fn absolute_path<'a>(uri: &'a Uri, raw: &str) -> &'a str {
    let has_path = uri
        .authority()
        .and_then(|authority| raw.split_once(authority.as_str()))
        .is_none_or(|(_, rest)| rest.starts_with('/'));
    if has_path { uri.path() } else { "" }
}

/// Strips `prefix` from `uri` if it ends on a path boundary.
fn strip_boundary_prefix<'a>(uri: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = uri.strip_prefix(prefix)?;
    let on_boundary =
        prefix.ends_with(['/', '?']) || rest.is_empty() || rest.starts_with(['/', '?']);
    on_boundary.then_some(rest)
}

fn strip_base_path<'a>(uri: &'a str, base_path: &str) -> &'a str {
    strip_boundary_prefix(uri, base_path)
        .or_else(|| {
            let trimmed = base_path.trim_end_matches('/');
            if trimmed.is_empty() || trimmed == base_path { None } else { strip_boundary_prefix(uri, trimmed) }
        })
        .unwrap_or(uri)
}

fn strip_index_file<'a>(uri: &'a str, index_file: &str) -> &'a str {
    strip_boundary_prefix(uri, index_file)
        .or_else(|| uri.strip_prefix('/').and_then(|rest| strip_boundary_prefix(rest, index_file)))
        .unwrap_or(uri)
}
