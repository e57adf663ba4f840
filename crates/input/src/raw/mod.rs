//! The raw request snapshot handed to [`Input`](crate::Input).
//!
//! [`RawRequestData`] holds what a transport layer collected for a single
//! request: query parameters, posted form fields, uploaded-file descriptors,
//! cookies, CGI style server variables and the request body. It can be built
//! by hand through [`RawRequestData::builder`], from CGI environment variables
//! (see [`RawRequestData::from_cgi_env`]) or from an [`http::Request`].

mod body;
mod from_cgi;
mod from_http;

pub mod keys;

pub use body::RequestBody;

use crate::parse;
use crate::value::{InputMap, InputValue};
use bytes::Bytes;

/// Everything a transport collected for one request.
#[derive(Debug, Default)]
pub struct RawRequestData {
    pub(crate) query: InputMap,
    pub(crate) post: InputMap,
    pub(crate) files: InputMap,
    pub(crate) cookies: InputMap,
    pub(crate) server: InputMap,
    pub(crate) body: RequestBody,
}

impl RawRequestData {
    /// Starts an empty snapshot.
    pub fn builder() -> RawRequestDataBuilder {
        RawRequestDataBuilder::default()
    }

    /// Query string parameters.
    pub fn query(&self) -> &InputMap {
        &self.query
    }

    /// Posted form fields.
    pub fn post(&self) -> &InputMap {
        &self.post
    }

    /// Uploaded file descriptors by field name.
    pub fn files(&self) -> &InputMap {
        &self.files
    }

    /// Cookies sent with the request.
    pub fn cookies(&self) -> &InputMap {
        &self.cookies
    }

    /// CGI style server variables, headers included as `HTTP_*`.
    pub fn server(&self) -> &InputMap {
        &self.server
    }

    /// Sets a server variable, e.g. `REMOTE_ADDR` once the peer address is known.
    pub fn set_server_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.server.insert(key.into(), InputValue::Str(value.into()));
    }

    /// String valued server variable.
    pub(crate) fn server_str(&self, key: &str) -> Option<&str> {
        self.server.get(key).and_then(InputValue::as_str)
    }

    /// Parses a posted url-encoded form from the body, as a web server does for POST.
    pub(crate) fn fill_post_from_body(&mut self) {
        let is_form_post = self.server_str(keys::REQUEST_METHOD) == Some("POST")
            && self.server_str(keys::CONTENT_TYPE).is_some_and(is_form_content_type);
        if !is_form_post {
            return;
        }

        let bytes = self.body.read_once();
        self.post = parse::parse_form(&bytes);
        self.body = RequestBody::from(bytes);
    }

    /// Replaces the query string and its parsed parameters.
    pub(crate) fn replace_query(&mut self, query_string: &str) {
        self.query = parse::parse_query(query_string);
        self.set_server_var(keys::QUERY_STRING, query_string);
    }
}

fn is_form_content_type(content_type: &str) -> bool {
    content_type
        .parse::<mime::Mime>()
        .is_ok_and(|parsed| parsed.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
}

/// Builder for [`RawRequestData`].
///
/// ```
/// use micro_input::RawRequestData;
///
/// let data = RawRequestData::builder()
///     .method("PUT")
///     .request_uri("/users/5?x=1")
///     .body("name=val")
///     .build();
///
/// assert_eq!(data.query()["x"], "1");
/// ```
#[derive(Debug, Default)]
pub struct RawRequestDataBuilder {
    data: RawRequestData,
}

impl RawRequestDataBuilder {
    /// Sets `REQUEST_METHOD`.
    #[must_use]
    pub fn method(self, method: impl Into<String>) -> Self {
        self.server_var(keys::REQUEST_METHOD, method)
    }

    /// Sets `REQUEST_URI`, and `QUERY_STRING` plus the query map from its query part.
    #[must_use]
    pub fn request_uri(mut self, request_uri: impl Into<String>) -> Self {
        let request_uri = request_uri.into();
        if let Some((_, query)) = request_uri.split_once('?') {
            let query = query.split_once('#').map_or(query, |(query, _)| query);
            self.data.replace_query(query);
        }
        self.server_var(keys::REQUEST_URI, request_uri)
    }

    #[must_use]
    pub fn server_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.set_server_var(key, value);
        self
    }

    #[must_use]
    pub fn header(self, name: &str, value: impl Into<String>) -> Self {
        self.server_var(keys::header_var(name), value)
    }

    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.data.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn post_param(mut self, key: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.data.post.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn cookie(mut self, key: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.data.cookies.insert(key.into(), value.into());
        self
    }

    /// Registers an uploaded file descriptor under `field`.
    #[must_use]
    pub fn file(mut self, field: impl Into<String>, descriptor: InputMap) -> Self {
        self.data.files.insert(field.into(), InputValue::Map(descriptor));
        self
    }

    #[must_use]
    pub fn query(mut self, query: InputMap) -> Self {
        self.data.query = query;
        self
    }

    #[must_use]
    pub fn post(mut self, post: InputMap) -> Self {
        self.data.post = post;
        self
    }

    #[must_use]
    pub fn cookies(mut self, cookies: InputMap) -> Self {
        self.data.cookies = cookies;
        self
    }

    #[must_use]
    pub fn files(mut self, files: InputMap) -> Self {
        self.data.files = files;
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.data.body = RequestBody::from(body.into());
        self
    }

    #[must_use]
    pub fn body_reader<R: std::io::Read + Send + 'static>(mut self, reader: R) -> Self {
        self.data.body = RequestBody::reader(reader);
        self
    }

    pub fn build(self) -> RawRequestData {
        self.data
    }
}
