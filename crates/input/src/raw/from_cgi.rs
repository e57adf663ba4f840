use std::io::Read;

use super::{RawRequestData, RequestBody, keys};
use crate::parse;
use crate::value::{InputMap, InputValue};

impl RawRequestData {
    /// Collects a request the way a CGI program receives it.
    ///
    /// `vars` are the process environment variables, `body` is usually stdin.
    /// The body is limited to `CONTENT_LENGTH` bytes when that variable is set.
    /// A url-encoded POST body is read immediately to fill the post map; any
    /// other body is left unread until something asks for it.
    pub fn from_cgi_env<I, K, V, R>(vars: I, body: R) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
        R: Read + Send + 'static,
    {
        let server: InputMap = vars.into_iter().map(|(k, v)| (k.into(), InputValue::Str(v.into()))).collect();
        let mut data = RawRequestData { server, ..Default::default() };

        data.query = data.server_str(keys::QUERY_STRING).map(parse::parse_query).unwrap_or_default();
        data.cookies = data.server_str(keys::HTTP_COOKIE).map(parse::parse_cookies).unwrap_or_default();

        let content_length = data.server_str(keys::CONTENT_LENGTH).and_then(|len| len.trim().parse::<u64>().ok());
        data.body = match content_length {
            Some(0) => RequestBody::Empty,
            Some(len) => RequestBody::reader(body.take(len)),
            None => RequestBody::reader(body),
        };

        data.fill_post_from_body();
        data
    }
}
