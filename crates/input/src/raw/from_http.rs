//! Snapshot construction from [`http::Request`].
//!
//! Headers and request line are translated into CGI style server variables so
//! the same accessors work no matter which transport produced the request.

use std::collections::HashMap;

use bytes::Bytes;
use http::request::Parts;
use http::uri::Scheme;
use http::{Request, header};
use http_body::Body;
use http_body_util::BodyExt;
use tracing::debug;

use super::{RawRequestData, RequestBody, keys};
use crate::parse;
use crate::value::InputValue;

impl RawRequestData {
    /// Collects the request body and builds the snapshot.
    pub async fn from_request<B>(req: Request<B>) -> Result<Self, B::Error>
    where
        B: Body,
    {
        let (parts, body) = req.into_parts();
        let bytes = body.collect().await?.to_bytes();
        Ok(Self::from_parts(parts, bytes))
    }

    fn from_parts(parts: Parts, body: Bytes) -> Self {
        let mut data = RawRequestData::default();

        data.set_server_var(keys::REQUEST_METHOD, parts.method.as_str());
        data.set_server_var(
            keys::REQUEST_URI,
            parts.uri.path_and_query().map_or_else(|| parts.uri.path().to_owned(), ToString::to_string),
        );
        data.set_server_var(keys::QUERY_STRING, parts.uri.query().unwrap_or_default());
        data.set_server_var(keys::SERVER_PROTOCOL, format!("{:?}", parts.version));
        if parts.uri.scheme() == Some(&Scheme::HTTPS) {
            data.set_server_var(keys::HTTPS, "on");
        }

        let mut headers: HashMap<String, String> = HashMap::with_capacity(parts.headers.keys_len());
        for (name, value) in &parts.headers {
            let value = String::from_utf8_lossy(value.as_bytes());
            let separator = if *name == header::COOKIE { "; " } else { ", " };
            headers
                .entry(keys::header_var(name.as_str()))
                .and_modify(|existing| {
                    existing.push_str(separator);
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.into_owned());
        }
        data.server.extend(headers.into_iter().map(|(k, v)| (k, InputValue::Str(v))));

        data.query = parts.uri.query().map(parse::parse_query).unwrap_or_default();
        data.cookies = data.server_str(keys::HTTP_COOKIE).map(parse::parse_cookies).unwrap_or_default();
        data.body = RequestBody::from(body);
        data.fill_post_from_body();

        debug!(method = %parts.method, uri = %parts.uri, "collected request input");
        data
    }
}

impl From<Request<Bytes>> for RawRequestData {
    fn from(value: Request<Bytes>) -> Self {
        let (parts, body) = value.into_parts();
        Self::from_parts(parts, body)
    }
}
