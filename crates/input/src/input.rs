//! The per-request input facade.
//!
//! [`Input`] owns one [`RawRequestData`] snapshot plus the collaborators it
//! needs to interpret it, and caches the two derived values that cost
//! something to compute: the detected URI and the hydrated parameter map.
//! Both caches live exactly as long as the `Input`; create a new one, or call
//! [`Input::reset`], for the next request.

use http::Method;
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use tracing::debug;

use crate::cli::{CliKey, CliOptions};
use crate::config::{ConfigProvider, InputConfig, URL_SUFFIX};
use crate::error::InputError;
use crate::parse;
use crate::raw::{RawRequestData, keys};
use crate::security::{HtmlEntities, Sanitizer};
use crate::uri;
use crate::value::{self, InputMap, InputValue};

/// Fallback for [`Input::ip`] and [`Input::real_ip`].
pub const DEFAULT_IP: &str = "0.0.0.0";

/// Fallback for [`Input::method`].
pub const DEFAULT_METHOD: &str = "GET";

/// Body parameters parsed for a PUT or DELETE request.
#[derive(Debug)]
struct BodyParams {
    method: Method,
    params: InputMap,
}

#[derive(Debug)]
struct Hydrated {
    all: InputMap,
    body: Option<BodyParams>,
}

static EMPTY: Lazy<InputMap> = Lazy::new(InputMap::new);

/// Generates the three accessors of a plain input source: the whole map,
/// a keyed lookup, and a keyed lookup with a fallback.
macro_rules! input_source {
    ($source:literal, $all:ident, $one:ident, $or:ident, $field:ident) => {
        #[doc = concat!("All ", $source, " values.")]
        #[inline]
        pub fn $all(&self) -> &InputMap {
            &self.data.$field
        }

        #[doc = concat!("A ", $source, " value; dotted keys walk into nested values.")]
        #[inline]
        pub fn $one(&self, key: &str) -> Option<&InputValue> {
            value::lookup(&self.data.$field, key)
        }

        #[doc = concat!("A ", $source, " value, or `default` when absent.")]
        #[inline]
        pub fn $or<'a>(&'a self, key: &str, default: &'a InputValue) -> &'a InputValue {
            self.$one(key).unwrap_or(default)
        }
    };
}

/// Read access to everything a single request carries.
///
/// ```
/// use micro_input::{Input, InputConfig, RawRequestData};
///
/// let data = RawRequestData::builder()
///     .method("PUT")
///     .request_uri("/app/index.php/users/5?x=1")
///     .header("X-Requested-With", "XMLHttpRequest")
///     .body("name=val")
///     .build();
///
/// let config = InputConfig::default().base_url("/app").index_file("index.php");
/// let mut input = Input::builder(data).config(config).build();
///
/// assert_eq!(input.uri().unwrap(), "/users/5");
/// assert_eq!(input.get("x").unwrap(), "1");
/// assert_eq!(input.param("name").unwrap(), "val");
/// assert!(input.is_ajax());
/// ```
pub struct Input {
    data: RawRequestData,
    config: Box<dyn ConfigProvider>,
    sanitizer: Box<dyn Sanitizer>,
    cli: Option<Box<dyn CliOptions>>,
    detected_uri: Option<String>,
    hydrated: OnceCell<Hydrated>,
}

impl Input {
    /// An `Input` with the default config and sanitizer.
    pub fn new(data: RawRequestData) -> Self {
        Self::builder(data).build()
    }

    /// Starts an `Input` with custom collaborators.
    pub fn builder(data: RawRequestData) -> InputBuilder {
        InputBuilder {
            data,
            config: Box::new(InputConfig::default()),
            sanitizer: Box::new(HtmlEntities),
            cli: None,
        }
    }

    /// Starts over with the next request's data, dropping every cached value.
    pub fn reset(&mut self, data: RawRequestData) {
        self.data = data;
        self.detected_uri = None;
        self.hydrated = OnceCell::new();
    }

    /// The request snapshot, including any query recovered by [`Input::uri`].
    pub fn raw(&self) -> &RawRequestData {
        &self.data
    }

    /// The canonical request path, detected once and cached.
    ///
    /// On the command line the path comes from the `uri` option or the first
    /// positional argument. Otherwise it is taken from the server variables,
    /// see [`uri::detect`]. When the request uri carries a second `?`
    /// (`index.php?` routing), the part after it replaces the query
    /// parameters and `QUERY_STRING`.
    ///
    /// # Errors
    ///
    /// [`InputError::UnableToDetectUri`] when no server variable holds a path.
    pub fn uri(&mut self) -> Result<&str, InputError> {
        let uri = match self.detected_uri.take() {
            Some(uri) => uri,
            None => self.detect_uri()?,
        };
        Ok(self.detected_uri.insert(uri).as_str())
    }

    fn detect_uri(&mut self) -> Result<String, InputError> {
        if let Some(cli) = &self.cli {
            let uri = cli.option(CliKey::Named("uri")).or_else(|| cli.option(CliKey::Position(1))).unwrap_or_default();
            debug!(uri, "detected uri from command line");
            return Ok(uri.to_owned());
        }

        let raw = uri::detect(&self.data, self.config.as_ref())?;
        if let Some(query) = &raw.query {
            self.data.replace_query(query);
        }

        let path = uri::strip_url_suffix(raw.path, self.config.get(URL_SUFFIX));
        Ok(self.sanitizer.clean_uri(&uri::normalize(&path)))
    }

    /// `REMOTE_ADDR`, or `default`.
    pub fn ip<'a>(&'a self, default: &'a str) -> &'a str {
        self.data.server_str(keys::REMOTE_ADDR).unwrap_or(default)
    }

    /// The client address as reported by proxies, falling back to `REMOTE_ADDR`.
    ///
    /// Checks `X-Cluster-Client-Ip`, `X-Forwarded-For` and `Client-Ip` in that
    /// order. These headers are client controlled unless a trusted proxy sets
    /// them, nothing here validates the chain.
    pub fn real_ip<'a>(&'a self, default: &'a str) -> &'a str {
        [keys::HTTP_X_CLUSTER_CLIENT_IP, keys::HTTP_X_FORWARDED_FOR, keys::HTTP_CLIENT_IP, keys::REMOTE_ADDR]
            .into_iter()
            .find_map(|key| self.data.server_str(key))
            .unwrap_or(default)
    }

    /// `"https"` when `HTTPS` is set to anything but `off`, otherwise `"http"`.
    pub fn protocol(&self) -> &'static str {
        match self.data.server_str(keys::HTTPS) {
            Some(https) if https != "off" => "https",
            _ => "http",
        }
    }

    /// Whether `X-Requested-With` is `XMLHttpRequest`, compared case-insensitively.
    pub fn is_ajax(&self) -> bool {
        self.data.server_str(keys::HTTP_X_REQUESTED_WITH).is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
    }

    /// The `Referer` header, or `default`.
    pub fn referrer<'a>(&'a self, default: &'a str) -> &'a str {
        self.data.server_str(keys::HTTP_REFERER).unwrap_or(default)
    }

    /// `REQUEST_METHOD`, or `default`.
    pub fn method<'a>(&'a self, default: &'a str) -> &'a str {
        self.data.server_str(keys::REQUEST_METHOD).unwrap_or(default)
    }

    /// The `User-Agent` header, or `default`.
    pub fn user_agent<'a>(&'a self, default: &'a str) -> &'a str {
        self.data.server_str(keys::HTTP_USER_AGENT).unwrap_or(default)
    }

    input_source!("query string", get_all, get, get_or, query);
    input_source!("posted form", post_all, post, post_or, post);
    input_source!("uploaded file", file_all, file, file_or, files);
    input_source!("cookie", cookie_all, cookie, cookie_or, cookies);
    input_source!("server variable", server_all, server, server_or, server);

    /// Body parameters of a PUT request, empty for any other method.
    pub fn put_all(&self) -> &InputMap {
        self.body_params(&Method::PUT)
    }

    /// A PUT body value; dotted keys walk into nested values.
    pub fn put(&self, key: &str) -> Option<&InputValue> {
        value::lookup(self.put_all(), key)
    }

    /// A PUT body value, or `default` when absent.
    pub fn put_or<'a>(&'a self, key: &str, default: &'a InputValue) -> &'a InputValue {
        self.put(key).unwrap_or(default)
    }

    /// Body parameters of a DELETE request, empty for any other method.
    pub fn delete_all(&self) -> &InputMap {
        self.body_params(&Method::DELETE)
    }

    /// A DELETE body value; dotted keys walk into nested values.
    pub fn delete(&self, key: &str) -> Option<&InputValue> {
        value::lookup(self.delete_all(), key)
    }

    /// A DELETE body value, or `default` when absent.
    pub fn delete_or<'a>(&'a self, key: &str, default: &'a InputValue) -> &'a InputValue {
        self.delete(key).unwrap_or(default)
    }

    /// Query, form and PUT/DELETE body parameters merged into one map.
    ///
    /// Form values override query values, body values override both.
    pub fn all(&self) -> &InputMap {
        &self.hydrate().all
    }

    /// A value from [`Input::all`]; dotted keys walk into nested values.
    pub fn param(&self, key: &str) -> Option<&InputValue> {
        value::lookup(self.all(), key)
    }

    /// A value from [`Input::all`], or `default` when absent.
    pub fn param_or<'a>(&'a self, key: &str, default: &'a InputValue) -> &'a InputValue {
        self.param(key).unwrap_or(default)
    }

    /// Same as [`Input::param`].
    #[deprecated(note = "use `param` instead")]
    pub fn get_post(&self, key: &str) -> Option<&InputValue> {
        self.param(key)
    }

    fn body_params(&self, method: &Method) -> &InputMap {
        match &self.hydrate().body {
            Some(body) if body.method == *method => &body.params,
            _ => &*EMPTY,
        }
    }

    fn hydrate(&self) -> &Hydrated {
        self.hydrated.get_or_init(|| {
            let mut all = self.data.query.clone();
            value::merge_into(&mut all, &self.data.post);

            // read straight from the snapshot, never through an accessor that hydrates
            let method = self
                .data
                .server_str(keys::REQUEST_METHOD)
                .and_then(|m| Method::from_bytes(m.as_bytes()).ok());

            let body = match method {
                Some(method) if method == Method::PUT || method == Method::DELETE => {
                    let params = parse::parse_form(&self.data.body.read_once());
                    value::merge_into(&mut all, &params);
                    Some(BodyParams { method, params })
                }
                _ => None,
            };

            debug!(params = all.len(), has_body = body.is_some(), "hydrated request input");
            Hydrated { all, body }
        })
    }
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Input")
            .field("data", &self.data)
            .field("cli", &self.cli.is_some())
            .field("detected_uri", &self.detected_uri)
            .field("hydrated", &self.hydrated.get().is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Input`].
pub struct InputBuilder {
    data: RawRequestData,
    config: Box<dyn ConfigProvider>,
    sanitizer: Box<dyn Sanitizer>,
    cli: Option<Box<dyn CliOptions>>,
}

impl InputBuilder {
    #[must_use]
    pub fn config<C: ConfigProvider + 'static>(mut self, config: C) -> Self {
        self.config = Box::new(config);
        self
    }

    /// Replaces the default [`HtmlEntities`] uri sanitizer.
    #[must_use]
    pub fn sanitizer<S: Sanitizer + 'static>(mut self, sanitizer: S) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    /// Marks the request as coming from the command line.
    #[must_use]
    pub fn cli<O: CliOptions + 'static>(mut self, options: O) -> Self {
        self.cli = Some(Box::new(options));
        self
    }

    pub fn build(self) -> Input {
        Input {
            data: self.data,
            config: self.config,
            sanitizer: self.sanitizer,
            cli: self.cli,
            detected_uri: None,
            hydrated: OnceCell::new(),
        }
    }
}

impl std::fmt::Debug for InputBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputBuilder").field("data", &self.data).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliArgs;
    use clap::Parser;
    use crate::config::QUERY_STRING_INDEX_FILE;
    use crate::security::Passthrough;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn input(data: RawRequestData) -> Input {
        Input::builder(data).sanitizer(Passthrough).build()
    }

    #[test]
    fn all_accessors_return_full_maps() {
        let mut files = InputMap::new();
        files.insert("name".into(), "cv.pdf".into());

        let data = RawRequestData::builder()
            .query_param("q", "1")
            .post_param("p", "2")
            .cookie("c", "3")
            .file("upload", files)
            .server_var("S", "4")
            .build();
        let expected_query = data.query().clone();
        let expected_server = data.server().clone();

        let input = input(data);
        assert_eq!(input.get_all(), &expected_query);
        assert_eq!(input.post_all().len(), 1);
        assert_eq!(input.cookie_all()["c"], "3");
        assert_eq!(input.file("upload.name").unwrap(), "cv.pdf");
        assert_eq!(input.server_all(), &expected_server);
    }

    #[test]
    fn absent_keys_fall_back() {
        let input = input(RawRequestData::builder().build());
        let fallback = InputValue::from("fallback");

        assert!(input.get("missing").is_none());
        assert!(input.post("missing").is_none());
        assert!(input.cookie("missing").is_none());
        assert!(input.server("missing").is_none());
        assert!(input.put("missing").is_none());
        assert!(input.param("missing").is_none());

        assert_eq!(input.get_or("missing", &fallback), "fallback");
        assert_eq!(input.post_or("missing", &fallback), "fallback");
        assert_eq!(input.file_or("missing", &fallback), "fallback");
        assert_eq!(input.cookie_or("missing", &fallback), "fallback");
        assert_eq!(input.server_or("missing", &fallback), "fallback");
        assert_eq!(input.put_or("missing", &fallback), "fallback");
        assert_eq!(input.delete_or("missing", &fallback), "fallback");
        assert_eq!(input.param_or("missing", &fallback), "fallback");

        assert_eq!(input.ip(DEFAULT_IP), "0.0.0.0");
        assert_eq!(input.real_ip(DEFAULT_IP), "0.0.0.0");
        assert_eq!(input.method(DEFAULT_METHOD), "GET");
        assert_eq!(input.referrer(""), "");
        assert_eq!(input.user_agent("unknown"), "unknown");
    }

    #[test]
    fn uri_is_detected_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let data = RawRequestData::builder().request_uri("/users/5").build();
        let mut input = Input::builder(data)
            .sanitizer(move |raw: &str| {
                counter.fetch_add(1, Ordering::SeqCst);
                raw.to_owned()
            })
            .build();

        let first = input.uri().unwrap().to_owned();
        let second = input.uri().unwrap().to_owned();
        assert_eq!(first, "/users/5");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sanitizer_receives_normalized_path() {
        let data = RawRequestData::builder().request_uri("/a//b/../c").build();
        let mut input = Input::builder(data)
            .sanitizer(|raw: &str| {
                assert_eq!(raw, "/a/c");
                format!("clean:{raw}")
            })
            .build();

        assert_eq!(input.uri().unwrap(), "clean:/a/c");
    }

    #[test]
    fn base_path_and_index_file_are_stripped() {
        let data = RawRequestData::builder().request_uri("/app/index.php/users/5?x=1").build();
        let mut input = Input::builder(data)
            .config(InputConfig::default().base_url("/app").index_file("index.php"))
            .build();

        assert_eq!(input.uri().unwrap(), "/users/5");
        assert_eq!(input.get("x").unwrap(), "1");
    }

    #[test]
    fn pass_through_query_repopulates_get() {
        let data = RawRequestData::builder().request_uri("/app/index.php?/users/5?x=1").build();
        let mut input = Input::builder(data)
            .config(InputConfig::default().base_url("/app").index_file(QUERY_STRING_INDEX_FILE))
            .build();

        // before detection the query is whatever the server parsed
        assert!(input.get("x").is_none());

        assert_eq!(input.uri().unwrap(), "/users/5");
        assert_eq!(input.get("x").unwrap(), "1");
        assert_eq!(input.server(keys::QUERY_STRING).unwrap(), "x=1");
    }

    #[test]
    fn url_suffix_is_stripped_before_sanitizing() {
        let data = RawRequestData::builder().server_var(keys::PATH_INFO, "/users/5.json").build();
        let mut input = Input::builder(data).config(InputConfig::default().url_suffix(".json")).build();
        assert_eq!(input.uri().unwrap(), "/users/5");
    }

    #[test]
    fn default_sanitizer_escapes_html() {
        let data = RawRequestData::builder().server_var(keys::PATH_INFO, "/search/<b>").build();
        let mut input = Input::new(data);
        assert_eq!(input.uri().unwrap(), "/search/&lt;b&gt;");
    }

    #[test]
    fn undetectable_uri() {
        let mut input = input(RawRequestData::builder().build());
        assert!(matches!(input.uri(), Err(InputError::UnableToDetectUri)));
    }

    #[test]
    fn cli_uri_option() {
        let data = RawRequestData::builder().request_uri("/ignored").build();
        let mut input = Input::builder(data).cli(CliArgs::parse_from(["micro-input-cgi", "--uri=/users/5"])).build();
        assert_eq!(input.uri().unwrap(), "/users/5");
    }

    #[test]
    fn cli_positional_argument() {
        let cli = CliArgs::parse_from(["micro-input-cgi", "--verbose", "welcome/index"]);
        let mut input = Input::builder(RawRequestData::default()).cli(cli).build();
        assert_eq!(input.uri().unwrap(), "welcome/index");

        let mut input = Input::builder(RawRequestData::default()).cli(CliArgs::parse_from(["micro-input-cgi"])).build();
        assert_eq!(input.uri().unwrap(), "");
    }

    #[test]
    fn protocol_detection() {
        let plain = input(RawRequestData::builder().build());
        assert_eq!(plain.protocol(), "http");

        let off = input(RawRequestData::builder().server_var(keys::HTTPS, "off").build());
        assert_eq!(off.protocol(), "http");

        let on = input(RawRequestData::builder().server_var(keys::HTTPS, "on").build());
        assert_eq!(on.protocol(), "https");

        let one = input(RawRequestData::builder().server_var(keys::HTTPS, "1").build());
        assert_eq!(one.protocol(), "https");
    }

    #[test]
    fn ajax_detection() {
        let lower = input(RawRequestData::builder().header("X-Requested-With", "xmlhttprequest").build());
        assert!(lower.is_ajax());

        let mixed = input(RawRequestData::builder().header("X-Requested-With", "XMLHttpRequest").build());
        assert!(mixed.is_ajax());

        let other = input(RawRequestData::builder().header("X-Requested-With", "fetch").build());
        assert!(!other.is_ajax());

        let absent = input(RawRequestData::builder().build());
        assert!(!absent.is_ajax());
    }

    #[test]
    fn real_ip_precedence() {
        let data = RawRequestData::builder()
            .server_var(keys::HTTP_X_CLUSTER_CLIENT_IP, "10.0.0.1")
            .server_var(keys::HTTP_X_FORWARDED_FOR, "10.0.0.2")
            .server_var(keys::HTTP_CLIENT_IP, "10.0.0.3")
            .server_var(keys::REMOTE_ADDR, "10.0.0.4")
            .build();
        let input = input(data);
        assert_eq!(input.real_ip(DEFAULT_IP), "10.0.0.1");
        assert_eq!(input.ip(DEFAULT_IP), "10.0.0.4");

        let data = RawRequestData::builder()
            .server_var(keys::HTTP_CLIENT_IP, "10.0.0.3")
            .server_var(keys::REMOTE_ADDR, "10.0.0.4")
            .build();
        assert_eq!(self::input(data).real_ip(DEFAULT_IP), "10.0.0.3");
    }

    #[test]
    fn passthrough_server_fields() {
        let data = RawRequestData::builder()
            .method("DELETE")
            .header("Referer", "https://example.com/")
            .header("User-Agent", "curl/7.79.1")
            .build();
        let input = input(data);
        assert_eq!(input.method(DEFAULT_METHOD), "DELETE");
        assert_eq!(input.referrer(""), "https://example.com/");
        assert_eq!(input.user_agent(""), "curl/7.79.1");
    }

    #[test]
    fn put_body_hydrates_on_first_param() {
        let data = RawRequestData::builder().method("PUT").body("name=val").build();
        let input = input(data);

        assert!(input.hydrated.get().is_none());
        assert_eq!(input.param("name").unwrap(), "val");
        assert!(input.hydrated.get().is_some());

        assert_eq!(input.put("name").unwrap(), "val");
        assert!(input.delete_all().is_empty());
        assert_eq!(input.all().len(), 1);
    }

    #[test]
    fn put_body_with_encoded_brackets() {
        let data = RawRequestData::builder().method("PUT").body("user%5Bname%5D=zava&tags%5B%5D=a").build();
        let input = input(data);

        assert_eq!(input.param("user.name").unwrap(), "zava");
        assert_eq!(input.put("tags.0").unwrap(), "a");
        assert!(input.all().get("user[name]").is_none());
    }

    #[test]
    fn delete_body_is_only_visible_through_delete() {
        let data = RawRequestData::builder().method("DELETE").body("id=7").build();
        let input = input(data);

        assert_eq!(input.delete("id").unwrap(), "7");
        assert!(input.put_all().is_empty());
        assert_eq!(input.param("id").unwrap(), "7");
    }

    #[test]
    fn body_is_read_once() {
        let data = RawRequestData::builder()
            .method("PUT")
            .body_reader(std::io::Cursor::new(b"name=val".to_vec()))
            .build();
        let input = input(data);

        assert_eq!(input.put("name").unwrap(), "val");
        assert_eq!(input.delete_all().len(), 0);
        assert_eq!(input.param("name").unwrap(), "val");
        assert_eq!(input.put_all().len(), 1);
    }

    #[test]
    fn merge_precedence() {
        let data = RawRequestData::builder()
            .method("PUT")
            .query_param("a", "query")
            .query_param("b", "query")
            .query_param("c", "query")
            .post_param("b", "post")
            .post_param("c", "post")
            .body("c=body")
            .build();
        let input = input(data);

        assert_eq!(input.param("a").unwrap(), "query");
        assert_eq!(input.param("b").unwrap(), "post");
        assert_eq!(input.param("c").unwrap(), "body");
    }

    #[test]
    fn post_request_body_is_not_merged() {
        let data = RawRequestData::builder().method("POST").post_param("a", "1").body("b=2").build();
        let input = input(data);
        assert_eq!(input.param("a").unwrap(), "1");
        assert!(input.param("b").is_none());
        assert!(input.put_all().is_empty());
    }

    #[test]
    #[allow(deprecated, reason = "the alias must keep working")]
    fn get_post_alias() {
        let data = RawRequestData::builder().query_param("a", "1").build();
        assert_eq!(input(data).get_post("a").unwrap(), "1");
    }

    #[test]
    fn reset_clears_caches() {
        let data = RawRequestData::builder().request_uri("/first").query_param("a", "1").build();
        let mut input = input(data);
        assert_eq!(input.uri().unwrap(), "/first");
        assert_eq!(input.param("a").unwrap(), "1");

        input.reset(RawRequestData::builder().request_uri("/second").build());
        assert_eq!(input.uri().unwrap(), "/second");
        assert!(input.param("a").is_none());
    }
}
