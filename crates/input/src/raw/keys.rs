//! CGI style server variable names.

pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
pub const REQUEST_URI: &str = "REQUEST_URI";
pub const QUERY_STRING: &str = "QUERY_STRING";
pub const PATH_INFO: &str = "PATH_INFO";
pub const ORIG_PATH_INFO: &str = "ORIG_PATH_INFO";
pub const SCRIPT_NAME: &str = "SCRIPT_NAME";
pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
pub const GATEWAY_INTERFACE: &str = "GATEWAY_INTERFACE";
pub const CONTENT_TYPE: &str = "CONTENT_TYPE";
pub const CONTENT_LENGTH: &str = "CONTENT_LENGTH";
pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
pub const HTTPS: &str = "HTTPS";

pub const HTTP_X_CLUSTER_CLIENT_IP: &str = "HTTP_X_CLUSTER_CLIENT_IP";
pub const HTTP_X_FORWARDED_FOR: &str = "HTTP_X_FORWARDED_FOR";
pub const HTTP_CLIENT_IP: &str = "HTTP_CLIENT_IP";
pub const HTTP_X_REQUESTED_WITH: &str = "HTTP_X_REQUESTED_WITH";
pub const HTTP_REFERER: &str = "HTTP_REFERER";
pub const HTTP_USER_AGENT: &str = "HTTP_USER_AGENT";
pub const HTTP_COOKIE: &str = "HTTP_COOKIE";

/// Maps a header name to its server variable, `User-Agent` becomes `HTTP_USER_AGENT`.
///
/// `Content-Type` and `Content-Length` map to `CONTENT_TYPE` and `CONTENT_LENGTH`
/// without the prefix.
pub fn header_var(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase().replace('-', "_");
    match upper.as_str() {
        CONTENT_TYPE | CONTENT_LENGTH => upper,
        _ => format!("HTTP_{upper}"),
    }
}
