//! Per-request access to HTTP input
//!
//! This crate gives application code one place to read everything a request
//! carries: query parameters, posted forms, PUT/DELETE bodies, cookies,
//! uploaded-file descriptors, CGI style server variables and a handful of
//! derived facts such as the client address, the protocol or whether the
//! request was made through `XMLHttpRequest`.
//!
//! # Example
//!
//! ```
//! use micro_input::{Input, InputConfig, InputValue, RawRequestData, DEFAULT_IP};
//!
//! let data = RawRequestData::builder()
//!     .method("GET")
//!     .request_uri("/blog/index.php/posts/7.html?page=2")
//!     .server_var("REMOTE_ADDR", "192.168.1.10")
//!     .build();
//!
//! let config = InputConfig::default().base_url("/blog/").index_file("index.php").url_suffix(".html");
//! let mut input = Input::builder(data).config(config).build();
//!
//! assert_eq!(input.uri().unwrap(), "/posts/7");
//! assert_eq!(input.get("page").unwrap(), "2");
//! assert_eq!(input.param_or("sort", &InputValue::from("date")), "date");
//! assert_eq!(input.ip(DEFAULT_IP), "192.168.1.10");
//! assert_eq!(input.protocol(), "http");
//! ```
//!
//! # Architecture
//!
//! - [`RawRequestData`]: the snapshot a transport collected for one request.
//!   Built by hand, from CGI environment variables or from an [`http::Request`].
//! - [`Input`]: the facade. It detects the request URI (see [`uri`]) and
//!   merges query, form and body parameters lazily, each at most once.
//! - Collaborators behind traits: [`ConfigProvider`] for the `index_file`,
//!   `base_url` and `url_suffix` settings, [`Sanitizer`] for the final URI
//!   clean up and [`CliOptions`] for requests coming from the command line.
//!
//! # Error Handling
//!
//! Missing keys are never errors, every accessor has a fallback. The only
//! hard failure is [`InputError::UnableToDetectUri`], raised when the server
//! provides no variable to take the request path from.

mod error;
mod input;
mod security;
mod value;

pub mod cli;
pub mod config;
pub mod parse;
pub mod raw;
pub mod uri;

pub use cli::{CliArgs, CliKey, CliOptions};
pub use config::{ConfigProvider, InputConfig};
pub use error::InputError;
pub use input::{DEFAULT_IP, DEFAULT_METHOD, Input, InputBuilder};
pub use raw::{RawRequestData, RequestBody};
pub use security::{HtmlEntities, Passthrough, Sanitizer};
pub use value::{InputMap, InputValue, lookup};
