use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("unable to detect the URI")]
    UnableToDetectUri,

    #[error("invalid input config: {source}")]
    InvalidConfig {
        #[from]
        source: serde_json::Error,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl InputError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
