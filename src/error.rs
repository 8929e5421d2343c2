//! Unified error type.

use thiserror::Error;

/// The error type returned by reef's fallible operations.
///
/// Only startup can fail this way: loading configuration, installing the log
/// sink, compiling the route table, binding the listener. Everything that
/// goes wrong while serving a request is reported to the caller as a
/// [`Status`](crate::Status) in the response envelope instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{addr}`: {source}")]
    InvalidAddr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("config `{path}`: {message}")]
    Config { path: String, message: String },

    #[error("cannot register route `{path}`: {source}")]
    Route {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("cannot render doc page `{path}`: {source}")]
    Doc {
        path: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("log sink: {0}")]
    Log(String),
}
