//! Error types for the UGLIX HTTP client

use crate::payload::Payload;
use thiserror::Error;

/// Errors that can occur when talking to UGLIX
#[derive(Error, Debug)]
pub enum UglixError {
    /// HTTP request failed (connection, invalid URL, body read)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    ///
    /// The body is decoded exactly like a successful one, since UGLIX
    /// usually explains what went wrong in it.
    #[error("ERROR {code}, {message}")]
    Server {
        /// The HTTP status code
        code: u16,
        /// The decoded response body
        message: Payload,
    },

    /// Failed to encode or decode a JSON body
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A `text/plain` body was not valid UTF-8
    #[error("Failed to decode response as UTF-8")]
    Encoding,

    /// A header value could not be built
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    /// Client initialization failed
    #[error("Client initialization failed: {0}")]
    ClientInit(String),
}

impl UglixError {
    /// Status code of a server error, if this is one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            UglixError::Server { code, .. } => Some(*code),
            _ => None,
        }
    }
}
