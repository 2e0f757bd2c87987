//! Error types for the openssl wrappers

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while driving the openssl executable
#[derive(Error, Debug)]
pub enum OpensslError {
    /// openssl wrote to its error stream; the text is kept verbatim
    #[error("{0}")]
    Tool(String),

    /// openssl failed without explaining itself on stderr
    #[error("openssl exited unsuccessfully ({})", .code.map_or_else(|| "killed by signal".to_string(), |c| format!("code {}", c)))]
    Exit {
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
    },

    /// The executable could not be started
    #[error("Failed to run {}: {source}", .program.display())]
    Spawn {
        /// Program that was invoked
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Pipe or temporary file IO failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Caller-supplied base64 could not be decoded
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// openssl produced text that is not UTF-8
    #[error("openssl output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
