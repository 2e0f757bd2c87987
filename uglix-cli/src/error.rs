//! Error types for the CLI

use thiserror::Error;

/// Main CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration or usage error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the UGLIX connection (including server-side errors)
    #[error("{0}")]
    Http(#[from] uglix_client::UglixError),

    /// Error from the openssl wrappers
    #[error("openssl: {0}")]
    Openssl(#[from] uglix_openssl::OpensslError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
