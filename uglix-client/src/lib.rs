//! UGLIX HTTP Client Library
//!
//! A small blocking client for the UGLIX exercise system. A [`Connection`]
//! prefixes every path with its base URL, keeps the session cookie the
//! server hands out, and decodes response bodies by content type.
//!
//! # Features
//!
//! - Session cookie captured from `Set-Cookie` and replayed as `Cookie`
//! - JSON, text and raw-byte request bodies
//! - Response bodies decoded to [`Payload::Json`], [`Payload::Text`] or [`Payload::Bytes`]
//! - Non-2xx responses surfaced as [`UglixError::Server`] with the decoded body
//! - Secure TLS using rustls
//! - Blocking synchronous API
//!
//! # Example
//!
//! ```no_run
//! use uglix_client::{Connection, UglixError};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut c = Connection::new()?;
//!
//! // Log in; the session cookie is remembered
//! c.post("/bin/login", &json!({"user": "alice", "password": "secret"}))?;
//!
//! // Later requests carry the cookie
//! println!("{}", c.get("/home/alice/INBOX")?);
//!
//! match c.get("/bin/foobar") {
//!     Err(UglixError::Server { code, message }) => println!("{}: {}", code, message),
//!     other => println!("{:?}", other),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod payload;

pub use client::{Connection, ConnectionBuilder, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use error::UglixError;
pub use payload::{APPLICATION_JSON, OCTET_STREAM, Payload, TEXT_PLAIN};
