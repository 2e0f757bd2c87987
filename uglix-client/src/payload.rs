//! Response body decoding

use crate::error::UglixError;
use std::fmt;

/// Media type that decodes to [`Payload::Json`]
pub const APPLICATION_JSON: &str = "application/json";
/// Media type prefix that decodes to [`Payload::Text`]
pub const TEXT_PLAIN: &str = "text/plain";
/// Default content type for [`Connection::post_raw`](crate::Connection::post_raw)
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `application/json` body
    Json(serde_json::Value),
    /// `text/plain` body
    Text(String),
    /// Anything else, passed through unchanged
    Bytes(Vec<u8>),
}

impl Payload {
    /// Decode a raw body according to its `Content-Type` header
    ///
    /// Only the media type essence is compared (parameters such as
    /// `charset` are ignored), case-insensitively. A missing or unknown
    /// content type leaves the bytes untouched.
    pub fn decode(content_type: Option<&str>, body: Vec<u8>) -> Result<Self, UglixError> {
        let Some(content_type) = content_type else {
            return Ok(Payload::Bytes(body));
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();

        if essence.eq_ignore_ascii_case(APPLICATION_JSON) {
            return Ok(Payload::Json(serde_json::from_slice(&body)?));
        }
        if essence.eq_ignore_ascii_case(TEXT_PLAIN) {
            return String::from_utf8(body)
                .map(Payload::Text)
                .map_err(|_| UglixError::Encoding);
        }
        Ok(Payload::Bytes(body))
    }

    /// The JSON value, if this is a JSON payload
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The text, if this is a text payload
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The raw bytes, if this is a byte payload
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Convert into bytes, re-encoding text and JSON
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Json(value) => value.to_string().into_bytes(),
            Payload::Text(text) => text.into_bytes(),
            Payload::Bytes(bytes) => bytes,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Json(value) => match serde_json::to_string_pretty(value) {
                Ok(pretty) => f.write_str(&pretty),
                Err(_) => write!(f, "{}", value),
            },
            Payload::Text(text) => f.write_str(text),
            Payload::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}
