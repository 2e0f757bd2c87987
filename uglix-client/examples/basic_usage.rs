//! Basic usage example for the UGLIX client
//!
//! This example demonstrates how to:
//! - Create a connection with default or custom settings
//! - Send GET and POST requests
//! - Inspect decoded payloads and server errors
//!
//! Set `UGLIX_BASE_URL` to point it at another server.

use serde_json::json;
use std::time::Duration;
use uglix_client::{Connection, Payload, UglixError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut c = match std::env::var("UGLIX_BASE_URL") {
        Ok(url) => Connection::builder()
            .base_url(url)?
            .client_builder(reqwest::blocking::Client::builder().timeout(Duration::from_secs(30)))
            .build()?,
        Err(_) => Connection::new()?,
    };
    println!("Connected to {}", c.base_url());

    // Plain text answer
    match c.get("/bin/echo")? {
        Payload::Text(text) => println!("echo says: {}", text),
        other => println!("unexpected payload: {:?}", other),
    }

    // JSON round trip
    let reply = c.post(
        "/bin/echo",
        &json!({"string_example": "toto", "list_example": [true, 42, {"foo": "bar"}]}),
    )?;
    println!("{}", reply);

    // Server-side errors carry the HTTP status and the decoded body
    match c.get("/bin/foobar") {
        Err(UglixError::Server { code, message }) => println!("ERROR {}: {}", code, message),
        Err(e) => return Err(e.into()),
        Ok(payload) => println!("surprisingly got {}", payload),
    }

    if let Some(cookie) = c.session() {
        println!("session cookie: {}", cookie);
    }
    c.close_session();

    Ok(())
}
