//! Output formatting for command results

use crate::commands::Outcome;
use std::io::{self, Write};
use uglix_client::Payload;

/// Output formatter for command results
pub struct OutputFormatter {
    quiet: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Write a result to stdout
    pub fn print(&self, outcome: &Outcome) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&self.render(outcome))?;
        stdout.flush()
    }

    /// Bytes to print for a result
    ///
    /// JSON is pretty-printed, text gets a trailing newline if it lacks one,
    /// raw bytes are written untouched.
    pub fn render(&self, outcome: &Outcome) -> Vec<u8> {
        match outcome {
            Outcome::Reply(Payload::Bytes(bytes)) => bytes.clone(),
            Outcome::Reply(payload) => with_newline(payload.to_string()),
            Outcome::Text(text) => with_newline(text.clone()),
            Outcome::Verdict(valid) => match (self.quiet, *valid) {
                (true, true) => b"true\n".to_vec(),
                (true, false) => b"false\n".to_vec(),
                (false, true) => b"Signature OK\n".to_vec(),
                (false, false) => b"Signature INVALID\n".to_vec(),
            },
            Outcome::KeyWritten(path) if self.quiet => with_newline(path.display().to_string()),
            Outcome::KeyWritten(path) => {
                with_newline(format!("Private key written to {}", path.display()))
            }
        }
    }
}

fn with_newline(mut text: String) -> Vec<u8> {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text.into_bytes()
}
