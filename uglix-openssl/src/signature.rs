//! SHA-256 signatures (`openssl dgst`)

use crate::command::{Openssl, ToolOutput};
use crate::error::OpensslError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Substring of openssl's stdout that marks a rejected signature
///
/// Older releases print `Verification Failure`, newer ones
/// `Verification failure`; it is matched case-insensitively.
const FAILURE_MARKER: &str = "failure";

const SUCCESS_MARKER: &str = "Verified OK";

fn sign_args(private_key_file: &Path) -> Vec<OsString> {
    vec![
        "dgst".into(),
        "-sha256".into(),
        "-sign".into(),
        private_key_file.into(),
    ]
}

fn verify_args(public_key_file: &Path, signature_file: &Path) -> Vec<OsString> {
    vec![
        "dgst".into(),
        "-sha256".into(),
        "-verify".into(),
        public_key_file.into(),
        "-signature".into(),
        signature_file.into(),
    ]
}

/// Turn the output of `dgst -verify` into a verdict
///
/// A rejected signature makes openssl exit non-zero (and some versions add
/// an error trace on stderr), so the stdout verdict is checked first.
fn verdict(output: ToolOutput) -> Result<bool, OpensslError> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.to_ascii_lowercase().contains(FAILURE_MARKER) {
        return Ok(false);
    }
    if stdout.contains(SUCCESS_MARKER) {
        return Ok(true);
    }
    output.into_stdout().map(|_| true)
}

fn temp_file_with(contents: &[u8]) -> Result<NamedTempFile, OpensslError> {
    let mut file = tempfile::Builder::new().prefix("uglix-").tempfile()?;
    file.write_all(contents)?;
    file.flush()?;
    Ok(file)
}

impl Openssl {
    /// Sign the SHA-256 digest of `document` and return the base64 signature
    pub fn sign(
        &self,
        document: impl AsRef<[u8]>,
        private_key_file: impl AsRef<Path>,
    ) -> Result<String, OpensslError> {
        let signature = self
            .run(
                sign_args(private_key_file.as_ref()),
                Some(document.as_ref()),
                None,
            )?
            .into_stdout()?;
        Ok(STANDARD.encode(signature))
    }

    /// Check a base64 signature of `document` against a PEM public key
    ///
    /// The key and the decoded signature are written to temporary files that
    /// are removed once openssl is done. Returns `Ok(false)` for a signature
    /// that does not match, and an error only when openssl itself fails.
    pub fn verify(
        &self,
        document: impl AsRef<[u8]>,
        signature: &str,
        public_key_pem: &str,
    ) -> Result<bool, OpensslError> {
        let compact: String = signature.chars().filter(|c| !c.is_whitespace()).collect();
        let signature = STANDARD.decode(compact)?;

        let key_file = temp_file_with(public_key_pem.as_bytes())?;
        let signature_file = temp_file_with(&signature)?;

        let output = self.run(
            verify_args(key_file.path(), signature_file.path()),
            Some(document.as_ref()),
            None,
        )?;
        verdict(output)
    }

    /// Like [`Openssl::verify`], taking the signer's certificate instead of a bare key
    pub fn verify_with_certificate(
        &self,
        document: impl AsRef<[u8]>,
        signature: &str,
        certificate_pem: &str,
    ) -> Result<bool, OpensslError> {
        let public_key = self.public_key_from_certificate(certificate_pem)?;
        self.verify(document, signature, &public_key)
    }
}
