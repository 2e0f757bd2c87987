//! Symmetric encryption with a passphrase (`openssl enc`)

use crate::command::{Openssl, PASSPHRASE_ENV};
use crate::error::OpensslError;
use std::ffi::OsString;
use std::path::Path;

/// Cipher used by the UGLIX exercises unless told otherwise
pub const DEFAULT_CIPHER: &str = "aes-128-cbc";

/// Column width openssl expects when reading base64
const BASE64_LINE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Encrypt,
    Decrypt,
}

fn enc_args(mode: Mode, cipher: &str, base64: bool, input_file: Option<&Path>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["enc".into()];
    if mode == Mode::Decrypt {
        args.push("-d".into());
    }
    if base64 {
        args.push("-base64".into());
    }
    args.push(format!("-{}", cipher.trim_start_matches('-')).into());
    args.push("-pbkdf2".into());
    args.push("-pass".into());
    args.push(format!("env:{}", PASSPHRASE_ENV).into());
    if let Some(path) = input_file {
        args.push("-in".into());
        args.push(path.into());
    }
    args
}

/// Re-flow base64 text into the 64-column lines `openssl enc -d -base64` wants
///
/// Whitespace already present is discarded first, so both single-line
/// base64 (as servers usually send it) and openssl's own output work.
pub fn wrap_base64(text: &str) -> String {
    let mut wrapped = String::with_capacity(text.len() + text.len() / BASE64_LINE + 1);
    for (i, c) in text.chars().filter(|c| !c.is_whitespace()).enumerate() {
        if i > 0 && i % BASE64_LINE == 0 {
            wrapped.push('\n');
        }
        wrapped.push(c);
    }
    wrapped.push('\n');
    wrapped
}

impl Openssl {
    /// Encrypt with a passphrase-derived key (PBKDF2) and return base64 text
    ///
    /// Strings are encrypted as their UTF-8 encoding. The returned text is
    /// openssl's own output: base64 wrapped at 64 columns.
    pub fn encrypt(
        &self,
        plaintext: impl AsRef<[u8]>,
        passphrase: &str,
        cipher: &str,
    ) -> Result<String, OpensslError> {
        self.run(
            enc_args(Mode::Encrypt, cipher, true, None),
            Some(plaintext.as_ref()),
            Some(passphrase),
        )?
        .into_text()
    }

    /// Encrypt like [`Openssl::encrypt`] but return the raw ciphertext
    pub fn encrypt_raw(
        &self,
        plaintext: impl AsRef<[u8]>,
        passphrase: &str,
        cipher: &str,
    ) -> Result<Vec<u8>, OpensslError> {
        self.run(
            enc_args(Mode::Encrypt, cipher, false, None),
            Some(plaintext.as_ref()),
            Some(passphrase),
        )?
        .into_stdout()
    }

    /// Decrypt base64 ciphertext and return the plaintext as text
    pub fn decrypt(
        &self,
        ciphertext: &str,
        passphrase: &str,
        cipher: &str,
    ) -> Result<String, OpensslError> {
        let input = wrap_base64(ciphertext);
        self.run(
            enc_args(Mode::Decrypt, cipher, true, None),
            Some(input.as_bytes()),
            Some(passphrase),
        )?
        .into_text()
    }

    /// Decrypt raw ciphertext bytes, such as a binary error reply from UGLIX
    pub fn decrypt_raw(
        &self,
        ciphertext: impl AsRef<[u8]>,
        passphrase: &str,
        cipher: &str,
    ) -> Result<Vec<u8>, OpensslError> {
        self.run(
            enc_args(Mode::Decrypt, cipher, false, None),
            Some(ciphertext.as_ref()),
            Some(passphrase),
        )?
        .into_stdout()
    }

    /// Decrypt a file holding base64 ciphertext
    pub fn decrypt_file(
        &self,
        path: impl AsRef<Path>,
        passphrase: &str,
        cipher: &str,
    ) -> Result<String, OpensslError> {
        self.run(
            enc_args(Mode::Decrypt, cipher, true, Some(path.as_ref())),
            None,
            Some(passphrase),
        )?
        .into_text()
    }
}
