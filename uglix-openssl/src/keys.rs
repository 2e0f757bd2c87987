//! RSA keys and public-key encryption (`genpkey`, `pkey`, `x509`, `pkeyutl`)

use crate::command::Openssl;
use crate::error::OpensslError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use tracing::info;

/// File name used for generated private keys when the caller has no preference
pub const DEFAULT_PRIVATE_KEY_FILE: &str = "key_private.pem";

/// Modulus size of generated RSA keys
pub const RSA_BITS: u32 = 2048;

fn genpkey_args() -> Vec<OsString> {
    vec![
        "genpkey".into(),
        "-algorithm".into(),
        "RSA".into(),
        "-pkeyopt".into(),
        format!("rsa_keygen_bits:{}", RSA_BITS).into(),
    ]
}

fn pkeyutl_args(encrypt: bool, key_file: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["pkeyutl".into()];
    if encrypt {
        args.push("-encrypt".into());
        args.push("-pubin".into());
    } else {
        args.push("-decrypt".into());
    }
    args.push("-inkey".into());
    args.push(key_file.into());
    args
}

impl Openssl {
    /// Generate a fresh 2048-bit RSA private key and return it as PEM
    ///
    /// genpkey reports progress on stderr, so only a failed exit counts as
    /// an error here.
    pub fn generate_private_key_pem(&self) -> Result<String, OpensslError> {
        let output = self.run(genpkey_args(), None, None)?;
        if !output.success {
            if !output.stderr.is_empty() {
                return Err(OpensslError::Tool(output.stderr));
            }
            return Err(OpensslError::Exit { code: output.code });
        }
        Ok(String::from_utf8(output.stdout)?)
    }

    /// Generate a private key and write it to `path`
    pub fn generate_private_key(&self, path: impl AsRef<Path>) -> Result<(), OpensslError> {
        let pem = self.generate_private_key_pem()?;
        fs::write(path.as_ref(), pem)?;
        info!(path = %path.as_ref().display(), "private key written");
        Ok(())
    }

    /// Derive the PEM public key from a private key file
    pub fn public_key_from_private(
        &self,
        private_key_file: impl AsRef<Path>,
    ) -> Result<String, OpensslError> {
        let args = vec![
            "pkey".into(),
            "-in".into(),
            private_key_file.as_ref().into(),
            "-pubout".into(),
        ];
        self.run(args, None, None)?.into_text()
    }

    /// Extract the PEM public key from a PEM certificate
    pub fn public_key_from_certificate(
        &self,
        certificate: impl AsRef<[u8]>,
    ) -> Result<String, OpensslError> {
        let args = vec!["x509".into(), "-pubkey".into(), "-noout".into()];
        self.run(args, Some(certificate.as_ref()), None)?
            .into_text()
    }

    /// Encrypt for the holder of a public key and return base64 text
    ///
    /// RSA can only encrypt short messages (a session key, a challenge).
    pub fn encrypt_public(
        &self,
        plaintext: impl AsRef<[u8]>,
        public_key_file: impl AsRef<Path>,
    ) -> Result<String, OpensslError> {
        let ciphertext = self
            .run(
                pkeyutl_args(true, public_key_file.as_ref()),
                Some(plaintext.as_ref()),
                None,
            )?
            .into_stdout()?;
        Ok(STANDARD.encode(ciphertext))
    }

    /// Decrypt base64 ciphertext with a private key file
    pub fn decrypt_private(
        &self,
        ciphertext: &str,
        private_key_file: impl AsRef<Path>,
    ) -> Result<String, OpensslError> {
        let compact: String = ciphertext.chars().filter(|c| !c.is_whitespace()).collect();
        let raw = STANDARD.decode(compact)?;
        self.run(
            pkeyutl_args(false, private_key_file.as_ref()),
            Some(raw.as_slice()),
            None,
        )?
        .into_text()
    }
}
