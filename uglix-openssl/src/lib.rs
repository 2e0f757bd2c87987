//! Thin wrappers around the `openssl` command-line tool
//!
//! Nothing cryptographic happens in this crate: every operation builds an
//! argument list, pipes bytes through an `openssl` child process and reads
//! back what it prints. Anything openssl writes to its error stream is
//! returned as [`OpensslError::Tool`] with the message untouched.
//!
//! OpenSSL 1.1.1 or later is required (`-pbkdf2`). LibreSSL, as shipped on
//! macOS, is not supported.
//!
//! | operation | openssl subcommand |
//! |-----------|--------------------|
//! | [`Openssl::encrypt`], [`Openssl::decrypt`] | `enc -base64 -pbkdf2` |
//! | [`Openssl::encrypt_raw`], [`Openssl::decrypt_raw`] | `enc -pbkdf2` |
//! | [`Openssl::encrypt_public`], [`Openssl::decrypt_private`] | `pkeyutl` |
//! | [`Openssl::sign`], [`Openssl::verify`] | `dgst -sha256` |
//! | [`Openssl::generate_private_key`] | `genpkey` (RSA 2048) |
//! | [`Openssl::public_key_from_private`] | `pkey -pubout` |
//! | [`Openssl::public_key_from_certificate`] | `x509 -pubkey` |
//!
//! # Example
//!
//! ```no_run
//! use uglix_openssl::Openssl;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let openssl = Openssl::from_env();
//! openssl.generate_private_key("key_private.pem")?;
//! let public_key = openssl.public_key_from_private("key_private.pem")?;
//!
//! let signature = openssl.sign("challenge", "key_private.pem")?;
//! assert!(openssl.verify("challenge", &signature, &public_key)?);
//! # Ok(())
//! # }
//! ```

mod command;
mod error;
mod keys;
mod signature;
mod symmetric;

pub use command::{DEFAULT_PROGRAM, Openssl, PROGRAM_ENV};
pub use error::OpensslError;
pub use keys::{DEFAULT_PRIVATE_KEY_FILE, RSA_BITS};
pub use symmetric::{DEFAULT_CIPHER, wrap_base64};
