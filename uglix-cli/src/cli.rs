//! CLI argument parsing using clap

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use uglix_client::{DEFAULT_BASE_URL, OCTET_STREAM};
use uglix_openssl::{DEFAULT_CIPHER, DEFAULT_PRIVATE_KEY_FILE};

/// UGLIX client and openssl helpers
#[derive(Parser, Debug)]
#[command(name = "uglix", about = "Talk to the UGLIX system and run the openssl helpers", version)]
pub struct Args {
    /// Base URL every request path is appended to
    #[arg(long, env = "UGLIX_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Session cookie to start with
    #[arg(long, env = "UGLIX_SESSION", hide_env_values = true, global = true)]
    pub cookie: Option<String>,

    /// Print the session cookie on stderr when the server issues a new one
    #[arg(long, global = true)]
    pub print_cookie: bool,

    /// openssl executable to run (default: $UGLIX_OPENSSL, then openssl)
    #[arg(long, global = true)]
    pub openssl: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only print results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Passphrase and cipher for symmetric encryption
#[derive(ClapArgs, Debug, Clone)]
pub struct SecretArgs {
    /// Passphrase (prompted for when absent)
    #[arg(long, env = "UGLIX_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// openssl cipher name
    #[arg(long, default_value = DEFAULT_CIPHER)]
    pub cipher: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// GET a path
    Get { path: String },

    /// POST named fields as a JSON object
    Post {
        path: String,
        /// Field as key=value; the value is parsed as JSON, or taken as a string
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, serde_json::Value)>,
    },

    /// PUT text (or a file, or stdin) as the request body
    Put {
        path: String,
        /// Body text
        #[arg(conflicts_with = "file")]
        content: Option<String>,
        /// Read the body from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// POST a file (or stdin) verbatim with an explicit content type
    PostRaw {
        path: String,
        /// Read the body from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
        /// Content-Type header sent with the body
        #[arg(long, default_value = OCTET_STREAM)]
        content_type: String,
    },

    /// Read a mailbox, or one message of it
    Mail {
        user: String,
        /// Message number
        message: Option<u32>,
        /// Appended after the message number, e.g. /reply
        #[arg(default_value = "")]
        suffix: String,
    },

    /// Encrypt stdin (or a file) with a passphrase; prints base64
    Encrypt {
        #[command(flatten)]
        secret: SecretArgs,
        /// Read the plaintext from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Decrypt base64 from stdin (or a file) with a passphrase
    Decrypt {
        #[command(flatten)]
        secret: SecretArgs,
        /// Read the base64 ciphertext from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Encrypt stdin (or a file) for a public key; prints base64
    EncryptPublic {
        /// Public key file (PEM)
        #[arg(long)]
        key: PathBuf,
        /// Read the plaintext from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Decrypt base64 from stdin (or a file) with a private key
    DecryptPrivate {
        /// Private key file (PEM)
        #[arg(long)]
        key: PathBuf,
        /// Read the base64 ciphertext from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Sign stdin (or a file) with SHA-256; prints the base64 signature
    Sign {
        /// Private key file (PEM)
        #[arg(long)]
        key: PathBuf,
        /// Read the document from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Verify a base64 signature of stdin (or a file); exits 2 when invalid
    Verify {
        /// Base64 signature
        #[arg(long)]
        signature: String,
        /// Signer's public key file (PEM)
        #[arg(long, conflicts_with = "certificate", required_unless_present = "certificate")]
        public_key: Option<PathBuf>,
        /// Signer's certificate file (PEM)
        #[arg(long)]
        certificate: Option<PathBuf>,
        /// Read the signed document from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Generate a 2048-bit RSA private key
    Genkey {
        #[arg(long, default_value = DEFAULT_PRIVATE_KEY_FILE)]
        out: PathBuf,
    },

    /// Print the public key of a private key or certificate
    Pubkey {
        /// Private key file (PEM)
        #[arg(long, conflicts_with = "certificate", required_unless_present = "certificate")]
        private: Option<PathBuf>,
        /// Certificate file (PEM)
        #[arg(long)]
        certificate: Option<PathBuf>,
    },
}

/// Parse `key=value`, reading the value as JSON when it is valid JSON
pub fn parse_field(s: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty field name in '{}'", s));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
