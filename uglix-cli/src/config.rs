//! Configuration resolution from CLI args

use crate::cli::Args;
use crate::error::CliError;
use std::io::Read;
use std::path::{Path, PathBuf};
use uglix_client::Connection;
use uglix_openssl::Openssl;
use zeroize::Zeroizing;

/// Resolved runtime configuration shared by every subcommand
pub struct Config {
    /// Base URL for the UGLIX connection
    pub base_url: String,
    /// Session cookie to start with (zeroized on drop)
    pub cookie: Option<Zeroizing<String>>,
    /// Whether to print newly issued cookies
    pub print_cookie: bool,
    /// openssl executable
    pub openssl: Openssl,
    /// Quiet mode
    pub quiet: bool,
}

impl Config {
    /// Build config from the global CLI args
    pub fn from_args(args: &Args) -> Self {
        let openssl = match &args.openssl {
            Some(program) => Openssl::with_program(expand_tilde(program)),
            None => Openssl::from_env(),
        };

        Config {
            base_url: args.base_url.clone(),
            cookie: args
                .cookie
                .as_ref()
                .filter(|c| !c.is_empty())
                .map(|c| Zeroizing::new(c.clone())),
            print_cookie: args.print_cookie,
            openssl,
            quiet: args.quiet,
        }
    }

    /// Open a connection with the configured base URL and cookie
    pub fn connect(&self) -> Result<Connection, CliError> {
        let mut builder = Connection::builder().base_url(self.base_url.as_str())?;
        if let Some(cookie) = &self.cookie {
            builder = builder.session(cookie.as_str());
        }
        Ok(builder.build()?)
    }
}

/// Expand ~ to home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str()
        && (path_str.starts_with("~/") || path_str == "~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(path_str.get(2..).unwrap_or_default());
    }
    path.to_path_buf()
}

/// Use the given passphrase, or prompt for one without echo
pub fn resolve_passphrase(given: Option<&str>) -> Result<Zeroizing<String>, CliError> {
    match given {
        Some(passphrase) if !passphrase.is_empty() => Ok(Zeroizing::new(passphrase.to_string())),
        _ => prompt_passphrase(),
    }
}

fn prompt_passphrase() -> Result<Zeroizing<String>, CliError> {
    let s = rpassword::prompt_password("Passphrase: ")
        .map_err(|e| CliError::Config(format!("Failed to read passphrase: {}", e)))?;
    if s.is_empty() {
        return Err(CliError::Config("A passphrase is required.".to_string()));
    }
    Ok(Zeroizing::new(s))
}

/// Read a file, or all of stdin when no file is given
pub fn read_input(file: Option<&Path>) -> Result<Vec<u8>, CliError> {
    match file {
        Some(path) => Ok(std::fs::read(expand_tilde(path))?),
        None => {
            let mut buffer = Vec::new();
            std::io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Like [`read_input`], requiring UTF-8 text
pub fn read_text_input(file: Option<&Path>) -> Result<String, CliError> {
    String::from_utf8(read_input(file)?)
        .map_err(|_| CliError::Config("Input is not valid UTF-8 text".to_string()))
}
