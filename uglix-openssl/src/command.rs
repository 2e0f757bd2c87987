//! Spawning openssl and piping bytes through it

use crate::error::OpensslError;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Program name used when nothing else is configured
pub const DEFAULT_PROGRAM: &str = "openssl";

/// Environment variable consulted by [`Openssl::from_env`]
pub const PROGRAM_ENV: &str = "UGLIX_OPENSSL";

/// Child-only variable carrying the passphrase (`-pass env:...`)
pub(crate) const PASSPHRASE_ENV: &str = "UGLIX_OPENSSL_PASS";

/// Handle on the openssl executable
///
/// The handle only remembers which program to run; every operation is an
/// independent process invocation.
///
/// # Example
///
/// ```no_run
/// use uglix_openssl::{DEFAULT_CIPHER, Openssl};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let openssl = Openssl::new();
/// let c = openssl.encrypt("texte avec caractères accentués", "foobar", DEFAULT_CIPHER)?;
/// let m = openssl.decrypt(&c, "foobar", DEFAULT_CIPHER)?;
/// assert_eq!(m, "texte avec caractères accentués");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Openssl {
    program: PathBuf,
}

/// What a finished openssl process left behind
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl ToolOutput {
    /// Stdout, provided stderr is empty and the process succeeded
    pub fn into_stdout(self) -> Result<Vec<u8>, OpensslError> {
        if !self.stderr.is_empty() {
            return Err(OpensslError::Tool(self.stderr));
        }
        if !self.success {
            return Err(OpensslError::Exit { code: self.code });
        }
        Ok(self.stdout)
    }

    /// Stdout as text, under the same rules as [`ToolOutput::into_stdout`]
    pub fn into_text(self) -> Result<String, OpensslError> {
        Ok(String::from_utf8(self.into_stdout()?)?)
    }
}

impl Openssl {
    /// Use `openssl` from `PATH`
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Use a specific executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use `$UGLIX_OPENSSL` if set, `openssl` otherwise
    pub fn from_env() -> Self {
        match std::env::var_os(PROGRAM_ENV) {
            Some(program) if !program.is_empty() => Self::with_program(program),
            _ => Self::new(),
        }
    }

    /// The executable this handle runs
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Version banner, e.g. `OpenSSL 3.0.13 30 Jan 2024`
    pub fn version(&self) -> Result<String, OpensslError> {
        let output = self.run(vec!["version".into()], None, None)?;
        Ok(output.into_text()?.trim().to_string())
    }

    /// Run openssl with `args`, feeding `input` to its stdin
    ///
    /// Without input, stdin is closed. The passphrase, when given, is only
    /// visible to the child through [`PASSPHRASE_ENV`].
    pub(crate) fn run(
        &self,
        args: Vec<OsString>,
        input: Option<&[u8]>,
        passphrase: Option<&str>,
    ) -> Result<ToolOutput, OpensslError> {
        debug!(
            program = %self.program.display(),
            subcommand = ?args.first(),
            input_len = input.map_or(0, <[u8]>::len),
            "running openssl"
        );

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(passphrase) = passphrase {
            command.env(PASSPHRASE_ENV, passphrase);
        }

        let mut child = command.spawn().map_err(|source| OpensslError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // stdin is fed from its own thread so a child that writes before it
        // has read everything cannot fill the stdout pipe and stall us
        let output = std::thread::scope(|scope| -> io::Result<_> {
            let writer = child
                .stdin
                .take()
                .zip(input)
                .map(|(mut stdin, input)| scope.spawn(move || stdin.write_all(input)));

            let output = child.wait_with_output()?;

            if let Some(writer) = writer {
                match writer.join() {
                    Ok(Ok(())) => {}
                    // The child quit early; its stderr says why
                    Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
                    Ok(Err(e)) => return Err(e),
                    Err(_) => return Err(io::Error::other("stdin writer panicked")),
                }
            }
            Ok(output)
        })?;

        let result = ToolOutput {
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
            code: output.status.code(),
        };
        debug!(
            success = result.success,
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            "openssl finished"
        );
        Ok(result)
    }
}

impl Default for Openssl {
    fn default() -> Self {
        Self::new()
    }
}
