//! Subcommand execution

use crate::cli::Command;
use crate::config::{self, Config};
use crate::error::CliError;
use std::path::PathBuf;
use tracing::info;
use uglix_client::{Connection, Payload, UglixError};

/// What a subcommand produced
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Decoded body of a UGLIX response
    Reply(Payload),
    /// Text produced by openssl (base64, PEM, plaintext)
    Text(String),
    /// Result of a signature check
    Verdict(bool),
    /// A private key was written to this path
    KeyWritten(PathBuf),
}

/// Run one subcommand
pub fn run(command: Command, config: &Config) -> Result<Outcome, CliError> {
    match command {
        Command::Get { path } => http(config, |c| c.get(&path)),
        Command::Post { path, fields } => {
            let fields: serde_json::Map<String, serde_json::Value> = fields.into_iter().collect();
            http(config, |c| c.post(&path, &fields))
        }
        Command::Put {
            path,
            content,
            file,
        } => {
            let body = match content {
                Some(text) => text.into_bytes(),
                None => config::read_input(file.as_deref())?,
            };
            http(config, |c| c.put(&path, body))
        }
        Command::PostRaw {
            path,
            file,
            content_type,
        } => {
            let body = config::read_input(file.as_deref())?;
            http(config, |c| c.post_raw(&path, body, &content_type))
        }
        Command::Mail {
            user,
            message,
            suffix,
        } => http(config, |c| c.mail(&user, message, &suffix)),

        Command::Encrypt { secret, file } => {
            let passphrase = config::resolve_passphrase(secret.passphrase.as_deref())?;
            let plaintext = config::read_input(file.as_deref())?;
            let ciphertext = config
                .openssl
                .encrypt(&plaintext, &passphrase, &secret.cipher)?;
            Ok(Outcome::Text(ciphertext))
        }
        Command::Decrypt { secret, file } => {
            let passphrase = config::resolve_passphrase(secret.passphrase.as_deref())?;
            let ciphertext = config::read_text_input(file.as_deref())?;
            let plaintext = config
                .openssl
                .decrypt(&ciphertext, &passphrase, &secret.cipher)?;
            Ok(Outcome::Text(plaintext))
        }
        Command::EncryptPublic { key, file } => {
            let plaintext = config::read_input(file.as_deref())?;
            let ciphertext = config
                .openssl
                .encrypt_public(&plaintext, config::expand_tilde(&key))?;
            Ok(Outcome::Text(ciphertext))
        }
        Command::DecryptPrivate { key, file } => {
            let ciphertext = config::read_text_input(file.as_deref())?;
            let plaintext = config
                .openssl
                .decrypt_private(&ciphertext, config::expand_tilde(&key))?;
            Ok(Outcome::Text(plaintext))
        }
        Command::Sign { key, file } => {
            let document = config::read_input(file.as_deref())?;
            let signature = config.openssl.sign(&document, config::expand_tilde(&key))?;
            Ok(Outcome::Text(signature))
        }
        Command::Verify {
            signature,
            public_key,
            certificate,
            file,
        } => {
            let document = config::read_input(file.as_deref())?;
            // clap guarantees exactly one of the two
            let valid = if let Some(key) = public_key {
                let key = std::fs::read_to_string(config::expand_tilde(&key))?;
                config.openssl.verify(&document, &signature, &key)?
            } else {
                let cert = certificate.ok_or_else(|| {
                    CliError::Config("--public-key or --certificate is required".to_string())
                })?;
                let cert = std::fs::read_to_string(config::expand_tilde(&cert))?;
                config
                    .openssl
                    .verify_with_certificate(&document, &signature, &cert)?
            };
            Ok(Outcome::Verdict(valid))
        }
        Command::Genkey { out } => {
            let out = config::expand_tilde(&out);
            config.openssl.generate_private_key(&out)?;
            Ok(Outcome::KeyWritten(out))
        }
        Command::Pubkey {
            private,
            certificate,
        } => {
            let pem = if let Some(key) = private {
                config
                    .openssl
                    .public_key_from_private(config::expand_tilde(&key))?
            } else {
                let cert = certificate.ok_or_else(|| {
                    CliError::Config("--private or --certificate is required".to_string())
                })?;
                let cert = std::fs::read(config::expand_tilde(&cert))?;
                config.openssl.public_key_from_certificate(&cert)?
            };
            Ok(Outcome::Text(pem))
        }
    }
}

/// Run one request on a fresh connection, reporting a newly issued cookie
fn http<F>(config: &Config, request: F) -> Result<Outcome, CliError>
where
    F: FnOnce(&mut Connection) -> Result<Payload, UglixError>,
{
    let mut connection = config.connect()?;
    let reply = request(&mut connection);

    let before = config.cookie.as_deref().map(String::as_str);
    if let Some(cookie) = issued_cookie(before, &connection) {
        info!("server issued a new session cookie");
        if config.print_cookie {
            eprintln!("Set-Cookie: {}", cookie);
        }
    }

    Ok(Outcome::Reply(reply?))
}

/// The connection's cookie, if it differs from the one it started with
fn issued_cookie<'a>(before: Option<&str>, connection: &'a Connection) -> Option<&'a str> {
    connection.session().filter(|cookie| Some(*cookie) != before)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;
    use mockito::Matcher;
    use serde_json::json;
    use tempfile::TempDir;

    fn config_for(server: &mockito::Server, extra: &[&str]) -> (Config, Command) {
        let url = server.url();
        let mut argv = vec!["uglix", "--base-url", url.as_str()];
        argv.extend_from_slice(extra);
        let args = Args::try_parse_from(argv).unwrap();
        let config = Config::from_args(&args);
        (config, args.command)
    }

    #[test]
    fn test_get_returns_decoded_reply() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/bin/echo")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body("usage: echo [arguments]")
            .expect(1)
            .create();

        let (config, command) = config_for(&server, &["get", "/bin/echo"]);
        let outcome = run(command, &config).unwrap();

        assert_eq!(outcome, Outcome::Reply(Payload::Text("usage: echo [arguments]".into())));
        mock.assert();
    }

    #[test]
    fn test_post_sends_fields_and_cookie() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/bin/login")
            .match_header("cookie", "session=old")
            .match_body(Matcher::Json(json!({"user": "alice", "n": 1})))
            .with_status(200)
            .with_header("set-cookie", "session=new")
            .expect(1)
            .create();

        let (config, command) = config_for(
            &server,
            &["--cookie", "session=old", "post", "/bin/login", "-f", "user=alice", "-f", "n=1"],
        );
        run(command, &config).unwrap();
        mock.assert();
    }

    #[test]
    fn test_put_positional_content() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PUT", "/home/alice/notes")
            .match_body("hello")
            .with_status(200)
            .expect(1)
            .create();

        let (config, command) = config_for(&server, &["put", "/home/alice/notes", "hello"]);
        run(command, &config).unwrap();
        mock.assert();
    }

    #[test]
    fn test_mail_dispatch() {
        let mut server = mockito::Server::new();
        let inbox = server
            .mock("GET", "/home/alice/INBOX")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[1, 2]")
            .expect(1)
            .create();
        let reply = server
            .mock("GET", "/home/alice/INBOX/2/reply")
            .with_status(200)
            .expect(1)
            .create();

        let (config, command) = config_for(&server, &["mail", "alice"]);
        assert_eq!(run(command, &config).unwrap(), Outcome::Reply(Payload::Json(json!([1, 2]))));
        let (config, command) = config_for(&server, &["mail", "alice", "2", "/reply"]);
        run(command, &config).unwrap();

        inbox.assert();
        reply.assert();
    }

    #[test]
    fn test_post_raw_sends_file_with_content_type() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob.bin");
        std::fs::write(&path, "Salted__x").unwrap();

        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/bin/crypto")
            .match_header("content-type", "application/x-uglix")
            .match_body("Salted__x")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body("OK")
            .expect(1)
            .create();

        let path = path.to_str().unwrap();
        let (config, command) = config_for(
            &server,
            &["post-raw", "/bin/crypto", "--file", path, "--content-type", "application/x-uglix"],
        );
        assert_eq!(run(command, &config).unwrap(), Outcome::Reply(Payload::Text("OK".into())));
        mock.assert();
    }

    #[test]
    fn test_issued_cookie_only_when_changed() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/bin/login")
            .with_status(200)
            .with_header("set-cookie", "session=new")
            .create();
        server.mock("GET", "/quiet").with_status(200).create();

        let (config, _) = config_for(&server, &["--cookie", "session=old", "get", "/"]);
        let mut connection = config.connect().unwrap();
        assert_eq!(issued_cookie(Some("session=old"), &connection), None);

        connection.get("/quiet").unwrap();
        assert_eq!(issued_cookie(Some("session=old"), &connection), None);

        connection.get("/bin/login").unwrap();
        assert_eq!(issued_cookie(Some("session=old"), &connection), Some("session=new"));
        assert_eq!(issued_cookie(Some("session=new"), &connection), None);
        assert_eq!(issued_cookie(None, &connection), Some("session=new"));
    }

    #[test]
    fn test_print_cookie_request_still_returns_reply() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/bin/login")
            .with_status(200)
            .with_header("set-cookie", "session=new")
            .with_header("content-type", "text/plain")
            .with_body("welcome")
            .create();

        let (config, command) = config_for(&server, &["--print-cookie", "get", "/bin/login"]);
        assert!(config.print_cookie);
        assert_eq!(
            run(command, &config).unwrap(),
            Outcome::Reply(Payload::Text("welcome".into()))
        );
    }

    #[test]
    fn test_server_error_is_propagated() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/bin/foobar")
            .with_status(404)
            .with_header("content-type", "text/plain")
            .with_body("no such command")
            .create();

        let (config, command) = config_for(&server, &["get", "/bin/foobar"]);
        let err = run(command, &config).unwrap_err();

        assert_eq!(err.to_string(), "ERROR 404, no such command");
    }

    // Another test forking while a script is still open for writing makes
    // exec fail with ETXTBSY, so the script tests run one at a time
    #[cfg(unix)]
    static SERIAL: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Write an executable `/bin/sh` script standing in for openssl
    #[cfg(unix)]
    fn fake_openssl(dir: &TempDir, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.path().join("openssl");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[cfg(unix)]
    fn offline(argv: &[&str]) -> (Config, Command) {
        let mut full = vec!["uglix"];
        full.extend_from_slice(argv);
        let args = Args::try_parse_from(full).unwrap();
        (Config::from_args(&args), args.command)
    }

    #[cfg(unix)]
    #[test]
    fn test_encrypt_dispatch() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().unwrap();
        let program = fake_openssl(
            &dir,
            "printf 'in=%s ' \"$(cat)\"\nprintf '%s ' \"$@\"\nprintf 'pass=%s\\n' \"$UGLIX_OPENSSL_PASS\"",
        );
        let input = dir.path().join("message.txt");
        std::fs::write(&input, "hello").unwrap();

        let (config, command) = offline(&[
            "--openssl",
            program.as_str(),
            "encrypt",
            "--passphrase",
            "foobar",
            "--cipher",
            "aes-256-cbc",
            "--file",
            input.to_str().unwrap(),
        ]);

        assert_eq!(
            run(command, &config).unwrap(),
            Outcome::Text(
                "in=hello enc -base64 -aes-256-cbc -pbkdf2 -pass env:UGLIX_OPENSSL_PASS pass=foobar\n"
                    .to_string()
            )
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_rejected_signature_exits_with_status_2() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().unwrap();
        let program = fake_openssl(
            &dir,
            "cat > /dev/null\necho 'Verification failure'\necho 'bad signature' >&2\nexit 1",
        );
        let document = dir.path().join("doc.txt");
        let key = dir.path().join("key.pub");
        std::fs::write(&document, "challenge").unwrap();
        std::fs::write(&key, "-----BEGIN PUBLIC KEY-----").unwrap();

        let (config, command) = offline(&[
            "--openssl",
            program.as_str(),
            "verify",
            "--signature",
            "c2ln",
            "--public-key",
            key.to_str().unwrap(),
            "--file",
            document.to_str().unwrap(),
        ]);
        let outcome = run(command, &config).unwrap();

        assert_eq!(outcome, Outcome::Verdict(false));
        assert_eq!(crate::exit_code(&outcome), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_verify_with_certificate_dispatch() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().unwrap();
        // x509 must see the certificate, dgst the key it extracted
        let program = fake_openssl(
            &dir,
            "case \"$1\" in\n  x509) [ \"$(cat)\" = 'CERT' ] || exit 4; echo 'PUBKEY' ;;\n  dgst) cat > /dev/null; [ \"$(cat \"$4\")\" = 'PUBKEY' ] || exit 5; echo 'Verified OK' ;;\n  *) exit 6 ;;\nesac",
        );
        let document = dir.path().join("doc.txt");
        let cert = dir.path().join("card.crt");
        std::fs::write(&document, "challenge").unwrap();
        std::fs::write(&cert, "CERT").unwrap();

        let (config, command) = offline(&[
            "--openssl",
            program.as_str(),
            "verify",
            "--signature",
            "c2ln",
            "--certificate",
            cert.to_str().unwrap(),
            "--file",
            document.to_str().unwrap(),
        ]);
        let outcome = run(command, &config).unwrap();

        assert_eq!(outcome, Outcome::Verdict(true));
        assert_eq!(crate::exit_code(&outcome), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_openssl_error_is_propagated() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().unwrap();
        let program = fake_openssl(&dir, "printf 'Could not open file key.pem' >&2\nexit 1");

        let (config, command) =
            offline(&["--openssl", program.as_str(), "pubkey", "--private", "key.pem"]);
        let err = run(command, &config).unwrap_err();

        assert_eq!(err.to_string(), "openssl: Could not open file key.pem");
    }
}
