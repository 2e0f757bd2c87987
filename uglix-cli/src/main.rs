//! UGLIX CLI - talk to the UGLIX system and run the openssl helpers

mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;

use clap::Parser;
use cli::Args;
use commands::Outcome;
use config::Config;
use output::OutputFormatter;

/// Exit status for any error
const EXIT_FAILURE: i32 = 1;

/// Exit status when `verify` rejects a signature
const EXIT_INVALID_SIGNATURE: i32 = 2;

fn main() {
    let args = Args::parse();
    logging::init(args.verbose, args.quiet);

    let code = match run(args) {
        Ok(outcome) => exit_code(&outcome),
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    };
    if code != 0 {
        std::process::exit(code);
    }
}

/// Run the requested command and print its result
fn run(args: Args) -> Result<Outcome, error::CliError> {
    let config = Config::from_args(&args);
    let outcome = commands::run(args.command, &config)?;

    OutputFormatter::new(config.quiet).print(&outcome)?;

    Ok(outcome)
}

/// Process exit status for a successfully executed command
fn exit_code(outcome: &Outcome) -> i32 {
    match outcome {
        Outcome::Verdict(false) => EXIT_INVALID_SIGNATURE,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uglix_client::Payload;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&Outcome::Verdict(false)), 2);
        assert_eq!(exit_code(&Outcome::Verdict(true)), 0);
        assert_eq!(exit_code(&Outcome::Text("ok".into())), 0);
        assert_eq!(exit_code(&Outcome::Reply(Payload::Bytes(Vec::new()))), 0);
    }
}
