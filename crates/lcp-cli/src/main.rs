//! # lcpctl entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lcp_cli::key::{run_key, KeyArgs};
use lcp_cli::license::{run_license, LicenseArgs};
use lcp_cli::package::{run_package, PackageArgs};

/// Operator tooling for the LCP license server.
#[derive(Parser, Debug)]
#[command(name = "lcpctl", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provider signing key generation and inspection.
    Key(KeyArgs),

    /// Encrypt publications and print their content registration bodies.
    Package(PackageArgs),

    /// Offline license verification.
    License(LicenseArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Key(args) => run_key(&args),
        Commands::Package(args) => run_package(&args),
        Commands::License(args) => run_license(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcp_cli::key::KeyCommand;
    use lcp_cli::license::LicenseCommand;

    #[test]
    fn parse_key_generate() {
        let cli = Cli::try_parse_from(["lcpctl", "key", "generate", "--out", "p.key"]).unwrap();
        match cli.command {
            Commands::Key(KeyArgs {
                command: KeyCommand::Generate { out, force },
            }) => {
                assert_eq!(out.to_str(), Some("p.key"));
                assert!(!force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_package_defaults() {
        let cli =
            Cli::try_parse_from(["lcpctl", "package", "a.epub", "b.epub", "--store", "/tmp/s"])
                .unwrap();
        let Commands::Package(args) = cli.command else {
            panic!("expected package");
        };
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.workers, 4);
        assert!(args.content_id.is_none());
    }

    #[test]
    fn package_requires_store() {
        assert!(Cli::try_parse_from(["lcpctl", "package", "a.epub"]).is_err());
    }

    #[test]
    fn parse_license_verify_with_key() {
        let cli = Cli::try_parse_from([
            "lcpctl",
            "-vv",
            "license",
            "verify",
            "book.lcpl",
            "--public-key",
            "abcd",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::License(LicenseArgs {
            command: LicenseCommand::Verify { public_key, .. },
        }) = cli.command
        else {
            panic!("expected license verify");
        };
        assert_eq!(public_key.as_deref(), Some("abcd"));
    }
}
