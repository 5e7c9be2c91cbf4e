//! Command-line interface for motoyard.
//!
//! This module provides the CLI structure for the `motoyard` binary. Each
//! subcommand stands in for one operator or mechanic action.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AssociateCommand, ConfigCommand, DisassociateCommand, FindCommand, ListCommand,
    OutputFormat, PayloadCommand, RegisterCommand, RemoveCommand, StatusCommand,
};

/// motoyard - Motorcycle yard records and beacon association
#[derive(Debug, Parser)]
#[command(name = "motoyard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the database file (overrides configuration)
    #[arg(long, global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up a vehicle by plate
    Find(FindCommand),

    /// List all stored vehicles
    List(ListCommand),

    /// Register a vehicle entering the yard
    Register(RegisterCommand),

    /// Associate a beacon with a vehicle
    Associate(AssociateCommand),

    /// Remove the beacon from a vehicle
    Disassociate(DisassociateCommand),

    /// Change a vehicle's operational status
    Status(StatusCommand),

    /// Remove a vehicle record
    Remove(RemoveCommand),

    /// Print the remote API payload for a vehicle
    Payload(PayloadCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "motoyard");
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;

        assert_eq!(parse(&["motoyard", "-q", "list"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["motoyard", "list"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["motoyard", "-v", "list"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["motoyard", "-vv", "list"]).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_find() {
        let cli = parse(&["motoyard", "find", "abc 1234", "-f", "json"]);
        match cli.command {
            Command::Find(cmd) => {
                assert_eq!(cmd.plate, "abc 1234");
                assert_eq!(cmd.format, OutputFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_associate() {
        let cli = parse(&["motoyard", "associate", "ABC1234", "XYZ99"]);
        assert!(matches!(
            cli.command,
            Command::Associate(AssociateCommand { ref code, .. }) if code == "XYZ99"
        ));
    }

    #[test]
    fn test_parse_status_with_diagnostic() {
        let cli = parse(&[
            "motoyard",
            "status",
            "ABC1234",
            "Em manutenção",
            "--diagnostic",
            "corrente solta",
        ]);
        match cli.command {
            Command::Status(cmd) => {
                assert_eq!(cmd.status, "Em manutenção");
                assert_eq!(cmd.diagnostic.as_deref(), Some("corrente solta"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_register() {
        let cli = parse(&["motoyard", "register", "ABC1234", "-m", "Mottu Sport", "--year", "2023"]);
        match cli.command {
            Command::Register(cmd) => {
                assert_eq!(cmd.model.as_deref(), Some("Mottu Sport"));
                assert_eq!(cmd.year.as_deref(), Some("2023"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_database() {
        let cli = parse(&["motoyard", "list", "--database", "/tmp/yard.db"]);
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/yard.db")));
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["motoyard", "-c", "/custom/config.toml", "config", "path"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
    }

    #[test]
    fn test_associate_requires_code() {
        assert!(Cli::try_parse_from(["motoyard", "associate", "ABC1234"]).is_err());
    }
}
