//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Look up a vehicle by plate.
#[derive(Debug, Args)]
pub struct FindCommand {
    /// Plate as typed (case and spaces are ignored)
    pub plate: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// List every vehicle under the configured keys.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Register a vehicle entering the yard.
#[derive(Debug, Args)]
pub struct RegisterCommand {
    /// License plate
    pub plate: String,

    /// Model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// Chassis number
    #[arg(long)]
    pub chassis: Option<String>,

    /// Manufacture year
    #[arg(long)]
    pub year: Option<String>,

    /// Mechanical condition
    #[arg(long)]
    pub condition: Option<String>,

    /// Initial operational status
    #[arg(short, long)]
    pub status: Option<String>,
}

/// Associate a beacon with a vehicle.
#[derive(Debug, Args)]
pub struct AssociateCommand {
    /// License plate
    pub plate: String,

    /// Beacon code
    pub code: String,
}

/// Remove the beacon from a vehicle.
#[derive(Debug, Args)]
pub struct DisassociateCommand {
    /// License plate
    pub plate: String,
}

/// Change the operational status of a vehicle.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// License plate
    pub plate: String,

    /// New operational status
    pub status: String,

    /// Diagnostic note (required for maintenance statuses)
    #[arg(short, long)]
    pub diagnostic: Option<String>,
}

/// Remove a vehicle record.
#[derive(Debug, Args)]
pub struct RemoveCommand {
    /// License plate
    pub plate: String,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Print the remote API payload for a vehicle.
#[derive(Debug, Args)]
pub struct PayloadCommand {
    /// License plate
    pub plate: String,

    /// Parking lot id
    #[arg(short, long)]
    pub parking_id: i64,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
