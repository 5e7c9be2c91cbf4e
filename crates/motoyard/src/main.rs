//! `motoyard` - CLI for the motorcycle yard record store
//!
//! Every action prints a fixed alert on failure and exits non-zero.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use motoyard::api::MotorcyclePayload;
use motoyard::beacon::{associate, disassociate};
use motoyard::cli::{Cli, Command, ConfigCommand, OutputFormat, RegisterCommand};
use motoyard::resolver::{list_all, Located};
use motoyard::status::{update_status, StatusChange};
use motoyard::{init_logging, yard, Config, Error, KeyValueStore, SqliteStore, VehicleRecord};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let mut config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    if let Some(path) = cli.database.clone() {
        config.storage.database_path = Some(path);
    }

    let command = match cli.command {
        Command::Config(cmd) => {
            handle_config(&config, cmd)?;
            return Ok(ExitCode::SUCCESS);
        }
        other => other,
    };

    let store = SqliteStore::open(config.database_path()).with_context(|| {
        format!(
            "opening database at {}",
            config.database_path().display()
        )
    })?;

    match run(&store, &config, command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::debug!(error = %e, "Action failed");
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(store: &dyn KeyValueStore, config: &Config, command: Command) -> motoyard::Result<()> {
    let keys = config.keys.candidates();
    let keywords = &config.status.maintenance_keywords;

    match command {
        Command::Find(cmd) => {
            let resolved = motoyard::resolve_by_plate(store, &keys, &cmd.plate)
                .await
                .ok_or_else(|| Error::not_found(motoyard::normalize_plate(&cmd.plate)))?;
            print_record(&resolved.record, Some(&resolved.key), cmd.format)?;
        }
        Command::List(cmd) => {
            let all = list_all(store, &keys).await;
            print_list(&all, cmd.format)?;
        }
        Command::Register(cmd) => {
            let record = yard::register(store, &config.keys, record_from(cmd)).await?;
            println!("Motorcycle {} registered.", record.plate);
        }
        Command::Associate(cmd) => {
            let record = associate(store, &keys, &cmd.plate, &cmd.code).await?;
            println!(
                "Beacon {} associated with {}.",
                record.beacon_code().unwrap_or_default(),
                record.plate
            );
        }
        Command::Disassociate(cmd) => {
            let record = disassociate(store, &keys, &cmd.plate).await?;
            println!("Beacon removed from {}.", record.plate);
        }
        Command::Status(cmd) => {
            let change = StatusChange::new(cmd.status, cmd.diagnostic);
            let record =
                update_status(store, &keys, &cmd.plate, &change, keywords, Utc::now()).await?;
            println!(
                "Status of {} set to {}.",
                record.plate,
                record.operational_status.as_deref().unwrap_or_default()
            );
        }
        Command::Remove(cmd) => {
            if !cmd.yes {
                println!("This will delete the record of {}.", cmd.plate);
                println!("Use --yes to confirm.");
                return Ok(());
            }
            let record = yard::remove(store, &keys, &cmd.plate).await?;
            println!("Motorcycle {} removed.", record.plate);
        }
        Command::Payload(cmd) => {
            let resolved = motoyard::resolve_by_plate(store, &keys, &cmd.plate)
                .await
                .ok_or_else(|| Error::not_found(motoyard::normalize_plate(&cmd.plate)))?;
            let payload = MotorcyclePayload::from_record(&resolved.record, cmd.parking_id)?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        // Handled before the store is opened
        Command::Config(_) => {}
    }
    Ok(())
}

fn record_from(cmd: RegisterCommand) -> VehicleRecord {
    let mut record = VehicleRecord::new(&cmd.plate);
    record.model = cmd.model;
    record.chassis_number = cmd.chassis;
    record.manufacture_year = cmd.year;
    record.mechanical_condition = cmd.condition;
    record.operational_status = cmd.status;
    record
}

fn print_record(
    record: &VehicleRecord,
    key: Option<&str>,
    format: OutputFormat,
) -> motoyard::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record.to_value()?)?),
        OutputFormat::Plain | OutputFormat::Table => {
            let dash = "-";
            println!("Plate:       {}", record.plate);
            println!("Model:       {}", record.model.as_deref().unwrap_or(dash));
            println!("Chassis:     {}", record.chassis_number.as_deref().unwrap_or(dash));
            println!("Year:        {}", record.manufacture_year.as_deref().unwrap_or(dash));
            println!(
                "Condition:   {}",
                record.mechanical_condition.as_deref().unwrap_or(dash)
            );
            println!(
                "Status:      {}",
                record.operational_status.as_deref().unwrap_or(dash)
            );
            println!(
                "Beacon:      {}",
                match (record.beacon_code(), record.has_beacon()) {
                    (Some(code), _) => code,
                    (None, true) => "(legacy marker)",
                    (None, false) => "none",
                }
            );
            if let Some(diagnostic) = &record.diagnostic {
                println!("Diagnostic:  {diagnostic}");
            }
            if let Some(at) = record.updated_at {
                println!("Updated:     {}", at.to_rfc3339());
            }
            if let Some(key) = key {
                println!("Stored in:   {key}");
            }
        }
    }
    Ok(())
}

fn print_list(all: &[Located], format: OutputFormat) -> motoyard::Result<()> {
    match format {
        OutputFormat::Json => {
            let rows = all
                .iter()
                .map(|l| {
                    Ok(serde_json::json!({
                        "key": l.key,
                        "index": l.index,
                        "record": l.record.to_value()?,
                    }))
                })
                .collect::<motoyard::Result<Vec<_>>>()?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            println!("{:<12} {:<10} {:<18} {:<12}", "KEY", "PLATE", "STATUS", "BEACON");
            for l in all {
                println!(
                    "{:<12} {:<10} {:<18} {:<12}",
                    l.key,
                    l.record.plate,
                    l.record.operational_status.as_deref().unwrap_or("-"),
                    l.record.beacon_code().unwrap_or("-"),
                );
            }
        }
        OutputFormat::Plain => {
            for l in all {
                println!("{}\t{}", l.record.plate, l.key);
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Keys]");
                println!("  Single vehicle:     {}", config.keys.single);
                println!("  Vehicle list:       {}", config.keys.list);
                println!("  Legacy:             {}", config.keys.legacy.join(", "));
                println!();
                println!("[Status]");
                println!(
                    "  Maintenance words:  {}",
                    config.status.maintenance_keywords.join(", ")
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
