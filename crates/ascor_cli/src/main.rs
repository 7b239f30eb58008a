//! `ascor` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration (environment first, flags override) and load the
//!   assessment table once.
//! - Expose lookups, routed API requests and the key listing as subcommands.
//!
//! # Exit codes
//! - `0` on success, `1` when the requested key or route is not served,
//!   `2` when configuration or table loading fails.

use ascor_core::{
    init_logging, load_lookup_service, ApiRouter, DataFormat, LookupError, LookupService,
    ServiceConfig,
};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ascor")]
#[command(about = "Serve ASCOR country assessments as nested documents", version)]
struct Cli {
    /// Assessment table (SQLite database or CSV export)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Table format; inferred from the file extension when omitted
    #[arg(long, global = true)]
    format: Option<DataFormat>,

    /// SQLite table holding the assessments
    #[arg(long, global = true)]
    table: Option<String>,

    /// Prefix routed paths are served under
    #[arg(long, global = true)]
    base_path: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; file logging is off without it
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the document for one country and assessment year
    Lookup {
        country: String,
        year: i32,
        /// Print on one line
        #[arg(long)]
        compact: bool,
    },

    /// Route a GET path through the API and print status and body
    Get {
        /// Request path, e.g. /v3/country-metrics/Germany/2023
        path: String,
    },

    /// List served countries with their assessment years
    Countries,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(2);
        }
    };

    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, log_dir, true) {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    }

    let service = match load_lookup_service(&config) {
        Ok(service) => Arc::new(service),
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Command::Lookup {
            country,
            year,
            compact,
        } => lookup(&service, &country, year, compact),
        Command::Get { path } => get(ApiRouter::new(service, &config.base_path), &path),
        Command::Countries => countries(&service),
    }
}

fn resolve_config(cli: &Cli) -> Result<ServiceConfig, String> {
    let mut config = ServiceConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(data) = &cli.data {
        config.data_path = Some(data.clone());
    }
    if cli.format.is_some() {
        config.data_format = cli.format;
    }
    if let Some(table) = &cli.table {
        config.table_name = table.clone();
    }
    if let Some(base_path) = &cli.base_path {
        config.base_path = ascor_core::config::normalize_base_path(base_path);
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn lookup(service: &LookupService, country: &str, year: i32, compact: bool) -> ExitCode {
    match service.lookup(country, year) {
        Ok(document) => {
            let rendered = if compact {
                serde_json::to_string(&document)
            } else {
                serde_json::to_string_pretty(&document)
            };
            match rendered {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    ExitCode::from(2)
                }
            }
        }
        Err(err @ LookupError::NotFound { .. }) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn get(router: ApiRouter, path: &str) -> ExitCode {
    let response = router.handle(path);
    info!(
        "event=cli_get module=cli status={} path={:?}",
        response.status, path
    );
    println!("{}", response.status);
    match serde_json::to_string_pretty(&response.body) {
        Ok(body) => println!("{body}"),
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    }
    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn countries(service: &LookupService) -> ExitCode {
    for country in service.countries() {
        let years: Vec<String> = service
            .years_for(country)
            .iter()
            .map(i32::to_string)
            .collect();
        println!("{country}\t{}", years.join(","));
    }
    ExitCode::SUCCESS
}
