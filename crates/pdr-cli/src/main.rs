// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdr_config::load_config;
use pdr_record::SystemClock;
use pdr_report::{Reporter, WriterSink};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pdr", version, about = "Provisioning diagnostic report encoder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a failure report.
    Error {
        /// Human-readable failure reason.
        #[arg(long)]
        reason: String,

        /// Supporting field as KEY=VALUE. Repeat to add more; order is kept.
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Instance identifier (the configured placeholder is used if absent).
        #[arg(long)]
        vm_id: Option<String>,

        /// Print the record and encoded line as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Encode a success report.
    Success {
        /// Instance identifier (the configured placeholder is used if absent).
        #[arg(long)]
        vm_id: Option<String>,
    },

    /// List failure codes, categories and reason templates.
    Taxonomy {
        /// Print JSON instead of tab-separated text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref());

    let filter = if cli.debug {
        EnvFilter::new("pdr=debug")
    } else {
        let level = config.as_ref().map_or("info", |c| c.log_level());
        EnvFilter::try_new(format!("pdr={level}")).unwrap_or_else(|_| EnvFilter::new("pdr=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config.context("load config")?;
    commands::check_config(&config)?;
    let mut sink = WriterSink::new(std::io::stdout());

    match cli.command {
        Commands::Error {
            reason,
            fields,
            vm_id,
            json,
        } => {
            let record = commands::build_record(&reason, &fields, &config, &SystemClock)?;
            let reporter = Reporter::from_config(&config, vm_id, SystemClock);
            commands::emit_error(&reporter, &record, &mut sink, json)
        }
        Commands::Success { vm_id } => {
            let reporter = Reporter::from_config(&config, vm_id, SystemClock);
            commands::emit_success(&reporter, &mut sink)
        }
        Commands::Taxonomy { json } => {
            print!("{}", commands::render_taxonomy(json)?);
            Ok(())
        }
    }
}
