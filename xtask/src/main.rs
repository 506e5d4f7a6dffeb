// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Repo maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate JSON Schemas for the config and taxonomy types.
    Schema {
        /// Output directory.
        #[arg(long, default_value = "contracts/schemas")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Schema { out_dir } => schema(&out_dir),
    }
}

fn schema(out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir).context("create schema output dir")?;

    let schemas = [
        ("report_config.schema.json", schema_for!(pdr_config::ReportConfig)),
        ("report_code.schema.json", schema_for!(pdr_taxonomy::ReportCode)),
        ("report_category.schema.json", schema_for!(pdr_taxonomy::ReportCategory)),
        ("imds_request_error.schema.json", schema_for!(pdr_taxonomy::ImdsRequestError)),
    ];
    for (name, schema) in &schemas {
        write_schema(&out_dir.join(name), schema)?;
    }

    eprintln!("wrote {} schemas to {}", schemas.len(), out_dir.display());
    Ok(())
}

fn write_schema(path: &Path, schema: &schemars::Schema) -> Result<()> {
    let s = serde_json::to_string_pretty(schema)?;
    std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
