#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for auditing and cleaning OpenStreetMap XML extracts.
//!
//! Run without a subcommand for an interactive menu.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use osm_scrub_cleaning::config::load_config;

#[derive(Parser)]
#[command(name = "osm_scrub", about = "OpenStreetMap extract audit and cleaning tool")]
struct Cli {
    /// TOML file overriding the built-in cleaning rules
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean an extract and write it as five CSV files
    Clean {
        /// OSM XML file (`.osm` or `.osm.gz`)
        input: PathBuf,
        /// Directory receiving `nodes.csv`, `ways.csv`, and the tag files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Report data-quality problems in an extract
    Audit {
        /// OSM XML file (`.osm` or `.osm.gz`)
        input: PathBuf,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the effective cleaning rules as TOML
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = osm_scrub_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        return interactive::run(&multi, &config);
    };

    match command {
        Commands::Clean { input, output_dir } => {
            commands::clean(&multi, &config, &input, &output_dir)?;
        }
        Commands::Audit { input, json } => commands::audit(&multi, &config, &input, json)?,
        Commands::Config => commands::print_config(&config)?,
    }

    Ok(())
}
