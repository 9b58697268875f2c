//! The three actions, shared by the subcommands and the interactive menu.

use std::path::Path;
use std::time::Instant;

use osm_scrub_cleaning::CleaningConfig;
use osm_scrub_cleaning::config::to_toml;
use osm_scrub_cli_utils::{IndicatifProgress, MultiProgress};

/// Cleans `input` into CSV files under `output_dir` and prints a summary.
///
/// # Errors
///
/// Returns an error if the extract cannot be read or the output written.
pub fn clean(
    multi: &MultiProgress,
    config: &CleaningConfig,
    input: &Path,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let progress = IndicatifProgress::elements_spinner(multi, "Cleaning");

    let report = match osm_scrub_export::process_map(input, output_dir, config, &progress) {
        Ok(report) => report,
        Err(e) => {
            progress.finish_and_clear();
            return Err(e.into());
        }
    };

    println!("{report}");
    if !report.invalid_postcodes.is_empty() {
        println!("Dropped postcodes:");
        for (postcode, count) in &report.invalid_postcodes {
            println!("  {postcode:?} x{count}");
        }
    }
    println!(
        "CSV files written to {} in {:.1}s",
        output_dir.display(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Audits `input` and prints the report as text or JSON.
///
/// # Errors
///
/// Returns an error if the extract cannot be read or the report rendered.
pub fn audit(
    multi: &MultiProgress,
    config: &CleaningConfig,
    input: &Path,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::elements_spinner(multi, "Auditing");

    let report = match osm_scrub_audit::audit_path(input, config, &progress) {
        Ok(report) => report,
        Err(e) => {
            progress.finish_and_clear();
            return Err(e.into());
        }
    };

    if json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print!("{report}");
    }

    Ok(())
}

/// Prints the effective configuration.
///
/// # Errors
///
/// Returns an error if the configuration cannot be rendered as TOML.
pub fn print_config(config: &CleaningConfig) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", to_toml(config)?);
    Ok(())
}
