//! Menu-driven front end used when no subcommand is given.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};
use osm_scrub_cleaning::CleaningConfig;
use osm_scrub_cli_utils::MultiProgress;

use crate::commands;

/// Top-level actions in the interactive menu.
enum Action {
    Audit,
    Clean,
    ShowConfig,
}

impl Action {
    const ALL: &[Self] = &[Self::Audit, Self::Clean, Self::ShowConfig];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Audit => "Audit an extract",
            Self::Clean => "Clean an extract to CSV",
            Self::ShowConfig => "Show cleaning rules",
        }
    }
}

/// Prompts for an action and its inputs, then runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected action fails.
pub fn run(multi: &MultiProgress, config: &CleaningConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("osm_scrub");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Audit => {
            let input = prompt_input()?;
            let json = Confirm::new()
                .with_prompt("Print as JSON?")
                .default(false)
                .interact()?;
            log::debug!("Interactive audit of {}", input.display());
            commands::audit(multi, config, &input, json)?;
        }
        Action::Clean => {
            let input = prompt_input()?;
            let output_dir: String = Input::new()
                .with_prompt("Output directory")
                .default(".".to_string())
                .interact_text()?;
            log::debug!("Interactive clean of {}", input.display());
            commands::clean(multi, config, &input, &PathBuf::from(output_dir))?;
        }
        Action::ShowConfig => commands::print_config(config)?,
    }

    Ok(())
}

fn prompt_input() -> Result<PathBuf, dialoguer::Error> {
    let path: String = Input::new()
        .with_prompt("OSM file (.osm or .osm.gz)")
        .interact_text()?;
    Ok(PathBuf::from(path.trim()))
}
