#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV export of a cleaned OSM extract.
//!
//! [`process_map`] streams nodes and ways out of the extract, shapes each
//! one with [`osm_scrub_cleaning::shape::shape_element`] and appends the
//! resulting rows to a [`CsvSink`]. Problems with single records are logged
//! and counted in the returned [`CleaningReport`]; they never stop the run.

pub mod sink;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use osm_scrub_cleaning::CleaningError;
use osm_scrub_cleaning::shape::shape_element;
use osm_scrub_cleaning_models::{CleaningConfig, CleaningReport, ElementKind};
use osm_scrub_osm::OsmError;
use osm_scrub_osm::progress::ProgressCallback;

pub use sink::CsvSink;

/// Errors that abort an export run.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The extract could not be read.
    #[error(transparent)]
    Osm(#[from] OsmError),

    /// A CSV row could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The output directory could not be prepared or flushed.
    #[error("I/O error writing {path}: {source}")]
    Io {
        /// Path of the output directory.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An element could not be shaped at all.
    #[error(transparent)]
    Cleaning(#[from] CleaningError),
}

/// Cleans the extract at `input` and writes the five CSV files into
/// `output_dir`.
///
/// # Errors
///
/// Returns an error if the extract cannot be read or parsed, or if the
/// output cannot be written.
pub fn process_map(
    input: &Path,
    output_dir: &Path,
    config: &CleaningConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<CleaningReport, ExportError> {
    let start = Instant::now();
    let reader = osm_scrub_osm::open_path(input, &[ElementKind::Node, ElementKind::Way])?;
    let mut sink = CsvSink::create(output_dir)?;
    let mut report = CleaningReport::default();

    progress.set_message(format!("Cleaning {}", input.display()));

    for element in reader {
        let element = element?;
        let outcome = shape_element(&element, config)?;

        for issue in &outcome.issues {
            record_issue(&mut report, issue);
        }

        sink.write(&outcome.shaped)?;
        report.record_shaped(&outcome.shaped);
        progress.inc(1);
    }

    sink.flush()?;

    progress.finish(format!("Cleaned {} elements", report.elements()));
    log::info!(
        "Wrote {} nodes and {} ways to {} in {:.1}s ({} bad postcodes, {} range errors, {} missing attributes)",
        report.nodes,
        report.ways,
        output_dir.display(),
        start.elapsed().as_secs_f64(),
        report.invalid_postcode_count(),
        report.range_errors,
        report.missing_attributes,
    );

    Ok(report)
}

fn record_issue(report: &mut CleaningReport, issue: &CleaningError) {
    match issue {
        CleaningError::InvalidPostalCode(value) => {
            log::warn!("{issue}");
            report.record_invalid_postcode(value);
        }
        CleaningError::RangeExpansion { .. } => {
            log::warn!("{issue}");
            report.range_errors += 1;
        }
        CleaningError::MissingAttribute { .. } => {
            log::warn!("Skipping record: {issue}");
            report.missing_attributes += 1;
        }
        CleaningError::UnsupportedElement(_) => log::debug!("{issue}"),
    }
}
