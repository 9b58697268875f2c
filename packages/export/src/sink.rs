//! The five CSV output files.

use std::fs::File;
use std::path::{Path, PathBuf};

use osm_scrub_cleaning::CleaningError;
use osm_scrub_cleaning_models::{ElementKind, RecordKind, ShapedElement};

use crate::ExportError;

/// Writes shaped elements to `nodes.csv`, `node_tags.csv`, `ways.csv`,
/// `way_nodes.csv` and `way_tags.csv` inside one directory.
///
/// Every file gets its header row on creation, so an extract without ways
/// still produces a valid (header-only) `ways.csv`.
pub struct CsvSink {
    output_dir: PathBuf,
    nodes: csv::Writer<File>,
    node_tags: csv::Writer<File>,
    ways: csv::Writer<File>,
    way_nodes: csv::Writer<File>,
    way_tags: csv::Writer<File>,
}

impl CsvSink {
    /// Creates `output_dir` if needed and truncates the five output files.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or any file cannot be created.
    pub fn create(output_dir: &Path) -> Result<Self, ExportError> {
        std::fs::create_dir_all(output_dir).map_err(|e| ExportError::Io {
            path: output_dir.display().to_string(),
            source: e,
        })?;

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            nodes: open_writer(output_dir, RecordKind::Node)?,
            node_tags: open_writer(output_dir, RecordKind::NodeTag)?,
            ways: open_writer(output_dir, RecordKind::Way)?,
            way_nodes: open_writer(output_dir, RecordKind::WayNode)?,
            way_tags: open_writer(output_dir, RecordKind::WayTag)?,
        })
    }

    /// Appends the records of one shaped element.
    ///
    /// # Errors
    ///
    /// Returns an error if a row cannot be written, or if the element is a
    /// relation.
    pub fn write(&mut self, shaped: &ShapedElement) -> Result<(), ExportError> {
        match shaped.kind() {
            ElementKind::Node => {
                self.nodes.write_record(shaped.record.row())?;
                for tag in &shaped.tags {
                    self.node_tags.serialize(tag)?;
                }
            }
            ElementKind::Way => {
                self.ways.write_record(shaped.record.row())?;
                for way_node in &shaped.way_nodes {
                    self.way_nodes.serialize(way_node)?;
                }
                for tag in &shaped.tags {
                    self.way_tags.serialize(tag)?;
                }
            }
            kind @ ElementKind::Relation => {
                return Err(CleaningError::UnsupportedElement(kind).into());
            }
        }
        Ok(())
    }

    /// Flushes all five files.
    ///
    /// # Errors
    ///
    /// Returns an error if any buffered rows cannot be written out.
    pub fn flush(&mut self) -> Result<(), ExportError> {
        for writer in [
            &mut self.nodes,
            &mut self.node_tags,
            &mut self.ways,
            &mut self.way_nodes,
            &mut self.way_tags,
        ] {
            writer.flush().map_err(|e| ExportError::Io {
                path: self.output_dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }
}

fn open_writer(output_dir: &Path, kind: RecordKind) -> Result<csv::Writer<File>, ExportError> {
    let path = output_dir.join(kind.file_name());
    log::debug!("Writing {kind} records to {}", path.display());

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)?;
    writer.write_record(kind.columns())?;
    Ok(writer)
}
