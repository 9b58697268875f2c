#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Streaming reader for OpenStreetMap XML extracts.
//!
//! [`ElementReader`] pulls one top-level element (`node`, `way`, `relation`)
//! at a time from the document together with its `<tag>` and `<nd>`
//! children, so memory use does not grow with the size of the extract.
//!
//! Files ending in `.gz` are decompressed on the fly by [`open_path`].

pub mod progress;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use osm_scrub_cleaning_models::{Element, ElementKind, RawNodeRef, RawTag};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Errors that can occur while reading an OSM extract.
#[derive(Debug, thiserror::Error)]
pub enum OsmError {
    /// The XML stream is malformed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An attribute could not be parsed.
    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// An attribute name is not valid UTF-8.
    #[error("Invalid UTF-8 in attribute name: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The input file could not be opened.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path of the input file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The input file does not exist.
    #[error("OSM file not found: {0}")]
    FileNotFound(String),
}

/// Pull-based iterator over the top-level elements of an OSM XML document.
///
/// Only elements whose kind was requested are yielded; the others are
/// skipped along with their children. Every XML element name seen,
/// requested or not, is counted in [`ElementReader::element_counts`].
///
/// Iteration stops after the first error.
pub struct ElementReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    kinds: Vec<ElementKind>,
    current: Option<Element>,
    element_counts: BTreeMap<String, u64>,
    finished: bool,
}

impl<R: BufRead> ElementReader<R> {
    /// Wraps a buffered source, yielding elements of the given kinds.
    #[must_use]
    pub fn new(source: R, kinds: &[ElementKind]) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);

        Self {
            reader,
            buf: Vec::new(),
            kinds: kinds.to_vec(),
            current: None,
            element_counts: BTreeMap::new(),
            finished: false,
        }
    }

    /// Occurrences of each XML element name read so far.
    #[must_use]
    pub const fn element_counts(&self) -> &BTreeMap<String, u64> {
        &self.element_counts
    }

    /// Consumes the reader, returning the element-name counts.
    #[must_use]
    pub fn into_element_counts(self) -> BTreeMap<String, u64> {
        self.element_counts
    }

    fn next_element(&mut self) -> Result<Option<Element>, OsmError> {
        loop {
            let yielded = match self.reader.read_event_into(&mut self.buf)? {
                Event::Eof => return Ok(None),
                Event::Start(e) => {
                    count_name(&mut self.element_counts, &e);
                    match ElementKind::from_xml_name(e.name().as_ref()) {
                        Some(kind) => {
                            self.current = if self.kinds.contains(&kind) {
                                Some(start_element(kind, &e)?)
                            } else {
                                None
                            };
                        }
                        None => {
                            if let Some(current) = self.current.as_mut() {
                                push_child(current, &e)?;
                            }
                        }
                    }
                    None
                }
                Event::Empty(e) => {
                    count_name(&mut self.element_counts, &e);
                    match ElementKind::from_xml_name(e.name().as_ref()) {
                        Some(kind) if self.kinds.contains(&kind) => {
                            Some(start_element(kind, &e)?)
                        }
                        Some(_) => None,
                        None => {
                            if let Some(current) = self.current.as_mut() {
                                push_child(current, &e)?;
                            }
                            None
                        }
                    }
                }
                Event::End(e) => match ElementKind::from_xml_name(e.name().as_ref()) {
                    Some(kind) if self.current.as_ref().is_some_and(|c| c.kind == kind) => {
                        self.current.take()
                    }
                    _ => None,
                },
                _ => None,
            };
            self.buf.clear();

            if yielded.is_some() {
                return Ok(yielded);
            }
        }
    }
}

impl<R: BufRead> Iterator for ElementReader<R> {
    type Item = Result<Element, OsmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Opens an OSM XML file, decompressing it if the name ends in `.gz`.
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be opened.
pub fn open_path(
    path: &Path,
    kinds: &[ElementKind],
) -> Result<ElementReader<Box<dyn BufRead>>, OsmError> {
    if !path.exists() {
        return Err(OsmError::FileNotFound(path.display().to_string()));
    }

    let file = File::open(path).map_err(|e| OsmError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let source: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
        log::info!("Reading gzip-compressed extract {}", path.display());
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        log::info!("Reading extract {}", path.display());
        Box::new(BufReader::new(file))
    };

    Ok(ElementReader::new(source, kinds))
}

fn count_name(counts: &mut BTreeMap<String, u64>, event: &BytesStart<'_>) {
    let name = String::from_utf8_lossy(event.name().as_ref()).into_owned();
    *counts.entry(name).or_default() += 1;
}

fn start_element(kind: ElementKind, event: &BytesStart<'_>) -> Result<Element, OsmError> {
    let mut element = Element::new(kind);
    for attr in event.attributes().with_checks(false) {
        let attr = attr?;
        let name = std::str::from_utf8(attr.key.as_ref())?.to_string();
        element
            .attributes
            .insert(name, attr.unescape_value()?.into_owned());
    }
    Ok(element)
}

fn push_child(element: &mut Element, event: &BytesStart<'_>) -> Result<(), OsmError> {
    match event.name().as_ref() {
        b"tag" => element.tags.push(RawTag {
            key: get_attr_value(event, b"k")?,
            value: get_attr_value(event, b"v")?,
        }),
        b"nd" => element.node_refs.push(RawNodeRef {
            reference: get_attr_value(event, b"ref")?,
        }),
        _ => {}
    }
    Ok(())
}

fn get_attr_value(event: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, OsmError> {
    for attr in event.attributes().with_checks(false) {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <bounds minlat="39.6" minlon="-105.3" maxlat="40.1" maxlon="-104.8"/>
  <node id="1" lat="39.74" lon="-104.99" user="alice" uid="7" version="2"/>
  <node id="2" lat="39.75" lon="-104.98" user="bob">
    <tag k="addr:street" v="Main St"/>
    <tag k="name" v="Tom &amp; Jerry's"/>
  </node>
  <way id="10" user="alice">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="residential"/>
  </way>
  <relation id="100" user="carol">
    <member type="way" ref="10" role="outer"/>
    <tag k="type" v="multipolygon"/>
  </relation>
</osm>
"#;

    fn read_all(kinds: &[ElementKind]) -> (Vec<Element>, BTreeMap<String, u64>) {
        let mut reader = ElementReader::new(SAMPLE.as_bytes(), kinds);
        let elements = reader.by_ref().collect::<Result<Vec<_>, _>>().unwrap();
        (elements, reader.into_element_counts())
    }

    #[test]
    fn reads_nodes_and_ways_with_children() {
        let (elements, _) = read_all(&[ElementKind::Node, ElementKind::Way]);

        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].id(), Some("1"));
        assert!(elements[0].tags.is_empty());
        assert_eq!(elements[0].attribute("uid"), Some("7"));

        assert_eq!(elements[1].tags.len(), 2);
        assert_eq!(elements[1].tags[1].value.as_deref(), Some("Tom & Jerry's"));

        let way = &elements[2];
        assert_eq!(way.kind, ElementKind::Way);
        assert_eq!(
            way.node_refs,
            vec![RawNodeRef::new("1"), RawNodeRef::new("2")]
        );
        assert_eq!(way.tags, vec![RawTag::new("highway", "residential")]);
    }

    #[test]
    fn skips_unrequested_kinds() {
        let (elements, _) = read_all(&[ElementKind::Way]);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].id(), Some("10"));
        assert!(elements[0].tags.iter().all(|t| t.key.as_deref() != Some("addr:street")));
    }

    #[test]
    fn relations_do_not_collect_members_as_node_refs() {
        let (elements, _) = read_all(&[ElementKind::Relation]);
        assert_eq!(elements.len(), 1);
        assert!(elements[0].node_refs.is_empty());
        assert_eq!(elements[0].tags, vec![RawTag::new("type", "multipolygon")]);
    }

    #[test]
    fn counts_every_element_name() {
        let (_, counts) = read_all(&[ElementKind::Node]);

        assert_eq!(counts.get("osm"), Some(&1));
        assert_eq!(counts.get("bounds"), Some(&1));
        assert_eq!(counts.get("node"), Some(&2));
        assert_eq!(counts.get("way"), Some(&1));
        assert_eq!(counts.get("nd"), Some(&2));
        assert_eq!(counts.get("tag"), Some(&4));
        assert_eq!(counts.get("member"), Some(&1));
        assert_eq!(counts.get("relation"), Some(&1));
    }

    #[test]
    fn keeps_tags_with_missing_attributes() {
        let xml = r#"<osm><node id="1"><tag k="name"/><nd/></node></osm>"#;
        let elements: Vec<Element> = ElementReader::new(xml.as_bytes(), &[ElementKind::Node])
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            elements[0].tags,
            vec![RawTag {
                key: Some("name".to_string()),
                value: None,
            }]
        );
        assert_eq!(elements[0].node_refs, vec![RawNodeRef { reference: None }]);
    }

    #[test]
    fn stops_after_malformed_xml() {
        let xml = r#"<osm><node id="1"></way></osm>"#;
        let mut reader = ElementReader::new(xml.as_bytes(), &[ElementKind::Node]);

        assert!(matches!(reader.next(), Some(Err(OsmError::Xml(_)))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn opens_plain_and_gzip_files() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("map.osm");
        std::fs::write(&plain, SAMPLE).unwrap();

        let gzipped = dir.path().join("map.osm.gz");
        let mut encoder = flate2::write::GzEncoder::new(
            File::create(&gzipped).unwrap(),
            flate2::Compression::default(),
        );
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        for path in [&plain, &gzipped] {
            let count = open_path(path, &[ElementKind::Node])
                .unwrap()
                .filter(Result::is_ok)
                .count();
            assert_eq!(count, 2, "{}", path.display());
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let result = open_path(Path::new("/nonexistent/map.osm"), &[ElementKind::Node]);
        assert!(matches!(result, Err(OsmError::FileNotFound(_))));
    }
}
