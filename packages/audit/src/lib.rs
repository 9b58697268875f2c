#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data-quality audit of an OSM extract.
//!
//! Run before cleaning to see which problems the extract actually has:
//! odd tag keys, abbreviated street types, malformed postcodes. The whole
//! audit is one streaming pass; feed every element to
//! [`Auditor::observe`] and call [`Auditor::finish`] at the end, or let
//! [`audit_path`] do both.

pub mod report;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use osm_scrub_cleaning::classify::classify_key;
use osm_scrub_cleaning::postcode::is_valid_postcode;
use osm_scrub_cleaning::street::fix_street_name;
use osm_scrub_cleaning_models::{CleaningConfig, Element, ElementKind, KeyCategory};
use osm_scrub_osm::OsmError;
use osm_scrub_osm::progress::ProgressCallback;
use regex::Regex;

pub use report::AuditReport;

/// Errors from running or rendering an audit.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The extract could not be read.
    #[error(transparent)]
    Osm(#[from] OsmError),

    /// The report could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Last word of a street name, optionally followed by one character.
static STREET_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([A-Z]?[a-z]+).?$|\b(\d+).?$").expect("valid regex")
});

/// Full tag key holding a street name.
const STREET_TAG: &str = "addr:street";

/// Full tag keys whose values are audited as postcodes.
const POSTCODE_TAGS: &[&str] = &["addr:postcode", "tiger:zip_left", "tiger:zip_right"];

/// Accumulates audit statistics one element at a time.
pub struct Auditor<'a> {
    config: &'a CleaningConfig,
    key_categories: BTreeMap<KeyCategory, u64>,
    users: BTreeSet<String>,
    unexpected_street_types: BTreeMap<String, BTreeSet<String>>,
    street_type_counts: BTreeMap<String, u64>,
    unexpected_postcodes: BTreeMap<String, u64>,
    street_corrections: BTreeMap<String, String>,
}

impl<'a> Auditor<'a> {
    /// Creates an auditor with every counter at zero.
    #[must_use]
    pub fn new(config: &'a CleaningConfig) -> Self {
        Self {
            config,
            key_categories: KeyCategory::ALL.iter().map(|c| (*c, 0)).collect(),
            users: BTreeSet::new(),
            unexpected_street_types: BTreeMap::new(),
            street_type_counts: config
                .audit
                .expected_street_types
                .iter()
                .map(|street_type| (street_type.clone(), 0))
                .collect(),
            unexpected_postcodes: BTreeMap::new(),
            street_corrections: BTreeMap::new(),
        }
    }

    /// Adds one element to the statistics.
    ///
    /// Key categories and users are collected from every element kind.
    /// Street names and postcodes are only audited on nodes and ways.
    pub fn observe(&mut self, element: &Element) {
        if let Some(user) = element.attribute("user") {
            self.users.insert(user.to_string());
        }

        let address_bearing = matches!(element.kind, ElementKind::Node | ElementKind::Way);

        for tag in &element.tags {
            let Some(key) = tag.key.as_deref() else {
                continue;
            };
            *self.key_categories.entry(classify_key(key)).or_default() += 1;

            let Some(value) = tag.value.as_deref() else {
                continue;
            };
            if !address_bearing {
                continue;
            }

            if key == STREET_TAG {
                self.observe_street(value);
            } else if POSTCODE_TAGS.contains(&key) {
                self.observe_postcode(value);
            }
        }
    }

    fn observe_street(&mut self, street: &str) {
        if let Some(m) = STREET_TYPE_RE.find(street) {
            let street_type = m.as_str();
            if let Some(count) = self.street_type_counts.get_mut(street_type) {
                *count += 1;
            } else {
                self.unexpected_street_types
                    .entry(street_type.to_string())
                    .or_default()
                    .insert(street.to_string());
            }
        }

        let fixed = fix_street_name(street, &self.config.street);
        if fixed != street {
            self.street_corrections.insert(street.to_string(), fixed);
        }
    }

    fn observe_postcode(&mut self, postcode: &str) {
        if !is_valid_postcode(postcode, &self.config.postcode) {
            *self
                .unexpected_postcodes
                .entry(postcode.to_string())
                .or_default() += 1;
        }
    }

    /// Builds the report, attaching the element-name counts kept by the
    /// reader.
    #[must_use]
    pub fn finish(self, element_counts: BTreeMap<String, u64>) -> AuditReport {
        AuditReport {
            element_counts,
            key_categories: self.key_categories,
            unique_users: self.users.len(),
            unexpected_street_types: self.unexpected_street_types,
            street_type_counts: self.street_type_counts,
            unexpected_postcodes: self.unexpected_postcodes,
            street_corrections: self.street_corrections,
        }
    }
}

/// Audits the extract at `path` in one pass.
///
/// # Errors
///
/// Returns an error if the extract cannot be read or parsed.
pub fn audit_path(
    path: &Path,
    config: &CleaningConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<AuditReport, AuditError> {
    let mut reader = osm_scrub_osm::open_path(path, ElementKind::ALL)?;
    let mut auditor = Auditor::new(config);

    progress.set_message(format!("Auditing {}", path.display()));

    for element in reader.by_ref() {
        auditor.observe(&element?);
        progress.inc(1);
    }

    let report = auditor.finish(reader.into_element_counts());
    let elements: u64 = ElementKind::ALL
        .iter()
        .filter_map(|kind| report.element_counts.get(&kind.to_string()))
        .sum();
    progress.finish(format!("Audited {elements} elements"));
    log::info!(
        "Audit found {} unexpected street types and {} unexpected postcodes",
        report.unexpected_street_types.len(),
        report.unexpected_postcodes.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use osm_scrub_cleaning_models::RawTag;
    use osm_scrub_osm::progress::null_progress;

    use super::*;

    fn audit(elements: &[Element]) -> AuditReport {
        let config = CleaningConfig::default();
        let mut auditor = Auditor::new(&config);
        for element in elements {
            auditor.observe(element);
        }
        auditor.finish(BTreeMap::new())
    }

    fn node(id: &str) -> Element {
        Element::new(ElementKind::Node).with_attribute("id", id)
    }

    #[test]
    fn categorizes_every_key() {
        let mut odd = node("1")
            .with_tag("highway", "residential")
            .with_tag("addr:city", "Denver")
            .with_tag("name:en=x", "Denver")
            .with_tag("FIXME", "check");
        odd.tags.push(RawTag {
            key: None,
            value: Some("orphan".to_string()),
        });

        let report = audit(&[odd]);

        assert_eq!(report.key_categories[&KeyCategory::Lower], 1);
        assert_eq!(report.key_categories[&KeyCategory::LowerColon], 1);
        assert_eq!(report.key_categories[&KeyCategory::ProblemChars], 1);
        assert_eq!(report.key_categories[&KeyCategory::Other], 1);
    }

    #[test]
    fn counts_unique_users_across_kinds() {
        let report = audit(&[
            node("1").with_attribute("user", "alice"),
            node("2").with_attribute("user", "alice"),
            Element::new(ElementKind::Way).with_attribute("user", "bob"),
            Element::new(ElementKind::Relation).with_attribute("user", "carol"),
            node("3"),
        ]);
        assert_eq!(report.unique_users, 3);
    }

    #[test]
    fn sorts_street_types_into_expected_and_unexpected() {
        let report = audit(&[
            node("1").with_tag("addr:street", "Main Street"),
            node("2").with_tag("addr:street", "Pearl St"),
            node("3").with_tag("addr:street", "Broadway St"),
            node("4").with_tag("addr:street", "Walnut Ave."),
        ]);

        assert_eq!(report.street_type_counts["Street"], 1);
        assert_eq!(report.street_type_counts["Lane"], 0);
        assert_eq!(
            report.unexpected_street_types["St"],
            BTreeSet::from(["Pearl St".to_string(), "Broadway St".to_string()])
        );
        assert!(report.unexpected_street_types.contains_key("Ave."));
    }

    #[test]
    fn previews_street_corrections() {
        let report = audit(&[
            node("1").with_tag("addr:street", "Pearl St"),
            node("2").with_tag("addr:street", "Main Street"),
            node("3").with_tag("addr:street", "1st Ave Apt E"),
        ]);

        assert_eq!(report.street_corrections.len(), 2);
        assert_eq!(report.street_corrections["Pearl St"], "Pearl Street");
        assert_eq!(report.street_corrections["1st Ave Apt E"], "1st Avenue Apt E");
    }

    #[test]
    fn counts_unexpected_postcodes_from_address_and_tiger_tags() {
        let report = audit(&[
            node("1").with_tag("addr:postcode", "80301"),
            node("2").with_tag("addr:postcode", "80301-1234"),
            node("3").with_tag("tiger:zip_left", "99999"),
            node("4").with_tag("tiger:zip_right", "99999"),
            node("5").with_tag("postal_code", "12"),
        ]);

        assert_eq!(
            report.unexpected_postcodes,
            BTreeMap::from([("80301-1234".to_string(), 1), ("99999".to_string(), 2)])
        );
    }

    #[test]
    fn ignores_address_tags_on_relations() {
        let relation = Element::new(ElementKind::Relation)
            .with_tag("addr:street", "Pearl St")
            .with_tag("addr:postcode", "99999");

        let report = audit(&[relation]);

        assert!(report.unexpected_street_types.is_empty());
        assert!(report.unexpected_postcodes.is_empty());
        assert_eq!(report.key_categories[&KeyCategory::LowerColon], 2);
    }

    #[test]
    fn audits_file_in_one_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.osm");
        std::fs::write(
            &path,
            r#"<osm version="0.6">
              <node id="1" user="alice"><tag k="addr:street" v="Pearl St"/></node>
              <way id="2" user="bob"><nd ref="1"/><tag k="addr:postcode" v="CO80301"/></way>
              <relation id="3" user="alice"><member type="way" ref="2"/></relation>
            </osm>"#,
        )
        .unwrap();

        let report = audit_path(&path, &CleaningConfig::default(), &null_progress()).unwrap();

        assert_eq!(report.element_counts["node"], 1);
        assert_eq!(report.element_counts["tag"], 2);
        assert_eq!(report.element_counts["member"], 1);
        assert_eq!(report.unique_users, 2);
        assert_eq!(report.unexpected_postcodes["CO80301"], 1);
        assert_eq!(report.street_corrections["Pearl St"], "Pearl Street");
    }
}
