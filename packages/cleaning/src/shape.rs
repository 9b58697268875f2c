//! Turns one raw element into its flat record set.

use osm_scrub_cleaning_models::{
    CleaningConfig, Element, ElementKind, ElementRecord, ShapedElement, TagRecord, WayNodeRecord,
};

use crate::{CleaningError, classify, postcode, street, tiger};

/// The records of one element plus every problem met while building them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeOutcome {
    /// Flat records ready to be written.
    pub shaped: ShapedElement,
    /// Sub-records that were skipped or dropped, and why.
    pub issues: Vec<CleaningError>,
}

/// Shapes a node or way into flat records.
///
/// The element record keeps only the declared fields present on the source.
/// Tags go through classification, TIGER folding, street-name normalization
/// and postcode repair, in that order. Way-node records carry the zero-based
/// position of each reference in the way.
///
/// An element without an `id` still yields its element record, but no tag or
/// way-node records since they could not be linked back to it.
///
/// # Errors
///
/// Returns [`CleaningError::UnsupportedElement`] for relations.
pub fn shape_element(
    element: &Element,
    config: &CleaningConfig,
) -> Result<ShapeOutcome, CleaningError> {
    let kind = element.kind;
    let declared = kind
        .declared_fields()
        .ok_or(CleaningError::UnsupportedElement(kind))?;

    let record = ElementRecord {
        kind,
        fields: declared
            .iter()
            .filter_map(|field| {
                element
                    .attribute(field)
                    .map(|value| ((*field).to_string(), value.to_string()))
            })
            .collect(),
    };

    let mut issues = Vec::new();

    let Some(id) = element.id() else {
        issues.push(CleaningError::MissingAttribute {
            element: kind.to_string(),
            attribute: "id",
        });
        return Ok(ShapeOutcome {
            shaped: ShapedElement {
                record,
                tags: Vec::new(),
                way_nodes: Vec::new(),
            },
            issues,
        });
    };

    let tags = decompose_tags(element, id, &mut issues);
    let tags = tiger::reduce_tiger_tags(tags, &config.tiger);
    let tags = street::clean_street_names(tags, &config.street);
    let (tags, postcode_issues) = postcode::clean_postcodes(tags, &config.postcode);
    issues.extend(postcode_issues);

    let way_nodes = if kind == ElementKind::Way {
        way_node_records(element, id, &mut issues)
    } else {
        Vec::new()
    };

    Ok(ShapeOutcome {
        shaped: ShapedElement {
            record,
            tags,
            way_nodes,
        },
        issues,
    })
}

fn decompose_tags(element: &Element, id: &str, issues: &mut Vec<CleaningError>) -> Vec<TagRecord> {
    let mut tags = Vec::with_capacity(element.tags.len());

    for raw in &element.tags {
        match classify::decompose_tag(raw) {
            Ok(tag) => tags.push(TagRecord::from_tag(id, tag)),
            Err(CleaningError::MissingAttribute { attribute, .. }) => {
                issues.push(CleaningError::MissingAttribute {
                    element: format!("tag of {} {id}", element.kind),
                    attribute,
                });
            }
            Err(e) => issues.push(e),
        }
    }

    tags
}

fn way_node_records(
    element: &Element,
    id: &str,
    issues: &mut Vec<CleaningError>,
) -> Vec<WayNodeRecord> {
    let mut records = Vec::with_capacity(element.node_refs.len());

    for (position, node_ref) in element.node_refs.iter().enumerate() {
        if let Some(node_id) = &node_ref.reference {
            records.push(WayNodeRecord {
                id: id.to_string(),
                node_id: node_id.clone(),
                position,
            });
        } else {
            issues.push(CleaningError::MissingAttribute {
                element: format!("nd #{position} of way {id}"),
                attribute: "ref",
            });
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use osm_scrub_cleaning_models::{RawNodeRef, RawTag};

    use super::*;

    fn shape(element: &Element) -> ShapeOutcome {
        shape_element(element, &CleaningConfig::default()).unwrap()
    }

    #[test]
    fn copies_declared_fields_only() {
        let node = Element::new(ElementKind::Node)
            .with_attribute("id", "1")
            .with_attribute("lat", "39.74")
            .with_attribute("lon", "-104.99")
            .with_attribute("visible", "true")
            .with_attribute("user", "mapper");

        let outcome = shape(&node);
        let record = &outcome.shaped.record;

        assert_eq!(record.get("id"), Some("1"));
        assert_eq!(record.get("user"), Some("mapper"));
        assert_eq!(record.get("visible"), None);
        assert_eq!(record.get("timestamp"), None);
        assert_eq!(record.fields.len(), 4);
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn way_record_has_no_coordinates() {
        let way = Element::new(ElementKind::Way)
            .with_attribute("id", "2")
            .with_attribute("lat", "1.0");
        assert_eq!(shape(&way).shaped.record.get("lat"), None);
    }

    #[test]
    fn stamps_way_node_positions() {
        let way = Element::new(ElementKind::Way)
            .with_attribute("id", "20")
            .with_node_ref("A")
            .with_node_ref("B")
            .with_node_ref("C");

        let nodes = shape(&way).shaped.way_nodes;

        let pairs: Vec<(&str, usize)> = nodes
            .iter()
            .map(|n| (n.node_id.as_str(), n.position))
            .collect();
        assert_eq!(pairs, vec![("A", 0), ("B", 1), ("C", 2)]);
        assert!(nodes.iter().all(|n| n.id == "20"));
    }

    #[test]
    fn cleans_tiger_street_and_postcode_end_to_end() {
        let node = Element::new(ElementKind::Node)
            .with_attribute("id", "3")
            .with_tag("tiger:zip_left", "80301")
            .with_tag("addr:street", "Main St");

        let outcome = shape(&node);

        assert_eq!(
            outcome.shaped.tag("addr", "postcode").map(|t| t.value.as_str()),
            Some("80301")
        );
        assert_eq!(
            outcome.shaped.tag("addr", "street").map(|t| t.value.as_str()),
            Some("Main Street")
        );
        assert!(outcome.shaped.tags.iter().all(|t| t.id == "3"));
    }

    #[test]
    fn normalizes_assembled_tiger_street() {
        let way = Element::new(ElementKind::Way)
            .with_attribute("id", "4")
            .with_tag("tiger:name_type", "Ave")
            .with_tag("tiger:name_base", "Pearl")
            .with_tag("tiger:county", "Boulder, CO")
            .with_tag("tiger:zip_left", "80302-4411");

        let tags = shape(&way).shaped.tags;

        assert_eq!(
            tags,
            vec![
                TagRecord::new("4", "addr", "county", "Boulder"),
                TagRecord::new("4", "addr", "postcode", "80302"),
                TagRecord::new("4", "addr", "street", "Pearl Avenue"),
            ]
        );
    }

    #[test]
    fn reports_and_skips_bad_sub_records() {
        let mut way = Element::new(ElementKind::Way)
            .with_attribute("id", "5")
            .with_tag("highway", "service")
            .with_tag("addr:postcode", "99999")
            .with_node_ref("10");
        way.tags.push(RawTag {
            key: Some("name".to_string()),
            value: None,
        });
        way.node_refs.push(RawNodeRef { reference: None });
        way.node_refs.push(RawNodeRef::new("12"));

        let outcome = shape(&way);

        assert_eq!(outcome.shaped.tags.len(), 1);
        assert_eq!(outcome.shaped.way_nodes.len(), 2);
        assert_eq!(outcome.shaped.way_nodes[1].position, 2);
        assert_eq!(outcome.issues.len(), 3);
        assert!(outcome
            .issues
            .contains(&CleaningError::InvalidPostalCode("99999".to_string())));
        assert!(outcome.issues.contains(&CleaningError::MissingAttribute {
            element: "tag of way 5".to_string(),
            attribute: "v",
        }));
    }

    #[test]
    fn element_without_id_keeps_only_its_record() {
        let node = Element::new(ElementKind::Node)
            .with_attribute("lat", "1.0")
            .with_tag("amenity", "cafe");

        let outcome = shape(&node);

        assert_eq!(outcome.shaped.record.get("lat"), Some("1.0"));
        assert!(outcome.shaped.tags.is_empty());
        assert_eq!(
            outcome.issues,
            vec![CleaningError::MissingAttribute {
                element: "node".to_string(),
                attribute: "id",
            }]
        );
    }

    #[test]
    fn rejects_relations() {
        let relation = Element::new(ElementKind::Relation).with_attribute("id", "6");
        assert_eq!(
            shape_element(&relation, &CleaningConfig::default()),
            Err(CleaningError::UnsupportedElement(ElementKind::Relation))
        );
    }
}
