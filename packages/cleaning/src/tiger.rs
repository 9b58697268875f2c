//! Folding of TIGER import tags into standard `addr:*` tags.
//!
//! US Census TIGER imports spread address data over `tiger:*` keys. The
//! reducer maps the useful ones onto the `addr` namespace:
//!
//! - `tiger:county` → `addr:county` (state suffix after the comma removed)
//! - `tiger:zip_left` → `addr:postcode`
//! - `tiger:name_direction_prefix` + `tiger:name_base` + `tiger:name_type`
//!   → one `addr:street`, always assembled in that order

use osm_scrub_cleaning_models::{TagRecord, TigerConfig};

/// Namespace of TIGER import tags.
pub const TIGER_TAG_TYPE: &str = "tiger";

/// Namespace of standard address tags.
pub const ADDR_TAG_TYPE: &str = "addr";

/// The three pieces of a TIGER street name.
#[derive(Debug, Default)]
struct StreetFragments {
    direction_prefix: Option<String>,
    base: Option<String>,
    street_type: Option<String>,
}

impl StreetFragments {
    fn joined(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.direction_prefix, &self.base, &self.street_type]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Replaces every `tiger:*` tag with its `addr:*` equivalent.
///
/// Non-TIGER tags pass through unchanged and in order. County and postcode
/// tags are emitted where their TIGER source stood. The assembled
/// `addr:street` tag, if any fragment was present, is appended last. TIGER
/// subtypes without a rule are dropped unless
/// [`TigerConfig::keep_unmapped`] is set.
#[must_use]
pub fn reduce_tiger_tags(tags: Vec<TagRecord>, config: &TigerConfig) -> Vec<TagRecord> {
    let mut reduced = Vec::with_capacity(tags.len());
    let mut street = StreetFragments::default();
    let mut street_owner: Option<String> = None;

    for tag in tags {
        if tag.tag_type != TIGER_TAG_TYPE {
            reduced.push(tag);
            continue;
        }

        match tag.key.as_str() {
            "county" => {
                let county = tag
                    .value
                    .split_once(',')
                    .map_or(tag.value.as_str(), |(county, _)| county);
                reduced.push(TagRecord::new(&tag.id, ADDR_TAG_TYPE, "county", county));
            }
            "zip_left" => {
                reduced.push(TagRecord::new(tag.id, ADDR_TAG_TYPE, "postcode", tag.value));
            }
            "name_direction_prefix" => {
                street.direction_prefix = Some(tag.value);
                street_owner = Some(tag.id);
            }
            "name_base" => {
                street.base = Some(tag.value);
                street_owner = Some(tag.id);
            }
            "name_type" => {
                street.street_type = Some(tag.value);
                street_owner = Some(tag.id);
            }
            _ if config.keep_unmapped => reduced.push(tag),
            other => log::trace!("dropping unmapped tiger:{other} of element {}", tag.id),
        }
    }

    if let Some(id) = street_owner
        && let Some(value) = street.joined()
    {
        reduced.push(TagRecord::new(id, ADDR_TAG_TYPE, "street", value));
    }

    reduced
}
