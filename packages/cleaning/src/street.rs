//! Street-name normalization.
//!
//! Replaces abbreviated street types ("St", "Ave.", "Blvd") with their
//! canonical form, token by token. A token right after a unit designator is
//! left alone so "Apt Dr" or "Suite St" keep their unit identifiers.

use osm_scrub_cleaning_models::{StreetConfig, TagRecord};

/// Tag key whose values are street names.
pub const STREET_KEY: &str = "street";

/// Rewrites abbreviated tokens of a street name.
///
/// Tokens are whitespace-delimited and must match a mapping key exactly.
/// When at least one token changes the result is rejoined with single
/// spaces, otherwise the input is returned as-is.
#[must_use]
pub fn fix_street_name(address: &str, config: &StreetConfig) -> String {
    let mut words: Vec<&str> = address.split_whitespace().collect();
    let mut changed = false;

    for index in 0..words.len() {
        let Some(canonical) = config.mapping.get(words[index]) else {
            continue;
        };
        if index > 0 && is_unit_designator(words[index - 1], config) {
            continue;
        }
        words[index] = canonical.as_str();
        changed = true;
    }

    if changed {
        words.join(" ")
    } else {
        address.to_string()
    }
}

fn is_unit_designator(token: &str, config: &StreetConfig) -> bool {
    let folded = token.to_lowercase();
    config
        .unit_designators
        .iter()
        .any(|designator| *designator == folded)
}

/// Applies [`fix_street_name`] to every tag keyed `street`.
#[must_use]
pub fn clean_street_names(tags: Vec<TagRecord>, config: &StreetConfig) -> Vec<TagRecord> {
    tags.into_iter()
        .map(|mut tag| {
            if tag.key == STREET_KEY {
                let fixed = fix_street_name(&tag.value, config);
                if fixed != tag.value {
                    log::trace!("street {:?} -> {fixed:?} (element {})", tag.value, tag.id);
                    tag.value = fixed;
                }
            }
            tag
        })
        .collect()
}
