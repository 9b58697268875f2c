//! Postcode validation and repair.
//!
//! A postcode is valid when it has exactly [`PostcodeConfig::length`]
//! characters and starts with [`PostcodeConfig::region_prefix`]. Malformed
//! values seen in the Denver/Boulder extract are repaired by a fixed sequence
//! of rules:
//!
//! | Input              | Output                   |
//! |--------------------|--------------------------|
//! | `80301`            | `80301`                  |
//! | `80301-1234`       | `80301`                  |
//! | `CO80301`          | `80301`                  |
//! | `Golden, CO 80401` | `80401`                  |
//! | `80301;80302`      | `80301`, `80302`         |
//! | `80301:80303`      | `80301`, `80302`         |
//! | `99999`            | dropped, reported        |

use osm_scrub_cleaning_models::{PostcodeConfig, TagRecord};

use crate::CleaningError;

/// Tag key whose values are postcodes.
pub const POSTCODE_KEY: &str = "postcode";

/// Returns `true` if `code` has the configured length and region prefix.
#[must_use]
pub fn is_valid_postcode(code: &str, config: &PostcodeConfig) -> bool {
    code.chars().count() == config.length && code.starts_with(config.region_prefix.as_str())
}

/// Repairs one raw postcode value into zero or more valid postcodes.
///
/// All whitespace is removed first. A multi-value (`;`) or range (`:`) input
/// yields only its valid members, which may be none.
///
/// # Errors
///
/// * [`CleaningError::RangeExpansion`] if a `:` range has non-numeric bounds
///   or spans more than [`PostcodeConfig::max_range_span`] values.
/// * [`CleaningError::InvalidPostalCode`] if no rule applies.
pub fn normalize_postcode(raw: &str, config: &PostcodeConfig) -> Result<Vec<String>, CleaningError> {
    let code: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    if is_valid_postcode(&code, config) {
        return Ok(vec![code]);
    }

    if let Some(base) = strip_plus_four(&code, config) {
        return Ok(vec![base.to_string()]);
    }

    for prefix in &config.strip_prefixes {
        if let Some(rest) = code.strip_prefix(prefix.as_str())
            && is_valid_postcode(rest, config)
        {
            return Ok(vec![rest.to_string()]);
        }
    }

    if code.contains(';') {
        return Ok(code
            .split(';')
            .filter(|segment| is_valid_postcode(segment, config))
            .map(ToString::to_string)
            .collect());
    }

    if code.contains(':') {
        return expand_range(&code, config);
    }

    Err(CleaningError::InvalidPostalCode(code))
}

/// `80301-1234` → `80301`.
fn strip_plus_four<'a>(code: &'a str, config: &PostcodeConfig) -> Option<&'a str> {
    let split = code.char_indices().nth(config.length)?.0;
    let (base, extension) = code.split_at(split);
    let digits = extension.strip_prefix('-')?;
    (digits.chars().count() == 4 && is_valid_postcode(base, config)).then_some(base)
}

/// Expands `start:end` to every valid postcode in `[start, end)`.
fn expand_range(code: &str, config: &PostcodeConfig) -> Result<Vec<String>, CleaningError> {
    let range_error = |reason: String| CleaningError::RangeExpansion {
        value: code.to_string(),
        reason,
    };

    let (start, rest) = code.split_once(':').unwrap_or((code, ""));
    let end = rest.split(':').next().unwrap_or_default();

    let start: i64 = start
        .parse()
        .map_err(|e| range_error(format!("start {start:?} is not a number ({e})")))?;
    let end: i64 = end
        .parse()
        .map_err(|e| range_error(format!("end {end:?} is not a number ({e})")))?;

    match end.checked_sub(start) {
        Some(span) if span <= 0 => return Ok(Vec::new()),
        Some(span) if span.unsigned_abs() <= config.max_range_span => {}
        _ => {
            return Err(range_error(format!(
                "spans more than {} values",
                config.max_range_span
            )));
        }
    }

    Ok((start..end)
        .map(|value| value.to_string())
        .filter(|candidate| is_valid_postcode(candidate, config))
        .collect())
}

/// Applies [`normalize_postcode`] to every tag keyed `postcode`.
///
/// Returns the new tag list, where each postcode tag is replaced in place by
/// its repaired copies, and the problems found along the way. Tags whose
/// postcode cannot be repaired are dropped.
#[must_use]
pub fn clean_postcodes(
    tags: Vec<TagRecord>,
    config: &PostcodeConfig,
) -> (Vec<TagRecord>, Vec<CleaningError>) {
    let mut cleaned = Vec::with_capacity(tags.len());
    let mut issues = Vec::new();

    for tag in tags {
        if tag.key != POSTCODE_KEY {
            cleaned.push(tag);
            continue;
        }

        match normalize_postcode(&tag.value, config) {
            Ok(codes) => {
                if codes.is_empty() {
                    log::debug!(
                        "postcode {:?} of element {} has no valid members",
                        tag.value,
                        tag.id
                    );
                }
                cleaned.extend(codes.into_iter().map(|code| tag.with_value(code)));
            }
            Err(e) => issues.push(e),
        }
    }

    (cleaned, issues)
}
