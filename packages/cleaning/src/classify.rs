//! Tag key decomposition and classification.

use std::sync::LazyLock;

use osm_scrub_cleaning_models::{KeyCategory, REGULAR_TAG_TYPE, RawTag, Tag};
use regex::Regex;

use crate::CleaningError;

/// Keys made only of lowercase letters and underscores.
static LOWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_]*$").expect("valid regex"));

/// Two lowercase segments joined by a single colon.
static LOWER_COLON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_]*:[a-z_]*$").expect("valid regex"));

/// Characters that make a key unusable as a column or identifier.
static PROBLEM_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[=+/&<>;'"?%#$@,. \t\r\n]"#).expect("valid regex"));

/// Splits a raw key on its first colon into `(type, key)`.
///
/// Keys without a colon get the type `"regular"`.
#[must_use]
pub fn split_key(raw_key: &str) -> (&str, &str) {
    raw_key.split_once(':').unwrap_or((REGULAR_TAG_TYPE, raw_key))
}

/// Decomposes a raw `<tag>` into `(type, key, value)`.
///
/// # Errors
///
/// Returns [`CleaningError::MissingAttribute`] if `k` or `v` is absent.
pub fn decompose_tag(raw: &RawTag) -> Result<Tag, CleaningError> {
    let Some(raw_key) = raw.key.as_deref() else {
        return Err(missing("k"));
    };
    let Some(value) = raw.value.as_deref() else {
        return Err(missing("v"));
    };

    let (tag_type, key) = split_key(raw_key);
    Ok(Tag {
        tag_type: tag_type.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn missing(attribute: &'static str) -> CleaningError {
    CleaningError::MissingAttribute {
        element: "tag".to_string(),
        attribute,
    }
}

/// Puts a raw key into exactly one [`KeyCategory`].
///
/// Categories are tested in order and the first match wins: a key such as
/// `"addr:street"` also contains no problem characters, but it is
/// `LowerColon`.
#[must_use]
pub fn classify_key(raw_key: &str) -> KeyCategory {
    if LOWER_RE.is_match(raw_key) {
        KeyCategory::Lower
    } else if LOWER_COLON_RE.is_match(raw_key) {
        KeyCategory::LowerColon
    } else if PROBLEM_CHARS_RE.is_match(raw_key) {
        KeyCategory::ProblemChars
    } else {
        KeyCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_key_as_regular() {
        assert_eq!(split_key("highway"), ("regular", "highway"));
    }

    #[test]
    fn splits_on_first_colon_only() {
        assert_eq!(split_key("addr:street:name"), ("addr", "street:name"));
        let (tag_type, key) = split_key("tiger:name_base");
        assert_eq!(format!("{tag_type}:{key}"), "tiger:name_base");
    }

    #[test]
    fn splits_leading_colon() {
        assert_eq!(split_key(":odd"), ("", "odd"));
    }

    #[test]
    fn decomposes_tag() {
        let tag = decompose_tag(&RawTag::new("addr:postcode", "80301")).unwrap();
        assert_eq!(tag.tag_type, "addr");
        assert_eq!(tag.key, "postcode");
        assert_eq!(tag.value, "80301");
    }

    #[test]
    fn reports_missing_key_and_value() {
        let no_key = RawTag {
            key: None,
            value: Some("x".to_string()),
        };
        assert!(matches!(
            decompose_tag(&no_key),
            Err(CleaningError::MissingAttribute { attribute: "k", .. })
        ));

        let no_value = RawTag {
            key: Some("name".to_string()),
            value: None,
        };
        assert!(matches!(
            decompose_tag(&no_value),
            Err(CleaningError::MissingAttribute { attribute: "v", .. })
        ));
    }

    #[test]
    fn classifies_lower() {
        assert_eq!(classify_key("highway"), KeyCategory::Lower);
        assert_eq!(classify_key("name_1"), KeyCategory::Other);
        assert_eq!(classify_key("old_name"), KeyCategory::Lower);
        assert_eq!(classify_key(""), KeyCategory::Lower);
    }

    #[test]
    fn classifies_lower_colon() {
        assert_eq!(classify_key("addr:street"), KeyCategory::LowerColon);
        assert_eq!(classify_key("tiger:name_base"), KeyCategory::LowerColon);
    }

    #[test]
    fn classifies_problem_chars() {
        assert_eq!(classify_key("addr.street"), KeyCategory::ProblemChars);
        assert_eq!(classify_key("name with space"), KeyCategory::ProblemChars);
        assert_eq!(classify_key("a=b"), KeyCategory::ProblemChars);
        assert_eq!(classify_key("Fix Me?"), KeyCategory::ProblemChars);
    }

    #[test]
    fn classifies_other() {
        assert_eq!(classify_key("FIXME"), KeyCategory::Other);
        assert_eq!(classify_key("addr:street:name"), KeyCategory::Other);
        assert_eq!(classify_key("name:zh-Hant"), KeyCategory::Other);
    }

    #[test]
    fn classification_is_total() {
        for key in ["", "a", "A", "a:b", "a:b:c", "1", "é", "a b", "a\tb"] {
            assert!(KeyCategory::ALL.contains(&classify_key(key)));
        }
    }
}
