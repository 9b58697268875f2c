//! Loading of the [`CleaningConfig`].
//!
//! The built-in defaults carry the rules for the Denver/Boulder extract. A
//! TOML file can override any of them; sections and fields left out keep
//! their defaults:
//!
//! ```toml
//! [postcode]
//! region_prefix = "81"
//!
//! [street.mapping]
//! Ln = "Lane"
//! ```

use std::path::Path;

use osm_scrub_cleaning_models::CleaningConfig;

/// Errors from loading or rendering a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("I/O error reading config {path}: {source}")]
    Io {
        /// Path of the config file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Config file is not valid TOML or has unknown fields.
    #[error("Invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be serialized back to TOML.
    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    /// Config parsed but its values are inconsistent.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Loads the configuration from `path`, or the defaults if `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&Path>) -> Result<CleaningConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(CleaningConfig::default());
    };

    log::info!("Loading cleaning config from {}", path.display());
    let toml_str = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_config_toml(&toml_str)
}

/// Parses a [`CleaningConfig`] from a TOML string.
///
/// Unit designators are lowercased so they can be compared against
/// case-folded tokens.
///
/// # Errors
///
/// Returns an error if the TOML is malformed, has unknown fields, or
/// describes an impossible postcode format.
pub fn parse_config_toml(toml_str: &str) -> Result<CleaningConfig, ConfigError> {
    let mut config: CleaningConfig = toml::de::from_str(toml_str)?;

    for designator in &mut config.street.unit_designators {
        *designator = designator.to_lowercase();
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &CleaningConfig) -> Result<(), ConfigError> {
    let postcode = &config.postcode;
    if postcode.length == 0 {
        return Err(ConfigError::Invalid(
            "postcode.length must be greater than zero".to_string(),
        ));
    }
    if postcode.region_prefix.chars().count() > postcode.length {
        return Err(ConfigError::Invalid(format!(
            "postcode.region_prefix {:?} is longer than postcode.length {}",
            postcode.region_prefix, postcode.length
        )));
    }
    if let Some((from, _)) = config
        .street
        .mapping
        .iter()
        .find(|(from, _)| from.is_empty() || from.contains(char::is_whitespace))
    {
        return Err(ConfigError::Invalid(format!(
            "street.mapping key {from:?} can never match a single token"
        )));
    }
    Ok(())
}

/// Renders a configuration as TOML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_toml(config: &CleaningConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(parse_config_toml("").unwrap(), CleaningConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let config = parse_config_toml(
            r#"
            [postcode]
            region_prefix = "81"

            [tiger]
            keep_unmapped = true
            "#,
        )
        .unwrap();

        assert_eq!(config.postcode.region_prefix, "81");
        assert_eq!(config.postcode.length, 5);
        assert!(config.tiger.keep_unmapped);
        assert_eq!(config.street, CleaningConfig::default().street);
    }

    #[test]
    fn lowercases_unit_designators() {
        let config = parse_config_toml(
            r#"
            [street]
            unit_designators = ["Unit", "APT"]
            "#,
        )
        .unwrap();
        assert_eq!(config.street.unit_designators, vec!["unit", "apt"]);
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(matches!(
            parse_config_toml("[postcode]\nprefix = \"80\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_prefix_longer_than_length() {
        assert!(matches!(
            parse_config_toml("[postcode]\nregion_prefix = \"800000\"\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_mapping_keys_with_spaces() {
        assert!(matches!(
            parse_config_toml("[street.mapping]\n\"Street \" = \"Street\"\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let rendered = to_toml(&CleaningConfig::default()).unwrap();
        assert_eq!(
            parse_config_toml(&rendered).unwrap(),
            CleaningConfig::default()
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/osm_scrub.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
