//! The audit result and its plain-text rendering.

use std::collections::{BTreeMap, BTreeSet};

use osm_scrub_cleaning_models::KeyCategory;
use serde::Serialize;

use crate::AuditError;

/// Everything learned about an extract in one audit pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Occurrences of each XML element name (`node`, `tag`, `nd`, ...).
    pub element_counts: BTreeMap<String, u64>,
    /// Tag keys per structural category.
    pub key_categories: BTreeMap<KeyCategory, u64>,
    /// Number of distinct `user` values on nodes, ways and relations.
    pub unique_users: usize,
    /// Street types outside the expected list, with the street names that
    /// end in them.
    pub unexpected_street_types: BTreeMap<String, BTreeSet<String>>,
    /// Occurrences of each expected street type. Types never seen are 0.
    pub street_type_counts: BTreeMap<String, u64>,
    /// Postcode values that fail validation, with their occurrence counts.
    pub unexpected_postcodes: BTreeMap<String, u64>,
    /// Street names the cleaning rules would rewrite, and their new form.
    pub street_corrections: BTreeMap<String, String>,
}

impl AuditReport {
    /// Renders the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, AuditError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for AuditReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Element counts:")?;
        for (name, count) in &self.element_counts {
            writeln!(f, "  {name:<12} {count}")?;
        }

        writeln!(f)?;
        writeln!(f, "Tag key categories:")?;
        for (category, count) in &self.key_categories {
            writeln!(f, "  {:<14} {count}", category.to_string())?;
        }

        writeln!(f)?;
        writeln!(f, "Unique users: {}", self.unique_users)?;

        writeln!(f)?;
        writeln!(f, "Street type counts:")?;
        for (street_type, count) in &self.street_type_counts {
            writeln!(f, "  {street_type:<12} {count}")?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Unexpected street types ({}):",
            self.unexpected_street_types.len()
        )?;
        for (street_type, names) in &self.unexpected_street_types {
            writeln!(f, "  {street_type}")?;
            for name in names {
                writeln!(f, "    {name}")?;
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Unexpected postcodes ({}):",
            self.unexpected_postcodes.len()
        )?;
        for (postcode, count) in &self.unexpected_postcodes {
            writeln!(f, "  {postcode:?} x{count}")?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Street name corrections ({}):",
            self.street_corrections.len()
        )?;
        for (before, after) in &self.street_corrections {
            writeln!(f, "  {before} => {after}")?;
        }

        Ok(())
    }
}
