#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cleaning rules for OpenStreetMap XML extracts.
//!
//! Turns one parsed [`Element`] at a time into flat rows ready for CSV
//! export, repairing the data problems found while auditing the
//! Denver/Boulder extract.
//!
//! # Pipeline
//!
//! For every element, [`shape::shape_element`] runs:
//!
//! 1. [`classify::decompose_tag`]: split `k` into namespace `type` and `key`.
//! 2. [`tiger::reduce_tiger_tags`]: fold `tiger:*` tags into `addr:*` tags.
//! 3. [`street::clean_street_names`]: expand street-type abbreviations.
//! 4. [`postcode::clean_postcodes`]: validate and repair postcodes, which may
//!    drop a tag or expand it into several.
//!
//! All rules read their settings from an immutable
//! [`CleaningConfig`](osm_scrub_cleaning_models::CleaningConfig) built once
//! by [`config::load_config`].
//!
//! Problems with individual records never abort a run. They are collected as
//! [`CleaningError`] values next to the output so the caller can log and count
//! them.

pub mod classify;
pub mod config;
pub mod postcode;
pub mod shape;
pub mod street;
pub mod tiger;

pub use osm_scrub_cleaning_models::{
    CleaningConfig, Element, ElementKind, KeyCategory, ShapedElement, Tag, TagRecord,
};

/// Problems with a single record. None of these stop the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CleaningError {
    /// An element or tag lacks a required attribute.
    #[error("{element} is missing its '{attribute}' attribute")]
    MissingAttribute {
        /// Description of the offending element (e.g. "tag of node 42").
        element: String,
        /// Name of the missing attribute.
        attribute: &'static str,
    },

    /// A postcode matched none of the repair patterns.
    #[error("Bad postcode: {0}")]
    InvalidPostalCode(String),

    /// A `start:end` postcode range could not be expanded.
    #[error("Cannot expand postcode range {value:?}: {reason}")]
    RangeExpansion {
        /// The range as it appeared (whitespace removed).
        value: String,
        /// Why expansion failed.
        reason: String,
    },

    /// The element kind has no flat record layout.
    #[error("Cannot shape {0} elements")]
    UnsupportedElement(ElementKind),
}
