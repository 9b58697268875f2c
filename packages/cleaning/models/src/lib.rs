#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the OSM cleaning pipeline.
//!
//! This crate contains only data types, configuration structs, and simple
//! conversions. It has no heavyweight dependencies (no XML parser, no I/O).
//!
//! The flow of data through these types is:
//!
//! - [`Element`]: a raw node, way or relation as read from the XML stream.
//! - [`Tag`]: one child tag split into its namespace `type` and `key`.
//! - [`ElementRecord`], [`TagRecord`], [`WayNodeRecord`]: the flat output
//!   rows, bundled per element in a [`ShapedElement`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Declared output columns for node records.
pub const NODE_FIELDS: &[&str] = &[
    "id",
    "lat",
    "lon",
    "user",
    "uid",
    "version",
    "changeset",
    "timestamp",
];

/// Declared output columns for way records.
pub const WAY_FIELDS: &[&str] = &["id", "user", "uid", "version", "changeset", "timestamp"];

/// Declared output columns for node and way tag records.
pub const TAG_FIELDS: &[&str] = &["id", "key", "value", "type"];

/// Declared output columns for way-node records.
pub const WAY_NODE_FIELDS: &[&str] = &["id", "node_id", "position"];

/// Tag `type` used for keys without a namespace prefix.
pub const REGULAR_TAG_TYPE: &str = "regular";

/// Kind of a top-level OSM element.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ElementKind {
    /// A single point with coordinates.
    Node,
    /// An ordered list of node references.
    Way,
    /// A grouping of other elements. Only read for auditing.
    Relation,
}

impl ElementKind {
    /// Every element kind, in document order of an OSM export.
    pub const ALL: &[Self] = &[Self::Node, Self::Way, Self::Relation];

    /// Scalar attributes copied into the flat element record.
    ///
    /// Relations are not shaped, so they have no declared fields.
    #[must_use]
    pub const fn declared_fields(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Node => Some(NODE_FIELDS),
            Self::Way => Some(WAY_FIELDS),
            Self::Relation => None,
        }
    }

    /// Parses the XML element name (`b"node"`, `b"way"`, `b"relation"`).
    #[must_use]
    pub fn from_xml_name(name: &[u8]) -> Option<Self> {
        match name {
            b"node" => Some(Self::Node),
            b"way" => Some(Self::Way),
            b"relation" => Some(Self::Relation),
            _ => None,
        }
    }
}

/// A `<tag>` child as it appears in the source. Either attribute may be
/// missing in malformed input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTag {
    /// The `k` attribute.
    pub key: Option<String>,
    /// The `v` attribute.
    pub value: Option<String>,
}

impl RawTag {
    /// Creates a tag with both attributes present.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }
}

/// An `<nd>` child of a way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawNodeRef {
    /// The `ref` attribute.
    pub reference: Option<String>,
}

impl RawNodeRef {
    /// Creates a node reference with its `ref` attribute present.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
        }
    }
}

/// One top-level element read from the source stream.
///
/// Held in memory only while it is being transformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Node, way or relation.
    pub kind: ElementKind,
    /// Scalar XML attributes (`id`, `lat`, `user`, ...).
    pub attributes: BTreeMap<String, String>,
    /// `<tag>` children in document order.
    pub tags: Vec<RawTag>,
    /// `<nd>` children in document order. Always empty for nodes.
    pub node_refs: Vec<RawNodeRef>,
}

impl Element {
    /// Creates an element with no attributes or children.
    #[must_use]
    pub const fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            tags: Vec::new(),
            node_refs: Vec::new(),
        }
    }

    /// Returns the value of an attribute, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the `id` attribute, if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Builder-style `<tag>` appender.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(RawTag::new(key, value));
        self
    }

    /// Builder-style `<nd>` appender.
    #[must_use]
    pub fn with_node_ref(mut self, reference: impl Into<String>) -> Self {
        self.node_refs.push(RawNodeRef::new(reference));
        self
    }
}

/// A tag split into namespace `type` and `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Text before the first colon, or [`REGULAR_TAG_TYPE`].
    pub tag_type: String,
    /// Text after the first colon, or the whole key.
    pub key: String,
    /// The tag value.
    pub value: String,
}

impl Tag {
    /// Reassembles the key as it appeared in the source.
    #[must_use]
    pub fn full_key(&self) -> String {
        if self.tag_type == REGULAR_TAG_TYPE {
            self.key.clone()
        } else {
            format!("{}:{}", self.tag_type, self.key)
        }
    }
}

/// A flat tag row (`node_tags.csv` / `way_tags.csv`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    /// Id of the owning element.
    pub id: String,
    /// Key without its namespace prefix.
    pub key: String,
    /// Tag value.
    pub value: String,
    /// Namespace prefix, or `regular`.
    #[serde(rename = "type")]
    pub tag_type: String,
}

impl TagRecord {
    /// Attaches a decomposed tag to its owning element.
    #[must_use]
    pub fn from_tag(id: &str, tag: Tag) -> Self {
        Self {
            id: id.to_string(),
            key: tag.key,
            value: tag.value,
            tag_type: tag.tag_type,
        }
    }

    /// Creates a record from its parts.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        tag_type: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            value: value.into(),
            tag_type: tag_type.into(),
        }
    }

    /// Returns `true` if this record has the given namespace and key.
    #[must_use]
    pub fn is(&self, tag_type: &str, key: &str) -> bool {
        self.tag_type == tag_type && self.key == key
    }

    /// Copy of this record carrying a different value.
    #[must_use]
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..self.clone()
        }
    }
}

/// A flat way-node row (`way_nodes.csv`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WayNodeRecord {
    /// Id of the owning way.
    pub id: String,
    /// Id of the referenced node.
    pub node_id: String,
    /// Zero-based position of the reference within the way.
    pub position: usize,
}

/// The scalar-field row of a node or way.
///
/// Holds only the declared fields that were present on the source element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    /// Node or way.
    pub kind: ElementKind,
    /// Field name to value.
    pub fields: BTreeMap<String, String>,
}

impl ElementRecord {
    /// Returns a field value, if it was present on the source element.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Values in declared column order, with absent fields as empty strings.
    #[must_use]
    pub fn row(&self) -> Vec<&str> {
        self.kind
            .declared_fields()
            .unwrap_or_default()
            .iter()
            .map(|field| self.get(field).unwrap_or_default())
            .collect()
    }
}

/// Every flat record produced for one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedElement {
    /// The element's own scalar fields.
    pub record: ElementRecord,
    /// Cleaned tag rows.
    pub tags: Vec<TagRecord>,
    /// Node references with positions. Empty for nodes.
    pub way_nodes: Vec<WayNodeRecord>,
}

impl ShapedElement {
    /// Node or way.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.record.kind
    }

    /// Returns the first tag row matching namespace and key.
    #[must_use]
    pub fn tag(&self, tag_type: &str, key: &str) -> Option<&TagRecord> {
        self.tags.iter().find(|tag| tag.is(tag_type, key))
    }
}

/// One of the five output streams.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
    /// `nodes.csv`
    Node,
    /// `node_tags.csv`
    NodeTag,
    /// `ways.csv`
    Way,
    /// `way_nodes.csv`
    WayNode,
    /// `way_tags.csv`
    WayTag,
}

impl RecordKind {
    /// All output streams.
    pub const ALL: &[Self] = &[
        Self::Node,
        Self::NodeTag,
        Self::Way,
        Self::WayNode,
        Self::WayTag,
    ];

    /// Column header of this stream.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Node => NODE_FIELDS,
            Self::Way => WAY_FIELDS,
            Self::NodeTag | Self::WayTag => TAG_FIELDS,
            Self::WayNode => WAY_NODE_FIELDS,
        }
    }

    /// File name of this stream inside the output directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Node => "nodes.csv",
            Self::NodeTag => "node_tags.csv",
            Self::Way => "ways.csv",
            Self::WayNode => "way_nodes.csv",
            Self::WayTag => "way_tags.csv",
        }
    }
}

/// Structural category of a raw tag key, used by the audit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KeyCategory {
    /// Only lowercase letters and underscores.
    Lower,
    /// Two lowercase segments joined by one colon.
    LowerColon,
    /// Contains characters that are unsafe as column or key names.
    ProblemChars,
    /// Anything else (uppercase, digits, several colons, ...).
    Other,
}

impl KeyCategory {
    /// All categories in the order they are tested.
    pub const ALL: &[Self] = &[
        Self::Lower,
        Self::LowerColon,
        Self::ProblemChars,
        Self::Other,
    ];
}

/// Counters collected while cleaning a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Nodes written.
    pub nodes: u64,
    /// Node tag rows written.
    pub node_tags: u64,
    /// Ways written.
    pub ways: u64,
    /// Way-node rows written.
    pub way_nodes: u64,
    /// Way tag rows written.
    pub way_tags: u64,
    /// Sub-records skipped because a required attribute was absent.
    pub missing_attributes: u64,
    /// Unrecoverable postcode values and how often each was seen.
    pub invalid_postcodes: BTreeMap<String, u64>,
    /// Postcode ranges that could not be expanded.
    pub range_errors: u64,
}

impl CleaningReport {
    /// Adds the rows of one shaped element to the counters.
    pub fn record_shaped(&mut self, shaped: &ShapedElement) {
        let tags = shaped.tags.len() as u64;
        match shaped.kind() {
            ElementKind::Node => {
                self.nodes += 1;
                self.node_tags += tags;
            }
            ElementKind::Way => {
                self.ways += 1;
                self.way_tags += tags;
                self.way_nodes += shaped.way_nodes.len() as u64;
            }
            ElementKind::Relation => {}
        }
    }

    /// Counts one unrecoverable postcode value.
    pub fn record_invalid_postcode(&mut self, value: &str) {
        *self
            .invalid_postcodes
            .entry(value.to_string())
            .or_insert(0) += 1;
    }

    /// Total number of elements written.
    #[must_use]
    pub const fn elements(&self) -> u64 {
        self.nodes + self.ways
    }

    /// Total number of postcode records dropped as unrecoverable.
    #[must_use]
    pub fn invalid_postcode_count(&self) -> u64 {
        self.invalid_postcodes.values().sum()
    }
}

impl std::fmt::Display for CleaningReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} nodes ({} tags), {} ways ({} node refs, {} tags); \
             {} bad postcodes, {} range errors, {} records missing attributes",
            self.nodes,
            self.node_tags,
            self.ways,
            self.way_nodes,
            self.way_tags,
            self.invalid_postcode_count(),
            self.range_errors,
            self.missing_attributes
        )
    }
}

/// Street-type abbreviations and their canonical forms.
pub const DEFAULT_STREET_MAPPING: &[(&str, &str)] = &[
    ("St", "Street"),
    ("Strret", "Street"),
    ("st", "Street"),
    ("ST.", "Street"),
    ("Ave", "Avenue"),
    ("ave.", "Avenue"),
    ("Ave.", "Avenue"),
    ("Av", "Avenue"),
    ("avenue", "Avenue"),
    ("Rd.", "Road"),
    ("Rd", "Road"),
    ("rd", "Road"),
    ("Raod", "Road"),
    ("Pkwy", "Parkway"),
    ("Pky", "Parkway"),
    ("ct", "Court"),
    ("Dr", "Drive"),
    ("dr", "Drive"),
    ("trail", "Trail"),
    ("Pl", "Place"),
    ("Ct", "Court"),
    ("Blvd", "Boulevard"),
    ("ste.", "Suite"),
    ("Ste", "Suite"),
    ("ste", "Suite"),
];

/// Tokens that introduce a unit number rather than a street type
/// ("Apartment E", "Suite Dr").
pub const DEFAULT_UNIT_DESIGNATORS: &[&str] =
    &["apartment", "apt", "building", "suite", "ste.", "ste"];

/// Street types considered well-formed by the audit.
pub const DEFAULT_EXPECTED_STREET_TYPES: &[&str] = &[
    "Street",
    "Avenue",
    "Boulevard",
    "Drive",
    "Court",
    "Place",
    "Square",
    "Lane",
    "Road",
    "Trail",
    "Parkway",
    "Commons",
    "Way",
    "Circle",
];

/// Immutable settings for every normalizer, built once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleaningConfig {
    /// Street-name normalization.
    pub street: StreetConfig,
    /// Postcode validation and repair.
    pub postcode: PostcodeConfig,
    /// TIGER tag folding.
    pub tiger: TigerConfig,
    /// Audit-only settings.
    pub audit: AuditConfig,
}

/// Settings for the street-name normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreetConfig {
    /// Lowercase tokens after which no replacement happens.
    pub unit_designators: Vec<String>,
    /// Exact token to canonical replacement.
    pub mapping: BTreeMap<String, String>,
}

impl Default for StreetConfig {
    fn default() -> Self {
        Self {
            unit_designators: DEFAULT_UNIT_DESIGNATORS
                .iter()
                .map(ToString::to_string)
                .collect(),
            mapping: DEFAULT_STREET_MAPPING
                .iter()
                .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
                .collect(),
        }
    }
}

/// Settings for the postcode normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostcodeConfig {
    /// Leading characters every valid postcode of the dataset's area shares.
    pub region_prefix: String,
    /// Exact length of a valid postcode, in characters.
    pub length: usize,
    /// Literal prefixes stripped from otherwise valid postcodes, tried in
    /// order (`"CO80301"`, `"Golden,CO80401"`).
    pub strip_prefixes: Vec<String>,
    /// Widest `A:B` range that is expanded.
    pub max_range_span: u64,
}

impl Default for PostcodeConfig {
    fn default() -> Self {
        Self {
            region_prefix: "80".to_string(),
            length: 5,
            strip_prefixes: vec!["CO".to_string(), "Golden,CO".to_string()],
            max_range_span: 100_000,
        }
    }
}

/// Settings for the TIGER tag reducer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TigerConfig {
    /// Pass `tiger:*` tags without a folding rule through unchanged instead
    /// of dropping them.
    pub keep_unmapped: bool,
}

/// Settings used only by the audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Street types that are not reported as unexpected.
    pub expected_street_types: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            expected_street_types: DEFAULT_EXPECTED_STREET_TYPES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}
