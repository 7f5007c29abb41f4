//! Business records and their external-source identity.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Free-form key/value tags carried over from the external source.
pub type Tags = HashMap<String, String>;

/// Discriminator for the external database's element kinds.
///
/// Together with the numeric element id this forms the stable identity of a
/// business across sync runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Node,
    Way,
    Relation,
}

impl SourceKind {
    /// Stable lowercase name used in storage and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognised [`SourceKind`] name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown source element kind {found:?}")]
pub struct UnknownSourceKind {
    /// The value that failed to parse.
    pub found: String,
}

impl FromStr for SourceKind {
    type Err = UnknownSourceKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(Self::Node),
            "way" => Ok(Self::Way),
            "relation" => Ok(Self::Relation),
            other => Err(UnknownSourceKind {
                found: other.to_owned(),
            }),
        }
    }
}

/// Identity of an element in the external geographic database.
///
/// # Examples
/// ```
/// use annuaire_core::{SourceKind, SourceRef};
///
/// let id = SourceRef::new(SourceKind::Node, 4_532_871);
/// assert_eq!(id.kind.as_str(), "node");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRef {
    /// Element kind discriminator.
    pub kind: SourceKind,
    /// Numeric element id, unique per kind.
    pub id: i64,
}

impl SourceRef {
    /// Construct a `SourceRef` from its parts.
    #[must_use]
    pub const fn new(kind: SourceKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Payload written by the sync orchestrator when upserting a business.
///
/// Everything here is derived from a single source element: identity,
/// coordinates, classification, address and contact fields, and the raw tag
/// map. Rating aggregates and photos are deliberately absent; ingestion never
/// touches them.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBusiness {
    /// Identity in the external source.
    pub source: SourceRef,
    /// Display name.
    pub name: String,
    /// Localized name variants, when tagged.
    pub name_fr: Option<String>,
    pub name_en: Option<String>,
    pub name_de: Option<String>,
    /// Resolved taxonomy row, when the category slug is seeded.
    pub category_id: Option<i64>,
    /// Free-text subcategory from the classifier.
    pub subcategory: Option<String>,
    /// WGS84 position, `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    /// Raw opening-hours string; normalised lazily at read time.
    pub opening_hours: Option<String>,
    pub description: Option<String>,
    /// Full source tag map.
    pub tags: Tags,
}

/// A stored directory entry as read back from the persistence layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Business {
    /// Local row id.
    pub id: i64,
    /// Identity in the external source.
    pub source: SourceRef,
    pub name: String,
    pub name_fr: Option<String>,
    pub name_en: Option<String>,
    pub name_de: Option<String>,
    pub category_id: Option<i64>,
    /// Slug of the referenced category, joined in by the store.
    pub category_slug: Option<String>,
    pub subcategory: Option<String>,
    /// WGS84 position, `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<String>,
    pub description: Option<String>,
    pub tags: Tags,
    /// Photo URLs; never populated by ingestion.
    pub photos: Vec<String>,
    pub active: bool,
    /// Review aggregates; never populated by ingestion.
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("node", SourceKind::Node)]
    #[case("way", SourceKind::Way)]
    #[case("relation", SourceKind::Relation)]
    fn source_kind_round_trips(#[case] text: &str, #[case] kind: SourceKind) {
        assert_eq!(text.parse::<SourceKind>(), Ok(kind));
        assert_eq!(kind.as_str(), text);
    }

    #[rstest]
    fn source_kind_rejects_unknown_names() {
        let err = "area".parse::<SourceKind>().expect_err("should reject");
        assert_eq!(err.found, "area");
    }

    #[rstest]
    fn source_ref_displays_kind_and_id() {
        let id = SourceRef::new(SourceKind::Way, 42);
        assert_eq!(id.to_string(), "way/42");
    }
}
