//! Overpass API response types.
//!
//! The interpreter endpoint answers a QL query with a JSON document whose
//! `elements` array mixes nodes, ways, and relations. Nodes carry their own
//! coordinates; ways and relations expose a computed `center` instead.

use geo::Coord;
use serde::Deserialize;

use annuaire_core::{SourceElement, SourceKind, SourceRef, Tags};

/// Top-level Overpass response. Metadata fields (`generator`, `osm3s`) are
/// ignored; only the element list matters here.
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    /// The elements matched by the query.
    pub elements: Vec<OverpassElement>,
}

/// One element of an Overpass response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverpassElement {
    /// Element kind discriminator.
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// Element id, unique per kind.
    pub id: i64,
    /// Own latitude; present on nodes.
    pub lat: Option<f64>,
    /// Own longitude; present on nodes.
    pub lon: Option<f64>,
    /// Computed centre; present on ways and relations queried with `center`.
    pub center: Option<OverpassCenter>,
    /// Free-form tag map; absent on bare geometry members.
    #[serde(default)]
    pub tags: Option<Tags>,
}

/// Computed centre of a way or relation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OverpassCenter {
    pub lat: f64,
    pub lon: f64,
}

impl OverpassElement {
    /// Resolve the element's position: its own coordinates when present,
    /// else the computed centre.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coord<f64>> {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            return Some(Coord { x: lon, y: lat });
        }
        self.center.map(|center| Coord {
            x: center.lon,
            y: center.lat,
        })
    }

    /// True when the element carries tags including a display name.
    #[must_use]
    pub fn is_named(&self) -> bool {
        self.tags
            .as_ref()
            .is_some_and(|tags| tags.contains_key("name"))
    }

    /// Reduce the element to the shape the sync orchestrator consumes.
    #[must_use]
    pub fn into_source_element(self) -> SourceElement {
        let location = self.coordinates();
        SourceElement {
            source: SourceRef::new(self.kind, self.id),
            location,
            tags: self.tags.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialise_node_with_own_coordinates() {
        let json = r#"{
            "version": 0.6,
            "generator": "Overpass API",
            "elements": [
                {
                    "type": "node",
                    "id": 4532871,
                    "lat": 48.8153,
                    "lon": 7.7905,
                    "tags": {"name": "Boulangerie Muller", "shop": "bakery"}
                }
            ]
        }"#;

        let response: OverpassResponse = serde_json::from_str(json).expect("should deserialise");
        let element = &response.elements[0];

        assert_eq!(element.kind, SourceKind::Node);
        assert!(element.is_named());
        let coord = element.coordinates().expect("node has coordinates");
        assert_eq!(coord.x, 7.7905);
        assert_eq!(coord.y, 48.8153);
    }

    #[test]
    fn deserialise_way_with_center() {
        let json = r#"{
            "elements": [
                {
                    "type": "way",
                    "id": 91,
                    "center": {"lat": 48.81, "lon": 7.78},
                    "tags": {"name": "Halle aux Houblons", "amenity": "marketplace"}
                }
            ]
        }"#;

        let response: OverpassResponse = serde_json::from_str(json).expect("should deserialise");
        let element = response.elements[0].clone();

        let coord = element.coordinates().expect("way has a centre");
        assert_eq!(coord.y, 48.81);

        let source = element.into_source_element();
        assert_eq!(source.source.id, 91);
        assert_eq!(source.name(), Some("Halle aux Houblons"));
    }

    #[test]
    fn untagged_skeleton_members_are_not_named() {
        let json = r#"{
            "elements": [
                {"type": "node", "id": 7, "lat": 48.0, "lon": 7.0}
            ]
        }"#;

        let response: OverpassResponse = serde_json::from_str(json).expect("should deserialise");
        assert!(!response.elements[0].is_named());
    }
}
