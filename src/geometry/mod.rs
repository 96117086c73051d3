//! Feature and geometry model shared by the store, the spatial index and the modes.
//!
//! The shapes follow the GeoJSON interchange format so features serialize to
//! `{"id": .., "type": "Feature", "geometry": {..}, "properties": {..}}`.

pub mod geodesic;
pub mod hit_testing;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographic coordinate as `[lng, lat]`.
pub type Position = [f64; 2];

/// Free-form feature properties.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Well-known property keys written and read by the core.
pub mod properties {
    /// Name of the mode that owns the feature
    pub const MODE: &str = "mode";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    /// Set on a feature while it is still being drawn
    pub const CURRENTLY_DRAWING: &str = "currentlyDrawing";
    /// Marks the auxiliary points used to finish a shape
    pub const CLOSING_POINT: &str = "closingPoint";
    pub const SELECTED: &str = "selected";
}

/// Identifier of a stored feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(i64),
    String(String),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FeatureId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// A geometry in GeoJSON shape.
///
/// Only `Point`, `LineString` and `Polygon` can be stored. The multi-part
/// variants exist so that externally sourced data deserializes and can be
/// rejected with a proper validation reason instead of a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    Polygon(Vec<Vec<Position>>),
    MultiPoint(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// The GeoJSON type name of this geometry
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::LineString(_) => "LineString",
            Self::Polygon(_) => "Polygon",
            Self::MultiPoint(_) => "MultiPoint",
            Self::MultiLineString(_) => "MultiLineString",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Whether the store and spatial index accept this geometry kind
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Point(_) | Self::LineString(_) | Self::Polygon(_))
    }

    /// The coordinates that define the extent of a supported geometry: the
    /// point itself, the line vertices, or the outer ring of a polygon.
    pub fn outline(&self) -> Option<&[Position]> {
        match self {
            Self::Point(position) => Some(std::slice::from_ref(position)),
            Self::LineString(coordinates) => Some(coordinates),
            Self::Polygon(rings) => rings.first().map(Vec::as_slice),
            _ => None,
        }
    }

    /// Axis-aligned polygon covering `[min, max]`, handy for bbox queries
    pub fn bbox_polygon(min: Position, max: Position) -> Self {
        Self::Polygon(vec![vec![
            [min[0], min[1]],
            [max[0], min[1]],
            [max[0], max[1]],
            [min[0], max[1]],
            [min[0], min[1]],
        ]])
    }
}

/// Marker for the `"type": "Feature"` member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    #[default]
    Feature,
}

/// A geometry plus properties plus an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    #[serde(rename = "type", default)]
    pub kind: FeatureType,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    pub fn new(id: Option<FeatureId>, geometry: Geometry, properties: Properties) -> Self {
        Self {
            id,
            kind: FeatureType::Feature,
            geometry,
            properties,
        }
    }

    /// The owning mode name from the properties, if any
    pub fn mode(&self) -> Option<&str> {
        self.properties.get(properties::MODE).and_then(|v| v.as_str())
    }

    /// True when the boolean property `key` is set to `true`
    pub fn has_flag(&self, key: &str) -> bool {
        self.properties
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// A feature that has not been given an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeature {
    pub geometry: Geometry,
    pub properties: Properties,
}

impl NewFeature {
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// A feature owned by `mode` with no other properties
    pub fn with_mode(geometry: Geometry, mode: &str) -> Self {
        let mut properties = Properties::new();
        properties.insert(properties::MODE.to_string(), mode.into());
        Self {
            geometry,
            properties,
        }
    }
}

/// A point in screen (container) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A geographic location returned by the host's unproject function.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn position(self) -> Position {
        [self.lng, self.lat]
    }
}
