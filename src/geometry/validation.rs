//! Structural and geometric feature validation.
//!
//! Validation failures are ordinary values, never errors: a rejected shape is
//! reported through [`ValidationResult`] and the caller keeps its prior state.

use super::geodesic::{is_valid_coordinate, precision_is_valid};
use super::{Feature, FeatureId, Geometry, Position};
use serde::{Deserialize, Serialize};

pub const REASON_MISSING_ID: &str = "Feature has no id";
pub const REASON_INVALID_ID: &str = "Feature id is not valid";
pub const REASON_UNSUPPORTED_GEOMETRY: &str = "Feature is not Point, LineString or Polygon";
pub const REASON_MISSING_MODE: &str = "Feature does not have a set mode";
pub const REASON_MODE_MISMATCH: &str = "Feature mode property does not match the mode being added to";
pub const REASON_WRONG_GEOMETRY: &str = "Feature geometry does not match the mode";
pub const REASON_INVALID_COORDINATES: &str = "Feature has invalid coordinates";
pub const REASON_EXCESSIVE_PRECISION: &str = "Feature has coordinates with excessive precision";
pub const REASON_TOO_FEW_COORDINATES: &str = "Feature has too few coordinates";
pub const REASON_RING_NOT_CLOSED: &str = "Feature polygon ring is not closed";
pub const REASON_SELF_INTERSECTING: &str = "Feature polygon self intersects";

/// Outcome of validating a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }

    /// Runs `next` only when this result is valid
    pub fn and_then(self, next: impl FnOnce() -> ValidationResult) -> ValidationResult {
        if self.valid { next() } else { self }
    }
}

/// Checks the shape every stored feature must have: an id accepted by the
/// store's id strategy, a supported geometry kind and a `mode` property.
pub fn validate_store_feature(
    feature: &Feature,
    is_valid_id: impl Fn(&FeatureId) -> bool,
) -> ValidationResult {
    let Some(id) = &feature.id else {
        return ValidationResult::invalid(REASON_MISSING_ID);
    };
    if !is_valid_id(id) {
        return ValidationResult::invalid(REASON_INVALID_ID);
    }
    if !feature.geometry.is_supported() {
        return ValidationResult::invalid(REASON_UNSUPPORTED_GEOMETRY);
    }
    match feature.mode() {
        Some(mode) if !mode.is_empty() => ValidationResult::valid(),
        _ => ValidationResult::invalid(REASON_MISSING_MODE),
    }
}

fn validate_coordinates(coordinates: &[Position], precision: u32) -> ValidationResult {
    if !coordinates.iter().all(|c| is_valid_coordinate(*c)) {
        return ValidationResult::invalid(REASON_INVALID_COORDINATES);
    }
    if !coordinates.iter().all(|c| precision_is_valid(*c, precision)) {
        return ValidationResult::invalid(REASON_EXCESSIVE_PRECISION);
    }
    ValidationResult::valid()
}

pub fn validate_point_feature(feature: &Feature, precision: u32) -> ValidationResult {
    match &feature.geometry {
        Geometry::Point(position) => validate_coordinates(std::slice::from_ref(position), precision),
        _ => ValidationResult::invalid(REASON_WRONG_GEOMETRY),
    }
}

pub fn validate_linestring_feature(feature: &Feature, precision: u32) -> ValidationResult {
    match &feature.geometry {
        Geometry::LineString(coordinates) if coordinates.len() < 2 => {
            ValidationResult::invalid(REASON_TOO_FEW_COORDINATES)
        }
        Geometry::LineString(coordinates) => validate_coordinates(coordinates, precision),
        _ => ValidationResult::invalid(REASON_WRONG_GEOMETRY),
    }
}

/// A polygon needs a closed outer ring of at least four positions.
pub fn validate_polygon_feature(feature: &Feature, precision: u32) -> ValidationResult {
    let Geometry::Polygon(rings) = &feature.geometry else {
        return ValidationResult::invalid(REASON_WRONG_GEOMETRY);
    };
    if rings.is_empty() {
        return ValidationResult::invalid(REASON_TOO_FEW_COORDINATES);
    }
    for ring in rings {
        if ring.len() < 4 {
            return ValidationResult::invalid(REASON_TOO_FEW_COORDINATES);
        }
        if ring.first() != ring.last() {
            return ValidationResult::invalid(REASON_RING_NOT_CLOSED);
        }
        let result = validate_coordinates(ring, precision);
        if !result.valid {
            return result;
        }
    }
    ValidationResult::valid()
}

/// [`validate_polygon_feature`] plus a self-intersection check of every ring.
pub fn validate_non_intersecting_polygon_feature(feature: &Feature, precision: u32) -> ValidationResult {
    validate_polygon_feature(feature, precision).and_then(|| match &feature.geometry {
        Geometry::Polygon(rings) if rings.iter().any(|ring| self_intersects(ring)) => {
            ValidationResult::invalid(REASON_SELF_INTERSECTING)
        }
        _ => ValidationResult::valid(),
    })
}

fn orientation(a: Position, b: Position, c: Position) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn on_segment(a: Position, b: Position, p: Position) -> bool {
    p[0] >= a[0].min(b[0]) && p[0] <= a[0].max(b[0]) && p[1] >= a[1].min(b[1]) && p[1] <= a[1].max(b[1])
}

/// Whether segments `a1..a2` and `b1..b2` touch or cross
pub fn segments_intersect(a1: Position, a2: Position, b1: Position, b2: Position) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

/// Whether a ring (closed or open) crosses itself. Adjacent segments share an
/// endpoint and are not counted; neither are zero-length segments.
pub fn self_intersects(ring: &[Position]) -> bool {
    let mut points: Vec<Position> = ring.to_vec();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points.dedup();
    let n = points.len();
    if n < 4 {
        return false;
    }

    let segment = |i: usize| (points[i], points[(i + 1) % n]);
    for i in 0..n {
        for j in (i + 1)..n {
            // adjacent, including the wrap-around pair
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let (a1, a2) = segment(i);
            let (b1, b2) = segment(j);
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{properties, Properties};

    fn feature(geometry: Geometry) -> Feature {
        let mut props = Properties::new();
        props.insert(properties::MODE.to_string(), "polygon".into());
        Feature::new(Some(FeatureId::from("a")), geometry, props)
    }

    #[test]
    fn test_bowtie_self_intersects() {
        let bowtie = vec![[0.0, 0.0], [1.0, 1.0], [1.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
        assert!(self_intersects(&bowtie));

        let square = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]];
        assert!(!self_intersects(&square));
    }

    #[test]
    fn test_polygon_ring_must_be_closed() {
        let open = feature(Geometry::Polygon(vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
        ]]));
        let result = validate_polygon_feature(&open, 9);
        assert_eq!(result.reason.as_deref(), Some(REASON_RING_NOT_CLOSED));
    }

    #[test]
    fn test_non_intersecting_polygon_rejects_bowtie() {
        let bowtie = feature(Geometry::Polygon(vec![vec![
            [0.0, 0.0],
            [1.0, 1.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [0.0, 0.0],
        ]]));
        let result = validate_non_intersecting_polygon_feature(&bowtie, 9);
        assert!(!result.valid);
        assert_eq!(result.reason.as_deref(), Some(REASON_SELF_INTERSECTING));
    }

    #[test]
    fn test_store_feature_requires_mode() {
        let mut f = feature(Geometry::Point([0.0, 0.0]));
        f.properties.clear();
        let result = validate_store_feature(&f, |_| true);
        assert_eq!(result.reason.as_deref(), Some(REASON_MISSING_MODE));
    }

    #[test]
    fn test_store_feature_rejects_multi_geometries() {
        let f = feature(Geometry::MultiPoint(vec![[0.0, 0.0]]));
        let result = validate_store_feature(&f, |_| true);
        assert_eq!(result.reason.as_deref(), Some(REASON_UNSUPPORTED_GEOMETRY));
    }
}
