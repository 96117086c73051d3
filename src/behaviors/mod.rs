//! Geometric helpers shared by every mode.
//!
//! Behaviors are built once when a mode registers and all read from the
//! same [`BehaviorConfig`]. A failed lookup ("nothing to snap to") is an
//! `Ok(None)` or an empty result; errors mean the caller broke a contract.

mod click_bounding_box;
mod closing_points;
mod coordinate_snapping;
mod insert_coordinates;
mod line_snapping;
mod pixel_distance;

pub use click_bounding_box::ClickBoundingBoxBehavior;
pub use closing_points::{ClosingPointHit, ClosingPointsBehavior};
pub use coordinate_snapping::CoordinateSnappingBehavior;
pub use insert_coordinates::{InsertCoordinatesBehavior, MAX_SEGMENTS};
pub use line_snapping::LineSnappingBehavior;
pub use pixel_distance::PixelDistanceBehavior;

use crate::geometry::{Feature, Geometry, LngLat, Position, ScreenPoint};
use crate::store::SharedStore;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Host-supplied forward projection: `(lng, lat)` to container pixels
pub type ProjectFn = Rc<dyn Fn(f64, f64) -> ScreenPoint>;

/// Host-supplied inverse projection: container pixels to `(lng, lat)`
pub type UnprojectFn = Rc<dyn Fn(f64, f64) -> LngLat>;

/// How straight lines between two coordinates are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Projection {
    /// Straight in web mercator
    #[default]
    WebMercator,
    /// Great circles on a sphere
    Globe,
}

#[derive(Clone)]
pub struct BehaviorConfig {
    pub store: SharedStore,
    pub project: ProjectFn,
    pub unproject: UnprojectFn,
    /// Hit tolerance in container pixels
    pub pointer_distance: f64,
    pub coordinate_precision: u32,
    pub projection: Projection,
    /// Name of the owning mode
    pub mode: String,
}

impl std::fmt::Debug for BehaviorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorConfig")
            .field("pointer_distance", &self.pointer_distance)
            .field("coordinate_precision", &self.coordinate_precision)
            .field("projection", &self.projection)
            .field("mode", &self.mode)
            .finish()
    }
}

impl BehaviorConfig {
    pub fn project(&self, position: Position) -> ScreenPoint {
        (self.project)(position[0], position[1])
    }

    pub fn unproject(&self, point: ScreenPoint) -> LngLat {
        (self.unproject)(point.x, point.y)
    }
}

/// Vertices of a feature that can be snapped to. Polygon rings drop their
/// repeated closing coordinate.
pub(crate) fn vertices(feature: &Feature) -> Vec<Position> {
    match &feature.geometry {
        Geometry::Point(position) => vec![*position],
        Geometry::LineString(coordinates) => coordinates.clone(),
        Geometry::Polygon(rings) => rings
            .iter()
            .flat_map(|ring| &ring[..ring.len().saturating_sub(1)])
            .copied()
            .collect(),
        _ => Vec::new(),
    }
}

/// Segments of a feature as coordinate pairs
pub(crate) fn segments(feature: &Feature) -> Vec<(Position, Position)> {
    match &feature.geometry {
        Geometry::LineString(coordinates) => pairs(coordinates),
        Geometry::Polygon(rings) => rings.iter().flat_map(|ring| pairs(ring)).collect(),
        _ => Vec::new(),
    }
}

fn pairs(coordinates: &[Position]) -> Vec<(Position, Position)> {
    coordinates.windows(2).map(|pair| (pair[0], pair[1])).collect()
}
