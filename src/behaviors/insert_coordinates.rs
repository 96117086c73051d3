use super::{BehaviorConfig, Projection};
use crate::geometry::geodesic::{
    great_circle_points, haversine_distance_km, limit_position, lng_lat_to_web_mercator,
    web_mercator_to_lng_lat,
};
use crate::geometry::Position;

/// Upper bound on the pieces a single segment is split into
pub const MAX_SEGMENTS: usize = 1000;

/// Densifies a segment with intermediate coordinates
#[derive(Debug, Clone)]
pub struct InsertCoordinatesBehavior {
    config: BehaviorConfig,
}

impl InsertCoordinatesBehavior {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Splits `start..end` into `segments` pieces and returns every point,
    /// endpoints included. Straight in web mercator, or along the great
    /// circle for the globe projection. `segments` is clamped to
    /// `1..=MAX_SEGMENTS`.
    pub fn generate(&self, start: Position, end: Position, segments: usize) -> Vec<Position> {
        let segments = segments.clamp(1, MAX_SEGMENTS);
        let points = match self.config.projection {
            Projection::Globe => great_circle_points(start, end, segments),
            Projection::WebMercator => planar_points(start, end, segments),
        };
        points
            .into_iter()
            .map(|point| limit_position(point, self.config.coordinate_precision))
            .collect()
    }

    /// Like [`generate`](Self::generate) with as many segments as needed to
    /// keep each one at most `segment_length_km` long
    pub fn generate_by_segment_length(&self, start: Position, end: Position, segment_length_km: f64) -> Vec<Position> {
        let distance = haversine_distance_km(start, end);
        let segments = if segment_length_km > 0.0 {
            (distance / segment_length_km).ceil().min(MAX_SEGMENTS as f64) as usize
        } else {
            1
        };
        self.generate(start, end, segments)
    }
}

fn planar_points(start: Position, end: Position, segments: usize) -> Vec<Position> {
    let (x1, y1) = lng_lat_to_web_mercator(start[0], start[1]);
    let (x2, y2) = lng_lat_to_web_mercator(end[0], end[1]);

    let mut points = Vec::with_capacity(segments + 1);
    points.push(start);
    for step in 1..segments {
        let fraction = step as f64 / segments as f64;
        let (lng, lat) = web_mercator_to_lng_lat(x1 + (x2 - x1) * fraction, y1 + (y2 - y1) * fraction);
        points.push([lng, lat]);
    }
    points.push(end);
    points
}
