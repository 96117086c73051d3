//! Geographic math: haversine distance, great-circle interpolation, web
//! mercator conversion and coordinate precision helpers.

use super::Position;
use std::f64::consts::PI;

/// Mean earth radius used for great-circle distances
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Radius of the web mercator sphere (EPSG:3857)
pub const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Latitude beyond which web mercator diverges
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// Great-circle distance between two coordinates in kilometres
pub fn haversine_distance_km(from: Position, to: Position) -> f64 {
    let lat1 = from[1].to_radians();
    let lat2 = to[1].to_radians();
    let delta_lat = (to[1] - from[1]).to_radians();
    let delta_lng = (to[0] - from[0]).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Points along the great circle from `from` to `to`, splitting the path
/// into `segments` equal arcs. Both endpoints are included.
pub fn great_circle_points(from: Position, to: Position, segments: usize) -> Vec<Position> {
    let segments = segments.max(1);
    let lat1 = from[1].to_radians();
    let lng1 = from[0].to_radians();
    let lat2 = to[1].to_radians();
    let lng2 = to[0].to_radians();

    let angular = haversine_distance_km(from, to) / EARTH_RADIUS_KM;
    if angular.sin().abs() < 1e-12 {
        return vec![from, to];
    }

    let mut points = Vec::with_capacity(segments + 1);
    points.push(from);
    for step in 1..segments {
        let fraction = step as f64 / segments as f64;
        let a = ((1.0 - fraction) * angular).sin() / angular.sin();
        let b = (fraction * angular).sin() / angular.sin();

        let x = a * lat1.cos() * lng1.cos() + b * lat2.cos() * lng2.cos();
        let y = a * lat1.cos() * lng1.sin() + b * lat2.cos() * lng2.sin();
        let z = a * lat1.sin() + b * lat2.sin();

        let lat = z.atan2((x * x + y * y).sqrt());
        let lng = y.atan2(x);
        points.push([lng.to_degrees(), lat.to_degrees()]);
    }
    points.push(to);
    points
}

/// Project lng/lat to web mercator metres
pub fn lng_lat_to_web_mercator(lng: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
    let x = lng.to_radians() * WEB_MERCATOR_RADIUS_M;
    let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * WEB_MERCATOR_RADIUS_M;
    (x, y)
}

/// Inverse of [`lng_lat_to_web_mercator`]
pub fn web_mercator_to_lng_lat(x: f64, y: f64) -> (f64, f64) {
    let lng = (x / WEB_MERCATOR_RADIUS_M).to_degrees();
    let lat = (2.0 * (y / WEB_MERCATOR_RADIUS_M).exp().atan() - PI / 2.0).to_degrees();
    (lng, lat)
}

/// Round `value` to `precision` decimal places
pub fn limit_precision(value: f64, precision: u32) -> f64 {
    let factor = 10_f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Round both members of a coordinate
pub fn limit_position(position: Position, precision: u32) -> Position {
    [
        limit_precision(position[0], precision),
        limit_precision(position[1], precision),
    ]
}

/// Whether the coordinate is finite and inside lng [-180, 180], lat [-90, 90]
pub fn is_valid_coordinate(position: Position) -> bool {
    position[0].is_finite()
        && position[1].is_finite()
        && (-180.0..=180.0).contains(&position[0])
        && (-90.0..=90.0).contains(&position[1])
}

/// Number of decimal places in the shortest round-trip representation.
pub fn decimal_places(value: f64) -> u32 {
    let text = value.to_string();
    match text.split_once('.') {
        Some((_, fraction)) => fraction.len() as u32,
        None => 0,
    }
}

/// Whether neither member of the coordinate exceeds `precision` decimals
pub fn precision_is_valid(position: Position, precision: u32) -> bool {
    decimal_places(position[0]) <= precision && decimal_places(position[1]) <= precision
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let distance = haversine_distance_km([0.0, 0.0], [0.0, 1.0]);
        assert!((distance - 111.19).abs() < 0.1, "got {distance}");
    }

    #[test]
    fn test_great_circle_midpoint_on_equator() {
        let points = great_circle_points([0.0, 0.0], [10.0, 0.0], 2);
        assert_eq!(points.len(), 3);
        assert!((points[1][0] - 5.0).abs() < 1e-9);
        assert!(points[1][1].abs() < 1e-9);
    }

    #[test]
    fn test_great_circle_bends_towards_pole() {
        // Between two points on the same northern latitude the great circle
        // runs poleward of the parallel.
        let points = great_circle_points([-40.0, 50.0], [40.0, 50.0], 2);
        assert!(points[1][1] > 50.0);
    }

    #[test]
    fn test_web_mercator_roundtrip() {
        let (x, y) = lng_lat_to_web_mercator(13.4, 52.5);
        let (lng, lat) = web_mercator_to_lng_lat(x, y);
        assert!((lng - 13.4).abs() < 1e-9);
        assert!((lat - 52.5).abs() < 1e-9);
    }

    #[test]
    fn test_precision_helpers() {
        assert_eq!(limit_precision(1.23456, 2), 1.23);
        assert_eq!(decimal_places(1.5), 1);
        assert_eq!(decimal_places(2.0), 0);
        assert!(precision_is_valid([1.123, 2.1], 3));
        assert!(!precision_is_valid([1.1234, 2.1], 3));
    }

    #[test]
    fn test_coordinate_bounds() {
        assert!(is_valid_coordinate([180.0, -90.0]));
        assert!(!is_valid_coordinate([180.1, 0.0]));
        assert!(!is_valid_coordinate([f64::NAN, 0.0]));
    }
}
