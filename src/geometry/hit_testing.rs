//! Screen-space hit testing helpers.
//!
//! Everything here works in container pixels; geographic coordinates are
//! projected by the caller first.

use super::{Position, ScreenPoint};

/// Euclidean distance between two screen points
pub fn cartesian_distance(a: ScreenPoint, b: ScreenPoint) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Closest point to `point` on the segment `start..end`, with its distance.
pub fn nearest_point_on_segment(
    point: ScreenPoint,
    start: ScreenPoint,
    end: ScreenPoint,
) -> (ScreenPoint, f64) {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq == 0.0 {
        // Degenerate segment
        return (start, cartesian_distance(point, start));
    }

    let t = (((point.x - start.x) * dx + (point.y - start.y) * dy) / length_sq).clamp(0.0, 1.0);
    let projection = ScreenPoint::new(start.x + dx * t, start.y + dy * t);
    (projection, cartesian_distance(point, projection))
}

/// Distance from `point` to the nearest segment of a polyline.
pub fn distance_to_polyline(point: ScreenPoint, line: &[ScreenPoint]) -> Option<f64> {
    if let [only] = line {
        return Some(cartesian_distance(point, *only));
    }
    line.windows(2)
        .map(|pair| nearest_point_on_segment(point, pair[0], pair[1]).1)
        .min_by(|a, b| a.total_cmp(b))
}

/// Even-odd ray casting test against a polygon given as rings (outer first,
/// holes after).
pub fn point_in_polygon(point: Position, rings: &[Vec<Position>]) -> bool {
    let mut inside = false;
    for ring in rings {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = (ring[i][0], ring[i][1]);
            let (xj, yj) = (ring[j][0], ring[j][1]);
            if (yi > point[1]) != (yj > point[1])
                && point[0] < (xj - xi) * (point[1] - yi) / (yj - yi) + xi
            {
                inside = !inside;
            }
            j = i;
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_point_is_clamped_to_segment() {
        let (nearest, distance) = nearest_point_on_segment(
            ScreenPoint::new(15.0, 5.0),
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(10.0, 0.0),
        );
        assert_eq!(nearest, ScreenPoint::new(10.0, 0.0));
        assert!((distance - 50.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_point_in_polygon_respects_holes() {
        let outer = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]];
        let hole = vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0], [4.0, 4.0]];
        let rings = vec![outer, hole];

        assert!(point_in_polygon([1.0, 1.0], &rings));
        assert!(!point_in_polygon([5.0, 5.0], &rings));
        assert!(!point_in_polygon([11.0, 5.0], &rings));
    }
}
