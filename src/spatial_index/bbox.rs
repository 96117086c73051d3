use crate::error::SpatialIndexError;
use crate::geometry::Geometry;

/// Axis-aligned bounding box in lng/lat degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    /// The identity for [`BBox::extend`]: intersects nothing
    pub const EMPTY: BBox = BBox {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Box of a geometry: the outer ring for polygons, the vertices for
    /// lines, the coordinate for points.
    pub fn from_geometry(geometry: &Geometry) -> Result<Self, SpatialIndexError> {
        let outline = geometry
            .outline()
            .ok_or(SpatialIndexError::UnsupportedGeometry(geometry.kind()))?;

        let mut bbox = Self::EMPTY;
        for position in outline {
            bbox.min_x = bbox.min_x.min(position[0]);
            bbox.min_y = bbox.min_y.min(position[1]);
            bbox.max_x = bbox.max_x.max(position[0]);
            bbox.max_y = bbox.max_y.max(position[1]);
        }
        Ok(bbox)
    }

    pub fn extend(&mut self, other: &BBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn area(&self) -> f64 {
        (self.max_x - self.min_x) * (self.max_y - self.min_y)
    }

    /// Half perimeter
    pub fn margin(&self) -> f64 {
        (self.max_x - self.min_x) + (self.max_y - self.min_y)
    }

    /// Area of the box that would cover both `self` and `other`
    pub fn enlarged_area(&self, other: &BBox) -> f64 {
        (self.max_x.max(other.max_x) - self.min_x.min(other.min_x))
            * (self.max_y.max(other.max_y) - self.min_y.min(other.min_y))
    }

    pub fn intersection_area(&self, other: &BBox) -> f64 {
        let min_x = self.min_x.max(other.min_x);
        let min_y = self.min_y.max(other.min_y);
        let max_x = self.max_x.min(other.max_x);
        let max_y = self.max_y.min(other.max_y);
        (max_x - min_x).max(0.0) * (max_y - min_y).max(0.0)
    }

    pub fn contains(&self, other: &BBox) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        other.min_x <= self.max_x
            && other.min_y <= self.max_y
            && other.max_x >= self.min_x
            && other.max_y >= self.min_y
    }
}
