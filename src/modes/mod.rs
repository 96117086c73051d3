//! The modes shipped with the core.

mod linestring;
mod point;
mod polygon;
mod select;
mod static_mode;

pub use linestring::{InsertStrategy, LineStringMode, LineStringModeOptions, LINESTRING_MODE};
pub use point::{PointMode, PointModeOptions, POINT_MODE};
pub use polygon::{PolygonMode, PolygonModeOptions, PolygonSnapping, POLYGON_MODE};
pub use select::{FeatureFlags, SelectKeyEvents, SelectMode, SelectModeOptions, SELECT_MODE};
pub use static_mode::{StaticMode, STATIC_MODE};
