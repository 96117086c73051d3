//! Data-driven styling.
//!
//! Each style property is either a constant or a function of the feature.
//! The host renders with the resolved [`FeatureStyle`].

use crate::geometry::Feature;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

pub const DEFAULT_COLOR: &str = "#3f97e0";
pub const DEFAULT_OUTLINE_COLOR: &str = "#ffffff";

#[derive(Clone)]
pub enum StyleValue<T> {
    Constant(T),
    Computed(Rc<dyn Fn(&Feature) -> T>),
}

impl<T: Clone> StyleValue<T> {
    pub fn computed(f: impl Fn(&Feature) -> T + 'static) -> Self {
        StyleValue::Computed(Rc::new(f))
    }

    pub fn resolve(&self, feature: &Feature) -> T {
        match self {
            StyleValue::Constant(value) => value.clone(),
            StyleValue::Computed(f) => f(feature),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for StyleValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StyleValue::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            StyleValue::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

impl From<&str> for StyleValue<String> {
    fn from(value: &str) -> Self {
        StyleValue::Constant(value.to_string())
    }
}

impl From<f64> for StyleValue<f64> {
    fn from(value: f64) -> Self {
        StyleValue::Constant(value)
    }
}

/// Resolved style of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    pub point_color: String,
    pub point_width: f64,
    pub point_outline_color: String,
    pub point_outline_width: f64,
    pub line_string_color: String,
    pub line_string_width: f64,
    pub polygon_fill_color: String,
    pub polygon_fill_opacity: f64,
    pub polygon_outline_color: String,
    pub polygon_outline_width: f64,
    pub z_index: i32,
}

impl Default for FeatureStyle {
    fn default() -> Self {
        Self {
            point_color: DEFAULT_COLOR.to_string(),
            point_width: 6.0,
            point_outline_color: DEFAULT_OUTLINE_COLOR.to_string(),
            point_outline_width: 0.0,
            line_string_color: DEFAULT_COLOR.to_string(),
            line_string_width: 4.0,
            polygon_fill_color: DEFAULT_COLOR.to_string(),
            polygon_fill_opacity: 0.3,
            polygon_outline_color: DEFAULT_COLOR.to_string(),
            polygon_outline_width: 4.0,
            z_index: 0,
        }
    }
}

/// Per-mode style overrides. Unset properties fall back to
/// [`FeatureStyle::default`].
#[derive(Debug, Clone, Default)]
pub struct ModeStyling {
    pub point_color: Option<StyleValue<String>>,
    pub point_width: Option<StyleValue<f64>>,
    pub point_outline_color: Option<StyleValue<String>>,
    pub point_outline_width: Option<StyleValue<f64>>,
    pub line_string_color: Option<StyleValue<String>>,
    pub line_string_width: Option<StyleValue<f64>>,
    pub polygon_fill_color: Option<StyleValue<String>>,
    pub polygon_fill_opacity: Option<StyleValue<f64>>,
    pub polygon_outline_color: Option<StyleValue<String>>,
    pub polygon_outline_width: Option<StyleValue<f64>>,
}

impl ModeStyling {
    pub fn apply(&self, feature: &Feature) -> FeatureStyle {
        self.apply_over(FeatureStyle::default(), feature)
    }

    /// Resolves every set override on top of `base`
    pub fn apply_over(&self, base: FeatureStyle, feature: &Feature) -> FeatureStyle {
        fn pick<T: Clone>(value: &Option<StyleValue<T>>, fallback: T, feature: &Feature) -> T {
            value.as_ref().map_or(fallback, |value| value.resolve(feature))
        }

        FeatureStyle {
            point_color: pick(&self.point_color, base.point_color, feature),
            point_width: pick(&self.point_width, base.point_width, feature),
            point_outline_color: pick(&self.point_outline_color, base.point_outline_color, feature),
            point_outline_width: pick(&self.point_outline_width, base.point_outline_width, feature),
            line_string_color: pick(&self.line_string_color, base.line_string_color, feature),
            line_string_width: pick(&self.line_string_width, base.line_string_width, feature),
            polygon_fill_color: pick(&self.polygon_fill_color, base.polygon_fill_color, feature),
            polygon_fill_opacity: pick(&self.polygon_fill_opacity, base.polygon_fill_opacity, feature),
            polygon_outline_color: pick(&self.polygon_outline_color, base.polygon_outline_color, feature),
            polygon_outline_width: pick(&self.polygon_outline_width, base.polygon_outline_width, feature),
            z_index: base.z_index,
        }
    }
}
