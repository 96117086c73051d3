use super::BehaviorConfig;
use crate::geometry::hit_testing::cartesian_distance;
use crate::geometry::Position;
use crate::input::CursorEvent;

/// Screen distance between the cursor and a geographic coordinate
#[derive(Debug, Clone)]
pub struct PixelDistanceBehavior {
    config: BehaviorConfig,
}

impl PixelDistanceBehavior {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn measure(&self, event: &CursorEvent, coordinate: Position) -> f64 {
        cartesian_distance(event.screen_point(), self.config.project(coordinate))
    }

    /// True when `coordinate` is strictly inside the pointer tolerance
    pub fn within_tolerance(&self, event: &CursorEvent, coordinate: Position) -> bool {
        self.measure(event, coordinate) < self.config.pointer_distance
    }
}
