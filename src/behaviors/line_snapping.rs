use super::{segments, BehaviorConfig, ClickBoundingBoxBehavior};
use crate::error::{BehaviorError, StoreError};
use crate::geometry::geodesic::limit_position;
use crate::geometry::hit_testing::nearest_point_on_segment;
use crate::geometry::{properties, Feature, FeatureId, Position, ScreenPoint};
use crate::input::CursorEvent;

/// Snaps the cursor onto the nearest segment of an existing line or ring
#[derive(Debug, Clone)]
pub struct LineSnappingBehavior {
    config: BehaviorConfig,
    click_bounding_box: ClickBoundingBoxBehavior,
}

impl LineSnappingBehavior {
    pub fn new(config: &BehaviorConfig, click_bounding_box: &ClickBoundingBoxBehavior) -> Self {
        Self {
            config: config.clone(),
            click_bounding_box: click_bounding_box.clone(),
        }
    }

    pub fn snappable_coordinate_first_click(&self, event: &CursorEvent) -> Result<Option<Position>, BehaviorError> {
        let mode = self.config.mode.clone();
        self.get_snappable(event, move |feature| is_snap_target(feature, &mode))
    }

    pub fn snappable_coordinate(
        &self,
        event: &CursorEvent,
        current_id: &FeatureId,
    ) -> Result<Option<Position>, BehaviorError> {
        if !self.config.store.borrow().has(current_id) {
            return Err(StoreError::FeatureNotFound(current_id.clone()).into());
        }
        let mode = self.config.mode.clone();
        let current_id = current_id.clone();
        self.get_snappable(event, move |feature| {
            is_snap_target(feature, &mode) && feature.id.as_ref() != Some(&current_id)
        })
    }

    /// Nearest point on any segment strictly within the pointer tolerance,
    /// rounded to the configured precision
    pub fn get_snappable(
        &self,
        event: &CursorEvent,
        filter: impl Fn(&Feature) -> bool,
    ) -> Result<Option<Position>, BehaviorError> {
        let area = self.click_bounding_box.create(event);
        let filter: &dyn Fn(&Feature) -> bool = &filter;
        let candidates = self.config.store.borrow().search(&area, Some(filter))?;

        let cursor = event.screen_point();
        let mut nearest: Option<(ScreenPoint, f64)> = None;
        for feature in &candidates {
            for (start, end) in segments(feature) {
                let (point, distance) =
                    nearest_point_on_segment(cursor, self.config.project(start), self.config.project(end));
                if distance >= self.config.pointer_distance {
                    continue;
                }
                if nearest.is_none_or(|(_, best)| distance < best) {
                    nearest = Some((point, distance));
                }
            }
        }

        Ok(nearest.map(|(point, _)| {
            limit_position(
                self.config.unproject(point).position(),
                self.config.coordinate_precision,
            )
        }))
    }
}

fn is_snap_target(feature: &Feature, mode: &str) -> bool {
    feature.mode() == Some(mode) && !feature.has_flag(properties::CLOSING_POINT)
}
