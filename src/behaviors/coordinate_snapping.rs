use super::{vertices, BehaviorConfig, ClickBoundingBoxBehavior, PixelDistanceBehavior};
use crate::error::{BehaviorError, StoreError};
use crate::geometry::{properties, Feature, FeatureId, Position};
use crate::input::CursorEvent;

/// Snaps the cursor to the nearest existing vertex
#[derive(Debug, Clone)]
pub struct CoordinateSnappingBehavior {
    config: BehaviorConfig,
    click_bounding_box: ClickBoundingBoxBehavior,
    pixel_distance: PixelDistanceBehavior,
}

impl CoordinateSnappingBehavior {
    pub fn new(
        config: &BehaviorConfig,
        pixel_distance: &PixelDistanceBehavior,
        click_bounding_box: &ClickBoundingBoxBehavior,
    ) -> Self {
        Self {
            config: config.clone(),
            click_bounding_box: click_bounding_box.clone(),
            pixel_distance: pixel_distance.clone(),
        }
    }

    /// Snap target for the first point of a new shape: any vertex of a
    /// feature owned by this mode
    pub fn snappable_coordinate_first_click(&self, event: &CursorEvent) -> Result<Option<Position>, BehaviorError> {
        let mode = self.config.mode.clone();
        self.get_snappable(event, move |feature| is_snap_target(feature, &mode))
    }

    /// Snap target while drawing `current_id`, which never snaps to itself
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

    /// Nearest vertex strictly within the pointer tolerance among features
    /// near the cursor that pass `filter`
    pub fn get_snappable(
        &self,
        event: &CursorEvent,
        filter: impl Fn(&Feature) -> bool,
    ) -> Result<Option<Position>, BehaviorError> {
        let area = self.click_bounding_box.create(event);
        let filter: &dyn Fn(&Feature) -> bool = &filter;
        let candidates = self.config.store.borrow().search(&area, Some(filter))?;

        let mut nearest: Option<(Position, f64)> = None;
        for feature in &candidates {
            for vertex in vertices(feature) {
                let distance = self.pixel_distance.measure(event, vertex);
                if distance >= self.config.pointer_distance {
                    continue;
                }
                if nearest.is_none_or(|(_, best)| distance < best) {
                    nearest = Some((vertex, distance));
                }
            }
        }
        Ok(nearest.map(|(vertex, _)| vertex))
    }
}

fn is_snap_target(feature: &Feature, mode: &str) -> bool {
    feature.mode() == Some(mode) && !feature.has_flag(properties::CLOSING_POINT)
}
