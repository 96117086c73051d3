use super::{BehaviorConfig, PixelDistanceBehavior};
use crate::error::BehaviorError;
use crate::geometry::{properties, FeatureId, Geometry, NewFeature, Position};
use crate::input::CursorEvent;
use crate::store::GeometryUpdate;

/// Result of testing the cursor against the closing points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClosingPointHit {
    /// Cursor is on the first closing point (the start of the shape)
    pub is_closing: bool,
    /// Cursor is on the second closing point (the last placed vertex)
    pub is_previous_closing: bool,
}

/// Owns the auxiliary point features that mark where a shape can be finished
#[derive(Debug, Clone)]
pub struct ClosingPointsBehavior {
    config: BehaviorConfig,
    pixel_distance: PixelDistanceBehavior,
    ids: Vec<FeatureId>,
}

impl ClosingPointsBehavior {
    pub fn new(config: &BehaviorConfig, pixel_distance: &PixelDistanceBehavior) -> Self {
        Self {
            config: config.clone(),
            pixel_distance: pixel_distance.clone(),
            ids: Vec::new(),
        }
    }

    pub fn ids(&self) -> &[FeatureId] {
        &self.ids
    }

    pub fn create(&mut self, points: &[Position]) -> Result<(), BehaviorError> {
        if !self.ids.is_empty() {
            return Err(BehaviorError::ClosingPointsExist);
        }
        if !(1..=2).contains(&points.len()) {
            return Err(BehaviorError::InvalidClosingPointCount(points.len()));
        }

        let features = points
            .iter()
            .map(|point| {
                let mut feature = NewFeature::with_mode(Geometry::Point(*point), &self.config.mode);
                feature
                    .properties
                    .insert(properties::CLOSING_POINT.to_string(), true.into());
                feature
            })
            .collect();
        self.ids = self.config.store.borrow_mut().create(features, None)?;
        Ok(())
    }

    /// Moves the closing points; `points` must match the number created.
    /// If any of them was removed from the store, they are all recreated.
    pub fn update(&mut self, points: &[Position]) -> Result<(), BehaviorError> {
        if points.len() != self.ids.len() {
            return Err(BehaviorError::ClosingPointMismatch {
                expected: self.ids.len(),
                actual: points.len(),
            });
        }

        let missing = {
            let store = self.config.store.borrow();
            self.ids.iter().any(|id| !store.has(id))
        };
        if missing {
            self.delete()?;
            return self.create(points);
        }

        let updates = self
            .ids
            .iter()
            .zip(points)
            .map(|(id, point)| GeometryUpdate::new(id.clone(), Geometry::Point(*point)))
            .collect();
        self.config.store.borrow_mut().update_geometry(updates, None)?;
        Ok(())
    }

    /// Removes whichever closing points still exist and forgets them all
    pub fn delete(&mut self) -> Result<(), BehaviorError> {
        if self.ids.is_empty() {
            return Ok(());
        }
        let ids = std::mem::take(&mut self.ids);
        let mut store = self.config.store.borrow_mut();
        let existing: Vec<FeatureId> = ids.into_iter().filter(|id| store.has(id)).collect();
        store.delete(&existing, None)?;
        Ok(())
    }

    /// Closing points that no longer exist in the store never match
    pub fn is_closing_point(&self, event: &CursorEvent) -> Result<ClosingPointHit, BehaviorError> {
        let mut hit = ClosingPointHit::default();
        let store = self.config.store.borrow();

        for (index, id) in self.ids.iter().enumerate() {
            let Ok(Geometry::Point(position)) = store.get_geometry_copy(id) else {
                continue;
            };
            if self.pixel_distance.within_tolerance(event, position) {
                match index {
                    0 => hit.is_closing = true,
                    _ => hit.is_previous_closing = true,
                }
            }
        }
        Ok(hit)
    }
}
