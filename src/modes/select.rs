use crate::behaviors::{BehaviorConfig, ClickBoundingBoxBehavior, PixelDistanceBehavior};
use crate::error::{ModeError, ModeResult};
use crate::event::{DrawEvent, FinishAction};
use crate::geometry::geodesic::{is_valid_coordinate, limit_position};
use crate::geometry::hit_testing::{distance_to_polyline, point_in_polygon};
use crate::geometry::{properties, Feature, FeatureId, Geometry, Position};
use crate::input::{CursorEvent, KeyboardEvent};
use crate::mode::config::DEFAULT_COORDINATE_PRECISION;
use crate::mode::{BaseModeOptions, ClickKind, Cursor, FeatureStyle, Mode, ModeCore, ModeStyling};
use crate::store::{GeometryUpdate, PropertyUpdate};
use log::debug;
use std::collections::HashMap;

pub const SELECT_MODE: &str = "select";

/// What the select mode may do with features of one mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    pub draggable: bool,
    pub deletable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectKeyEvents {
    pub deselect: Option<String>,
    pub delete: Option<String>,
}

impl Default for SelectKeyEvents {
    fn default() -> Self {
        Self {
            deselect: Some("Escape".to_string()),
            delete: Some("Delete".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectModeOptions {
    pub base: BaseModeOptions,
    /// Applied to the selected feature
    pub styles: ModeStyling,
    /// Modes whose features can be selected. Features of other modes are
    /// ignored.
    pub flags: HashMap<String, FeatureFlags>,
    pub key_events: SelectKeyEvents,
    /// Shown while hovering a selectable feature
    pub hover_cursor: Cursor,
    pub drag_cursor: Cursor,
}

impl Default for SelectModeOptions {
    fn default() -> Self {
        Self {
            base: BaseModeOptions::default(),
            styles: ModeStyling::default(),
            flags: HashMap::new(),
            key_events: SelectKeyEvents::default(),
            hover_cursor: Cursor::Pointer,
            drag_cursor: Cursor::Grabbing,
        }
    }
}

#[derive(Debug)]
struct Behaviors {
    config: BehaviorConfig,
    pixel_distance: PixelDistanceBehavior,
    click_bounding_box: ClickBoundingBoxBehavior,
}

#[derive(Debug, Clone)]
struct DragState {
    id: FeatureId,
    last: Position,
}

/// Selects, deletes and drags features drawn by other modes
#[derive(Debug)]
pub struct SelectMode {
    core: ModeCore,
    options: SelectModeOptions,
    behaviors: Option<Behaviors>,
    selected: Option<FeatureId>,
    dragging: Option<DragState>,
}

impl Default for SelectMode {
    fn default() -> Self {
        Self::new(SelectModeOptions::default())
    }
}

impl SelectMode {
    pub fn new(mut options: SelectModeOptions) -> Self {
        let base = std::mem::take(&mut options.base);
        Self {
            core: ModeCore::new(SELECT_MODE, base),
            options,
            behaviors: None,
            selected: None,
            dragging: None,
        }
    }

    pub fn selected(&self) -> Option<&FeatureId> {
        self.selected.as_ref()
    }

    fn behaviors(&self) -> ModeResult<&Behaviors> {
        self.behaviors
            .as_ref()
            .ok_or_else(|| ModeError::NotRegistered(SELECT_MODE.to_string()))
    }

    fn flags_for(&self, feature: &Feature) -> Option<FeatureFlags> {
        feature
            .mode()
            .and_then(|mode| self.options.flags.get(mode))
            .copied()
    }

    /// Selectable feature under the cursor. Points win over lines, lines
    /// over polygons.
    fn feature_at(&self, event: &CursorEvent) -> ModeResult<Option<Feature>> {
        let behaviors = self.behaviors()?;
        let area = behaviors.click_bounding_box.create(event);
        let filter: &dyn Fn(&Feature) -> bool = &|feature: &Feature| {
            self.flags_for(feature).is_some()
                && !feature.has_flag(properties::CLOSING_POINT)
                && !feature.has_flag(properties::CURRENTLY_DRAWING)
        };
        let candidates = self.core.store()?.borrow().search(&area, Some(filter))?;

        let tolerance = behaviors.config.pointer_distance;
        let cursor = event.screen_point();
        let mut point: Option<(f64, &Feature)> = None;
        let mut line: Option<(f64, &Feature)> = None;
        let mut polygon: Option<&Feature> = None;

        for feature in &candidates {
            match &feature.geometry {
                Geometry::Point(position) => {
                    let distance = behaviors.pixel_distance.measure(event, *position);
                    if distance < tolerance && point.is_none_or(|(best, _)| distance < best) {
                        point = Some((distance, feature));
                    }
                }
                Geometry::LineString(coordinates) => {
                    let screen: Vec<_> = coordinates.iter().map(|c| behaviors.config.project(*c)).collect();
                    if let Some(distance) = distance_to_polyline(cursor, &screen) {
                        if distance < tolerance && line.is_none_or(|(best, _)| distance < best) {
                            line = Some((distance, feature));
                        }
                    }
                }
                Geometry::Polygon(rings) => {
                    if polygon.is_none() && point_in_polygon(event.position(), rings) {
                        polygon = Some(feature);
                    }
                }
                _ => {}
            }
        }

        let hit = point
            .map(|(_, feature)| feature)
            .or(line.map(|(_, feature)| feature))
            .or(polygon);
        Ok(hit.cloned())
    }

    fn select(&mut self, id: FeatureId) -> ModeResult<()> {
        if self.selected.as_ref() == Some(&id) {
            return Ok(());
        }
        self.deselect()?;

        self.core
            .store()?
            .borrow_mut()
            .update_property(vec![PropertyUpdate::new(id.clone(), properties::SELECTED, true)], None)?;
        debug!("Selected {}", id);
        self.selected = Some(id.clone());
        self.core.emit(DrawEvent::Select { id });
        Ok(())
    }

    fn deselect(&mut self) -> ModeResult<()> {
        let Some(id) = self.selected.take() else {
            return Ok(());
        };
        let store = self.core.store()?;
        if store.borrow().has(&id) {
            store
                .borrow_mut()
                .update_property(vec![PropertyUpdate::new(id.clone(), properties::SELECTED, false)], None)?;
        }
        self.core.emit(DrawEvent::Deselect { id });
        Ok(())
    }

    fn delete_selected(&mut self) -> ModeResult<()> {
        let Some(id) = self.selected.clone() else {
            return Ok(());
        };
        let store = self.core.store()?;
        let Ok(feature) = store.borrow().copy(&id) else {
            self.selected = None;
            return Ok(());
        };
        if !self.flags_for(&feature).is_some_and(|flags| flags.deletable) {
            return Ok(());
        }

        self.selected = None;
        self.core.emit(DrawEvent::Deselect { id: id.clone() });
        store.borrow_mut().delete(&[id], None)?;
        Ok(())
    }

    fn end_drag(&mut self) {
        if self.dragging.take().is_some() {
            self.core.set_map_draggability(true);
        }
    }
}

/// `geometry` moved by `delta`, or `None` if that would leave valid
/// coordinate space
fn translate(geometry: &Geometry, delta: Position, precision: u32) -> Option<Geometry> {
    let shift = |position: &Position| -> Option<Position> {
        let moved = limit_position([position[0] + delta[0], position[1] + delta[1]], precision);
        is_valid_coordinate(moved).then_some(moved)
    };

    match geometry {
        Geometry::Point(position) => shift(position).map(Geometry::Point),
        Geometry::LineString(coordinates) => coordinates
            .iter()
            .map(shift)
            .collect::<Option<Vec<_>>>()
            .map(Geometry::LineString),
        Geometry::Polygon(rings) => rings
            .iter()
            .map(|ring| ring.iter().map(shift).collect::<Option<Vec<_>>>())
            .collect::<Option<Vec<_>>>()
            .map(Geometry::Polygon),
        _ => None,
    }
}

impl Mode for SelectMode {
    fn core(&self) -> &ModeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModeCore {
        &mut self.core
    }

    fn register_behaviors(&mut self) -> ModeResult<()> {
        let config = self.core.behavior_config()?;
        self.behaviors = Some(Behaviors {
            pixel_distance: PixelDistanceBehavior::new(&config),
            click_bounding_box: ClickBoundingBoxBehavior::new(&config),
            config,
        });
        Ok(())
    }

    fn start(&mut self) -> ModeResult<()> {
        self.core.set_started()?;
        self.core.set_selecting()
    }

    fn on_click(&mut self, event: &CursorEvent) -> ModeResult<()> {
        match self.core.click_kind(event) {
            Some(ClickKind::Left) => {}
            Some(ClickKind::Right | ClickKind::ContextMenu) => return self.deselect(),
            None => return Ok(()),
        }

        match self.feature_at(event)? {
            Some(feature) => match feature.id {
                Some(id) => self.select(id),
                None => Ok(()),
            },
            None => self.deselect(),
        }
    }

    fn on_mouse_move(&mut self, event: &CursorEvent) -> ModeResult<()> {
        if self.dragging.is_some() {
            return Ok(());
        }
        let cursor = match self.feature_at(event)? {
            Some(_) => self.options.hover_cursor,
            None => Cursor::Unset,
        };
        self.core.set_cursor(cursor);
        Ok(())
    }

    fn on_key_up(&mut self, event: &KeyboardEvent) -> ModeResult<()> {
        let key = Some(event.key.as_str());
        let is_delete = self.options.key_events.delete.as_deref() == key;
        let is_deselect = self.options.key_events.deselect.as_deref() == key;
        if is_delete {
            self.delete_selected()
        } else if is_deselect {
            self.deselect()
        } else {
            Ok(())
        }
    }

    fn on_drag_start(&mut self, event: &CursorEvent) -> ModeResult<()> {
        if !self
            .core
            .allow_pointer_event(&self.core.options.pointer_events.on_drag_start, event)
        {
            return Ok(());
        }
        let Some(selected) = self.selected.clone() else {
            return Ok(());
        };

        let Some(feature) = self.feature_at(event)? else {
            return Ok(());
        };
        if feature.id.as_ref() != Some(&selected) {
            return Ok(());
        }
        if !self.flags_for(&feature).is_some_and(|flags| flags.draggable) {
            return Ok(());
        }

        self.dragging = Some(DragState {
            id: selected,
            last: event.position(),
        });
        self.core.set_map_draggability(false);
        self.core.set_cursor(self.options.drag_cursor);
        Ok(())
    }

    fn on_drag(&mut self, event: &CursorEvent) -> ModeResult<()> {
        if !self
            .core
            .allow_pointer_event(&self.core.options.pointer_events.on_drag, event)
        {
            return Ok(());
        }
        let Some(drag) = self.dragging.clone() else {
            return Ok(());
        };

        let store = self.core.store()?;
        if !store.borrow().has(&drag.id) {
            self.end_drag();
            return Ok(());
        }

        let precision = self
            .core
            .coordinate_precision()
            .unwrap_or(DEFAULT_COORDINATE_PRECISION);
        let position = event.position();
        let delta = [position[0] - drag.last[0], position[1] - drag.last[1]];
        let geometry = store.borrow().get_geometry_copy(&drag.id)?;
        let Some(moved) = translate(&geometry, delta, precision) else {
            return Ok(());
        };

        store
            .borrow_mut()
            .update_geometry(vec![GeometryUpdate::new(drag.id.clone(), moved)], None)?;
        if let Some(dragging) = self.dragging.as_mut() {
            dragging.last = position;
        }
        Ok(())
    }

    fn on_drag_end(&mut self, event: &CursorEvent) -> ModeResult<()> {
        if !self
            .core
            .allow_pointer_event(&self.core.options.pointer_events.on_drag_end, event)
        {
            return Ok(());
        }
        let Some(drag) = self.dragging.clone() else {
            return Ok(());
        };

        self.end_drag();
        self.core.set_cursor(self.options.hover_cursor);
        self.core.emit(DrawEvent::Finish {
            id: drag.id,
            mode: SELECT_MODE.to_string(),
            action: FinishAction::DragFeature,
        });
        Ok(())
    }

    fn style_feature(&self, feature: &Feature) -> FeatureStyle {
        if feature.has_flag(properties::SELECTED) {
            let mut style = self.options.styles.apply(feature);
            style.z_index = 20;
            style
        } else {
            FeatureStyle::default()
        }
    }

    fn after_feature_updated(&mut self, feature: &Feature) -> ModeResult<()> {
        let dragged = self.dragging.as_ref().map(|drag| &drag.id);
        if feature.id.is_some() && feature.id.as_ref() == dragged {
            self.end_drag();
        }
        Ok(())
    }

    fn clean_up(&mut self) -> ModeResult<()> {
        self.end_drag();
        self.deselect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_refuses_to_leave_valid_space() {
        let point = Geometry::Point([179.5, 0.0]);
        assert_eq!(translate(&point, [0.25, 1.0], 9), Some(Geometry::Point([179.75, 1.0])));
        assert_eq!(translate(&point, [1.0, 0.0], 9), None);
    }
}
