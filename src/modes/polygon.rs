use crate::behaviors::{
    ClickBoundingBoxBehavior, ClosingPointsBehavior, CoordinateSnappingBehavior, LineSnappingBehavior,
    PixelDistanceBehavior,
};
use crate::error::{ModeError, ModeResult};
use crate::event::{DrawEvent, FinishAction};
use crate::geometry::geodesic::limit_position;
use crate::geometry::validation::{self_intersects, validate_non_intersecting_polygon_feature, ValidationResult};
use crate::geometry::{properties, Feature, FeatureId, Geometry, NewFeature, Position};
use crate::input::{CursorEvent, KeyboardEvent};
use crate::mode::config::DEFAULT_COORDINATE_PRECISION;
use crate::mode::{BaseModeOptions, ClickKind, Cursor, FeatureStyle, KeyEvents, Mode, ModeCore, ModeState, ModeStyling};
use crate::store::{GeometryUpdate, PropertyUpdate};
use log::debug;

pub const POLYGON_MODE: &str = "polygon";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolygonSnapping {
    /// Snap to existing polygon vertices
    pub to_coordinate: bool,
    /// Snap onto existing polygon edges
    pub to_line: bool,
}

#[derive(Debug, Clone)]
pub struct PolygonModeOptions {
    pub base: BaseModeOptions,
    pub styles: ModeStyling,
    pub key_events: KeyEvents,
    pub snapping: PolygonSnapping,
    pub cursor: Cursor,
    pub close_cursor: Cursor,
}

impl Default for PolygonModeOptions {
    fn default() -> Self {
        Self {
            base: BaseModeOptions::default(),
            styles: ModeStyling::default(),
            key_events: KeyEvents::default(),
            snapping: PolygonSnapping::default(),
            cursor: Cursor::Crosshair,
            close_cursor: Cursor::Pointer,
        }
    }
}

#[derive(Debug)]
struct Behaviors {
    coordinate_snapping: CoordinateSnappingBehavior,
    line_snapping: LineSnappingBehavior,
    closing_points: ClosingPointsBehavior,
}

/// Draws a polygon one click per vertex. The ring stays closed while
/// drawing; clicking the first or the last vertex finishes it.
#[derive(Debug)]
pub struct PolygonMode {
    core: ModeCore,
    options: PolygonModeOptions,
    behaviors: Option<Behaviors>,
    current_id: Option<FeatureId>,
    /// Placed vertices, without the cursor preview or the closing repeat
    vertices: Vec<Position>,
}

impl Default for PolygonMode {
    fn default() -> Self {
        Self::new(PolygonModeOptions::default())
    }
}

/// Closed ring through `vertices` and an optional trailing preview point,
/// padded so it always has at least four positions
fn ring(vertices: &[Position], preview: Option<Position>) -> Vec<Position> {
    let mut ring = vertices.to_vec();
    ring.extend(preview);
    while ring.len() < 3 {
        if let Some(&last) = ring.last() {
            ring.push(last);
        } else {
            break;
        }
    }
    if let Some(&first) = ring.first() {
        ring.push(first);
    }
    ring
}

impl PolygonMode {
    pub fn new(mut options: PolygonModeOptions) -> Self {
        let base = std::mem::take(&mut options.base);
        Self {
            core: ModeCore::new(POLYGON_MODE, base),
            options,
            behaviors: None,
            current_id: None,
            vertices: Vec::new(),
        }
    }

    pub fn current_id(&self) -> Option<&FeatureId> {
        self.current_id.as_ref()
    }

    fn precision(&self) -> u32 {
        self.core
            .coordinate_precision()
            .unwrap_or(DEFAULT_COORDINATE_PRECISION)
    }

    fn behaviors(&self) -> ModeResult<&Behaviors> {
        self.behaviors
            .as_ref()
            .ok_or_else(|| ModeError::NotRegistered(POLYGON_MODE.to_string()))
    }

    fn behaviors_mut(&mut self) -> ModeResult<&mut Behaviors> {
        self.behaviors
            .as_mut()
            .ok_or_else(|| ModeError::NotRegistered(POLYGON_MODE.to_string()))
    }

    /// Coordinate snapping wins over line snapping
    fn cursor_position(&self, event: &CursorEvent) -> ModeResult<Position> {
        let snapping = self.options.snapping;
        let behaviors = self.behaviors()?;

        if snapping.to_coordinate {
            let snapped = match &self.current_id {
                Some(id) => behaviors.coordinate_snapping.snappable_coordinate(event, id)?,
                None => behaviors.coordinate_snapping.snappable_coordinate_first_click(event)?,
            };
            if let Some(position) = snapped {
                return Ok(position);
            }
        }
        if snapping.to_line {
            let snapped = match &self.current_id {
                Some(id) => behaviors.line_snapping.snappable_coordinate(event, id)?,
                None => behaviors.line_snapping.snappable_coordinate_first_click(event)?,
            };
            if let Some(position) = snapped {
                return Ok(position);
            }
        }
        Ok(limit_position(event.position(), self.precision()))
    }

    fn reset(&mut self) -> ModeResult<()> {
        if let Some(behaviors) = self.behaviors.as_mut() {
            behaviors.closing_points.delete()?;
        }
        self.current_id = None;
        self.vertices.clear();
        if self.core.state() == ModeState::Drawing {
            self.core.set_started()?;
        }
        Ok(())
    }

    fn drawing_alive(&mut self) -> ModeResult<bool> {
        let Some(id) = &self.current_id else {
            return Ok(false);
        };
        if self.core.store()?.borrow().has(id) {
            return Ok(true);
        }
        debug!("Polygon {} disappeared while drawing", id);
        self.reset()?;
        Ok(false)
    }

    fn set_ring(&self, id: &FeatureId, ring: Vec<Position>) -> ModeResult<()> {
        self.core
            .store()?
            .borrow_mut()
            .update_geometry(vec![GeometryUpdate::new(id.clone(), Geometry::Polygon(vec![ring]))], None)?;
        Ok(())
    }

    fn start_polygon(&mut self, position: Position) -> ModeResult<()> {
        let mut feature = NewFeature::with_mode(Geometry::Polygon(vec![ring(&[position], None)]), POLYGON_MODE);
        feature
            .properties
            .insert(properties::CURRENTLY_DRAWING.to_string(), true.into());

        let store = self.core.store()?;
        let ids = store.borrow_mut().create(vec![feature], None)?;
        self.current_id = ids.into_iter().next();
        self.vertices = vec![position];
        self.core.set_drawing()?;
        Ok(())
    }

    fn add_vertex(&mut self, id: FeatureId, position: Position) -> ModeResult<()> {
        if self.vertices.contains(&position) {
            return Ok(());
        }

        let mut vertices = self.vertices.clone();
        vertices.push(position);

        // reject silently if the new edge would cross the ring
        if vertices.len() >= 3 && self_intersects(&ring(&vertices, None)) {
            debug!("Rejected self-intersecting vertex for polygon {}", id);
            return Ok(());
        }

        self.set_ring(&id, ring(&vertices, None))?;
        self.vertices = vertices;

        if self.vertices.len() >= 3 {
            let points = [self.vertices[0], position];
            let closing_points = &mut self.behaviors_mut()?.closing_points;
            if closing_points.ids().is_empty() {
                closing_points.create(&points)?;
            } else {
                closing_points.update(&points)?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> ModeResult<()> {
        let Some(id) = self.current_id.clone() else {
            return Ok(());
        };
        if self.vertices.len() < 3 {
            return Ok(());
        }

        let closed = ring(&self.vertices, None);
        let candidate = Feature::new(Some(id.clone()), Geometry::Polygon(vec![closed.clone()]), Default::default());
        if !validate_non_intersecting_polygon_feature(&candidate, self.precision()).valid {
            return Ok(());
        }

        self.set_ring(&id, closed)?;
        self.core
            .store()?
            .borrow_mut()
            .update_property(vec![PropertyUpdate::remove(id.clone(), properties::CURRENTLY_DRAWING)], None)?;

        self.behaviors_mut()?.closing_points.delete()?;
        self.current_id = None;
        self.vertices.clear();
        self.core.set_started()?;
        self.core.emit(DrawEvent::Finish {
            id,
            mode: POLYGON_MODE.to_string(),
            action: FinishAction::Draw,
        });
        Ok(())
    }
}

impl Mode for PolygonMode {
    fn core(&self) -> &ModeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModeCore {
        &mut self.core
    }

    fn register_behaviors(&mut self) -> ModeResult<()> {
        let config = self.core.behavior_config()?;
        let pixel_distance = PixelDistanceBehavior::new(&config);
        let click_bounding_box = ClickBoundingBoxBehavior::new(&config);
        self.behaviors = Some(Behaviors {
            coordinate_snapping: CoordinateSnappingBehavior::new(&config, &pixel_distance, &click_bounding_box),
            line_snapping: LineSnappingBehavior::new(&config, &click_bounding_box),
            closing_points: ClosingPointsBehavior::new(&config, &pixel_distance),
        });
        Ok(())
    }

    fn start(&mut self) -> ModeResult<()> {
        self.core.set_started()?;
        self.core.set_cursor(self.options.cursor);
        Ok(())
    }

    fn on_click(&mut self, event: &CursorEvent) -> ModeResult<()> {
        if self.core.click_kind(event) != Some(ClickKind::Left) {
            return Ok(());
        }

        if !self.drawing_alive()? {
            let position = self.cursor_position(event)?;
            return self.start_polygon(position);
        }

        let hit = self.behaviors()?.closing_points.is_closing_point(event)?;
        if hit.is_closing || hit.is_previous_closing {
            return self.finish();
        }

        let position = self.cursor_position(event)?;
        match self.current_id.clone() {
            Some(id) => self.add_vertex(id, position),
            None => Ok(()),
        }
    }

    fn on_mouse_move(&mut self, event: &CursorEvent) -> ModeResult<()> {
        if !self.drawing_alive()? {
            return Ok(());
        }
        let Some(id) = self.current_id.clone() else {
            return Ok(());
        };

        let hit = self.behaviors()?.closing_points.is_closing_point(event)?;
        let closing = hit.is_closing || hit.is_previous_closing;
        self.core.set_cursor(if closing {
            self.options.close_cursor
        } else {
            self.options.cursor
        });

        let position = self.cursor_position(event)?;
        self.set_ring(&id, ring(&self.vertices, Some(position)))
    }

    fn on_key_up(&mut self, event: &KeyboardEvent) -> ModeResult<()> {
        if self.options.key_events.is_cancel(&event.key) {
            self.clean_up()?;
            if self.core.state() == ModeState::Drawing {
                self.core.set_started()?;
            }
        } else if self.options.key_events.is_finish(&event.key) && self.drawing_alive()? {
            self.finish()?;
        }
        Ok(())
    }

    fn style_feature(&self, feature: &Feature) -> FeatureStyle {
        if feature.mode() != Some(POLYGON_MODE) {
            return FeatureStyle::default();
        }
        let mut style = self.options.styles.apply(feature);
        style.z_index = if feature.has_flag(properties::CLOSING_POINT) { 30 } else { 10 };
        style
    }

    fn validate_feature(&self, feature: &Feature) -> ValidationResult {
        let precision = self.precision();
        self.core.validate_feature(feature, |feature| {
            validate_non_intersecting_polygon_feature(feature, precision)
        })
    }

    fn after_feature_updated(&mut self, feature: &Feature) -> ModeResult<()> {
        if feature.id.is_some() && feature.id == self.current_id {
            self.reset()?;
        }
        Ok(())
    }

    fn clean_up(&mut self) -> ModeResult<()> {
        if let Some(id) = self.current_id.take() {
            let store = self.core.store()?;
            if store.borrow().has(&id) {
                store.borrow_mut().delete(&[id], None)?;
            }
        }
        if let Some(behaviors) = self.behaviors.as_mut() {
            behaviors.closing_points.delete()?;
        }
        self.vertices.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ring;

    #[test]
    fn test_ring_is_closed_and_padded() {
        assert_eq!(ring(&[[0.0, 0.0]], None), vec![[0.0, 0.0]; 4]);
        assert_eq!(
            ring(&[[0.0, 0.0], [1.0, 0.0]], Some([1.0, 1.0])),
            vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]
        );
    }
}
