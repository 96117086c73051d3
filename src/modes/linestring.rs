use crate::behaviors::{
    ClickBoundingBoxBehavior, ClosingPointsBehavior, CoordinateSnappingBehavior, InsertCoordinatesBehavior,
    PixelDistanceBehavior,
};
use crate::error::{ModeError, ModeResult};
use crate::event::{DrawEvent, FinishAction};
use crate::geometry::geodesic::limit_position;
use crate::geometry::validation::{validate_linestring_feature, ValidationResult};
use crate::geometry::{properties, Feature, FeatureId, Geometry, NewFeature, Position};
use crate::input::{CursorEvent, KeyboardEvent};
use crate::mode::config::DEFAULT_COORDINATE_PRECISION;
use crate::mode::{BaseModeOptions, ClickKind, Cursor, FeatureStyle, KeyEvents, Mode, ModeCore, ModeState, ModeStyling};
use crate::store::{GeometryUpdate, PropertyUpdate};
use log::debug;

pub const LINESTRING_MODE: &str = "linestring";

/// How extra coordinates are inserted between two clicked vertices
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InsertStrategy {
    /// Split every edge into this many segments
    Amount(usize),
    /// Keep every segment at most this many kilometres long
    SegmentLengthKm(f64),
}

#[derive(Debug, Clone)]
pub struct LineStringModeOptions {
    pub base: BaseModeOptions,
    pub styles: ModeStyling,
    pub key_events: KeyEvents,
    /// Snap new vertices to existing line vertices
    pub snapping: bool,
    pub insert_coordinates: Option<InsertStrategy>,
    pub cursor: Cursor,
    /// Shown while hovering the finishing point
    pub close_cursor: Cursor,
}

impl Default for LineStringModeOptions {
    fn default() -> Self {
        Self {
            base: BaseModeOptions::default(),
            styles: ModeStyling::default(),
            key_events: KeyEvents::default(),
            snapping: false,
            insert_coordinates: None,
            cursor: Cursor::Crosshair,
            close_cursor: Cursor::Pointer,
        }
    }
}

#[derive(Debug)]
struct Behaviors {
    snapping: CoordinateSnappingBehavior,
    closing_points: ClosingPointsBehavior,
    insert_coordinates: InsertCoordinatesBehavior,
}

/// Draws a line one click per vertex. Clicking the last vertex again, or
/// pressing the finish key, completes it.
#[derive(Debug)]
pub struct LineStringMode {
    core: ModeCore,
    options: LineStringModeOptions,
    behaviors: Option<Behaviors>,
    current_id: Option<FeatureId>,
    /// Vertices placed so far, without the cursor preview
    vertices: Vec<Position>,
}

impl Default for LineStringMode {
    fn default() -> Self {
        Self::new(LineStringModeOptions::default())
    }
}

impl LineStringMode {
    pub fn new(mut options: LineStringModeOptions) -> Self {
        let base = std::mem::take(&mut options.base);
        Self {
            core: ModeCore::new(LINESTRING_MODE, base),
            options,
            behaviors: None,
            current_id: None,
            vertices: Vec::new(),
        }
    }

    /// Id of the line being drawn, if any
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
            .ok_or_else(|| ModeError::NotRegistered(LINESTRING_MODE.to_string()))
    }

    fn behaviors_mut(&mut self) -> ModeResult<&mut Behaviors> {
        self.behaviors
            .as_mut()
            .ok_or_else(|| ModeError::NotRegistered(LINESTRING_MODE.to_string()))
    }

    /// Cursor position, snapped when snapping is on
    fn cursor_position(&self, event: &CursorEvent) -> ModeResult<Position> {
        if self.options.snapping {
            let snapping = &self.behaviors()?.snapping;
            let snapped = match &self.current_id {
                Some(id) => snapping.snappable_coordinate(event, id)?,
                None => snapping.snappable_coordinate_first_click(event)?,
            };
            if let Some(position) = snapped {
                return Ok(position);
            }
        }
        Ok(limit_position(event.position(), self.precision()))
    }

    /// Forgets the line in progress without touching it. Used when the
    /// line was changed or removed from outside the mode.
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

    /// True when a line is in progress and still in the store
    fn drawing_alive(&mut self) -> ModeResult<bool> {
        let Some(id) = &self.current_id else {
            return Ok(false);
        };
        if self.core.store()?.borrow().has(id) {
            return Ok(true);
        }
        debug!("Line {} disappeared while drawing", id);
        self.reset()?;
        Ok(false)
    }

    fn start_line(&mut self, position: Position) -> ModeResult<()> {
        let mut feature = NewFeature::with_mode(Geometry::LineString(vec![position, position]), LINESTRING_MODE);
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
        if self.vertices.last() == Some(&position) {
            return Ok(());
        }

        let mut vertices = self.vertices.clone();
        if let Some(&previous) = vertices.last() {
            let inserted = match self.options.insert_coordinates {
                Some(InsertStrategy::Amount(segments)) => {
                    self.behaviors()?
                        .insert_coordinates
                        .generate(previous, position, segments)
                }
                Some(InsertStrategy::SegmentLengthKm(length)) => self
                    .behaviors()?
                    .insert_coordinates
                    .generate_by_segment_length(previous, position, length),
                None => vec![previous, position],
            };
            // generated points include both endpoints
            vertices.extend(inserted.into_iter().skip(1));
        }

        let mut coordinates = vertices.clone();
        coordinates.push(position);
        let candidate = Feature::new(Some(id.clone()), Geometry::LineString(coordinates.clone()), Default::default());
        if !validate_linestring_feature(&candidate, self.precision()).valid {
            return Ok(());
        }

        self.core
            .store()?
            .borrow_mut()
            .update_geometry(vec![GeometryUpdate::new(id, Geometry::LineString(coordinates))], None)?;
        self.vertices = vertices;

        let closing_points = &mut self.behaviors_mut()?.closing_points;
        if closing_points.ids().is_empty() {
            closing_points.create(&[position])?;
        } else {
            closing_points.update(&[position])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> ModeResult<()> {
        let Some(id) = self.current_id.clone() else {
            return Ok(());
        };
        if self.vertices.len() < 2 {
            return Ok(());
        }

        let geometry = Geometry::LineString(self.vertices.clone());
        let store = self.core.store()?;
        store
            .borrow_mut()
            .update_geometry(vec![GeometryUpdate::new(id.clone(), geometry)], None)?;
        store
            .borrow_mut()
            .update_property(vec![PropertyUpdate::remove(id.clone(), properties::CURRENTLY_DRAWING)], None)?;

        self.behaviors_mut()?.closing_points.delete()?;
        self.current_id = None;
        self.vertices.clear();
        self.core.set_started()?;
        self.core.emit(DrawEvent::Finish {
            id,
            mode: LINESTRING_MODE.to_string(),
            action: FinishAction::Draw,
        });
        Ok(())
    }
}

impl Mode for LineStringMode {
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
            snapping: CoordinateSnappingBehavior::new(&config, &pixel_distance, &click_bounding_box),
            closing_points: ClosingPointsBehavior::new(&config, &pixel_distance),
            insert_coordinates: InsertCoordinatesBehavior::new(&config),
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
            return self.start_line(position);
        }

        if self.behaviors()?.closing_points.is_closing_point(event)?.is_closing {
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
        self.core.set_cursor(if hit.is_closing {
            self.options.close_cursor
        } else {
            self.options.cursor
        });

        let position = self.cursor_position(event)?;
        let mut coordinates = self.vertices.clone();
        coordinates.push(position);
        self.core
            .store()?
            .borrow_mut()
            .update_geometry(vec![GeometryUpdate::new(id, Geometry::LineString(coordinates))], None)?;
        Ok(())
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
        if feature.mode() != Some(LINESTRING_MODE) {
            return FeatureStyle::default();
        }
        let mut style = self.options.styles.apply(feature);
        if feature.has_flag(properties::CLOSING_POINT) {
            style.z_index = 40;
        } else {
            style.z_index = 10;
        }
        style
    }

    fn validate_feature(&self, feature: &Feature) -> ValidationResult {
        let precision = self.precision();
        self.core
            .validate_feature(feature, |feature| validate_linestring_feature(feature, precision))
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
