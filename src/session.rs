//! The host-facing entry point.
//!
//! A `DrawSession` owns the store, registers every mode against it and
//! routes host input to the active mode. Store changes and mode events are
//! published on one [`EventBus`].

use crate::error::{ModeError, ModeResult};
use crate::event::{DrawEvent, EventBus, EventHandler};
use crate::geometry::validation::{ValidationResult, REASON_MISSING_MODE};
use crate::geometry::{properties, Feature, FeatureId, Geometry};
use crate::id_generator::{IdStrategy, UuidIdStrategy};
use crate::input::{CursorEvent, KeyboardEvent};
use crate::mode::config::DEFAULT_COORDINATE_PRECISION;
use crate::mode::{FeatureStyle, MapHost, Mode, ModeRegistration, ModeState};
use crate::modes::{StaticMode, SELECT_MODE, STATIC_MODE};
use crate::store::{FeatureStore, GeometryUpdate, LoadResult, SharedStore, StoreOptions};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

pub const REASON_UNKNOWN_MODE: &str = "Feature mode is not registered";

pub struct SessionOptions {
    /// Stamp `createdAt`/`updatedAt` on features (default true)
    pub tracked: bool,
    /// Default random UUIDs
    pub id_strategy: Box<dyn IdStrategy>,
    /// Decimal places kept in drawn coordinates (default 9)
    pub coordinate_precision: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            tracked: true,
            id_strategy: Box::new(UuidIdStrategy),
            coordinate_precision: DEFAULT_COORDINATE_PRECISION,
        }
    }
}

pub struct DrawSession {
    store: SharedStore,
    events: Rc<EventBus>,
    modes: Vec<Box<dyn Mode>>,
    current: usize,
    enabled: bool,
}

impl std::fmt::Debug for DrawSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawSession")
            .field("modes", &self.modes.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("current", &self.mode())
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl DrawSession {
    /// Builds the store and registers `modes` against it. A static mode is
    /// added when none is given; mode names must be unique.
    pub fn new(host: Rc<dyn MapHost>, mut modes: Vec<Box<dyn Mode>>, options: SessionOptions) -> ModeResult<Self> {
        let mut names = HashSet::new();
        for mode in &modes {
            if !names.insert(mode.name().to_string()) {
                return Err(ModeError::DuplicateMode(mode.name().to_string()));
            }
        }
        if !names.contains(STATIC_MODE) {
            modes.insert(0, Box::new(StaticMode::new()));
        }

        let store = FeatureStore::shared(StoreOptions {
            tracked: options.tracked,
            id_strategy: options.id_strategy,
        });
        let events = Rc::new(EventBus::new());

        let bus = events.clone();
        store.borrow_mut().register_on_change(move |change, store| {
            let features = change
                .ids
                .iter()
                .filter_map(|id| store.copy(id).ok())
                .collect();
            bus.emit(DrawEvent::Change {
                ids: change.ids.clone(),
                kind: change.kind,
                context: change.context.clone(),
                features,
            });
        });

        for mode in modes.iter_mut() {
            mode.register(ModeRegistration {
                store: store.clone(),
                host: host.clone(),
                events: events.clone(),
                coordinate_precision: options.coordinate_precision,
            })?;
        }

        let current = modes
            .iter()
            .position(|mode| mode.name() == STATIC_MODE)
            .unwrap_or_default();

        Ok(Self {
            store,
            events,
            modes,
            current,
            enabled: false,
        })
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Name of the active mode
    pub fn mode(&self) -> &str {
        self.modes[self.current].name()
    }

    pub fn mode_state(&self) -> ModeState {
        self.modes[self.current].state()
    }

    /// Handle to the underlying store
    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    pub fn subscribe(&self, handler: impl EventHandler + 'static) {
        self.events.subscribe(Box::new(handler));
    }

    pub fn start(&mut self) -> ModeResult<()> {
        if self.enabled {
            return Ok(());
        }
        self.modes[self.current].start()?;
        self.enabled = true;
        debug!("Session started in mode {}", self.mode());
        Ok(())
    }

    pub fn stop(&mut self) -> ModeResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let mode = &mut self.modes[self.current];
        if mode.state().is_active() {
            mode.stop()?;
        }
        self.enabled = false;
        debug!("Session stopped");
        Ok(())
    }

    /// Stops the active mode and starts `name`
    pub fn set_mode(&mut self, name: &str) -> ModeResult<()> {
        self.ensure_enabled()?;
        let next = self
            .mode_index(name)
            .ok_or_else(|| ModeError::UnknownMode(name.to_string()))?;
        if next == self.current {
            return Ok(());
        }

        let old = self.mode().to_string();
        if self.modes[self.current].state().is_active() {
            self.modes[self.current].stop()?;
        }
        self.modes[next].start()?;
        self.current = next;

        debug!("Mode changed from {} to {}", old, name);
        self.events.emit(DrawEvent::ModeChanged {
            old,
            new: name.to_string(),
        });
        Ok(())
    }

    pub fn handle_click(&mut self, event: &CursorEvent) -> ModeResult<()> {
        self.ensure_enabled()?;
        self.modes[self.current].on_click(event)
    }

    pub fn handle_mouse_move(&mut self, event: &CursorEvent) -> ModeResult<()> {
        self.ensure_enabled()?;
        self.modes[self.current].on_mouse_move(event)
    }

    pub fn handle_key_down(&mut self, event: &KeyboardEvent) -> ModeResult<()> {
        self.ensure_enabled()?;
        self.modes[self.current].on_key_down(event)
    }

    pub fn handle_key_up(&mut self, event: &KeyboardEvent) -> ModeResult<()> {
        self.ensure_enabled()?;
        self.modes[self.current].on_key_up(event)
    }

    pub fn handle_drag_start(&mut self, event: &CursorEvent) -> ModeResult<()> {
        self.ensure_enabled()?;
        self.modes[self.current].on_drag_start(event)
    }

    pub fn handle_drag(&mut self, event: &CursorEvent) -> ModeResult<()> {
        self.ensure_enabled()?;
        self.modes[self.current].on_drag(event)
    }

    pub fn handle_drag_end(&mut self, event: &CursorEvent) -> ModeResult<()> {
        self.ensure_enabled()?;
        self.modes[self.current].on_drag_end(event)
    }

    /// Imports features, each validated by the mode named in its `mode`
    /// property. Rejected features are reported, not raised.
    pub fn add_features(&mut self, mut features: Vec<Feature>) -> ModeResult<Vec<LoadResult>> {
        self.ensure_enabled()?;

        {
            let store = self.store.borrow();
            for feature in features.iter_mut().filter(|feature| feature.id.is_none()) {
                feature.id = Some(store.next_id());
            }
        }

        // validation reads the store, so it has to run before the load borrows it
        let validations: HashMap<FeatureId, ValidationResult> = features
            .iter()
            .filter_map(|feature| {
                let id = feature.id.clone()?;
                Some((id, self.validate(feature)))
            })
            .collect();
        let validate: &dyn Fn(&Feature) -> ValidationResult = &|feature: &Feature| {
            feature
                .id
                .as_ref()
                .and_then(|id| validations.get(id))
                .cloned()
                .unwrap_or_else(ValidationResult::valid)
        };

        let mut added = Vec::new();
        let collect: &mut dyn FnMut(&Feature) = &mut |feature: &Feature| added.push(feature.clone());
        let results = self
            .store
            .borrow_mut()
            .load(features, Some(validate), Some(collect), None)?;

        for feature in &added {
            if let Some(index) = feature.mode().and_then(|mode| self.mode_index(mode)) {
                self.modes[index].after_feature_added(feature)?;
            }
        }
        Ok(results)
    }

    /// Replaces a feature's geometry if its mode accepts the result. The
    /// owning mode and the active mode are told about the change.
    pub fn update_feature_geometry(&mut self, id: &FeatureId, geometry: Geometry) -> ModeResult<ValidationResult> {
        self.ensure_enabled()?;

        let mut candidate = self.store.borrow().copy(id)?;
        candidate.geometry = geometry;
        let result = self.validate(&candidate);
        if !result.valid {
            return Ok(result);
        }

        self.store
            .borrow_mut()
            .update_geometry(vec![GeometryUpdate::new(id.clone(), candidate.geometry)], None)?;
        let updated = self.store.borrow().copy(id)?;

        let owner = updated.mode().and_then(|mode| self.mode_index(mode));
        if let Some(owner) = owner {
            self.modes[owner].after_feature_updated(&updated)?;
        }
        if owner != Some(self.current) {
            self.modes[self.current].after_feature_updated(&updated)?;
        }
        Ok(result)
    }

    pub fn remove_features(&mut self, ids: &[FeatureId]) -> ModeResult<()> {
        self.ensure_enabled()?;
        self.store.borrow_mut().delete(ids, None)?;
        Ok(())
    }

    /// Cleans up the active mode and removes every feature. A mode caught
    /// mid-drawing goes back to started.
    pub fn clear(&mut self) -> ModeResult<()> {
        self.ensure_enabled()?;
        let mode = &mut self.modes[self.current];
        mode.clean_up()?;
        if mode.state() == ModeState::Drawing {
            mode.core_mut().set_started()?;
        }
        self.store.borrow_mut().clear();
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<Feature> {
        self.store.borrow().copy_all()
    }

    pub fn snapshot_feature(&self, id: &FeatureId) -> Option<Feature> {
        self.store.borrow().copy(id).ok()
    }

    /// Style from the select mode for selected features, otherwise from
    /// the owning mode
    pub fn style_feature(&self, feature: &Feature) -> FeatureStyle {
        if feature.has_flag(properties::SELECTED) {
            if let Some(index) = self.mode_index(SELECT_MODE) {
                return self.modes[index].style_feature(feature);
            }
        }
        match feature.mode().and_then(|mode| self.mode_index(mode)) {
            Some(index) => self.modes[index].style_feature(feature),
            None => FeatureStyle::default(),
        }
    }

    fn validate(&self, feature: &Feature) -> ValidationResult {
        let Some(mode) = feature.mode() else {
            return ValidationResult::invalid(REASON_MISSING_MODE);
        };
        match self.mode_index(mode) {
            Some(index) => self.modes[index].validate_feature(feature),
            None => ValidationResult::invalid(REASON_UNKNOWN_MODE),
        }
    }

    fn mode_index(&self, name: &str) -> Option<usize> {
        self.modes.iter().position(|mode| mode.name() == name)
    }

    fn ensure_enabled(&self) -> ModeResult<()> {
        if self.enabled {
            Ok(())
        } else {
            Err(ModeError::SessionNotEnabled)
        }
    }
}
