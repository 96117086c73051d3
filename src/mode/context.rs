//! The lifecycle half of every mode.
//!
//! `ModeCore` owns a mode's state, registration and base options. It is the
//! only place the state changes, and every transition is validated before
//! its host side effect runs, so an illegal call changes nothing.

use super::config::{BaseModeOptions, ClickKind, Cursor, MapHost, ModeRegistration, PointerGate};
use super::state::ModeState;
use crate::behaviors::BehaviorConfig;
use crate::error::{ModeError, ModeResult};
use crate::event::DrawEvent;
use crate::geometry::validation::{
    validate_store_feature, ValidationResult, REASON_MISSING_MODE, REASON_MODE_MISMATCH,
};
use crate::geometry::Feature;
use crate::input::CursorEvent;
use crate::store::SharedStore;
use log::debug;
use std::rc::Rc;

#[derive(Debug)]
pub struct ModeCore {
    name: String,
    state: ModeState,
    registration: Option<ModeRegistration>,
    pub options: BaseModeOptions,
}

impl ModeCore {
    pub fn new(name: impl Into<String>, options: BaseModeOptions) -> Self {
        Self {
            name: name.into(),
            state: ModeState::Unregistered,
            registration: None,
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ModeState {
        self.state
    }

    /// Always fails: state only changes through the lifecycle methods
    pub fn set_state(&mut self, _state: ModeState) -> ModeResult<()> {
        Err(ModeError::DirectStateAssignment)
    }

    fn transition(&mut self, next: ModeState) -> ModeResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(ModeError::InvalidStateTransition {
                mode: self.name.clone(),
                from: self.state.name(),
                to: next.name(),
            });
        }
        debug!("Mode {}: {} -> {}", self.name, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Binds the store and host. Only legal once.
    pub fn register(&mut self, registration: ModeRegistration) -> ModeResult<()> {
        self.transition(ModeState::Registered)?;
        self.registration = Some(registration);
        Ok(())
    }

    pub fn set_started(&mut self) -> ModeResult<()> {
        self.transition(ModeState::Started)?;
        self.host()?.set_double_click_to_zoom(false);
        Ok(())
    }

    pub fn set_drawing(&mut self) -> ModeResult<()> {
        self.transition(ModeState::Drawing)
    }

    pub fn set_selecting(&mut self) -> ModeResult<()> {
        self.transition(ModeState::Selecting)
    }

    pub fn set_stopped(&mut self) -> ModeResult<()> {
        self.transition(ModeState::Stopped)?;
        self.host()?.set_double_click_to_zoom(true);
        Ok(())
    }

    pub fn registration(&self) -> ModeResult<&ModeRegistration> {
        self.registration
            .as_ref()
            .ok_or_else(|| ModeError::NotRegistered(self.name.clone()))
    }

    pub fn store(&self) -> ModeResult<SharedStore> {
        Ok(self.registration()?.store.clone())
    }

    pub fn host(&self) -> ModeResult<Rc<dyn MapHost>> {
        Ok(self.registration()?.host.clone())
    }

    pub fn coordinate_precision(&self) -> ModeResult<u32> {
        Ok(self.registration()?.coordinate_precision)
    }

    /// Shared configuration for the behaviors this mode builds
    pub fn behavior_config(&self) -> ModeResult<BehaviorConfig> {
        let registration = self.registration()?;
        let project_host = registration.host.clone();
        let unproject_host = registration.host.clone();
        Ok(BehaviorConfig {
            store: registration.store.clone(),
            project: Rc::new(move |lng, lat| project_host.project(lng, lat)),
            unproject: Rc::new(move |x, y| unproject_host.unproject(x, y)),
            pointer_distance: self.options.pointer_distance,
            coordinate_precision: registration.coordinate_precision,
            projection: self.options.projection,
            mode: self.name.clone(),
        })
    }

    pub fn set_cursor(&self, cursor: Cursor) {
        if let Some(registration) = &self.registration {
            registration.host.set_cursor(cursor);
        }
    }

    pub fn set_map_draggability(&self, enabled: bool) {
        if let Some(registration) = &self.registration {
            registration.host.set_map_draggability(enabled);
        }
    }

    /// Publishes a finish/select/deselect event to the host
    pub fn emit(&self, event: DrawEvent) {
        if let Some(registration) = &self.registration {
            registration.events.emit(event);
        }
    }

    pub fn allow_pointer_event(&self, gate: &PointerGate, event: &CursorEvent) -> bool {
        gate.allows(event)
    }

    /// The gated kind of a click event, see [`PointerEvents::click_kind`]
    ///
    /// [`PointerEvents::click_kind`]: super::config::PointerEvents::click_kind
    pub fn click_kind(&self, event: &CursorEvent) -> Option<ClickKind> {
        self.options.pointer_events.click_kind(event)
    }

    /// Structural checks, then ownership by this mode, then `semantic`,
    /// then the user's validator. The first failure wins.
    pub fn validate_feature(
        &self,
        feature: &Feature,
        semantic: impl FnOnce(&Feature) -> ValidationResult,
    ) -> ValidationResult {
        let structural = match &self.registration {
            Some(registration) => {
                let store = registration.store.borrow();
                validate_store_feature(feature, |id| store.id_strategy().is_valid_id(id))
            }
            None => validate_store_feature(feature, |_| true),
        };

        structural
            .and_then(|| match feature.mode() {
                None => ValidationResult::invalid(REASON_MISSING_MODE),
                Some(mode) if mode != self.name => ValidationResult::invalid(REASON_MODE_MISMATCH),
                Some(_) => ValidationResult::valid(),
            })
            .and_then(|| semantic(feature))
            .and_then(|| match &self.options.validation {
                Some(validator) => validator(feature),
                None => ValidationResult::valid(),
            })
    }
}
