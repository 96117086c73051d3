//! The contract every drawing and selection mode implements.

pub mod config;
mod context;
mod state;
pub mod style;

pub use config::{
    BaseModeOptions, ClickKind, Cursor, KeyEvents, MapHost, ModeRegistration, PointerEvents, PointerGate,
    Projection, Validator,
};
pub use context::ModeCore;
pub use state::ModeState;
pub use style::{FeatureStyle, ModeStyling, StyleValue};

use crate::error::ModeResult;
use crate::geometry::validation::ValidationResult;
use crate::geometry::Feature;
use crate::input::{CursorEvent, KeyboardEvent};

/// A stateful interaction handler, one long-lived instance per tool.
///
/// Every handler defaults to a no-op; modes override what they need. The
/// lifecycle methods delegate to [`ModeCore`], which rejects illegal
/// transitions before any side effect.
pub trait Mode {
    fn core(&self) -> &ModeCore;

    fn core_mut(&mut self) -> &mut ModeCore;

    fn name(&self) -> &str {
        self.core().name()
    }

    fn state(&self) -> ModeState {
        self.core().state()
    }

    /// Binds the mode to a store and host, then builds its behaviors
    fn register(&mut self, registration: ModeRegistration) -> ModeResult<()> {
        self.core_mut().register(registration)?;
        self.register_behaviors()
    }

    /// Called once after registration succeeds
    fn register_behaviors(&mut self) -> ModeResult<()> {
        Ok(())
    }

    fn start(&mut self) -> ModeResult<()> {
        self.core_mut().set_started()
    }

    /// Leaves the mode: back to started if drawing or selecting, then
    /// stopped, then clean up and reset the cursor
    fn stop(&mut self) -> ModeResult<()> {
        if matches!(self.state(), ModeState::Drawing | ModeState::Selecting) {
            self.core_mut().set_started()?;
        }
        self.core_mut().set_stopped()?;
        self.clean_up()?;
        self.core().set_cursor(Cursor::Unset);
        Ok(())
    }

    fn on_click(&mut self, _event: &CursorEvent) -> ModeResult<()> {
        Ok(())
    }

    fn on_mouse_move(&mut self, _event: &CursorEvent) -> ModeResult<()> {
        Ok(())
    }

    fn on_key_down(&mut self, _event: &KeyboardEvent) -> ModeResult<()> {
        Ok(())
    }

    fn on_key_up(&mut self, _event: &KeyboardEvent) -> ModeResult<()> {
        Ok(())
    }

    fn on_drag_start(&mut self, _event: &CursorEvent) -> ModeResult<()> {
        Ok(())
    }

    fn on_drag(&mut self, _event: &CursorEvent) -> ModeResult<()> {
        Ok(())
    }

    fn on_drag_end(&mut self, _event: &CursorEvent) -> ModeResult<()> {
        Ok(())
    }

    fn style_feature(&self, _feature: &Feature) -> FeatureStyle {
        FeatureStyle::default()
    }

    /// Structural and ownership checks only; modes add their geometry rules
    fn validate_feature(&self, feature: &Feature) -> ValidationResult {
        self.core()
            .validate_feature(feature, |_| ValidationResult::valid())
    }

    /// A feature owned by this mode was added from outside the mode
    fn after_feature_added(&mut self, _feature: &Feature) -> ModeResult<()> {
        Ok(())
    }

    /// A feature owned by this mode was changed from outside the mode
    fn after_feature_updated(&mut self, _feature: &Feature) -> ModeResult<()> {
        Ok(())
    }

    /// Removes provisional features and resets mode-local fields
    fn clean_up(&mut self) -> ModeResult<()> {
        Ok(())
    }
}
