//! Mode configuration: host bindings handed over at registration and the
//! option structs each mode is constructed with.
//!
//! Option structs have documented `Default`s. Override them with struct
//! update syntax when building a mode; they are never changed afterwards.

pub use crate::behaviors::Projection;

use crate::event::EventBus;
use crate::geometry::validation::ValidationResult;
use crate::geometry::{Feature, LngLat, ScreenPoint};
use crate::input::{CursorEvent, MouseButton};
use crate::store::SharedStore;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Default hit tolerance in container pixels
pub const DEFAULT_POINTER_DISTANCE: f64 = 40.0;

/// Default number of decimal places kept in coordinates
pub const DEFAULT_COORDINATE_PRECISION: u32 = 9;

/// The map engine as seen by the drawing core. Implemented by map adapters.
pub trait MapHost {
    /// Geographic coordinate to container pixels
    fn project(&self, lng: f64, lat: f64) -> ScreenPoint;

    /// Container pixels to geographic coordinate
    fn unproject(&self, x: f64, y: f64) -> LngLat;

    fn set_cursor(&self, cursor: Cursor);

    fn set_double_click_to_zoom(&self, enabled: bool);

    fn set_map_draggability(&self, enabled: bool);
}

/// Cursor names a mode can ask the host to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    /// Whatever the host shows by default
    #[default]
    Unset,
    Crosshair,
    Pointer,
    Move,
    Grab,
    Grabbing,
    NotAllowed,
}

/// Everything a mode is bound to when it registers
#[derive(Clone)]
pub struct ModeRegistration {
    pub store: SharedStore,
    pub host: Rc<dyn MapHost>,
    /// Receives finish, select and deselect events
    pub events: Rc<EventBus>,
    pub coordinate_precision: u32,
}

impl std::fmt::Debug for ModeRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeRegistration")
            .field("coordinate_precision", &self.coordinate_precision)
            .finish_non_exhaustive()
    }
}

/// Whether a pointer interaction is allowed, fixed or decided per event
#[derive(Clone)]
pub enum PointerGate {
    Enabled(bool),
    When(Rc<dyn Fn(&CursorEvent) -> bool>),
}

impl PointerGate {
    pub fn allows(&self, event: &CursorEvent) -> bool {
        match self {
            PointerGate::Enabled(enabled) => *enabled,
            PointerGate::When(predicate) => predicate(event),
        }
    }
}

impl Default for PointerGate {
    fn default() -> Self {
        PointerGate::Enabled(true)
    }
}

impl From<bool> for PointerGate {
    fn from(enabled: bool) -> Self {
        PointerGate::Enabled(enabled)
    }
}

impl std::fmt::Debug for PointerGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointerGate::Enabled(enabled) => f.debug_tuple("Enabled").field(enabled).finish(),
            PointerGate::When(_) => f.write_str("When(<fn>)"),
        }
    }
}

/// Per-action pointer gates; all enabled by default
#[derive(Debug, Clone, Default)]
pub struct PointerEvents {
    pub left_click: PointerGate,
    pub right_click: PointerGate,
    pub context_menu: PointerGate,
    pub on_drag_start: PointerGate,
    pub on_drag: PointerGate,
    pub on_drag_end: PointerGate,
}

impl PointerEvents {
    /// Every gate set to `enabled`
    pub fn all(enabled: bool) -> Self {
        Self {
            left_click: enabled.into(),
            right_click: enabled.into(),
            context_menu: enabled.into(),
            on_drag_start: enabled.into(),
            on_drag: enabled.into(),
            on_drag_end: enabled.into(),
        }
    }

    /// Classifies a click and checks it against its gate. `None` means the
    /// click is gated off.
    pub fn click_kind(&self, event: &CursorEvent) -> Option<ClickKind> {
        let (kind, gate) = if event.is_context_menu {
            (ClickKind::ContextMenu, &self.context_menu)
        } else {
            match event.button {
                MouseButton::Right => (ClickKind::Right, &self.right_click),
                MouseButton::Left | MouseButton::Neither => (ClickKind::Left, &self.left_click),
            }
        };
        gate.allows(event).then_some(kind)
    }
}

/// The kind of click a cursor event represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Left,
    Right,
    ContextMenu,
}

/// Keys that cancel or finish the shape in progress. `None` disables the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvents {
    pub cancel: Option<String>,
    pub finish: Option<String>,
}

impl Default for KeyEvents {
    fn default() -> Self {
        Self {
            cancel: Some("Escape".to_string()),
            finish: Some("Enter".to_string()),
        }
    }
}

impl KeyEvents {
    pub fn is_cancel(&self, key: &str) -> bool {
        self.cancel.as_deref() == Some(key)
    }

    pub fn is_finish(&self, key: &str) -> bool {
        self.finish.as_deref() == Some(key)
    }
}

/// Extra validation supplied by the integrating application
pub type Validator = Rc<dyn Fn(&Feature) -> ValidationResult>;

/// Options every mode understands
#[derive(Clone)]
pub struct BaseModeOptions {
    /// Hit tolerance in container pixels (default 40)
    pub pointer_distance: f64,
    /// Default web mercator
    pub projection: Projection,
    pub pointer_events: PointerEvents,
    /// Runs after the mode's own validation
    pub validation: Option<Validator>,
}

impl Default for BaseModeOptions {
    fn default() -> Self {
        Self {
            pointer_distance: DEFAULT_POINTER_DISTANCE,
            projection: Projection::default(),
            pointer_events: PointerEvents::default(),
            validation: None,
        }
    }
}

impl std::fmt::Debug for BaseModeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseModeOptions")
            .field("pointer_distance", &self.pointer_distance)
            .field("projection", &self.projection)
            .field("pointer_events", &self.pointer_events)
            .field("validation", &self.validation.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_kind_picks_gate_by_button() {
        let events = PointerEvents {
            right_click: PointerGate::When(Rc::new(|event: &CursorEvent| event.is_key_held("Shift"))),
            context_menu: false.into(),
            ..Default::default()
        };
        let left = CursorEvent::new(0.0, 0.0, 0.0, 0.0);
        let right = left.clone().with_button(MouseButton::Right);

        assert_eq!(events.click_kind(&left), Some(ClickKind::Left));
        assert_eq!(events.click_kind(&right), None);
        assert_eq!(
            events.click_kind(&right.clone().with_held_keys(&["Shift"])),
            Some(ClickKind::Right)
        );
        assert_eq!(events.click_kind(&left.context_menu()), None);
    }
}
