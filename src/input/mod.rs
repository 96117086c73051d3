//! Host-agnostic input events.
//!
//! Map adapters translate their native pointer and keyboard events into
//! these shapes before handing them to the drawing session.

use crate::geometry::{Position, ScreenPoint};
use serde::{Deserialize, Serialize};

/// Which pointer button triggered an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    /// Moves and drags with no button pressed
    Neither,
}

/// A pointer event located both on the map and on screen
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorEvent {
    pub lng: f64,
    pub lat: f64,
    /// Position in pixels relative to the map container
    pub container_x: f64,
    pub container_y: f64,
    pub button: MouseButton,
    #[serde(default)]
    pub is_context_menu: bool,
    #[serde(default)]
    pub held_keys: Vec<String>,
}

impl CursorEvent {
    /// A left-button event at the given map and screen location
    pub fn new(lng: f64, lat: f64, container_x: f64, container_y: f64) -> Self {
        Self {
            lng,
            lat,
            container_x,
            container_y,
            button: MouseButton::Left,
            is_context_menu: false,
            held_keys: Vec::new(),
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn context_menu(mut self) -> Self {
        self.button = MouseButton::Right;
        self.is_context_menu = true;
        self
    }

    pub fn with_held_keys(mut self, keys: &[&str]) -> Self {
        self.held_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn position(&self) -> Position {
        [self.lng, self.lat]
    }

    pub fn screen_point(&self) -> ScreenPoint {
        ScreenPoint::new(self.container_x, self.container_y)
    }

    pub fn is_key_held(&self, key: &str) -> bool {
        self.held_keys.iter().any(|k| k == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardEvent {
    pub key: String,
    #[serde(default)]
    pub held_keys: Vec<String>,
}

impl KeyboardEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            held_keys: Vec::new(),
        }
    }
}
