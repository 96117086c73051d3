use crate::mode::{BaseModeOptions, Mode, ModeCore};

pub const STATIC_MODE: &str = "static";

/// No interaction at all. The session falls back to it when stopped or
/// when nothing else is selected.
#[derive(Debug)]
pub struct StaticMode {
    core: ModeCore,
}

impl Default for StaticMode {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticMode {
    pub fn new() -> Self {
        Self {
            core: ModeCore::new(STATIC_MODE, BaseModeOptions::default()),
        }
    }
}

impl Mode for StaticMode {
    fn core(&self) -> &ModeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModeCore {
        &mut self.core
    }
}
