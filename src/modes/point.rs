use crate::error::ModeResult;
use crate::event::{DrawEvent, FinishAction};
use crate::geometry::geodesic::limit_position;
use crate::geometry::validation::{validate_point_feature, ValidationResult};
use crate::geometry::{Feature, Geometry, NewFeature};
use crate::input::CursorEvent;
use crate::mode::config::DEFAULT_COORDINATE_PRECISION;
use crate::mode::{BaseModeOptions, ClickKind, Cursor, FeatureStyle, Mode, ModeCore, ModeStyling};

pub const POINT_MODE: &str = "point";

#[derive(Debug, Clone)]
pub struct PointModeOptions {
    pub base: BaseModeOptions,
    pub styles: ModeStyling,
    /// Shown while the mode is active (default crosshair)
    pub cursor: Cursor,
}

impl Default for PointModeOptions {
    fn default() -> Self {
        Self {
            base: BaseModeOptions::default(),
            styles: ModeStyling::default(),
            cursor: Cursor::Crosshair,
        }
    }
}

/// Places a point on every left click
#[derive(Debug)]
pub struct PointMode {
    core: ModeCore,
    styles: ModeStyling,
    cursor: Cursor,
}

impl Default for PointMode {
    fn default() -> Self {
        Self::new(PointModeOptions::default())
    }
}

impl PointMode {
    pub fn new(options: PointModeOptions) -> Self {
        Self {
            core: ModeCore::new(POINT_MODE, options.base),
            styles: options.styles,
            cursor: options.cursor,
        }
    }

    fn precision(&self) -> u32 {
        self.core
            .coordinate_precision()
            .unwrap_or(DEFAULT_COORDINATE_PRECISION)
    }
}

impl Mode for PointMode {
    fn core(&self) -> &ModeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModeCore {
        &mut self.core
    }

    fn start(&mut self) -> ModeResult<()> {
        self.core.set_started()?;
        self.core.set_cursor(self.cursor);
        Ok(())
    }

    fn on_click(&mut self, event: &CursorEvent) -> ModeResult<()> {
        if self.core.click_kind(event) != Some(ClickKind::Left) {
            return Ok(());
        }

        let precision = self.precision();
        let geometry = Geometry::Point(limit_position(event.position(), precision));
        let candidate = NewFeature::with_mode(geometry, POINT_MODE);

        // user validation runs before the point exists, so it has no id yet
        if let Some(validator) = &self.core.options.validation {
            let feature = Feature::new(None, candidate.geometry.clone(), candidate.properties.clone());
            let result = validate_point_feature(&feature, precision).and_then(|| validator(&feature));
            if !result.valid {
                return Ok(());
            }
        }

        let store = self.core.store()?;
        let ids = store.borrow_mut().create(vec![candidate], None)?;
        for id in ids {
            self.core.emit(DrawEvent::Finish {
                id,
                mode: POINT_MODE.to_string(),
                action: FinishAction::Draw,
            });
        }
        Ok(())
    }

    fn style_feature(&self, feature: &Feature) -> FeatureStyle {
        if feature.mode() == Some(POINT_MODE) {
            self.styles.apply(feature)
        } else {
            FeatureStyle::default()
        }
    }

    fn validate_feature(&self, feature: &Feature) -> ValidationResult {
        let precision = self.precision();
        self.core
            .validate_feature(feature, |feature| validate_point_feature(feature, precision))
    }
}
