use super::BehaviorConfig;
use crate::geometry::{Geometry, ScreenPoint};
use crate::input::CursorEvent;

/// Builds the geographic query area around a click
#[derive(Debug, Clone)]
pub struct ClickBoundingBoxBehavior {
    config: BehaviorConfig,
}

impl ClickBoundingBoxBehavior {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// A polygon whose screen extent is a square of side
    /// `2 * pointer_distance` centred on the cursor
    pub fn create(&self, event: &CursorEvent) -> Geometry {
        let half = self.config.pointer_distance;
        let (x, y) = (event.container_x, event.container_y);

        let corners = [
            ScreenPoint::new(x - half, y - half),
            ScreenPoint::new(x + half, y - half),
            ScreenPoint::new(x + half, y + half),
            ScreenPoint::new(x - half, y + half),
        ];
        let mut ring: Vec<_> = corners
            .iter()
            .map(|corner| self.config.unproject(*corner).position())
            .collect();
        ring.push(ring[0]);

        Geometry::Polygon(vec![ring])
    }
}
