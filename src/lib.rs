#![warn(clippy::all, rust_2018_idioms)]

pub mod behaviors;
pub mod error;
pub mod event;
pub mod geometry;
pub mod id_generator;
pub mod input;
pub mod mode;
pub mod modes;
pub mod session;
pub mod spatial_index;
pub mod store;
mod util;

pub use error::{BehaviorError, ModeError, SpatialIndexError, StoreError};
pub use event::{DrawEvent, EventBus, EventHandler, FinishAction};
pub use geometry::{Feature, FeatureId, Geometry, LngLat, NewFeature, Position, ScreenPoint};
pub use id_generator::{IdStrategy, SequentialIdStrategy, UuidIdStrategy};
pub use input::{CursorEvent, KeyboardEvent, MouseButton};
pub use mode::{Cursor, MapHost, Mode, ModeState};
pub use session::{DrawSession, SessionOptions};
pub use spatial_index::{BBox, SpatialIndex};
pub use store::{FeatureStore, SharedStore};
