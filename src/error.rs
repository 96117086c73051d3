use crate::geometry::FeatureId;
use thiserror::Error;

/// Errors raised by the spatial index. All of them indicate a caller bug:
/// the index expects callers to track membership themselves.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialIndexError {
    #[error("Feature {0} is already in the spatial index")]
    AlreadyIndexed(FeatureId),

    #[error("Feature {0} is not in the spatial index")]
    NotIndexed(FeatureId),

    #[error("Duplicate feature id {0} in bulk load")]
    DuplicateId(FeatureId),

    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(&'static str),
}

/// Errors raised by the feature store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("No feature with id {0}")]
    FeatureNotFound(FeatureId),

    #[error("Feature already exists with id {0}")]
    DuplicateId(FeatureId),

    #[error(transparent)]
    SpatialIndex(#[from] SpatialIndexError),
}

/// Errors raised by behaviors when their contract is violated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BehaviorError {
    #[error("Closing points already created")]
    ClosingPointsExist,

    #[error("Closing points require 1 or 2 coordinates, got {0}")]
    InvalidClosingPointCount(usize),

    #[error("Expected {expected} closing point coordinates, got {actual}")]
    ClosingPointMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by modes and the drawing session.
///
/// These are integration errors: an illegal lifecycle call or a store
/// contract violation. User input that fails validation is never an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModeError {
    /// Attempted to transition between incompatible states
    #[error("Mode {mode}: cannot transition from {from} to {to}")]
    InvalidStateTransition {
        mode: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("Mode {0} must be registered first")]
    NotRegistered(String),

    #[error("Mode state can only be changed through lifecycle methods")]
    DirectStateAssignment,

    #[error("No mode named {0}")]
    UnknownMode(String),

    #[error("A mode named {0} is already registered")]
    DuplicateMode(String),

    #[error("Drawing session is not enabled")]
    SessionNotEnabled,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Behavior(#[from] BehaviorError),
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type ModeResult<T> = Result<T, ModeError>;
