use crate::geometry::{FeatureId, Geometry};
use serde::{Deserialize, Serialize};

/// Opaque data a caller attaches to a mutation, handed back in the notification
pub type ChangeContext = serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
    /// Nothing changed in the store, but the features should be re-rendered
    Styling,
}

/// One notification, emitted once per store mutation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreChange {
    pub ids: Vec<FeatureId>,
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ChangeContext>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryUpdate {
    pub id: FeatureId,
    pub geometry: Geometry,
}

impl GeometryUpdate {
    pub fn new(id: FeatureId, geometry: Geometry) -> Self {
        Self { id, geometry }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyUpdate {
    pub id: FeatureId,
    pub property: String,
    /// `None` removes the property
    pub value: Option<serde_json::Value>,
}

impl PropertyUpdate {
    pub fn new(id: FeatureId, property: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            id,
            property: property.into(),
            value: Some(value.into()),
        }
    }

    pub fn remove(id: FeatureId, property: impl Into<String>) -> Self {
        Self {
            id,
            property: property.into(),
            value: None,
        }
    }
}

/// Outcome of loading one external feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    pub id: FeatureId,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
