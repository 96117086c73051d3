use crate::geometry::{Feature, FeatureId};
use crate::store::{ChangeContext, ChangeKind};
use serde::{Deserialize, Serialize};

/// What a finished interaction did to the feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinishAction {
    Draw,
    DragFeature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DrawEvent {
    /// The store changed; hosts re-render `ids`
    Change {
        ids: Vec<FeatureId>,
        kind: ChangeKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<ChangeContext>,
        /// Copies of the changed features still in the store
        features: Vec<Feature>,
    },
    /// A mode completed a shape or an edit
    Finish {
        id: FeatureId,
        mode: String,
        action: FinishAction,
    },
    Select {
        id: FeatureId,
    },
    Deselect {
        id: FeatureId,
    },
    ModeChanged {
        old: String,
        new: String,
    },
}
