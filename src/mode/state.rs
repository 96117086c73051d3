//! Lifecycle of a drawing mode.
//!
//! Every mode follows the same strict state machine. States only change
//! through the lifecycle methods on [`ModeCore`](super::ModeCore), which
//! keep host side effects (double click zoom, cursor) in step with the
//! transition.
//!
//! # State Transitions
//!
//! ```text
//! ┌──────────────┐      ┌────────────┐      ┌─────────┐
//! │ Unregistered ├──────► Registered ├──────►         ◄────────────┐
//! └──────────────┘      └────────────┘      │         │            │
//!                                           │ Started ├──► Drawing │
//!                       ┌─────────┐         │         │            │
//!                       │ Stopped ◄─────────┤         ├──► Selecting
//!                       │         ├─────────►         │
//!                       └─────────┘         └─────────┘
//! ```
//!
//! `Drawing` and `Selecting` return to `Started` on `start()`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeState {
    /// Constructed but not bound to a store or host
    #[default]
    Unregistered,
    Registered,
    /// Active and waiting for input
    Started,
    /// In the middle of drawing a shape
    Drawing,
    /// Active with a selection workflow
    Selecting,
    Stopped,
}

impl ModeState {
    /// Validates whether a transition to the new state is allowed
    pub fn can_transition_to(&self, next: ModeState) -> bool {
        use ModeState::*;
        matches!(
            (self, next),
            (Unregistered, Registered)
                | (Registered | Stopped | Drawing | Selecting, Started)
                | (Started, Drawing | Selecting | Stopped)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModeState::Unregistered => "unregistered",
            ModeState::Registered => "registered",
            ModeState::Started => "started",
            ModeState::Drawing => "drawing",
            ModeState::Selecting => "selecting",
            ModeState::Stopped => "stopped",
        }
    }

    /// Started, drawing or selecting
    pub fn is_active(&self) -> bool {
        matches!(self, ModeState::Started | ModeState::Drawing | ModeState::Selecting)
    }
}

impl std::fmt::Display for ModeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_lifecycle_edges_are_legal() {
        use ModeState::*;
        let all = [Unregistered, Registered, Started, Drawing, Selecting, Stopped];
        let legal = [
            (Unregistered, Registered),
            (Registered, Started),
            (Stopped, Started),
            (Drawing, Started),
            (Selecting, Started),
            (Started, Drawing),
            (Started, Selecting),
            (Started, Stopped),
        ];

        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }
}
