//! Serializable routing state (for tests, debugging and the simulator)

use serde::{Deserialize, Serialize};

use crate::ids::{ContainerHandle, OutputIndex, ViewId};

/// A discovered secondary output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputInfo {
    pub index: OutputIndex,
    pub name: String,
    pub container: ContainerHandle,
}

/// Where a registered view currently is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewPlacement {
    pub view: ViewId,
    pub container: ContainerHandle,
    /// Display the view resolved to
    pub display: Option<OutputIndex>,
    /// Display whose container is the view's parent right now
    pub shown_on: Option<OutputIndex>,
    pub visible: bool,
}

/// Outputs plus every registered view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingSnapshot {
    pub outputs: Vec<OutputInfo>,
    pub views: Vec<ViewPlacement>,
}

impl RoutingSnapshot {
    pub fn view(&self, view: ViewId) -> Option<&ViewPlacement> {
        self.views.iter().find(|p| p.view == view)
    }

    /// Resolved views that are not on their resolved display
    ///
    /// Only out-of-range resolutions, which leave the view unrouted, should
    /// ever appear here.
    pub fn misrouted(&self) -> Vec<ViewId> {
        self.views
            .iter()
            .filter(|p| p.display.is_some() && p.display != p.shown_on)
            .map(|p| p.view)
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
