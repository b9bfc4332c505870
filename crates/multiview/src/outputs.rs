//! Output catalog
//!
//! Enumerates attached displays once at startup. The platform's primary
//! output is not listed: display 0 is always the main application window.
//! Secondary outputs become displays 1..=N in the order the platform
//! reports them.
//!
//! Hot-plug is not supported. A display attached after startup is invisible
//! to routing until the catalog is rebuilt, and the platform order is not
//! guaranteed to be stable across runs.

use serde::{Deserialize, Serialize};

use crate::host::HostUi;
use crate::ids::{ContainerHandle, OutputIndex};

/// A display as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputHandle {
    /// Platform name (e.g. "HDMI-1")
    pub name: String,
    /// Whether the platform designates this the default output
    pub primary: bool,
}

impl OutputHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: false,
        }
    }

    pub fn primary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: true,
        }
    }
}

/// Platform display enumeration
pub trait OutputDiscovery {
    /// All currently attached outputs, in platform order
    fn list_outputs(&mut self) -> Vec<OutputHandle>;

    /// Realize the layout container that presents content on `output`
    fn realize(&mut self, output: &OutputHandle, ui: &mut dyn HostUi) -> Option<ContainerHandle>;
}

/// A secondary display that surfaces can be routed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub index: OutputIndex,
    pub name: String,
    /// Reusable container presenting content on this output
    pub container: ContainerHandle,
}

/// Immutable list of secondary outputs discovered at startup
#[derive(Debug, Clone, Default)]
pub struct OutputCatalog {
    targets: Vec<OutputTarget>,
}

impl OutputCatalog {
    /// Enumerate secondary outputs
    ///
    /// Outputs whose container cannot be realized are skipped with a warning;
    /// the remaining outputs keep contiguous indices.
    pub fn enumerate(discovery: &mut dyn OutputDiscovery, ui: &mut dyn HostUi) -> Self {
        let mut targets = Vec::new();

        for output in discovery.list_outputs() {
            if output.primary {
                tracing::debug!(name = %output.name, "skipping primary output (main window is display 0)");
                continue;
            }

            let Some(container) = discovery.realize(&output, ui) else {
                tracing::warn!(name = %output.name, "failed to realize output container, skipping");
                continue;
            };

            let index = OutputIndex(targets.len() + 1);
            tracing::info!(name = %output.name, index = index.0, %container, "discovered secondary output");
            targets.push(OutputTarget {
                index,
                name: output.name,
                container,
            });
        }

        Self { targets }
    }

    /// Secondary output for `index`; `None` for 0 and for out-of-range indices
    pub fn get(&self, index: OutputIndex) -> Option<&OutputTarget> {
        index.0.checked_sub(1).and_then(|i| self.targets.get(i))
    }

    /// Number of secondary outputs
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputTarget> {
        self.targets.iter()
    }
}
