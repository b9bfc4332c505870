//! Display router
//!
//! Physically moves a view's container between the main window and the
//! secondary output containers. The content itself is never recreated;
//! only its parent changes.

use crate::error::RoutingError;
use crate::host::HostUi;
use crate::ids::{ContainerHandle, OutputIndex};
use crate::outputs::OutputCatalog;

/// Reparents containers onto display containers
#[derive(Debug)]
pub struct DisplayRouter {
    main: ContainerHandle,
    outputs: OutputCatalog,
}

impl DisplayRouter {
    pub fn new(main: ContainerHandle, outputs: OutputCatalog) -> Self {
        Self { main, outputs }
    }

    pub fn outputs(&self) -> &OutputCatalog {
        &self.outputs
    }

    pub fn main_container(&self) -> ContainerHandle {
        self.main
    }

    /// Container that hosts display `index`, if it exists
    pub fn display_container(&self, index: OutputIndex) -> Option<ContainerHandle> {
        if index.is_main() {
            Some(self.main)
        } else {
            self.outputs.get(index).map(|t| t.container)
        }
    }

    /// Display shown by `parent`, if it is a display container
    pub fn display_for_container(&self, parent: ContainerHandle) -> Option<OutputIndex> {
        if parent == self.main {
            return Some(OutputIndex::MAIN);
        }
        self.outputs
            .iter()
            .find(|t| t.container == parent)
            .map(|t| t.index)
    }

    /// Move `container` onto display `target`
    ///
    /// Routing to the display the container is already on is a no-op. For an
    /// index beyond the discovered outputs the container is detached and left
    /// unrouted, and [`RoutingError::OutOfRangeDisplay`] is returned.
    pub fn route(
        &self,
        ui: &mut dyn HostUi,
        container: ContainerHandle,
        target: OutputIndex,
    ) -> Result<(), RoutingError> {
        let parent = self.display_container(target);

        if parent.is_some() && ui.parent_of(container) == parent {
            tracing::debug!(%container, display = target.0, "already on target display");
            return Ok(());
        }

        ui.detach(container);

        let Some(parent) = parent else {
            let err = RoutingError::OutOfRangeDisplay {
                index: target,
                available: self.outputs.len(),
            };
            tracing::warn!(%container, display = target.0, error = %err, "leaving container unrouted");
            return Err(err);
        };

        ui.attach(container, parent);
        tracing::info!(%container, display = target.0, %parent, "routed container");
        Ok(())
    }

    /// Remove `container` from whatever display shows it
    pub fn unroute(&self, ui: &mut dyn HostUi, container: ContainerHandle) {
        ui.detach(container);
    }
}
