//! Fullscreen presentation
//!
//! A fullscreen request hides the surface's own container and presents the
//! content's fullscreen view under the derived [`ViewId::fullscreen`] id, on
//! the display the surface already resolved to.

use crate::error::RoutingError;
use crate::events::CloseAction;
use crate::ids::{ContainerHandle, OutputIndex, SurfaceId, ViewId};

use super::Orchestrator;

/// Who ended a fullscreen presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenExit {
    /// Content left fullscreen itself
    Content,
    /// The host invoked the fullscreen view's close action
    Host,
    /// The owning surface is closing
    SurfaceClosing,
}

impl Orchestrator {
    pub(super) fn enter_fullscreen(&mut self, id: SurfaceId, view: ContainerHandle) {
        let primary = ViewId::primary(id);
        let derived = ViewId::fullscreen(id);

        let Some(container) = self.registry.lookup_container(primary) else {
            let err = RoutingError::StaleReference(primary);
            tracing::warn!(surface = %id, error = %err, "ignoring fullscreen request");
            return;
        };

        if let Err(e) = self.registry.register(derived, view) {
            tracing::warn!(surface = %id, error = %e, "ignoring fullscreen request");
            return;
        }

        self.ui.set_visible(container, false);
        self.delegate.on_surface_visibility_change(id, false);

        let target = self
            .registry
            .lookup_display(primary)
            .unwrap_or(OutputIndex::MAIN);
        self.registry.resolve_display(derived, target);

        self.delegate.on_surface_needs_fullscreen(
            view,
            CloseAction::new(derived, self.events.clone()),
            derived,
        );

        match self.router.route(self.ui.as_mut(), view, target) {
            Ok(()) => tracing::info!(surface = %id, display = target.0, "entered fullscreen"),
            Err(e) => tracing::warn!(surface = %id, error = %e, "fullscreen view left unrouted"),
        }
    }

    pub(super) fn exit_fullscreen(&mut self, id: SurfaceId, cause: FullscreenExit) {
        let derived = ViewId::fullscreen(id);

        let Some(entry) = self.registry.remove(derived) else {
            let err = RoutingError::StaleReference(derived);
            tracing::warn!(surface = %id, ?cause, error = %err, "ignoring fullscreen exit");
            return;
        };

        self.router.unroute(self.ui.as_mut(), entry.container);
        self.delegate.on_fullscreen_closed(derived);

        if cause == FullscreenExit::SurfaceClosing {
            tracing::info!(surface = %id, "dropped fullscreen view of closing surface");
            return;
        }

        match self.registry.lookup_container(ViewId::primary(id)) {
            Some(container) => {
                self.ui.set_visible(container, true);
                self.delegate.on_surface_visibility_change(id, true);
            }
            None => {
                let err = RoutingError::StaleReference(ViewId::primary(id));
                tracing::warn!(surface = %id, error = %err, "no surface to restore after fullscreen");
            }
        }

        if cause == FullscreenExit::Host {
            if let Some(surface) = self.surfaces.get_mut(&id) {
                surface.content.fullscreen_dismissed();
            }
        }

        tracing::info!(surface = %id, ?cause, "exited fullscreen");
    }
}
