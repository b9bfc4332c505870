//! Pop-up windows opened by content

use crate::error::RoutingError;
use crate::events::WindowOpenRequest;
use crate::factory::SurfaceOrigin;
use crate::ids::{OutputIndex, SurfaceId, ViewId};

use super::Orchestrator;

impl Orchestrator {
    /// Build a child surface for a window-open request
    ///
    /// The child is registered unresolved and handed to the host as a window.
    /// It is not routed until its own content loads and answers the display
    /// query; a `null` answer sends it to the opener's display.
    pub(super) fn open_popup(&mut self, opener: SurfaceId, request: WindowOpenRequest) -> Option<SurfaceId> {
        if !self.surfaces.contains_key(&opener) {
            let err = RoutingError::StaleReference(ViewId::primary(opener));
            tracing::warn!(opener = %opener, url = ?request.url, error = %err, "ignoring window open");
            return None;
        }

        let default_display = self
            .registry
            .lookup_display(ViewId::primary(opener))
            .unwrap_or(OutputIndex::MAIN);

        let id = self.ids.allocate();
        let origin = SurfaceOrigin::Popup {
            opener,
            default_display,
        };
        let surface = match self.factory.build(
            id,
            origin,
            self.engine.as_mut(),
            self.ui.as_mut(),
            &self.events,
        ) {
            Ok(surface) => surface,
            Err(e) => {
                tracing::warn!(opener = %opener, error = %e, "failed to build pop-up surface");
                return None;
            }
        };

        if let Err(e) = self.registry.register(surface.view(), surface.chrome.container) {
            tracing::warn!(opener = %opener, error = %e, "failed to register pop-up surface");
            self.discard(surface);
            return None;
        }

        let content = surface.content_container;
        let chrome = surface.chrome.clone();
        self.delegate.on_surface_created(content);
        self.surfaces.insert(id, surface);

        request.complete(content);
        self.delegate.on_surface_needs_window(chrome.container, chrome.close, id);

        tracing::info!(
            surface = %id,
            opener = %opener,
            default_display = default_display.0,
            "opened pop-up surface"
        );
        Some(id)
    }
}
