//! Content surface factory
//!
//! Builds a surface bound to an id: asks the content engine for the content,
//! wraps its container in a chrome container the router can move around, and
//! hands out the close action the host wires to its close affordance.

use crate::error::RoutingError;
use crate::events::{CloseAction, EventSink};
use crate::host::{ContentEngine, ContentSurface, HostUi};
use crate::ids::{ContainerHandle, OutputIndex, SurfaceId, ViewId};

/// How a surface came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOrigin {
    /// Created by the host and placed in the main window immediately
    Root,
    /// Opened by content through the window-open primitive
    Popup {
        opener: SurfaceId,
        /// Opener's display when the pop-up was requested
        default_display: OutputIndex,
    },
}

/// Outer container of a surface plus its close affordance
#[derive(Debug, Clone)]
pub struct Chrome {
    pub container: ContainerHandle,
    pub close: CloseAction,
}

/// One live surface
///
/// Owns its content exclusively. Dropped only by the orchestrator's close
/// path, after `destroy()` has been called on the content.
pub struct Surface {
    pub id: SurfaceId,
    pub origin: SurfaceOrigin,
    pub content: Box<dyn ContentSurface>,
    /// Container the content renders into (child of the chrome)
    pub content_container: ContainerHandle,
    pub chrome: Chrome,
}

impl Surface {
    /// Display used when the content has no preference
    pub fn default_display(&self) -> OutputIndex {
        match self.origin {
            SurfaceOrigin::Root => OutputIndex::MAIN,
            SurfaceOrigin::Popup { default_display, .. } => default_display,
        }
    }

    pub fn view(&self) -> ViewId {
        ViewId::primary(self.id)
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("content_container", &self.content_container)
            .field("chrome", &self.chrome.container)
            .finish_non_exhaustive()
    }
}

/// Stateless surface builder
///
/// Safe to call from inside an event raised by a surface it built earlier.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceFactory;

impl SurfaceFactory {
    pub fn build(
        &self,
        id: SurfaceId,
        origin: SurfaceOrigin,
        engine: &mut dyn ContentEngine,
        ui: &mut dyn HostUi,
        events: &EventSink,
    ) -> Result<Surface, RoutingError> {
        let content = engine.create_surface(id, events.clone())?;
        let content_container = content.container();

        let chrome_container = ui.create_container();
        ui.attach(content_container, chrome_container);

        tracing::info!(
            surface = %id,
            ?origin,
            content = %content_container,
            chrome = %chrome_container,
            "built surface"
        );

        Ok(Surface {
            id,
            origin,
            content,
            content_container,
            chrome: Chrome {
                container: chrome_container,
                close: CloseAction::new(ViewId::primary(id), events.clone()),
            },
        })
    }
}
