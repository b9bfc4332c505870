//! Collaborator interfaces
//!
//! The router never touches a platform API directly. The host UI toolkit,
//! the web content engine and the host application plug in through the
//! traits below; `backend::headless` provides in-memory versions.

use crate::error::RoutingError;
use crate::events::{CloseAction, EventSink, ScriptCallback};
use crate::ids::{ContainerHandle, SurfaceId, ViewId};

/// Container tree operations provided by the host UI toolkit
pub trait HostUi {
    /// Container backing the main application window (display 0)
    fn main_container(&self) -> ContainerHandle;

    /// Create an empty container (used for surface chrome)
    fn create_container(&mut self) -> ContainerHandle;

    /// Attach `container` as a child of `parent`
    ///
    /// Callers must detach first; platforms reject a child with two parents.
    fn attach(&mut self, container: ContainerHandle, parent: ContainerHandle);

    /// Detach `container` from its parent. No-op when it has none.
    fn detach(&mut self, container: ContainerHandle);

    fn set_visible(&mut self, container: ContainerHandle, visible: bool);

    /// Current parent of `container`, if attached
    fn parent_of(&self, container: ContainerHandle) -> Option<ContainerHandle>;

    fn is_visible(&self, container: ContainerHandle) -> bool;
}

/// One live unit of web content
pub trait ContentSurface {
    /// Native container the content renders into
    fn container(&self) -> ContainerHandle;

    fn load(&mut self, url: &str);

    /// Evaluate `expression` asynchronously; `callback` fires later with the
    /// string-encoded result ("null" when the expression yields nothing)
    fn evaluate_script(&mut self, expression: &str, callback: ScriptCallback);

    /// Release the native content. Called exactly once, on close.
    fn destroy(&mut self);

    /// The host dismissed the fullscreen view this surface requested
    fn fullscreen_dismissed(&mut self) {}
}

/// Builds content surfaces
///
/// Implementations must be reentrant: the orchestrator calls `create_surface`
/// while handling an event raised by a surface this engine built earlier.
pub trait ContentEngine {
    /// Create a surface bound to `id` that reports lifecycle, window-open,
    /// fullscreen and permission events through `events`
    fn create_surface(
        &mut self,
        id: SurfaceId,
        events: EventSink,
    ) -> Result<Box<dyn ContentSurface>, RoutingError>;
}

/// Callbacks exposed to the host application
pub trait HostDelegate {
    /// A pop-up surface needs to be presented as a window
    fn on_surface_needs_window(&mut self, container: ContainerHandle, close: CloseAction, id: SurfaceId);

    /// A surface entered fullscreen; `view` is the derived fullscreen view
    fn on_surface_needs_fullscreen(&mut self, container: ContainerHandle, close: CloseAction, view: ViewId);

    fn on_surface_visibility_change(&mut self, id: SurfaceId, visible: bool);

    /// The fullscreen presentation `view` was torn down
    fn on_fullscreen_closed(&mut self, view: ViewId);

    /// Fired once per load completion
    fn on_content_ready(&mut self, container: ContainerHandle, url: &str, id: SurfaceId);

    /// Hook for native object injection before the first load
    fn on_surface_created(&mut self, _container: ContainerHandle) {}
}
