//! Lifecycle orchestrator
//!
//! Reacts to lifecycle events and drives the registry and router.
//!
//! # Responsibilities
//!
//! - Surface creation (root surfaces and content-opened pop-ups)
//! - Display resolution after content finishes loading
//! - Fullscreen enter/exit through the derived fullscreen view
//! - Deterministic teardown on close
//!
//! # NOT Responsible For
//!
//! - Reparenting mechanics (see `router.rs`)
//! - Id bookkeeping invariants (see `registry.rs`)
//! - Parsing query answers (see `bridge.rs`)
//!
//! # Surface states
//!
//! `Created -> Unresolved -> Resolved(display) -> Closed`. Repeated loads in
//! `Resolved` are absorbed. Every handler tolerates events for surfaces that
//! have already closed: they are logged and ignored.

mod fullscreen;
mod popup;
mod resolve;

use std::collections::HashMap;

use calloop::{channel, LoopHandle, RegistrationToken};

use crate::config::Config;
use crate::error::RoutingError;
use crate::events::{EventChannel, EventSink, LifecycleEvent, PermissionRequest, QueryTicket};
use crate::factory::{Surface, SurfaceFactory, SurfaceOrigin};
use crate::host::{ContentEngine, HostDelegate, HostUi};
use crate::ids::{OutputIndex, SurfaceId, SurfaceIdAllocator, ViewId, ViewKind};
use crate::outputs::{OutputCatalog, OutputDiscovery};
use crate::registry::ViewRegistry;
use crate::router::DisplayRouter;
use crate::snapshot::{OutputInfo, RoutingSnapshot, ViewPlacement};

pub use fullscreen::FullscreenExit;

/// Host-side implementations the orchestrator drives
pub struct Collaborators {
    pub ui: Box<dyn HostUi>,
    pub engine: Box<dyn ContentEngine>,
    pub delegate: Box<dyn HostDelegate>,
}

/// Main routing state
pub struct Orchestrator {
    config: Config,

    registry: ViewRegistry,
    router: DisplayRouter,
    factory: SurfaceFactory,

    /// Live surfaces; the only owner of content
    surfaces: HashMap<SurfaceId, Surface>,

    /// In-flight display query per surface (at most one)
    pending_queries: HashMap<SurfaceId, QueryTicket>,

    ids: SurfaceIdAllocator,
    next_ticket: u64,

    ui: Box<dyn HostUi>,
    engine: Box<dyn ContentEngine>,
    delegate: Box<dyn HostDelegate>,

    /// Sender handed to surfaces, close actions and continuations
    events: EventSink,

    /// Number of lifecycle events handled so far
    events_handled: u64,
}

impl Orchestrator {
    /// Create the orchestrator, enumerating outputs once
    pub fn new(
        config: Config,
        collaborators: Collaborators,
        discovery: &mut dyn OutputDiscovery,
        events: EventSink,
    ) -> Self {
        let Collaborators {
            mut ui,
            engine,
            delegate,
        } = collaborators;

        let outputs = OutputCatalog::enumerate(discovery, ui.as_mut());
        let router = DisplayRouter::new(ui.main_container(), outputs);
        tracing::info!(
            secondary_outputs = router.outputs().len(),
            main = %router.main_container(),
            "orchestrator ready"
        );

        Self {
            config,
            registry: ViewRegistry::new(),
            router,
            factory: SurfaceFactory,
            surfaces: HashMap::new(),
            pending_queries: HashMap::new(),
            ids: SurfaceIdAllocator::new(),
            next_ticket: 1,
            ui,
            engine,
            delegate,
            events,
            events_handled: 0,
        }
    }

    /// Start allocating surface ids at `first`
    pub fn with_first_surface_id(mut self, first: u64) -> Self {
        self.ids = SurfaceIdAllocator::starting_at(first);
        self
    }

    /// Insert the lifecycle channel into an event loop whose data is the orchestrator
    pub fn attach_to_loop<'l>(
        handle: &LoopHandle<'l, Orchestrator>,
        channel: EventChannel,
    ) -> Result<RegistrationToken, calloop::Error> {
        handle
            .insert_source(channel, |event, _, orchestrator: &mut Orchestrator| match event {
                channel::Event::Msg(event) => orchestrator.handle_event(event),
                channel::Event::Closed => tracing::debug!("lifecycle channel closed"),
            })
            .map_err(|e| e.error)
    }

    /// Handle one lifecycle event
    pub fn handle_event(&mut self, event: LifecycleEvent) {
        self.events_handled += 1;
        tracing::trace!(?event, "handling lifecycle event");

        match event {
            LifecycleEvent::ContentLoaded { id, url } => self.on_content_loaded(id, &url),
            LifecycleEvent::DisplayQueryAnswered { id, ticket, payload } => {
                self.on_display_query_answered(id, ticket, &payload)
            }
            LifecycleEvent::WindowOpenRequested { opener, request } => {
                self.open_popup(opener, request);
            }
            LifecycleEvent::FullscreenRequested { id, view } => self.enter_fullscreen(id, view),
            LifecycleEvent::FullscreenExited { id } => self.exit_fullscreen(id, FullscreenExit::Content),
            LifecycleEvent::PermissionRequested { id, request } => self.answer_permission(id, request),
            LifecycleEvent::CloseRequested { view } => self.close(view),
        }
    }

    /// Open the root surface at the configured URL
    pub fn open_root(&mut self) -> Result<SurfaceId, RoutingError> {
        let url = self.config.root_url.clone();
        self.open_root_url(&url)
    }

    /// Open a root surface at `url`
    ///
    /// Root surfaces are placed in the main window immediately; display
    /// resolution still runs once the content loads.
    pub fn open_root_url(&mut self, url: &str) -> Result<SurfaceId, RoutingError> {
        let id = self.ids.allocate();
        let surface = self.factory.build(
            id,
            SurfaceOrigin::Root,
            self.engine.as_mut(),
            self.ui.as_mut(),
            &self.events,
        )?;

        let chrome = surface.chrome.container;
        if let Err(e) = self.registry.register(surface.view(), chrome) {
            self.discard(surface);
            return Err(e);
        }

        if let Err(e) = self.router.route(self.ui.as_mut(), chrome, OutputIndex::MAIN) {
            tracing::warn!(surface = %id, error = %e, "failed to place root surface");
        }

        self.delegate.on_surface_created(surface.content_container);
        let surface = self.surfaces.entry(id).or_insert(surface);
        surface.content.load(url);

        tracing::info!(surface = %id, url, "opened root surface");
        Ok(id)
    }

    /// Close a view
    ///
    /// Closing a primary view destroys the surface (and its fullscreen view,
    /// if any). Closing a fullscreen view only leaves fullscreen.
    pub fn close(&mut self, view: ViewId) {
        match view.kind {
            ViewKind::Fullscreen => self.exit_fullscreen(view.owner(), FullscreenExit::Host),
            ViewKind::Primary => self.close_surface(view.owner()),
        }
    }

    fn close_surface(&mut self, id: SurfaceId) {
        let Some(mut surface) = self.surfaces.remove(&id) else {
            let err = RoutingError::StaleReference(ViewId::primary(id));
            tracing::warn!(surface = %id, error = %err, "ignoring close");
            return;
        };

        if self.registry.contains(ViewId::fullscreen(id)) {
            self.exit_fullscreen(id, FullscreenExit::SurfaceClosing);
        }

        if self.pending_queries.remove(&id).is_some() {
            tracing::debug!(surface = %id, "cancelled in-flight display query");
        }

        self.ui.detach(surface.content_container);
        self.router.unroute(self.ui.as_mut(), surface.chrome.container);
        surface.content.destroy();

        self.registry.remove(ViewId::primary(id));
        self.registry.remove(ViewId::fullscreen(id));

        tracing::info!(surface = %id, remaining = self.surfaces.len(), "closed surface");
    }

    /// Tear down a surface that never made it into the registry
    fn discard(&mut self, mut surface: Surface) {
        self.ui.detach(surface.content_container);
        self.ui.detach(surface.chrome.container);
        surface.content.destroy();
        tracing::warn!(surface = %surface.id, "discarded unregistered surface");
    }

    fn answer_permission(&mut self, id: SurfaceId, request: PermissionRequest) {
        if !self.surfaces.contains_key(&id) {
            tracing::warn!(surface = %id, "permission request from closed surface, denying");
            request.answer(Vec::new());
            return;
        }

        let granted = self.config.permissions.grant(&request.resources);
        tracing::info!(
            surface = %id,
            requested = ?request.resources,
            granted = ?granted,
            "answered permission request"
        );
        request.answer(granted);
    }

    /// Allocate a fresh query ticket
    fn next_ticket(&mut self) -> QueryTicket {
        let ticket = QueryTicket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    pub fn router(&self) -> &DisplayRouter {
        &self.router
    }

    /// Ids of live surfaces, sorted
    pub fn surface_ids(&self) -> Vec<SurfaceId> {
        let mut ids: Vec<_> = self.surfaces.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Whether a display query is in flight for `id`
    pub fn has_pending_query(&self, id: SurfaceId) -> bool {
        self.pending_queries.contains_key(&id)
    }

    pub fn events_handled(&self) -> u64 {
        self.events_handled
    }

    /// Serializable view of outputs and every registered view
    pub fn snapshot(&self) -> RoutingSnapshot {
        let outputs = self
            .router
            .outputs()
            .iter()
            .map(|t| OutputInfo {
                index: t.index,
                name: t.name.clone(),
                container: t.container,
            })
            .collect();

        let views = self
            .registry
            .entries()
            .into_iter()
            .map(|entry| ViewPlacement {
                view: entry.view,
                container: entry.container,
                display: entry.display,
                shown_on: self
                    .ui
                    .parent_of(entry.container)
                    .and_then(|parent| self.router.display_for_container(parent)),
                visible: self.ui.is_visible(entry.container),
            })
            .collect();

        RoutingSnapshot { outputs, views }
    }
}
