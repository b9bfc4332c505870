//! Headless platform for testing and simulation
//!
//! This module provides in-memory stand-ins for every collaborator the
//! router talks to:
//! - [`HeadlessUi`]: a container tree with attach/detach/visibility
//! - [`HeadlessEngine`] / [`HeadlessSurface`]: content that records loads,
//!   queues script evaluations until the test answers them, and raises
//!   lifecycle events on request
//! - [`HeadlessDiscovery`]: named outputs, the first one marked primary
//! - [`RecordingDelegate`]: records every host delegate call and keeps the
//!   close actions so a test can "click" them
//!
//! # Design
//!
//! All adapters share one `Arc<Mutex<World>>`. The orchestrator owns the
//! adapters; the test keeps a [`HeadlessPlatform`] clone to drive and inspect
//! the same world. Callbacks are always invoked after the lock is released,
//! since they may re-enter the world.
//!
//! The container tree is strict like a real toolkit: attaching a container
//! that already has a parent is refused and counted as a violation.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::RoutingError;
use crate::events::{
    CloseAction, EventSink, LifecycleEvent, PermissionRequest, ScriptCallback, WindowOpenRequest,
};
use crate::host::{ContentEngine, ContentSurface, HostDelegate, HostUi};
use crate::ids::{ContainerHandle, SurfaceId, ViewId};
use crate::orchestrator::Collaborators;
use crate::outputs::{OutputDiscovery, OutputHandle};

/// A host delegate call, as recorded by [`RecordingDelegate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegateCall {
    NeedsWindow { container: ContainerHandle, id: SurfaceId },
    NeedsFullscreen { container: ContainerHandle, view: ViewId },
    VisibilityChange { id: SurfaceId, visible: bool },
    FullscreenClosed { view: ViewId },
    ContentReady { container: ContainerHandle, url: String, id: SurfaceId },
    SurfaceCreated { container: ContainerHandle },
}

/// A completed window-open handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    pub opener: SurfaceId,
    pub content: ContainerHandle,
}

struct Node {
    parent: Option<ContainerHandle>,
    children: Vec<ContainerHandle>,
    visible: bool,
}

impl Node {
    fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            visible: true,
        }
    }
}

struct PendingScript {
    expression: String,
    callback: ScriptCallback,
}

struct ContentRecord {
    container: ContainerHandle,
    events: EventSink,
    loads: Vec<String>,
    pending_scripts: VecDeque<PendingScript>,
    destroyed: bool,
    fullscreen_view: Option<ContainerHandle>,
    fullscreen_dismissals: usize,
}

struct World {
    next_container: u64,
    main: ContainerHandle,
    containers: HashMap<ContainerHandle, Node>,
    attach_violations: usize,

    outputs: Vec<OutputHandle>,
    unrealizable: HashSet<String>,

    surfaces: BTreeMap<SurfaceId, ContentRecord>,
    fail_surface_creation: bool,
    handshakes: Vec<Handshake>,
    permission_grants: Vec<(SurfaceId, Vec<String>)>,

    delegate_calls: Vec<DelegateCall>,
    close_actions: HashMap<ViewId, CloseAction>,
}

impl World {
    fn new(outputs: Vec<OutputHandle>) -> Self {
        let main = ContainerHandle(1);
        let mut containers = HashMap::new();
        containers.insert(main, Node::new());
        Self {
            next_container: 2,
            main,
            containers,
            attach_violations: 0,
            outputs,
            unrealizable: HashSet::new(),
            surfaces: BTreeMap::new(),
            fail_surface_creation: false,
            handshakes: Vec::new(),
            permission_grants: Vec::new(),
            delegate_calls: Vec::new(),
            close_actions: HashMap::new(),
        }
    }

    fn create_container(&mut self) -> ContainerHandle {
        let handle = ContainerHandle(self.next_container);
        self.next_container += 1;
        self.containers.insert(handle, Node::new());
        handle
    }

    fn detach(&mut self, container: ContainerHandle) {
        let Some(parent) = self.containers.get_mut(&container).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(node) = self.containers.get_mut(&parent) {
            node.children.retain(|c| *c != container);
        }
    }

    fn attach(&mut self, container: ContainerHandle, parent: ContainerHandle) {
        let node = self.containers.entry(container).or_insert_with(Node::new);
        if let Some(existing) = node.parent {
            self.attach_violations += 1;
            tracing::error!(%container, %existing, %parent, "container already has a parent, refusing attach");
            return;
        }
        node.parent = Some(parent);
        self.containers
            .entry(parent)
            .or_insert_with(Node::new)
            .children
            .push(container);
    }

    fn surface_by_container(&self, container: ContainerHandle) -> Option<SurfaceId> {
        self.surfaces
            .iter()
            .find(|(_, r)| r.container == container)
            .map(|(id, _)| *id)
    }
}

/// Handle to a shared in-memory platform
#[derive(Clone)]
pub struct HeadlessPlatform {
    world: Arc<Mutex<World>>,
}

impl HeadlessPlatform {
    /// Name of the output the platform reports as primary
    pub const PRIMARY_OUTPUT: &'static str = "eDP-1";

    /// Platform with only the primary output
    pub fn new() -> Self {
        Self::with_outputs(&[])
    }

    /// Platform with the primary output plus `secondary` outputs, in order
    pub fn with_outputs(secondary: &[&str]) -> Self {
        let mut outputs = vec![OutputHandle::primary(Self::PRIMARY_OUTPUT)];
        outputs.extend(secondary.iter().map(|name| OutputHandle::new(*name)));
        Self {
            world: Arc::new(Mutex::new(World::new(outputs))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ui(&self) -> HeadlessUi {
        HeadlessUi {
            world: self.world.clone(),
        }
    }

    pub fn engine(&self) -> HeadlessEngine {
        HeadlessEngine {
            world: self.world.clone(),
        }
    }

    pub fn discovery(&self) -> HeadlessDiscovery {
        HeadlessDiscovery {
            world: self.world.clone(),
        }
    }

    pub fn delegate(&self) -> RecordingDelegate {
        RecordingDelegate {
            world: self.world.clone(),
        }
    }

    /// Boxed adapters ready for [`crate::Orchestrator::new`]
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            ui: Box::new(self.ui()),
            engine: Box::new(self.engine()),
            delegate: Box::new(self.delegate()),
        }
    }

    // ========== platform control ==========

    /// Make realizing the named output fail
    pub fn fail_realize(&self, name: &str) {
        self.lock().unrealizable.insert(name.to_string());
    }

    /// Make the content engine refuse to build surfaces
    pub fn fail_surface_creation(&self, fail: bool) {
        self.lock().fail_surface_creation = fail;
    }

    // ========== container tree ==========

    pub fn main_container(&self) -> ContainerHandle {
        self.lock().main
    }

    pub fn parent_of(&self, container: ContainerHandle) -> Option<ContainerHandle> {
        self.lock().containers.get(&container).and_then(|n| n.parent)
    }

    pub fn children_of(&self, container: ContainerHandle) -> Vec<ContainerHandle> {
        self.lock()
            .containers
            .get(&container)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn is_visible(&self, container: ContainerHandle) -> bool {
        self.lock()
            .containers
            .get(&container)
            .map(|n| n.visible)
            .unwrap_or(false)
    }

    /// Attaches refused because the container already had a parent
    pub fn attach_violations(&self) -> usize {
        self.lock().attach_violations
    }

    // ========== content ==========

    /// Surfaces the engine has built, sorted by id
    pub fn surface_ids(&self) -> Vec<SurfaceId> {
        self.lock().surfaces.keys().copied().collect()
    }

    pub fn content_container(&self, id: SurfaceId) -> Option<ContainerHandle> {
        self.lock().surfaces.get(&id).map(|r| r.container)
    }

    /// URLs loaded into a surface, in order
    pub fn loads(&self, id: SurfaceId) -> Vec<String> {
        self.lock()
            .surfaces
            .get(&id)
            .map(|r| r.loads.clone())
            .unwrap_or_default()
    }

    pub fn is_destroyed(&self, id: SurfaceId) -> bool {
        self.lock().surfaces.get(&id).is_some_and(|r| r.destroyed)
    }

    /// Script evaluations waiting for an answer
    pub fn pending_scripts(&self, id: SurfaceId) -> Vec<String> {
        self.lock()
            .surfaces
            .get(&id)
            .map(|r| r.pending_scripts.iter().map(|s| s.expression.clone()).collect())
            .unwrap_or_default()
    }

    /// Answer the oldest pending script evaluation of `id`
    ///
    /// Returns false if nothing was pending. Answers for destroyed surfaces
    /// are still delivered, like a real engine racing a close.
    pub fn answer_script(&self, id: SurfaceId, payload: &str) -> bool {
        let pending = self
            .lock()
            .surfaces
            .get_mut(&id)
            .and_then(|r| r.pending_scripts.pop_front());

        match pending {
            Some(script) => {
                (script.callback)(payload.to_string());
                true
            }
            None => false,
        }
    }

    fn send(&self, id: SurfaceId, event: LifecycleEvent) -> bool {
        let events = self.lock().surfaces.get(&id).map(|r| r.events.clone());
        match events {
            Some(events) => {
                events.send(event);
                true
            }
            None => false,
        }
    }

    /// Raise "content finished loading" for the last loaded URL
    pub fn finish_loading(&self, id: SurfaceId) -> bool {
        let url = self
            .lock()
            .surfaces
            .get(&id)
            .and_then(|r| r.loads.last().cloned())
            .unwrap_or_else(|| "about:blank".to_string());
        self.finish_loading_url(id, &url)
    }

    /// Raise "content finished loading" for `url` (in-page navigation, reloads)
    pub fn finish_loading_url(&self, id: SurfaceId, url: &str) -> bool {
        if let Some(record) = self.lock().surfaces.get_mut(&id) {
            if record.loads.last().map(String::as_str) != Some(url) {
                record.loads.push(url.to_string());
            }
        }
        self.send(
            id,
            LifecycleEvent::ContentLoaded {
                id,
                url: url.to_string(),
            },
        )
    }

    /// Content calls the window-open primitive
    ///
    /// When the orchestrator completes the handshake, the requested URL is
    /// loaded into the handed-over surface, as a real platform would.
    pub fn request_window_open(&self, opener: SurfaceId, url: &str) -> bool {
        let world = self.world.clone();
        let target = url.to_string();
        let request = WindowOpenRequest::new(Some(url.to_string()), move |content| {
            let mut world = world.lock().unwrap_or_else(PoisonError::into_inner);
            world.handshakes.push(Handshake { opener, content });
            if let Some(child) = world.surface_by_container(content) {
                if let Some(record) = world.surfaces.get_mut(&child) {
                    record.loads.push(target);
                }
            }
        });
        self.send(opener, LifecycleEvent::WindowOpenRequested { opener, request })
    }

    /// Completed window-open handshakes, in order
    pub fn handshakes(&self) -> Vec<Handshake> {
        self.lock().handshakes.clone()
    }

    /// Surfaces handed to `opener` through window-open handshakes
    pub fn popups_opened_by(&self, opener: SurfaceId) -> Vec<SurfaceId> {
        let world = self.lock();
        world
            .handshakes
            .iter()
            .filter(|h| h.opener == opener)
            .filter_map(|h| world.surface_by_container(h.content))
            .collect()
    }

    /// Content calls the fullscreen primitive; returns its fullscreen view
    pub fn request_fullscreen(&self, id: SurfaceId) -> Option<ContainerHandle> {
        let (view, events) = {
            let mut world = self.lock();
            if !world.surfaces.contains_key(&id) {
                return None;
            }
            let view = world.create_container();
            let record = world.surfaces.get_mut(&id)?;
            record.fullscreen_view = Some(view);
            (view, record.events.clone())
        };
        events.send(LifecycleEvent::FullscreenRequested { id, view });
        Some(view)
    }

    /// Content leaves fullscreen on its own
    pub fn exit_fullscreen(&self, id: SurfaceId) -> bool {
        if let Some(record) = self.lock().surfaces.get_mut(&id) {
            record.fullscreen_view = None;
        }
        self.send(id, LifecycleEvent::FullscreenExited { id })
    }

    /// Fullscreen view the content currently presents
    pub fn fullscreen_view(&self, id: SurfaceId) -> Option<ContainerHandle> {
        self.lock().surfaces.get(&id).and_then(|r| r.fullscreen_view)
    }

    /// Times the host dismissed this surface's fullscreen view
    pub fn fullscreen_dismissals(&self, id: SurfaceId) -> usize {
        self.lock()
            .surfaces
            .get(&id)
            .map(|r| r.fullscreen_dismissals)
            .unwrap_or(0)
    }

    /// Content asks for device resources
    pub fn request_permissions(&self, id: SurfaceId, resources: &[&str]) -> bool {
        let world = self.world.clone();
        let request = PermissionRequest::new(
            resources.iter().map(|r| r.to_string()).collect(),
            move |granted| {
                world
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .permission_grants
                    .push((id, granted));
            },
        );
        self.send(id, LifecycleEvent::PermissionRequested { id, request })
    }

    /// Answered permission requests, in order
    pub fn permission_grants(&self) -> Vec<(SurfaceId, Vec<String>)> {
        self.lock().permission_grants.clone()
    }

    // ========== host delegate ==========

    pub fn delegate_calls(&self) -> Vec<DelegateCall> {
        self.lock().delegate_calls.clone()
    }

    pub fn clear_delegate_calls(&self) {
        self.lock().delegate_calls.clear();
    }

    /// Close action the host received for `view`
    pub fn close_action(&self, view: ViewId) -> Option<CloseAction> {
        self.lock().close_actions.get(&view).cloned()
    }

    /// The user clicks the close affordance of `view`
    pub fn click_close(&self, view: ViewId) -> bool {
        match self.close_action(view) {
            Some(action) => {
                action.invoke();
                true
            }
            None => false,
        }
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory container tree
pub struct HeadlessUi {
    world: Arc<Mutex<World>>,
}

impl HeadlessUi {
    fn lock(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostUi for HeadlessUi {
    fn main_container(&self) -> ContainerHandle {
        self.lock().main
    }

    fn create_container(&mut self) -> ContainerHandle {
        self.lock().create_container()
    }

    fn attach(&mut self, container: ContainerHandle, parent: ContainerHandle) {
        self.lock().attach(container, parent);
    }

    fn detach(&mut self, container: ContainerHandle) {
        self.lock().detach(container);
    }

    fn set_visible(&mut self, container: ContainerHandle, visible: bool) {
        if let Some(node) = self.lock().containers.get_mut(&container) {
            node.visible = visible;
        }
    }

    fn parent_of(&self, container: ContainerHandle) -> Option<ContainerHandle> {
        self.lock().containers.get(&container).and_then(|n| n.parent)
    }

    fn is_visible(&self, container: ContainerHandle) -> bool {
        self.lock()
            .containers
            .get(&container)
            .map(|n| n.visible)
            .unwrap_or(false)
    }
}

/// Scripted content engine
pub struct HeadlessEngine {
    world: Arc<Mutex<World>>,
}

impl ContentEngine for HeadlessEngine {
    fn create_surface(
        &mut self,
        id: SurfaceId,
        events: EventSink,
    ) -> Result<Box<dyn ContentSurface>, RoutingError> {
        let mut world = self.world.lock().unwrap_or_else(PoisonError::into_inner);
        if world.fail_surface_creation {
            return Err(RoutingError::Engine(format!("refused to build surface {id}")));
        }

        let container = world.create_container();
        world.surfaces.insert(
            id,
            ContentRecord {
                container,
                events,
                loads: Vec::new(),
                pending_scripts: VecDeque::new(),
                destroyed: false,
                fullscreen_view: None,
                fullscreen_dismissals: 0,
            },
        );

        Ok(Box::new(HeadlessSurface {
            id,
            container,
            world: self.world.clone(),
        }))
    }
}

/// Content surface backed by the shared world
pub struct HeadlessSurface {
    id: SurfaceId,
    container: ContainerHandle,
    world: Arc<Mutex<World>>,
}

impl HeadlessSurface {
    fn with_record(&self, f: impl FnOnce(&mut ContentRecord)) {
        let mut world = self.world.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(record) = world.surfaces.get_mut(&self.id) {
            f(record);
        }
    }
}

impl ContentSurface for HeadlessSurface {
    fn container(&self) -> ContainerHandle {
        self.container
    }

    fn load(&mut self, url: &str) {
        self.with_record(|r| r.loads.push(url.to_string()));
    }

    fn evaluate_script(&mut self, expression: &str, callback: ScriptCallback) {
        self.with_record(|r| {
            r.pending_scripts.push_back(PendingScript {
                expression: expression.to_string(),
                callback,
            })
        });
    }

    fn destroy(&mut self) {
        self.with_record(|r| {
            r.destroyed = true;
            r.fullscreen_view = None;
        });
    }

    fn fullscreen_dismissed(&mut self) {
        self.with_record(|r| {
            r.fullscreen_view = None;
            r.fullscreen_dismissals += 1;
        });
    }
}

/// Named outputs; the first is primary
pub struct HeadlessDiscovery {
    world: Arc<Mutex<World>>,
}

impl OutputDiscovery for HeadlessDiscovery {
    fn list_outputs(&mut self) -> Vec<OutputHandle> {
        self.world
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .outputs
            .clone()
    }

    fn realize(&mut self, output: &OutputHandle, ui: &mut dyn HostUi) -> Option<ContainerHandle> {
        let refused = self
            .world
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unrealizable
            .contains(&output.name);
        if refused {
            return None;
        }
        Some(ui.create_container())
    }
}

/// Host delegate that records every call
pub struct RecordingDelegate {
    world: Arc<Mutex<World>>,
}

impl RecordingDelegate {
    fn record(&self, call: DelegateCall) {
        tracing::trace!(?call, "delegate call");
        self.world
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .delegate_calls
            .push(call);
    }

    fn keep_close_action(&self, close: CloseAction) {
        self.world
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .close_actions
            .insert(close.view(), close);
    }
}

impl HostDelegate for RecordingDelegate {
    fn on_surface_needs_window(&mut self, container: ContainerHandle, close: CloseAction, id: SurfaceId) {
        self.keep_close_action(close);
        self.record(DelegateCall::NeedsWindow { container, id });
    }

    fn on_surface_needs_fullscreen(&mut self, container: ContainerHandle, close: CloseAction, view: ViewId) {
        self.keep_close_action(close);
        self.record(DelegateCall::NeedsFullscreen { container, view });
    }

    fn on_surface_visibility_change(&mut self, id: SurfaceId, visible: bool) {
        self.record(DelegateCall::VisibilityChange { id, visible });
    }

    fn on_fullscreen_closed(&mut self, view: ViewId) {
        self.record(DelegateCall::FullscreenClosed { view });
    }

    fn on_content_ready(&mut self, container: ContainerHandle, url: &str, id: SurfaceId) {
        self.record(DelegateCall::ContentReady {
            container,
            url: url.to_string(),
            id,
        });
    }

    fn on_surface_created(&mut self, container: ContainerHandle) {
        self.record(DelegateCall::SurfaceCreated { container });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_channel;

    #[test]
    fn attach_twice_is_refused_and_counted() {
        let platform = HeadlessPlatform::new();
        let mut ui = platform.ui();
        let a = ui.create_container();
        let b = ui.create_container();
        let c = ui.create_container();

        ui.attach(c, a);
        ui.attach(c, b);

        assert_eq!(platform.parent_of(c), Some(a));
        assert_eq!(platform.attach_violations(), 1);
    }

    #[test]
    fn detach_without_parent_is_noop() {
        let platform = HeadlessPlatform::new();
        let mut ui = platform.ui();
        let c = ui.create_container();

        ui.detach(c);

        assert_eq!(platform.parent_of(c), None);
        assert_eq!(platform.attach_violations(), 0);
    }

    #[test]
    fn detach_removes_child_from_parent() {
        let platform = HeadlessPlatform::new();
        let mut ui = platform.ui();
        let main = ui.main_container();
        let c = ui.create_container();

        ui.attach(c, main);
        assert_eq!(platform.children_of(main), vec![c]);

        ui.detach(c);
        assert!(platform.children_of(main).is_empty());
    }

    #[test]
    fn visibility_defaults_to_visible() {
        let platform = HeadlessPlatform::new();
        let mut ui = platform.ui();
        let c = ui.create_container();

        assert!(platform.is_visible(c));
        ui.set_visible(c, false);
        assert!(!platform.is_visible(c));
    }

    #[test]
    fn scripts_wait_until_answered() {
        let platform = HeadlessPlatform::new();
        let (sink, _channel) = event_channel();
        let mut surface = platform.engine().create_surface(SurfaceId(1), sink).unwrap();

        let answer = Arc::new(Mutex::new(None));
        let slot = answer.clone();
        surface.evaluate_script("1 + 1", Box::new(move |r| *slot.lock().unwrap() = Some(r)));

        assert_eq!(platform.pending_scripts(SurfaceId(1)), vec!["1 + 1".to_string()]);
        assert!(answer.lock().unwrap().is_none());

        assert!(platform.answer_script(SurfaceId(1), "2"));
        assert_eq!(answer.lock().unwrap().as_deref(), Some("2"));
        assert!(!platform.answer_script(SurfaceId(1), "3"));
    }

    #[test]
    fn engine_failure_is_reported() {
        let platform = HeadlessPlatform::new();
        platform.fail_surface_creation(true);
        let (sink, _channel) = event_channel();

        let result = platform.engine().create_surface(SurfaceId(1), sink);
        assert!(matches!(result, Err(RoutingError::Engine(_))));
    }

    #[test]
    fn destroy_marks_surface() {
        let platform = HeadlessPlatform::new();
        let (sink, _channel) = event_channel();
        let mut surface = platform.engine().create_surface(SurfaceId(4), sink).unwrap();

        surface.load("https://example.test/");
        surface.destroy();

        assert!(platform.is_destroyed(SurfaceId(4)));
        assert_eq!(platform.loads(SurfaceId(4)), vec!["https://example.test/".to_string()]);
    }
}
