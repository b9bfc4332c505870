//! Headless router wrapper for testing

use std::time::Duration;

use calloop::EventLoop;
use multiview::backend::headless::HeadlessPlatform;
use multiview::config::Config;
use multiview::events::event_channel;
use multiview::snapshot::RoutingSnapshot;
use multiview::{ContainerHandle, Orchestrator, OutputIndex, RoutingError, SurfaceId, ViewId};
use thiserror::Error;

/// Dispatch rounds [`TestRouter::settle`] allows before declaring a livelock
const MAX_SETTLE_ROUNDS: usize = 64;

#[derive(Error, Debug)]
pub enum TestError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] calloop::Error),

    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("event loop still busy after {0} rounds")]
    NotIdle(usize),
}

/// Configures a [`TestRouter`] before outputs are enumerated
pub struct TestRouterBuilder {
    outputs: Vec<String>,
    unrealizable: Vec<String>,
    config: Config,
    first_surface_id: Option<u64>,
}

impl TestRouterBuilder {
    /// Secondary outputs, in discovery order
    pub fn outputs(mut self, names: &[&str]) -> Self {
        self.outputs = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Make the named output fail to realize
    pub fn unrealizable(mut self, name: &str) -> Self {
        self.unrealizable.push(name.to_string());
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn first_surface_id(mut self, first: u64) -> Self {
        self.first_surface_id = Some(first);
        self
    }

    pub fn build(self) -> Result<TestRouter, TestError> {
        let names: Vec<&str> = self.outputs.iter().map(String::as_str).collect();
        let platform = HeadlessPlatform::with_outputs(&names);
        for name in &self.unrealizable {
            platform.fail_realize(name);
        }

        let (sink, channel) = event_channel();
        let mut discovery = platform.discovery();
        let mut orchestrator =
            Orchestrator::new(self.config, platform.collaborators(), &mut discovery, sink);
        if let Some(first) = self.first_surface_id {
            orchestrator = orchestrator.with_first_surface_id(first);
        }

        let event_loop = EventLoop::try_new()?;
        Orchestrator::attach_to_loop(&event_loop.handle(), channel)?;

        Ok(TestRouter {
            event_loop,
            orchestrator,
            platform,
        })
    }
}

/// Test router wrapper
///
/// Every driver method settles the event loop before returning, so the
/// orchestrator has handled everything the action caused.
pub struct TestRouter {
    event_loop: EventLoop<'static, Orchestrator>,
    orchestrator: Orchestrator,
    platform: HeadlessPlatform,
}

impl TestRouter {
    pub fn builder() -> TestRouterBuilder {
        TestRouterBuilder {
            outputs: Vec::new(),
            unrealizable: Vec::new(),
            config: Config::default(),
            first_surface_id: None,
        }
    }

    /// Create a router over the given secondary outputs
    pub fn new_headless(outputs: &[&str]) -> Self {
        Self::builder()
            .outputs(outputs)
            .build()
            .expect("failed to build headless test router")
    }

    pub fn platform(&self) -> &HeadlessPlatform {
        &self.platform
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut Orchestrator {
        &mut self.orchestrator
    }

    /// Dispatch until a round handles no events; returns the events handled
    pub fn settle(&mut self) -> Result<u64, TestError> {
        let start = self.orchestrator.events_handled();
        for _ in 0..MAX_SETTLE_ROUNDS {
            let before = self.orchestrator.events_handled();
            self.event_loop
                .dispatch(Some(Duration::ZERO), &mut self.orchestrator)?;
            if self.orchestrator.events_handled() == before {
                return Ok(before - start);
            }
        }
        tracing::warn!(rounds = MAX_SETTLE_ROUNDS, "event loop never went idle");
        Err(TestError::NotIdle(MAX_SETTLE_ROUNDS))
    }

    fn settled(&mut self) {
        self.settle().expect("event loop failed to settle");
    }

    // ========== driving ==========

    /// Open a root surface at the configured URL
    pub fn open_root(&mut self) -> SurfaceId {
        let id = self.orchestrator.open_root().expect("failed to open root surface");
        self.settled();
        id
    }

    pub fn open_root_url(&mut self, url: &str) -> SurfaceId {
        let id = self
            .orchestrator
            .open_root_url(url)
            .expect("failed to open root surface");
        self.settled();
        id
    }

    /// Content of `id` finishes loading
    pub fn load(&mut self, id: SurfaceId) -> bool {
        let sent = self.platform.finish_loading(id);
        self.settled();
        sent
    }

    pub fn load_url(&mut self, id: SurfaceId, url: &str) -> bool {
        let sent = self.platform.finish_loading_url(id, url);
        self.settled();
        sent
    }

    /// Answer the oldest script evaluation pending on `id`
    pub fn answer_query(&mut self, id: SurfaceId, payload: &str) -> bool {
        let answered = self.platform.answer_script(id, payload);
        self.settled();
        answered
    }

    /// Load, then answer the display query with `payload`
    pub fn load_and_answer(&mut self, id: SurfaceId, payload: &str) {
        self.load(id);
        assert!(
            self.answer_query(id, payload),
            "surface {id} issued no display query"
        );
    }

    /// Content of `opener` opens a pop-up window
    pub fn open_popup(&mut self, opener: SurfaceId, url: &str) -> Option<SurfaceId> {
        let before = self.platform.popups_opened_by(opener).len();
        self.platform.request_window_open(opener, url);
        self.settled();
        let popups = self.platform.popups_opened_by(opener);
        (popups.len() > before).then(|| popups[popups.len() - 1])
    }

    /// Content of `id` requests fullscreen; returns its fullscreen view container
    pub fn enter_fullscreen(&mut self, id: SurfaceId) -> Option<ContainerHandle> {
        let view = self.platform.request_fullscreen(id);
        self.settled();
        view
    }

    /// Content of `id` leaves fullscreen on its own
    pub fn exit_fullscreen(&mut self, id: SurfaceId) {
        self.platform.exit_fullscreen(id);
        self.settled();
    }

    /// Host invokes the close action it was given for `view`
    pub fn click_close(&mut self, view: ViewId) -> bool {
        let clicked = self.platform.click_close(view);
        self.settled();
        clicked
    }

    /// Close `view` directly (host-driven, e.g. the root window closing)
    pub fn close(&mut self, view: ViewId) {
        self.orchestrator.close(view);
        self.settled();
    }

    /// Content of `id` asks for resources; returns what was granted
    pub fn request_permissions(&mut self, id: SurfaceId, resources: &[&str]) -> Option<Vec<String>> {
        let before = self.platform.permission_grants().len();
        self.platform.request_permissions(id, resources);
        self.settled();
        self.platform
            .permission_grants()
            .into_iter()
            .skip(before)
            .find(|(surface, _)| *surface == id)
            .map(|(_, granted)| granted)
    }

    // ========== inspection ==========

    pub fn snapshot(&self) -> RoutingSnapshot {
        self.orchestrator.snapshot()
    }

    pub fn main_container(&self) -> ContainerHandle {
        self.platform.main_container()
    }

    /// Container of secondary output `index`
    pub fn output_container(&self, index: usize) -> Option<ContainerHandle> {
        self.orchestrator.router().display_container(OutputIndex(index))
    }

    /// Chrome container the router moves for `id`
    pub fn chrome_of(&self, id: SurfaceId) -> Option<ContainerHandle> {
        self.orchestrator.registry().lookup_container(ViewId::primary(id))
    }

    /// Display `view` resolved to
    pub fn display_of(&self, view: ViewId) -> Option<OutputIndex> {
        self.orchestrator.registry().lookup_display(view)
    }

    /// Display whose container currently parents `view`
    pub fn shown_on(&self, view: ViewId) -> Option<OutputIndex> {
        let container = self.orchestrator.registry().lookup_container(view)?;
        let parent = self.platform.parent_of(container)?;
        self.orchestrator.router().display_for_container(parent)
    }

    pub fn is_registered(&self, view: ViewId) -> bool {
        self.orchestrator.registry().contains(view)
    }
}
