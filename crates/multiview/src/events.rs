//! Lifecycle events and the channel that carries them
//!
//! The content engine and the host raise events from their own callbacks.
//! Every event is funnelled through an [`EventSink`] into a calloop channel,
//! so the orchestrator handles them one at a time on the event loop.

use std::fmt;

use calloop::channel;

use crate::ids::{ContainerHandle, SurfaceId, ViewId};

/// Continuation invoked with the string result of an evaluated script
pub type ScriptCallback = Box<dyn FnOnce(String) + Send>;

/// Identifies one issued display query, so late answers can be told apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryTicket(pub u64);

/// Pending platform window-open handshake
///
/// The platform gives content a transport to fill with a freshly built
/// surface. Completing it hands over the child's content container.
pub struct WindowOpenRequest {
    /// URL the content asked to open, if known
    pub url: Option<String>,
    reply: Box<dyn FnOnce(ContainerHandle) + Send>,
}

impl WindowOpenRequest {
    pub fn new(url: Option<String>, reply: impl FnOnce(ContainerHandle) + Send + 'static) -> Self {
        Self {
            url,
            reply: Box::new(reply),
        }
    }

    /// Finish the handshake with the child surface's content container
    pub fn complete(self, content: ContainerHandle) {
        (self.reply)(content);
    }
}

impl fmt::Debug for WindowOpenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowOpenRequest")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Pending content permission request
pub struct PermissionRequest {
    /// Resource names the content wants (e.g. "camera", "microphone")
    pub resources: Vec<String>,
    reply: Box<dyn FnOnce(Vec<String>) + Send>,
}

impl PermissionRequest {
    pub fn new(resources: Vec<String>, reply: impl FnOnce(Vec<String>) + Send + 'static) -> Self {
        Self {
            resources,
            reply: Box::new(reply),
        }
    }

    /// Grant the given subset of the requested resources (empty = deny)
    pub fn answer(self, granted: Vec<String>) {
        (self.reply)(granted);
    }
}

impl fmt::Debug for PermissionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionRequest")
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

/// Events delivered to the orchestrator
#[derive(Debug)]
pub enum LifecycleEvent {
    /// Content finished loading a page
    ContentLoaded { id: SurfaceId, url: String },

    /// A display query issued for `id` came back
    DisplayQueryAnswered {
        id: SurfaceId,
        ticket: QueryTicket,
        payload: String,
    },

    /// Content called the window-open primitive
    WindowOpenRequested {
        opener: SurfaceId,
        request: WindowOpenRequest,
    },

    /// Content called the fullscreen primitive with its fullscreen view
    FullscreenRequested { id: SurfaceId, view: ContainerHandle },

    /// Content left fullscreen on its own
    FullscreenExited { id: SurfaceId },

    /// Content asked for access to device resources
    PermissionRequested {
        id: SurfaceId,
        request: PermissionRequest,
    },

    /// The host invoked a close action
    CloseRequested { view: ViewId },
}

/// Receiving end inserted into the event loop
pub type EventChannel = channel::Channel<LifecycleEvent>;

/// Sending end handed to collaborators and continuations
#[derive(Clone)]
pub struct EventSink {
    sender: channel::Sender<LifecycleEvent>,
}

impl EventSink {
    /// Queue an event for the orchestrator
    ///
    /// Sending after the event loop is gone drops the event; by then there is
    /// nothing left to route.
    pub fn send(&self, event: LifecycleEvent) {
        if let Err(e) = self.sender.send(event) {
            tracing::debug!(event = ?e.0, "event loop gone, dropping lifecycle event");
        }
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventSink")
    }
}

/// Create the lifecycle event channel
pub fn event_channel() -> (EventSink, EventChannel) {
    let (sender, channel) = channel::channel();
    (EventSink { sender }, channel)
}

/// Close affordance handed to the host with every presented view
///
/// Invoking it does not close anything directly; it queues a
/// [`LifecycleEvent::CloseRequested`] so the close is serialized with every
/// other event.
#[derive(Debug, Clone)]
pub struct CloseAction {
    view: ViewId,
    sink: EventSink,
}

impl CloseAction {
    pub fn new(view: ViewId, sink: EventSink) -> Self {
        Self { view, sink }
    }

    /// View this action closes
    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn invoke(&self) {
        tracing::debug!(view = %self.view, "close action invoked");
        self.sink.send(LifecycleEvent::CloseRequested { view: self.view });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn window_open_request_completes_with_container() {
        let handed = Arc::new(Mutex::new(None));
        let slot = handed.clone();
        let request = WindowOpenRequest::new(Some("https://example.test".into()), move |c| {
            *slot.lock().unwrap() = Some(c);
        });

        request.complete(ContainerHandle(9));

        assert_eq!(*handed.lock().unwrap(), Some(ContainerHandle(9)));
    }

    #[test]
    fn permission_request_reports_granted_subset() {
        let granted = Arc::new(Mutex::new(Vec::new()));
        let slot = granted.clone();
        let request = PermissionRequest::new(vec!["camera".into(), "midi".into()], move |g| {
            *slot.lock().unwrap() = g;
        });

        request.answer(vec!["camera".into()]);

        assert_eq!(*granted.lock().unwrap(), vec!["camera".to_string()]);
    }

    #[test]
    fn close_action_queues_close_event() {
        let (sink, channel) = event_channel();
        let view = ViewId::fullscreen(SurfaceId(3));
        let action = CloseAction::new(view, sink);

        action.invoke();

        let mut event_loop: calloop::EventLoop<Vec<ViewId>> = calloop::EventLoop::try_new().unwrap();
        event_loop
            .handle()
            .insert_source(channel, |event, _, closed: &mut Vec<ViewId>| {
                if let channel::Event::Msg(LifecycleEvent::CloseRequested { view }) = event {
                    closed.push(view);
                }
            })
            .unwrap();

        let mut closed = Vec::new();
        event_loop
            .dispatch(Some(std::time::Duration::ZERO), &mut closed)
            .unwrap();
        assert_eq!(closed, vec![view]);
    }

    #[test]
    fn send_after_loop_dropped_does_not_panic() {
        let (sink, channel) = event_channel();
        drop(channel);
        sink.send(LifecycleEvent::FullscreenExited { id: SurfaceId(1) });
    }
}
