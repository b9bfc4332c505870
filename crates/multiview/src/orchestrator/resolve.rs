//! Display resolution
//!
//! When content finishes loading, the surface is asked which display it
//! wants. The answer comes back later as its own event; by then the surface
//! may have closed, or already resolved, so the answer is re-validated
//! before anything moves.

use crate::bridge::DisplayAnswer;
use crate::error::RoutingError;
use crate::events::{LifecycleEvent, QueryTicket};
use crate::ids::{SurfaceId, ViewId};

use super::Orchestrator;

impl Orchestrator {
    pub(super) fn on_content_loaded(&mut self, id: SurfaceId, url: &str) {
        let Some(surface) = self.surfaces.get(&id) else {
            let err = RoutingError::StaleReference(ViewId::primary(id));
            tracing::warn!(surface = %id, url, error = %err, "ignoring content loaded");
            return;
        };

        self.delegate.on_content_ready(surface.content_container, url, id);

        if let Some(resolved) = self.registry.lookup_display(ViewId::primary(id)) {
            tracing::debug!(surface = %id, url, display = resolved.0, "already resolved, absorbing load");
            return;
        }

        if self.pending_queries.contains_key(&id) {
            tracing::debug!(surface = %id, url, "display query already in flight");
            return;
        }

        self.issue_display_query(id);
    }

    /// Ask the surface's content for its display index
    ///
    /// Does not wait. The answer arrives as
    /// [`LifecycleEvent::DisplayQueryAnswered`] carrying the ticket issued here.
    fn issue_display_query(&mut self, id: SurfaceId) {
        let ticket = self.next_ticket();
        let Some(surface) = self.surfaces.get_mut(&id) else {
            return;
        };

        self.pending_queries.insert(id, ticket);

        let events = self.events.clone();
        surface.content.evaluate_script(
            &self.config.display_query,
            Box::new(move |payload| {
                events.send(LifecycleEvent::DisplayQueryAnswered { id, ticket, payload });
            }),
        );

        tracing::debug!(surface = %id, ticket = ticket.0, "issued display query");
    }

    pub(super) fn on_display_query_answered(&mut self, id: SurfaceId, ticket: QueryTicket, payload: &str) {
        if self.pending_queries.get(&id) != Some(&ticket) {
            tracing::debug!(surface = %id, ticket = ticket.0, "discarding cancelled display query answer");
            return;
        }
        self.pending_queries.remove(&id);

        let view = ViewId::primary(id);
        let Some(surface) = self.surfaces.get(&id) else {
            let err = RoutingError::StaleReference(view);
            tracing::warn!(surface = %id, error = %err, "ignoring display query answer");
            return;
        };

        let answer = DisplayAnswer::parse(payload);
        match answer {
            DisplayAnswer::Malformed => {
                tracing::debug!(surface = %id, payload, "malformed display query result, using default display")
            }
            DisplayAnswer::Unaddressable => {
                tracing::warn!(surface = %id, payload, "display query named an index no output can have")
            }
            DisplayAnswer::Explicit(_) | DisplayAnswer::NoPreference => {}
        }
        let target = answer.resolve(surface.default_display());
        let chrome = surface.chrome.container;

        if !self.registry.resolve_display(view, target) {
            return;
        }

        match self.router.route(self.ui.as_mut(), chrome, target) {
            Ok(()) => tracing::info!(surface = %id, display = target.0, "surface resolved and routed"),
            Err(e) => tracing::warn!(surface = %id, error = %e, "surface resolved but left unrouted"),
        }
    }
}
