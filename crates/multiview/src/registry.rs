//! View registry
//!
//! Tracks every live view: which container currently shows it, and which
//! display it resolved to. All mutation goes through the methods below so
//! the invariants hold at one boundary.
//!
//! # Invariants
//!
//! - A view's resolved display goes from `None` to `Some(i)` at most once.
//!   Later resolutions are rejected (first write wins).
//! - Removing a view drops its container mapping and its display mapping
//!   together. A removed view is never recreated by a late resolution.
//!
//! Not thread-safe by contract. The orchestrator serializes access on the
//! event loop.

use std::collections::HashMap;

use crate::error::RoutingError;
use crate::ids::{ContainerHandle, OutputIndex, ViewId};

/// Bookkeeping for one registered view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub view: ViewId,
    /// Container that presents this view (not owned; the surface owns it)
    pub container: ContainerHandle,
    /// Display the view resolved to, once resolved
    pub display: Option<OutputIndex>,
}

/// Registry of live views
#[derive(Debug, Default)]
pub struct ViewRegistry {
    entries: HashMap<ViewId, RegistryEntry>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an unresolved entry
    ///
    /// Registering a view that is already present leaves the existing entry
    /// untouched and returns [`RoutingError::DuplicateIdentity`].
    pub fn register(&mut self, view: ViewId, container: ContainerHandle) -> Result<(), RoutingError> {
        if self.entries.contains_key(&view) {
            tracing::warn!(%view, %container, "view already registered, skipping");
            return Err(RoutingError::DuplicateIdentity(view));
        }

        self.entries.insert(
            view,
            RegistryEntry {
                view,
                container,
                display: None,
            },
        );
        tracing::debug!(%view, %container, "registered view");
        Ok(())
    }

    /// Bind `view` to display `target` if it is still unresolved
    ///
    /// Returns `false` when the view is already resolved or not registered.
    /// Callers treat `false` as "do nothing further".
    pub fn resolve_display(&mut self, view: ViewId, target: OutputIndex) -> bool {
        match self.entries.get_mut(&view) {
            Some(entry) if entry.display.is_none() => {
                entry.display = Some(target);
                tracing::debug!(%view, display = target.0, "resolved display");
                true
            }
            Some(entry) => {
                tracing::debug!(
                    %view,
                    requested = target.0,
                    resolved = ?entry.display.map(|d| d.0),
                    "view already resolved, ignoring"
                );
                false
            }
            None => false,
        }
    }

    pub fn lookup_container(&self, view: ViewId) -> Option<ContainerHandle> {
        self.entries.get(&view).map(|e| e.container)
    }

    pub fn lookup_display(&self, view: ViewId) -> Option<OutputIndex> {
        self.entries.get(&view).and_then(|e| e.display)
    }

    pub fn get(&self, view: ViewId) -> Option<&RegistryEntry> {
        self.entries.get(&view)
    }

    pub fn contains(&self, view: ViewId) -> bool {
        self.entries.contains_key(&view)
    }

    /// Drop the entry and both of its mappings. Removing an absent view is a no-op.
    pub fn remove(&mut self, view: ViewId) -> Option<RegistryEntry> {
        let removed = self.entries.remove(&view);
        if removed.is_some() {
            tracing::debug!(%view, "removed view");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by view id
    pub fn entries(&self) -> Vec<RegistryEntry> {
        let mut entries: Vec<_> = self.entries.values().copied().collect();
        entries.sort_by_key(|e| e.view);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SurfaceId;

    fn view(raw: u64) -> ViewId {
        ViewId::primary(SurfaceId(raw))
    }

    const C: ContainerHandle = ContainerHandle(1);

    // ========== register tests ==========

    #[test]
    fn register_inserts_unresolved_entry() {
        let mut registry = ViewRegistry::new();
        registry.register(view(1), C).unwrap();

        assert_eq!(registry.lookup_container(view(1)), Some(C));
        assert_eq!(registry.lookup_display(view(1)), None);
    }

    #[test]
    fn duplicate_register_keeps_existing_entry() {
        let mut registry = ViewRegistry::new();
        registry.register(view(1), C).unwrap();
        registry.resolve_display(view(1), OutputIndex(2));

        let result = registry.register(view(1), ContainerHandle(99));

        assert_eq!(result, Err(RoutingError::DuplicateIdentity(view(1))));
        assert_eq!(registry.lookup_container(view(1)), Some(C));
        assert_eq!(registry.lookup_display(view(1)), Some(OutputIndex(2)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn primary_and_fullscreen_views_are_separate_entries() {
        let mut registry = ViewRegistry::new();
        let id = SurfaceId(5);
        registry.register(ViewId::primary(id), C).unwrap();
        registry.register(ViewId::fullscreen(id), ContainerHandle(2)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup_container(ViewId::fullscreen(id)), Some(ContainerHandle(2)));
    }

    // ========== resolve_display tests ==========

    #[test]
    fn resolve_is_first_write_wins() {
        let mut registry = ViewRegistry::new();
        registry.register(view(1), C).unwrap();

        assert!(registry.resolve_display(view(1), OutputIndex(2)));
        assert!(!registry.resolve_display(view(1), OutputIndex(5)));
        assert_eq!(registry.lookup_display(view(1)), Some(OutputIndex(2)));
    }

    #[test]
    fn resolve_same_index_twice_only_first_succeeds() {
        let mut registry = ViewRegistry::new();
        registry.register(view(1), C).unwrap();

        assert!(registry.resolve_display(view(1), OutputIndex(1)));
        assert!(!registry.resolve_display(view(1), OutputIndex(1)));
    }

    #[test]
    fn resolve_unknown_view_does_not_insert() {
        let mut registry = ViewRegistry::new();

        assert!(!registry.resolve_display(view(3), OutputIndex(1)));
        assert!(!registry.contains(view(3)));
    }

    // ========== remove tests ==========

    #[test]
    fn remove_clears_container_and_display() {
        let mut registry = ViewRegistry::new();
        registry.register(view(7), C).unwrap();
        registry.resolve_display(view(7), OutputIndex(1));

        registry.remove(view(7));

        assert_eq!(registry.lookup_container(view(7)), None);
        assert_eq!(registry.lookup_display(view(7)), None);
    }

    #[test]
    fn remove_absent_view_is_noop() {
        let mut registry = ViewRegistry::new();
        registry.register(view(1), C).unwrap();

        assert!(registry.remove(view(2)).is_none());
        assert!(registry.remove(view(1)).is_some());
        assert!(registry.remove(view(1)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_resolve_after_remove_is_noop() {
        let mut registry = ViewRegistry::new();
        registry.register(view(3), C).unwrap();
        registry.remove(view(3));

        assert!(!registry.resolve_display(view(3), OutputIndex(1)));
        assert!(!registry.contains(view(3)));
    }

    #[test]
    fn id_can_be_registered_again_after_remove() {
        let mut registry = ViewRegistry::new();
        registry.register(view(4), C).unwrap();
        registry.resolve_display(view(4), OutputIndex(1));
        registry.remove(view(4));

        registry.register(view(4), ContainerHandle(8)).unwrap();
        assert_eq!(registry.lookup_display(view(4)), None);
        assert!(registry.resolve_display(view(4), OutputIndex(2)));
    }

    #[test]
    fn resolve_with_debug_logging_enabled() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut registry = ViewRegistry::new();
            registry.register(view(1), C).unwrap();
            assert!(registry.resolve_display(view(1), OutputIndex(2)));
            assert!(!registry.resolve_display(view(1), OutputIndex(3)));
        });
    }

    #[test]
    fn entries_are_sorted() {
        let mut registry = ViewRegistry::new();
        registry.register(view(3), C).unwrap();
        registry.register(view(1), C).unwrap();
        registry.register(ViewId::fullscreen(SurfaceId(1)), C).unwrap();

        let order: Vec<_> = registry.entries().iter().map(|e| e.view).collect();
        assert_eq!(
            order,
            vec![view(1), ViewId::fullscreen(SurfaceId(1)), view(3)]
        );
    }
}
