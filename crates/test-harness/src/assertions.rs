//! Test assertions for routing state

use multiview::{OutputIndex, SurfaceId, ViewId};

use crate::headless::TestRouter;

/// Assert that no container was ever attached while it still had a parent
pub fn assert_single_parent(tr: &TestRouter) {
    assert_eq!(
        tr.platform().attach_violations(),
        0,
        "a container was attached to a second parent"
    );
}

/// Assert that every resolved view sits on its resolved display
///
/// The only allowed exception is a view that resolved to a display that was
/// never discovered; that view must be detached.
pub fn assert_routing_invariant(tr: &TestRouter) {
    let snapshot = tr.snapshot();
    let available = snapshot.outputs.len();

    for view in snapshot.misrouted() {
        let placement = snapshot.view(view).expect("misrouted view missing from snapshot");
        let display = placement.display.expect("misrouted view is resolved");
        assert!(
            display.0 > available,
            "view {} resolved to display {} but is shown on {:?}",
            view,
            display,
            placement.shown_on
        );
        assert_eq!(
            placement.shown_on, None,
            "out-of-range view {} should be unrouted",
            view
        );
    }
}

/// Assert that registry entries exist only for live surfaces
pub fn assert_no_dangling_entries(tr: &TestRouter) {
    let live = tr.orchestrator().surface_ids();
    for entry in tr.orchestrator().registry().entries() {
        assert!(
            live.contains(&entry.view.owner()),
            "registry entry {} outlived its surface",
            entry.view
        );
    }
}

/// Run every structural assertion
pub fn assert_consistent(tr: &TestRouter) {
    assert_single_parent(tr);
    assert_routing_invariant(tr);
    assert_no_dangling_entries(tr);
}

/// Assert that `id` resolved to `display` and is shown there
pub fn assert_surface_on(tr: &TestRouter, id: SurfaceId, display: usize) {
    let view = ViewId::primary(id);
    assert_eq!(
        tr.display_of(view),
        Some(OutputIndex(display)),
        "surface {} resolved to the wrong display",
        id
    );
    assert_eq!(
        tr.shown_on(view),
        Some(OutputIndex(display)),
        "surface {} is not shown on display {}",
        id,
        display
    );
}

/// Assert that `view` is registered but not attached to any display
pub fn assert_unrouted(tr: &TestRouter, view: ViewId) {
    assert!(tr.is_registered(view), "view {} is not registered", view);
    assert_eq!(tr.shown_on(view), None, "view {} should not be on a display", view);
}

/// Assert that nothing about `id` remains in the registry
pub fn assert_forgotten(tr: &TestRouter, id: SurfaceId) {
    for view in [ViewId::primary(id), ViewId::fullscreen(id)] {
        assert!(!tr.is_registered(view), "view {} still registered", view);
        assert_eq!(tr.display_of(view), None, "view {} still has a display", view);
    }
}
