//! Tests for pop-up windows opened by content
//!
//! A pop-up is handed to the host as a window right away but only moves onto
//! a display once its own content answers the display query.

use multiview::backend::headless::{DelegateCall, Handshake};
use multiview::{OutputIndex, ViewId};
use test_harness::assertions::{assert_consistent, assert_forgotten, assert_surface_on};
use test_harness::fixtures::{popup_of_root_on, root_on, unloaded_root};

#[test]
fn window_open_completes_handshake_with_new_content() {
    let (tr, root, popup) = popup_of_root_on("1");

    assert_ne!(popup, root);
    let content = tr.platform().content_container(popup).unwrap();
    assert_eq!(
        tr.platform().handshakes(),
        vec![Handshake {
            opener: root,
            content
        }]
    );
    assert_eq!(
        tr.platform().loads(popup),
        vec!["https://app.example/popup".to_string()]
    );
}

#[test]
fn popup_is_presented_as_window() {
    let (tr, _root, popup) = popup_of_root_on("1");

    let chrome = tr.chrome_of(popup).unwrap();
    assert!(tr
        .platform()
        .delegate_calls()
        .contains(&DelegateCall::NeedsWindow {
            container: chrome,
            id: popup
        }));
    assert!(tr.platform().close_action(ViewId::primary(popup)).is_some());
}

#[test]
fn popup_waits_for_its_own_resolution() {
    let (tr, _root, popup) = popup_of_root_on("1");

    let view = ViewId::primary(popup);
    assert!(tr.is_registered(view));
    assert_eq!(tr.display_of(view), None);
    assert_eq!(tr.shown_on(view), None);
    assert_consistent(&tr);
}

#[test]
fn popup_routes_to_explicit_display() {
    let (mut tr, _root, popup) = popup_of_root_on("1");

    tr.load_and_answer(popup, "2");

    assert_surface_on(&tr, popup, 2);
    assert_consistent(&tr);
}

#[test]
fn popup_without_preference_follows_opener() {
    let (mut tr, _root, popup) = popup_of_root_on("2");

    tr.load_and_answer(popup, "null");

    assert_surface_on(&tr, popup, 2);
}

#[test]
fn popup_with_malformed_answer_follows_opener() {
    let (mut tr, _root, popup) = popup_of_root_on("1");

    tr.load_and_answer(popup, "left monitor");

    assert_surface_on(&tr, popup, 1);
}

#[test]
fn popup_with_negative_answer_is_left_unrouted() {
    let (mut tr, _root, popup) = popup_of_root_on("1");

    tr.load_and_answer(popup, "-2");

    let view = ViewId::primary(popup);
    assert_eq!(tr.display_of(view), Some(OutputIndex::UNADDRESSABLE));
    assert_eq!(tr.shown_on(view), None);
    assert!(tr.platform().children_of(tr.output_container(1).unwrap()).is_empty());
    assert_consistent(&tr);
}

#[test]
fn popup_of_unresolved_opener_defaults_to_main() {
    let (mut tr, root) = unloaded_root();
    let popup = tr.open_popup(root, "https://app.example/popup").unwrap();

    tr.load_and_answer(popup, "null");

    assert_surface_on(&tr, popup, 0);
}

#[test]
fn opener_resolving_later_does_not_move_default() {
    let (mut tr, root) = unloaded_root();
    let popup = tr.open_popup(root, "https://app.example/popup").unwrap();

    tr.load_and_answer(root, "2");
    tr.load_and_answer(popup, "null");

    assert_surface_on(&tr, root, 2);
    assert_surface_on(&tr, popup, 0);
}

#[test]
fn popup_close_action_tears_popup_down() {
    let (mut tr, root, popup) = popup_of_root_on("1");
    tr.load_and_answer(popup, "2");

    assert!(tr.click_close(ViewId::primary(popup)));

    assert_forgotten(&tr, popup);
    assert!(tr.platform().is_destroyed(popup));
    assert!(tr.platform().children_of(tr.output_container(2).unwrap()).is_empty());
    assert_surface_on(&tr, root, 1);
    assert_consistent(&tr);
}

#[test]
fn popup_outlives_its_opener() {
    let (mut tr, root, popup) = popup_of_root_on("1");

    tr.close(ViewId::primary(root));
    tr.load_and_answer(popup, "null");

    assert_forgotten(&tr, root);
    assert_surface_on(&tr, popup, 1);
    assert_consistent(&tr);
}

#[test]
fn closed_opener_cannot_open_popups() {
    let (mut tr, root) = root_on("1");
    tr.close(ViewId::primary(root));

    let popup = tr.open_popup(root, "https://app.example/popup");

    assert_eq!(popup, None);
    assert!(tr.platform().handshakes().is_empty());
    assert!(tr.orchestrator().surface_ids().is_empty());
}

#[test]
fn popups_can_open_popups() {
    let (mut tr, _root, popup) = popup_of_root_on("1");
    tr.load_and_answer(popup, "2");

    let nested = tr.open_popup(popup, "https://app.example/nested").unwrap();
    tr.load_and_answer(nested, "null");

    assert_surface_on(&tr, nested, 2);
    assert_eq!(tr.orchestrator().surface_ids().len(), 3);
    assert_consistent(&tr);
}

#[test]
fn failed_popup_build_leaves_opener_alone() {
    let (mut tr, root) = root_on("1");
    tr.platform().fail_surface_creation(true);

    let popup = tr.open_popup(root, "https://app.example/popup");

    assert_eq!(popup, None);
    assert_eq!(tr.orchestrator().surface_ids(), vec![root]);
    assert_eq!(tr.display_of(ViewId::primary(root)), Some(OutputIndex(1)));
}
