//! Test fixtures for common test scenarios

use multiview::{ContainerHandle, SurfaceId};

use crate::headless::TestRouter;

/// Secondary outputs most scenarios run with (indices 1 and 2)
pub const TEST_OUTPUTS: [&str; 2] = ["HDMI-A-1", "DP-2"];

/// Create a router with the two standard secondary outputs
pub fn two_outputs() -> TestRouter {
    TestRouter::new_headless(&TEST_OUTPUTS)
}

/// Create a router with a single root surface that has not loaded yet
pub fn unloaded_root() -> (TestRouter, SurfaceId) {
    let mut tr = two_outputs();
    let root = tr.open_root_url("https://app.example/");
    (tr, root)
}

/// Create a router with a root surface whose display query answered `payload`
///
/// Useful for starting from a resolved surface on a given display.
pub fn root_on(payload: &str) -> (TestRouter, SurfaceId) {
    let (mut tr, root) = unloaded_root();
    tr.load_and_answer(root, payload);
    (tr, root)
}

/// Create a root resolved by `root_payload` plus an unresolved pop-up it opened
///
/// Returns: (router, root, popup)
pub fn popup_of_root_on(root_payload: &str) -> (TestRouter, SurfaceId, SurfaceId) {
    let (mut tr, root) = root_on(root_payload);
    let popup = tr
        .open_popup(root, "https://app.example/popup")
        .expect("window-open handshake did not complete");
    (tr, root, popup)
}

/// Create a root resolved by `payload` that is presenting fullscreen
///
/// Returns: (router, root, fullscreen view container)
pub fn fullscreen_root_on(payload: &str) -> (TestRouter, SurfaceId, ContainerHandle) {
    let (mut tr, root) = root_on(payload);
    let view = tr
        .enter_fullscreen(root)
        .expect("fullscreen request was not raised");
    (tr, root, view)
}
