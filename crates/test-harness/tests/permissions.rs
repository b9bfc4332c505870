//! Tests for content permission requests

use multiview::config::{Config, PermissionConfig};
use multiview::ViewId;
use test_harness::fixtures::{root_on, TEST_OUTPUTS};
use test_harness::TestRouter;

fn router_allowing(allowed: &[&str]) -> TestRouter {
    let config = Config {
        permissions: PermissionConfig {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        },
        ..Config::default()
    };
    TestRouter::builder()
        .outputs(&TEST_OUTPUTS)
        .config(config)
        .build()
        .unwrap()
}

#[test]
fn default_policy_grants_everything() {
    let (mut tr, root) = root_on("1");

    let granted = tr.request_permissions(root, &["camera", "microphone"]);

    assert_eq!(
        granted,
        Some(vec!["camera".to_string(), "microphone".to_string()])
    );
}

#[test]
fn restricted_policy_grants_subset() {
    let mut tr = router_allowing(&["camera"]);
    let root = tr.open_root();

    let granted = tr.request_permissions(root, &["camera", "microphone"]);

    assert_eq!(granted, Some(vec!["camera".to_string()]));
}

#[test]
fn prefix_patterns_match() {
    let mut tr = router_allowing(&["video.*"]);
    let root = tr.open_root();

    let granted = tr.request_permissions(root, &["video.capture", "audio.capture"]);

    assert_eq!(granted, Some(vec!["video.capture".to_string()]));
}

#[test]
fn empty_policy_denies() {
    let mut tr = router_allowing(&[]);
    let root = tr.open_root();

    let granted = tr.request_permissions(root, &["camera"]);

    assert_eq!(granted, Some(Vec::new()));
}

#[test]
fn closed_surface_is_denied() {
    let (mut tr, root) = root_on("1");
    tr.close(ViewId::primary(root));

    let granted = tr.request_permissions(root, &["camera"]);

    assert_eq!(granted, Some(Vec::new()));
}
