//! Property-based tests for routing invariants
//!
//! These tests verify that registry and routing invariants hold across
//! arbitrary sequences of operations.

use multiview::registry::ViewRegistry;
use multiview::{ContainerHandle, OutputIndex, SurfaceId, ViewId};
use proptest::prelude::*;
use test_harness::assertions::assert_consistent;
use test_harness::fixtures::TEST_OUTPUTS;
use test_harness::TestRouter;

#[derive(Debug, Clone)]
enum RegistryOp {
    Register(u64, bool),
    Resolve(u64, bool, usize),
    Remove(u64, bool),
}

fn view(base: u64, fullscreen: bool) -> ViewId {
    if fullscreen {
        ViewId::fullscreen(SurfaceId(base))
    } else {
        ViewId::primary(SurfaceId(base))
    }
}

fn registry_op() -> impl Strategy<Value = RegistryOp> {
    prop_oneof![
        (0u64..6, any::<bool>()).prop_map(|(b, f)| RegistryOp::Register(b, f)),
        (0u64..6, any::<bool>(), 0usize..4).prop_map(|(b, f, d)| RegistryOp::Resolve(b, f, d)),
        (0u64..6, any::<bool>()).prop_map(|(b, f)| RegistryOp::Remove(b, f)),
    ]
}

#[derive(Debug, Clone)]
enum LifecycleOp {
    OpenRoot,
    Load(usize),
    Answer(usize, &'static str),
    Popup(usize),
    Fullscreen(usize),
    ExitFullscreen(usize),
    DismissFullscreen(usize),
    Close(usize),
}

fn pick(opened: &[SurfaceId], i: usize) -> SurfaceId {
    opened[i % opened.len()]
}

fn lifecycle_op() -> impl Strategy<Value = LifecycleOp> {
    let payload = prop::sample::select(vec!["null", "0", "1", "2", "7", "abc", "\"1\""]);
    prop_oneof![
        1 => Just(LifecycleOp::OpenRoot),
        3 => (0usize..8).prop_map(LifecycleOp::Load),
        3 => (0usize..8, payload).prop_map(|(i, p)| LifecycleOp::Answer(i, p)),
        2 => (0usize..8).prop_map(LifecycleOp::Popup),
        1 => (0usize..8).prop_map(LifecycleOp::Fullscreen),
        1 => (0usize..8).prop_map(LifecycleOp::ExitFullscreen),
        1 => (0usize..8).prop_map(LifecycleOp::DismissFullscreen),
        2 => (0usize..8).prop_map(LifecycleOp::Close),
    ]
}

proptest! {
    /// Once resolved, a view's display never changes while it stays registered
    #[test]
    fn resolution_is_first_write_wins(ops in prop::collection::vec(registry_op(), 0..60)) {
        let mut registry = ViewRegistry::new();
        let mut first: std::collections::HashMap<ViewId, OutputIndex> = Default::default();

        for op in ops {
            match op {
                RegistryOp::Register(b, f) => {
                    let v = view(b, f);
                    let was_present = registry.contains(v);
                    let result = registry.register(v, ContainerHandle(b * 2 + f as u64));
                    prop_assert_eq!(result.is_err(), was_present);
                }
                RegistryOp::Resolve(b, f, d) => {
                    let v = view(b, f);
                    let accepted = registry.resolve_display(v, OutputIndex(d));
                    if accepted {
                        prop_assert!(!first.contains_key(&v));
                        first.insert(v, OutputIndex(d));
                    }
                    prop_assert_eq!(registry.lookup_display(v), first.get(&v).copied());
                }
                RegistryOp::Remove(b, f) => {
                    let v = view(b, f);
                    registry.remove(v);
                    first.remove(&v);
                    prop_assert!(!registry.contains(v));
                    prop_assert_eq!(registry.lookup_container(v), None);
                    prop_assert_eq!(registry.lookup_display(v), None);
                }
            }
        }
    }

    /// Removing twice is the same as removing once
    #[test]
    fn removal_is_idempotent(bases in prop::collection::vec(0u64..10, 1..20)) {
        let mut registry = ViewRegistry::new();
        for b in &bases {
            let _ = registry.register(view(*b, false), ContainerHandle(*b));
        }

        for b in &bases {
            registry.remove(view(*b, false));
            prop_assert_eq!(registry.remove(view(*b, false)), None);
        }
        prop_assert!(registry.is_empty());
    }

    /// Arbitrary interleavings of lifecycle events keep routing consistent
    #[test]
    fn lifecycle_keeps_routing_consistent(ops in prop::collection::vec(lifecycle_op(), 0..40)) {
        let mut tr = TestRouter::new_headless(&TEST_OUTPUTS);
        let mut opened: Vec<SurfaceId> = vec![tr.open_root()];

        for op in ops {
            match op {
                LifecycleOp::OpenRoot => opened.push(tr.open_root()),
                LifecycleOp::Load(i) => {
                    tr.load(pick(&opened, i));
                }
                LifecycleOp::Answer(i, payload) => {
                    tr.answer_query(pick(&opened, i), payload);
                }
                LifecycleOp::Popup(i) => {
                    if let Some(popup) = tr.open_popup(pick(&opened, i), "https://app.example/popup") {
                        opened.push(popup);
                    }
                }
                LifecycleOp::Fullscreen(i) => {
                    tr.enter_fullscreen(pick(&opened, i));
                }
                LifecycleOp::ExitFullscreen(i) => tr.exit_fullscreen(pick(&opened, i)),
                LifecycleOp::DismissFullscreen(i) => {
                    tr.click_close(ViewId::fullscreen(pick(&opened, i)));
                }
                LifecycleOp::Close(i) => tr.close(ViewId::primary(pick(&opened, i))),
            }

            assert_consistent(&tr);
            for id in tr.orchestrator().surface_ids() {
                prop_assert!(tr.is_registered(ViewId::primary(id)));
            }
        }
    }
}
