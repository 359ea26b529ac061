//! Debounce/throttle policy behavior at the engine surface.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use stratum_core::geometry::Rect;
use stratum_core::host::AttrChange;
use stratum_core::node::{NodeId, Role};
use stratum_core::vars::LayerKey;
use stratum_harness::{FakeNode, FakeTree, after};
use stratum_runtime::{Engine, EngineConfig, EventKind};
use web_time::Instant;

fn conflicting_pair(tree: &mut FakeTree) -> (NodeId, NodeId) {
    let subject = tree.insert(
        FakeNode::new(Rect::new(0.0, 0.0, 100.0, 100.0), 5)
            .with_marker("overlay-selector")
            .open(true),
    );
    let overlay = tree.insert(
        FakeNode::new(Rect::new(50.0, 50.0, 150.0, 150.0), 5).with_marker("modal"),
    );
    (subject, overlay)
}

#[test]
fn five_resizes_in_a_burst_reevaluate_once_after_the_fifth() {
    let mut tree = FakeTree::new();
    let (subject, overlay) = conflicting_pair(&mut tree);
    let mut engine = Engine::default();
    let t0 = Instant::now();

    let resizes = Rc::new(RefCell::new(0));
    let resizes_clone = Rc::clone(&resizes);
    let _ = engine.on(EventKind::Resize, move |_| {
        *resizes_clone.borrow_mut() += 1;
        Ok(())
    });

    let _ = engine.open(&tree, overlay, Role::Modal, "modal", t0);
    let _ = engine.open(&tree, subject, Role::OverlaySelector, "picker", after(t0, 1));

    // Five notifications within 30ms.
    for i in 0..5 {
        engine.on_resize(&tree, after(t0, 10 + i * 6));
    }
    let fifth = after(t0, 34);

    // Ticking before the quiet period elapses does nothing.
    engine.tick(&tree, after(t0, 50));
    engine.tick(&tree, after(t0, 100));
    assert_eq!(*resizes.borrow(), 0);

    // Exactly one re-evaluation, 100ms after the fifth notification.
    engine.tick(&tree, fifth + Duration::from_millis(100));
    assert_eq!(*resizes.borrow(), 1);

    // And no trailing duplicates.
    engine.tick(&tree, fifth + Duration::from_millis(300));
    assert_eq!(*resizes.borrow(), 1);
}

#[test]
fn scroll_storm_is_rate_limited() {
    let mut tree = FakeTree::new();
    let (subject, _overlay) = conflicting_pair(&mut tree);
    // 100ms throttle to make the arithmetic explicit.
    let mut engine = Engine::new(
        EngineConfig::default().with_scroll_throttle(Duration::from_millis(100)),
    );
    let t0 = Instant::now();
    let _ = engine.open(&tree, subject, Role::OverlaySelector, "picker", t0);

    let scrolls = Rc::new(RefCell::new(0));
    let scrolls_clone = Rc::clone(&scrolls);
    let _ = engine.on(EventKind::Scroll, move |_| {
        *scrolls_clone.borrow_mut() += 1;
        Ok(())
    });

    // Continuous scrolling: an event every 10ms across 500ms.
    for i in 0..=50 {
        engine.on_scroll(&tree, after(t0, i * 10));
    }

    // Leading-edge fires at 0, 100, ..., 500.
    assert_eq!(*scrolls.borrow(), 6);
}

#[test]
fn scroll_redetection_does_not_reassign_without_new_overlap() {
    let mut tree = FakeTree::new();
    let (subject, overlay) = conflicting_pair(&mut tree);
    let mut engine = Engine::default();
    let t0 = Instant::now();

    let _ = engine.open(&tree, overlay, Role::Modal, "modal", t0);
    let assigned = engine
        .open(&tree, subject, Role::OverlaySelector, "picker", after(t0, 1))
        .unwrap();
    assert_eq!(assigned, 105);
    tree.set_layer(subject, assigned);
    let resolved_so_far = engine.history().total_recorded();

    // Scrolling for a while, within the cache TTL and beyond it, finds
    // the subject already above its candidates: no reassignment.
    for i in 1..=20 {
        engine.on_scroll(&tree, after(t0, 1 + i * 20));
    }
    assert_eq!(engine.history().total_recorded(), resolved_so_far);
    assert_eq!(engine.layer(&LayerKey::from("picker")), Some(105));

    // New overlap appears: the overlay jumps above the subject.
    tree.set_layer(overlay, 300);
    engine.on_attribute(&tree, overlay, AttrChange::LAYER, after(t0, 600));

    assert_eq!(engine.layer(&LayerKey::from("picker")), Some(400));
    assert_eq!(engine.history().total_recorded(), resolved_so_far + 1);
}

#[test]
fn scroll_redetection_catches_unannounced_activation() {
    let mut tree = FakeTree::new();
    let (subject, overlay) = conflicting_pair(&mut tree);
    tree.set_visible(overlay, false);
    let mut engine = Engine::default();
    let t0 = Instant::now();

    let _ = engine.open(&tree, subject, Role::OverlaySelector, "picker", t0);
    let _ = engine.open(&tree, overlay, Role::Modal, "modal", after(t0, 1));
    // The modal is invisible: no conflict on open.
    assert_eq!(engine.layer(&LayerKey::from("picker")), Some(5));

    // The modal becomes visible without any attribute notification.
    // Activation predicates are evaluated fresh on every snapshot, so the
    // next throttled scroll re-detection sees the new active member.
    tree.set_visible(overlay, true);
    engine.on_scroll(&tree, after(t0, 30));
    assert_eq!(engine.layer(&LayerKey::from("picker")), Some(105));

    // A pending resize burst then settles without piling on another
    // assignment once the widget has applied its layer.
    engine.on_resize(&tree, after(t0, 40));
    tree.set_layer(subject, 105);
    engine.tick(&tree, after(t0, 150));
    assert_eq!(engine.layer(&LayerKey::from("picker")), Some(105));
}
