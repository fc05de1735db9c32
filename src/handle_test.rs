#![allow(clippy::float_cmp)]

use super::*;

fn handle(mode: FloorMode) -> TransformHandle {
    TransformHandle::new(50.0, mode)
}

fn id(raw: &str) -> ShapeId {
    ShapeId::from_raw(raw)
}

// =============================================================
// Anchors
// =============================================================

#[test]
fn box_kinds_enable_all_eight_anchors() {
    for kind in [ShapeKind::Rectangle, ShapeKind::Circle, ShapeKind::Image, ShapeKind::Brush] {
        assert_eq!(ResizeAnchor::for_kind(kind).len(), 8);
    }
}

#[test]
fn line_and_arrow_resize_vertically_only() {
    for kind in [ShapeKind::Line, ShapeKind::Arrow] {
        let anchors = ResizeAnchor::for_kind(kind);
        assert_eq!(anchors, &[ResizeAnchor::N, ResizeAnchor::S]);
        assert!(anchors.iter().all(|a| !a.resizes_width()));
    }
}

#[test]
fn text_resizes_horizontally_only() {
    let anchors = ResizeAnchor::for_kind(ShapeKind::Text);
    assert_eq!(anchors, &[ResizeAnchor::W, ResizeAnchor::E]);
    assert!(anchors.iter().all(|a| !a.resizes_height()));
}

#[test]
fn corner_anchors_resize_both_axes() {
    for a in [ResizeAnchor::Ne, ResizeAnchor::Se, ResizeAnchor::Sw, ResizeAnchor::Nw] {
        assert!(a.resizes_width() && a.resizes_height());
    }
}

// =============================================================
// BoxConstraint
// =============================================================

#[test]
fn clamp_raises_small_dimensions_to_floor() {
    let c = BoxConstraint::for_kind(ShapeKind::Rectangle, 50.0, FloorMode::Clamp);
    let old = BoundBox::new(10.0, 10.0, 100.0, 100.0);
    let out = c.apply(old, BoundBox::new(10.0, 10.0, 20.0, 20.0));
    assert_eq!((out.width, out.height), (50.0, 50.0));
}

#[test]
fn clamp_only_touches_offending_dimension() {
    let c = BoxConstraint::for_kind(ShapeKind::Rectangle, 50.0, FloorMode::Clamp);
    let old = BoundBox::new(0.0, 0.0, 100.0, 100.0);
    let out = c.apply(old, BoundBox::new(0.0, 0.0, 80.0, 10.0));
    assert_eq!((out.width, out.height), (80.0, 50.0));
}

#[test]
fn reject_keeps_previous_box() {
    let c = BoxConstraint::for_kind(ShapeKind::Circle, 50.0, FloorMode::Reject);
    let old = BoundBox::new(0.0, 0.0, 100.0, 100.0);
    assert_eq!(c.apply(old, BoundBox::new(5.0, 5.0, 49.0, 100.0)), old);
}

#[test]
fn box_at_floor_is_accepted() {
    let c = BoxConstraint::for_kind(ShapeKind::Image, 50.0, FloorMode::Reject);
    let proposed = BoundBox::new(0.0, 0.0, 50.0, 50.0);
    assert_eq!(c.apply(BoundBox::default(), proposed), proposed);
}

#[test]
fn line_constraint_ignores_width() {
    let c = BoxConstraint::for_kind(ShapeKind::Line, 50.0, FloorMode::Reject);
    let proposed = BoundBox::new(0.0, 0.0, 0.0, 60.0);
    assert_eq!(c.apply(BoundBox::default(), proposed), proposed);
}

#[test]
fn text_constraint_ignores_height() {
    let c = BoxConstraint::for_kind(ShapeKind::Text, 50.0, FloorMode::Reject);
    let proposed = BoundBox::new(0.0, 0.0, 60.0, 20.0);
    assert_eq!(c.apply(BoundBox::default(), proposed), proposed);
}

// =============================================================
// Attach / detach
// =============================================================

#[test]
fn new_handle_has_no_nodes() {
    let h = handle(FloorMode::Clamp);
    assert!(h.nodes().is_empty());
    assert!(h.is_visible());
}

#[test]
fn attach_sets_single_node_and_kind_anchors() {
    let mut h = handle(FloorMode::Clamp);
    h.attach(id("text~1"), ShapeKind::Text);
    assert_eq!(h.nodes(), &[id("text~1")]);
    assert_eq!(h.enabled_anchors(), &ResizeAnchor::HORIZONTAL);
    assert!(h.constraint().width && !h.constraint().height);
}

#[test]
fn reattach_replaces_node() {
    let mut h = handle(FloorMode::Clamp);
    h.attach(id("rect~1"), ShapeKind::Rectangle);
    h.attach(id("rect~2"), ShapeKind::Rectangle);
    assert_eq!(h.nodes().len(), 1);
    assert!(h.is_attached_to(&id("rect~2")));
    assert!(!h.is_attached_to(&id("rect~1")));
}

#[test]
fn detach_clears_nodes_and_bumps_revision_once() {
    let mut h = handle(FloorMode::Clamp);
    h.attach(id("rect~1"), ShapeKind::Rectangle);
    let rev = h.revision();
    h.detach();
    assert!(h.nodes().is_empty());
    assert_eq!(h.revision(), rev + 1);
    h.detach();
    assert_eq!(h.revision(), rev + 1);
}

#[test]
fn attach_keeps_configured_floor_mode() {
    let mut h = handle(FloorMode::Reject);
    h.attach(id("line~1"), ShapeKind::Line);
    assert_eq!(h.constraint().mode, FloorMode::Reject);
    assert_eq!(h.constraint().floor, 50.0);
}

// =============================================================
// constrain
// =============================================================

#[test]
fn constrain_masks_width_for_line() {
    let mut h = handle(FloorMode::Clamp);
    h.attach(id("line~1"), ShapeKind::Line);
    let old = BoundBox::new(0.0, 0.0, 100.0, 100.0);
    let out = h.constrain(old, BoundBox::new(10.0, 0.0, 300.0, 120.0));
    assert_eq!((out.x, out.width, out.height), (0.0, 100.0, 120.0));
}

#[test]
fn constrain_masks_height_for_text() {
    let mut h = handle(FloorMode::Clamp);
    h.attach(id("text~1"), ShapeKind::Text);
    let old = BoundBox::new(0.0, 0.0, 200.0, 20.0);
    let out = h.constrain(old, BoundBox::new(0.0, 0.0, 10.0, 400.0));
    assert_eq!((out.width, out.height), (50.0, 20.0));
}

#[test]
fn constrain_clamps_rectangle_scenario() {
    let mut h = handle(FloorMode::Clamp);
    h.attach(id("rect~1"), ShapeKind::Rectangle);
    let old = BoundBox::new(10.0, 10.0, 100.0, 100.0);
    let out = h.constrain(old, BoundBox::new(10.0, 10.0, 20.0, 20.0));
    assert_eq!((out.width, out.height), (50.0, 50.0));
}

// =============================================================
// Visibility
// =============================================================

#[test]
fn hide_show_and_force_update() {
    let mut h = handle(FloorMode::Clamp);
    h.hide();
    assert!(!h.is_visible());
    h.show();
    assert!(h.is_visible());
    let rev = h.revision();
    h.force_update();
    assert_eq!(h.revision(), rev + 1);
}
