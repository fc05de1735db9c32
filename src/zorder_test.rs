use super::*;
use crate::handle::FloorMode;
use crate::scene::{MemoryScene, SceneNode};
use crate::selection::Selection;
use crate::shape::{BoxShape, Shape};

// =============================================================
// Helpers
// =============================================================

fn rect(raw: &str) -> Shape {
    Shape::Rectangle(BoxShape { id: raw.into(), x: 0.0, y: 0.0, width: 80.0, height: 80.0, fill: "red".into() })
}

fn scene_of(raws: &[&str]) -> MemoryScene {
    let mut s = MemoryScene::new(50.0, FloorMode::Clamp);
    for raw in raws {
        s.create_node(SceneNode::from_shape(&rect(raw)));
    }
    s
}

fn ids(raws: &[&str]) -> Vec<ShapeId> {
    raws.iter().map(|r| ShapeId::from(*r)).collect()
}

fn selected(s: &mut MemoryScene, raw: &str) -> ShapeId {
    let id = ShapeId::from(raw);
    Selection::new().select(s, &id);
    id
}

fn handle_above(s: &MemoryScene, id: &ShapeId) -> bool {
    let order = s.order();
    let h = order.iter().position(|k| *k == NodeKey::Handle);
    let n = order.iter().position(|k| k.as_shape() == Some(id));
    matches!((h, n), (Some(h), Some(n)) if h == n + 1)
}

// =============================================================
// Single steps
// =============================================================

#[test]
fn bring_forward_passes_next_shape() {
    // R1 created before C1, so R1 starts below.
    let mut s = scene_of(&["rect~r1", "circle~c1"]);
    let r1 = selected(&mut s, "rect~r1");

    assert!(bring_forward(&mut s, &r1));
    assert_eq!(snapshot(&s), ids(&["circle~c1", "rect~r1"]));
    assert!(handle_above(&s, &r1));
}

#[test]
fn bring_forward_moves_exactly_one_shape() {
    let mut s = scene_of(&["rect~a", "rect~b", "rect~c"]);
    let a = selected(&mut s, "rect~a");

    bring_forward(&mut s, &a);
    assert_eq!(snapshot(&s), ids(&["rect~b", "rect~a", "rect~c"]));
}

#[test]
fn send_backward_passes_previous_shape() {
    let mut s = scene_of(&["rect~a", "rect~b", "rect~c"]);
    let c = selected(&mut s, "rect~c");

    assert!(send_backward(&mut s, &c));
    assert_eq!(snapshot(&s), ids(&["rect~a", "rect~c", "rect~b"]));
    assert!(handle_above(&s, &c));
}

#[test]
fn unselected_shape_moves_without_handle() {
    let mut s = scene_of(&["rect~a", "rect~b"]);
    assert!(bring_forward(&mut s, &"rect~a".into()));
    assert_eq!(snapshot(&s), ids(&["rect~b", "rect~a"]));
}

// =============================================================
// Extremes
// =============================================================

#[test]
fn bring_to_front_raises_above_all() {
    let mut s = scene_of(&["rect~a", "rect~b", "rect~c"]);
    let a = selected(&mut s, "rect~a");

    assert!(bring_to_front(&mut s, &a));
    assert_eq!(snapshot(&s), ids(&["rect~b", "rect~c", "rect~a"]));
    assert_eq!(s.order().last(), Some(&NodeKey::Handle));
}

#[test]
fn send_to_back_lowers_below_all() {
    let mut s = scene_of(&["rect~a", "rect~b", "rect~c"]);
    let c = selected(&mut s, "rect~c");

    assert!(send_to_back(&mut s, &c));
    assert_eq!(snapshot(&s), ids(&["rect~c", "rect~a", "rect~b"]));
    assert!(handle_above(&s, &c));
}

#[test]
fn boundary_operations_are_idempotent() {
    let mut s = scene_of(&["rect~a", "rect~b", "rect~c"]);
    let before = snapshot(&s);

    assert!(!send_to_back(&mut s, &"rect~a".into()));
    assert!(!bring_to_front(&mut s, &"rect~c".into()));
    assert!(!send_backward(&mut s, &"rect~a".into()));
    assert!(!bring_forward(&mut s, &"rect~c".into()));
    assert_eq!(snapshot(&s), before);
}

#[test]
fn missing_node_is_a_silent_no_op() {
    let mut s = scene_of(&["rect~a"]);
    let before = s.order();
    for op in [ZOp::BringForward, ZOp::BringToFront, ZOp::SendBackward, ZOp::SendToBack] {
        assert!(!apply(&mut s, &"rect~gone".into(), op));
    }
    assert_eq!(s.order(), before);
}

// =============================================================
// Persistence
// =============================================================

#[test]
fn restore_replays_persisted_order() {
    let mut s = scene_of(&["rect~a", "rect~b", "rect~c"]);
    restore(&mut s, &ids(&["rect~c", "rect~a", "rect~b"]));
    assert_eq!(snapshot(&s), ids(&["rect~c", "rect~a", "rect~b"]));
}

#[test]
fn restore_skips_unknown_ids() {
    let mut s = scene_of(&["rect~a", "rect~b"]);
    restore(&mut s, &ids(&["rect~b", "rect~ghost", "rect~a"]));
    assert_eq!(snapshot(&s), ids(&["rect~b", "rect~a"]));
}

#[test]
fn restore_keeps_handle_on_its_target() {
    let mut s = scene_of(&["rect~a", "rect~b"]);
    let a = selected(&mut s, "rect~a");
    restore(&mut s, &ids(&["rect~b", "rect~a"]));
    assert!(handle_above(&s, &a));
}
