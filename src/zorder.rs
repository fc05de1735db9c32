//! Z-order coordination.
//!
//! Stacking lives only in the scene's sibling order; the registry knows
//! nothing about it. The persisted form is the flat id list returned by
//! [`snapshot`], replayed by [`restore`] on load.
//!
//! The transform handle is itself a sibling and sits directly above the
//! selected node, so "one step" means one step past the next *shape*
//! sibling, skipping the handle. After every move the handle is re-seated
//! above its target.

#[cfg(test)]
#[path = "zorder_test.rs"]
mod zorder_test;

use crate::id::ShapeId;
use crate::scene::{NodeKey, SceneGraph};
use crate::selection::seat_handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOp {
    BringForward,
    BringToFront,
    SendBackward,
    SendToBack,
}

/// Apply `op` to `id`. Returns `false` when the node is missing or the order
/// did not change.
pub fn apply<S: SceneGraph>(scene: &mut S, id: &ShapeId, op: ZOp) -> bool {
    match op {
        ZOp::BringForward => bring_forward(scene, id),
        ZOp::BringToFront => bring_to_front(scene, id),
        ZOp::SendBackward => send_backward(scene, id),
        ZOp::SendToBack => send_to_back(scene, id),
    }
}

/// Move `id` above the next shape sibling.
pub fn bring_forward<S: SceneGraph>(scene: &mut S, id: &ShapeId) -> bool {
    let key = NodeKey::Shape(id.clone());
    let order = scene.order();
    let Some(pos) = order.iter().position(|k| *k == key) else {
        return miss(id);
    };
    let Some(next) = order[pos + 1..].iter().find(|k| k.as_shape().is_some()).cloned() else {
        return false;
    };
    step_past(scene, &key, &next, Direction::Up);
    finish(scene, id)
}

pub fn bring_to_front<S: SceneGraph>(scene: &mut S, id: &ShapeId) -> bool {
    let key = NodeKey::Shape(id.clone());
    if scene.index_of(&key).is_none() {
        return miss(id);
    }
    if scene.shape_order().last() == Some(id) {
        return false;
    }
    scene.move_to_top(&key);
    finish(scene, id)
}

/// Move `id` below the previous shape sibling.
pub fn send_backward<S: SceneGraph>(scene: &mut S, id: &ShapeId) -> bool {
    let key = NodeKey::Shape(id.clone());
    let order = scene.order();
    let Some(pos) = order.iter().position(|k| *k == key) else {
        return miss(id);
    };
    let Some(prev) = order[..pos].iter().rev().find(|k| k.as_shape().is_some()).cloned() else {
        return false;
    };
    step_past(scene, &key, &prev, Direction::Down);
    finish(scene, id)
}

pub fn send_to_back<S: SceneGraph>(scene: &mut S, id: &ShapeId) -> bool {
    let key = NodeKey::Shape(id.clone());
    if scene.index_of(&key).is_none() {
        return miss(id);
    }
    if scene.shape_order().first() == Some(id) {
        return false;
    }
    scene.move_to_bottom(&key);
    finish(scene, id)
}

/// Shape ids bottom to top, for persistence.
#[must_use]
pub fn snapshot<S: SceneGraph>(scene: &S) -> Vec<ShapeId> {
    scene.shape_order()
}

/// Replay a persisted order by raising each id to the top in turn. Ids with
/// no node are skipped.
pub fn restore<S: SceneGraph>(scene: &mut S, ids: &[ShapeId]) {
    let mut restored = 0usize;
    for id in ids {
        if scene.move_to_top(&NodeKey::Shape(id.clone())) {
            restored += 1;
        }
    }
    if let Some(target) = scene.handle().target().cloned() {
        seat_handle(scene, &target);
    }
    tracing::debug!(restored, persisted = ids.len(), "z-order restored");
}

#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}

/// Swap `key` one sibling at a time until it has passed `other`.
fn step_past<S: SceneGraph>(scene: &mut S, key: &NodeKey, other: &NodeKey, dir: Direction) {
    while let (Some(a), Some(b)) = (scene.index_of(key), scene.index_of(other)) {
        let moved = match dir {
            Direction::Up if a < b => scene.move_up(key),
            Direction::Down if a > b => scene.move_down(key),
            Direction::Up | Direction::Down => false,
        };
        if !moved {
            return;
        }
    }
}

fn finish<S: SceneGraph>(scene: &mut S, id: &ShapeId) -> bool {
    if scene.handle().is_attached_to(id) {
        seat_handle(scene, id);
    }
    scene.batch_draw();
    true
}

fn miss(id: &ShapeId) -> bool {
    tracing::debug!(%id, "z-order: no such node");
    false
}
