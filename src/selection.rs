//! Selection and transform coordination.
//!
//! At most one shape is selected. Selecting attaches the shared
//! [`TransformHandle`](crate::handle::TransformHandle) to the node, picks the
//! anchor set for the node's kind and seats the handle directly above the
//! node in sibling order so it is drawn over its target and nothing else
//! covers it.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use crate::id::ShapeId;
use crate::scene::{NodeKey, SceneGraph};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<ShapeId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&ShapeId> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn is_selected(&self, id: &ShapeId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    /// Attach the handle to `id`. Returns `false` (and leaves the selection
    /// alone) when the scene has no such node.
    pub fn select<S: SceneGraph>(&mut self, scene: &mut S, id: &ShapeId) -> bool {
        let Some(kind) = scene.node(id).map(|n| n.kind) else {
            tracing::debug!(%id, "select: no such node");
            return false;
        };
        let handle = scene.handle_mut();
        handle.detach();
        handle.attach(id.clone(), kind);
        seat_handle(scene, id);
        self.selected = Some(id.clone());
        scene.batch_draw();
        true
    }

    /// Detach the handle and clear the selection.
    pub fn deselect<S: SceneGraph>(&mut self, scene: &mut S) {
        scene.handle_mut().detach();
        if self.selected.take().is_some() {
            scene.batch_draw();
        }
    }

    /// Forget the selection without touching the scene. Used when the
    /// selected node has already been destroyed.
    pub fn forget(&mut self) {
        self.selected = None;
    }
}

/// Move the handle so it sits immediately above `id` in sibling order.
pub fn seat_handle<S: SceneGraph>(scene: &mut S, id: &ShapeId) {
    let target = NodeKey::Shape(id.clone());
    if scene.index_of(&target).is_none() {
        return;
    }
    scene.move_to_top(&NodeKey::Handle);
    while let (Some(handle), Some(node)) = (scene.index_of(&NodeKey::Handle), scene.index_of(&target)) {
        if handle == node + 1 || !scene.move_down(&NodeKey::Handle) {
            break;
        }
    }
}
