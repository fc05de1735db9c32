//! Deletion coordinator.
//!
//! Only the forward-delete key deletes, and only while something is
//! selected. Kinds are searched in a fixed order and the first hit wins; an
//! id carries its kind tag, so at most one collection can hold it.

#[cfg(test)]
#[path = "deletion_test.rs"]
mod deletion_test;

use crate::id::ShapeKind;
use crate::input::Key;
use crate::registry::ShapeRegistry;
use crate::scene::SceneGraph;
use crate::selection::Selection;
use crate::shape::Shape;

/// Handle a key press. Returns the removed record, if any.
pub fn on_key<S: SceneGraph>(
    key: &Key,
    selection: &mut Selection,
    registry: &mut ShapeRegistry,
    scene: &mut S,
) -> Option<Shape> {
    if !key.is_delete() {
        return None;
    }
    delete_selected(selection, registry, scene)
}

/// Remove the selected shape from whichever collection holds it.
pub fn delete_selected<S: SceneGraph>(
    selection: &mut Selection,
    registry: &mut ShapeRegistry,
    scene: &mut S,
) -> Option<Shape> {
    let id = selection.selected()?.clone();
    let Some(removed) = ShapeKind::SEARCH_ORDER.into_iter().find_map(|kind| registry.remove(kind, &id)) else {
        tracing::debug!(%id, "delete: id not in any collection");
        return None;
    };

    // Brush nodes are not re-projected, so the scene has to be told.
    if removed.kind() == ShapeKind::Brush {
        scene.handle_mut().detach();
        scene.destroy_node(&id);
    }
    selection.deselect(scene);
    scene.batch_draw();
    tracing::info!(%id, kind = %removed.kind(), "shape deleted");
    Some(removed)
}
