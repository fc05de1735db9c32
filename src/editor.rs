//! Shape editors: turn drag and transform gestures on scene nodes into full
//! replacement records in the registry.
//!
//! The handle resizes a node by changing its scale. Editors fold that scale
//! back into literal geometry (width/height for boxes and text, point
//! coordinates for polylines) and reset the node's scale to 1, so stored
//! records are always in unscaled units and repeated edits do not compound.
//! Every folded dimension is floored at the configured minimum size.
//!
//! Text additionally has an in-place edit mode, see [`TextEditSession`].

#[cfg(test)]
#[path = "editor_test.rs"]
mod editor_test;

use crate::geometry::{Point, points_bounds};
use crate::id::ShapeId;
use crate::input::{Key, Modifiers};
use crate::registry::ShapeRegistry;
use crate::scene::{SceneGraph, SceneNode};
use crate::shape::{PolylineShape, Shape, TextShape, text_height};

// =============================================================================
// DRAG / TRANSFORM
// =============================================================================

/// Drag end: commit the node's x/y. Every other field is carried over.
pub fn drag_end<S: SceneGraph>(registry: &mut ShapeRegistry, scene: &mut S, id: &ShapeId) -> Option<Shape> {
    let pos = scene.node(id).map(|n| Point::new(n.x, n.y))?;
    let Some(prior) = registry.find(id) else {
        tracing::debug!(%id, "drag end: no record");
        return None;
    };
    commit(registry, scene, prior.with_position(pos))
}

/// Live transform tick. Only text folds while the gesture is in progress, so
/// its glyphs reflow instead of stretching.
pub fn transform<S: SceneGraph>(
    registry: &mut ShapeRegistry,
    scene: &mut S,
    id: &ShapeId,
    floor: f64,
) -> Option<Shape> {
    match registry.find(id)? {
        Shape::Text(prior) => {
            let next = Shape::Text(fold_text(&prior, scene.node(id)?, floor));
            commit(registry, scene, next)
        }
        _ => None,
    }
}

/// Transform end: fold the node's scale into the record.
pub fn transform_end<S: SceneGraph>(
    registry: &mut ShapeRegistry,
    scene: &mut S,
    id: &ShapeId,
    floor: f64,
) -> Option<Shape> {
    let Some(prior) = registry.find(id) else {
        tracing::debug!(%id, "transform end: no record");
        return None;
    };
    let node = scene.node(id)?;
    let next = match prior {
        Shape::Rectangle(mut s) => {
            (s.x, s.y) = (node.x, node.y);
            s.width = (node.width * node.scale_x).max(floor);
            s.height = (node.height * node.scale_y).max(floor);
            Shape::Rectangle(s)
        }
        Shape::Circle(mut s) => {
            (s.x, s.y) = (node.x, node.y);
            s.width = (node.width * node.scale_x).max(floor);
            s.height = (node.height * node.scale_y).max(floor);
            Shape::Circle(s)
        }
        Shape::Image(mut s) => {
            (s.x, s.y) = (node.x, node.y);
            s.width = (node.width * node.scale_x).max(floor);
            s.height = (node.height * node.scale_y).max(floor);
            Shape::Image(s)
        }
        Shape::Line(s) => Shape::Line(fold_segment(s, node, floor)),
        Shape::Arrow(s) => Shape::Arrow(fold_segment(s, node, floor)),
        Shape::Text(s) => Shape::Text(fold_text(&s, node, floor)),
        Shape::Brush(s) => Shape::Brush(fold_stroke(s, node, floor)),
    };
    tracing::debug!(%id, kind = %next.kind(), "transform committed");
    commit(registry, scene, next)
}

/// Line and arrow resize vertically only: the second endpoint is moved so the
/// segment spans the new height below the first.
///
/// The scale applies to the height the points span, not the stored `height`,
/// which records read from older state may lack.
fn fold_segment(mut s: PolylineShape, node: &SceneNode, floor: f64) -> PolylineShape {
    let spanned = points_bounds(&s.points).height;
    let base = if spanned > 0.0 { spanned } else { node.height };
    let height = (base * node.scale_y).max(floor);
    if let [_, y1, _, y2, ..] = s.points.as_mut_slice() {
        *y2 = *y1 + height;
    }
    (s.x, s.y) = (node.x, node.y);
    s.height = height;
    s.rotation = node.rotation;
    (s.scale_x, s.scale_y) = (1.0, 1.0);
    s
}

fn fold_text(prior: &TextShape, node: &SceneNode, floor: f64) -> TextShape {
    TextShape { x: node.x, y: node.y, width: (node.width * node.scale_x).max(floor), ..prior.clone() }
}

fn fold_stroke(mut s: PolylineShape, node: &SceneNode, floor: f64) -> PolylineShape {
    for pair in s.points.chunks_exact_mut(2) {
        pair[0] *= node.scale_x;
        pair[1] *= node.scale_y;
    }
    let bounds = points_bounds(&s.points);
    (s.x, s.y) = (node.x, node.y);
    s.width = bounds.width.max(floor);
    s.height = bounds.height.max(floor);
    s.rotation = node.rotation;
    (s.scale_x, s.scale_y) = (1.0, 1.0);
    s
}

/// Write `next` and bring its node in line (scale back to 1).
fn commit<S: SceneGraph>(registry: &mut ShapeRegistry, scene: &mut S, next: Shape) -> Option<Shape> {
    if !registry.replace(next.clone()) {
        return None;
    }
    if let Some(node) = scene.node_mut(next.id()) {
        node.sync(&next);
    }
    scene.batch_draw();
    Some(next)
}

// =============================================================================
// TEXT EDIT MODE
// =============================================================================

/// Where the host should place its text input, in canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub rotation: f64,
    /// Initial content of the input.
    pub text: String,
}

/// What a key press inside the overlay means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    /// Plain input; the overlay keeps it.
    Continue,
    Commit,
    Cancel,
}

/// An in-progress text edit. While it lives, the text node and the handle
/// are hidden and the host shows an input overlay instead.
#[derive(Debug, Clone)]
pub struct TextEditSession {
    id: ShapeId,
    original: TextShape,
    draft: String,
}

impl TextEditSession {
    /// Enter edit mode for the text shape `id`.
    pub fn begin<S: SceneGraph>(
        registry: &ShapeRegistry,
        scene: &mut S,
        id: &ShapeId,
    ) -> Option<(Self, OverlayLayout)> {
        let Some(Shape::Text(original)) = registry.find(id) else {
            tracing::debug!(%id, "edit mode: not a text shape");
            return None;
        };
        let node = scene.node_mut(id)?;
        node.visible = false;
        let rotation = node.rotation;
        scene.handle_mut().hide();
        scene.batch_draw();

        let layout = OverlayLayout {
            x: original.x,
            y: original.y,
            width: original.width,
            height: text_height(&original),
            font_size: original.font_size,
            rotation,
            text: original.text.clone(),
        };
        let session = Self { id: id.clone(), draft: original.text.clone(), original };
        Some((session, layout))
    }

    #[must_use]
    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// The overlay's current content.
    pub fn input(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Enter without Shift commits, Escape cancels.
    #[must_use]
    pub fn classify(key: &Key, modifiers: Modifiers) -> EditKey {
        if key.is_enter() && !modifiers.shift {
            EditKey::Commit
        } else if key.is_escape() {
            EditKey::Cancel
        } else {
            EditKey::Continue
        }
    }

    /// Write the draft into the record and leave edit mode.
    pub fn commit<S: SceneGraph>(self, registry: &mut ShapeRegistry, scene: &mut S) -> Option<Shape> {
        let next = Shape::Text(TextShape { text: self.draft.clone(), ..self.original.clone() });
        let committed = if registry.replace(next.clone()) {
            if let Some(node) = scene.node_mut(&self.id) {
                node.sync(&next);
            }
            Some(next)
        } else {
            tracing::debug!(id = %self.id, "text commit: record gone");
            None
        };
        self.finish(scene);
        committed
    }

    /// Discard the draft and leave edit mode.
    pub fn cancel<S: SceneGraph>(self, scene: &mut S) {
        self.finish(scene);
    }

    fn finish<S: SceneGraph>(&self, scene: &mut S) {
        if let Some(node) = scene.node_mut(&self.id) {
            node.visible = true;
        }
        let handle = scene.handle_mut();
        handle.show();
        handle.force_update();
        scene.batch_draw();
    }
}
