//! Shape registry: the canonical, kind-grouped collection of shape records.
//!
//! Each kind lives in its own `Arc<Vec<_>>`. Writes never splice a live
//! collection; they build a new vector and swap the `Arc`, so a consumer
//! holding the previous `Arc` can detect the change with [`Arc::ptr_eq`].
//! Every write also bumps [`ShapeRegistry::revision`], which the engine uses
//! to decide when the persistence snapshot is stale.
//!
//! Kind dispatch is a `match` over [`ShapeKind`]: `get_kind` / `set_kind`
//! resolve to the typed accessor pair for that kind at compile time.

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::id::{ShapeId, ShapeKind};
use crate::shape::{BoxShape, ImageShape, PolylineShape, Shape, TextShape};

/// Owned kind → records mapping, as persisted under the shapes key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeSnapshot {
    #[serde(default)]
    pub arrows: Vec<PolylineShape>,
    #[serde(default)]
    pub circles: Vec<BoxShape>,
    #[serde(default)]
    pub images: Vec<ImageShape>,
    #[serde(default)]
    pub lines: Vec<PolylineShape>,
    #[serde(default)]
    pub rectangles: Vec<BoxShape>,
    #[serde(default)]
    pub texts: Vec<TextShape>,
    #[serde(default)]
    pub brushes: Vec<PolylineShape>,
}

impl ShapeSnapshot {
    /// Total number of records across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arrows.len()
            + self.circles.len()
            + self.images.len()
            + self.lines.len()
            + self.rectangles.len()
            + self.texts.len()
            + self.brushes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Copy-on-write store of every shape on the board.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    arrows: Arc<Vec<PolylineShape>>,
    circles: Arc<Vec<BoxShape>>,
    images: Arc<Vec<ImageShape>>,
    lines: Arc<Vec<PolylineShape>>,
    rectangles: Arc<Vec<BoxShape>>,
    texts: Arc<Vec<TextShape>>,
    brushes: Arc<Vec<PolylineShape>>,
    revision: u64,
}

macro_rules! collection_accessors {
    ($($field:ident, $setter:ident: $ty:ty;)*) => {
        $(
            #[must_use]
            pub fn $field(&self) -> &Arc<Vec<$ty>> {
                &self.$field
            }

            pub fn $setter(&mut self, records: Vec<$ty>) {
                self.$field = Arc::new(records);
                self.revision += 1;
            }
        )*
    };
}

impl ShapeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a persisted snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: ShapeSnapshot) -> Self {
        let mut registry = Self::new();
        registry.load(snapshot);
        registry
    }

    collection_accessors! {
        arrows, set_arrows: PolylineShape;
        circles, set_circles: BoxShape;
        images, set_images: ImageShape;
        lines, set_lines: PolylineShape;
        rectangles, set_rectangles: BoxShape;
        texts, set_texts: TextShape;
        brushes, set_brushes: PolylineShape;
    }

    /// Monotonic write counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Owned copy of every collection.
    #[must_use]
    pub fn get_all(&self) -> ShapeSnapshot {
        ShapeSnapshot {
            arrows: self.arrows.to_vec(),
            circles: self.circles.to_vec(),
            images: self.images.to_vec(),
            lines: self.lines.to_vec(),
            rectangles: self.rectangles.to_vec(),
            texts: self.texts.to_vec(),
            brushes: self.brushes.to_vec(),
        }
    }

    /// Replace every collection at once (a single revision bump).
    pub fn load(&mut self, snapshot: ShapeSnapshot) {
        self.arrows = Arc::new(snapshot.arrows);
        self.circles = Arc::new(snapshot.circles);
        self.images = Arc::new(snapshot.images);
        self.lines = Arc::new(snapshot.lines);
        self.rectangles = Arc::new(snapshot.rectangles);
        self.texts = Arc::new(snapshot.texts);
        self.brushes = Arc::new(snapshot.brushes);
        self.revision += 1;
    }

    /// Empty every collection.
    pub fn clear(&mut self) {
        self.load(ShapeSnapshot::default());
    }

    /// The records of one kind, tagged.
    #[must_use]
    pub fn get_kind(&self, kind: ShapeKind) -> Vec<Shape> {
        match kind {
            ShapeKind::Rectangle => self.rectangles.iter().cloned().map(Shape::Rectangle).collect(),
            ShapeKind::Circle => self.circles.iter().cloned().map(Shape::Circle).collect(),
            ShapeKind::Image => self.images.iter().cloned().map(Shape::Image).collect(),
            ShapeKind::Line => self.lines.iter().cloned().map(Shape::Line).collect(),
            ShapeKind::Arrow => self.arrows.iter().cloned().map(Shape::Arrow).collect(),
            ShapeKind::Text => self.texts.iter().cloned().map(Shape::Text).collect(),
            ShapeKind::Brush => self.brushes.iter().cloned().map(Shape::Brush).collect(),
        }
    }

    /// Replace the whole collection of one kind. Records of another kind are
    /// dropped with a warning.
    pub fn set_kind(&mut self, kind: ShapeKind, shapes: Vec<Shape>) {
        match kind {
            ShapeKind::Rectangle => {
                let records = typed(kind, shapes, |s| match s {
                    Shape::Rectangle(r) => Ok(r),
                    other => Err(other),
                });
                self.set_rectangles(records);
            }
            ShapeKind::Circle => {
                let records = typed(kind, shapes, |s| match s {
                    Shape::Circle(r) => Ok(r),
                    other => Err(other),
                });
                self.set_circles(records);
            }
            ShapeKind::Image => {
                let records = typed(kind, shapes, |s| match s {
                    Shape::Image(r) => Ok(r),
                    other => Err(other),
                });
                self.set_images(records);
            }
            ShapeKind::Line => {
                let records = typed(kind, shapes, |s| match s {
                    Shape::Line(r) => Ok(r),
                    other => Err(other),
                });
                self.set_lines(records);
            }
            ShapeKind::Arrow => {
                let records = typed(kind, shapes, |s| match s {
                    Shape::Arrow(r) => Ok(r),
                    other => Err(other),
                });
                self.set_arrows(records);
            }
            ShapeKind::Text => {
                let records = typed(kind, shapes, |s| match s {
                    Shape::Text(r) => Ok(r),
                    other => Err(other),
                });
                self.set_texts(records);
            }
            ShapeKind::Brush => {
                let records = typed(kind, shapes, |s| match s {
                    Shape::Brush(r) => Ok(r),
                    other => Err(other),
                });
                self.set_brushes(records);
            }
        }
    }

    /// Append a record to the end of its kind's collection.
    pub fn insert(&mut self, shape: Shape) {
        let kind = shape.kind();
        let mut shapes = self.get_kind(kind);
        shapes.push(shape);
        self.set_kind(kind, shapes);
    }

    /// Swap in a full replacement record with the same id. Returns `false`
    /// when no record of that kind has the id.
    pub fn replace(&mut self, shape: Shape) -> bool {
        let kind = shape.kind();
        let mut shapes = self.get_kind(kind);
        let Some(slot) = shapes.iter_mut().find(|s| s.id() == shape.id()) else {
            return false;
        };
        *slot = shape;
        self.set_kind(kind, shapes);
        true
    }

    /// Remove the record with `id` from `kind`'s collection.
    pub fn remove(&mut self, kind: ShapeKind, id: &ShapeId) -> Option<Shape> {
        let mut shapes = self.get_kind(kind);
        let idx = shapes.iter().position(|s| s.id() == id)?;
        let removed = shapes.remove(idx);
        self.set_kind(kind, shapes);
        Some(removed)
    }

    /// Find a record by id, searching kinds in deletion priority order.
    #[must_use]
    pub fn find(&self, id: &ShapeId) -> Option<Shape> {
        ShapeKind::SEARCH_ORDER
            .into_iter()
            .find_map(|kind| self.get_kind(kind).into_iter().find(|s| s.id() == id))
    }

    /// Whether any collection holds `id`.
    #[must_use]
    pub fn contains(&self, id: &ShapeId) -> bool {
        self.find(id).is_some()
    }

    /// Every record in projection order (kind by kind, insertion order within
    /// a kind).
    #[must_use]
    pub fn all_shapes(&self) -> Vec<Shape> {
        ShapeKind::RENDER_ORDER.into_iter().flat_map(|kind| self.get_kind(kind)).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.arrows.len()
            + self.circles.len()
            + self.images.len()
            + self.lines.len()
            + self.rectangles.len()
            + self.texts.len()
            + self.brushes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn typed<T>(kind: ShapeKind, shapes: Vec<Shape>, pick: impl Fn(Shape) -> Result<T, Shape>) -> Vec<T> {
    shapes
        .into_iter()
        .filter_map(|shape| match pick(shape) {
            Ok(record) => Some(record),
            Err(other) => {
                tracing::warn!(id = %other.id(), expected = %kind, found = %other.kind(), "dropping misfiled shape");
                None
            }
        })
        .collect()
}
