//! Scene-graph collaborator: the retained-mode node tree the board is drawn
//! from.
//!
//! The core never draws. It talks to the renderer through [`SceneGraph`]:
//! create/sync/destroy nodes, reorder siblings, hit-test, manage the shared
//! [`TransformHandle`], and subscribe to surface-level pointer events.
//! [`MemoryScene`] is the in-process implementation used by tests and the
//! CLI; a browser host backs the trait with its canvas library.
//!
//! Sibling order runs bottom to top. The transform handle is a sibling like
//! any other node ([`NodeKey::Handle`]), which is why z-order operations have
//! to step around it.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashMap;

use crate::consts::STROKE_HIT_SLOP_PX;
use crate::error::SceneError;
use crate::geometry::{BoundBox, Point, points_bounds};
use crate::handle::{FloorMode, TransformHandle};
use crate::id::{ShapeId, ShapeKind};
use crate::shape::{Shape, text_height};

// =============================================================================
// TYPES
// =============================================================================

/// A sibling in the scene's draw order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Shape(ShapeId),
    Handle,
}

impl NodeKey {
    #[must_use]
    pub fn as_shape(&self) -> Option<&ShapeId> {
        match self {
            Self::Shape(id) => Some(id),
            Self::Handle => None,
        }
    }
}

/// Surface-level events the stroke engine subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceEvent {
    PointerDown,
    PointerMove,
    PointerUp,
    Click,
}

/// Paint attributes of a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeStyle {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub text: Option<String>,
    pub font_size: f64,
    pub image_url: Option<String>,
}

/// A renderable node.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub points: Vec<f64>,
    pub style: NodeStyle,
    pub visible: bool,
    /// Whether click/drag/transform handlers are attached.
    pub interactive: bool,
}

impl SceneNode {
    /// Project a record into a new, interactive node.
    #[must_use]
    pub fn from_shape(shape: &Shape) -> Self {
        let mut node = Self {
            id: shape.id().clone(),
            kind: shape.kind(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            points: Vec::new(),
            style: NodeStyle::default(),
            visible: true,
            interactive: true,
        };
        node.sync(shape);
        node
    }

    /// A transient, non-interactive stroke seeded with a single point.
    #[must_use]
    pub fn stroke(id: ShapeId, start: Point, color: &str, width: f64) -> Self {
        Self {
            id,
            kind: ShapeKind::Brush,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            points: vec![start.x, start.y],
            style: NodeStyle { stroke: Some(color.to_owned()), stroke_width: width, ..NodeStyle::default() },
            visible: true,
            interactive: false,
        }
    }

    /// Overwrite geometry and paint from `shape`. Visibility and
    /// interactivity are left alone.
    pub fn sync(&mut self, shape: &Shape) {
        match shape {
            Shape::Rectangle(s) | Shape::Circle(s) => {
                self.set_geometry(s.x, s.y, s.width, s.height);
                self.style = NodeStyle { fill: Some(s.fill.clone()), ..NodeStyle::default() };
            }
            Shape::Image(s) => {
                self.set_geometry(s.x, s.y, s.width, s.height);
                self.style = NodeStyle {
                    fill: Some(s.fill.clone()),
                    image_url: Some(s.image_url.clone()),
                    ..NodeStyle::default()
                };
            }
            Shape::Line(s) | Shape::Arrow(s) | Shape::Brush(s) => {
                self.set_geometry(s.x, s.y, s.width, s.height);
                self.points.clone_from(&s.points);
                self.rotation = s.rotation;
                self.scale_x = s.scale_x;
                self.scale_y = s.scale_y;
                self.style = NodeStyle {
                    stroke: Some(s.stroke.clone()),
                    stroke_width: s.stroke_width,
                    ..NodeStyle::default()
                };
            }
            Shape::Text(s) => {
                self.set_geometry(s.x, s.y, s.width, text_height(s));
                self.style = NodeStyle {
                    text: Some(s.text.clone()),
                    font_size: s.font_size,
                    ..NodeStyle::default()
                };
            }
        }
    }

    fn set_geometry(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self.rotation = 0.0;
        self.scale_x = 1.0;
        self.scale_y = 1.0;
    }

    /// Drawn box in canvas coordinates (rotation not applied).
    #[must_use]
    pub fn bounds(&self) -> BoundBox {
        let (w, h) = (self.width * self.scale_x, self.height * self.scale_y);
        let mut b = match self.kind {
            ShapeKind::Line | ShapeKind::Arrow | ShapeKind::Brush => {
                let local = points_bounds(&self.points);
                BoundBox::new(
                    self.x + local.x * self.scale_x,
                    self.y + local.y * self.scale_y,
                    local.width * self.scale_x,
                    local.height * self.scale_y,
                )
            }
            ShapeKind::Circle => BoundBox::new(self.x - w / 2.0, self.y - h / 2.0, w, h),
            ShapeKind::Rectangle | ShapeKind::Image | ShapeKind::Text => BoundBox::new(self.x, self.y, w, h),
        };
        b.rotation = self.rotation;
        b
    }

    /// Apply a box accepted by the transform handle the way the handle does:
    /// position moves, size changes become scale factors.
    pub fn apply_box(&mut self, accepted: BoundBox) {
        let local = points_bounds(&self.points);
        let (base_w, base_h) = match self.kind {
            ShapeKind::Line | ShapeKind::Arrow | ShapeKind::Brush => (local.width, local.height),
            _ => (self.width, self.height),
        };
        // A zero-extent base cannot be scaled; take the accepted size as-is.
        if base_w > 0.0 {
            self.scale_x = accepted.width / base_w;
        } else {
            self.width = accepted.width;
        }
        if base_h > 0.0 {
            self.scale_y = accepted.height / base_h;
        } else {
            self.height = accepted.height;
        }
        match self.kind {
            ShapeKind::Line | ShapeKind::Arrow | ShapeKind::Brush => {
                self.x = accepted.x - local.x * self.scale_x;
                self.y = accepted.y - local.y * self.scale_y;
            }
            ShapeKind::Circle => {
                self.x = accepted.x + accepted.width / 2.0;
                self.y = accepted.y + accepted.height / 2.0;
            }
            ShapeKind::Rectangle | ShapeKind::Image | ShapeKind::Text => {
                self.x = accepted.x;
                self.y = accepted.y;
            }
        }
        self.rotation = accepted.rotation;
    }

    /// Whether `pt` falls on the drawn node.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        match self.kind {
            ShapeKind::Line | ShapeKind::Arrow | ShapeKind::Brush => self.stroke_contains(pt),
            ShapeKind::Circle => {
                let b = self.bounds();
                let (rx, ry) = (b.width / 2.0, b.height / 2.0);
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let (dx, dy) = ((pt.x - self.x) / rx, (pt.y - self.y) / ry);
                dx * dx + dy * dy <= 1.0
            }
            ShapeKind::Rectangle | ShapeKind::Image | ShapeKind::Text => self.bounds().contains(pt, 0.0),
        }
    }

    fn stroke_contains(&self, pt: Point) -> bool {
        let reach = self.style.stroke_width / 2.0 + STROKE_HIT_SLOP_PX;
        let world: Vec<Point> = self
            .points
            .chunks_exact(2)
            .map(|p| Point::new(self.x + p[0] * self.scale_x, self.y + p[1] * self.scale_y))
            .collect();
        match world.as_slice() {
            [] => false,
            [only] => distance(pt, *only) <= reach,
            pts => pts.windows(2).any(|seg| segment_distance(pt, seg[0], seg[1]) <= reach),
        }
    }
}

fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn segment_distance(pt: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return distance(pt, a);
    }
    let t = (((pt.x - a.x) * dx + (pt.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    distance(pt, Point::new(a.x + t * dx, a.y + t * dy))
}

// =============================================================================
// TRAIT
// =============================================================================

/// The rendering engine as seen by the core.
pub trait SceneGraph {
    /// Add a node on top of every sibling. A node with the same id is
    /// replaced in place.
    fn create_node(&mut self, node: SceneNode);

    /// Remove a node, returning it if it existed.
    fn destroy_node(&mut self, id: &ShapeId) -> Option<SceneNode>;

    fn node(&self, id: &ShapeId) -> Option<&SceneNode>;

    fn node_mut(&mut self, id: &ShapeId) -> Option<&mut SceneNode>;

    /// Siblings bottom to top, the handle included.
    fn order(&self) -> Vec<NodeKey>;

    /// Swap with the sibling above. `false` if missing or already on top.
    fn move_up(&mut self, key: &NodeKey) -> bool;

    /// Swap with the sibling below. `false` if missing or already at bottom.
    fn move_down(&mut self, key: &NodeKey) -> bool;

    fn move_to_top(&mut self, key: &NodeKey) -> bool;

    fn move_to_bottom(&mut self, key: &NodeKey) -> bool;

    fn handle(&self) -> &TransformHandle;

    fn handle_mut(&mut self) -> &mut TransformHandle;

    /// Topmost visible node under `pt`.
    fn hit_test(&self, pt: Point) -> Option<ShapeId>;

    /// Subscribe to a surface event. Subscribing twice is a no-op.
    fn listen(&mut self, event: SurfaceEvent);

    /// Drop every surface subscription.
    fn unlisten_all(&mut self);

    fn is_listening(&self, event: SurfaceEvent) -> bool;

    /// Schedule a redraw.
    fn batch_draw(&mut self);

    /// Rasterize the scene to a PNG data URI.
    ///
    /// # Errors
    ///
    /// Returns `ExportUnsupported` when the surface has no raster backend.
    fn to_data_url(&self, pixel_ratio: f64) -> Result<String, SceneError>;

    /// Shape ids bottom to top, the handle excluded.
    fn shape_order(&self) -> Vec<ShapeId> {
        self.order().into_iter().filter_map(|k| k.as_shape().cloned()).collect()
    }

    /// Position of `key` among all siblings.
    fn index_of(&self, key: &NodeKey) -> Option<usize> {
        self.order().iter().position(|k| k == key)
    }
}

// =============================================================================
// MEMORY SCENE
// =============================================================================

/// Headless scene graph.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    nodes: HashMap<ShapeId, SceneNode>,
    order: Vec<NodeKey>,
    handle: TransformHandle,
    listening: Vec<SurfaceEvent>,
    draws: u64,
}

impl MemoryScene {
    /// An empty scene whose handle enforces `floor` with `mode`.
    #[must_use]
    pub fn new(floor: f64, mode: FloorMode) -> Self {
        Self {
            nodes: HashMap::new(),
            order: vec![NodeKey::Handle],
            handle: TransformHandle::new(floor, mode),
            listening: Vec::new(),
            draws: 0,
        }
    }

    /// Number of redraws requested so far.
    #[must_use]
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drag gesture: move the node to `pos`. The host follows up with the
    /// drag-end event.
    pub fn drag_to(&mut self, id: &ShapeId, pos: Point) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        node.x = pos.x;
        node.y = pos.y;
        true
    }

    /// Resize gesture on the handle's current target: the proposed box runs
    /// through the handle's bound function and the accepted box is applied.
    pub fn resize_to(&mut self, proposed: BoundBox) -> Option<BoundBox> {
        let id = self.handle.target()?.clone();
        let node = self.nodes.get_mut(&id)?;
        let accepted = self.handle.constrain(node.bounds(), proposed);
        node.apply_box(accepted);
        Some(accepted)
    }

    fn position(&self, key: &NodeKey) -> Option<usize> {
        self.order.iter().position(|k| k == key)
    }
}

impl SceneGraph for MemoryScene {
    fn create_node(&mut self, node: SceneNode) {
        let key = NodeKey::Shape(node.id.clone());
        if self.nodes.insert(node.id.clone(), node).is_none() {
            self.order.push(key);
        }
    }

    fn destroy_node(&mut self, id: &ShapeId) -> Option<SceneNode> {
        let node = self.nodes.remove(id)?;
        self.order.retain(|k| k.as_shape() != Some(id));
        if self.handle.is_attached_to(id) {
            self.handle.detach();
        }
        Some(node)
    }

    fn node(&self, id: &ShapeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    fn node_mut(&mut self, id: &ShapeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    fn order(&self) -> Vec<NodeKey> {
        self.order.clone()
    }

    fn move_up(&mut self, key: &NodeKey) -> bool {
        match self.position(key) {
            Some(i) if i + 1 < self.order.len() => {
                self.order.swap(i, i + 1);
                true
            }
            _ => false,
        }
    }

    fn move_down(&mut self, key: &NodeKey) -> bool {
        match self.position(key) {
            Some(i) if i > 0 => {
                self.order.swap(i, i - 1);
                true
            }
            _ => false,
        }
    }

    fn move_to_top(&mut self, key: &NodeKey) -> bool {
        let Some(i) = self.position(key) else {
            return false;
        };
        let k = self.order.remove(i);
        self.order.push(k);
        true
    }

    fn move_to_bottom(&mut self, key: &NodeKey) -> bool {
        let Some(i) = self.position(key) else {
            return false;
        };
        let k = self.order.remove(i);
        self.order.insert(0, k);
        true
    }

    fn handle(&self) -> &TransformHandle {
        &self.handle
    }

    fn handle_mut(&mut self) -> &mut TransformHandle {
        &mut self.handle
    }

    fn hit_test(&self, pt: Point) -> Option<ShapeId> {
        self.order
            .iter()
            .rev()
            .filter_map(|k| k.as_shape())
            .filter_map(|id| self.nodes.get(id))
            .find(|node| node.visible && node.contains(pt))
            .map(|node| node.id.clone())
    }

    fn listen(&mut self, event: SurfaceEvent) {
        if !self.listening.contains(&event) {
            self.listening.push(event);
        }
    }

    fn unlisten_all(&mut self) {
        self.listening.clear();
    }

    fn is_listening(&self, event: SurfaceEvent) -> bool {
        self.listening.contains(&event)
    }

    fn batch_draw(&mut self) {
        self.draws += 1;
    }

    fn to_data_url(&self, _pixel_ratio: f64) -> Result<String, SceneError> {
        Err(SceneError::ExportUnsupported)
    }
}
