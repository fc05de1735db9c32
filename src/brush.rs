//! Freehand stroke engine.
//!
//! Strokes bypass the registry while they are being drawn. On pointer-down
//! the engine opens a stroke in its [`TransientOverlay`] and puts a matching
//! non-interactive node in the scene; pointer-move appends to both; only
//! pointer-up turns the stroke into a Brush record in the registry and makes
//! its node interactive. Points arrive far too often for a registry write
//! (and the re-projection it triggers) per sample.
//!
//! State machine: `Idle → Drawing → Idle`. The surface subscriptions the
//! engine relies on are reset on every `configure`/`activate`: all handlers
//! are dropped first, then the ones for the current mode are added.

#[cfg(test)]
#[path = "brush_test.rs"]
mod brush_test;

use std::collections::HashMap;

use crate::config::WhiteboardConfig;
use crate::geometry::Point;
use crate::id::{ShapeId, ShapeKind};
use crate::input::ToolMode;
use crate::registry::ShapeRegistry;
use crate::scene::{SceneGraph, SceneNode, SurfaceEvent};
use crate::shape::{PolylineShape, Shape};

/// Explicit stroke-engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushConfig {
    pub mode: ToolMode,
    /// Stroke color for new strokes.
    pub color: String,
    pub width: f64,
    /// Resize floor applied when a committed stroke is transformed.
    pub min_size: f64,
}

impl BrushConfig {
    #[must_use]
    pub fn from_config(config: &WhiteboardConfig) -> Self {
        Self {
            mode: ToolMode::Default,
            color: config.default_color.clone(),
            width: config.brush_width,
            min_size: config.min_size,
        }
    }
}

/// Stroke capture state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StrokeState {
    #[default]
    Idle,
    Drawing {
        id: ShapeId,
    },
}

/// A stroke that has not been committed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransientStroke {
    pub points: Vec<f64>,
    pub color: String,
    pub width: f64,
}

/// Arena of in-progress strokes, keyed by stroke id.
#[derive(Debug, Clone, Default)]
pub struct TransientOverlay {
    strokes: HashMap<ShapeId, TransientStroke>,
}

impl TransientOverlay {
    #[must_use]
    pub fn get(&self, id: &ShapeId) -> Option<&TransientStroke> {
        self.strokes.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    fn open(&mut self, id: ShapeId, stroke: TransientStroke) {
        self.strokes.insert(id, stroke);
    }

    fn append(&mut self, id: &ShapeId, pt: Point) -> bool {
        let Some(stroke) = self.strokes.get_mut(id) else {
            return false;
        };
        stroke.points.extend([pt.x, pt.y]);
        true
    }

    fn take(&mut self, id: &ShapeId) -> Option<TransientStroke> {
        self.strokes.remove(id)
    }
}

/// Converts raw pointer streams into committed Brush records.
#[derive(Debug, Clone)]
pub struct StrokeEngine {
    config: BrushConfig,
    state: StrokeState,
    overlay: TransientOverlay,
}

impl StrokeEngine {
    #[must_use]
    pub fn new(config: BrushConfig) -> Self {
        Self { config, state: StrokeState::Idle, overlay: TransientOverlay::default() }
    }

    #[must_use]
    pub fn config(&self) -> &BrushConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> ToolMode {
        self.config.mode
    }

    #[must_use]
    pub fn state(&self) -> &StrokeState {
        &self.state
    }

    #[must_use]
    pub fn overlay(&self) -> &TransientOverlay {
        &self.overlay
    }

    /// Replace the configuration and re-subscribe. A stroke in progress is
    /// abandoned and its transient node destroyed.
    pub fn configure<S: SceneGraph>(&mut self, scene: &mut S, config: BrushConfig) {
        self.abandon(scene);
        self.config = config;
        self.activate(scene);
    }

    /// Drop every surface subscription, then subscribe for the current mode:
    /// pointer down/move/up in brush mode, click in default mode.
    pub fn activate<S: SceneGraph>(&mut self, scene: &mut S) {
        scene.unlisten_all();
        match self.config.mode {
            ToolMode::Brush => {
                scene.listen(SurfaceEvent::PointerDown);
                scene.listen(SurfaceEvent::PointerMove);
                scene.listen(SurfaceEvent::PointerUp);
            }
            ToolMode::Default => scene.listen(SurfaceEvent::Click),
        }
        tracing::debug!(mode = ?self.config.mode, "stroke engine activated");
    }

    /// Open a stroke at `pt`. Returns the new stroke id.
    pub fn pointer_down<S: SceneGraph>(&mut self, scene: &mut S, pt: Point) -> Option<ShapeId> {
        if !scene.is_listening(SurfaceEvent::PointerDown) {
            return None;
        }
        // A down without a matching up (pointer left the surface) drops the
        // previous stroke.
        self.abandon(scene);

        let id = ShapeId::generate(ShapeKind::Brush);
        let stroke =
            TransientStroke { points: vec![pt.x, pt.y], color: self.config.color.clone(), width: self.config.width };
        scene.create_node(SceneNode::stroke(id.clone(), pt, &stroke.color, stroke.width));
        self.overlay.open(id.clone(), stroke);
        self.state = StrokeState::Drawing { id: id.clone() };
        scene.batch_draw();
        Some(id)
    }

    /// Append `pt` to the current stroke. No registry write happens here.
    pub fn pointer_move<S: SceneGraph>(&mut self, scene: &mut S, pt: Point) -> bool {
        if !scene.is_listening(SurfaceEvent::PointerMove) {
            return false;
        }
        let StrokeState::Drawing { id } = &self.state else {
            return false;
        };
        if !self.overlay.append(id, pt) {
            return false;
        }
        if let Some(node) = scene.node_mut(id) {
            node.points.extend([pt.x, pt.y]);
        }
        scene.batch_draw();
        true
    }

    /// Commit the current stroke as a Brush record and make its node
    /// interactive. Returns the committed record.
    pub fn pointer_up<S: SceneGraph>(&mut self, scene: &mut S, registry: &mut ShapeRegistry) -> Option<Shape> {
        if !scene.is_listening(SurfaceEvent::PointerUp) {
            return None;
        }
        let StrokeState::Drawing { id } = std::mem::take(&mut self.state) else {
            return None;
        };
        let stroke = self.overlay.take(&id)?;
        let shape = Shape::Brush(PolylineShape::new(id.clone(), stroke.points, stroke.color, stroke.width));
        registry.insert(shape.clone());
        if let Some(node) = scene.node_mut(&id) {
            node.sync(&shape);
            node.interactive = true;
        }
        scene.batch_draw();
        tracing::debug!(%id, "stroke committed");
        Some(shape)
    }

    /// Whether a surface click on `target` (`None` = background) clears the
    /// transform handle: only in default mode, and only for the background
    /// or a non-brush node.
    #[must_use]
    pub fn click_clears_handle<S: SceneGraph>(&self, scene: &S, target: Option<&ShapeId>) -> bool {
        if !scene.is_listening(SurfaceEvent::Click) {
            return false;
        }
        target.is_none_or(|id| !id.is_kind(ShapeKind::Brush))
    }

    fn abandon<S: SceneGraph>(&mut self, scene: &mut S) {
        if let StrokeState::Drawing { id } = std::mem::take(&mut self.state) {
            self.overlay.take(&id);
            scene.destroy_node(&id);
            tracing::debug!(%id, "stroke abandoned");
        }
    }
}
