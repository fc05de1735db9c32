//! Toolbar and shape config panel.
//!
//! The toolbar holds the active tool and the current color. New shapes take
//! that color at creation time and keep it; changing the toolbar color later
//! does not repaint existing shapes. The config panel recolors the selected
//! shape explicitly.

#[cfg(test)]
#[path = "toolbar_test.rs"]
mod toolbar_test;

use crate::config::ImageOptions;
use crate::consts::{DEFAULT_FONT_SIZE, DEFAULT_TEXT, EXPORT_FILE_NAME, LINE_STROKE_WIDTH};
use crate::error::ImageError;
use crate::id::{ShapeId, ShapeKind};
use crate::input::ToolMode;
use crate::registry::ShapeRegistry;
use crate::scene::SceneGraph;
use crate::shape::{BoxShape, ImageShape, PolylineShape, Shape, TextShape};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolbar {
    tool: ToolMode,
    color: String,
}

impl Toolbar {
    #[must_use]
    pub fn new(color: impl Into<String>) -> Self {
        Self { tool: ToolMode::Default, color: color.into() }
    }

    #[must_use]
    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolMode) {
        self.tool = tool;
    }

    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }
}

/// Outcome of a config-panel recolor.
#[derive(Debug, Clone, PartialEq)]
pub enum Recolor {
    Applied(Shape),
    /// The kind has no recolorable paint (text).
    Unsupported,
    /// No record with that id.
    Missing,
}

/// A rasterized board ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub file_name: String,
    pub data_url: String,
}

impl ExportedImage {
    #[must_use]
    pub fn new(data_url: String) -> Self {
        Self { file_name: EXPORT_FILE_NAME.to_owned(), data_url }
    }
}

// =============================================================================
// IMAGE COMPRESSION
// =============================================================================

/// Compresses an uploaded file into a data URI. In the browser this wraps the
/// page's image compression library; the CLI decodes and re-encodes with the
/// `image` crate.
#[async_trait::async_trait(?Send)]
pub trait ImageCompressor {
    /// # Errors
    ///
    /// Returns an [`ImageError`] if the file cannot be decoded or re-encoded.
    async fn compress(&self, bytes: &[u8], options: &ImageOptions) -> Result<String, ImageError>;
}

// =============================================================================
// SHAPE CREATION
// =============================================================================

/// Whether the config panel can recolor `kind`.
#[must_use]
pub fn supports_color(kind: ShapeKind) -> bool {
    kind != ShapeKind::Text
}

/// A new shape of `kind` at its default position and size, painted `color`.
///
/// Brushes come only from freehand capture and images need data, so both
/// return `None`.
#[must_use]
pub fn default_shape(kind: ShapeKind, color: &str) -> Option<Shape> {
    let id = ShapeId::generate(kind);
    let shape = match kind {
        ShapeKind::Rectangle => Shape::Rectangle(default_box(id, color)),
        ShapeKind::Circle => Shape::Circle(default_box(id, color)),
        ShapeKind::Line => Shape::Line(default_segment(id, color)),
        ShapeKind::Arrow => Shape::Arrow(default_segment(id, color)),
        ShapeKind::Text => Shape::Text(TextShape {
            id,
            x: 50.0,
            y: 80.0,
            width: 200.0,
            font_size: DEFAULT_FONT_SIZE,
            text: DEFAULT_TEXT.to_owned(),
        }),
        ShapeKind::Image | ShapeKind::Brush => return None,
    };
    Some(shape)
}

/// A new image shape carrying `image_url`.
#[must_use]
pub fn image_shape(image_url: String, color: &str) -> Shape {
    let BoxShape { id, x, y, width, height, fill } = default_box(ShapeId::generate(ShapeKind::Image), color);
    Shape::Image(ImageShape { id, x, y, width, height, fill, image_url })
}

/// Compress `bytes` and build an image shape from the result. Nothing is
/// built if compression fails.
///
/// # Errors
///
/// Propagates the compressor's [`ImageError`].
pub async fn compress_image<C: ImageCompressor + ?Sized>(
    compressor: &C,
    bytes: &[u8],
    options: &ImageOptions,
    color: &str,
) -> Result<Shape, ImageError> {
    let url = compressor.compress(bytes, options).await?;
    Ok(image_shape(url, color))
}

fn default_box(id: ShapeId, color: &str) -> BoxShape {
    BoxShape { id, x: 50.0, y: 50.0, width: 100.0, height: 100.0, fill: color.to_owned() }
}

fn default_segment(id: ShapeId, color: &str) -> PolylineShape {
    PolylineShape { x: 50.0, y: 50.0, ..PolylineShape::new(id, vec![0.0, 0.0, 100.0, 100.0], color, LINE_STROKE_WIDTH) }
}

// =============================================================================
// CONFIG PANEL
// =============================================================================

/// Repaint `id`: fill for boxes, stroke for polylines. Brush nodes are not
/// re-projected, so the brush node is repainted here as well.
pub fn recolor<S: SceneGraph>(registry: &mut ShapeRegistry, scene: &mut S, id: &ShapeId, color: &str) -> Recolor {
    let Some(prior) = registry.find(id) else {
        tracing::debug!(%id, "recolor: no record");
        return Recolor::Missing;
    };
    let Some(next) = prior.with_color(color) else {
        return Recolor::Unsupported;
    };
    if !registry.replace(next.clone()) {
        tracing::debug!(%id, "recolor: record gone before write");
        return Recolor::Missing;
    }
    if next.kind() == ShapeKind::Brush {
        if let Some(node) = scene.node_mut(id) {
            node.style.stroke = Some(color.to_owned());
        }
    }
    scene.batch_draw();
    Recolor::Applied(next)
}
