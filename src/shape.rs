//! Shape records: one typed struct per geometry family plus the [`Shape`]
//! variant that tags a record with its kind.
//!
//! Records are plain values. Editors never patch a stored record in place;
//! they build a full replacement (prior record merged with the changed
//! fields) and hand it to the registry. Field names serialize in camelCase
//! so persisted state stays readable by earlier revisions of the board.

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundBox, Point, points_bounds};
use crate::id::{ShapeId, ShapeKind};

/// Rectangle or circle: a filled box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxShape {
    pub id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
}

/// A filled box carrying compressed image data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageShape {
    pub id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    /// Data URI produced by the image compressor.
    #[serde(rename = "imageURL")]
    pub image_url: String,
}

/// Line, arrow or brush stroke: a flat point list offset by `x`/`y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolylineShape {
    pub id: ShapeId,
    /// Flat `[x0, y0, x1, y1, …]` list relative to `x`/`y`.
    pub points: Vec<f64>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "unit_scale")]
    pub scale_x: f64,
    #[serde(default = "unit_scale")]
    pub scale_y: f64,
    pub stroke: String,
    pub stroke_width: f64,
}

/// Editable text block. Only the width is resizable; height follows content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextShape {
    pub id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub font_size: f64,
    #[serde(default)]
    pub text: String,
}

fn unit_scale() -> f64 {
    1.0
}

impl PolylineShape {
    /// Build a polyline whose width/height are taken from its points.
    #[must_use]
    pub fn new(id: ShapeId, points: Vec<f64>, stroke: impl Into<String>, stroke_width: f64) -> Self {
        let bounds = points_bounds(&points);
        Self {
            id,
            points,
            x: 0.0,
            y: 0.0,
            width: bounds.width,
            height: bounds.height,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            stroke: stroke.into(),
            stroke_width,
        }
    }
}

/// A shape record tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    Rectangle(BoxShape),
    Circle(BoxShape),
    Image(ImageShape),
    Line(PolylineShape),
    Arrow(PolylineShape),
    Text(TextShape),
    Brush(PolylineShape),
}

impl Shape {
    #[must_use]
    pub fn id(&self) -> &ShapeId {
        match self {
            Self::Rectangle(s) | Self::Circle(s) => &s.id,
            Self::Image(s) => &s.id,
            Self::Line(s) | Self::Arrow(s) | Self::Brush(s) => &s.id,
            Self::Text(s) => &s.id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Rectangle(_) => ShapeKind::Rectangle,
            Self::Circle(_) => ShapeKind::Circle,
            Self::Image(_) => ShapeKind::Image,
            Self::Line(_) => ShapeKind::Line,
            Self::Arrow(_) => ShapeKind::Arrow,
            Self::Text(_) => ShapeKind::Text,
            Self::Brush(_) => ShapeKind::Brush,
        }
    }

    /// Node position: top-left for rectangles, images and text, center for
    /// circles, offset for polylines.
    #[must_use]
    pub fn position(&self) -> Point {
        match self {
            Self::Rectangle(s) | Self::Circle(s) => Point::new(s.x, s.y),
            Self::Image(s) => Point::new(s.x, s.y),
            Self::Line(s) | Self::Arrow(s) | Self::Brush(s) => Point::new(s.x, s.y),
            Self::Text(s) => Point::new(s.x, s.y),
        }
    }

    /// Full replacement record with the position moved to `pos`.
    #[must_use]
    pub fn with_position(&self, pos: Point) -> Self {
        let mut next = self.clone();
        match &mut next {
            Self::Rectangle(s) | Self::Circle(s) => (s.x, s.y) = (pos.x, pos.y),
            Self::Image(s) => (s.x, s.y) = (pos.x, pos.y),
            Self::Line(s) | Self::Arrow(s) | Self::Brush(s) => (s.x, s.y) = (pos.x, pos.y),
            Self::Text(s) => (s.x, s.y) = (pos.x, pos.y),
        }
        next
    }

    /// The recolorable paint of the shape: fill for boxes, stroke for
    /// polylines. Text carries no recolorable paint.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        match self {
            Self::Rectangle(s) | Self::Circle(s) => Some(&s.fill),
            Self::Image(s) => Some(&s.fill),
            Self::Line(s) | Self::Arrow(s) | Self::Brush(s) => Some(&s.stroke),
            Self::Text(_) => None,
        }
    }

    /// Full replacement record painted with `color`, or `None` for text.
    #[must_use]
    pub fn with_color(&self, color: &str) -> Option<Self> {
        let mut next = self.clone();
        match &mut next {
            Self::Rectangle(s) | Self::Circle(s) => s.fill = color.to_owned(),
            Self::Image(s) => s.fill = color.to_owned(),
            Self::Line(s) | Self::Arrow(s) | Self::Brush(s) => s.stroke = color.to_owned(),
            Self::Text(_) => return None,
        }
        Some(next)
    }

    /// Bounding box in canvas coordinates, used for hit-testing and for
    /// the transform handle's initial box.
    #[must_use]
    pub fn bounds(&self) -> BoundBox {
        match self {
            Self::Rectangle(s) => BoundBox::new(s.x, s.y, s.width, s.height),
            // Circles are positioned by their center.
            Self::Circle(s) => BoundBox::new(s.x - s.width / 2.0, s.y - s.height / 2.0, s.width, s.height),
            Self::Image(s) => BoundBox::new(s.x, s.y, s.width, s.height),
            Self::Line(s) | Self::Arrow(s) | Self::Brush(s) => {
                let local = points_bounds(&s.points);
                BoundBox {
                    x: s.x + local.x * s.scale_x,
                    y: s.y + local.y * s.scale_y,
                    width: local.width * s.scale_x,
                    height: local.height * s.scale_y,
                    rotation: s.rotation,
                }
            }
            Self::Text(s) => BoundBox::new(s.x, s.y, s.width, text_height(s)),
        }
    }
}

/// Rendered height of a text block: one line box per content line.
#[must_use]
pub fn text_height(text: &TextShape) -> f64 {
    let lines = text.text.lines().count().max(1);
    #[allow(clippy::cast_precision_loss)]
    let lines = lines as f64;
    lines * text.font_size
}
