//! Plain geometry value types shared by the scene model and the editors.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

/// A point in canvas (stage) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box proposed or accepted by the transform handle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees.
    pub rotation: f64,
}

impl BoundBox {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height, rotation: 0.0 }
    }

    /// Whether `pt` lies inside the box (rotation ignored), expanded by `slop`.
    #[must_use]
    pub fn contains(&self, pt: Point, slop: f64) -> bool {
        let (min_x, max_x) = ordered(self.x, self.x + self.width);
        let (min_y, max_y) = ordered(self.y, self.y + self.height);
        pt.x >= min_x - slop && pt.x <= max_x + slop && pt.y >= min_y - slop && pt.y <= max_y + slop
    }
}

/// Bounding box of a flat `[x0, y0, x1, y1, …]` list, relative to its own
/// coordinate space. Returns a zero box for an empty list.
#[must_use]
pub fn points_bounds(points: &[f64]) -> BoundBox {
    let mut pairs = points.chunks_exact(2);
    let Some(first) = pairs.next() else {
        return BoundBox::default();
    };
    let (mut min_x, mut min_y) = (first[0], first[1]);
    let (mut max_x, mut max_y) = (first[0], first[1]);
    for pair in pairs {
        min_x = min_x.min(pair[0]);
        min_y = min_y.min(pair[1]);
        max_x = max_x.max(pair[0]);
        max_y = max_y.max(pair[1]);
    }
    BoundBox::new(min_x, min_y, max_x - min_x, max_y - min_y)
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}
