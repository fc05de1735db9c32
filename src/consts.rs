//! Shared constants for the whiteboard crate.

// ── Geometry ────────────────────────────────────────────────────

/// Smallest width/height, in canvas pixels, a resize may commit.
pub const MIN_SHAPE_SIZE: f64 = 50.0;

/// Pointer slop in pixels when hit-testing thin strokes.
pub const STROKE_HIT_SLOP_PX: f64 = 4.0;

// ── Style ───────────────────────────────────────────────────────

/// Toolbar color before the user picks one.
pub const DEFAULT_COLOR: &str = "#0959AE";

/// Stroke width for freehand brush strokes.
pub const BRUSH_STROKE_WIDTH: f64 = 5.0;

/// Stroke width for toolbar-created lines and arrows.
pub const LINE_STROKE_WIDTH: f64 = 4.0;

/// Font size for toolbar-created text.
pub const DEFAULT_FONT_SIZE: f64 = 20.0;

/// Placeholder content for toolbar-created text.
pub const DEFAULT_TEXT: &str = "Write here";

// ── Export ──────────────────────────────────────────────────────

/// Pixel-density multiplier for PNG export.
pub const EXPORT_PIXEL_RATIO: f64 = 1.5;

/// Suggested download name for PNG export.
pub const EXPORT_FILE_NAME: &str = "whiteboard.png";

// ── Storage ─────────────────────────────────────────────────────

/// Session-storage key holding the kind → records mapping.
pub const SHAPES_KEY: &str = "WHITEBOARD_SHAPES";

/// Session-storage key holding the z-ordered id list.
pub const IDS_KEY: &str = "WHITEBOARD_IDS";

/// Single key used by earlier revisions for the kind → records mapping.
pub const LEGACY_KEY: &str = "WHITEBOARD";

// ── Images ──────────────────────────────────────────────────────

/// Target quality handed to the image compressor (0.0–1.0).
pub const IMAGE_QUALITY: f64 = 0.7;

/// Longest edge, in pixels, of a compressed image.
pub const IMAGE_MAX_DIMENSION: u32 = 1920;
