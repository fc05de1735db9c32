//! Whiteboard configuration.
//!
//! One explicit value, handed to the engine at construction and to the
//! stroke engine's `configure`. Defaults come from `consts`; `from_env`
//! overlays `WHITEBOARD_*` environment variables, falling back to the default
//! for any value that is missing or fails to parse.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::consts::{
    BRUSH_STROKE_WIDTH, DEFAULT_COLOR, EXPORT_PIXEL_RATIO, IMAGE_MAX_DIMENSION, IMAGE_QUALITY, MIN_SHAPE_SIZE,
};
use crate::handle::FloorMode;
use crate::storage::StorageKeys;

/// Options handed to the image compressor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageOptions {
    /// Encoder quality in `(0.0, 1.0]`.
    pub quality: f64,
    /// Longest edge of the compressed image, in pixels.
    pub max_dimension: u32,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self { quality: IMAGE_QUALITY, max_dimension: IMAGE_MAX_DIMENSION }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhiteboardConfig {
    /// Resize floor for width/height, in canvas pixels.
    pub min_size: f64,
    pub floor_mode: FloorMode,
    /// Toolbar color before the user picks one.
    pub default_color: String,
    pub brush_width: f64,
    pub export_pixel_ratio: f64,
    pub keys: StorageKeys,
    pub image: ImageOptions,
}

impl Default for WhiteboardConfig {
    fn default() -> Self {
        Self {
            min_size: MIN_SHAPE_SIZE,
            floor_mode: FloorMode::default(),
            default_color: DEFAULT_COLOR.to_owned(),
            brush_width: BRUSH_STROKE_WIDTH,
            export_pixel_ratio: EXPORT_PIXEL_RATIO,
            keys: StorageKeys::default(),
            image: ImageOptions::default(),
        }
    }
}

impl WhiteboardConfig {
    /// Defaults overlaid with `WHITEBOARD_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// Defaults overlaid with values from `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let positive = |v: &f64| v.is_finite() && *v > 0.0;
        Self {
            min_size: parse_or(&lookup, "WHITEBOARD_MIN_SIZE", defaults.min_size, positive),
            floor_mode: match lookup("WHITEBOARD_FLOOR_MODE").as_deref() {
                Some("clamp") => FloorMode::Clamp,
                Some("reject") => FloorMode::Reject,
                Some(other) => {
                    tracing::warn!(value = %other, "unknown WHITEBOARD_FLOOR_MODE; using default");
                    defaults.floor_mode
                }
                None => defaults.floor_mode,
            },
            default_color: lookup("WHITEBOARD_DEFAULT_COLOR").unwrap_or(defaults.default_color),
            brush_width: parse_or(&lookup, "WHITEBOARD_BRUSH_WIDTH", defaults.brush_width, positive),
            export_pixel_ratio: parse_or(
                &lookup,
                "WHITEBOARD_EXPORT_PIXEL_RATIO",
                defaults.export_pixel_ratio,
                positive,
            ),
            keys: StorageKeys {
                shapes: lookup("WHITEBOARD_SHAPES_KEY").unwrap_or(defaults.keys.shapes),
                ids: lookup("WHITEBOARD_IDS_KEY").unwrap_or(defaults.keys.ids),
                legacy: lookup("WHITEBOARD_LEGACY_KEY").unwrap_or(defaults.keys.legacy),
            },
            image: ImageOptions {
                quality: parse_or(&lookup, "WHITEBOARD_IMAGE_QUALITY", defaults.image.quality, |q| {
                    *q > 0.0 && *q <= 1.0
                }),
                max_dimension: parse_or(&lookup, "WHITEBOARD_IMAGE_MAX_DIMENSION", defaults.image.max_dimension, |d| {
                    *d > 0
                }),
            },
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: std::str::FromStr + Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            tracing::warn!(%key, value = %raw, "ignoring invalid config value");
            default
        }
    }
}
