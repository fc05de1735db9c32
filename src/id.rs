//! Shape identifiers and the kind tags embedded in them.
//!
//! Every id has the form `<tag>~<uuid>`, e.g. `rect~5b0e…`. The tag lets any
//! layer (scene graph, storage, deletion) classify a node from its id alone,
//! without consulting a side table.

#[cfg(test)]
#[path = "id_test.rs"]
mod id_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Separator between the kind tag and the unique suffix.
pub const TAG_SEPARATOR: char = '~';

/// One of the seven shape categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Image,
    Line,
    Arrow,
    Text,
    Brush,
}

impl ShapeKind {
    /// Kinds in the order the deletion coordinator searches them.
    pub const SEARCH_ORDER: [ShapeKind; 7] = [
        Self::Arrow,
        Self::Circle,
        Self::Image,
        Self::Line,
        Self::Rectangle,
        Self::Text,
        Self::Brush,
    ];

    /// Kinds in the order the declarative projection emits them.
    pub const RENDER_ORDER: [ShapeKind; 7] = [
        Self::Rectangle,
        Self::Circle,
        Self::Image,
        Self::Line,
        Self::Arrow,
        Self::Text,
        Self::Brush,
    ];

    /// Prefix used in ids of this kind.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Rectangle => "rect",
            Self::Circle => "circle",
            Self::Image => "image",
            Self::Line => "line",
            Self::Arrow => "arrow",
            Self::Text => "text",
            Self::Brush => "brush",
        }
    }

    /// Parse a kind from its id tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "rect" => Some(Self::Rectangle),
            "circle" => Some(Self::Circle),
            "image" => Some(Self::Image),
            "line" => Some(Self::Line),
            "arrow" => Some(Self::Arrow),
            "text" => Some(Self::Text),
            "brush" => Some(Self::Brush),
            _ => None,
        }
    }

    /// Whether the shape is drawn from a point list rather than a box.
    #[must_use]
    pub fn is_polyline(self) -> bool {
        matches!(self, Self::Line | Self::Arrow | Self::Brush)
    }

    /// Whether the scene node is re-projected from the registry on change.
    ///
    /// Brush nodes are created imperatively by the stroke engine and must be
    /// managed explicitly.
    #[must_use]
    pub fn is_projected(self) -> bool {
        !matches!(self, Self::Brush)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Globally unique, kind-tagged shape identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Generate a fresh id for a shape of `kind`.
    #[must_use]
    pub fn generate(kind: ShapeKind) -> Self {
        Self(format!("{}{TAG_SEPARATOR}{}", kind.tag(), Uuid::new_v4()))
    }

    /// Wrap an existing id string (e.g. one read back from storage).
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The kind encoded in the id prefix, if the prefix is recognised.
    #[must_use]
    pub fn kind(&self) -> Option<ShapeKind> {
        let (tag, _) = self.0.split_once(TAG_SEPARATOR)?;
        ShapeKind::from_tag(tag)
    }

    /// Whether the id carries the given kind tag.
    #[must_use]
    pub fn is_kind(&self, kind: ShapeKind) -> bool {
        self.kind() == Some(kind)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShapeId {
    fn from(raw: &str) -> Self {
        Self::from_raw(raw)
    }
}
