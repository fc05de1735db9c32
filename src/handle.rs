//! Transform handle: the single shared resize/rotate widget.
//!
//! The handle is attached to at most one scene node at a time. While attached
//! it carries the anchor set and the bound-box constraint of its target's
//! kind. Every box the user proposes by dragging an anchor passes through
//! [`TransformHandle::constrain`] before the scene applies it, which is where
//! the minimum-size floor is enforced.

#[cfg(test)]
#[path = "handle_test.rs"]
mod handle_test;

use crate::geometry::BoundBox;
use crate::id::{ShapeId, ShapeKind};

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    pub const ALL: [ResizeAnchor; 8] = [Self::N, Self::Ne, Self::E, Self::Se, Self::S, Self::Sw, Self::W, Self::Nw];

    /// Top-center and bottom-center only.
    pub const VERTICAL: [ResizeAnchor; 2] = [Self::N, Self::S];

    /// Middle-left and middle-right only.
    pub const HORIZONTAL: [ResizeAnchor; 2] = [Self::W, Self::E];

    /// Anchors enabled when a shape of `kind` is selected.
    #[must_use]
    pub fn for_kind(kind: ShapeKind) -> &'static [ResizeAnchor] {
        match kind {
            ShapeKind::Line | ShapeKind::Arrow => &Self::VERTICAL,
            ShapeKind::Text => &Self::HORIZONTAL,
            ShapeKind::Rectangle | ShapeKind::Circle | ShapeKind::Image | ShapeKind::Brush => &Self::ALL,
        }
    }

    /// Whether dragging this anchor changes the box width.
    #[must_use]
    pub fn resizes_width(self) -> bool {
        !matches!(self, Self::N | Self::S)
    }

    /// Whether dragging this anchor changes the box height.
    #[must_use]
    pub fn resizes_height(self) -> bool {
        !matches!(self, Self::E | Self::W)
    }
}

/// What to do with a proposed box below the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloorMode {
    /// Raise the offending dimension to the floor.
    #[default]
    Clamp,
    /// Keep the previous box.
    Reject,
}

/// Minimum-size constraint applied by the handle's bound function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxConstraint {
    pub floor: f64,
    pub mode: FloorMode,
    /// Whether the width is subject to the floor.
    pub width: bool,
    /// Whether the height is subject to the floor.
    pub height: bool,
}

impl BoxConstraint {
    /// Constraint for a shape of `kind`: only semantically resizable
    /// dimensions are floored.
    #[must_use]
    pub fn for_kind(kind: ShapeKind, floor: f64, mode: FloorMode) -> Self {
        let (width, height) = match kind {
            ShapeKind::Line | ShapeKind::Arrow => (false, true),
            ShapeKind::Text => (true, false),
            ShapeKind::Rectangle | ShapeKind::Circle | ShapeKind::Image | ShapeKind::Brush => (true, true),
        };
        Self { floor, mode, width, height }
    }

    /// Bound function: map a proposed box to the box the handle accepts.
    #[must_use]
    pub fn apply(&self, old: BoundBox, proposed: BoundBox) -> BoundBox {
        let narrow = self.width && proposed.width < self.floor;
        let short = self.height && proposed.height < self.floor;
        if !narrow && !short {
            return proposed;
        }
        match self.mode {
            FloorMode::Reject => old,
            FloorMode::Clamp => BoundBox {
                width: if narrow { self.floor } else { proposed.width },
                height: if short { self.floor } else { proposed.height },
                ..proposed
            },
        }
    }
}

/// The shared transform widget.
#[derive(Debug, Clone)]
pub struct TransformHandle {
    target: Option<ShapeId>,
    anchors: &'static [ResizeAnchor],
    constraint: BoxConstraint,
    visible: bool,
    revision: u64,
}

impl TransformHandle {
    /// A detached, visible handle enforcing `floor` with `mode`.
    #[must_use]
    pub fn new(floor: f64, mode: FloorMode) -> Self {
        Self {
            target: None,
            anchors: &ResizeAnchor::ALL,
            constraint: BoxConstraint { floor, mode, width: true, height: true },
            visible: true,
            revision: 0,
        }
    }

    /// Nodes the handle is attached to; length 0 or 1.
    #[must_use]
    pub fn nodes(&self) -> &[ShapeId] {
        self.target.as_slice()
    }

    #[must_use]
    pub fn target(&self) -> Option<&ShapeId> {
        self.target.as_ref()
    }

    #[must_use]
    pub fn is_attached_to(&self, id: &ShapeId) -> bool {
        self.target.as_ref() == Some(id)
    }

    /// Attach to `id`, taking the anchor set and constraint of `kind`.
    pub fn attach(&mut self, id: ShapeId, kind: ShapeKind) {
        self.anchors = ResizeAnchor::for_kind(kind);
        self.constraint = BoxConstraint::for_kind(kind, self.constraint.floor, self.constraint.mode);
        self.target = Some(id);
        self.revision += 1;
    }

    /// Clear the node list.
    pub fn detach(&mut self) {
        if self.target.take().is_some() {
            self.revision += 1;
        }
    }

    #[must_use]
    pub fn enabled_anchors(&self) -> &'static [ResizeAnchor] {
        self.anchors
    }

    #[must_use]
    pub fn constraint(&self) -> BoxConstraint {
        self.constraint
    }

    /// Map a proposed box through the enabled anchors and the bound function.
    ///
    /// Dimensions no enabled anchor can change keep their old value.
    #[must_use]
    pub fn constrain(&self, old: BoundBox, proposed: BoundBox) -> BoundBox {
        let mut masked = proposed;
        if !self.anchors.iter().any(|a| a.resizes_width()) {
            masked.x = old.x;
            masked.width = old.width;
        }
        if !self.anchors.iter().any(|a| a.resizes_height()) {
            masked.y = old.y;
            masked.height = old.height;
        }
        self.constraint.apply(old, masked)
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Recompute the handle's box from its target on the next draw.
    pub fn force_update(&mut self) {
        self.revision += 1;
    }

    /// Bumped on attach, detach and forced updates.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
