//! Whiteboard core: shape lifecycle, freehand capture, selection, z-order and
//! session persistence for a browser whiteboard.
//!
//! The crate never draws. It keeps the canonical shape records in a
//! [`registry::ShapeRegistry`] and drives a retained-mode renderer through
//! the [`scene::SceneGraph`] trait, projecting records onto scene nodes and
//! folding gestures on those nodes back into records. The host forwards DOM
//! events to [`engine::EngineCore`] and reacts to the [`engine::Action`]s it
//! returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Event-driven [`engine::EngineCore`] wiring everything together |
//! | [`registry`] | Copy-on-write shape collections, one per kind |
//! | [`shape`] | Shape records and the kind-tagged [`shape::Shape`] variant |
//! | [`id`] | Kind-tagged shape ids |
//! | [`brush`] | Freehand stroke engine and its transient overlay |
//! | [`selection`] | Single selection and transform handle seating |
//! | [`zorder`] | Stacking operations and persisted order replay |
//! | [`deletion`] | Delete-key handling |
//! | [`editor`] | Drag/transform folding and text edit mode |
//! | [`toolbar`] | Tool, color, default shapes, image upload, recolor |
//! | [`scene`] | Scene-graph collaborator trait and headless [`scene::MemoryScene`] |
//! | [`handle`] | Transform handle: anchors and the minimum-size bound |
//! | [`storage`] | Session store trait and the split-key persistence adapter |
//! | [`config`] | [`config::WhiteboardConfig`] and its `WHITEBOARD_*` overrides |
//! | [`error`] | Error enums and stable error codes |
//! | [`input`] | Tool modes, keys and modifiers |
//! | [`geometry`] | Points and bounding boxes |
//! | [`consts`] | Shared constants (size floor, default colors, storage keys) |

pub mod brush;
pub mod config;
pub mod consts;
pub mod deletion;
pub mod editor;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod handle;
pub mod id;
pub mod input;
pub mod registry;
pub mod scene;
pub mod selection;
pub mod shape;
pub mod storage;
pub mod toolbar;
#[cfg(target_arch = "wasm32")]
pub mod web;
pub mod zorder;
