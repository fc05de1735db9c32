//! Engine core: wires the registry, the scene, the stroke engine and the
//! coordinators together behind one event-driven surface.
//!
//! The host forwards pointer, keyboard and toolbar events; each handler
//! returns the [`Action`]s the host should react to. After every handler the
//! engine settles: the registry is re-projected onto the scene (non-brush
//! kinds only), then the shapes and the z-order are written to the session
//! store if they changed. The registry write always lands before the
//! snapshot is taken.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashSet;

use crate::brush::{BrushConfig, StrokeEngine};
use crate::config::WhiteboardConfig;
use crate::deletion;
use crate::editor::{self, EditKey, OverlayLayout, TextEditSession};
use crate::error::{ErrorCode, StorageError, WhiteboardError};
use crate::geometry::Point;
use crate::id::{ShapeId, ShapeKind};
use crate::input::{Key, Modifiers, ToolMode};
use crate::registry::ShapeRegistry;
use crate::scene::{MemoryScene, SceneGraph, SceneNode};
use crate::selection::{Selection, seat_handle};
use crate::shape::Shape;
use crate::storage::{BoardPersistence, SessionStore};
use crate::toolbar::{self, ExportedImage, ImageCompressor, Recolor, Toolbar};
use crate::zorder::{self, ZOp};

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ShapeCreated(Shape),
    ShapeUpdated(Shape),
    ShapeDeleted { id: ShapeId },
    SelectionChanged(Option<ShapeId>),
    /// Show a text input at this layout, pre-filled with its text.
    TextOverlay(OverlayLayout),
    TextOverlayClosed,
    RenderNeeded,
    /// A background save failed; the board keeps working.
    PersistFailed { code: &'static str, message: String },
}

/// All board logic that does not depend on a browser.
pub struct EngineCore<S: SceneGraph, T: SessionStore> {
    config: WhiteboardConfig,
    registry: ShapeRegistry,
    scene: S,
    store: T,
    selection: Selection,
    strokes: StrokeEngine,
    toolbar: Toolbar,
    persistence: BoardPersistence,
    text_edit: Option<TextEditSession>,
    projected_revision: u64,
    saved_revision: u64,
    saved_ids: Vec<ShapeId>,
}

impl<T: SessionStore> EngineCore<MemoryScene, T> {
    /// An engine over an in-process scene whose handle enforces the
    /// configured floor.
    #[must_use]
    pub fn headless(config: WhiteboardConfig, store: T) -> Self {
        let scene = MemoryScene::new(config.min_size, config.floor_mode);
        Self::new(config, scene, store)
    }
}

impl<S: SceneGraph, T: SessionStore> EngineCore<S, T> {
    /// Build an engine in default mode. Call [`Self::load`] to restore the
    /// previous session.
    #[must_use]
    pub fn new(config: WhiteboardConfig, mut scene: S, store: T) -> Self {
        let mut strokes = StrokeEngine::new(BrushConfig::from_config(&config));
        strokes.activate(&mut scene);
        Self {
            toolbar: Toolbar::new(config.default_color.clone()),
            persistence: BoardPersistence::new(config.keys.clone()),
            config,
            registry: ShapeRegistry::new(),
            scene,
            store,
            selection: Selection::new(),
            strokes,
            text_edit: None,
            projected_revision: 0,
            saved_revision: 0,
            saved_ids: Vec::new(),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &WhiteboardConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Direct scene access for host-driven gestures (drag, handle resize).
    /// Follow up with the matching drag/transform event.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    #[must_use]
    pub fn store(&self) -> &T {
        &self.store
    }

    #[must_use]
    pub fn toolbar(&self) -> &Toolbar {
        &self.toolbar
    }

    #[must_use]
    pub fn selected(&self) -> Option<&ShapeId> {
        self.selection.selected()
    }

    #[must_use]
    pub fn is_selected(&self, id: &ShapeId) -> bool {
        self.selection.is_selected(id)
    }

    #[must_use]
    pub fn is_editing_text(&self) -> bool {
        self.text_edit.is_some()
    }

    // --- Session ---

    /// Restore shapes and z-order from the session store.
    pub fn load(&mut self) -> Vec<Action> {
        let snapshot = self.persistence.load_shapes(&self.store);
        tracing::info!(shapes = snapshot.len(), "board loaded");
        self.registry.load(snapshot);
        self.project();
        self.hydrate_brushes();

        let ids = self.persistence.load_ids(&self.store);
        zorder::restore(&mut self.scene, &ids);

        self.saved_revision = self.registry.revision();
        self.saved_ids = self.scene.shape_order();
        self.scene.batch_draw();
        vec![Action::RenderNeeded]
    }

    /// Write shapes and z-order now, regardless of what changed.
    ///
    /// # Errors
    ///
    /// Returns the storage failure; the in-memory board is unaffected.
    pub fn save(&mut self) -> Result<(), WhiteboardError> {
        self.persistence.save_shapes(&mut self.store, &self.registry.get_all())?;
        let ids = self.scene.shape_order();
        self.persistence.save_ids(&mut self.store, &ids)?;
        self.saved_revision = self.registry.revision();
        self.saved_ids = ids;
        tracing::info!(shapes = self.registry.len(), "board saved");
        Ok(())
    }

    // --- Pointer ---

    pub fn on_pointer_down(&mut self, pt: Point) -> Vec<Action> {
        match self.strokes.pointer_down(&mut self.scene, pt) {
            Some(_) => vec![Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        if self.strokes.pointer_move(&mut self.scene, pt) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    pub fn on_pointer_up(&mut self, _pt: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(shape) = self.strokes.pointer_up(&mut self.scene, &mut self.registry) {
            actions.push(Action::ShapeCreated(shape));
            actions.push(Action::RenderNeeded);
        }
        self.settle(&mut actions);
        actions
    }

    /// Click or tap. Commits an open text edit; otherwise deselects on the
    /// background and selects the clicked shape. In brush mode only committed
    /// strokes are selectable.
    pub fn on_click(&mut self, pt: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.text_edit.is_some() {
            self.finish_text_edit(EditKey::Commit, &mut actions);
            self.settle(&mut actions);
            return actions;
        }

        let target = self.scene.hit_test(pt).filter(|id| self.scene.node(id).is_some_and(|n| n.interactive));
        match target {
            Some(id) if self.strokes.mode() == ToolMode::Default || id.is_kind(ShapeKind::Brush) => {
                self.select(&id, &mut actions);
            }
            target => {
                if self.strokes.click_clears_handle(&self.scene, target.as_ref()) {
                    self.deselect(&mut actions);
                }
            }
        }
        self.settle(&mut actions);
        actions
    }

    /// Double click. On a text shape, selects it and enters edit mode.
    pub fn on_dbl_click(&mut self, pt: Point) -> Vec<Action> {
        let actions = Vec::new();
        if self.text_edit.is_some() || self.strokes.mode() != ToolMode::Default {
            return actions;
        }
        match self.scene.hit_test(pt).filter(|id| id.is_kind(ShapeKind::Text)) {
            Some(id) => self.edit_text(&id),
            None => actions,
        }
    }

    /// Select `id` and open the text overlay on it. Ignored for non-text
    /// shapes and while another edit is open.
    pub fn edit_text(&mut self, id: &ShapeId) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.text_edit.is_some() || !id.is_kind(ShapeKind::Text) {
            return actions;
        }
        self.select(id, &mut actions);
        if let Some((session, layout)) = TextEditSession::begin(&self.registry, &mut self.scene, id) {
            tracing::debug!(%id, "text edit started");
            self.text_edit = Some(session);
            actions.push(Action::TextOverlay(layout));
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    // --- Selection ---

    /// Select `id` directly, as a layer list or keyboard navigation would.
    pub fn select_shape(&mut self, id: &ShapeId) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.text_edit.is_none() {
            self.select(id, &mut actions);
        }
        actions
    }

    pub fn clear_selection(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        self.deselect(&mut actions);
        actions
    }

    // --- Keyboard ---

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.text_edit.is_some() {
            match TextEditSession::classify(key, modifiers) {
                EditKey::Continue => {}
                outcome => self.finish_text_edit(outcome, &mut actions),
            }
        } else if let Some(removed) =
            deletion::on_key(key, &mut self.selection, &mut self.registry, &mut self.scene)
        {
            actions.push(Action::ShapeDeleted { id: removed.id().clone() });
            actions.push(Action::SelectionChanged(None));
            actions.push(Action::RenderNeeded);
        }
        self.settle(&mut actions);
        actions
    }

    /// Current content of the host's text input.
    pub fn text_input(&mut self, text: &str) {
        if let Some(session) = self.text_edit.as_mut() {
            session.input(text);
        }
    }

    // --- Editors ---

    pub fn on_drag_end(&mut self, id: &ShapeId) -> Vec<Action> {
        let next = editor::drag_end(&mut self.registry, &mut self.scene, id);
        self.updated(next)
    }

    /// Live transform tick from the handle.
    pub fn on_transform(&mut self, id: &ShapeId) -> Vec<Action> {
        let next = editor::transform(&mut self.registry, &mut self.scene, id, self.config.min_size);
        self.updated(next)
    }

    pub fn on_transform_end(&mut self, id: &ShapeId) -> Vec<Action> {
        let next = editor::transform_end(&mut self.registry, &mut self.scene, id, self.config.min_size);
        self.updated(next)
    }

    // --- Toolbar ---

    /// Switch tool. Surface subscriptions are rebuilt from scratch.
    pub fn set_tool(&mut self, tool: ToolMode) {
        self.toolbar.set_tool(tool);
        self.reconfigure_strokes();
        tracing::info!(?tool, "tool changed");
    }

    /// Color for shapes and strokes created from now on.
    pub fn set_color(&mut self, color: &str) {
        self.toolbar.set_color(color);
        self.reconfigure_strokes();
    }

    /// Add a `kind` shape at its default spot in the current color.
    pub fn create_shape(&mut self, kind: ShapeKind) -> Vec<Action> {
        let mut actions = Vec::new();
        let Some(shape) = toolbar::default_shape(kind, self.toolbar.color()) else {
            tracing::debug!(%kind, "kind has no default shape");
            return actions;
        };
        tracing::info!(id = %shape.id(), %kind, "shape created");
        self.registry.insert(shape.clone());
        actions.push(Action::ShapeCreated(shape));
        actions.push(Action::RenderNeeded);
        self.settle(&mut actions);
        actions
    }

    /// Compress an uploaded file and add it as an image shape.
    ///
    /// # Errors
    ///
    /// Returns the compressor's failure; no shape is added in that case.
    pub async fn create_image<C: ImageCompressor + ?Sized>(
        &mut self,
        compressor: &C,
        bytes: &[u8],
    ) -> Result<Vec<Action>, WhiteboardError> {
        let shape = match toolbar::compress_image(compressor, bytes, &self.config.image, self.toolbar.color()).await {
            Ok(shape) => shape,
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "image upload failed");
                return Err(e.into());
            }
        };
        tracing::info!(id = %shape.id(), bytes = bytes.len(), "image created");
        self.registry.insert(shape.clone());
        let mut actions = vec![Action::ShapeCreated(shape), Action::RenderNeeded];
        self.settle(&mut actions);
        Ok(actions)
    }

    /// Rasterize the board.
    ///
    /// # Errors
    ///
    /// Returns the scene's export failure.
    pub fn export_png(&self) -> Result<ExportedImage, WhiteboardError> {
        let data_url = self.scene.to_data_url(self.config.export_pixel_ratio)?;
        Ok(ExportedImage::new(data_url))
    }

    /// Remove every shape and the persisted state.
    ///
    /// # Errors
    ///
    /// Returns the storage failure if the persisted keys cannot be removed.
    /// The in-memory board is cleared either way.
    pub fn clear_board(&mut self) -> Result<Vec<Action>, WhiteboardError> {
        let mut actions = Vec::new();
        if let Some(session) = self.text_edit.take() {
            session.cancel(&mut self.scene);
            actions.push(Action::TextOverlayClosed);
        }
        self.deselect(&mut actions);
        for brush in self.registry.brushes().iter() {
            self.scene.destroy_node(&brush.id);
        }
        self.registry.clear();
        self.project();
        self.saved_revision = self.registry.revision();
        self.saved_ids.clear();
        self.scene.batch_draw();
        actions.push(Action::RenderNeeded);
        tracing::info!("board cleared");
        self.persistence.clear(&mut self.store)?;
        Ok(actions)
    }

    // --- Config panel ---

    /// Recolor the selected shape. Text is not recolorable.
    pub fn set_selected_color(&mut self, color: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        let Some(id) = self.selection.selected().cloned() else {
            return actions;
        };
        match toolbar::recolor(&mut self.registry, &mut self.scene, &id, color) {
            Recolor::Applied(next) => {
                actions.push(Action::ShapeUpdated(next));
                actions.push(Action::RenderNeeded);
            }
            Recolor::Unsupported => tracing::debug!(%id, "recolor unsupported for kind"),
            Recolor::Missing => {}
        }
        self.settle(&mut actions);
        actions
    }

    /// Restack the selected shape.
    pub fn reorder(&mut self, op: ZOp) -> Vec<Action> {
        let mut actions = Vec::new();
        let Some(id) = self.selection.selected().cloned() else {
            return actions;
        };
        if zorder::apply(&mut self.scene, &id, op) {
            tracing::debug!(%id, ?op, "shape restacked");
            actions.push(Action::RenderNeeded);
        }
        self.settle(&mut actions);
        actions
    }

    pub fn bring_forward(&mut self) -> Vec<Action> {
        self.reorder(ZOp::BringForward)
    }

    pub fn bring_to_front(&mut self) -> Vec<Action> {
        self.reorder(ZOp::BringToFront)
    }

    pub fn send_backward(&mut self) -> Vec<Action> {
        self.reorder(ZOp::SendBackward)
    }

    pub fn send_to_back(&mut self) -> Vec<Action> {
        self.reorder(ZOp::SendToBack)
    }

    // --- Internals ---

    fn select(&mut self, id: &ShapeId, actions: &mut Vec<Action>) {
        if self.selection.is_selected(id) {
            return;
        }
        if self.selection.select(&mut self.scene, id) {
            tracing::debug!(%id, "shape selected");
            actions.push(Action::SelectionChanged(Some(id.clone())));
            actions.push(Action::RenderNeeded);
        }
    }

    fn deselect(&mut self, actions: &mut Vec<Action>) {
        let had = self.selection.selected().is_some();
        self.selection.deselect(&mut self.scene);
        if had {
            actions.push(Action::SelectionChanged(None));
            actions.push(Action::RenderNeeded);
        }
    }

    fn finish_text_edit(&mut self, outcome: EditKey, actions: &mut Vec<Action>) {
        let Some(session) = self.text_edit.take() else {
            return;
        };
        let id = session.id().clone();
        match outcome {
            EditKey::Commit => {
                if let Some(next) = session.commit(&mut self.registry, &mut self.scene) {
                    actions.push(Action::ShapeUpdated(next));
                }
            }
            EditKey::Cancel | EditKey::Continue => session.cancel(&mut self.scene),
        }
        tracing::debug!(%id, ?outcome, "text edit finished");
        actions.push(Action::TextOverlayClosed);
        actions.push(Action::RenderNeeded);
    }

    fn updated(&mut self, next: Option<Shape>) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(next) = next {
            actions.push(Action::ShapeUpdated(next));
            actions.push(Action::RenderNeeded);
        }
        self.settle(&mut actions);
        actions
    }

    fn reconfigure_strokes(&mut self) {
        let config = BrushConfig {
            mode: self.toolbar.tool(),
            color: self.toolbar.color().to_owned(),
            width: self.config.brush_width,
            min_size: self.config.min_size,
        };
        self.strokes.configure(&mut self.scene, config);
    }

    /// Bring the scene in line with the registry for every projected kind:
    /// sync or create nodes for live records, destroy nodes whose record is
    /// gone. Brush nodes are left alone.
    fn project(&mut self) {
        let mut live = HashSet::new();
        for shape in self.registry.all_shapes() {
            if !shape.kind().is_projected() {
                continue;
            }
            live.insert(shape.id().clone());
            match self.scene.node_mut(shape.id()) {
                Some(node) => node.sync(&shape),
                None => self.scene.create_node(SceneNode::from_shape(&shape)),
            }
        }
        let stale: Vec<ShapeId> = self
            .scene
            .shape_order()
            .into_iter()
            .filter(|id| self.scene.node(id).is_some_and(|n| n.kind.is_projected()) && !live.contains(id))
            .collect();
        for id in &stale {
            self.scene.destroy_node(id);
        }

        match self.selection.selected().cloned() {
            Some(id) if self.scene.node(&id).is_none() => {
                self.selection.forget();
                self.scene.handle_mut().detach();
            }
            Some(id) => seat_handle(&mut self.scene, &id),
            None => {}
        }
        self.projected_revision = self.registry.revision();
    }

    /// Committed strokes restored from storage need their nodes back.
    fn hydrate_brushes(&mut self) {
        for brush in self.registry.brushes().iter() {
            if self.scene.node(&brush.id).is_none() {
                self.scene.create_node(SceneNode::from_shape(&Shape::Brush(brush.clone())));
            }
        }
    }

    fn settle(&mut self, actions: &mut Vec<Action>) {
        if self.registry.revision() != self.projected_revision {
            self.project();
        }

        let revision = self.registry.revision();
        if revision != self.saved_revision {
            self.saved_revision = revision;
            if let Err(e) = self.persistence.save_shapes(&mut self.store, &self.registry.get_all()) {
                persist_failed(&e, actions);
            }
        }

        let ids = self.scene.shape_order();
        if ids != self.saved_ids {
            if let Err(e) = self.persistence.save_ids(&mut self.store, &ids) {
                persist_failed(&e, actions);
            }
            self.saved_ids = ids;
        }
    }
}

fn persist_failed(e: &StorageError, actions: &mut Vec<Action>) {
    tracing::warn!(error = %e, code = e.error_code(), "session save failed");
    actions.push(Action::PersistFailed { code: e.error_code(), message: e.to_string() });
}
