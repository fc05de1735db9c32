#![allow(clippy::float_cmp)]

use super::*;
use crate::error::{ImageError, SceneError};
use crate::geometry::BoundBox;
use crate::storage::MemoryStore;

// =============================================================
// Helpers
// =============================================================

type Core = EngineCore<MemoryScene, MemoryStore>;

fn core() -> Core {
    core_with(MemoryStore::new())
}

fn core_with(store: MemoryStore) -> Core {
    let mut c = EngineCore::headless(WhiteboardConfig::default(), store);
    c.load();
    c
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn key(name: &str) -> Key {
    Key::new(name)
}

fn no_modifiers() -> Modifiers {
    Modifiers::default()
}

fn created(actions: &[Action]) -> ShapeId {
    actions
        .iter()
        .find_map(|a| match a {
            Action::ShapeCreated(s) => Some(s.id().clone()),
            _ => None,
        })
        .expect("a shape was created")
}

fn add(c: &mut Core, kind: ShapeKind) -> ShapeId {
    created(&c.create_shape(kind))
}

fn draw(c: &mut Core, points: &[(f64, f64)]) -> ShapeId {
    c.set_tool(ToolMode::Brush);
    let (first, rest) = points.split_first().expect("at least one point");
    c.on_pointer_down(pt(first.0, first.1));
    for (x, y) in rest {
        c.on_pointer_move(pt(*x, *y));
    }
    let id = created(&c.on_pointer_up(pt(0.0, 0.0)));
    c.set_tool(ToolMode::Default);
    id
}

struct FixedCompressor(Result<String, ImageError>);

#[async_trait::async_trait(?Send)]
impl ImageCompressor for FixedCompressor {
    async fn compress(&self, _bytes: &[u8], _options: &crate::config::ImageOptions) -> Result<String, ImageError> {
        self.0.clone()
    }
}

// =============================================================
// Creation
// =============================================================

#[test]
fn created_shapes_have_unique_tagged_ids() {
    let mut c = core();
    let mut seen = HashSet::new();
    for kind in [ShapeKind::Rectangle, ShapeKind::Circle, ShapeKind::Line, ShapeKind::Arrow, ShapeKind::Text] {
        let id = add(&mut c, kind);
        assert_eq!(id.kind(), Some(kind));
        assert!(seen.insert(id.clone()));
        assert_eq!(c.registry().find(&id).map(|s| s.kind()), Some(kind));
        assert!(c.scene().node(&id).is_some());
    }
}

#[test]
fn creation_uses_current_color_only() {
    let mut c = core();
    c.set_color("#ff0000");
    let red = add(&mut c, ShapeKind::Rectangle);
    c.set_color("#00ff00");
    add(&mut c, ShapeKind::Rectangle);

    assert_eq!(c.registry().find(&red).and_then(|s| s.color().map(str::to_owned)).as_deref(), Some("#ff0000"));
    assert_eq!(c.registry().rectangles()[1].fill, "#00ff00");
}

#[test]
fn creation_is_persisted_immediately() {
    let mut c = core();
    add(&mut c, ShapeKind::Circle);
    let items = c.store().items();
    assert!(items.contains_key("WHITEBOARD_SHAPES"));
    assert!(items.contains_key("WHITEBOARD_IDS"));
}

#[tokio::test]
async fn image_upload_inserts_compressed_image() {
    let mut c = core();
    let ok = FixedCompressor(Ok("data:image/jpeg;base64,AAAA".into()));
    let actions = c.create_image(&ok, b"raw").await.expect("created");

    let id = created(&actions);
    assert_eq!(c.registry().images().len(), 1);
    assert_eq!(c.registry().images()[0].image_url, "data:image/jpeg;base64,AAAA");
    assert!(c.scene().node(&id).is_some());
}

#[tokio::test]
async fn failed_image_upload_inserts_nothing() {
    let mut c = core();
    let failing = FixedCompressor(Err(ImageError::Decode("garbage".into())));
    let err = c.create_image(&failing, b"raw").await.expect_err("fails");

    assert_eq!(err.error_code(), "E_IMAGE_DECODE");
    assert!(c.registry().is_empty());
    assert!(c.scene().is_empty());
}

// =============================================================
// Selection and resize
// =============================================================

#[test]
fn rectangle_resize_to_twenty_commits_floor() {
    let mut c = core();
    c.set_color("red");
    let id = add(&mut c, ShapeKind::Rectangle);
    c.scene_mut().drag_to(&id, pt(10.0, 10.0));
    c.on_drag_end(&id);

    c.on_click(pt(50.0, 50.0));
    assert!(c.is_selected(&id));
    c.scene_mut().resize_to(BoundBox::new(10.0, 10.0, 20.0, 20.0));
    c.on_transform_end(&id);

    let r = &c.registry().rectangles()[0];
    assert_eq!((r.x, r.y, r.width, r.height), (10.0, 10.0, 50.0, 50.0));
    assert_eq!(r.fill, "red");
}

#[test]
fn resize_never_commits_below_floor() {
    let mut c = core();
    for kind in [ShapeKind::Rectangle, ShapeKind::Circle, ShapeKind::Line, ShapeKind::Text] {
        let id = add(&mut c, kind);
        c.scene_mut().drag_to(&id, pt(600.0, 600.0));
        c.on_drag_end(&id);
        let b = c.registry().find(&id).expect("record").bounds();
        c.on_click(pt(b.x + b.width / 2.0, b.y + b.height / 2.0));
        assert!(c.is_selected(&id), "{kind} selected");

        c.scene_mut().resize_to(BoundBox::new(b.x, b.y, 1.0, 1.0));
        c.on_transform_end(&id);

        let committed = c.registry().find(&id).expect("record");
        match committed {
            Shape::Rectangle(s) | Shape::Circle(s) => assert!(s.width >= 50.0 && s.height >= 50.0),
            Shape::Line(s) => assert!(s.height >= 50.0),
            Shape::Text(s) => assert!(s.width >= 50.0),
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[test]
fn selecting_second_shape_deselects_first() {
    let mut c = core();
    let a = add(&mut c, ShapeKind::Rectangle);
    c.scene_mut().drag_to(&a, pt(400.0, 400.0));
    c.on_drag_end(&a);
    let b = add(&mut c, ShapeKind::Rectangle);

    c.on_click(pt(450.0, 450.0));
    assert!(c.is_selected(&a));
    let actions = c.on_click(pt(100.0, 100.0));

    assert!(c.is_selected(&b));
    assert!(!c.is_selected(&a));
    assert_eq!(c.scene().handle().nodes(), &[b.clone()]);
    assert!(actions.contains(&Action::SelectionChanged(Some(b))));
}

#[test]
fn background_click_deselects() {
    let mut c = core();
    let id = add(&mut c, ShapeKind::Rectangle);
    c.on_click(pt(100.0, 100.0));
    assert!(c.is_selected(&id));

    let actions = c.on_click(pt(900.0, 900.0));

    assert!(c.selected().is_none());
    assert!(c.scene().handle().nodes().is_empty());
    assert!(actions.contains(&Action::SelectionChanged(None)));
}

#[test]
fn select_shape_by_id_seats_handle() {
    let mut c = core();
    let a = add(&mut c, ShapeKind::Rectangle);
    let b = add(&mut c, ShapeKind::Circle);

    let actions = c.select_shape(&a);

    assert!(c.is_selected(&a));
    assert!(actions.contains(&Action::SelectionChanged(Some(a.clone()))));
    assert_eq!(c.scene().shape_order(), vec![a, b]);
    assert!(c.clear_selection().contains(&Action::SelectionChanged(None)));
    assert!(c.selected().is_none());
}

#[test]
fn select_unknown_id_changes_nothing() {
    let mut c = core();
    add(&mut c, ShapeKind::Rectangle);
    assert!(c.select_shape(&ShapeId::from_raw("rect~missing")).is_empty());
    assert!(c.selected().is_none());
}

// =============================================================
// Freehand
// =============================================================

#[test]
fn stroke_commits_six_numbers_and_is_selectable() {
    let mut c = core();
    let id = draw(&mut c, &[(10.0, 10.0), (20.0, 15.0), (30.0, 25.0)]);

    assert_eq!(c.registry().brushes().len(), 1);
    assert_eq!(c.registry().brushes()[0].points.len(), 6);
    assert!(c.registry().brushes()[0].id.is_kind(ShapeKind::Brush));

    c.on_click(pt(20.0, 15.0));
    assert!(c.is_selected(&id));
}

#[test]
fn stroke_is_selectable_without_leaving_brush_mode() {
    let mut c = core();
    c.set_tool(ToolMode::Brush);
    c.on_pointer_down(pt(10.0, 10.0));
    c.on_pointer_move(pt(20.0, 15.0));
    c.on_pointer_move(pt(30.0, 25.0));
    let id = created(&c.on_pointer_up(pt(30.0, 25.0)));
    assert_eq!(c.registry().brushes()[0].points.len(), 6);

    let actions = c.on_click(pt(20.0, 15.0));

    assert!(c.is_selected(&id));
    assert_eq!(c.scene().handle().nodes(), &[id.clone()]);
    assert!(actions.contains(&Action::SelectionChanged(Some(id))));
}

#[test]
fn brush_mode_click_does_not_select_other_kinds() {
    let mut c = core();
    let rect = add(&mut c, ShapeKind::Rectangle);
    c.set_tool(ToolMode::Brush);

    c.on_click(pt(100.0, 100.0));

    assert!(!c.is_selected(&rect));
}

#[test]
fn clicking_brush_keeps_it_selected() {
    let mut c = core();
    let id = draw(&mut c, &[(10.0, 10.0), (90.0, 10.0)]);
    c.on_click(pt(50.0, 10.0));
    let actions = c.on_click(pt(50.0, 10.0));
    assert!(c.is_selected(&id));
    assert!(!actions.contains(&Action::SelectionChanged(None)));
}

#[test]
fn pointer_events_are_ignored_in_default_mode() {
    let mut c = core();
    assert!(c.on_pointer_down(pt(1.0, 1.0)).is_empty());
    assert!(c.on_pointer_up(pt(1.0, 1.0)).is_empty());
    assert!(c.registry().is_empty());
}

#[test]
fn dragging_stroke_commits_position() {
    let mut c = core();
    let id = draw(&mut c, &[(10.0, 10.0), (20.0, 20.0)]);
    c.scene_mut().drag_to(&id, pt(5.0, 7.0));
    c.on_drag_end(&id);
    let b = &c.registry().brushes()[0];
    assert_eq!((b.x, b.y), (5.0, 7.0));
}

// =============================================================
// Z-order
// =============================================================

#[test]
fn bring_forward_lifts_rectangle_over_circle() {
    let mut c = core();
    let r1 = add(&mut c, ShapeKind::Rectangle);
    let c1 = add(&mut c, ShapeKind::Circle);
    assert_eq!(c.scene().shape_order(), vec![r1.clone(), c1.clone()]);

    c.on_click(pt(140.0, 140.0));
    assert!(c.is_selected(&r1));
    c.bring_forward();

    assert_eq!(c.scene().shape_order(), vec![c1, r1.clone()]);
    let saved: Vec<ShapeId> =
        serde_json::from_str(&c.store().items()["WHITEBOARD_IDS"]).expect("ids persisted");
    assert_eq!(saved.last(), Some(&r1));
}

#[test]
fn boundary_reorders_change_nothing() {
    let mut c = core();
    let bottom = add(&mut c, ShapeKind::Rectangle);
    c.scene_mut().drag_to(&bottom, pt(400.0, 400.0));
    c.on_drag_end(&bottom);
    let top = add(&mut c, ShapeKind::Rectangle);
    let before = c.scene().shape_order();

    c.on_click(pt(450.0, 450.0));
    assert!(c.send_to_back().is_empty());
    c.on_click(pt(100.0, 100.0));
    assert!(c.is_selected(&top));
    assert!(c.bring_to_front().is_empty());

    assert_eq!(c.scene().shape_order(), before);
}

#[test]
fn reorder_without_selection_is_a_no_op() {
    let mut c = core();
    add(&mut c, ShapeKind::Rectangle);
    add(&mut c, ShapeKind::Rectangle);
    let before = c.scene().shape_order();
    assert!(c.send_to_back().is_empty());
    assert_eq!(c.scene().shape_order(), before);
}

// =============================================================
// Deletion
// =============================================================

#[test]
fn delete_removes_only_selected_shape() {
    let mut c = core();
    let rect = add(&mut c, ShapeKind::Rectangle);
    add(&mut c, ShapeKind::Line);
    add(&mut c, ShapeKind::Text);
    c.on_click(pt(140.0, 60.0));
    assert!(c.is_selected(&rect));
    let before = c.registry().get_all();

    let actions = c.on_key_down(&key("Delete"), no_modifiers());

    assert!(actions.contains(&Action::ShapeDeleted { id: rect.clone() }));
    let after = c.registry().get_all();
    assert!(after.rectangles.is_empty());
    assert_eq!(after.lines, before.lines);
    assert_eq!(after.texts, before.texts);
    assert!(c.scene().node(&rect).is_none());
    assert!(c.selected().is_none());
}

#[test]
fn delete_stroke_destroys_its_node() {
    let mut c = core();
    let id = draw(&mut c, &[(10.0, 10.0), (90.0, 10.0)]);
    c.on_click(pt(50.0, 10.0));

    c.on_key_down(&key("Delete"), no_modifiers());

    assert!(c.registry().brushes().is_empty());
    assert!(c.scene().node(&id).is_none());
}

#[test]
fn backspace_does_not_delete() {
    let mut c = core();
    let id = add(&mut c, ShapeKind::Rectangle);
    c.on_click(pt(100.0, 100.0));
    c.on_key_down(&key("Backspace"), no_modifiers());
    assert!(c.registry().contains(&id));
}

// =============================================================
// Text editing
// =============================================================

fn start_editing(c: &mut Core) -> ShapeId {
    let id = add(c, ShapeKind::Text);
    let actions = c.on_dbl_click(pt(60.0, 85.0));
    assert!(actions.iter().any(|a| matches!(a, Action::TextOverlay(l) if l.text == "Write here")));
    assert!(c.is_editing_text());
    assert!(!c.scene().node(&id).expect("node").visible);
    id
}

#[test]
fn edit_text_by_id_opens_overlay() {
    let mut c = core();
    let id = add(&mut c, ShapeKind::Text);
    let rect = add(&mut c, ShapeKind::Rectangle);

    assert!(c.edit_text(&rect).is_empty());
    let actions = c.edit_text(&id);

    assert!(actions.iter().any(|a| matches!(a, Action::TextOverlay(_))));
    assert!(c.is_selected(&id));
    c.text_input("by id");
    c.on_key_down(&key("Enter"), no_modifiers());
    assert_eq!(c.registry().texts()[0].text, "by id");
}

#[test]
fn enter_commits_text() {
    let mut c = core();
    start_editing(&mut c);
    c.text_input("Hello");

    let actions = c.on_key_down(&key("Enter"), no_modifiers());

    assert_eq!(c.registry().texts()[0].text, "Hello");
    assert!(actions.contains(&Action::TextOverlayClosed));
    assert!(!c.is_editing_text());
}

#[test]
fn escape_leaves_text_unchanged() {
    let mut c = core();
    let id = start_editing(&mut c);
    c.text_input("Hello");

    c.on_key_down(&key("Escape"), no_modifiers());

    assert_eq!(c.registry().texts()[0].text, "Write here");
    assert!(c.scene().node(&id).expect("node").visible);
    assert!(c.scene().handle().is_visible());
}

#[test]
fn outside_click_commits_text() {
    let mut c = core();
    start_editing(&mut c);
    c.text_input("Hello");

    c.on_click(pt(900.0, 900.0));

    assert_eq!(c.registry().texts()[0].text, "Hello");
    assert!(!c.is_editing_text());
}

#[test]
fn delete_key_while_editing_does_not_delete() {
    let mut c = core();
    let id = start_editing(&mut c);
    c.on_key_down(&key("Delete"), no_modifiers());
    assert!(c.registry().contains(&id));
    assert!(c.is_editing_text());
}

// =============================================================
// Config panel
// =============================================================

#[test]
fn recolor_selected_shape() {
    let mut c = core();
    let id = add(&mut c, ShapeKind::Rectangle);
    c.on_click(pt(100.0, 100.0));

    let actions = c.set_selected_color("#123456");

    assert_eq!(c.registry().rectangles()[0].fill, "#123456");
    assert!(actions.iter().any(|a| matches!(a, Action::ShapeUpdated(s) if s.id() == &id)));
    assert_eq!(c.scene().node(&id).expect("node").style.fill.as_deref(), Some("#123456"));
}

#[test]
fn recolor_text_does_nothing() {
    let mut c = core();
    add(&mut c, ShapeKind::Text);
    c.on_click(pt(60.0, 85.0));
    let rev = c.registry().revision();
    assert!(c.set_selected_color("#123456").is_empty());
    assert_eq!(c.registry().revision(), rev);
}

// =============================================================
// Persistence
// =============================================================

#[test]
fn save_and_reload_round_trips() {
    let mut c = core();
    add(&mut c, ShapeKind::Rectangle);
    add(&mut c, ShapeKind::Arrow);
    add(&mut c, ShapeKind::Text);
    draw(&mut c, &[(10.0, 10.0), (30.0, 30.0), (50.0, 10.0)]);
    c.save().expect("saved");

    let reloaded = core_with(c.store().clone());

    assert_eq!(reloaded.registry().get_all(), c.registry().get_all());
    assert_eq!(reloaded.scene().shape_order(), c.scene().shape_order());
}

#[test]
fn reload_restores_stroke_nodes() {
    let mut c = core();
    let id = draw(&mut c, &[(10.0, 10.0), (90.0, 10.0)]);

    let mut reloaded = core_with(c.store().clone());

    assert!(reloaded.scene().node(&id).is_some_and(|n| n.interactive));
    reloaded.on_click(pt(50.0, 10.0));
    assert!(reloaded.is_selected(&id));
}

#[test]
fn reload_restores_stacking() {
    let mut c = core();
    let r1 = add(&mut c, ShapeKind::Rectangle);
    let c1 = add(&mut c, ShapeKind::Circle);
    c.on_click(pt(140.0, 140.0));
    c.bring_forward();

    let reloaded = core_with(c.store().clone());
    assert_eq!(reloaded.scene().shape_order(), vec![c1, r1]);
}

#[test]
fn corrupt_state_loads_empty_board() {
    let mut store = MemoryStore::new();
    store.set_item("WHITEBOARD_SHAPES", "{not json").expect("write");
    store.set_item("WHITEBOARD_IDS", "42").expect("write");

    let c = core_with(store);

    assert!(c.registry().is_empty());
    assert!(c.scene().is_empty());
}

#[test]
fn legacy_key_is_read_when_split_key_absent() {
    let mut store = MemoryStore::new();
    let legacy = r##"{"rectangles":[{"id":"rect~old","x":1,"y":2,"width":60,"height":70,"fill":"#000"}]}"##;
    store.set_item("WHITEBOARD", legacy).expect("write");

    let c = core_with(store);

    assert_eq!(c.registry().rectangles().len(), 1);
    assert!(c.scene().node(&"rect~old".into()).is_some());
}

#[test]
fn legacy_line_without_height_resizes_to_chosen_size() {
    let mut store = MemoryStore::new();
    let legacy = r##"{"lines":[{"id":"line~a","points":[0,0,100,100],"stroke":"#000","strokeWidth":4}]}"##;
    store.set_item("WHITEBOARD", legacy).expect("write");
    let mut c = core_with(store);
    let id = ShapeId::from_raw("line~a");

    c.select_shape(&id);
    let b = c.scene().node(&id).expect("node").bounds();
    c.scene_mut().resize_to(BoundBox { height: 200.0, ..b });
    c.on_transform_end(&id);

    let line = &c.registry().lines()[0];
    assert_eq!(line.points, vec![0.0, 0.0, 100.0, 200.0]);
    assert_eq!(line.height, 200.0);
}

#[test]
fn failed_background_save_is_reported() {
    let mut c = core_with(MemoryStore::read_only());
    let actions = c.create_shape(ShapeKind::Rectangle);

    assert!(
        actions
            .iter()
            .any(|a| matches!(a, Action::PersistFailed { code, .. } if *code == "E_STORAGE_WRITE"))
    );
    assert_eq!(c.registry().len(), 1);
}

#[test]
fn explicit_save_surfaces_storage_error() {
    let mut c = core_with(MemoryStore::read_only());
    let err = c.save().expect_err("read-only store");
    assert_eq!(err.error_code(), "E_STORAGE_WRITE");
}

// =============================================================
// Toolbar
// =============================================================

#[test]
fn export_without_raster_backend_fails() {
    let c = core();
    let err = c.export_png().expect_err("headless scene");
    assert!(matches!(err, WhiteboardError::Scene(SceneError::ExportUnsupported)));
}

#[test]
fn clear_board_empties_everything() {
    let mut c = core();
    add(&mut c, ShapeKind::Rectangle);
    let stroke = draw(&mut c, &[(10.0, 10.0), (90.0, 10.0)]);
    c.on_click(pt(50.0, 10.0));

    c.clear_board().expect("cleared");

    assert!(c.registry().is_empty());
    assert!(c.scene().is_empty());
    assert!(c.scene().node(&stroke).is_none());
    assert!(c.selected().is_none());
    assert!(c.store().items().is_empty());
}

#[test]
fn switching_tools_rebuilds_subscriptions() {
    let mut c = core();
    c.set_tool(ToolMode::Brush);
    c.set_tool(ToolMode::Brush);
    assert!(c.scene().is_listening(crate::scene::SurfaceEvent::PointerDown));
    assert!(!c.scene().is_listening(crate::scene::SurfaceEvent::Click));
    c.set_tool(ToolMode::Default);
    assert!(c.scene().is_listening(crate::scene::SurfaceEvent::Click));
    assert_eq!(c.toolbar().tool(), ToolMode::Default);
}
