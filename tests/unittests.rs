use std::collections::BTreeSet;
use std::path::PathBuf;

use uuid::Uuid;
use vicoo_galaxy::canvas::geometry::{Point, Rect};
use vicoo_galaxy::canvas::interaction::{CanvasEvent, Effect, Interaction, Mode, PointerButton};
use vicoo_galaxy::canvas::viewport::{Viewport, FIT_PADDING, MAX_SCALE, MIN_SCALE};
use vicoo_galaxy::graph_utils::galaxy::{GalaxyStore, NodeId, NodePatch, NoteSeed};
use vicoo_galaxy::graph_utils::style::{LinkStyle, NoteCategory, PALETTE};
use vicoo_galaxy::persistence::export;
use vicoo_galaxy::persistence::persist::{self, GalaxyStateFile};
use vicoo_galaxy::persistence::settings::{AppSettings, Environment, Language, UiText};

fn origin_viewport() -> Viewport {
    Viewport::centered(0.0, 0.0)
}

fn two_node_store() -> (GalaxyStore, NodeId, NodeId) {
    let mut store = GalaxyStore::new();
    let a = store.create_node(0.0, 0.0).expect("node a");
    let b = store.create_node(100.0, 0.0).expect("node b");
    (store, a, b)
}

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("vicoo-galaxy-test-{}", Uuid::now_v7()))
}

fn down(x: f32, y: f32, shift: bool, hit: Option<NodeId>) -> CanvasEvent {
    CanvasEvent::PointerDown { pos: Point::new(x, y), button: PointerButton::Primary, shift, hit }
}

fn mv(x: f32, y: f32) -> CanvasEvent {
    CanvasEvent::PointerMove { pos: Point::new(x, y) }
}

fn up(x: f32, y: f32, hit: Option<NodeId>) -> CanvasEvent {
    CanvasEvent::PointerUp { pos: Point::new(x, y), hit }
}

fn shift_drag_link(store: &mut GalaxyStore, vp: &mut Viewport, from: NodeId, to: NodeId) -> Effect {
    let mut ix = Interaction::new();
    ix.handle(down(0.0, 0.0, true, Some(from)), store, vp);
    ix.handle(mv(50.0, 0.0), store, vp);
    let effect = ix.handle(up(100.0, 0.0, Some(to)), store, vp);
    assert_eq!(ix.mode(), Mode::Idle);
    effect
}

// Viewport

#[test]
fn viewport_round_trip_world_screen_world() {
    let viewports = [
        origin_viewport(),
        Viewport::centered(1280.0, 720.0),
        Viewport::new(-123.5, 88.25, 0.2),
        Viewport::new(17.0, -900.0, 2.75),
    ];
    let points = [Point::new(0.0, 0.0), Point::new(40.0, -40.0), Point::new(-1234.5, 987.25)];
    for v in &viewports {
        for w in points {
            let back = v.screen_to_world(v.world_to_screen(w));
            assert!((back.x - w.x).abs() < 1e-3 && (back.y - w.y).abs() < 1e-3, "{:?} -> {:?}", w, back);
        }
    }
}

#[test]
fn viewport_screen_to_world_formula() {
    let v = Viewport::new(100.0, 50.0, 2.0);
    assert_eq!(v.screen_to_world(Point::new(300.0, 250.0)), Point::new(100.0, 100.0));
}

#[test]
fn viewport_zoom_is_clamped_for_any_sequence() {
    let mut v = origin_viewport();
    for delta in [500.0, 5000.0, -10000.0, 1.0e9, -1.0e9, 37.0, -0.5, f32::INFINITY, f32::NAN] {
        v.zoom(delta);
        assert!(v.scale >= MIN_SCALE && v.scale <= MAX_SCALE, "scale {} after {}", v.scale, delta);
    }
}

#[test]
fn wheel_large_zoom_in_saturates_at_max() {
    let mut store = GalaxyStore::new();
    let mut v = origin_viewport();
    let mut ix = Interaction::new();
    for _ in 0..100 {
        ix.handle(CanvasEvent::Wheel { delta_y: -1000.0 }, &mut store, &mut v);
    }
    assert_eq!(v.scale, 3.0);
    for _ in 0..100 {
        ix.handle(CanvasEvent::Wheel { delta_y: 1000.0 }, &mut store, &mut v);
    }
    assert_eq!(v.scale, 0.2);
}

#[test]
fn viewport_reset_and_focus() {
    let mut v = Viewport::centered(800.0, 600.0);
    v.pan(30.0, -20.0);
    v.zoom(500.0);
    v.reset();
    assert_eq!((v.x, v.y, v.scale), (400.0, 300.0, 1.0));

    v.zoom(900.0);
    v.focus_on(Point::new(100.0, 50.0), Point::new(400.0, 300.0));
    assert_eq!(v.scale, 1.0);
    assert_eq!(v.world_to_screen(Point::new(100.0, 50.0)), Point::new(400.0, 300.0));
}

#[test]
fn viewport_reset_returns_to_moved_home() {
    let mut v = Viewport::centered(800.0, 600.0);
    v.set_home(Point::new(640.0, 360.0));
    v.pan(-75.0, 12.0);
    v.zoom(-400.0);
    v.reset();
    assert_eq!((v.x, v.y, v.scale), (640.0, 360.0, 1.0));

    v.set_home(Point::new(f32::NAN, 0.0));
    assert_eq!(v.home(), Point::new(640.0, 360.0), "non-finite home is ignored");
}

#[test]
fn viewport_fit_centres_bounds_within_scale_limits() {
    let canvas = Rect::from_min_size(Point::ZERO, 800.0, 600.0);
    let mut v = origin_viewport();

    // Small cluster: would need more than MAX_SCALE
    let (store, _, _) = two_node_store();
    let bounds = store.bounds().expect("non-empty");
    v.fit(&bounds, &canvas);
    assert_eq!(v.scale, MAX_SCALE);
    let c = v.world_to_screen(bounds.center());
    assert!((c.x - 400.0).abs() < 1e-3 && (c.y - 300.0).abs() < 1e-3, "{:?}", c);

    // Wide row: width decides, and both ends land inside the padding
    let mut wide = GalaxyStore::new();
    wide.create_node(0.0, 0.0).unwrap();
    wide.create_node(1000.0, 0.0).unwrap();
    let bounds = wide.bounds().unwrap();
    v.fit(&bounds, &canvas);
    assert!(v.scale > MIN_SCALE && v.scale < 1.0, "scale {}", v.scale);
    let left = v.world_to_screen(bounds.min);
    let right = v.world_to_screen(bounds.max);
    assert!((left.x - FIT_PADDING).abs() < 1e-2, "left {}", left.x);
    assert!((right.x - (800.0 - FIT_PADDING)).abs() < 1e-2, "right {}", right.x);

    // Huge spread bottoms out at MIN_SCALE
    let mut huge = GalaxyStore::new();
    huge.create_node(-20_000.0, 0.0).unwrap();
    huge.create_node(20_000.0, 0.0).unwrap();
    v.fit(&huge.bounds().unwrap(), &canvas);
    assert_eq!(v.scale, MIN_SCALE);
}

#[test]
fn viewport_sanitized_repairs_out_of_range_values() {
    let mut v = Viewport::new(10.0, 20.0, 1.0);
    v.scale = 0.0;
    assert_eq!(v.clone().sanitized().scale, MIN_SCALE);
    v.scale = 40.0;
    assert_eq!(v.clone().sanitized().scale, MAX_SCALE);
    v.scale = f32::NAN;
    v.x = f32::INFINITY;
    let fixed = v.sanitized();
    assert_eq!(fixed.scale, 1.0);
    assert_eq!((fixed.x, fixed.y), (10.0, 20.0));
}

// Store

#[test]
fn store_create_node_defaults_and_rejects_non_finite() {
    let mut store = GalaxyStore::new();
    let id = store.create_node(12.0, -3.0).expect("created");
    let n = store.find_node(id).expect("present");
    assert_eq!((n.x, n.y), (12.0, -3.0));
    assert_eq!(n.label, "New Idea");
    assert_eq!(n.icon, "lightbulb");
    assert_eq!(n.color, "#FFD166");
    assert!(n.tags.is_empty());
    assert!(store.create_node(f32::NAN, 0.0).is_none());
    assert_eq!(store.node_count(), 1);
}

#[test]
fn store_no_duplicate_or_self_links() {
    let (mut store, a, b) = two_node_store();
    assert!(store.create_link(a, b).is_some());
    assert!(store.create_link(a, b).is_none());
    assert!(store.create_link(b, a).is_none(), "reverse direction is the same pair");
    assert!(store.create_link(a, a).is_none());
    assert!(store.create_link(a, Uuid::now_v7()).is_none(), "missing endpoint");
    assert_eq!(store.link_count(), 1);
}

#[test]
fn store_move_unknown_node_is_silent() {
    let (mut store, a, _) = two_node_store();
    let before = store.clone();
    store.move_node(Uuid::now_v7(), 5.0, 5.0);
    assert_eq!(store, before);
    store.move_node(a, 7.0, 8.0);
    assert_eq!(store.find_node(a).map(|n| (n.x, n.y)), Some((7.0, 8.0)));
}

#[test]
fn store_update_node_merges_fields() {
    let (mut store, a, _) = two_node_store();
    let tags: BTreeSet<String> = ["rust".to_string(), "canvas".to_string()].into_iter().collect();
    assert!(store.update_node(a, NodePatch {
        label: Some("Orbit".into()),
        tags: Some(tags.clone()),
        ..Default::default()
    }));
    let n = store.find_node(a).unwrap();
    assert_eq!(n.label, "Orbit");
    assert_eq!(n.tags, tags);
    assert_eq!(n.description, "Double-clicked to create.", "untouched field kept");
    assert!(!store.update_node(Uuid::now_v7(), NodePatch::default()));
}

#[test]
fn store_delete_node_cascades_links() {
    let (mut store, a, b) = two_node_store();
    let c = store.create_node(0.0, 100.0).unwrap();
    store.create_link(a, b).unwrap();
    store.create_link(b, c).unwrap();
    let ac = store.create_link(a, c).unwrap();
    assert_eq!(store.degree(b), 2);

    assert!(store.delete_node(b));
    assert!(store.find_node(b).is_none());
    assert_eq!(store.link_count(), 1);
    assert!(store.find_link(ac).is_some());
    assert!(!store.delete_node(b), "second delete is a no-op");

    assert!(store.delete_link(ac));
    assert_eq!(store.link_count(), 0);
}

#[test]
fn store_filter_by_label_is_case_insensitive() {
    let mut store = GalaxyStore::new();
    for (i, label) in ["Rust Notes", "rusty nail", "Design"].into_iter().enumerate() {
        let id = store.create_node(i as f32, 0.0).unwrap();
        store.update_node(id, NodePatch { label: Some(label.into()), ..Default::default() });
    }
    let hits: Vec<&str> = store.filter_by_label("RUST").into_iter().map(|n| n.label.as_str()).collect();
    assert_eq!(hits.len(), 2);
    assert!(hits.contains(&"Rust Notes") && hits.contains(&"rusty nail"));
    assert_eq!(store.filter_by_label("").len(), 3);
    assert!(store.filter_by_label("zzz").is_empty());
}

#[test]
fn store_node_at_uses_kind_radius() {
    let (store, a, b) = two_node_store();
    assert_eq!(store.node_at(Point::new(10.0, 10.0), 1.0), Some(a));
    assert_eq!(store.node_at(Point::new(95.0, 0.0), 1.0), Some(b));
    assert_eq!(store.node_at(Point::new(50.0, 0.0), 1.0), None);
}

#[test]
fn store_add_note_nodes_skips_linked_notes() {
    let mut store = GalaxyStore::new();
    let notes = vec![
        NoteSeed {
            id: "n1".into(),
            title: "A very long note title that keeps going".into(),
            content: "# Heading with **bold** and `code`".into(),
            category: Some(NoteCategory::Code),
            tags: vec!["rust".into()],
        },
        NoteSeed { id: "a2".into(), title: "Short".into(), content: String::new(), category: None, tags: vec![] },
        NoteSeed { id: "a2".into(), title: "Dup".into(), content: String::new(), category: None, tags: vec![] },
    ];
    let created = store.add_note_nodes(&notes);
    assert_eq!(created.len(), 2);

    let first = store.find_node(created[0]).unwrap();
    assert_eq!(first.label, "A very long note tit...");
    assert_eq!(first.description, " Heading with bold and code");
    assert_eq!(first.color, NoteCategory::Code.style().color);
    assert_eq!(first.linked_note_id.as_deref(), Some("n1"));
    assert!(first.tags.contains("rust"));

    let second = store.find_node(created[1]).unwrap();
    assert_eq!(second.color, PALETTE[('a' as usize) % PALETTE.len()]);

    assert!(store.add_note_nodes(&notes).is_empty(), "already linked");
    assert!(store.orphans().is_empty());
}

#[test]
fn store_orphans_and_connect_note() {
    let (mut store, a, b) = two_node_store();
    assert_eq!(store.orphans().len(), 2);
    assert!(store.connect_note(a, "note-1".into()));
    let orphans: Vec<NodeId> = store.orphans().iter().map(|n| n.id).collect();
    assert_eq!(orphans, vec![b]);
}

#[test]
fn store_styled_link_keeps_style_and_still_dedups() {
    let (mut store, a, b) = two_node_store();
    let id = store.create_link_styled(a, b, LinkStyle::Dashed).expect("new link");
    assert_eq!(store.find_link(id).map(|l| l.style), Some(LinkStyle::Dashed));
    assert!(store.create_link_styled(b, a, LinkStyle::Solid).is_none());
    assert_eq!(store.link_count(), 1);
}

#[test]
fn store_bounds_cover_node_discs() {
    assert!(GalaxyStore::new().bounds().is_none());
    let (store, _, _) = two_node_store();
    let b = store.bounds().unwrap();
    assert_eq!(b.min, Point::new(-28.0, -28.0));
    assert_eq!(b.max, Point::new(128.0, 28.0));
}

#[test]
fn store_replace_with_notes_clears_first() {
    let (mut store, a, b) = two_node_store();
    store.create_link(a, b).unwrap();
    let notes = vec![NoteSeed { id: "n1".into(), title: "Only".into(), content: String::new(), category: None, tags: vec![] }];
    let created = store.replace_with_notes(&notes);
    assert_eq!(created.len(), 1);
    assert_eq!(store.node_count(), 1);
    assert_eq!(store.link_count(), 0);
    assert!(store.find_node(a).is_none());
}

#[test]
fn seeded_store_is_connected_hub() {
    let store = GalaxyStore::seeded();
    assert_eq!(store.node_count(), 5);
    assert_eq!(store.link_count(), 4);
    let hub = store.filter_by_label("vicoo")[0].id;
    assert_eq!(store.degree(hub), 4);
}

// Interaction

#[test]
fn scenario_shift_drag_creates_exactly_one_link() {
    let (mut store, a, b) = two_node_store();
    let mut vp = origin_viewport();
    assert!(matches!(shift_drag_link(&mut store, &mut vp, a, b), Effect::LinkCreated(_)));
    assert_eq!(store.link_count(), 1);
    let link = store.links.values().next().unwrap();
    assert!(link.connects(a, b));

    // Repeat: still one link
    assert_eq!(shift_drag_link(&mut store, &mut vp, a, b), Effect::LinkDiscarded);
    assert_eq!(shift_drag_link(&mut store, &mut vp, b, a), Effect::LinkDiscarded);
    assert_eq!(store.link_count(), 1);
}

#[test]
fn scenario_double_click_background_creates_selected_node() {
    let mut store = GalaxyStore::new();
    let mut vp = origin_viewport();
    let mut ix = Interaction::new();
    let effect = ix.handle(CanvasEvent::DoubleClick { pos: Point::new(40.0, 40.0), hit: None }, &mut store, &mut vp);
    let Effect::NodeCreated(id) = effect else { panic!("expected node, got {:?}", effect) };
    let n = store.find_node(id).unwrap();
    assert_eq!((n.x, n.y), (40.0, 40.0));
    assert_eq!(ix.selected(), Some(id));
}

#[test]
fn double_click_on_node_or_while_panning_is_ignored() {
    let (mut store, a, _) = two_node_store();
    let mut vp = origin_viewport();
    let mut ix = Interaction::new();
    let dc = |hit| CanvasEvent::DoubleClick { pos: Point::new(300.0, 300.0), hit };
    assert_eq!(ix.handle(dc(Some(a)), &mut store, &mut vp), Effect::None);
    ix.handle(down(300.0, 300.0, false, None), &mut store, &mut vp);
    assert!(ix.is_panning());
    assert_eq!(ix.handle(dc(None), &mut store, &mut vp), Effect::None);
    assert_eq!(store.node_count(), 2);
}

#[test]
fn drag_places_node_at_final_cursor_world_position() {
    let (mut store, a, _) = two_node_store();
    let mut vp = Viewport::new(200.0, 100.0, 2.0);
    let mut ix = Interaction::new();
    assert_eq!(ix.handle(down(205.0, 100.0, false, Some(a)), &mut store, &mut vp), Effect::DragStarted(a));
    assert_eq!(ix.dragging(), Some(a));
    ix.handle(mv(260.0, 140.0), &mut store, &mut vp);
    ix.handle(mv(300.0, 180.0), &mut store, &mut vp);
    assert_eq!(ix.handle(up(300.0, 180.0, Some(a)), &mut store, &mut vp), Effect::DragFinished(a));
    let expected = vp.screen_to_world(Point::new(300.0, 180.0));
    let n = store.find_node(a).unwrap();
    assert_eq!((n.x, n.y), (expected.x, expected.y));
    assert_eq!((n.x, n.y), (50.0, 40.0));
    assert_eq!(ix.mode(), Mode::Idle);
    assert_eq!(ix.selected(), None, "a real drag does not select");
}

#[test]
fn drag_with_snap_grid_rounds_on_release() {
    let (mut store, a, _) = two_node_store();
    let mut vp = origin_viewport();
    let mut ix = Interaction::new().with_snap_grid(Some(20.0));
    ix.handle(down(0.0, 0.0, false, Some(a)), &mut store, &mut vp);
    ix.handle(mv(47.0, 33.0), &mut store, &mut vp);
    ix.handle(up(47.0, 33.0, None), &mut store, &mut vp);
    assert_eq!(store.find_node(a).map(|n| (n.x, n.y)), Some((40.0, 40.0)));
}

#[test]
fn click_selects_node_and_background_click_clears() {
    let (mut store, a, _) = two_node_store();
    let mut vp = origin_viewport();
    let mut ix = Interaction::new();
    ix.handle(down(1.0, 1.0, false, Some(a)), &mut store, &mut vp);
    ix.handle(mv(2.0, 1.0), &mut store, &mut vp);
    assert_eq!(ix.handle(up(2.0, 1.0, Some(a)), &mut store, &mut vp), Effect::Selected(a));
    assert_eq!(ix.selected(), Some(a));

    ix.handle(down(500.0, 500.0, false, None), &mut store, &mut vp);
    assert_eq!(ix.handle(up(500.0, 500.0, None), &mut store, &mut vp), Effect::SelectionCleared);
    assert_eq!(ix.selected(), None);
}

#[test]
fn background_drag_pans_by_incremental_deltas() {
    let mut store = GalaxyStore::new();
    let mut vp = origin_viewport();
    let mut ix = Interaction::new();
    ix.handle(down(10.0, 10.0, false, None), &mut store, &mut vp);
    ix.handle(mv(20.0, 15.0), &mut store, &mut vp);
    ix.handle(mv(50.0, 5.0), &mut store, &mut vp);
    assert_eq!((vp.x, vp.y), (40.0, -5.0));
    assert_eq!(ix.handle(CanvasEvent::PointerLeave, &mut store, &mut vp), Effect::Panned);
    assert_eq!(ix.mode(), Mode::Idle);
    ix.handle(mv(90.0, 90.0), &mut store, &mut vp);
    assert_eq!((vp.x, vp.y), (40.0, -5.0), "moves after leave do nothing");
}

#[test]
fn unmoved_pan_ended_by_leave_or_cancel_is_not_a_change() {
    let mut store = GalaxyStore::new();
    let mut vp = origin_viewport();
    let mut ix = Interaction::new();
    for end in [CanvasEvent::PointerLeave, CanvasEvent::Cancel] {
        ix.handle(down(10.0, 10.0, false, None), &mut store, &mut vp);
        ix.handle(mv(11.0, 10.0), &mut store, &mut vp);
        let effect = ix.handle(end, &mut store, &mut vp);
        assert_eq!(effect, Effect::None);
        assert!(!effect.mutates());
        assert_eq!(ix.mode(), Mode::Idle);
    }
}

#[test]
fn leaving_mid_pan_stops_further_panning() {
    let mut store = GalaxyStore::new();
    let mut vp = origin_viewport();
    let mut ix = Interaction::new();
    ix.handle(down(100.0, 100.0, false, None), &mut store, &mut vp);
    ix.handle(mv(100.0, 40.0), &mut store, &mut vp);
    let before = (vp.x, vp.y);
    ix.handle(CanvasEvent::PointerLeave, &mut store, &mut vp);
    // Pointer now over the menu bar; its moves and release must not pan
    ix.handle(mv(100.0, -20.0), &mut store, &mut vp);
    ix.handle(up(100.0, -20.0, None), &mut store, &mut vp);
    assert_eq!((vp.x, vp.y), before);
}

#[test]
fn linking_toggle_behaves_like_shift() {
    let (mut store, a, b) = two_node_store();
    let mut vp = origin_viewport();
    let mut ix = Interaction::new();
    ix.toggle_linking();
    assert!(ix.linking_toggle());
    assert_eq!(ix.handle(down(0.0, 0.0, false, Some(a)), &mut store, &mut vp), Effect::LinkStarted(a));
    ix.handle(mv(60.0, 10.0), &mut store, &mut vp);
    let (from, cursor) = ix.link_preview(&store).expect("preview while linking");
    assert_eq!(from, Point::new(0.0, 0.0));
    assert_eq!(cursor, Point::new(60.0, 10.0));
    assert!(matches!(ix.handle(up(100.0, 0.0, Some(b)), &mut store, &mut vp), Effect::LinkCreated(_)));
    assert!(ix.link_preview(&store).is_none());
    assert_eq!(store.find_node(a).map(|n| (n.x, n.y)), Some((0.0, 0.0)), "linking never moves the source");
}

#[test]
fn linking_released_on_same_node_or_background_is_discarded() {
    let (mut store, a, _) = two_node_store();
    let mut vp = origin_viewport();
    let mut ix = Interaction::new();
    ix.handle(down(0.0, 0.0, true, Some(a)), &mut store, &mut vp);
    assert_eq!(ix.handle(up(0.0, 0.0, Some(a)), &mut store, &mut vp), Effect::LinkDiscarded);
    ix.handle(down(0.0, 0.0, true, Some(a)), &mut store, &mut vp);
    assert_eq!(ix.handle(up(400.0, 400.0, None), &mut store, &mut vp), Effect::LinkDiscarded);
    ix.handle(down(0.0, 0.0, true, Some(a)), &mut store, &mut vp);
    assert_eq!(ix.handle(CanvasEvent::Cancel, &mut store, &mut vp), Effect::LinkDiscarded);
    assert_eq!(store.link_count(), 0);
}

#[test]
fn modes_are_exclusive_and_stray_events_are_absorbed() {
    let (mut store, a, b) = two_node_store();
    let mut vp = origin_viewport();
    let mut ix = Interaction::new();

    assert_eq!(ix.handle(up(0.0, 0.0, None), &mut store, &mut vp), Effect::None);
    assert_eq!(ix.handle(mv(3.0, 3.0), &mut store, &mut vp), Effect::None);

    let active = |ix: &Interaction| {
        [ix.is_panning(), ix.dragging().is_some(), ix.linking_from().is_some()]
            .iter()
            .filter(|x| **x)
            .count()
    };
    ix.handle(down(0.0, 0.0, false, Some(a)), &mut store, &mut vp);
    assert_eq!(active(&ix), 1);
    // A second press mid-gesture cannot start another mode
    assert_eq!(ix.handle(down(100.0, 0.0, true, Some(b)), &mut store, &mut vp), Effect::None);
    assert_eq!(ix.dragging(), Some(a));
    assert_eq!(active(&ix), 1);
    ix.handle(up(0.0, 0.0, None), &mut store, &mut vp);
    assert_eq!(active(&ix), 0);

    let secondary = CanvasEvent::PointerDown { pos: Point::ZERO, button: PointerButton::Secondary, shift: false, hit: None };
    assert_eq!(ix.handle(secondary, &mut store, &mut vp), Effect::None);
    assert_eq!(ix.mode(), Mode::Idle);
}

#[test]
fn wheel_during_drag_zooms_without_changing_mode() {
    let (mut store, a, _) = two_node_store();
    let mut vp = origin_viewport();
    let mut ix = Interaction::new();
    ix.handle(down(0.0, 0.0, false, Some(a)), &mut store, &mut vp);
    assert_eq!(ix.handle(CanvasEvent::Wheel { delta_y: -100.0 }, &mut store, &mut vp), Effect::Zoomed);
    assert!((vp.scale - 1.1).abs() < 1e-6);
    assert_eq!(ix.dragging(), Some(a));
}

#[test]
fn deleting_dragged_node_mid_gesture_is_tolerated() {
    let (mut store, a, _) = two_node_store();
    let mut vp = origin_viewport();
    let mut ix = Interaction::new();
    ix.select(a);
    ix.handle(down(0.0, 0.0, false, Some(a)), &mut store, &mut vp);
    assert_eq!(ix.delete_selected(&mut store), Some(a));
    ix.handle(mv(30.0, 30.0), &mut store, &mut vp);
    ix.handle(up(30.0, 30.0, None), &mut store, &mut vp);
    assert!(store.find_node(a).is_none());
    assert_eq!(store.node_count(), 1);
    assert_eq!(ix.selected(), None);
}

// Persistence, export, settings

#[test]
fn persistence_round_trip_and_versions() {
    let dir = temp_dir();
    let (mut store, a, b) = two_node_store();
    store.create_link(a, b).unwrap();
    let mut vp = Viewport::centered(1000.0, 800.0);
    vp.pan(12.0, 34.0);
    vp.zoom(250.0);
    let state = GalaxyStateFile::from_runtime(&store, &vp);

    assert!(persist::load_active(&dir).expect("missing dir is fine").is_none());
    let path = persist::save_active(&dir, &state).expect("save");
    assert!(path.exists());
    let loaded = persist::load_active(&dir).expect("load").expect("present");
    assert_eq!(loaded, state);

    persist::save_versioned(&dir, &state).expect("save version");
    let versions = persist::list_versions(&dir).expect("list");
    assert_eq!(versions.len(), 1);
    assert_eq!(persist::load_from_path(&versions[0]).expect("load version"), state);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn hand_edited_zero_scale_is_clamped_on_load() {
    let dir = temp_dir();
    let mut vp = Viewport::new(0.0, 0.0, 1.0);
    vp.scale = 0.0;
    let state = GalaxyStateFile::from_runtime(&GalaxyStore::new(), &vp);
    persist::save_active(&dir, &state).expect("save");

    let (mut store, mut vp) = persist::load_active(&dir).expect("load").expect("present").into_runtime();
    assert!(vp.scale >= MIN_SCALE && vp.scale <= MAX_SCALE, "scale {}", vp.scale);

    let mut ix = Interaction::new();
    let effect = ix.handle(CanvasEvent::DoubleClick { pos: Point::new(40.0, 40.0), hit: None }, &mut store, &mut vp);
    assert!(matches!(effect, Effect::NodeCreated(_)), "{:?}", effect);
    assert_eq!(store.node_count(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn export_json_and_csv_write_files() {
    let dir = temp_dir();
    let store = GalaxyStore::seeded();

    let json_path = dir.join("galaxy.json");
    export::export_galaxy_json(&store, &json_path).expect("json export");
    let text = std::fs::read_to_string(&json_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["nodes"].as_array().map(|a| a.len()), Some(5));
    assert_eq!(value["links"].as_array().map(|a| a.len()), Some(4));

    let (nodes_csv, links_csv) = export::export_galaxy_csv(&store, &dir.join("galaxy.csv")).expect("csv export");
    let nodes = std::fs::read_to_string(nodes_csv).unwrap();
    let links = std::fs::read_to_string(links_csv).unwrap();
    assert_eq!(nodes.lines().count(), 6, "header + 5 nodes");
    assert_eq!(links.lines().count(), 5, "header + 4 links");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn note_seeds_load_from_json() {
    let dir = temp_dir();
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("notes.json");
    std::fs::write(
        &path,
        r#"[{"id":"n1","title":"Idea","category":"idea"},{"id":"n2","title":"Misc","tags":["x"]}]"#,
    )
    .unwrap();
    let notes = export::load_note_seeds(&path).expect("parse notes");
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].category, Some(NoteCategory::Idea));
    assert_eq!(notes[1].tags, vec!["x".to_string()]);
    assert!(export::load_note_seeds(&dir.join("missing.json")).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn settings_fill_missing_fields_with_defaults() {
    let parsed: AppSettings = serde_json::from_str(r#"{"snap_to_grid":true,"language":"Chinese"}"#).unwrap();
    assert!(parsed.snap_to_grid);
    assert_eq!(parsed.snap_grid(), Some(20.0));
    assert_eq!(parsed.zoom_sensitivity, AppSettings::default().zoom_sensitivity);
    assert_eq!(AppSettings::default().snap_grid(), None);

    let env = Environment::new(parsed);
    assert_eq!(env.language(), Language::Chinese);
    assert_eq!(env.text(UiText::Delete), "删除");
    assert_eq!(Language::English.text(UiText::SearchHint), "Search nodes...");
}
