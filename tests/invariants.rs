//! Structural invariants of the map views.
//!
//! These are integration tests that drive whole views through the public
//! API and check the layout, phantom, hit-testing and viewport invariants
//! after each step.

use std::collections::HashSet;

use hexview::dirty::DirtyRegions;
use hexview::geometry::{Direction, Point, Size, TileSize, hex_contains};
use hexview::items::{ItemArena, MapItem, validate_arena};
use hexview::loading::load_map;
use hexview::model::{MapModel, MemoryMap, NodeId};
use hexview::phantom;
use hexview::surface::WorldSurface;
use hexview::view::{MapView, ViewEvent, ViewKind};

const TILE: TileSize = TileSize::new(128, 128);

fn build(kind: ViewKind, map: &MemoryMap, size: Size) -> MapView {
    let mut view = MapView::new(kind, WorldSurface::default(), map, size);
    view.update_geometry();
    view
}

/// Every model link must be mirrored by the tiles' relative positions.
fn assert_links_match_positions(view: &MapView, map: &MemoryMap) {
    for n in 0..map.node_count() as u32 {
        let node = NodeId(n);
        let Some(pos) = view.node_pos(node) else {
            continue;
        };
        for (dir, other) in map.neighbours(node) {
            if let Some(other_pos) = view.node_pos(other) {
                assert_eq!(
                    other_pos,
                    pos + dir.displacement(view.tile()),
                    "{other} is not {dir} of {node}"
                );
            }
        }
    }
}

/// A chain of `len` nodes heading East from the root.
fn chain(len: usize) -> MemoryMap {
    let mut map = MemoryMap::new();
    let mut prev = map.add_node("n0", "plains").expect("n0");
    for i in 1..len {
        let next = map.add_node(&format!("n{i}"), "plains").expect("node");
        map.link(prev, Direction::East, next).expect("link");
        prev = next;
    }
    map
}

// ---------------------------------------------------------------------------
// Geometry kernel
// ---------------------------------------------------------------------------

#[test]
fn opposite_direction_is_an_involution() {
    for d in Direction::ALL {
        assert_eq!(d.opposite().opposite(), d);
    }
}

#[test]
fn displacements_cancel_for_every_tile_size() {
    for w in (2..=256).step_by(6) {
        for h in (4..=256).step_by(4) {
            let tile = TileSize::new(w, h);
            for d in Direction::ALL {
                assert_eq!(
                    d.displacement(tile),
                    -d.opposite().displacement(tile),
                    "{d} at {w}x{h}"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Layout walker
// ---------------------------------------------------------------------------

#[test]
fn three_node_ring_produces_three_items() {
    let mut map = MemoryMap::new();
    let a = map.add_node("a", "plains").expect("a");
    let b = map.add_node("b", "plains").expect("b");
    let c = map.add_node("c", "plains").expect("c");
    map.link(a, Direction::East, b).expect("ab");
    map.link(b, Direction::SouthWest, c).expect("bc");
    map.link(c, Direction::NorthWest, a).expect("ca");

    let view = build(ViewKind::Game, &map, Size::new(800, 600));
    assert_eq!(view.items().len(), 3);
    assert_eq!(view.items().node_count(), 3);
    assert_links_match_positions(&view, &map);
    validate_arena(view.items());
}

#[test]
fn starter_island_layout_is_consistent() {
    let map = load_map("data/map.kdl").expect("map");
    for kind in [ViewKind::Game, ViewKind::Editor, ViewKind::Mini, ViewKind::Preview] {
        let view = build(kind, &map, Size::new(800, 600));
        assert_eq!(view.items().node_count(), map.node_count(), "{kind:?}");
        assert_eq!(view.items().settlement_count(), 2, "{kind:?}");
        assert_eq!(view.items().unit_count(), 2, "{kind:?}");
        assert_links_match_positions(&view, &map);
        validate_arena(view.items());
    }
}

#[test]
fn phantoms_exist_only_in_editor_views() {
    let map = load_map("data/map.kdl").expect("map");
    for kind in [ViewKind::Game, ViewKind::Mini, ViewKind::Preview] {
        let view = build(kind, &map, Size::new(800, 600));
        assert_eq!(view.items().phantom_count(), 0);
    }
    // The full ring around a seven-tile island has twelve slots.
    let editor = build(ViewKind::Editor, &map, Size::new(800, 600));
    assert_eq!(editor.items().phantom_count(), 12);
}

#[test]
fn all_positions_non_negative_after_geometry_update() {
    let map = load_map("data/map.kdl").expect("map");
    let view = build(ViewKind::Editor, &map, Size::new(800, 600));
    for (_, item) in view.items().iter() {
        assert!(item.pos.x >= 0 && item.pos.y >= 0, "{} negative", item.pos);
    }
    assert_eq!(view.viewport().bounding().origin(), Point::ZERO);
}

// ---------------------------------------------------------------------------
// Phantom synthesizer
// ---------------------------------------------------------------------------

#[test]
fn phantom_count_matches_unfilled_directions() {
    for k in 0..=6usize {
        let mut map = MemoryMap::new();
        let root = map.add_node("root", "plains").expect("root");
        let filled = &Direction::ALL[..6 - k];
        for (i, dir) in filled.iter().enumerate() {
            let n = map.add_node(&format!("n{i}"), "plains").expect("node");
            map.link(root, *dir, n).expect("link");
        }

        let mut arena = ItemArena::new();
        let mut dirty = DirtyRegions::new();
        let id = arena.insert(MapItem::node(Point::ZERO, root, "plains"));
        let created = phantom::synthesize(&map, &mut arena, id, TILE, &mut dirty);
        assert_eq!(created, k);
        assert_eq!(arena.phantom_count(), k);
        validate_arena(&arena);
    }
}

#[test]
fn existing_phantom_is_reused_and_gains_neighbour() {
    let mut map = MemoryMap::new();
    let root = map.add_node("root", "plains").expect("root");
    let mut arena = ItemArena::new();
    let mut dirty = DirtyRegions::new();

    let east = Point::new(128, 0);
    let existing = arena.insert(MapItem::phantom(east));
    let id = arena.insert(MapItem::node(Point::ZERO, root, "plains"));

    let created = phantom::synthesize(&map, &mut arena, id, TILE, &mut dirty);
    assert_eq!(created, 5);
    assert_eq!(arena.tile_at(east), Some(existing));
    assert_eq!(
        phantom::neighbour_links(&arena, existing).as_slice(),
        &[(Direction::West, root)]
    );
    validate_arena(&arena);
}

#[test]
fn replacing_phantom_keeps_positions_unique() {
    let mut map = MemoryMap::new();
    let root = map.add_node("root", "plains").expect("root");
    let mut view = build(ViewKind::Editor, &map, Size::new(800, 600));
    let before = view.items().len();

    let east = map.add_node("east", "hills").expect("east");
    map.link(root, Direction::East, east).expect("link");
    view.on_node_added(&map, east);

    // Phantom out, node in; then three fresh phantoms beyond the new node.
    assert_eq!(view.items().len(), before + 3);
    assert_eq!(view.items().node_count(), 2);
    validate_arena(view.items());
}

// ---------------------------------------------------------------------------
// Hit testing
// ---------------------------------------------------------------------------

#[test]
fn find_item_at_agrees_with_hexagon_membership() {
    let map = load_map("data/map.kdl").expect("map");
    let view = build(ViewKind::Editor, &map, Size::new(800, 600));
    let canvas = view.viewport().canvas();

    for y in (0..canvas.height).step_by(7) {
        for x in (0..canvas.width).step_by(7) {
            let screen = Point::new(x, y);
            let map_point = view.viewport().to_map(screen);
            let containing: Vec<_> = view
                .items()
                .tiles()
                .filter(|(_, item)| hex_contains(map_point - item.pos, view.tile()))
                .map(|(id, _)| id)
                .collect();
            match containing.as_slice() {
                [] => assert_eq!(view.find_item_at(screen), None, "{screen}"),
                [only] => assert_eq!(view.find_item_at(screen), Some(*only), "{screen}"),
                // Shared edges: any of the touching tiles is acceptable.
                many => {
                    let hit = view.find_item_at(screen).expect("edge point hits");
                    assert!(many.contains(&hit));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Viewport clamping
// ---------------------------------------------------------------------------

const DELTAS: [(i32, i32); 14] = [
    (0, 0),
    (37, -12),
    (-500, 250),
    (100_000, 100_000),
    (-100_000, 3),
    (1, -100_000),
    (640, 480),
    (i32::MAX, 0),
    (i32::MIN, i32::MAX),
    (-641, -481),
    (i32::MAX / 4, i32::MIN / 4),
    (7, 7),
    (i32::MAX, i32::MAX),
    (i32::MIN, i32::MIN),
];

fn assert_window_in_canvas(view: &MapView) {
    let window = view.viewport().window();
    let canvas = view.viewport().canvas();
    let max_x = (canvas.width - window.width).max(0);
    let max_y = (canvas.height - window.height).max(0);
    assert!(window.x >= 0 && window.x <= max_x, "{window}");
    assert!(window.y >= 0 && window.y <= max_y, "{window}");
}

#[test]
fn move_viewport_by_stays_in_canvas() {
    let map = chain(20);
    let mut view = build(ViewKind::Game, &map, Size::new(300, 200));
    assert!(view.viewport().canvas().width > 300);
    for (dx, dy) in DELTAS {
        view.move_viewport_by(Point::new(dx, dy));
        assert_window_in_canvas(&view);
    }
}

#[test]
fn move_viewport_to_stays_in_canvas() {
    let map = chain(20);
    let mut view = build(ViewKind::Game, &map, Size::new(300, 200));
    for (x, y) in DELTAS {
        view.move_viewport_to(Point::new(x, y));
        assert_window_in_canvas(&view);
    }
}

#[test]
fn minimap_window_stays_in_content() {
    let map = chain(20);
    let main = build(ViewKind::Game, &map, Size::new(300, 200));
    let mut mini = build(ViewKind::Mini, &map, Size::new(120, 80));
    mini.set_window(main.visible_area());

    for (x, y) in DELTAS {
        mini.on_pressed(Point::new(x, y));
        mini.on_released(Point::new(x, y));
    }
    // The root sits at layout (0, 0), so its position is the minimap's
    // layout-to-canvas offset.
    let shift = mini.node_pos(NodeId(0)).expect("root");
    let content = mini.viewport().content();
    let mut moves = 0;
    for event in mini.take_events() {
        let ViewEvent::WindowMoved(window) = event else {
            continue;
        };
        moves += 1;
        let local = window.translated(shift);
        assert!(local.x >= 0 && local.right() <= content.width, "{local}");
        assert!(local.y >= 0 && local.bottom() <= content.height, "{local}");
    }
    assert!(moves > 0);
}

// ---------------------------------------------------------------------------
// Geometry manager
// ---------------------------------------------------------------------------

#[test]
fn update_geometry_twice_is_idempotent() {
    let map = load_map("data/map.kdl").expect("map");
    for kind in [ViewKind::Game, ViewKind::Editor, ViewKind::Mini] {
        let mut view = build(kind, &map, Size::new(500, 400));
        let snapshot = |v: &MapView| {
            let positions: Vec<Point> = v.items().iter().map(|(_, i)| i.pos).collect();
            (v.viewport().clone(), positions)
        };
        let first = snapshot(&view);
        view.update_geometry();
        assert_eq!(snapshot(&view), first, "{kind:?}");
    }
}

#[test]
fn focus_never_doubles_up_while_sweeping() {
    let map = load_map("data/map.kdl").expect("map");
    let mut view = build(ViewKind::Editor, &map, Size::new(800, 600));
    let mut focused = HashSet::new();
    for x in (0..800).step_by(16) {
        view.on_position_changed(Point::new(x, 300), false);
        validate_arena(view.items());
        if let Some(id) = view.focused() {
            focused.insert(id);
        }
    }
    assert!(focused.len() > 1);
}
