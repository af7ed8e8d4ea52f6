//! Headless demo host for the map views.
//! Loads a surface and a map, drives an editor view and a minimap through a
//! short scripted session, and prints what they would draw.
//!
//! Usage: cargo run -- [SURFACE_PATH] [MAP_PATH]
//! Defaults: "data/surface.ron", "data/map.kdl"

use std::process::ExitCode;

use hexview::dirty::Repaint;
use hexview::geometry::{Direction, Point, Rect, Size};
use hexview::loading;
use hexview::model::{Applied, MapModel, MemoryMap, NodeId};
use hexview::render::{Layer, Overlay, render_events, render_layout_to_string, render_status};
use hexview::resources::LoadOutcome;
use hexview::view::{EditMode, MapView, ViewEvent, ViewKind};

/// Load every image the view asks for. Only the header is decoded; the demo
/// never draws pixels.
fn load_resources(view: &mut MapView) {
    for path in view.pending_resources() {
        let outcome = match image::image_dimensions(&path) {
            Ok((w, h)) => {
                log::debug!("{path}: {w}x{h}");
                LoadOutcome::Loaded
            }
            Err(e) => LoadOutcome::Failed(e.to_string()),
        };
        view.on_resource_loaded(&path, outcome);
    }
}

/// Forward one view's events to the model and the other view, the way a
/// UI shell would.
fn route(
    events: Vec<ViewEvent>,
    from: ViewKind,
    map: &mut MemoryMap,
    editor: &mut MapView,
    mini: &mut MapView,
) {
    if !events.is_empty() {
        println!("{from:?} events:\n{}", render_events(&events));
    }
    for event in events {
        match event {
            ViewEvent::Request(request) => match map.apply(&request) {
                Ok(Applied::Node(node)) => {
                    editor.on_node_added(&*map, node);
                    mini.on_node_added(&*map, node);
                }
                Ok(Applied::Settlement(id)) => {
                    editor.on_settlement_added(&*map, id);
                    mini.on_settlement_added(&*map, id);
                }
                Ok(Applied::Unit(id)) => {
                    editor.on_unit_added(&*map, id);
                    mini.on_unit_added(&*map, id);
                }
                Err(e) => log::error!("request failed: {e}"),
            },
            ViewEvent::WindowMoved(window) if from == ViewKind::Mini => {
                editor.scroll_to(window.origin());
            }
            ViewEvent::WindowMoved(window) => mini.set_window(window),
            _ => {}
        }
    }
}

/// Screen point over the centre of the tile at `pos` (view coordinates).
fn screen_at(view: &MapView, pos: Point) -> Point {
    pos + view.tile().center() - view.viewport().window().origin()
}

fn click(view: &mut MapView, screen: Point) {
    view.on_position_changed(screen, false);
    view.on_pressed(screen);
    view.on_released(screen);
}

fn print_frame(view: &mut MapView) {
    view.update_geometry();
    println!("{}", render_status(view));
    println!("{}", render_layout_to_string(view.items(), view.tile()));

    let repaint = view.take_repaint();
    let region = match repaint {
        Some(Repaint::Regions(rects)) => rects
            .into_iter()
            .reduce(|a, b| {
                let x = a.x.min(b.x);
                let y = a.y.min(b.y);
                let right = a.right().max(b.right());
                let bottom = a.bottom().max(b.bottom());
                Rect::new(x, y, right - x, bottom - y)
            })
            .unwrap_or(Rect::ZERO),
        Some(Repaint::Full) | None => Rect::from_origin(Point::ZERO, view.viewport().canvas()),
    };
    let list = view.paint(region);
    let counts = list.pass_counts();
    let parts: Vec<String> = Layer::ALL
        .iter()
        .map(|layer| format!("{}:{}", layer.name(), counts.get(layer).copied().unwrap_or(0)))
        .collect();
    println!("Draw: {} commands | {}\n", list.len(), parts.join(" "));
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let surface_path = args.get(1).map(String::as_str).unwrap_or("data/surface.ron");
    let map_path = args.get(2).map(String::as_str).unwrap_or("data/map.kdl");

    let surface = loading::load_surface_or_default(surface_path);
    let mut map = match loading::load_map(map_path) {
        Ok(map) => map,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut editor = MapView::new(ViewKind::Editor, surface.clone(), &map, Size::new(800, 600));
    let mut mini = MapView::new(ViewKind::Mini, surface, &map, Size::new(200, 150));
    load_resources(&mut editor);
    editor.update_geometry();
    mini.set_window(editor.visible_area());

    println!("== initial ==");
    print_frame(&mut editor);
    print_frame(&mut mini);

    // Grow the map east of the root.
    let root = NodeId(0);
    let mut anchor = root;
    for _ in 0..map.node_count() {
        match map.neighbour(anchor, Direction::East) {
            Some(next) => anchor = next,
            None => break,
        }
    }
    editor.set_edit_mode(EditMode::CreateNode);
    editor.set_terrain_type("hills");
    if let Some(pos) = editor.node_pos(anchor) {
        let slot = screen_at(&editor, pos + Direction::East.displacement(editor.tile()));
        click(&mut editor, slot);
        let events = editor.take_events();
        route(events, ViewKind::Editor, &mut map, &mut editor, &mut mini);
    }

    println!("== after creating a node ==");
    print_frame(&mut editor);

    // Put a village on the new node.
    editor.set_edit_mode_by_name("CreateSettlementMode");
    editor.set_settlement_type("village");
    let newest = NodeId(map.node_count().saturating_sub(1) as u32);
    if let Some(pos) = editor.node_pos(newest) {
        let screen = screen_at(&editor, pos);
        click(&mut editor, screen);
        let events = editor.take_events();
        route(events, ViewKind::Editor, &mut map, &mut editor, &mut mini);
    }

    editor.set_path(&[root, anchor, newest]);
    editor.set_overlay(Overlay {
        name: "frontier".into(),
        color: [0.2, 0.4, 1.0, 0.35],
        nodes: [anchor, newest].into_iter().collect(),
    });

    println!("== after settling ==");
    print_frame(&mut editor);

    // Jump the main window from the minimap.
    mini.set_window(editor.visible_area());
    mini.on_pressed(Point::new(190, 140));
    mini.on_released(Point::new(190, 140));
    let events = mini.take_events();
    route(events, ViewKind::Mini, &mut map, &mut editor, &mut mini);

    println!("== after minimap jump ==");
    print_frame(&mut editor);
    print_frame(&mut mini);

    ExitCode::SUCCESS
}
