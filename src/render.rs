use std::collections::{BTreeMap, HashSet};

use crate::geometry::{Point, Rect, TileSize};
use crate::items::{ItemArena, ItemKind};
use crate::model::NodeId;
use crate::resources::ResourceTracker;
use crate::surface::{Color, WorldSurface};
use crate::view::{ItemRef, MapView, ViewEvent};

/// Paint passes, in paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Terrain,
    Grid,
    Focus,
    Overlay,
    Content,
    Path,
}

impl Layer {
    pub const ALL: [Layer; 6] = [
        Layer::Terrain,
        Layer::Grid,
        Layer::Focus,
        Layer::Overlay,
        Layer::Content,
        Layer::Path,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Layer::Terrain => "terrain",
            Layer::Grid => "grid",
            Layer::Focus => "focus",
            Layer::Overlay => "overlay",
            Layer::Content => "content",
            Layer::Path => "path",
        }
    }
}

/// One canvas operation for the host to execute.
///
/// Shapes are in the current transform's frame; item commands are always
/// preceded by a `Translate` to the item's position, so hexagons and marks
/// are in tile-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BeginPass(Layer),
    Clear(Rect),
    Save,
    Restore,
    Translate(Point),
    Scale(f32),
    Image {
        path: String,
        size: TileSize,
    },
    StrokeHexagon {
        color: Color,
        width: f32,
    },
    FillHexagon {
        color: Color,
    },
    Mark {
        center: Point,
        radius: i32,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        width: f32,
    },
}

/// Collects draw commands from one paint call.
/// Decouples item logic from whatever canvas the host draws on.
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of item blocks (`Save`…`Restore`) painted in each pass.
    pub fn pass_counts(&self) -> BTreeMap<Layer, usize> {
        let mut counts = BTreeMap::new();
        let mut current = None;
        for command in &self.commands {
            match command {
                DrawCommand::BeginPass(layer) => {
                    current = Some(*layer);
                    counts.entry(*layer).or_insert(0);
                }
                DrawCommand::Save => {
                    if let Some(layer) = current {
                        *counts.entry(layer).or_insert(0) += 1;
                    }
                }
                _ => {}
            }
        }
        counts
    }
}

/// A named set of nodes filled with one colour in the overlay pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub name: String,
    pub color: Color,
    pub nodes: HashSet<NodeId>,
}

/// View state painted on top of the items themselves.
#[derive(Debug, Default)]
pub struct Decorations {
    /// Position of the phantom highlighted as the next node to create.
    pub ghost: Option<Point>,
    pub overlays: Vec<Overlay>,
    pub path: HashSet<NodeId>,
}

impl Decorations {
    pub fn overlay_colors(&self, node: NodeId) -> impl Iterator<Item = Color> + '_ {
        self.overlays
            .iter()
            .filter(move |o| o.nodes.contains(&node))
            .map(|o| o.color)
    }
}

/// How items draw themselves: full-size sprites for map views, flat colour
/// fills for scaled views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintStyle {
    Full,
    Scaled,
}

/// Drawing context handed to items.
pub struct Painter<'a> {
    list: &'a mut DrawList,
    surface: &'a WorldSurface,
    resources: &'a ResourceTracker,
    decorations: &'a Decorations,
    style: PaintStyle,
}

impl<'a> Painter<'a> {
    pub fn new(
        list: &'a mut DrawList,
        surface: &'a WorldSurface,
        resources: &'a ResourceTracker,
        decorations: &'a Decorations,
        style: PaintStyle,
    ) -> Self {
        Self {
            list,
            surface,
            resources,
            decorations,
            style,
        }
    }

    pub fn style(&self) -> PaintStyle {
        self.style
    }

    pub fn surface(&self) -> &'a WorldSurface {
        self.surface
    }

    pub fn decorations(&self) -> &'a Decorations {
        self.decorations
    }

    pub fn tile(&self) -> TileSize {
        self.surface.tile_size
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.list.push(command);
    }

    /// Run `f` with the canvas translated to `pos`, restoring afterwards so
    /// nothing leaks into the next item.
    pub fn at(&mut self, pos: Point, f: impl FnOnce(&mut Self)) {
        self.push(DrawCommand::Save);
        self.push(DrawCommand::Translate(pos));
        f(self);
        self.push(DrawCommand::Restore);
    }

    /// Draw the image configured for `id`. Unknown ids and images that
    /// failed to load are skipped.
    pub fn image(&mut self, id: &str) {
        let Some(path) = self.surface.image(id) else {
            log::debug!("no image configured for {id:?}");
            return;
        };
        if self.resources.is_missing(path) {
            return;
        }
        let size = self.tile();
        self.push(DrawCommand::Image {
            path: path.to_string(),
            size,
        });
    }

    pub fn stroke_hexagon(&mut self, color: Color, width: f32) {
        self.push(DrawCommand::StrokeHexagon { color, width });
    }

    pub fn fill_hexagon(&mut self, color: Color) {
        self.push(DrawCommand::FillHexagon { color });
    }

    pub fn mark(&mut self, center: Point, radius: i32, color: Color) {
        self.push(DrawCommand::Mark {
            center,
            radius,
            color,
        });
    }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// Render the placed tiles as a text grid string.
///
/// One character per half tile horizontally and per row vertically: `#` for
/// a node, `S` or `U` for a node carrying a settlement or unit, `+` for a
/// phantom. Trailing spaces are trimmed.
///
/// This function is READ-ONLY and does not modify the arena.
pub fn render_layout_to_string(items: &ItemArena, tile: TileSize) -> String {
    let half_w = (tile.width / 2).max(1);
    let row_h = (tile.height * 3 / 4).max(1);

    let cells: Vec<(Point, char)> = items
        .tiles()
        .map(|(_, item)| {
            let ch = match &item.kind {
                ItemKind::Node {
                    settlement: Some(_),
                    ..
                } => 'S',
                ItemKind::Node { unit: Some(_), .. } => 'U',
                ItemKind::Phantom { .. } => '+',
                _ => '#',
            };
            (item.pos, ch)
        })
        .collect();

    let Some(min_x) = cells.iter().map(|(p, _)| p.x).min() else {
        return String::new();
    };
    let min_y = cells.iter().map(|(p, _)| p.y).min().unwrap_or(0);

    let cell = |p: Point| {
        (
            ((p.x - min_x) / half_w) as usize,
            ((p.y - min_y) / row_h) as usize,
        )
    };
    let width = cells.iter().map(|(p, _)| cell(*p).0).max().unwrap_or(0) + 1;
    let height = cells.iter().map(|(p, _)| cell(*p).1).max().unwrap_or(0) + 1;

    let mut grid = vec![vec![' '; width]; height];
    for (pos, ch) in &cells {
        let (x, y) = cell(*pos);
        grid[y][x] = *ch;
    }

    grid.iter()
        .map(|row| row.iter().collect::<String>().trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a status line with the view kind, item counts and geometry.
///
/// Format: "Editor | Nodes: N | Phantoms: P | Settlements: S | Units: U |
/// Canvas: WxH | Window: [x, y wxh]", with " | Mode: M" appended for
/// editor views.
pub fn render_status(view: &MapView) -> String {
    let items = view.items();
    let viewport = view.viewport();
    let canvas = viewport.canvas();
    let mut status = format!(
        "{:?} | Nodes: {} | Phantoms: {} | Settlements: {} | Units: {} | Canvas: {}x{} | Window: {}",
        view.kind(),
        items.node_count(),
        items.phantom_count(),
        items.settlement_count(),
        items.unit_count(),
        canvas.width,
        canvas.height,
        viewport.window(),
    );
    if let Some(mode) = view.edit_mode() {
        status.push_str(&format!(" | Mode: {mode}"));
    }
    status
}

fn describe(item: &Option<ItemRef>) -> String {
    match item {
        None => "nothing".to_string(),
        Some(ItemRef::Node(n)) => format!("node {n}"),
        Some(ItemRef::Phantom { neighbours }) => format!("phantom ({} links)", neighbours.len()),
        Some(ItemRef::Settlement(s)) => format!("settlement {}", s.0),
        Some(ItemRef::Unit(u)) => format!("unit {}", u.0),
    }
}

/// Render drained view events as a multi-line string.
pub fn render_events(events: &[ViewEvent]) -> String {
    events
        .iter()
        .map(|event| match event {
            ViewEvent::ItemClicked(item) => format!("clicked {}", describe(item)),
            ViewEvent::ItemFocused(item) => format!("focused {}", describe(item)),
            ViewEvent::ItemsSelected {
                node,
                settlement,
                unit,
            } => format!(
                "selected node {node} settlement {:?} unit {:?}",
                settlement.map(|s| s.0),
                unit.map(|u| u.0)
            ),
            ViewEvent::EditNode(n) => format!("edit node {n}"),
            ViewEvent::EditSettlement(s) => format!("edit settlement {}", s.0),
            ViewEvent::EditUnit(u) => format!("edit unit {}", u.0),
            ViewEvent::WindowMoved(window) => format!("window moved to {window}"),
            ViewEvent::Request(request) => format!("request {request:?}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
