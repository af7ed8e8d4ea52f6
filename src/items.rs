//! Items placed on the map and the arena that owns them.

use std::collections::HashMap;

use slotmap::{SlotMap, new_key_type};

use crate::dirty::DirtyRegions;
use crate::geometry::{Direction, Point, Rect, TileSize, hex_contains};
use crate::model::{NodeId, SettlementId, SettlementRecord, UnitId, UnitRecord};
use crate::render::{Layer, PaintStyle, Painter};
use crate::surface;

new_key_type! {
    /// Handle into the item arena. Stable across insertions/removals.
    pub struct ItemId;
}

/// Closed set of things that can sit on the map.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    /// Real tile backed by a host map node.
    Node {
        node: NodeId,
        terrain: String,
        settlement: Option<ItemId>,
        unit: Option<ItemId>,
    },
    /// Placeholder at an empty adjacency slot. `neighbours[d.index()]` is the
    /// real node lying in direction `d` from the phantom.
    Phantom { neighbours: [Option<ItemId>; 6] },
    Settlement {
        settlement: SettlementId,
        node: ItemId,
        kind: String,
        owner: Option<String>,
    },
    Unit {
        unit: UnitId,
        node: ItemId,
        kind: String,
        owner: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapItem {
    /// Top-left corner of the tile this item occupies.
    pub pos: Point,
    focused: bool,
    pub kind: ItemKind,
}

impl MapItem {
    pub fn node(pos: Point, node: NodeId, terrain: &str) -> Self {
        Self {
            pos,
            focused: false,
            kind: ItemKind::Node {
                node,
                terrain: terrain.to_string(),
                settlement: None,
                unit: None,
            },
        }
    }

    pub fn phantom(pos: Point) -> Self {
        Self {
            pos,
            focused: false,
            kind: ItemKind::Phantom {
                neighbours: [None; 6],
            },
        }
    }

    pub fn settlement(pos: Point, record: &SettlementRecord, node: ItemId) -> Self {
        Self {
            pos,
            focused: false,
            kind: ItemKind::Settlement {
                settlement: record.id,
                node,
                kind: record.kind.clone(),
                owner: record.owner.clone(),
            },
        }
    }

    pub fn unit(pos: Point, record: &UnitRecord, node: ItemId) -> Self {
        Self {
            pos,
            focused: false,
            kind: ItemKind::Unit {
                unit: record.id,
                node,
                kind: record.kind.clone(),
                owner: record.owner.clone(),
            },
        }
    }

    /// Nodes and phantoms occupy a tile; settlements and units ride on one.
    pub fn is_tile(&self) -> bool {
        matches!(self.kind, ItemKind::Node { .. } | ItemKind::Phantom { .. })
    }

    pub fn is_phantom(&self) -> bool {
        matches!(self.kind, ItemKind::Phantom { .. })
    }

    pub fn node_id(&self) -> Option<NodeId> {
        match self.kind {
            ItemKind::Node { node, .. } => Some(node),
            _ => None,
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn tile_rect(&self, tile: TileSize) -> Rect {
        Rect::tile(self.pos, tile)
    }

    pub fn contains_point(&self, p: Point, tile: TileSize) -> bool {
        hex_contains(p - self.pos, tile)
    }

    pub fn on_focus_enter(&mut self, tile: TileSize, dirty: &mut DirtyRegions) {
        self.focused = true;
        dirty.mark(self.tile_rect(tile));
    }

    pub fn on_focus_exit(&mut self, tile: TileSize, dirty: &mut DirtyRegions) {
        self.focused = false;
        dirty.mark(self.tile_rect(tile));
    }

    /// Emit this item's draw commands for one layer.
    pub fn paint(&self, layer: Layer, painter: &mut Painter<'_>) {
        match painter.style() {
            PaintStyle::Full => self.paint_full(layer, painter),
            PaintStyle::Scaled => self.paint_scaled(layer, painter),
        }
    }

    fn paint_full(&self, layer: Layer, painter: &mut Painter<'_>) {
        let surface = painter.surface();
        match (layer, &self.kind) {
            (Layer::Terrain, ItemKind::Node { terrain, .. }) => {
                painter.at(self.pos, |p| p.image(terrain));
            }
            (Layer::Grid, ItemKind::Node { .. } | ItemKind::Phantom { .. }) => {
                let color = surface.color(surface::GRID);
                painter.at(self.pos, |p| p.stroke_hexagon(color, 1.0));
            }
            (Layer::Focus, ItemKind::Node { .. } | ItemKind::Phantom { .. }) if self.focused => {
                let color = surface.color(surface::FOCUS);
                painter.at(self.pos, |p| p.stroke_hexagon(color, 3.0));
            }
            (Layer::Overlay, ItemKind::Node { node, .. }) => {
                let colors: Vec<_> = painter.decorations().overlay_colors(*node).collect();
                if !colors.is_empty() {
                    painter.at(self.pos, |p| {
                        for color in colors {
                            p.fill_hexagon(color);
                        }
                    });
                }
            }
            (Layer::Overlay, ItemKind::Phantom { .. })
                if painter.decorations().ghost == Some(self.pos) =>
            {
                let color = surface.color(surface::GHOST);
                painter.at(self.pos, |p| p.fill_hexagon(color));
            }
            (Layer::Content, ItemKind::Settlement { kind, owner, .. })
            | (Layer::Content, ItemKind::Unit { kind, owner, .. }) => {
                let banner = surface.owner_color(owner.as_deref());
                let tile = painter.tile();
                let corner = Point::new(tile.width / 4, tile.height / 4);
                painter.at(self.pos, |p| {
                    p.image(kind);
                    p.mark(corner, tile.width / 10, banner);
                });
            }
            (Layer::Path, ItemKind::Node { node, .. })
                if painter.decorations().path.contains(node) =>
            {
                let color = surface.color(surface::PATH);
                let tile = painter.tile();
                painter.at(self.pos, |p| p.mark(tile.center(), tile.width / 8, color));
            }
            _ => {}
        }
    }

    fn paint_scaled(&self, layer: Layer, painter: &mut Painter<'_>) {
        let surface = painter.surface();
        match (layer, &self.kind) {
            (Layer::Terrain, ItemKind::Node { terrain, .. }) => {
                let color = surface.mini_color(terrain);
                painter.at(self.pos, |p| p.fill_hexagon(color));
            }
            (Layer::Content, ItemKind::Settlement { owner, .. })
            | (Layer::Content, ItemKind::Unit { owner, .. }) => {
                let color = surface.owner_color(owner.as_deref());
                let tile = painter.tile();
                painter.at(self.pos, |p| p.mark(tile.center(), tile.width / 4, color));
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// ItemArena
// ---------------------------------------------------------------------------

/// Owns every item of a view, in insertion order, with lookup indexes by
/// position (tiles only), node, settlement and unit.
///
/// Position index contract: exact integer equality. At most one tile item
/// (node or phantom) per position.
#[derive(Debug, Default)]
pub struct ItemArena {
    items: SlotMap<ItemId, MapItem>,
    order: Vec<ItemId>,
    tiles: HashMap<Point, ItemId>,
    nodes: HashMap<NodeId, ItemId>,
    settlements: HashMap<SettlementId, ItemId>,
    units: HashMap<UnitId, ItemId>,
}

impl ItemArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&MapItem> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut MapItem> {
        self.items.get_mut(id)
    }

    /// Items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &MapItem)> {
        self.order
            .iter()
            .filter_map(|&id| self.items.get(id).map(|item| (id, item)))
    }

    /// Tile items (nodes and phantoms) in insertion order.
    pub fn tiles(&self) -> impl Iterator<Item = (ItemId, &MapItem)> {
        self.iter().filter(|(_, item)| item.is_tile())
    }

    pub fn tile_at(&self, pos: Point) -> Option<ItemId> {
        self.tiles.get(&pos).copied()
    }

    pub fn node_item(&self, node: NodeId) -> Option<ItemId> {
        self.nodes.get(&node).copied()
    }

    pub fn settlement_item(&self, settlement: SettlementId) -> Option<ItemId> {
        self.settlements.get(&settlement).copied()
    }

    pub fn unit_item(&self, unit: UnitId) -> Option<ItemId> {
        self.units.get(&unit).copied()
    }

    pub fn placed_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn phantom_count(&self) -> usize {
        self.items.values().filter(|i| i.is_phantom()).count()
    }

    pub fn settlement_count(&self) -> usize {
        self.settlements.len()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Insert an item and index it. Tile items must go to a free position;
    /// content replaces whatever the node already carried of the same kind.
    pub fn insert(&mut self, item: MapItem) -> ItemId {
        let pos = item.pos;
        let id = self.items.insert(item);
        self.order.push(id);

        let replaced = match self.items[id].kind {
            ItemKind::Node { node, .. } => {
                self.index_tile(pos, id);
                self.nodes.insert(node, id);
                None
            }
            ItemKind::Phantom { .. } => {
                self.index_tile(pos, id);
                None
            }
            ItemKind::Settlement {
                settlement, node, ..
            } => {
                self.settlements.insert(settlement, id);
                match self.items.get_mut(node).map(|n| &mut n.kind) {
                    Some(ItemKind::Node { settlement, .. }) => settlement.replace(id),
                    _ => None,
                }
            }
            ItemKind::Unit { unit, node, .. } => {
                self.units.insert(unit, id);
                match self.items.get_mut(node).map(|n| &mut n.kind) {
                    Some(ItemKind::Node { unit, .. }) => unit.replace(id),
                    _ => None,
                }
            }
        };

        if let Some(old) = replaced {
            log::warn!("node already carried {old:?}, replacing it with {id:?}");
            self.remove(old);
        }
        id
    }

    fn index_tile(&mut self, pos: Point, id: ItemId) {
        if let Some(previous) = self.tiles.insert(pos, id) {
            log::error!("tile {pos} was already held by {previous:?}");
        }
    }

    /// Remove an item and drop every index entry and back-reference to it.
    /// Removing a node removes the settlement and unit sitting on it.
    pub fn remove(&mut self, id: ItemId) -> Option<MapItem> {
        let item = self.items.remove(id)?;
        self.order.retain(|&o| o != id);

        match &item.kind {
            ItemKind::Node {
                node,
                settlement,
                unit,
                ..
            } => {
                self.unindex_tile(item.pos, id);
                self.nodes.remove(node);
                for content in [settlement, unit].into_iter().flatten() {
                    self.remove(*content);
                }
            }
            ItemKind::Phantom { .. } => {
                self.unindex_tile(item.pos, id);
            }
            ItemKind::Settlement {
                settlement, node, ..
            } => {
                self.settlements.remove(settlement);
                if let Some(ItemKind::Node { settlement, .. }) =
                    self.items.get_mut(*node).map(|n| &mut n.kind)
                    && *settlement == Some(id)
                {
                    *settlement = None;
                }
            }
            ItemKind::Unit { unit, node, .. } => {
                self.units.remove(unit);
                if let Some(ItemKind::Node { unit, .. }) =
                    self.items.get_mut(*node).map(|n| &mut n.kind)
                    && *unit == Some(id)
                {
                    *unit = None;
                }
            }
        }
        Some(item)
    }

    fn unindex_tile(&mut self, pos: Point, id: ItemId) {
        if self.tiles.get(&pos) == Some(&id) {
            self.tiles.remove(&pos);
        }
    }

    /// Record `node` as the real neighbour lying in `dir` from `phantom`.
    pub fn link_phantom(&mut self, phantom: ItemId, dir: Direction, node: ItemId) {
        if let Some(MapItem {
            kind: ItemKind::Phantom { neighbours },
            ..
        }) = self.items.get_mut(phantom)
        {
            neighbours[dir.index()] = Some(node);
        }
    }

    /// Move every item by `delta` and rebuild the position index.
    pub fn translate_all(&mut self, delta: Point) {
        for item in self.items.values_mut() {
            item.pos += delta;
        }
        self.tiles = self
            .items
            .iter()
            .filter(|(_, item)| item.is_tile())
            .map(|(id, item)| (item.pos, id))
            .collect();
    }

    /// Bounding rect of all tiles: one tile past the last position on the
    /// right/bottom, plus half a tile of padding on every side.
    pub fn bounding_rect(&self, tile: TileSize) -> Rect {
        let mut tiles = self.tiles.keys();
        let Some(&first) = tiles.next() else {
            return Rect::ZERO;
        };

        let (mut top_left, mut bottom_right) = (first, first);
        for pos in tiles {
            top_left.x = top_left.x.min(pos.x);
            top_left.y = top_left.y.min(pos.y);
            bottom_right.x = bottom_right.x.max(pos.x);
            bottom_right.y = bottom_right.y.max(pos.y);
        }

        bottom_right += Point::new(tile.width, tile.height);

        let padding = Point::new(tile.width / 2, tile.height / 2);
        let top_left = top_left - padding;
        let bottom_right = bottom_right + padding;

        Rect::new(
            top_left.x,
            top_left.y,
            bottom_right.x - top_left.x,
            bottom_right.y - top_left.y,
        )
    }
}

/// Validate structural invariants of an item arena.
///
/// - Every tile item is indexed at its own position, and no two tiles share
///   a position.
/// - Node and content back-references agree in both directions.
/// - At most one item is focused.
///
/// Panics with a description of the first violation.
pub fn validate_arena(arena: &ItemArena) {
    let mut seen = HashMap::new();
    for (id, item) in arena.tiles() {
        if let Some(other) = seen.insert(item.pos, id) {
            panic!("tiles {other:?} and {id:?} share position {}", item.pos);
        }
        assert_eq!(
            arena.tile_at(item.pos),
            Some(id),
            "tile {id:?} not indexed at {}",
            item.pos
        );
    }
    assert_eq!(seen.len(), arena.tiles.len(), "stale entries in tile index");

    for (id, item) in arena.iter() {
        match &item.kind {
            ItemKind::Node {
                settlement, unit, ..
            } => {
                for content in [settlement, unit].into_iter().flatten() {
                    let owner = arena.get(*content).and_then(|c| match c.kind {
                        ItemKind::Settlement { node, .. } | ItemKind::Unit { node, .. } => {
                            Some(node)
                        }
                        _ => None,
                    });
                    assert_eq!(owner, Some(id), "content {content:?} not owned by {id:?}");
                }
            }
            ItemKind::Settlement { node, .. } => {
                let back = arena.get(*node).and_then(|n| match n.kind {
                    ItemKind::Node { settlement, .. } => settlement,
                    _ => None,
                });
                assert_eq!(back, Some(id), "settlement {id:?} not linked from {node:?}");
            }
            ItemKind::Unit { node, .. } => {
                let back = arena.get(*node).and_then(|n| match n.kind {
                    ItemKind::Node { unit, .. } => unit,
                    _ => None,
                });
                assert_eq!(back, Some(id), "unit {id:?} not linked from {node:?}");
            }
            ItemKind::Phantom { .. } => {}
        }
    }

    let focused = arena.iter().filter(|(_, item)| item.focused).count();
    assert!(focused <= 1, "{focused} items focused at once");
}
