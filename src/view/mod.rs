//! Map views: the item graph of one on-screen map, kept in step with the
//! host model through explicit notifications.
//!
//! A view never calls back into the host. Everything it wants to say
//! (clicks, focus changes, editor requests, window moves) is queued as a
//! [`ViewEvent`] and drained with [`MapView::take_events`]; repaint requests
//! are drained with [`MapView::take_repaint`].

mod editor;
mod input;

pub use editor::{EditMode, EditorState};
pub use input::DRAG_THRESHOLD;

use std::collections::HashSet;

use crate::dirty::{DirtyRegions, Repaint, RepaintPolicy};
use crate::geometry::{Point, Rect, Size, TileSize};
use crate::items::{ItemArena, ItemId, ItemKind, MapItem};
use crate::layout::{self, Placement};
use crate::model::{MapModel, MapRequest, NeighbourLinks, NodeId, SettlementId, UnitId};
use crate::phantom;
use crate::render::{Decorations, DrawCommand, DrawList, Layer, Overlay, PaintStyle, Painter};
use crate::resources::{LoadOutcome, ResourceTracker};
use crate::surface::{self, WorldSurface};
use crate::viewport::{Viewport, centered_window};

/// The four view variants. Map views show the map at full size; scaled views
/// (minimap, preview) fit the whole map into their canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Game,
    Editor,
    Mini,
    Preview,
}

impl ViewKind {
    pub fn is_scaled(self) -> bool {
        matches!(self, ViewKind::Mini | ViewKind::Preview)
    }

    pub fn repaint_policy(self) -> RepaintPolicy {
        if self.is_scaled() {
            RepaintPolicy::WholeCanvas
        } else {
            RepaintPolicy::DirtyTiles
        }
    }

    pub fn paint_style(self) -> PaintStyle {
        if self.is_scaled() {
            PaintStyle::Scaled
        } else {
            PaintStyle::Full
        }
    }

    /// Only the editor offers phantoms to grow the map.
    pub fn has_phantoms(self) -> bool {
        self == ViewKind::Editor
    }
}

/// A view item as the host knows it.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemRef {
    Node(NodeId),
    /// An empty slot; `neighbours` says which real nodes lie in which
    /// direction from it.
    Phantom { neighbours: NeighbourLinks },
    Settlement(SettlementId),
    Unit(UnitId),
}

/// Outbound notifications, drained with [`MapView::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Press and release without a drag. `None` if nothing was hit.
    ItemClicked(Option<ItemRef>),
    /// Hover focus moved. `None` if the pointer left every tile.
    ItemFocused(Option<ItemRef>),
    ItemsSelected {
        node: NodeId,
        settlement: Option<SettlementId>,
        unit: Option<UnitId>,
    },
    EditNode(NodeId),
    EditSettlement(SettlementId),
    EditUnit(UnitId),
    /// The visible window moved, in layout coordinates. A map view reports
    /// its own window; a minimap reports where the main window should go.
    WindowMoved(Rect),
    Request(MapRequest),
}

#[derive(Debug, Default)]
struct PointerState {
    press: Option<Point>,
    last: Point,
    dragging: bool,
}

pub struct MapView {
    kind: ViewKind,
    surface: WorldSurface,
    tile: TileSize,
    items: ItemArena,
    viewport: Viewport,
    dirty: DirtyRegions,
    geometry_changed: bool,
    /// Sum of all origin adjustments. Item position minus `shift` is the
    /// position the layout walk gave the item, which is the same in every
    /// view of one model.
    shift: Point,
    resources: ResourceTracker,
    pending_loads: Vec<String>,
    decorations: Decorations,
    focused: Option<ItemId>,
    pointer: PointerState,
    editor: Option<EditorState>,
    /// Main view window shown by a minimap, in layout coordinates.
    main_window: Rect,
    events: Vec<ViewEvent>,
}

impl MapView {
    /// Build a view of the whole model.
    ///
    /// Map views queue every image of the surface for loading and paint
    /// nothing until those loads settle. Scaled views draw flat colours and
    /// are ready at once.
    pub fn new<M>(kind: ViewKind, surface: WorldSurface, model: &M, viewport_size: Size) -> Self
    where
        M: MapModel + ?Sized,
    {
        let (resources, pending_loads) = if kind.is_scaled() {
            (ResourceTracker::ready(), Vec::new())
        } else {
            let mut tracker = ResourceTracker::new();
            let queued = tracker.request(surface.image_paths());
            (tracker, queued)
        };

        let mut view = Self {
            kind,
            tile: surface.tile_size,
            surface,
            items: ItemArena::new(),
            viewport: Viewport::new(viewport_size),
            dirty: DirtyRegions::new(),
            geometry_changed: true,
            shift: Point::ZERO,
            resources,
            pending_loads,
            decorations: Decorations::default(),
            focused: None,
            pointer: PointerState::default(),
            editor: (kind == ViewKind::Editor).then(EditorState::new),
            main_window: Rect::ZERO,
            events: Vec::new(),
        };

        if let Some(root) = model.root() {
            let mut visited = HashSet::new();
            let placements = layout::walk(model, root, Point::ZERO, view.tile, &mut visited);
            view.place_nodes(model, placements);
        }
        view.dirty.mark_all();

        log::info!(
            "built {:?} view: {} nodes, {} phantoms, {} settlements, {} units",
            kind,
            view.items.node_count(),
            view.items.phantom_count(),
            view.items.settlement_count(),
            view.items.unit_count()
        );
        view
    }

    // -- accessors ----------------------------------------------------------

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn tile(&self) -> TileSize {
        self.tile
    }

    pub fn surface(&self) -> &WorldSurface {
        &self.surface
    }

    pub fn items(&self) -> &ItemArena {
        &self.items
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn decorations(&self) -> &Decorations {
        &self.decorations
    }

    pub fn is_ready(&self) -> bool {
        self.resources.is_ready()
    }

    pub fn geometry_changed(&self) -> bool {
        self.geometry_changed
    }

    pub fn edit_mode(&self) -> Option<EditMode> {
        self.editor.as_ref().map(|e| e.mode)
    }

    pub fn focused(&self) -> Option<ItemId> {
        self.focused
    }

    /// Where a node sits in this view, if placed.
    pub fn node_pos(&self, node: NodeId) -> Option<Point> {
        let id = self.items.node_item(node)?;
        self.items.get(id).map(|item| item.pos)
    }

    /// The visible window in layout coordinates, for a minimap's
    /// [`MapView::set_window`].
    pub fn visible_area(&self) -> Rect {
        self.viewport.window().translated(-self.shift)
    }

    /// Host-facing identity of an item.
    pub fn item_ref(&self, id: ItemId) -> Option<ItemRef> {
        let item = self.items.get(id)?;
        Some(match &item.kind {
            ItemKind::Node { node, .. } => ItemRef::Node(*node),
            ItemKind::Phantom { .. } => ItemRef::Phantom {
                neighbours: phantom::neighbour_links(&self.items, id),
            },
            ItemKind::Settlement { settlement, .. } => ItemRef::Settlement(*settlement),
            ItemKind::Unit { unit, .. } => ItemRef::Unit(*unit),
        })
    }

    /// Settlement and unit sitting on a node item.
    fn node_content(&self, id: ItemId) -> (Option<SettlementId>, Option<UnitId>) {
        let Some(ItemKind::Node {
            settlement, unit, ..
        }) = self.items.get(id).map(|i| &i.kind)
        else {
            return (None, None);
        };
        let settlement = settlement
            .and_then(|s| self.items.get(s))
            .and_then(|s| match s.kind {
                ItemKind::Settlement { settlement, .. } => Some(settlement),
                _ => None,
            });
        let unit = unit
            .and_then(|u| self.items.get(u))
            .and_then(|u| match u.kind {
                ItemKind::Unit { unit, .. } => Some(unit),
                _ => None,
            });
        (settlement, unit)
    }

    /// Drain queued outbound events.
    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    // -- model notifications ------------------------------------------------

    /// Place nodes found by a walk, replacing phantoms they land on, then
    /// grow phantoms around them and attach whatever content the model
    /// already has for them.
    fn place_nodes<M>(&mut self, model: &M, placements: Vec<Placement>)
    where
        M: MapModel + ?Sized,
    {
        let mut placed = Vec::with_capacity(placements.len());
        for Placement { node, pos } in placements {
            let taken = phantom::take_phantom_at(&mut self.items, pos, self.tile, &mut self.dirty);
            if let Some(taken) = taken {
                if self.focused == Some(taken) {
                    self.set_focus(None);
                }
                if self.decorations.ghost == Some(pos) {
                    self.decorations.ghost = None;
                }
            }
            if self.items.tile_at(pos).is_some() {
                log::warn!("{node} would overlap another node at {pos}, not placed");
                continue;
            }
            let terrain = model.terrain(node).unwrap_or_else(|| {
                log::warn!("{node} has no terrain");
                ""
            });
            let id = self.items.insert(MapItem::node(pos, node, terrain));
            self.dirty.mark(Rect::tile(pos, self.tile));
            log::debug!("{node} placed at {pos}");
            placed.push((id, node));
        }

        if placed.is_empty() {
            return;
        }

        if self.kind.has_phantoms() {
            for &(id, _) in &placed {
                phantom::synthesize(model, &mut self.items, id, self.tile, &mut self.dirty);
            }
        }

        let nodes: HashSet<NodeId> = placed.iter().map(|&(_, node)| node).collect();
        for id in model.settlement_ids() {
            if let Some(record) = model.settlement(id)
                && nodes.contains(&record.node)
            {
                self.on_settlement_added(model, id);
            }
        }
        for id in model.unit_ids() {
            if let Some(record) = model.unit(id)
                && nodes.contains(&record.node)
            {
                self.on_unit_added(model, id);
            }
        }

        self.geometry_changed = true;
    }

    /// The host added `node` to the model. It is placed next to an already
    /// placed neighbour, together with any unplaced nodes reachable from it.
    pub fn on_node_added<M>(&mut self, model: &M, node: NodeId)
    where
        M: MapModel + ?Sized,
    {
        if self.items.node_item(node).is_some() {
            log::warn!("{node} is already placed");
            return;
        }

        let pos = if self.items.node_count() == 0 {
            // First node of an empty view; layout coordinates start at zero.
            self.shift
        } else {
            match layout::anchor(model, node, self.tile, |n| self.node_pos(n)) {
                Ok(pos) => pos,
                Err(e) => {
                    log::warn!("{e}");
                    return;
                }
            }
        };

        let mut visited: HashSet<NodeId> = self.items.placed_nodes().collect();
        let placements = layout::walk(model, node, pos, self.tile, &mut visited);
        self.place_nodes(model, placements);
    }

    pub fn on_settlement_added<M>(&mut self, model: &M, id: SettlementId)
    where
        M: MapModel + ?Sized,
    {
        if self.items.settlement_item(id).is_some() {
            return;
        }
        let Some(record) = model.settlement(id) else {
            log::warn!("unknown settlement {}", id.0);
            return;
        };
        let Some(node_item) = self.items.node_item(record.node) else {
            log::warn!("settlement {} is on unplaced node {}", id.0, record.node);
            return;
        };
        let Some(pos) = self.items.get(node_item).map(|n| n.pos) else {
            return;
        };
        self.items.insert(MapItem::settlement(pos, &record, node_item));
        self.dirty.mark(Rect::tile(pos, self.tile));
    }

    pub fn on_unit_added<M>(&mut self, model: &M, id: UnitId)
    where
        M: MapModel + ?Sized,
    {
        if self.items.unit_item(id).is_some() {
            return;
        }
        let Some(record) = model.unit(id) else {
            log::warn!("unknown unit {}", id.0);
            return;
        };
        let Some(node_item) = self.items.node_item(record.node) else {
            log::warn!("unit {} is on unplaced node {}", id.0, record.node);
            return;
        };
        let Some(pos) = self.items.get(node_item).map(|n| n.pos) else {
            return;
        };
        self.items.insert(MapItem::unit(pos, &record, node_item));
        self.dirty.mark(Rect::tile(pos, self.tile));
    }

    pub fn on_settlement_removed(&mut self, id: SettlementId) {
        let Some(item) = self.items.settlement_item(id) else {
            log::warn!("removing unknown settlement {}", id.0);
            return;
        };
        if let Some(removed) = self.items.remove(item) {
            self.dirty.mark(removed.tile_rect(self.tile));
        }
    }

    pub fn on_unit_removed(&mut self, id: UnitId) {
        let Some(item) = self.items.unit_item(id) else {
            log::warn!("removing unknown unit {}", id.0);
            return;
        };
        if let Some(removed) = self.items.remove(item) {
            self.dirty.mark(removed.tile_rect(self.tile));
        }
    }

    // -- resources ----------------------------------------------------------

    /// Image paths the host still has to load. Each path is handed out once.
    pub fn pending_resources(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_loads)
    }

    pub fn on_resource_loaded(&mut self, path: &str, outcome: LoadOutcome) {
        if self.resources.settle(path, outcome) {
            self.dirty.mark_all();
        }
    }

    // -- geometry -----------------------------------------------------------

    /// Recompute bounding rect, canvas size and window, then re-anchor the
    /// origin if the map grew up or left.
    pub fn update_geometry(&mut self) {
        let bounding = self.items.bounding_rect(self.tile);
        self.viewport.fit(bounding, self.kind.is_scaled());
        self.adjust_origin();
        self.geometry_changed = false;
        log::debug!(
            "{:?} geometry updated: bounding {} canvas {}x{} window {}",
            self.kind,
            self.viewport.bounding(),
            self.viewport.canvas().width,
            self.viewport.canvas().height,
            self.viewport.window()
        );
    }

    /// Move every item so the bounding rect starts at (0, 0), moving the
    /// window along so the same content stays on screen.
    pub fn adjust_origin(&mut self) {
        let offset = self.viewport.bounding().origin();
        if offset == Point::ZERO {
            return;
        }
        let delta = -offset;
        self.items.translate_all(delta);
        if let Some(ghost) = &mut self.decorations.ghost {
            *ghost += delta;
        }
        self.shift += delta;
        self.viewport.rebase(delta);
        self.dirty.mark_all();
    }

    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport.resize(size);
        self.geometry_changed = true;
        self.dirty.mark_all();
    }

    /// Pending repaint, if any. Runs a deferred geometry update first. Nothing
    /// is handed out before the view's images have settled.
    pub fn take_repaint(&mut self) -> Option<Repaint> {
        if self.geometry_changed {
            self.update_geometry();
        }
        if !self.resources.is_ready() {
            return None;
        }
        self.dirty.take(self.kind.repaint_policy())
    }

    // -- viewport movement --------------------------------------------------

    /// Pan a map view's window by `delta`, clamped to the canvas.
    pub fn move_viewport_by(&mut self, delta: Point) {
        if self.viewport.move_by(delta) {
            self.window_moved();
        }
    }

    /// Centre a window on `screen`.
    ///
    /// On a minimap `screen` is a point on the minimap: it is divided by the
    /// scale factor and the main view's window is centred there, clamped to
    /// the content, and reported with [`ViewEvent::WindowMoved`]. On a map
    /// view the view's own window is centred on the canvas point under
    /// `screen`.
    pub fn move_viewport_to(&mut self, screen: Point) {
        match self.kind {
            ViewKind::Mini => {
                let target = self.viewport.unscale(screen);
                let size = self.main_window.size();
                let origin = centered_window(target, size, self.viewport.content());
                let window = Rect::from_origin(origin.saturating_sub(self.shift), size);
                if window != self.main_window {
                    self.main_window = window;
                    self.dirty.mark_all();
                    self.events.push(ViewEvent::WindowMoved(window));
                }
            }
            ViewKind::Preview => {}
            ViewKind::Game | ViewKind::Editor => {
                let target = self.viewport.to_map(screen);
                let size = self.viewport.window().size();
                let half = Point::new(size.width / 2, size.height / 2);
                let origin = target.saturating_sub(half);
                if self.viewport.move_to(origin) {
                    self.window_moved();
                }
            }
        }
    }

    /// Put a map view's window at `origin` (layout coordinates), as reported
    /// by a minimap's [`ViewEvent::WindowMoved`].
    pub fn scroll_to(&mut self, origin: Point) {
        if self.kind.is_scaled() {
            log::warn!("{:?} view has no scrollable window", self.kind);
            return;
        }
        if self.viewport.move_to(origin.saturating_add(self.shift)) {
            self.dirty.mark(self.viewport.window());
        }
    }

    /// The newly exposed window needs drawing, and linked minimaps need the
    /// new outline.
    fn window_moved(&mut self) {
        self.dirty.mark(self.viewport.window());
        self.events.push(ViewEvent::WindowMoved(self.visible_area()));
    }

    /// Main view window to outline on a minimap, in layout coordinates.
    pub fn set_window(&mut self, window: Rect) {
        if self.kind != ViewKind::Mini {
            log::warn!("set_window on {:?} view ignored", self.kind);
            return;
        }
        if self.main_window != window {
            self.main_window = window;
            self.dirty.mark_all();
        }
    }

    pub fn main_window(&self) -> Rect {
        self.main_window
    }

    // -- editor settings ----------------------------------------------------

    fn editor_mut(&mut self) -> Option<&mut EditorState> {
        if self.editor.is_none() {
            log::warn!("{:?} view has no edit mode", self.kind);
        }
        self.editor.as_mut()
    }

    pub fn set_edit_mode(&mut self, mode: EditMode) {
        if let Some(editor) = self.editor_mut() {
            editor.mode = mode;
        }
        self.refresh_ghost();
    }

    /// Set the edit mode by name. An unknown name is logged and ignored.
    pub fn set_edit_mode_by_name(&mut self, name: &str) {
        if let Some(editor) = self.editor_mut() {
            // Already logged; the mode stays as it was.
            let _ = editor.set_mode_by_name(name);
        }
        self.refresh_ghost();
    }

    pub fn set_terrain_type(&mut self, terrain: &str) {
        if let Some(editor) = self.editor_mut() {
            editor.terrain = Some(terrain.to_string());
        }
    }

    pub fn set_settlement_type(&mut self, kind: &str) {
        if let Some(editor) = self.editor_mut() {
            editor.settlement_kind = Some(kind.to_string());
        }
    }

    pub fn set_unit_type(&mut self, kind: &str) {
        if let Some(editor) = self.editor_mut() {
            editor.unit_kind = Some(kind.to_string());
        }
    }

    // -- decorations --------------------------------------------------------

    fn mark_nodes_dirty<'a>(&mut self, nodes: impl IntoIterator<Item = &'a NodeId>) {
        for node in nodes {
            if let Some(pos) = self.node_pos(*node) {
                self.dirty.mark(Rect::tile(pos, self.tile));
            }
        }
    }

    /// Nodes to mark in the path pass. Replaces the previous path.
    pub fn set_path(&mut self, nodes: &[NodeId]) {
        let old = std::mem::take(&mut self.decorations.path);
        self.mark_nodes_dirty(&old);
        self.mark_nodes_dirty(nodes);
        self.decorations.path = nodes.iter().copied().collect();
    }

    /// Add an overlay, replacing any overlay with the same name.
    pub fn set_overlay(&mut self, overlay: Overlay) {
        let nodes: Vec<NodeId> = overlay.nodes.iter().copied().collect();
        if let Some(index) = self
            .decorations
            .overlays
            .iter()
            .position(|o| o.name == overlay.name)
        {
            let old = self.decorations.overlays.remove(index);
            self.mark_nodes_dirty(&old.nodes);
        }
        self.mark_nodes_dirty(&nodes);
        self.decorations.overlays.push(overlay);
    }

    pub fn clear_overlay(&mut self, name: &str) {
        let overlays = &mut self.decorations.overlays;
        if let Some(index) = overlays.iter().position(|o| o.name == name) {
            let old = overlays.remove(index);
            self.mark_nodes_dirty(&old.nodes);
        }
    }

    /// Ghost follows the focused phantom while creating nodes.
    fn refresh_ghost(&mut self) {
        let ghost = match (self.edit_mode(), self.focused) {
            (Some(EditMode::CreateNode), Some(id)) => self
                .items
                .get(id)
                .filter(|item| item.is_phantom())
                .map(|item| item.pos),
            _ => None,
        };
        if ghost == self.decorations.ghost {
            return;
        }
        for pos in [self.decorations.ghost, ghost].into_iter().flatten() {
            self.dirty.mark(Rect::tile(pos, self.tile));
        }
        self.decorations.ghost = ghost;
    }

    // -- focus --------------------------------------------------------------

    /// Move hover focus to `target`: exit the old item, then enter the new.
    fn set_focus(&mut self, target: Option<ItemId>) {
        if self.focused == target {
            return;
        }
        if let Some(old) = self.focused.take()
            && let Some(item) = self.items.get_mut(old)
        {
            item.on_focus_exit(self.tile, &mut self.dirty);
        }
        if let Some(new) = target
            && let Some(item) = self.items.get_mut(new)
        {
            item.on_focus_enter(self.tile, &mut self.dirty);
            self.focused = Some(new);
        }
        let focused = self.focused.and_then(|id| self.item_ref(id));
        self.events.push(ViewEvent::ItemFocused(focused));
        self.refresh_ghost();
    }

    // -- painting -----------------------------------------------------------

    /// Emit draw commands for `region` (canvas coordinates).
    ///
    /// Map views paint only the items whose tiles meet `region`. Scaled views
    /// repaint the whole canvas, scaled to fit, and a minimap outlines the
    /// main view's window. Empty while images are still loading.
    pub fn paint(&mut self, region: Rect) -> DrawList {
        let mut list = DrawList::new();
        if !self.resources.is_ready() {
            return list;
        }
        if self.geometry_changed {
            self.update_geometry();
        }

        let scaled = self.kind.is_scaled();
        let scale = self.viewport.scale();
        let clear = if scaled {
            Rect::from_origin(Point::ZERO, self.viewport.canvas())
        } else {
            region
        };
        list.push(DrawCommand::Clear(clear));
        if scaled {
            list.push(DrawCommand::Save);
            list.push(DrawCommand::Scale(scale));
        }

        {
            let mut painter = Painter::new(
                &mut list,
                &self.surface,
                &self.resources,
                &self.decorations,
                self.kind.paint_style(),
            );
            let visible: Vec<&MapItem> = self
                .items
                .iter()
                .map(|(_, item)| item)
                .filter(|item| scaled || item.tile_rect(self.tile).intersects(&region))
                .collect();
            for layer in Layer::ALL {
                painter.push(DrawCommand::BeginPass(layer));
                for item in &visible {
                    item.paint(layer, &mut painter);
                }
            }
        }

        if scaled {
            if self.kind == ViewKind::Mini && !self.main_window.is_empty() {
                list.push(DrawCommand::StrokeRect {
                    rect: self.main_window.translated(self.shift),
                    color: self.surface.color(surface::WINDOW),
                    width: if scale > 0.0 { 2.0 / scale } else { 2.0 },
                });
            }
            list.push(DrawCommand::Restore);
        }
        list
    }
}
