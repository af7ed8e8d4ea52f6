//! Pointer input: hover focus, click dispatch and drag-to-pan.

use super::{ItemRef, MapView, PointerState, ViewEvent, ViewKind};
use crate::geometry::Point;
use crate::items::ItemId;

/// Minimum pixel distance (per axis) before a press becomes a drag.
pub const DRAG_THRESHOLD: i32 = 4;

impl MapView {
    /// Topmost tile under a screen point. Settlements and units are reached
    /// through the node they sit on.
    pub fn find_item_at(&self, screen: Point) -> Option<ItemId> {
        let map = if self.kind.is_scaled() {
            self.viewport.unscale(screen)
        } else {
            self.viewport.to_map(screen)
        };
        self.items
            .tiles()
            .find(|(_, item)| item.contains_point(map, self.tile))
            .map(|(id, _)| id)
    }

    pub fn on_pressed(&mut self, screen: Point) {
        self.pointer = PointerState {
            press: Some(screen),
            last: screen,
            dragging: false,
        };
        if self.kind == ViewKind::Mini {
            self.move_viewport_to(screen);
        }
    }

    pub fn on_released(&mut self, screen: Point) {
        let pointer = std::mem::take(&mut self.pointer);
        if pointer.press.is_none() || pointer.dragging {
            return;
        }
        match self.kind {
            ViewKind::Game | ViewKind::Editor => self.click(screen),
            ViewKind::Mini | ViewKind::Preview => {}
        }
    }

    /// Pointer moved. With the button held this drags (pans a map view,
    /// moves the window on a minimap); otherwise it moves hover focus.
    pub fn on_position_changed(&mut self, screen: Point, pressed: bool) {
        if !pressed || self.pointer.press.is_none() {
            self.pointer = PointerState::default();
            if !self.kind.is_scaled() {
                let hit = self.find_item_at(screen);
                self.set_focus(hit);
            }
            return;
        }

        if let Some(origin) = self.pointer.press
            && !self.pointer.dragging
        {
            let d = screen - origin;
            if d.x.abs() >= DRAG_THRESHOLD || d.y.abs() >= DRAG_THRESHOLD {
                self.pointer.dragging = true;
            }
        }
        if !self.pointer.dragging {
            return;
        }

        match self.kind {
            ViewKind::Game | ViewKind::Editor => {
                let delta = self.pointer.last - screen;
                self.move_viewport_by(delta);
            }
            ViewKind::Mini => self.move_viewport_to(screen),
            ViewKind::Preview => {}
        }
        self.pointer.last = screen;
    }

    /// Press and release on a map view without a drag in between.
    fn click(&mut self, screen: Point) {
        let hit = self.find_item_at(screen);
        let target = hit.and_then(|id| self.item_ref(id));
        self.events.push(ViewEvent::ItemClicked(target.clone()));

        let (Some(id), Some(target)) = (hit, target) else {
            return;
        };
        let (settlement, unit) = self.node_content(id);
        let event = match &self.editor {
            Some(editor) => editor.on_click(&target, settlement, unit),
            None => match target {
                ItemRef::Node(node) => Some(ViewEvent::ItemsSelected {
                    node,
                    settlement,
                    unit,
                }),
                _ => None,
            },
        };
        if let Some(event) = event {
            log::debug!("{:?} click: {event:?}", self.kind);
            self.events.push(event);
        }
    }
}
