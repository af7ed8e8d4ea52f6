//! Phantom tiles: placeholders around the edge of the placed graph that the
//! editor offers as "create a node here" targets.

use crate::dirty::DirtyRegions;
use crate::geometry::{Direction, Point, Rect, TileSize, neighbour_pos};
use crate::items::{ItemArena, ItemId, ItemKind, MapItem};
use crate::model::{MapModel, NeighbourLinks};

/// Fill the empty adjacency slots of `node_item` with phantoms.
///
/// A free slot gets a new phantom. A slot already holding a phantom is
/// reused, so no position ever carries two tiles. Either way the phantom
/// learns that the node lies opposite the slot's direction. A slot holding a
/// real node the model hasn't linked yet is left alone.
///
/// Returns the number of phantoms created.
pub fn synthesize<M>(
    model: &M,
    arena: &mut ItemArena,
    node_item: ItemId,
    tile: TileSize,
    dirty: &mut DirtyRegions,
) -> usize
where
    M: MapModel + ?Sized,
{
    let Some((node, pos)) = arena
        .get(node_item)
        .and_then(|item| item.node_id().map(|n| (n, item.pos)))
    else {
        log::warn!("phantom synthesis for non-node item {node_item:?}");
        return 0;
    };

    let mut created = 0;
    for dir in Direction::ALL {
        if model.neighbour(node, dir).is_some() {
            continue;
        }
        let slot = neighbour_pos(pos, dir, tile);
        let phantom = match arena.tile_at(slot) {
            None => {
                let id = arena.insert(MapItem::phantom(slot));
                dirty.mark(Rect::tile(slot, tile));
                created += 1;
                id
            }
            Some(id) if arena.get(id).is_some_and(MapItem::is_phantom) => id,
            Some(_) => continue,
        };
        arena.link_phantom(phantom, dir.opposite(), node_item);
    }

    if created > 0 {
        log::debug!("{created} phantoms created around {node}");
    }
    created
}

/// Remove the phantom at `pos`, if any, so a real node can take the slot.
pub fn take_phantom_at(
    arena: &mut ItemArena,
    pos: Point,
    tile: TileSize,
    dirty: &mut DirtyRegions,
) -> Option<ItemId> {
    let id = arena.tile_at(pos)?;
    if !arena.get(id).is_some_and(MapItem::is_phantom) {
        return None;
    }
    arena.remove(id);
    dirty.mark(Rect::tile(pos, tile));
    Some(id)
}

/// The real nodes around a phantom, as model links: each entry says which
/// node lies in which direction from the phantom's slot.
pub fn neighbour_links(arena: &ItemArena, phantom: ItemId) -> NeighbourLinks {
    let Some(ItemKind::Phantom { neighbours }) = arena.get(phantom).map(|i| &i.kind) else {
        return NeighbourLinks::new();
    };
    Direction::ALL
        .into_iter()
        .filter_map(|dir| {
            let item = neighbours[dir.index()]?;
            let node = arena.get(item)?.node_id()?;
            Some((dir, node))
        })
        .collect()
}
