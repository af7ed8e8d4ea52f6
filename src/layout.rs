//! Placement of model nodes in pixel space.
//!
//! The layout is a depth-first walk over the adjacency graph. Each node is
//! placed at its parent's position plus the displacement of the direction
//! that leads to it. The same walk grows an existing layout: start it at a
//! freshly added node with the already placed nodes marked visited.

use std::collections::HashSet;

use crate::error::MapError;
use crate::geometry::{Direction, Point, TileSize, neighbour_pos};
use crate::model::{MapModel, NodeId};

/// Where the walk put a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub node: NodeId,
    pub pos: Point,
}

/// Walk the graph from `start` (placed at `origin`), skipping anything in
/// `visited`, and return the new placements in preorder.
///
/// Neighbours are visited in `Direction::ALL` order. Every returned node is
/// added to `visited`, so cycles terminate and each node is placed once.
pub fn walk<M>(
    model: &M,
    start: NodeId,
    origin: Point,
    tile: TileSize,
    visited: &mut HashSet<NodeId>,
) -> Vec<Placement>
where
    M: MapModel + ?Sized,
{
    let mut placements = Vec::new();
    let mut stack = vec![(start, origin)];

    while let Some((node, pos)) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        placements.push(Placement { node, pos });

        // Reverse so the first direction is popped first.
        for dir in Direction::ALL.into_iter().rev() {
            if let Some(next) = model.neighbour(node, dir)
                && !visited.contains(&next)
            {
                stack.push((next, neighbour_pos(pos, dir, tile)));
            }
        }
    }

    placements
}

/// Position for a node that is not placed yet, derived from any neighbour
/// that is. `placed` reports where a node currently sits.
///
/// Fails with [`MapError::UnplacedNode`] when none of the node's neighbours
/// has been placed.
pub fn anchor<M, F>(model: &M, node: NodeId, tile: TileSize, placed: F) -> Result<Point, MapError>
where
    M: MapModel + ?Sized,
    F: Fn(NodeId) -> Option<Point>,
{
    Direction::ALL
        .into_iter()
        .find_map(|dir| {
            let neighbour = model.neighbour(node, dir)?;
            let pos = placed(neighbour)?;
            // `neighbour` lies in `dir` from us, so we lie opposite from it.
            Some(neighbour_pos(pos, dir.opposite(), tile))
        })
        .ok_or(MapError::UnplacedNode(node))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::model::MemoryMap;

    const TILE: TileSize = TileSize::new(128, 128);

    fn ring() -> (MemoryMap, [NodeId; 3]) {
        let mut map = MemoryMap::new();
        let a = map.add_node("a", "plains").expect("a");
        let b = map.add_node("b", "plains").expect("b");
        let c = map.add_node("c", "plains").expect("c");
        map.link(a, Direction::East, b).expect("ab");
        map.link(b, Direction::SouthWest, c).expect("bc");
        map.link(c, Direction::NorthWest, a).expect("ca");
        (map, [a, b, c])
    }

    #[test]
    fn test_ring_terminates_with_each_node_once() {
        let (map, nodes) = ring();
        let mut visited = HashSet::new();
        let placed = walk(&map, nodes[0], Point::ZERO, TILE, &mut visited);

        assert_eq!(placed.len(), 3);
        let unique: HashSet<_> = placed.iter().map(|p| p.node).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_ring_positions_are_consistent() {
        let (map, [a, b, c]) = ring();
        let mut visited = HashSet::new();
        let placed: HashMap<_, _> = walk(&map, a, Point::ZERO, TILE, &mut visited)
            .into_iter()
            .map(|p| (p.node, p.pos))
            .collect();

        assert_eq!(placed[&a], Point::ZERO);
        assert_eq!(placed[&b], Point::new(128, 0));
        assert_eq!(placed[&c], Point::new(64, 96));
    }

    #[test]
    fn test_preorder_follows_direction_order() {
        let mut map = MemoryMap::new();
        let root = map.add_node("root", "plains").expect("root");
        let east = map.add_node("east", "plains").expect("east");
        let west = map.add_node("west", "plains").expect("west");
        let far = map.add_node("far", "plains").expect("far");
        map.link(root, Direction::East, east).expect("e");
        map.link(root, Direction::West, west).expect("w");
        map.link(west, Direction::West, far).expect("ww");

        let mut visited = HashSet::new();
        let order: Vec<_> = walk(&map, root, Point::ZERO, TILE, &mut visited)
            .into_iter()
            .map(|p| p.node)
            .collect();
        // West subtree is finished before East is entered.
        assert_eq!(order, vec![root, west, far, east]);
    }

    #[test]
    fn test_previsited_nodes_are_skipped() {
        let (map, [a, b, c]) = ring();
        let mut visited: HashSet<_> = [a, b].into_iter().collect();
        let placed = walk(&map, c, Point::new(64, 96), TILE, &mut visited);
        assert_eq!(placed, vec![Placement { node: c, pos: Point::new(64, 96) }]);
        assert!(visited.contains(&c));
    }

    #[test]
    fn test_isolated_node_places_only_itself() {
        let mut map = MemoryMap::new();
        let a = map.add_node("a", "plains").expect("a");
        let mut visited = HashSet::new();
        let placed = walk(&map, a, Point::new(5, 7), TILE, &mut visited);
        assert_eq!(placed, vec![Placement { node: a, pos: Point::new(5, 7) }]);
    }

    #[test]
    fn test_anchor_from_placed_neighbour() {
        let (map, [a, b, c]) = ring();
        let positions: HashMap<_, _> = [(a, Point::ZERO), (b, Point::new(128, 0))]
            .into_iter()
            .collect();
        let pos = anchor(&map, c, TILE, |n| positions.get(&n).copied()).expect("anchored");
        assert_eq!(pos, Point::new(64, 96));
    }

    #[test]
    fn test_anchor_without_placed_neighbour_fails() {
        let (map, [_, _, c]) = ring();
        let err = anchor(&map, c, TILE, |_| None);
        assert!(matches!(err, Err(MapError::UnplacedNode(n)) if n == c));
    }
}
