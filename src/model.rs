//! Host map-data model as seen by the view.
//!
//! The view never owns map data. It reads nodes, settlements and units
//! through [`MapModel`] and asks for changes with [`MapRequest`]s, which the
//! host applies and later reports back through the `on_*_added`
//! notifications. [`MemoryMap`] is a plain in-memory model used by the demo
//! binary and the tests.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::MapError;
use crate::geometry::{Direction, parse_direction};

/// Stable identity of a host map node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SettlementId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Neighbour links keyed by direction, at most one per slot.
pub type NeighbourLinks = SmallVec<[(Direction, NodeId); 6]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub id: SettlementId,
    pub node: NodeId,
    pub kind: String,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: UnitId,
    pub node: NodeId,
    pub kind: String,
    pub owner: Option<String>,
}

/// Read-only query interface onto the host's map data.
pub trait MapModel {
    /// Node the layout starts from. `None` for an empty map.
    fn root(&self) -> Option<NodeId>;

    fn terrain(&self, node: NodeId) -> Option<&str>;

    fn neighbour(&self, node: NodeId, dir: Direction) -> Option<NodeId>;

    fn settlement_ids(&self) -> Vec<SettlementId>;

    fn settlement(&self, id: SettlementId) -> Option<SettlementRecord>;

    fn unit_ids(&self) -> Vec<UnitId>;

    fn unit(&self, id: UnitId) -> Option<UnitRecord>;

    /// All present neighbour links of `node`, in `Direction::ALL` order.
    fn neighbours(&self, node: NodeId) -> NeighbourLinks {
        Direction::ALL
            .into_iter()
            .filter_map(|d| self.neighbour(node, d).map(|n| (d, n)))
            .collect()
    }
}

/// Fire-and-forget mutation requests issued by the editor view.
#[derive(Debug, Clone, PartialEq)]
pub enum MapRequest {
    /// New node with `terrain`; each link says "this existing node lies in
    /// this direction from the new one".
    CreateNode {
        terrain: String,
        neighbours: NeighbourLinks,
    },
    CreateSettlement {
        kind: String,
        node: NodeId,
    },
    CreateUnit {
        kind: String,
        node: NodeId,
    },
}

/// What a [`MapRequest`] produced, so the host can forward the matching
/// notification to its views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Node(NodeId),
    Settlement(SettlementId),
    Unit(UnitId),
}

// ---------------------------------------------------------------------------
// In-memory model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    terrain: String,
    neighbours: [Option<NodeId>; 6],
}

#[derive(Debug, Default)]
pub struct MemoryMap {
    nodes: Vec<NodeData>,
    names: HashMap<String, NodeId>,
    settlements: Vec<Option<SettlementRecord>>,
    units: Vec<Option<UnitRecord>>,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add an unlinked node. Names must be unique.
    pub fn add_node(&mut self, name: &str, terrain: &str) -> Result<NodeId, MapError> {
        if self.names.contains_key(name) {
            return Err(MapError::InvalidMap {
                path: "<memory>".to_string(),
                reason: format!("duplicate node name {name:?}"),
            });
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            name: name.to_string(),
            terrain: terrain.to_string(),
            neighbours: [None; 6],
        });
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.0 as usize).map(|n| n.name.as_str())
    }

    /// Link `b` as `a`'s neighbour in `dir` (and `a` as `b`'s in the
    /// opposite direction). Former occupants of either slot are unlinked.
    pub fn link(&mut self, a: NodeId, dir: Direction, b: NodeId) -> Result<(), MapError> {
        for id in [a, b] {
            if self.nodes.get(id.0 as usize).is_none() {
                return Err(MapError::UnknownNode(id.to_string()));
            }
        }
        self.set_slot(a, dir, b);
        self.set_slot(b, dir.opposite(), a);
        Ok(())
    }

    /// Like [`MemoryMap::link`] with the direction given by name.
    pub fn link_by_token(&mut self, a: NodeId, token: &str, b: NodeId) -> Result<(), MapError> {
        let dir = parse_direction(token)?;
        self.link(a, dir, b)
    }

    fn set_slot(&mut self, node: NodeId, dir: Direction, neighbour: NodeId) {
        let former = self.nodes[node.0 as usize].neighbours[dir.index()];
        if let Some(former) = former
            && former != neighbour
        {
            self.nodes[former.0 as usize].neighbours[dir.opposite().index()] = None;
        }
        self.nodes[node.0 as usize].neighbours[dir.index()] = Some(neighbour);
    }

    pub fn add_settlement(
        &mut self,
        node: NodeId,
        kind: &str,
        owner: Option<&str>,
    ) -> Result<SettlementId, MapError> {
        if self.nodes.get(node.0 as usize).is_none() {
            return Err(MapError::UnknownNode(node.to_string()));
        }
        let id = SettlementId(self.settlements.len() as u32);
        self.settlements.push(Some(SettlementRecord {
            id,
            node,
            kind: kind.to_string(),
            owner: owner.map(str::to_string),
        }));
        Ok(id)
    }

    pub fn add_unit(
        &mut self,
        node: NodeId,
        kind: &str,
        owner: Option<&str>,
    ) -> Result<UnitId, MapError> {
        if self.nodes.get(node.0 as usize).is_none() {
            return Err(MapError::UnknownNode(node.to_string()));
        }
        let id = UnitId(self.units.len() as u32);
        self.units.push(Some(UnitRecord {
            id,
            node,
            kind: kind.to_string(),
            owner: owner.map(str::to_string),
        }));
        Ok(id)
    }

    pub fn remove_settlement(&mut self, id: SettlementId) -> Option<SettlementRecord> {
        self.settlements.get_mut(id.0 as usize)?.take()
    }

    pub fn remove_unit(&mut self, id: UnitId) -> Option<UnitRecord> {
        self.units.get_mut(id.0 as usize)?.take()
    }

    /// Apply an editor request, the way a host would before notifying its
    /// views.
    pub fn apply(&mut self, request: &MapRequest) -> Result<Applied, MapError> {
        match request {
            MapRequest::CreateNode {
                terrain,
                neighbours,
            } => {
                let mut n = self.nodes.len();
                let mut name = format!("node{n}");
                while self.names.contains_key(&name) {
                    n += 1;
                    name = format!("node{n}");
                }
                let id = self.add_node(&name, terrain)?;
                for &(dir, neighbour) in neighbours {
                    self.link(id, dir, neighbour)?;
                }
                Ok(Applied::Node(id))
            }
            MapRequest::CreateSettlement { kind, node } => {
                let owner = self.owner_on(*node);
                self.add_settlement(*node, kind, owner.as_deref())
                    .map(Applied::Settlement)
            }
            MapRequest::CreateUnit { kind, node } => {
                let owner = self.owner_on(*node);
                self.add_unit(*node, kind, owner.as_deref()).map(Applied::Unit)
            }
        }
    }

    /// Owner of the settlement on `node`, inherited by things created there.
    fn owner_on(&self, node: NodeId) -> Option<String> {
        self.settlements
            .iter()
            .flatten()
            .find(|s| s.node == node)
            .and_then(|s| s.owner.clone())
    }
}

impl MapModel for MemoryMap {
    fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(0))
        }
    }

    fn terrain(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0 as usize).map(|n| n.terrain.as_str())
    }

    fn neighbour(&self, node: NodeId, dir: Direction) -> Option<NodeId> {
        self.nodes.get(node.0 as usize)?.neighbours[dir.index()]
    }

    fn settlement_ids(&self) -> Vec<SettlementId> {
        self.settlements.iter().flatten().map(|s| s.id).collect()
    }

    fn settlement(&self, id: SettlementId) -> Option<SettlementRecord> {
        self.settlements.get(id.0 as usize)?.clone()
    }

    fn unit_ids(&self) -> Vec<UnitId> {
        self.units.iter().flatten().map(|u| u.id).collect()
    }

    fn unit(&self, id: UnitId) -> Option<UnitRecord> {
        self.units.get(id.0 as usize)?.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_is_symmetric() {
        let mut map = MemoryMap::new();
        let a = map.add_node("a", "plains").expect("a");
        let b = map.add_node("b", "forest").expect("b");
        map.link(a, Direction::East, b).expect("link");

        assert_eq!(map.neighbour(a, Direction::East), Some(b));
        assert_eq!(map.neighbour(b, Direction::West), Some(a));
        assert_eq!(map.neighbours(a).len(), 1);
    }

    #[test]
    fn relinking_a_slot_unlinks_former_neighbour() {
        let mut map = MemoryMap::new();
        let a = map.add_node("a", "plains").expect("a");
        let b = map.add_node("b", "plains").expect("b");
        let c = map.add_node("c", "plains").expect("c");
        map.link(a, Direction::East, b).expect("link ab");
        map.link(a, Direction::East, c).expect("link ac");

        assert_eq!(map.neighbour(a, Direction::East), Some(c));
        assert_eq!(map.neighbour(b, Direction::West), None);
        assert_eq!(map.neighbour(c, Direction::West), Some(a));
    }

    #[test]
    fn link_by_bad_token_fails() {
        let mut map = MemoryMap::new();
        let a = map.add_node("a", "plains").expect("a");
        let b = map.add_node("b", "plains").expect("b");
        let err = map.link_by_token(a, "Up", b);
        assert!(matches!(err, Err(MapError::UnknownDirection(_))));
        assert!(map.neighbours(a).is_empty());
    }

    #[test]
    fn duplicate_node_name_rejected() {
        let mut map = MemoryMap::new();
        map.add_node("a", "plains").expect("a");
        assert!(map.add_node("a", "hills").is_err());
    }

    #[test]
    fn apply_create_node_links_neighbours() {
        let mut map = MemoryMap::new();
        let a = map.add_node("a", "plains").expect("a");
        let request = MapRequest::CreateNode {
            terrain: "hills".to_string(),
            neighbours: [(Direction::West, a)].into_iter().collect(),
        };
        let Ok(Applied::Node(new)) = map.apply(&request) else {
            panic!("expected a node");
        };
        assert_eq!(map.terrain(new), Some("hills"));
        assert_eq!(map.neighbour(new, Direction::West), Some(a));
        assert_eq!(map.neighbour(a, Direction::East), Some(new));
    }

    #[test]
    fn apply_create_unit_inherits_settlement_owner() {
        let mut map = MemoryMap::new();
        let a = map.add_node("a", "plains").expect("a");
        map.add_settlement(a, "town", Some("red")).expect("town");
        let applied = map
            .apply(&MapRequest::CreateUnit {
                kind: "archer".to_string(),
                node: a,
            })
            .expect("unit");
        let Applied::Unit(id) = applied else {
            panic!("expected a unit");
        };
        assert_eq!(map.unit(id).and_then(|u| u.owner), Some("red".to_string()));
    }

    #[test]
    fn removed_records_disappear_from_listing() {
        let mut map = MemoryMap::new();
        let a = map.add_node("a", "plains").expect("a");
        let s = map.add_settlement(a, "town", None).expect("town");
        assert_eq!(map.settlement_ids(), vec![s]);
        assert!(map.remove_settlement(s).is_some());
        assert!(map.settlement_ids().is_empty());
        assert!(map.settlement(s).is_none());
    }

    #[test]
    fn empty_map_has_no_root() {
        assert_eq!(MemoryMap::new().root(), None);
    }
}
