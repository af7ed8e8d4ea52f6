//! Loading of world surfaces (RON) and map data (KDL).
//!
//! Map file layout:
//!
//! ```kdl
//! node "ford" terrain="plains" {
//!     neighbour "East" "hill"
//! }
//! node "hill" terrain="hills"
//! settlement "ford" type="village" owner="red"
//! unit "hill" type="archer" owner="blue"
//! ```
//!
//! The first node is the layout root. Neighbour links are symmetric, so each
//! pair only needs to be written once.

use crate::error::MapError;
use crate::model::MemoryMap;
use crate::surface::WorldSurface;

fn read_file(path: &str) -> Result<String, MapError> {
    std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_string(),
        source,
    })
}

/// Parse a world surface from a RON file.
pub fn load_surface(path: &str) -> Result<WorldSurface, MapError> {
    let content = read_file(path)?;
    parse_surface(&content, path)
}

pub fn parse_surface(content: &str, path: &str) -> Result<WorldSurface, MapError> {
    ron::from_str::<WorldSurface>(content).map_err(|source| MapError::Ron {
        path: path.to_string(),
        source,
    })
}

/// Load a world surface, falling back to defaults when the file is missing or
/// malformed.
pub fn load_surface_or_default(path: &str) -> WorldSurface {
    match load_surface(path) {
        Ok(surface) => surface,
        Err(e) => {
            log::warn!("{e}, using default surface");
            WorldSurface::default()
        }
    }
}

/// Load map data from a KDL file.
pub fn load_map(path: &str) -> Result<MemoryMap, MapError> {
    let content = read_file(path)?;
    parse_map(&content, path)
}

fn invalid(path: &str, reason: String) -> MapError {
    MapError::InvalidMap {
        path: path.to_string(),
        reason,
    }
}

/// Helper to get a string property, e.g. `terrain="plains"`.
fn prop_str<'a>(node: &'a kdl::KdlNode, key: &str) -> Option<&'a str> {
    node.get(key)?.as_string()
}

/// Helper to get the string argument at `index`.
fn arg_str(node: &kdl::KdlNode, index: usize) -> Option<&str> {
    node.get(index)?.as_string()
}

pub fn parse_map(content: &str, path: &str) -> Result<MemoryMap, MapError> {
    let doc = content
        .parse::<kdl::KdlDocument>()
        .map_err(|source| MapError::Kdl {
            path: path.to_string(),
            source,
        })?;

    let mut map = MemoryMap::new();

    // First pass: nodes, so links can refer forward.
    for node in doc.nodes() {
        if node.name().value() != "node" {
            continue;
        }
        let name = arg_str(node, 0)
            .ok_or_else(|| invalid(path, "node without a name".to_string()))?;
        let terrain = prop_str(node, "terrain")
            .ok_or_else(|| invalid(path, format!("node {name:?} has no terrain")))?;
        map.add_node(name, terrain).map_err(|e| invalid(path, e.to_string()))?;
    }

    // Second pass: links, settlements, units.
    for node in doc.nodes() {
        match node.name().value() {
            "node" => {
                let Some(children) = node.children() else {
                    continue;
                };
                let Some(from) = arg_str(node, 0).and_then(|n| map.node_by_name(n)) else {
                    continue;
                };
                for child in children.nodes() {
                    if child.name().value() != "neighbour" {
                        log::warn!(
                            "{path}: ignoring unknown node child {:?}",
                            child.name().value()
                        );
                        continue;
                    }
                    let (Some(token), Some(target)) = (arg_str(child, 0), arg_str(child, 1)) else {
                        return Err(invalid(path, "neighbour needs a direction and a node".into()));
                    };
                    let to = map
                        .node_by_name(target)
                        .ok_or_else(|| MapError::UnknownNode(target.to_string()))?;
                    // An unknown direction token aborts the whole load.
                    if let Err(e) = map.link_by_token(from, token, to) {
                        log::error!("{path}: {e}");
                        return Err(e);
                    }
                }
            }
            "settlement" | "unit" => {
                let what = node.name().value();
                let on = arg_str(node, 0)
                    .ok_or_else(|| invalid(path, format!("{what} without a node")))?;
                let node_id = map
                    .node_by_name(on)
                    .ok_or_else(|| MapError::UnknownNode(on.to_string()))?;
                let kind = prop_str(node, "type")
                    .ok_or_else(|| invalid(path, format!("{what} on {on:?} has no type")))?;
                let owner = prop_str(node, "owner");
                if what == "settlement" {
                    map.add_settlement(node_id, kind, owner)?;
                } else {
                    map.add_unit(node_id, kind, owner)?;
                }
            }
            other => {
                log::warn!("{path}: ignoring unknown entry {other:?}");
            }
        }
    }

    log::info!("loaded map {path}: {} nodes", map.node_count());
    Ok(map)
}
