use std::fmt;
use std::str::FromStr;

use super::{ItemRef, ViewEvent};
use crate::error::MapError;
use crate::model::{MapRequest, SettlementId, UnitId};

/// What a click on the editor map does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Select,
    CreateNode,
    CreateSettlement,
    CreateUnit,
    EditNode,
    EditSettlement,
    EditUnit,
}

impl EditMode {
    pub const ALL: [EditMode; 7] = [
        EditMode::Select,
        EditMode::CreateNode,
        EditMode::CreateSettlement,
        EditMode::CreateUnit,
        EditMode::EditNode,
        EditMode::EditSettlement,
        EditMode::EditUnit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EditMode::Select => "Select",
            EditMode::CreateNode => "CreateNode",
            EditMode::CreateSettlement => "CreateSettlement",
            EditMode::CreateUnit => "CreateUnit",
            EditMode::EditNode => "EditNode",
            EditMode::EditSettlement => "EditSettlement",
            EditMode::EditUnit => "EditUnit",
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EditMode {
    type Err = MapError;

    /// Accepts `CreateNode`, `CreateNodeMode` and the `CreateMapNode` spelling
    /// used by older UI definitions.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_suffix("Mode").unwrap_or(s);
        let name = match name {
            "CreateMapNode" => "CreateNode",
            "EditMapNode" => "EditNode",
            other => other,
        };
        EditMode::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| MapError::UnknownEditMode(s.to_string()))
    }
}

/// Editor-only view state: the mode and the types new things are created
/// with.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub mode: EditMode,
    pub terrain: Option<String>,
    pub settlement_kind: Option<String>,
    pub unit_kind: Option<String>,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch mode by name. Unknown names are logged and leave the mode as
    /// it was.
    pub fn set_mode_by_name(&mut self, name: &str) -> Result<(), MapError> {
        match name.parse::<EditMode>() {
            Ok(mode) => {
                self.mode = mode;
                Ok(())
            }
            Err(e) => {
                log::error!("{e}");
                Err(e)
            }
        }
    }

    /// Decide what a click on `target` means in the current mode.
    /// `settlement`/`unit` are what the clicked node carries.
    pub fn on_click(
        &self,
        target: &ItemRef,
        settlement: Option<SettlementId>,
        unit: Option<UnitId>,
    ) -> Option<ViewEvent> {
        match (self.mode, target) {
            (EditMode::Select, ItemRef::Node(node)) => Some(ViewEvent::ItemsSelected {
                node: *node,
                settlement,
                unit,
            }),
            (EditMode::CreateNode, ItemRef::Phantom { neighbours }) => {
                let Some(terrain) = &self.terrain else {
                    log::warn!("no terrain type selected, node not created");
                    return None;
                };
                Some(ViewEvent::Request(MapRequest::CreateNode {
                    terrain: terrain.clone(),
                    neighbours: neighbours.clone(),
                }))
            }
            (EditMode::CreateSettlement, ItemRef::Node(node)) => {
                if settlement.is_some() {
                    log::warn!("{node} already has a settlement");
                    return None;
                }
                let Some(kind) = &self.settlement_kind else {
                    log::warn!("no settlement type selected");
                    return None;
                };
                Some(ViewEvent::Request(MapRequest::CreateSettlement {
                    kind: kind.clone(),
                    node: *node,
                }))
            }
            (EditMode::CreateUnit, ItemRef::Node(node)) => {
                if unit.is_some() {
                    log::warn!("{node} already has a unit");
                    return None;
                }
                let Some(kind) = &self.unit_kind else {
                    log::warn!("no unit type selected");
                    return None;
                };
                Some(ViewEvent::Request(MapRequest::CreateUnit {
                    kind: kind.clone(),
                    node: *node,
                }))
            }
            (EditMode::EditNode, ItemRef::Node(node)) => Some(ViewEvent::EditNode(*node)),
            (EditMode::EditSettlement, ItemRef::Node(_)) => {
                settlement.map(ViewEvent::EditSettlement)
            }
            (EditMode::EditUnit, ItemRef::Node(_)) => unit.map(ViewEvent::EditUnit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction;
    use crate::model::{NeighbourLinks, NodeId};

    fn editor(mode: EditMode) -> EditorState {
        EditorState {
            mode,
            terrain: Some("plains".into()),
            settlement_kind: Some("village".into()),
            unit_kind: Some("archer".into()),
        }
    }

    #[test]
    fn mode_names_parse_with_aliases() {
        for mode in EditMode::ALL {
            assert_eq!(mode.name().parse::<EditMode>().ok(), Some(mode));
        }
        for (name, mode) in [
            ("CreateNodeMode", EditMode::CreateNode),
            ("CreateMapNode", EditMode::CreateNode),
            ("EditMapNodeMode", EditMode::EditNode),
        ] {
            assert_eq!(name.parse::<EditMode>().ok(), Some(mode));
        }
    }

    #[test]
    fn unknown_mode_leaves_mode_unchanged() {
        let mut state = editor(EditMode::CreateUnit);
        let err = state.set_mode_by_name("Paint");
        assert!(matches!(err, Err(MapError::UnknownEditMode(ref m)) if m == "Paint"));
        assert_eq!(state.mode, EditMode::CreateUnit);
    }

    #[test]
    fn create_node_on_phantom_requests_node() {
        let neighbours: NeighbourLinks = [(Direction::East, NodeId(2))].into_iter().collect();
        let target = ItemRef::Phantom {
            neighbours: neighbours.clone(),
        };
        let event = editor(EditMode::CreateNode).on_click(&target, None, None);
        assert_eq!(
            event,
            Some(ViewEvent::Request(MapRequest::CreateNode {
                terrain: "plains".into(),
                neighbours,
            }))
        );
    }

    #[test]
    fn create_node_without_terrain_does_nothing() {
        let mut state = editor(EditMode::CreateNode);
        state.terrain = None;
        let target = ItemRef::Phantom {
            neighbours: NeighbourLinks::new(),
        };
        assert_eq!(state.on_click(&target, None, None), None);
    }

    #[test]
    fn create_node_on_real_node_does_nothing() {
        let event = editor(EditMode::CreateNode).on_click(&ItemRef::Node(NodeId(0)), None, None);
        assert_eq!(event, None);
    }

    #[test]
    fn create_settlement_refuses_occupied_node() {
        let state = editor(EditMode::CreateSettlement);
        let node = ItemRef::Node(NodeId(4));
        assert_eq!(
            state.on_click(&node, None, None),
            Some(ViewEvent::Request(MapRequest::CreateSettlement {
                kind: "village".into(),
                node: NodeId(4),
            }))
        );
        assert_eq!(state.on_click(&node, Some(SettlementId(0)), None), None);
    }

    #[test]
    fn create_unit_requests_unit() {
        let event = editor(EditMode::CreateUnit).on_click(&ItemRef::Node(NodeId(1)), None, None);
        assert_eq!(
            event,
            Some(ViewEvent::Request(MapRequest::CreateUnit {
                kind: "archer".into(),
                node: NodeId(1),
            }))
        );
    }

    #[test]
    fn edit_modes_report_content() {
        let node = ItemRef::Node(NodeId(3));
        assert_eq!(
            editor(EditMode::EditNode).on_click(&node, None, None),
            Some(ViewEvent::EditNode(NodeId(3)))
        );
        assert_eq!(
            editor(EditMode::EditSettlement).on_click(&node, Some(SettlementId(7)), None),
            Some(ViewEvent::EditSettlement(SettlementId(7)))
        );
        assert_eq!(editor(EditMode::EditUnit).on_click(&node, None, None), None);
    }

    #[test]
    fn select_reports_node_and_content() {
        let event = editor(EditMode::Select).on_click(
            &ItemRef::Node(NodeId(1)),
            Some(SettlementId(2)),
            Some(UnitId(3)),
        );
        assert_eq!(
            event,
            Some(ViewEvent::ItemsSelected {
                node: NodeId(1),
                settlement: Some(SettlementId(2)),
                unit: Some(UnitId(3)),
            })
        );
    }
}
