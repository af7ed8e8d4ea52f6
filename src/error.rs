use thiserror::Error;

use crate::model::NodeId;

/// Errors surfaced by fallible map-view operations.
///
/// Event handlers on `MapView` never return these; they log and carry on.
/// Loaders and the geometry helpers that take raw tokens do.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("unknown direction: {0}")]
    UnknownDirection(String),

    #[error("unknown edit mode: {0}")]
    UnknownEditMode(String),

    #[error("node {0} has no placed neighbour to anchor it")]
    UnplacedNode(NodeId),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("invalid map data in {path}: {reason}")]
    InvalidMap { path: String, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse RON {path}: {source}")]
    Ron {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("failed to parse KDL {path}: {source}")]
    Kdl {
        path: String,
        #[source]
        source: kdl::KdlError,
    },
}
