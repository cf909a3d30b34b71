//! Error types for map editing and triangulation.

use hexx::{EdgeDirection, Hex};
use thiserror::Error;

/// Failures surfaced by the map core.
///
/// Illegal edits (a river across a cliff, a road off the map edge) are not
/// errors: the mutators report them as `false`. These variants cover lookups
/// of cells that do not exist and invariant breaches found while dispatching
/// geometry, which abort the triangulation pass.
#[derive(Debug, Error)]
pub enum MapError {
    /// The coordinate is not part of the map.
    #[error("no cell at ({}, {})", .0.x, .0.y)]
    UnknownCell(Hex),
    /// No edge routine matches the state of an edge.
    #[error("no edge case for cell ({}, {}) direction {direction:?}: {case}", .cell.x, .cell.y)]
    UnmatchedEdge {
        /// Cell owning the edge.
        cell: Hex,
        /// Direction of the edge from `cell`.
        direction: EdgeDirection,
        /// Description of the offending state.
        case: String,
    },
    /// No corner routine matches the state of a corner.
    #[error("no corner case for cell ({}, {}) direction {direction:?}: {case}", .cell.x, .cell.y)]
    UnmatchedCorner {
        /// Cell owning the corner.
        cell: Hex,
        /// First of the two directions spanning the corner.
        direction: EdgeDirection,
        /// Description of the offending state.
        case: String,
    },
}

/// Result type alias for map operations.
pub type Result<T> = std::result::Result<T, MapError>;
