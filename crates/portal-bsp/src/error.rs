//! Fatal build errors.

use crate::{CellId, PortalId};

/// Errors that abort a build.
///
/// Recoverable geometry problems are not errors; they are collected as
/// [`Warning`](crate::Warning)s in [`Diagnostics`](crate::Diagnostics).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A portal touches more than two distinct cells.
    #[error("portal {portal} touches more than two cells ({cells:?})")]
    PortalTopology {
        /// The offending portal.
        portal: PortalId,
        /// The two cells already recorded followed by the third one found.
        cells: [CellId; 3],
    },

    /// A polygon was reached from two flood-fill origins under the strict policy.
    #[error(
        "polygon {polygon} already belongs to cell {existing}, reached again from cell {attempted}"
    )]
    InconsistentColoring {
        /// Index of the polygon in the decomposed soup.
        polygon: usize,
        /// Cell assigned first.
        existing: CellId,
        /// Cell of the second flood-fill origin.
        attempted: CellId,
    },

    /// A polygon names a portal beyond the declared portal count.
    #[error("portal id {portal} is out of range (portal count {count})")]
    PortalOutOfRange {
        /// The out-of-range id.
        portal: PortalId,
        /// Declared portal count.
        count: usize,
    },

    /// A polygon names a cell beyond the declared cell count.
    #[error("cell id {cell} is out of range (cell count {count})")]
    CellOutOfRange {
        /// The out-of-range id.
        cell: CellId,
        /// Declared cell count.
        count: usize,
    },

    /// A configuration or serialized tree could not be parsed.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for fallible build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
