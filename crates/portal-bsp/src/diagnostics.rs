//! Non-fatal build diagnostics.
//!
//! A build never stops for bad geometry short of a portal touching three
//! cells. Everything else is logged and recorded here so callers can decide
//! whether the result is usable.

use std::fmt;

use nalgebra::Point3;

use crate::{CellId, PortalId};

/// A recoverable problem found while building.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A polygon (or split fragment) with near-zero area was dropped.
    DegenerateFragment {
        /// Area of the dropped polygon.
        area: f32,
        /// Centroid of the dropped polygon.
        centroid: Point3<f32>,
    },
    /// A polygon was reached from two flood-fill origins. The first id was kept.
    InconsistentColoring {
        /// Index of the polygon in the decomposed soup.
        polygon: usize,
        /// Cell assigned first and kept.
        existing: CellId,
        /// Cell of the later origin.
        attempted: CellId,
    },
    /// No occluder cell could be attributed to a portal polygon.
    DetachedPortal {
        /// Index of the polygon in the decomposed soup.
        polygon: usize,
        /// Portal the polygon belongs to.
        portal: PortalId,
    },
    /// A portal polygon reached connectivity extraction without a cell and was skipped.
    UncoloredPortal {
        /// Portal the polygon belongs to.
        portal: PortalId,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DegenerateFragment { area, centroid } => {
                write!(f, "dropped degenerate polygon (area {area}) at {centroid}")
            }
            Warning::InconsistentColoring {
                polygon,
                existing,
                attempted,
            } => write!(
                f,
                "polygon {polygon} is in cell {existing} but was reached from cell {attempted}, \
                 something is wrong with the mesh"
            ),
            Warning::DetachedPortal { polygon, portal } => {
                write!(f, "portal {portal} polygon {polygon} touches no occluder cell")
            }
            Warning::UncoloredPortal { portal } => {
                write!(f, "portal {portal} polygon has no cell, skipped")
            }
        }
    }
}

/// Collected warnings of one build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs and records a warning.
    pub fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// All recorded warnings, in order.
    #[inline]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of recorded warnings.
    #[inline]
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Whether the build was clean.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Number of inconsistent colouring warnings, the ones that silently
    /// change visibility results.
    pub fn coloring_conflicts(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, Warning::InconsistentColoring { .. }))
            .count()
    }

    /// Moves every warning of `other` into this collector without logging again.
    pub fn append(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }
}
