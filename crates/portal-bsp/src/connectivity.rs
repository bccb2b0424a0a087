//! Cell and portal adjacency extracted from a coloured polygon soup.

use serde::{Deserialize, Serialize};

use crate::{BuildError, CellId, ConvexPolygon, Diagnostics, PortalId, Result, Warning};

/// A portal and the cells on either side of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    cells: [Option<CellId>; 2],
}

impl Portal {
    /// The two cell slots; `None` means open to the outside.
    pub fn cells(&self) -> [Option<CellId>; 2] {
        self.cells
    }

    /// Given one side, the cell on the other side.
    pub fn other_side(&self, cell: CellId) -> Option<CellId> {
        match self.cells {
            [Some(a), b] if a == cell => b,
            [a, Some(b)] if b == cell => a,
            _ => None,
        }
    }

    /// Whether the portal leads into `cell`.
    pub fn connects(&self, cell: CellId) -> bool {
        self.cells.contains(&Some(cell))
    }

    /// Records that a polygon of this portal lies in `cell`.
    fn attach(&mut self, portal: PortalId, cell: CellId) -> Result<()> {
        match self.cells {
            [None, _] => self.cells[0] = Some(cell),
            [Some(first), _] if first == cell => {}
            [Some(_), None] => self.cells[1] = Some(cell),
            [Some(_), Some(second)] if second == cell => {}
            [Some(first), Some(second)] => {
                return Err(BuildError::PortalTopology {
                    portal,
                    cells: [first, second, cell],
                });
            }
        }
        Ok(())
    }
}

/// A cell and the portals bounding it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    portals: Vec<PortalId>,
}

impl Cell {
    /// Bounding portals in discovery order, without repeats.
    pub fn portals(&self) -> &[PortalId] {
        &self.portals
    }
}

/// The cell/portal adjacency graph of a level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellGraph {
    cells: Vec<Cell>,
    portals: Vec<Portal>,
}

impl CellGraph {
    /// Builds the graph from coloured, portal-tagged polygons.
    ///
    /// Only portal polygons contribute. A portal polygon without a cell is
    /// skipped with a [`Warning::UncoloredPortal`]. A portal found in a
    /// third distinct cell aborts with [`BuildError::PortalTopology`].
    ///
    /// # Example
    ///
    /// ```
    /// use nalgebra::Point3;
    /// use portal_bsp::{CellGraph, ConvexPolygon, Diagnostics};
    ///
    /// let door = ConvexPolygon::from_vertices(vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    ///     Point3::new(0.0, 1.0, 1.0),
    /// ])
    /// .unwrap()
    /// .with_portal(0);
    /// let polygons = vec![door.clone().with_cell(0), door.flipped().with_cell(1)];
    ///
    /// let graph = CellGraph::extract(&polygons, 2, 1, &mut Diagnostics::new()).unwrap();
    /// assert_eq!(graph.portal(0).unwrap().cells(), [Some(0), Some(1)]);
    /// assert_eq!(graph.neighbours(0), vec![1]);
    /// ```
    pub fn extract(
        polygons: &[ConvexPolygon],
        cell_count: usize,
        portal_count: usize,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        let mut graph = Self {
            cells: vec![Cell::default(); cell_count],
            portals: vec![Portal::default(); portal_count],
        };

        for polygon in polygons {
            let Some(portal) = polygon.portal() else {
                continue;
            };
            let Some(cell) = polygon.cell() else {
                diagnostics.push(Warning::UncoloredPortal { portal });
                continue;
            };

            let record = graph
                .portals
                .get_mut(portal)
                .ok_or(BuildError::PortalOutOfRange {
                    portal,
                    count: portal_count,
                })?;
            let bounds = graph.cells.get_mut(cell).ok_or(BuildError::CellOutOfRange {
                cell,
                count: cell_count,
            })?;

            record.attach(portal, cell)?;
            if !bounds.portals.contains(&portal) {
                bounds.portals.push(portal);
            }
        }

        log::info!("extracted connectivity: {cell_count} cells, {portal_count} portals");
        Ok(graph)
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of portals.
    pub fn portal_count(&self) -> usize {
        self.portals.len()
    }

    /// The cell record for `id`.
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// The portal record for `id`.
    pub fn portal(&self, id: PortalId) -> Option<&Portal> {
        self.portals.get(id)
    }

    /// All cells, indexed by id.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// All portals, indexed by id.
    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    /// Cells reachable from `cell` through one portal, in portal order.
    pub fn neighbours(&self, cell: CellId) -> Vec<CellId> {
        let Some(record) = self.cells.get(cell) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for &portal in &record.portals {
            if let Some(other) = self.portals.get(portal).and_then(|p| p.other_side(cell))
                && !out.contains(&other)
            {
                out.push(other);
            }
        }
        out
    }
}
