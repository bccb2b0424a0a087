//! End-to-end level build: occluder and portal polygons in, a located and
//! connected cell structure out.

use nalgebra::Point3;

use crate::{
    BspTree, BuildConfig, CellGraph, CellId, ConvexPolygon, Decomposer, Diagnostics, Location,
    PortalId, Result,
};

/// Runs the full build pipeline with one configuration.
#[derive(Debug, Clone, Default)]
pub struct LevelBuilder {
    config: BuildConfig,
}

/// A built level: final tree, connectivity and the coloured polygons.
#[derive(Debug, Clone)]
pub struct PortalLevel {
    tree: BspTree,
    graph: CellGraph,
    polygons: Vec<ConvexPolygon>,
    diagnostics: Diagnostics,
}

impl LevelBuilder {
    /// Creates a builder using `config` for every stage.
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Builds a level from occluder and portal polygons.
    ///
    /// 1. A tree is built over each input set.
    /// 2. Portals are clipped against the occluder tree, which drops the
    ///    parts lying in solid space. Occluders are split along the portal
    ///    tree's planes.
    /// 3. The merged soup is coloured into cells, with portals as cell
    ///    boundaries.
    /// 4. Connectivity is extracted and a final tree is built over the
    ///    coloured soup for point location.
    ///
    /// Portal polygons must carry a portal id. Fails if a portal separates
    /// more than two cells, or on a colouring conflict under the strict
    /// policy.
    pub fn build(
        &self,
        occluders: Vec<ConvexPolygon>,
        portals: Vec<ConvexPolygon>,
    ) -> Result<PortalLevel> {
        let mut diagnostics = Diagnostics::new();
        let portal_count = portals
            .iter()
            .filter_map(ConvexPolygon::portal)
            .max()
            .map_or(0, |max| max + 1);

        log::info!(
            "building level from {} occluder and {} portal polygons",
            occluders.len(),
            portals.len()
        );

        let occluder_tree = BspTree::build(occluders.clone(), &self.config, &mut diagnostics);
        let portal_tree = BspTree::build(portals.clone(), &self.config, &mut diagnostics);
        log::debug!(
            "occluder tree: {} nodes, portal tree: {} nodes",
            occluder_tree.node_count(),
            portal_tree.node_count()
        );

        let clipped_portals = occluder_tree.clip_polygons(portals, &mut diagnostics);
        let mut polygons = portal_tree.split_polygons(occluders, &mut diagnostics);
        polygons.extend(clipped_portals);

        let decomposition =
            Decomposer::new(&self.config).decompose_with_portals(&mut polygons)?;
        diagnostics.append(decomposition.diagnostics);

        let graph = CellGraph::extract(
            &polygons,
            decomposition.cell_count,
            portal_count,
            &mut diagnostics,
        )?;
        let tree = BspTree::build(polygons.clone(), &self.config, &mut diagnostics);

        log::info!(
            "level built: {} cells, {} portals, {} tree nodes, {} warnings",
            graph.cell_count(),
            graph.portal_count(),
            tree.node_count(),
            diagnostics.len()
        );

        Ok(PortalLevel {
            tree,
            graph,
            polygons,
            diagnostics,
        })
    }
}

impl PortalLevel {
    /// Final tree over the coloured soup.
    pub fn tree(&self) -> &BspTree {
        &self.tree
    }

    /// Cell and portal adjacency.
    pub fn graph(&self) -> &CellGraph {
        &self.graph
    }

    /// Every polygon of the level after clipping and colouring.
    pub fn polygons(&self) -> &[ConvexPolygon] {
        &self.polygons
    }

    /// Warnings collected across all stages.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Number of cells found.
    pub fn cell_count(&self) -> usize {
        self.graph.cell_count()
    }

    /// Polygons bounding `cell`, portal faces included.
    pub fn cell_polygons(&self, cell: CellId) -> impl Iterator<Item = &ConvexPolygon> {
        self.polygons.iter().filter(move |p| p.cell() == Some(cell))
    }

    /// Fragments of `portal`, both windings.
    pub fn portal_polygons(&self, portal: PortalId) -> impl Iterator<Item = &ConvexPolygon> {
        self.polygons.iter().filter(move |p| p.portal() == Some(portal))
    }

    /// Which cell contains `point`.
    pub fn locate(&self, point: Point3<f32>) -> Location {
        self.tree.point_cell(point)
    }
}
