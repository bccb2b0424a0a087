//! Flood-fill decomposition of a polygon soup into connected cells.
//!
//! Polygons sharing a vertex belong to the same cell. Vertices are welded
//! with an epsilon-tolerant ordering, so nearly coincident corners coming
//! from independently triangulated meshes count as one point.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use nalgebra::Point3;

use crate::{
    BuildConfig, BuildError, CellId, ColoringConflictPolicy, ConvexPolygon, Diagnostics, Plane,
    PlaneSide, Result, Warning,
};

/// Outcome of a decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Number of cells created; ids are `0..cell_count`.
    pub cell_count: usize,
    /// Warnings raised while colouring.
    pub diagnostics: Diagnostics,
}

/// Colours a polygon soup into connected cells.
#[derive(Debug, Clone)]
pub struct Decomposer {
    epsilon: f32,
    policy: ColoringConflictPolicy,
}

/// Map key comparing positions axis by axis with a tolerance.
#[derive(Debug, Clone, Copy)]
struct VertexKey {
    position: Point3<f32>,
    epsilon: f32,
}

impl Ord for VertexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.position, other.position);
        for axis in 0..3 {
            if (a[axis] - b[axis]).abs() > self.epsilon {
                return a[axis].total_cmp(&b[axis]);
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for VertexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VertexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VertexKey {}

/// A welded position and the polygons touching it.
#[derive(Debug, Clone)]
struct VertexRecord {
    position: Point3<f32>,
    polygons: Vec<usize>,
    cell: Option<CellId>,
}

/// Transient adjacency built for one decomposition.
#[derive(Debug)]
struct VertexMap {
    /// Records in key order.
    records: Vec<VertexRecord>,
    /// Record indices of each polygon's corners, without repeats.
    polygon_vertices: Vec<Vec<usize>>,
}

impl VertexMap {
    fn build(polygons: &[ConvexPolygon], epsilon: f32) -> Self {
        let mut keys: BTreeMap<VertexKey, usize> = BTreeMap::new();
        let mut records: Vec<VertexRecord> = Vec::new();
        let mut polygon_vertices = Vec::with_capacity(polygons.len());

        for (p, polygon) in polygons.iter().enumerate() {
            let mut corners = Vec::with_capacity(polygon.len());
            for &position in polygon.vertices() {
                let key = VertexKey { position, epsilon };
                let index = *keys.entry(key).or_insert_with(|| {
                    records.push(VertexRecord {
                        position,
                        polygons: Vec::new(),
                        cell: None,
                    });
                    records.len() - 1
                });
                if !corners.contains(&index) {
                    corners.push(index);
                    records[index].polygons.push(p);
                }
            }
            polygon_vertices.push(corners);
        }

        // Renumber in key order so ids do not depend on input order
        let order: Vec<usize> = keys.into_values().collect();
        let mut renumber = vec![0; records.len()];
        for (new, &old) in order.iter().enumerate() {
            renumber[old] = new;
        }
        let mut slots: Vec<Option<VertexRecord>> = records.into_iter().map(Some).collect();
        let records = order
            .iter()
            .filter_map(|&old| slots[old].take())
            .collect();
        for corners in &mut polygon_vertices {
            for index in corners.iter_mut() {
                *index = renumber[*index];
            }
        }

        Self {
            records,
            polygon_vertices,
        }
    }
}

impl Decomposer {
    /// Creates a decomposer using the config's epsilon and conflict policy.
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            epsilon: config.epsilon,
            policy: config.coloring_policy,
        }
    }

    /// Colours `polygons` in place and returns the number of cells.
    ///
    /// Every cell id is reset first. Each uncoloured vertex starts a new
    /// cell, which then floods through every polygon touching it and every
    /// vertex of those polygons.
    pub fn decompose(&self, polygons: &mut [ConvexPolygon]) -> Result<Decomposition> {
        for polygon in polygons.iter_mut() {
            polygon.set_cell(None);
        }

        let mut map = VertexMap::build(polygons, self.epsilon);
        let mut diagnostics = Diagnostics::new();
        let mut next_cell = 0;

        for seed in 0..map.records.len() {
            if map.records[seed].cell.is_some() {
                continue;
            }
            let cell = next_cell;
            next_cell += 1;
            self.walk_vertex(&mut map, polygons, seed, cell, &mut diagnostics)?;
        }

        log::info!(
            "decomposed {} polygons ({} vertices) into {next_cell} cells",
            polygons.len(),
            map.records.len()
        );
        Ok(Decomposition {
            cell_count: next_cell,
            diagnostics,
        })
    }

    /// Colours a mixed occluder and portal soup in place.
    ///
    /// Portal polygons bound cells instead of joining them: two occluders
    /// sharing a vertex that lies on a portal are connected only when they
    /// are on the same side of that portal. Afterwards each portal polygon
    /// takes the cell of an occluder touching it from its front side, or
    /// stays unassigned with a [`Warning::DetachedPortal`].
    pub fn decompose_with_portals(&self, polygons: &mut [ConvexPolygon]) -> Result<Decomposition> {
        for polygon in polygons.iter_mut() {
            polygon.set_cell(None);
        }

        let map = VertexMap::build(polygons, self.epsilon);
        let portals: Vec<usize> = (0..polygons.len())
            .filter(|&p| polygons[p].is_portal())
            .collect();
        let portals_at: Vec<Vec<usize>> = map
            .records
            .iter()
            .map(|record| {
                portals
                    .iter()
                    .copied()
                    .filter(|&r| polygons[r].contains_point(record.position, self.epsilon))
                    .collect()
            })
            .collect();

        let mut diagnostics = Diagnostics::new();
        let mut next_cell = 0;

        for seed in 0..polygons.len() {
            if polygons[seed].is_portal() || polygons[seed].cell().is_some() {
                continue;
            }
            let cell = next_cell;
            next_cell += 1;
            polygons[seed].set_cell(Some(cell));

            let mut stack = vec![seed];
            while let Some(p) = stack.pop() {
                for &w in &map.polygon_vertices[p] {
                    for &q in &map.records[w].polygons {
                        if q == p || polygons[q].is_portal() {
                            continue;
                        }
                        let crosses = portals_at[w].iter().any(|&r| {
                            !same_side(&polygons[p], &polygons[q], &polygons[r], self.epsilon)
                        });
                        if crosses {
                            continue;
                        }
                        if self.assign(polygons, q, cell, &mut diagnostics)? {
                            stack.push(q);
                        }
                    }
                }
            }
        }

        for &r in &portals {
            let plane = *polygons[r].plane();
            let facing = map.polygon_vertices[r]
                .iter()
                .flat_map(|&w| map.records[w].polygons.iter().copied())
                .filter(|&q| !polygons[q].is_portal())
                .find(|&q| side_of(&polygons[q], &plane, self.epsilon) == PlaneSide::Front)
                .and_then(|q| polygons[q].cell());

            match facing {
                Some(cell) => polygons[r].set_cell(Some(cell)),
                None => diagnostics.push(Warning::DetachedPortal {
                    polygon: r,
                    portal: polygons[r].portal().unwrap_or_default(),
                }),
            }
        }

        log::info!(
            "decomposed {} polygons ({} portal) into {next_cell} cells",
            polygons.len(),
            portals.len()
        );
        Ok(Decomposition {
            cell_count: next_cell,
            diagnostics,
        })
    }

    /// Floods `cell` outwards from vertex `seed`.
    fn walk_vertex(
        &self,
        map: &mut VertexMap,
        polygons: &mut [ConvexPolygon],
        seed: usize,
        cell: CellId,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        map.records[seed].cell = Some(cell);
        let mut stack = vec![seed];

        while let Some(vertex) = stack.pop() {
            for i in 0..map.records[vertex].polygons.len() {
                let p = map.records[vertex].polygons[i];
                self.assign(polygons, p, cell, diagnostics)?;

                for &next in &map.polygon_vertices[p] {
                    if map.records[next].cell.is_none() {
                        map.records[next].cell = Some(cell);
                        stack.push(next);
                    }
                }
            }
        }
        Ok(())
    }

    /// Gives polygon `p` the cell `cell` if it has none.
    ///
    /// Returns whether the polygon was newly coloured. A polygon already in
    /// another cell keeps it; the conflict is reported per the policy.
    fn assign(
        &self,
        polygons: &mut [ConvexPolygon],
        p: usize,
        cell: CellId,
        diagnostics: &mut Diagnostics,
    ) -> Result<bool> {
        match polygons[p].cell() {
            None => {
                polygons[p].set_cell(Some(cell));
                Ok(true)
            }
            Some(existing) if existing == cell => Ok(false),
            Some(existing) => match self.policy {
                ColoringConflictPolicy::Permissive => {
                    diagnostics.push(Warning::InconsistentColoring {
                        polygon: p,
                        existing,
                        attempted: cell,
                    });
                    Ok(false)
                }
                ColoringConflictPolicy::Strict => Err(BuildError::InconsistentColoring {
                    polygon: p,
                    existing,
                    attempted: cell,
                }),
            },
        }
    }
}

/// Side of `plane` a polygon lies on, judged by its farthest vertex.
/// A polygon within `epsilon` of the plane everywhere is `OnPlane`.
fn side_of(polygon: &ConvexPolygon, plane: &Plane, epsilon: f32) -> PlaneSide {
    let farthest = polygon
        .vertices()
        .iter()
        .map(|v| plane.signed_distance(*v))
        .fold(0.0f32, |best, d| if d.abs() > best.abs() { d } else { best });

    if farthest > epsilon {
        PlaneSide::Front
    } else if farthest < -epsilon {
        PlaneSide::Back
    } else {
        PlaneSide::OnPlane
    }
}

/// Whether `a` and `b` are not separated by `portal`'s plane.
fn same_side(a: &ConvexPolygon, b: &ConvexPolygon, portal: &ConvexPolygon, epsilon: f32) -> bool {
    match (side_of(a, portal.plane(), epsilon), side_of(b, portal.plane(), epsilon)) {
        (PlaneSide::OnPlane, _) | (_, PlaneSide::OnPlane) => true,
        (sa, sb) => sa == sb,
    }
}
