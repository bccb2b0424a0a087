//! Conversion of scene meshes into tagged convex polygons.
//!
//! Meshes reach the builder as indexed triangle lists. Each one is either an
//! occluder (solid geometry bounding a cell) or a portal. Portals are emitted
//! two-sided so that each face can be attributed to the cell it looks into.

use nalgebra::Point3;

use crate::{CellId, ConvexPolygon, Diagnostics, PortalId, Warning};

/// What a mesh represents in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshRole {
    /// Solid geometry, optionally with a provisional cell id.
    Occluder {
        /// Provisional cell, if known.
        cell: Option<CellId>,
    },
    /// A portal surface.
    Portal {
        /// Portal id shared by every polygon of the mesh.
        portal: PortalId,
    },
}

/// An indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    positions: Vec<Point3<f32>>,
    triangles: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Creates a mesh from vertex positions and triangle indices.
    pub fn new(positions: Vec<Point3<f32>>, triangles: Vec<[usize; 3]>) -> Self {
        Self {
            positions,
            triangles,
        }
    }

    /// Builds a mesh from planar quads, each split along its `0-2` diagonal.
    pub fn from_quads(quads: &[[Point3<f32>; 4]]) -> Self {
        let mut positions = Vec::with_capacity(quads.len() * 4);
        let mut triangles = Vec::with_capacity(quads.len() * 2);
        for quad in quads {
            let base = positions.len();
            positions.extend_from_slice(quad);
            triangles.push([base, base + 1, base + 2]);
            triangles.push([base, base + 2, base + 3]);
        }
        Self::new(positions, triangles)
    }

    /// Triangle count.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Converts every triangle into a tagged convex polygon.
    ///
    /// Triangles with out-of-range indices are skipped. Triangles whose area
    /// is at most `epsilon` are skipped and reported as degenerate.
    pub fn to_polygons(
        &self,
        role: MeshRole,
        epsilon: f32,
        diagnostics: &mut Diagnostics,
    ) -> Vec<ConvexPolygon> {
        let mut polygons = Vec::with_capacity(self.triangles.len());

        for (index, triangle) in self.triangles.iter().enumerate() {
            let corners: Option<Vec<Point3<f32>>> = triangle
                .iter()
                .map(|&i| self.positions.get(i).copied())
                .collect();
            let Some(corners) = corners else {
                log::warn!("triangle {index} references a missing vertex, skipped");
                continue;
            };

            let centroid =
                Point3::from((corners[0].coords + corners[1].coords + corners[2].coords) / 3.0);
            let polygon = match ConvexPolygon::from_vertices(corners) {
                Some(polygon) if polygon.area() > epsilon => polygon,
                other => {
                    diagnostics.push(Warning::DegenerateFragment {
                        area: other.map_or(0.0, |p| p.area()),
                        centroid,
                    });
                    continue;
                }
            };

            match role {
                MeshRole::Occluder { cell } => {
                    polygons.push(match cell {
                        Some(cell) => polygon.with_cell(cell),
                        None => polygon,
                    });
                }
                MeshRole::Portal { portal } => {
                    let polygon = polygon.with_portal(portal);
                    polygons.push(polygon.flipped());
                    polygons.push(polygon);
                }
            }
        }

        polygons
    }
}

/// Which way the faces of [`box_quads`] point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Towards the box centre, as the walls of a room.
    Inward,
    /// Away from the box centre, as a solid block.
    Outward,
}

/// The six faces of an axis-aligned box as quads wound for `facing`.
pub fn box_quads(min: Point3<f32>, max: Point3<f32>, facing: Facing) -> Vec<[Point3<f32>; 4]> {
    let p = |x: f32, y: f32, z: f32| Point3::new(x, y, z);
    // Each face wound counter-clockwise seen from outside the box
    let (x0, y0, z0) = (min.x, min.y, min.z);
    let (x1, y1, z1) = (max.x, max.y, max.z);
    let outward = [
        [p(x0, y0, z0), p(x0, y0, z1), p(x0, y1, z1), p(x0, y1, z0)],
        [p(x1, y0, z0), p(x1, y1, z0), p(x1, y1, z1), p(x1, y0, z1)],
        [p(x0, y0, z0), p(x1, y0, z0), p(x1, y0, z1), p(x0, y0, z1)],
        [p(x0, y1, z0), p(x0, y1, z1), p(x1, y1, z1), p(x1, y1, z0)],
        [p(x0, y0, z0), p(x0, y1, z0), p(x1, y1, z0), p(x1, y0, z0)],
        [p(x0, y0, z1), p(x1, y0, z1), p(x1, y1, z1), p(x0, y1, z1)],
    ];

    match facing {
        Facing::Outward => outward.to_vec(),
        Facing::Inward => outward
            .iter()
            .map(|&[a, b, c, d]| [d, c, b, a])
            .collect(),
    }
}

/// The six faces of an axis-aligned box as quad polygons.
pub fn box_polygons(min: Point3<f32>, max: Point3<f32>, facing: Facing) -> Vec<ConvexPolygon> {
    box_quads(min, max, facing)
        .into_iter()
        .filter_map(|quad| ConvexPolygon::from_vertices(quad.to_vec()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HPBSP_EPSILON;

    fn unit_box(facing: Facing) -> Vec<ConvexPolygon> {
        box_polygons(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0), facing)
    }

    #[test]
    fn inward_box_faces_point_at_centre() {
        let faces = unit_box(Facing::Inward);
        assert_eq!(faces.len(), 6);
        for face in &faces {
            assert!(face.plane().signed_distance(Point3::origin()) > 0.99);
            assert!((face.area() - 4.0).abs() < 1e-5);
        }
    }

    #[test]
    fn outward_box_faces_point_away() {
        for face in unit_box(Facing::Outward) {
            assert!(face.plane().signed_distance(Point3::origin()) < -0.99);
        }
    }

    #[test]
    fn occluder_mesh_keeps_cell_tag() {
        let quads = box_quads(Point3::origin(), Point3::new(1.0, 1.0, 1.0), Facing::Inward);
        let mesh = TriangleMesh::from_quads(&quads);
        assert_eq!(mesh.triangle_count(), 12);

        let mut diagnostics = Diagnostics::new();
        let role = MeshRole::Occluder { cell: Some(4) };
        let polygons = mesh.to_polygons(role, HPBSP_EPSILON, &mut diagnostics);
        assert_eq!(polygons.len(), 12);
        assert!(polygons.iter().all(|p| p.cell() == Some(4) && !p.is_portal()));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn portal_mesh_is_two_sided() {
        let quad = [
            Point3::new(0.0, -1.0, -1.0),
            Point3::new(0.0, 1.0, -1.0),
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(0.0, -1.0, 1.0),
        ];
        let mesh = TriangleMesh::from_quads(&[quad]);
        let mut diagnostics = Diagnostics::new();
        let role = MeshRole::Portal { portal: 2 };
        let polygons = mesh.to_polygons(role, HPBSP_EPSILON, &mut diagnostics);

        assert_eq!(polygons.len(), 4);
        assert!(polygons.iter().all(|p| p.portal() == Some(2) && p.cell().is_none()));
        let facing_pos_x = polygons.iter().filter(|p| p.plane().normal().x > 0.99).count();
        let facing_neg_x = polygons.iter().filter(|p| p.plane().normal().x < -0.99).count();
        assert_eq!((facing_pos_x, facing_neg_x), (2, 2));
    }

    #[test]
    fn degenerate_and_dangling_triangles_are_skipped() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(f32::NAN, 1.0, 0.0),
        ];
        let mesh = TriangleMesh::new(
            positions,
            vec![[0, 1, 2], [0, 1, 9], [0, 1, 3], [0, 1, 4]],
        );
        let mut diagnostics = Diagnostics::new();
        let polygons =
            mesh.to_polygons(MeshRole::Occluder { cell: None }, HPBSP_EPSILON, &mut diagnostics);

        assert_eq!(polygons.len(), 1);
        assert_eq!(diagnostics.len(), 2);
    }
}
