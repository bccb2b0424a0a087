//! Tagged convex polygon, the unit of work for every stage of the build.

use nalgebra::{Point3, Vector3};

use crate::{Classification, Plane, PlaneSide};

/// Identifier of an empty-space cell.
pub type CellId = usize;

/// Identifier of a portal.
pub type PortalId = usize;

/// A convex polygon in 3D space with its supporting plane and scene tags.
///
/// Vertices are coplanar and wound counter-clockwise when viewed from the
/// front (the direction the plane normal points). The plane is stored, not
/// recomputed: fragments produced by splitting inherit their parent's plane.
///
/// Geometry is immutable once built. Only the cell tag changes after
/// construction, when the decomposer colours the soup.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexPolygon {
    vertices: Vec<Point3<f32>>,
    plane: Plane,
    cell: Option<CellId>,
    portal: Option<PortalId>,
}

impl ConvexPolygon {
    /// Creates a polygon from its vertices and an explicit supporting plane.
    ///
    /// # Panics (debug builds only)
    /// Panics if fewer than 3 vertices are provided.
    pub fn new(vertices: Vec<Point3<f32>>, plane: Plane) -> Self {
        debug_assert!(
            vertices.len() >= 3,
            "Polygon must have at least 3 vertices"
        );
        Self {
            vertices,
            plane,
            cell: None,
            portal: None,
        }
    }

    /// Creates a polygon whose plane is derived from the vertex winding
    /// (Newell's method).
    ///
    /// Returns `None` for fewer than 3 vertices or a zero-area loop.
    pub fn from_vertices(vertices: Vec<Point3<f32>>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }

        let mut normal = Vector3::<f32>::zeros();
        let mut center = Vector3::zeros();
        for (i, current) in vertices.iter().enumerate() {
            let next = vertices[(i + 1) % vertices.len()];
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
            center += current.coords;
        }

        // NaN or infinite coordinates leave no usable plane
        if !normal.iter().all(|c| c.is_finite()) || normal.norm() <= f32::EPSILON {
            return None;
        }

        let center = Point3::from(center / vertices.len() as f32);
        let plane = Plane::from_point_and_normal(center, normal);
        Some(Self::new(vertices, plane))
    }

    /// Returns this polygon tagged with a cell id.
    pub fn with_cell(mut self, cell: CellId) -> Self {
        self.cell = Some(cell);
        self
    }

    /// Returns this polygon tagged with a portal id.
    pub fn with_portal(mut self, portal: PortalId) -> Self {
        self.portal = Some(portal);
        self
    }

    /// A new polygon on the same plane with the same tags but other vertices.
    pub(crate) fn fragment(&self, vertices: Vec<Point3<f32>>) -> Self {
        Self {
            vertices,
            plane: self.plane,
            cell: self.cell,
            portal: self.portal,
        }
    }

    pub(crate) fn set_cell(&mut self, cell: Option<CellId>) {
        self.cell = cell;
    }

    /// Returns the vertices of the polygon.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the polygon has no vertices (always false for valid polygons).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the stored supporting plane.
    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Cell this polygon bounds, `None` while unassigned.
    #[inline]
    pub fn cell(&self) -> Option<CellId> {
        self.cell
    }

    /// Portal this polygon belongs to, `None` for occluders.
    #[inline]
    pub fn portal(&self) -> Option<PortalId> {
        self.portal
    }

    /// Whether this polygon is part of a portal.
    #[inline]
    pub fn is_portal(&self) -> bool {
        self.portal.is_some()
    }

    /// Computes the centroid (vertex average) of the polygon.
    pub fn centroid(&self) -> Point3<f32> {
        let sum: Vector3<f32> = self.vertices.iter().map(|p| p.coords).sum();
        Point3::from(sum / self.vertices.len() as f32)
    }

    /// Surface area as the sum of Heron's formula over a triangle fan.
    pub fn area(&self) -> f32 {
        let Some((first, rest)) = self.vertices.split_first() else {
            return 0.0;
        };

        rest.windows(2)
            .map(|pair| heron(*first, pair[0], pair[1]))
            .sum()
    }

    /// Classifies this polygon relative to a plane.
    pub fn classify(&self, plane: &Plane, epsilon: f32) -> Classification {
        let mut front = 0;
        let mut back = 0;

        for vertex in &self.vertices {
            match plane.classify_point(*vertex, epsilon) {
                PlaneSide::Front => front += 1,
                PlaneSide::Back => back += 1,
                PlaneSide::OnPlane => {}
            }
        }

        match (front, back) {
            (0, 0) => Classification::On,
            (_, 0) => Classification::Front,
            (0, _) => Classification::Back,
            _ => Classification::Spanning,
        }
    }

    /// Breaks the tie for a polygon lying on `splitter`.
    ///
    /// The centroid is stepped one unit along this polygon's own normal and
    /// the result is classified against the splitter: a polygon facing the
    /// same way as the splitter goes to the front, an opposite one to the back.
    pub fn classify_on_polygon(&self, splitter: &Plane) -> PlaneSide {
        let probe = self.centroid() + self.plane.normal();
        if splitter.signed_distance(probe) >= 0.0 {
            PlaneSide::Front
        } else {
            PlaneSide::Back
        }
    }

    /// Whether this polygon's own plane is `plane` (same orientation).
    #[inline]
    pub fn is_coplanar_with(&self, plane: &Plane, epsilon: f32) -> bool {
        self.plane.coincides_with(plane, epsilon)
    }

    /// Whether `point` lies on the polygon: on its plane and inside or on
    /// every edge, both within `epsilon`.
    pub fn contains_point(&self, point: Point3<f32>, epsilon: f32) -> bool {
        if self.plane.signed_distance(point).abs() > epsilon {
            return false;
        }

        let normal = self.plane.normal();
        let n = self.vertices.len();
        (0..n).all(|i| {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let edge = b - a;
            let length = edge.norm();
            if length <= f32::EPSILON {
                return true;
            }
            edge.cross(&(point - a)).dot(&normal) / length >= -epsilon
        })
    }

    /// The same polygon seen from behind: reversed winding, flipped plane.
    pub fn flipped(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Self {
            vertices,
            plane: self.plane.flipped(),
            cell: self.cell,
            portal: self.portal,
        }
    }
}

fn heron(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> f32 {
    let ab = (b - a).norm();
    let bc = (c - b).norm();
    let ca = (a - c).norm();
    let s = (ab + bc + ca) * 0.5;
    (s * (s - ab) * (s - bc) * (s - ca)).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_polygon(points: &[[f32; 3]]) -> ConvexPolygon {
        ConvexPolygon::from_vertices(points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect())
            .unwrap()
    }

    #[test]
    fn from_vertices_follows_winding() {
        // Counter-clockwise seen from +z
        let poly = make_polygon(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert!(poly.plane().normal().z > 0.99);
        assert!(poly.plane().d().abs() < 1e-6);
        assert_eq!(poly.cell(), None);
        assert_eq!(poly.portal(), None);
    }

    #[test]
    fn from_vertices_rejects_degenerate() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(ConvexPolygon::from_vertices(points).is_none());
        assert!(ConvexPolygon::from_vertices(vec![Point3::origin()]).is_none());
    }

    #[test]
    fn from_vertices_rejects_non_finite() {
        for bad in [f32::NAN, f32::INFINITY] {
            let points = vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, bad, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ];
            assert!(ConvexPolygon::from_vertices(points).is_none(), "{bad}");
        }
    }

    #[test]
    fn tags_are_carried() {
        let poly = make_polygon(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
            .with_cell(3)
            .with_portal(7);
        assert_eq!(poly.cell(), Some(3));
        assert_eq!(poly.portal(), Some(7));
        assert!(poly.is_portal());

        let fragment = poly.fragment(poly.vertices().to_vec());
        assert_eq!(fragment.cell(), Some(3));
        assert_eq!(fragment.portal(), Some(7));
        assert_eq!(fragment.plane(), poly.plane());
    }

    #[test]
    fn area_of_unit_square() {
        let square = make_polygon(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        assert!((square.area() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn classify_four_buckets() {
        let plane = Plane::new(Vector3::new(0.0, 0.0, 1.0), 0.0);
        let eps = crate::HPBSP_EPSILON;

        let front = make_polygon(&[[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 2.0]]);
        let back = make_polygon(&[[0.0, 0.0, -1.0], [1.0, 0.0, -1.0], [0.0, 1.0, -2.0]]);
        let on = make_polygon(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let spanning = make_polygon(&[[0.0, 0.0, -1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]]);
        // Touches the plane along an edge, otherwise in front
        let touching = make_polygon(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);

        assert_eq!(front.classify(&plane, eps), Classification::Front);
        assert_eq!(back.classify(&plane, eps), Classification::Back);
        assert_eq!(on.classify(&plane, eps), Classification::On);
        assert_eq!(spanning.classify(&plane, eps), Classification::Spanning);
        assert_eq!(touching.classify(&plane, eps), Classification::Front);
    }

    #[test]
    fn on_polygon_tie_break_uses_own_normal() {
        let up = make_polygon(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let down = up.flipped();
        let splitter = *up.plane();

        assert_eq!(up.classify_on_polygon(&splitter), PlaneSide::Front);
        assert_eq!(down.classify_on_polygon(&splitter), PlaneSide::Back);
        assert!(up.is_coplanar_with(&splitter, crate::HPBSP_EPSILON));
        assert!(!down.is_coplanar_with(&splitter, crate::HPBSP_EPSILON));
    }

    #[test]
    fn contains_point_inside_edge_and_outside() {
        let square = make_polygon(&[
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 2.0, 0.0],
            [0.0, 2.0, 0.0],
        ]);
        let eps = crate::HPBSP_EPSILON;
        assert!(square.contains_point(Point3::new(1.0, 1.0, 0.0), eps));
        assert!(square.contains_point(Point3::new(2.0, 1.0, 0.0), eps));
        assert!(square.contains_point(Point3::new(0.0, 0.0, 0.0), eps));
        assert!(!square.contains_point(Point3::new(3.0, 1.0, 0.0), eps));
        assert!(!square.contains_point(Point3::new(1.0, 1.0, 0.5), eps));
    }

    #[test]
    fn flipped_reverses_winding_and_plane() {
        let poly = make_polygon(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).with_cell(1);
        let flipped = poly.flipped();
        assert_eq!(flipped.vertices()[0], poly.vertices()[2]);
        assert!(flipped.plane().normal().z < -0.99);
        assert_eq!(flipped.cell(), Some(1));
    }
}
