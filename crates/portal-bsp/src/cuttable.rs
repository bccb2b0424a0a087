//! Polygon cutting/splitting against a single plane.

use crate::{Classification, ConvexPolygon, Diagnostics, Plane, PlaneSide, Warning};

/// Trait for geometry that can be cut by a plane.
pub trait Cuttable {
    /// Cuts the geometry by a plane.
    ///
    /// Returns `(front, back)` where:
    /// - `front`: `Some(polygon)` containing the part on the front side of the plane
    /// - `back`: `Some(polygon)` containing the part on the back side of the plane
    ///
    /// # Return values by classification
    ///
    /// - **Front**: `(Some(self), None)`
    /// - **Back**: `(None, Some(self))`
    /// - **On**: routed by [`ConvexPolygon::classify_on_polygon`]
    /// - **Spanning**: `(Some(front_part), Some(back_part))`; a fragment whose
    ///   area is at most `epsilon` is dropped and reported to `diagnostics`
    fn cut(
        &self,
        plane: &Plane,
        epsilon: f32,
        diagnostics: &mut Diagnostics,
    ) -> (Option<ConvexPolygon>, Option<ConvexPolygon>);
}

impl Cuttable for ConvexPolygon {
    fn cut(
        &self,
        plane: &Plane,
        epsilon: f32,
        diagnostics: &mut Diagnostics,
    ) -> (Option<ConvexPolygon>, Option<ConvexPolygon>) {
        match self.classify(plane, epsilon) {
            Classification::Front => (Some(self.clone()), None),
            Classification::Back => (None, Some(self.clone())),
            Classification::On => match self.classify_on_polygon(plane) {
                PlaneSide::Back => (None, Some(self.clone())),
                _ => (Some(self.clone()), None),
            },
            Classification::Spanning => {
                let (front, back) = split_polygon(self, plane, epsilon);
                (
                    keep_non_degenerate(front, epsilon, diagnostics),
                    keep_non_degenerate(back, epsilon, diagnostics),
                )
            }
        }
    }
}

/// Splits a spanning polygon into front and back parts.
///
/// Uses a variant of the Sutherland-Hodgman algorithm:
/// walks the polygon edges and builds two vertex lists,
/// adding intersection points when edges cross the plane.
/// Both fragments keep the parent's plane and tags.
pub fn split_polygon(
    polygon: &ConvexPolygon,
    plane: &Plane,
    epsilon: f32,
) -> (Option<ConvexPolygon>, Option<ConvexPolygon>) {
    let vertices = polygon.vertices();
    let n = vertices.len();

    let mut front_verts = Vec::with_capacity(n + 1);
    let mut back_verts = Vec::with_capacity(n + 1);

    let sides: Vec<PlaneSide> = vertices
        .iter()
        .map(|v| plane.classify_point(*v, epsilon))
        .collect();

    for i in 0..n {
        let current = vertices[i];
        let current_side = sides[i];
        let next_idx = (i + 1) % n;
        let next = vertices[next_idx];
        let next_side = sides[next_idx];

        match current_side {
            PlaneSide::Front => front_verts.push(current),
            PlaneSide::Back => back_verts.push(current),
            PlaneSide::OnPlane => {
                front_verts.push(current);
                back_verts.push(current);
            }
        }

        let crosses = matches!(
            (current_side, next_side),
            (PlaneSide::Front, PlaneSide::Back) | (PlaneSide::Back, PlaneSide::Front)
        );

        if crosses {
            if let Some(intersection) = plane.intersect_segment(current, next) {
                front_verts.push(intersection);
                back_verts.push(intersection);
            }
        }
    }

    let front = (front_verts.len() >= 3).then(|| polygon.fragment(front_verts));
    let back = (back_verts.len() >= 3).then(|| polygon.fragment(back_verts));

    (front, back)
}

fn keep_non_degenerate(
    fragment: Option<ConvexPolygon>,
    epsilon: f32,
    diagnostics: &mut Diagnostics,
) -> Option<ConvexPolygon> {
    let fragment = fragment?;
    let area = fragment.area();
    if area <= epsilon {
        diagnostics.push(Warning::DegenerateFragment {
            area,
            centroid: fragment.centroid(),
        });
        return None;
    }
    Some(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HPBSP_EPSILON;
    use nalgebra::{Point3, Vector3};

    fn make_polygon(points: &[[f32; 3]]) -> ConvexPolygon {
        ConvexPolygon::from_vertices(points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect())
            .unwrap()
    }

    fn x_plane(x: f32) -> Plane {
        Plane::new(Vector3::new(1.0, 0.0, 0.0), -x)
    }

    #[test]
    fn front_and_back_pass_through() {
        let poly = make_polygon(&[[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [1.0, 1.0, 0.0]]);
        let mut diagnostics = Diagnostics::new();

        let (front, back) = poly.cut(&x_plane(0.0), HPBSP_EPSILON, &mut diagnostics);
        assert_eq!(front.as_ref(), Some(&poly));
        assert!(back.is_none());

        let (front, back) = poly.cut(&x_plane(5.0), HPBSP_EPSILON, &mut diagnostics);
        assert!(front.is_none());
        assert_eq!(back.as_ref(), Some(&poly));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn on_polygon_routed_by_facing() {
        // Lies in x = 0, facing +x
        let poly = make_polygon(&[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(poly.plane().normal().x > 0.99);
        let mut diagnostics = Diagnostics::new();

        let (front, back) = poly.cut(&x_plane(0.0), HPBSP_EPSILON, &mut diagnostics);
        assert!(front.is_some() && back.is_none());

        let (front, back) = poly.flipped().cut(&x_plane(0.0), HPBSP_EPSILON, &mut diagnostics);
        assert!(front.is_none() && back.is_some());
    }

    #[test]
    fn split_square_conserves_vertices_and_area() {
        let square = make_polygon(&[
            [-1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0],
        ])
        .with_cell(2);
        let plane = x_plane(0.0);
        let mut diagnostics = Diagnostics::new();

        let (front, back) = square.cut(&plane, HPBSP_EPSILON, &mut diagnostics);
        let front = front.unwrap();
        let back = back.unwrap();

        assert_eq!(front.len(), 4);
        assert_eq!(back.len(), 4);
        assert_eq!(front.cell(), Some(2));
        assert_eq!(back.plane(), square.plane());
        assert!((front.area() + back.area() - square.area()).abs() < 1e-5);

        // Non-shared vertices of the fragments are exactly the originals
        let mut originals: Vec<_> = front
            .vertices()
            .iter()
            .chain(back.vertices())
            .filter(|v| plane.signed_distance(**v).abs() > HPBSP_EPSILON)
            .copied()
            .collect();
        originals.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        let mut expected = square.vertices().to_vec();
        expected.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        assert_eq!(originals, expected);

        // The two cut points are shared and lie on the plane
        let cut_points: Vec<_> = front
            .vertices()
            .iter()
            .filter(|v| plane.signed_distance(**v).abs() <= HPBSP_EPSILON)
            .collect();
        assert_eq!(cut_points.len(), 2);
        for point in cut_points {
            assert!(plane.signed_distance(*point).abs() < 1e-6);
            assert!(back.vertices().contains(point));
        }
    }

    #[test]
    fn degenerate_fragment_is_dropped_with_warning() {
        // The sliver behind x = 0 is far thinner than epsilon in area
        let thin = make_polygon(&[[-0.02, 0.0, 0.0], [4.0, 0.0, 0.0], [4.0, 0.1, 0.0]]);
        let mut diagnostics = Diagnostics::new();

        let (front, back) = thin.cut(&x_plane(0.0), HPBSP_EPSILON, &mut diagnostics);
        assert!(front.is_some());
        assert!(back.is_none());
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics.warnings()[0],
            Warning::DegenerateFragment { .. }
        ));
    }
}
