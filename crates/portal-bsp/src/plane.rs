//! Plane representation and point classification.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Default tolerance for every plane and vertex comparison.
///
/// Points closer than this to a plane are considered to lie on it, and two
/// vertices closer than this on every axis are considered the same vertex.
pub const HPBSP_EPSILON: f32 = 1.0 / 128.0;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

/// Classification of a polygon relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No vertex is behind the plane, at least one is in front
    Front,
    /// No vertex is in front of the plane, at least one is behind
    Back,
    /// All vertices are on the plane
    On,
    /// Vertices are strictly on both sides
    Spanning,
}

/// A plane in 3D space: a point `v` lies on it when `normal · v + d = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    normal: Vector3<f32>,
    d: f32,
}

impl Plane {
    /// Creates a new plane from a normal vector and offset.
    /// Both are rescaled so that the stored normal has unit length.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn new(normal: Vector3<f32>, d: f32) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        Self {
            normal: normal / norm,
            d: d / norm,
        }
    }

    /// Creates a plane from a point on the plane and a normal vector.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        let unit_normal = normal / norm;
        Self {
            normal: unit_normal,
            d: -unit_normal.dot(&point.coords),
        }
    }

    /// Creates a plane from three points, normal `(b - a) × (c - a)`.
    ///
    /// Returns `None` if the points are collinear.
    pub fn try_from_three_points(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a));
        if normal.norm() > f32::EPSILON {
            Some(Self::from_point_and_normal(a, normal))
        } else {
            None
        }
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Returns the scalar offset `d`.
    #[inline]
    pub fn d(&self) -> f32 {
        self.d
    }

    /// Signed distance from a point to the plane, positive in front.
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) + self.d
    }

    /// Classifies which side of the plane a point lies on.
    pub fn classify_point(&self, point: Point3<f32>, epsilon: f32) -> PlaneSide {
        let dist = self.signed_distance(point);
        if dist > epsilon {
            PlaneSide::Front
        } else if dist < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// Returns the same plane facing the opposite direction.
    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            d: -self.d,
        }
    }

    /// Whether `other` is the same oriented plane, within `epsilon` on both
    /// the normal components and the offset.
    pub fn coincides_with(&self, other: &Plane, epsilon: f32) -> bool {
        (self.normal - other.normal).amax() <= epsilon && (self.d - other.d).abs() <= epsilon
    }

    /// Intersection of the segment `start..end` with the plane.
    ///
    /// Returns `None` if the segment is parallel to the plane or the
    /// intersection falls outside the segment.
    pub fn intersect_segment(&self, start: Point3<f32>, end: Point3<f32>) -> Option<Point3<f32>> {
        let d_start = self.signed_distance(start);
        let d_end = self.signed_distance(end);
        let denom = d_start - d_end;

        if denom.abs() < f32::EPSILON {
            return None;
        }

        let t = d_start / denom;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }

        Some(start + (end - start) * t)
    }
}
