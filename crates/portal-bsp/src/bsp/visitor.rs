//! Visitor pattern for polygons reaching the leaves of a tree.
//!
//! Visitors receive the output of [`BspTree::clip_polygons_with`] leaf by
//! leaf, without coupling the descent to a particular use.
//!
//! [`BspTree::clip_polygons_with`]: super::BspTree::clip_polygons_with

use crate::ConvexPolygon;

use super::Child;

/// Visitor for processing polygons as they reach a terminal child.
pub trait LeafVisitor {
    /// Called for each batch of polygons that reached the terminal `leaf`.
    ///
    /// Clipping only reports empty space ([`Child::Cell`] or
    /// [`Child::Unassigned`]); splitting reports [`Child::Solid`] as well.
    fn visit(&mut self, leaf: Child, polygons: &[ConvexPolygon]);
}

/// A simple visitor that collects all visited polygons.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    collected: Vec<ConvexPolygon>,
}

impl CollectingVisitor {
    /// Creates a new empty collecting visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected polygons.
    pub fn into_polygons(self) -> Vec<ConvexPolygon> {
        self.collected
    }

    /// Returns a reference to the collected polygons.
    pub fn polygons(&self) -> &[ConvexPolygon] {
        &self.collected
    }
}

impl LeafVisitor for CollectingVisitor {
    fn visit(&mut self, _leaf: Child, polygons: &[ConvexPolygon]) {
        self.collected.extend(polygons.iter().cloned());
    }
}

/// A visitor that calls a closure for each leaf batch.
pub struct FnVisitor<F>
where
    F: FnMut(Child, &[ConvexPolygon]),
{
    func: F,
}

impl<F> FnVisitor<F>
where
    F: FnMut(Child, &[ConvexPolygon]),
{
    /// Creates a new visitor from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> LeafVisitor for FnVisitor<F>
where
    F: FnMut(Child, &[ConvexPolygon]),
{
    fn visit(&mut self, leaf: Child, polygons: &[ConvexPolygon]) {
        (self.func)(leaf, polygons);
    }
}
