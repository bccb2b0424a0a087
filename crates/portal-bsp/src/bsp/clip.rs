//! Clipping a foreign polygon soup against an existing tree.

use crate::{ConvexPolygon, Cuttable, Diagnostics};

use super::node::Child;
use super::tree::BspTree;
use super::visitor::{CollectingVisitor, LeafVisitor};

impl BspTree {
    /// Pushes `polygons` down the tree, splitting them on every node plane
    /// they span.
    ///
    /// Polygons need not be the ones the tree was built from. Fragments that
    /// reach solid space are discarded; the rest are returned in leaf order.
    /// An empty tree returns its input unchanged.
    pub fn clip_polygons(
        &self,
        polygons: Vec<ConvexPolygon>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<ConvexPolygon> {
        let mut visitor = CollectingVisitor::new();
        self.clip_polygons_with(polygons, &mut visitor, diagnostics);
        visitor.into_polygons()
    }

    /// Like [`clip_polygons`](Self::clip_polygons), but hands each leaf's
    /// fragments to `visitor` together with the leaf they reached.
    pub fn clip_polygons_with<V: LeafVisitor>(
        &self,
        polygons: Vec<ConvexPolygon>,
        visitor: &mut V,
        diagnostics: &mut Diagnostics,
    ) {
        self.descend(polygons, false, visitor, diagnostics);
    }

    /// Cuts `polygons` along every node plane they span, keeping all
    /// fragments including those reaching solid space.
    ///
    /// Used with trees whose solid leaves bound no real geometry, such as a
    /// tree built from portal polygons alone.
    pub fn split_polygons(
        &self,
        polygons: Vec<ConvexPolygon>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<ConvexPolygon> {
        let mut visitor = CollectingVisitor::new();
        self.descend(polygons, true, &mut visitor, diagnostics);
        visitor.into_polygons()
    }

    fn descend<V: LeafVisitor>(
        &self,
        polygons: Vec<ConvexPolygon>,
        keep_solid: bool,
        visitor: &mut V,
        diagnostics: &mut Diagnostics,
    ) {
        if self.is_empty() {
            visitor.visit(Child::Unassigned, &polygons);
            return;
        }

        let epsilon = self.epsilon();
        let mut discarded = 0;
        let mut stack = vec![(Child::Node(0), polygons)];

        while let Some((child, polygons)) = stack.pop() {
            if polygons.is_empty() {
                continue;
            }

            let index = match child {
                Child::Node(index) => index,
                Child::Solid if !keep_solid => {
                    discarded += polygons.len();
                    continue;
                }
                Child::Cell(_) | Child::Unassigned | Child::Solid => {
                    visitor.visit(child, &polygons);
                    continue;
                }
            };

            let Some(node) = self.nodes().get(index) else {
                log::error!("illegal topology: node {index} does not exist");
                continue;
            };

            let mut front_list = Vec::new();
            let mut back_list = Vec::new();
            for polygon in polygons {
                let (front_part, back_part) = polygon.cut(node.plane(), epsilon, diagnostics);
                front_list.extend(front_part);
                back_list.extend(back_part);
            }

            // Back pushed first so the front side is emitted first
            stack.push((node.back(), back_list));
            stack.push((node.front(), front_list));
        }

        if discarded > 0 {
            log::debug!("clipping discarded {discarded} fragments in solid space");
        }
    }
}
