//! Binary Space Partitioning tree over convex cells.
//!
//! The tree partitions space with planes taken from the input polygons.
//! It supports:
//!
//! - Construction from a polygon soup with a cost-driven splitter choice
//! - Point location (which cell contains a point, or is it solid)
//! - Clipping another polygon soup against the tree's planes
//! - Saving and restoring the flat node array
//!
//! # Example
//!
//! ```
//! use nalgebra::Point3;
//! use portal_bsp::{BspTree, BuildConfig, ConvexPolygon, Diagnostics, Location};
//!
//! // A single floor facing up: everything above is cell 0, below is solid
//! let floor = ConvexPolygon::from_vertices(vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(1.0, 0.0, 1.0),
//!     Point3::new(1.0, 0.0, 0.0),
//! ])
//! .unwrap()
//! .with_cell(0);
//!
//! let mut diagnostics = Diagnostics::new();
//! let tree = BspTree::build(vec![floor], &BuildConfig::default(), &mut diagnostics);
//! assert_eq!(tree.point_cell(Point3::new(0.5, 1.0, 0.5)), Location::Cell(0));
//! assert_eq!(tree.point_cell(Point3::new(0.5, -1.0, 0.5)), Location::Solid);
//! ```
//!
//! # Architecture
//!
//! - [`BspTree`]: Flat node array, root at index 0
//! - [`BspNode`]: A splitting plane and two [`Child`] links
//! - [`PlaneSelector`]: Strategy trait for choosing splitting planes
//! - [`LeafVisitor`]: Visitor trait for clipped fragments

mod clip;
mod node;
mod selector;
mod tree;
mod visitor;

pub use node::{BspNode, Child, NodeIndex};
pub use selector::{FirstPolygon, LeastCost, PlaneSelector, splitter_score};
pub use tree::{BspTree, Location};
pub use visitor::{CollectingVisitor, FnVisitor, LeafVisitor};
