//! BSP construction, point location, and portal/cell decomposition for
//! hybrid portal scenes.
//!
//! The input is a soup of convex polygons split into occluders (walls) and
//! portals (doorways). [`LevelBuilder`] turns them into a [`BspTree`] that
//! locates points in cells, and a [`CellGraph`] recording which portals
//! join which cells.

pub mod bsp;

mod config;
mod connectivity;
mod cuttable;
mod decompose;
mod diagnostics;
mod error;
mod level;
mod mesh;
mod plane;
mod polygon;

pub use bsp::{BspNode, BspTree, Child, LeafVisitor, Location};
pub use config::{BuildConfig, ColoringConflictPolicy, CoplanarPolygonPolicy, SplitterStrategy};
pub use connectivity::{Cell, CellGraph, Portal};
pub use cuttable::{Cuttable, split_polygon};
pub use decompose::{Decomposer, Decomposition};
pub use diagnostics::{Diagnostics, Warning};
pub use error::{BuildError, Result};
pub use level::{LevelBuilder, PortalLevel};
pub use mesh::{Facing, MeshRole, TriangleMesh, box_polygons, box_quads};
pub use plane::{Classification, HPBSP_EPSILON, Plane, PlaneSide};
pub use polygon::{CellId, ConvexPolygon, PortalId};
