//! BSP tree node implementation.

use serde::{Deserialize, Serialize};

use crate::{CellId, Plane};

/// Index of a node in a tree's flat node array.
pub type NodeIndex = usize;

/// What lies on one side of a node's splitting plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Child {
    /// Descend into another node.
    Node(NodeIndex),
    /// Empty space belonging to a cell.
    Cell(CellId),
    /// Empty space whose bounding polygons carry no cell id yet.
    Unassigned,
    /// Solid space.
    Solid,
}

impl Child {
    /// Whether this child ends the descent.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Child::Node(_))
    }

    /// The node index, if this child is a node.
    #[inline]
    pub fn node(&self) -> Option<NodeIndex> {
        match self {
            Child::Node(index) => Some(*index),
            _ => None,
        }
    }
}

/// A node in the BSP tree.
///
/// Each node partitions space using a splitting plane. Both children are
/// either further nodes in the same array or terminal results. Node 0 is
/// always the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BspNode {
    /// The splitting plane for this node.
    plane: Plane,

    /// Half-space in front of the plane.
    front: Child,

    /// Half-space behind the plane.
    back: Child,
}

impl BspNode {
    /// Creates a node with explicit children.
    pub fn new(plane: Plane, front: Child, back: Child) -> Self {
        Self { plane, front, back }
    }

    /// Creates a node whose children are not decided yet.
    pub(crate) fn pending(plane: Plane) -> Self {
        Self::new(plane, Child::Unassigned, Child::Solid)
    }

    /// Returns a reference to the splitting plane.
    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Returns the front child.
    #[inline]
    pub fn front(&self) -> Child {
        self.front
    }

    /// Returns the back child.
    #[inline]
    pub fn back(&self) -> Child {
        self.back
    }

    /// Sets the front child.
    #[inline]
    pub fn set_front(&mut self, child: Child) {
        self.front = child;
    }

    /// Sets the back child.
    #[inline]
    pub fn set_back(&mut self, child: Child) {
        self.back = child;
    }

    /// Checks if this node has no node children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.front.is_terminal() && self.back.is_terminal()
    }
}
