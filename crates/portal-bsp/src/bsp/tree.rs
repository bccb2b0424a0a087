//! BSP tree container, construction, and point location.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::{
    BuildConfig, CellId, Classification, ConvexPolygon, CoplanarPolygonPolicy, Cuttable,
    Diagnostics, HPBSP_EPSILON, Plane, PlaneSide, Result,
};

use super::node::{BspNode, Child, NodeIndex};
use super::selector::{ConfiguredSelector, PlaneSelector};

/// Where a point lies according to a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Empty space of a known cell.
    Cell(CellId),
    /// Empty space without a cell id.
    Unassigned,
    /// Solid space.
    Solid,
}

impl Location {
    /// The cell id, if the point is in a known cell.
    #[inline]
    pub fn cell(&self) -> Option<CellId> {
        match self {
            Location::Cell(cell) => Some(*cell),
            _ => None,
        }
    }

    /// Whether the point is in solid space.
    #[inline]
    pub fn is_solid(&self) -> bool {
        matches!(self, Location::Solid)
    }
}

/// A Binary Space Partitioning tree over convex cells.
///
/// Nodes live in a flat array with the root at index 0; children refer to
/// each other by index, so the array can be saved and restored verbatim
/// with [`nodes`](Self::nodes) and [`from_nodes`](Self::from_nodes).
///
/// The front side of every splitting plane is empty space and the back side
/// of a boundary plane is solid, so the leaves of a tree built from the
/// inward-facing walls of a level are its empty convex regions.
///
/// ```
/// use nalgebra::Point3;
/// use portal_bsp::{box_polygons, BspTree, Facing, Location};
///
/// let min = Point3::new(-1.0, -1.0, -1.0);
/// let max = Point3::new(1.0, 1.0, 1.0);
/// let walls = box_polygons(min, max, Facing::Inward)
///     .into_iter()
///     .map(|wall| wall.with_cell(0))
///     .collect();
/// let tree = BspTree::from_polygons(walls);
///
/// assert_eq!(tree.point_cell(Point3::origin()), Location::Cell(0));
/// assert_eq!(tree.point_cell(Point3::new(5.0, 0.0, 0.0)), Location::Solid);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BspTree {
    nodes: Vec<BspNode>,
    epsilon: f32,
}

impl Default for BspTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Polygons waiting to be partitioned. A polygon is flagged once it has
/// served as a splitter so it is never selected again.
#[derive(Debug, Clone, Default)]
struct Fragments {
    polygons: Vec<ConvexPolygon>,
    used: Vec<bool>,
}

impl Fragments {
    fn push(&mut self, polygon: ConvexPolygon, used: bool) {
        self.polygons.push(polygon);
        self.used.push(used);
    }

    fn has_unused(&self) -> bool {
        self.used.iter().any(|used| !used)
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Front,
    Back,
}

/// Pending subtree: the polygons it partitions and where to attach it.
struct BuildTask {
    parent: Option<(NodeIndex, Side)>,
    fragments: Fragments,
}

impl BspTree {
    /// Creates an empty BSP tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            epsilon: HPBSP_EPSILON,
        }
    }

    /// Builds a BSP tree from a collection of polygons.
    ///
    /// Splitting planes are chosen per [`BuildConfig::selector`]. Polygons
    /// spanning a splitter are cut in two; degenerate fragments are dropped
    /// and reported to `diagnostics`. An empty front half-space becomes a
    /// cell leaf tagged with the cell of a polygon lying on the splitter; an
    /// empty back half-space is solid.
    ///
    /// Returns an empty tree if the input is empty.
    pub fn build(
        polygons: Vec<ConvexPolygon>,
        config: &BuildConfig,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            epsilon: config.epsilon,
        };
        if polygons.is_empty() {
            return tree;
        }

        let selector = ConfiguredSelector::from(config.selector);
        let mut tasks = vec![BuildTask {
            parent: None,
            fragments: Fragments {
                used: vec![false; polygons.len()],
                polygons,
            },
        }];

        while let Some(task) = tasks.pop() {
            tree.build_node(task, &selector, config, diagnostics, &mut tasks);
        }

        log::debug!(
            "built BSP tree: {} nodes, depth {}",
            tree.nodes.len(),
            tree.depth()
        );
        tree
    }

    /// Builds a BSP tree using the default configuration.
    ///
    /// Warnings are logged but not returned.
    pub fn from_polygons(polygons: Vec<ConvexPolygon>) -> Self {
        Self::build(polygons, &BuildConfig::default(), &mut Diagnostics::new())
    }

    /// Restores a tree from a raw node array, as returned by [`nodes`](Self::nodes).
    ///
    /// The array does not carry the build tolerance; the tree queries with
    /// [`HPBSP_EPSILON`] unless [`with_epsilon`](Self::with_epsilon) says otherwise.
    pub fn from_nodes(nodes: Vec<BspNode>) -> Self {
        Self {
            nodes,
            epsilon: HPBSP_EPSILON,
        }
    }

    /// Returns this tree with another classification tolerance for queries.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Serializes the node array and the query tolerance to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restores a tree saved with [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The raw node array, root first.
    #[inline]
    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    /// Consumes the tree, returning the raw node array.
    pub fn into_nodes(self) -> Vec<BspNode> {
        self.nodes
    }

    /// Classification tolerance used by queries and clipping.
    #[inline]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Returns `true` if the tree has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of empty-space leaves (terminal children that are not solid).
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .flat_map(|node| [node.front(), node.back()])
            .filter(|child| matches!(child, Child::Cell(_) | Child::Unassigned))
            .count()
    }

    /// Returns the maximum depth of the tree (0 for empty tree).
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }

        let mut deepest = 0;
        let mut stack = vec![(0, 1)];
        while let Some((index, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            // A malformed array could loop; no valid tree is deeper than its node count
            if depth > self.nodes.len() {
                continue;
            }
            deepest = deepest.max(depth);
            for child in [node.front(), node.back()] {
                if let Child::Node(next) = child {
                    stack.push((next, depth + 1));
                }
            }
        }
        deepest
    }

    /// Locates the convex region containing `point`.
    ///
    /// Points within epsilon of a splitting plane count as in front of it.
    /// An empty tree reports [`Location::Unassigned`].
    pub fn point_cell(&self, point: Point3<f32>) -> Location {
        if self.nodes.is_empty() {
            return Location::Unassigned;
        }

        let mut index = 0;
        for _ in 0..self.nodes.len() {
            let Some(node) = self.nodes.get(index) else {
                log::error!("illegal topology: node {index} does not exist");
                return Location::Solid;
            };

            if node.plane().signed_distance(point) >= -self.epsilon {
                match node.front() {
                    Child::Node(next) => index = next,
                    Child::Cell(cell) => return Location::Cell(cell),
                    Child::Unassigned => return Location::Unassigned,
                    Child::Solid => {
                        log::error!("illegal topology: solid in front of node {index}");
                        return Location::Solid;
                    }
                }
            } else {
                match node.back() {
                    Child::Node(next) => index = next,
                    Child::Solid => return Location::Solid,
                    Child::Cell(cell) => {
                        log::error!("illegal topology: cell {cell} behind node {index}");
                        return Location::Cell(cell);
                    }
                    Child::Unassigned => {
                        log::error!("illegal topology: empty space behind node {index}");
                        return Location::Unassigned;
                    }
                }
            }
        }

        log::error!("illegal topology: node array contains a cycle");
        Location::Solid
    }

    /// Creates one node from `task`, queueing its non-terminal children.
    fn build_node<S: PlaneSelector>(
        &mut self,
        task: BuildTask,
        selector: &S,
        config: &BuildConfig,
        diagnostics: &mut Diagnostics,
        tasks: &mut Vec<BuildTask>,
    ) {
        let epsilon = config.epsilon;
        let BuildTask { parent, fragments } = task;

        let candidates: Vec<usize> = (0..fragments.polygons.len())
            .filter(|&i| !fragments.used[i])
            .collect();
        let Some(splitter_idx) = selector.select(&fragments.polygons, &candidates, epsilon) else {
            return;
        };
        let plane: Plane = *fragments.polygons[splitter_idx].plane();

        let index = self.nodes.len();
        self.nodes.push(BspNode::pending(plane));
        if let Some((parent, side)) = parent {
            let parent = &mut self.nodes[parent];
            match side {
                Side::Front => parent.set_front(Child::Node(index)),
                Side::Back => parent.set_back(Child::Node(index)),
            }
        }

        let mut coplanar = Vec::new();
        let mut front_list = Fragments::default();
        let mut back_list = Fragments::default();

        let Fragments { polygons, used } = fragments;
        for (i, (polygon, used)) in polygons.into_iter().zip(used).enumerate() {
            if i == splitter_idx {
                coplanar.push(polygon);
                continue;
            }

            match polygon.classify(&plane, epsilon) {
                Classification::Front => front_list.push(polygon, used),
                Classification::Back => back_list.push(polygon, used),
                Classification::On if polygon.is_coplanar_with(&plane, epsilon) => {
                    coplanar.push(polygon);
                }
                Classification::On => match polygon.classify_on_polygon(&plane) {
                    PlaneSide::Back => back_list.push(polygon, used),
                    _ => front_list.push(polygon, used),
                },
                Classification::Spanning => {
                    let (front_part, back_part) = polygon.cut(&plane, epsilon, diagnostics);
                    if let Some(polygon) = front_part {
                        front_list.push(polygon, used);
                    }
                    if let Some(polygon) = back_part {
                        back_list.push(polygon, used);
                    }
                }
            }
        }

        log::debug!(
            "node {index}: {} front, {} back, {} coplanar",
            front_list.polygons.len(),
            back_list.polygons.len(),
            coplanar.len()
        );

        let leaf = coplanar
            .iter()
            .find_map(ConvexPolygon::cell)
            .map_or(Child::Unassigned, Child::Cell);

        let target = match config.coplanar_policy {
            CoplanarPolygonPolicy::Discard => None,
            CoplanarPolygonPolicy::AssignToFront => Some(&mut front_list),
            CoplanarPolygonPolicy::AssignToBack => Some(&mut back_list),
        };
        if let Some(target) = target {
            for polygon in coplanar {
                target.push(polygon, true);
            }
        }

        if front_list.has_unused() {
            tasks.push(BuildTask {
                parent: Some((index, Side::Front)),
                fragments: front_list,
            });
        } else {
            self.nodes[index].set_front(leaf);
        }

        if back_list.has_unused() {
            tasks.push(BuildTask {
                parent: Some((index, Side::Back)),
                fragments: back_list,
            });
        } else {
            self.nodes[index].set_back(Child::Solid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Facing, box_polygons};
    use nalgebra::Vector3;

    fn make_triangle(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> ConvexPolygon {
        ConvexPolygon::from_vertices(vec![
            Point3::new(a[0], a[1], a[2]),
            Point3::new(b[0], b[1], b[2]),
            Point3::new(c[0], c[1], c[2]),
        ])
        .unwrap()
    }

    fn unit_room(cell: CellId) -> Vec<ConvexPolygon> {
        box_polygons(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0), Facing::Inward)
            .into_iter()
            .map(|p| p.with_cell(cell))
            .collect()
    }

    #[test]
    fn empty_tree() {
        let tree = BspTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.point_cell(Point3::origin()), Location::Unassigned);
    }

    #[test]
    fn build_empty() {
        let tree = BspTree::from_polygons(vec![]);
        assert!(tree.is_empty());
    }

    #[test]
    fn build_single_triangle() {
        let poly = make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]).with_cell(5);
        let tree = BspTree::from_polygons(vec![poly]);

        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.depth(), 1);
        let root = &tree.nodes()[0];
        assert_eq!(root.front(), Child::Cell(5));
        assert_eq!(root.back(), Child::Solid);
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn build_cube_reaches_solid_interior() {
        let tree = BspTree::from_polygons(unit_room(0));

        assert_eq!(tree.node_count(), 6);
        assert_eq!(tree.leaf_count(), 1);
        assert!(tree.nodes().iter().all(|node| node.back() == Child::Solid));
    }

    #[test]
    fn box_centre_is_a_cell_and_outside_is_solid() {
        let tree = BspTree::from_polygons(unit_room(0));

        // Cell 0 must not be confused with node 0
        assert_eq!(tree.point_cell(Point3::origin()), Location::Cell(0));
        assert_eq!(tree.point_cell(Point3::new(0.9, -0.9, 0.5)), Location::Cell(0));
        assert!(tree.point_cell(Point3::new(0.0, -5.0, 0.0)).is_solid());
        assert!(tree.point_cell(Point3::new(5.0, 5.0, 5.0)).is_solid());
        assert!(tree.point_cell(Point3::new(-3.0, 0.0, 0.0)).is_solid());
    }

    #[test]
    fn boundary_points_favour_front() {
        let tree = BspTree::from_polygons(unit_room(2));
        let just_outside = Point3::new(0.0, -1.0 - HPBSP_EPSILON * 0.5, 0.0);
        assert_eq!(tree.point_cell(just_outside), Location::Cell(2));
    }

    #[test]
    fn build_two_disjoint_triangles() {
        let near = make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]).with_cell(0);
        let far = make_triangle([5.0, 5.0, 3.0], [6.0, 5.0, 3.0], [5.0, 6.0, 3.0]).with_cell(1);

        let tree = BspTree::from_polygons(vec![near, far]);

        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.nodes()[0].front(), Child::Node(1));
        assert_eq!(tree.nodes()[1].front(), Child::Cell(1));
        assert_eq!(tree.point_cell(Point3::new(0.0, 0.0, 10.0)), Location::Cell(1));
        assert!(tree.point_cell(Point3::new(0.0, 0.0, -1.0)).is_solid());
    }

    #[test]
    fn spanning_polygon_gets_split() {
        let splitter = make_triangle([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]);
        let spanning = make_triangle([-0.5, -1.0, 0.5], [0.5, -1.0, 0.5], [0.5, 1.0, 0.5]);

        let tree = BspTree::build(
            vec![splitter, spanning],
            &BuildConfig {
                selector: crate::SplitterStrategy::First,
                ..BuildConfig::default()
            },
            &mut Diagnostics::new(),
        );

        // Root plus one node per fragment
        assert_eq!(tree.node_count(), 3);
        assert!(matches!(tree.nodes()[0].front(), Child::Node(_)));
        assert!(matches!(tree.nodes()[0].back(), Child::Node(_)));
    }

    #[test]
    fn coplanar_policies_terminate() {
        let a = make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]).with_cell(0);
        let b = make_triangle([3.0, 0.0, 0.0], [4.0, 0.0, 0.0], [3.0, 1.0, 0.0]).with_cell(0);
        let c = make_triangle([0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [1.0, 0.0, 1.0]).with_cell(0);
        assert!(c.plane().normal().z < 0.0);

        for policy in [
            CoplanarPolygonPolicy::Discard,
            CoplanarPolygonPolicy::AssignToFront,
            CoplanarPolygonPolicy::AssignToBack,
        ] {
            let config = BuildConfig::default().with_coplanar_policy(policy);
            let tree = BspTree::build(
                vec![a.clone(), b.clone(), c.clone()],
                &config,
                &mut Diagnostics::new(),
            );
            assert_eq!(tree.node_count(), 2, "policy {policy:?}");
            assert_eq!(
                tree.point_cell(Point3::new(0.2, 0.2, 0.5)),
                Location::Cell(0),
                "policy {policy:?}"
            );
        }
    }

    #[test]
    fn untagged_polygons_give_unassigned_leaves() {
        let poly = make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let tree = BspTree::from_polygons(vec![poly]);
        assert_eq!(tree.point_cell(Point3::new(0.0, 0.0, 1.0)), Location::Unassigned);
    }

    #[test]
    fn restored_tree_answers_the_same() {
        let tree = BspTree::from_polygons(unit_room(3));
        let json = tree.to_json().unwrap();
        let restored = BspTree::from_json(&json).unwrap();

        assert_eq!(restored.nodes(), tree.nodes());
        assert_eq!(restored.point_cell(Point3::origin()), Location::Cell(3));

        let again = BspTree::from_nodes(tree.clone().into_nodes());
        assert_eq!(again.point_cell(Point3::new(0.0, 9.0, 0.0)), Location::Solid);
    }

    #[test]
    fn restored_tree_keeps_its_tolerance() {
        let config = BuildConfig {
            epsilon: 0.25,
            ..BuildConfig::default()
        };
        let tree = BspTree::build(unit_room(0), &config, &mut Diagnostics::new());
        // Just below the floor, inside the wider tolerance
        let point = Point3::new(0.0, -1.1, 0.0);
        assert_eq!(tree.point_cell(point), Location::Cell(0));

        let restored = BspTree::from_json(&tree.to_json().unwrap()).unwrap();
        assert_eq!(restored.epsilon(), 0.25);
        assert_eq!(restored.point_cell(point), Location::Cell(0));

        let raw = BspTree::from_nodes(tree.clone().into_nodes());
        assert_eq!(raw.epsilon(), HPBSP_EPSILON);
        assert_eq!(raw.point_cell(point), Location::Solid);
        assert_eq!(raw.with_epsilon(0.25).point_cell(point), Location::Cell(0));
    }

    #[test]
    fn illegal_back_cell_is_returned_best_effort() {
        let plane = Plane::new(Vector3::new(0.0, 0.0, 1.0), 0.0);
        let tree = BspTree::from_nodes(vec![BspNode::new(plane, Child::Cell(0), Child::Cell(7))]);
        assert_eq!(tree.point_cell(Point3::new(0.0, 0.0, -1.0)), Location::Cell(7));
    }

    #[test]
    fn cyclic_node_array_does_not_hang() {
        let plane = Plane::new(Vector3::new(0.0, 0.0, 1.0), 0.0);
        let tree = BspTree::from_nodes(vec![BspNode::new(plane, Child::Node(0), Child::Solid)]);
        assert_eq!(tree.point_cell(Point3::new(0.0, 0.0, 1.0)), Location::Solid);
        assert_eq!(tree.depth(), 1);
    }
}
