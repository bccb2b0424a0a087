//! Build configuration shared by every stage of the pipeline.

use serde::{Deserialize, Serialize};

use crate::{BuildError, HPBSP_EPSILON};

/// What the BSP builder does with polygons lying on the splitter's own plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoplanarPolygonPolicy {
    /// Drop them once the node is built. They only provide the leaf's cell id.
    #[default]
    Discard,
    /// Carry them into the front subtree as already-used splitters.
    AssignToFront,
    /// Carry them into the back subtree as already-used splitters.
    AssignToBack,
}

/// How the decomposer reacts to a polygon reached from two flood-fill origins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColoringConflictPolicy {
    /// Keep the first id and record a warning.
    #[default]
    Permissive,
    /// Abort the decomposition with an error.
    Strict,
}

/// How a splitting plane is chosen at each BSP node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitterStrategy {
    /// Lowest positive `2 * spanning + |front - back| + on` score.
    #[default]
    LeastCost,
    /// The first candidate in the list.
    First,
}

/// Tunables for tree construction, clipping and decomposition.
///
/// Every field has a default, so a partial JSON document is a valid config:
///
/// ```
/// use portal_bsp::{BuildConfig, ColoringConflictPolicy};
///
/// let config = BuildConfig::from_json_str(r#"{ "coloring_policy": "strict" }"#).unwrap();
/// assert_eq!(config.coloring_policy, ColoringConflictPolicy::Strict);
/// assert_eq!(config.epsilon, portal_bsp::HPBSP_EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Plane classification and vertex welding tolerance.
    pub epsilon: f32,
    /// Fate of polygons coplanar with a node's splitter.
    pub coplanar_policy: CoplanarPolygonPolicy,
    /// Reaction to inconsistent flood-fill colouring.
    pub coloring_policy: ColoringConflictPolicy,
    /// Splitter selection heuristic.
    pub selector: SplitterStrategy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            epsilon: HPBSP_EPSILON,
            coplanar_policy: CoplanarPolygonPolicy::default(),
            coloring_policy: ColoringConflictPolicy::default(),
            selector: SplitterStrategy::default(),
        }
    }
}

impl BuildConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns this config with another coplanar policy.
    pub fn with_coplanar_policy(mut self, policy: CoplanarPolygonPolicy) -> Self {
        self.coplanar_policy = policy;
        self
    }

    /// Returns this config with another colouring conflict policy.
    pub fn with_coloring_policy(mut self, policy: ColoringConflictPolicy) -> Self {
        self.coloring_policy = policy;
        self
    }
}
