//! Plane selection strategies for BSP tree construction.
//!
//! The choice of splitting plane affects tree balance and the number of
//! polygon splits during construction.

use crate::{Classification, ConvexPolygon, SplitterStrategy};

/// Strategy for selecting which polygon's plane to use for splitting.
pub trait PlaneSelector {
    /// Select a polygon to split on.
    ///
    /// `candidates` holds the indices into `polygons` that may still act as
    /// splitters. Returns `None` only when `candidates` is empty.
    fn select(
        &self,
        polygons: &[ConvexPolygon],
        candidates: &[usize],
        epsilon: f32,
    ) -> Option<usize>;
}

/// Selects the first candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPolygon;

impl PlaneSelector for FirstPolygon {
    fn select(
        &self,
        _polygons: &[ConvexPolygon],
        candidates: &[usize],
        _epsilon: f32,
    ) -> Option<usize> {
        candidates.first().copied()
    }
}

/// Selects the candidate with the lowest positive [`splitter_score`].
///
/// A score of zero means the candidate separates nothing and is skipped.
/// When no candidate scores above zero the first candidate is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastCost;

impl PlaneSelector for LeastCost {
    fn select(
        &self,
        polygons: &[ConvexPolygon],
        candidates: &[usize],
        epsilon: f32,
    ) -> Option<usize> {
        let fallback = *candidates.first()?;

        let best = candidates
            .iter()
            .map(|&i| (i, splitter_score(polygons, i, epsilon)))
            .filter(|&(_, score)| score > 0)
            .fold(None, |best: Option<(usize, usize)>, (i, score)| match best {
                Some((_, best_score)) if best_score <= score => best,
                _ => Some((i, score)),
            });

        Some(best.map_or(fallback, |(i, _)| i))
    }
}

/// Selector for a configured strategy.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ConfiguredSelector {
    First(FirstPolygon),
    LeastCost(LeastCost),
}

impl From<SplitterStrategy> for ConfiguredSelector {
    fn from(strategy: SplitterStrategy) -> Self {
        match strategy {
            SplitterStrategy::First => Self::First(FirstPolygon),
            SplitterStrategy::LeastCost => Self::LeastCost(LeastCost),
        }
    }
}

impl PlaneSelector for ConfiguredSelector {
    fn select(
        &self,
        polygons: &[ConvexPolygon],
        candidates: &[usize],
        epsilon: f32,
    ) -> Option<usize> {
        match self {
            Self::First(selector) => selector.select(polygons, candidates, epsilon),
            Self::LeastCost(selector) => selector.select(polygons, candidates, epsilon),
        }
    }
}

/// Cost of splitting `polygons` on the plane of `polygons[candidate]`:
/// `2 * spanning + |front - back| + on`, over every other polygon.
pub fn splitter_score(polygons: &[ConvexPolygon], candidate: usize, epsilon: f32) -> usize {
    let plane = polygons[candidate].plane();
    let mut front = 0usize;
    let mut back = 0usize;
    let mut on = 0usize;
    let mut spanning = 0usize;

    for (j, polygon) in polygons.iter().enumerate() {
        if j == candidate {
            continue;
        }
        match polygon.classify(plane, epsilon) {
            Classification::Front => front += 1,
            Classification::Back => back += 1,
            Classification::On => on += 1,
            Classification::Spanning => spanning += 1,
        }
    }

    2 * spanning + front.abs_diff(back) + on
}
