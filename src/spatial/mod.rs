//! Spatial indexing for radius and k-nearest-neighbor queries.
//!
//! [`SpatialIndex`] is built once over a borrowed point set and answers exact
//! queries about the points it was built from:
//!
//! - [`SpatialIndex::range_query`]: every point within a radius of a given point
//! - [`SpatialIndex::k_nearest`]: the `k` closest other points
//!
//! ## Tree vs. linear scan
//!
//! For the Minkowski family with `p >= 1` the index is a median-split k-d tree
//! and queries prune whole subtrees by bounding box. Cosine, haversine, and
//! Minkowski with `p < 1` have no usable box bound, so the index falls back to
//! scanning every point (O(N) per query). The fallback is explicit: it is
//! logged at `debug` level, reported by [`SpatialIndex::uses_tree`], and
//! requesting [`Algorithm::KdTree`] with such a metric fails with
//! [`Error::UnsupportedMetric`] instead of silently degrading.

mod kdtree;
mod metric;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use kdtree::KdTree;

pub use metric::{Metric, MetricName};

/// Default maximum number of points per k-d tree leaf.
pub const DEFAULT_LEAF_SIZE: usize = 30;

/// A query hit: point index and its distance to the query point.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    /// Index into the point set.
    pub index: usize,
    /// Distance to the query point.
    pub distance: f64,
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    /// Ascending distance, ties broken by ascending index.
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// How the index answers queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// k-d tree when the metric allows pruning and the set is larger than
    /// one leaf; linear scan otherwise.
    #[default]
    Auto,
    /// Always a k-d tree; unsupported metrics are an error.
    #[serde(alias = "kdtree")]
    KdTree,
    /// Always a linear scan.
    Brute,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Auto => "auto",
            Algorithm::KdTree => "kd_tree",
            Algorithm::Brute => "brute",
        })
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Algorithm::Auto),
            "kd_tree" | "kdtree" => Ok(Algorithm::KdTree),
            "brute" => Ok(Algorithm::Brute),
            _ => Err(Error::UnknownName {
                what: "algorithm",
                name: s.to_string(),
            }),
        }
    }
}

/// Index construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexParams {
    /// Tree or linear scan.
    pub algorithm: Algorithm,
    /// Maximum points per tree leaf.
    pub leaf_size: usize,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Auto,
            leaf_size: DEFAULT_LEAF_SIZE,
        }
    }
}

impl IndexParams {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.leaf_size == 0 {
            return Err(Error::invalid("leaf_size", "must be at least 1"));
        }
        Ok(())
    }
}

/// Check that `points` is non-empty, uniformly dimensioned, and finite.
///
/// Returns the common dimension.
pub fn validate_points(points: &[Vec<f64>]) -> Result<usize> {
    let first = points.first().ok_or(Error::EmptyInput)?;
    let dim = first.len();
    if dim == 0 {
        return Err(Error::ZeroDimension);
    }
    for (index, point) in points.iter().enumerate() {
        if point.len() != dim {
            return Err(Error::DimensionMismatch {
                index,
                expected: dim,
                found: point.len(),
            });
        }
        if let Some(axis) = point.iter().position(|x| !x.is_finite()) {
            return Err(Error::NonFiniteCoordinate { index, axis });
        }
    }
    Ok(dim)
}

/// Exact radius and k-nearest queries over a fixed point set.
#[derive(Debug, Clone)]
pub struct SpatialIndex<'a> {
    points: &'a [Vec<f64>],
    metric: Metric,
    dim: usize,
    tree: Option<KdTree>,
}

impl<'a> SpatialIndex<'a> {
    /// Build with default [`IndexParams`].
    pub fn build(points: &'a [Vec<f64>], metric: Metric) -> Result<Self> {
        Self::with_params(points, metric, IndexParams::default())
    }

    /// Build with explicit options.
    ///
    /// Fails with an input error for empty, ragged, or non-finite points, and
    /// with [`Error::UnsupportedMetric`] if `params` asks for a tree the metric
    /// cannot prune.
    pub fn with_params(
        points: &'a [Vec<f64>],
        metric: Metric,
        params: IndexParams,
    ) -> Result<Self> {
        let dim = validate_points(points)?;
        params.validate()?;
        metric.check_dimension(dim)?;

        let use_tree = match params.algorithm {
            Algorithm::Brute => false,
            Algorithm::KdTree => {
                if !metric.supports_pruning() {
                    return Err(Error::UnsupportedMetric {
                        metric: metric.name(),
                        reason: "k-d tree pruning needs a Minkowski norm with p >= 1",
                    });
                }
                true
            }
            Algorithm::Auto => {
                if !metric.supports_pruning() {
                    tracing::debug!(
                        metric = metric.name(),
                        n = points.len(),
                        "metric has no bounding-box lower bound; using linear scan"
                    );
                }
                metric.supports_pruning() && points.len() > params.leaf_size
            }
        };

        let tree = use_tree.then(|| KdTree::build(points, params.leaf_size));
        Ok(Self {
            points,
            metric,
            dim,
            tree,
        })
    }

    /// Number of indexed points (always at least 1).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: an index cannot be built over an empty set.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Common dimension of the points.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The metric queries are answered under.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Whether queries go through the k-d tree rather than a linear scan.
    pub fn uses_tree(&self) -> bool {
        self.tree.is_some()
    }

    /// The borrowed point set.
    pub fn points(&self) -> &'a [Vec<f64>] {
        self.points
    }

    /// Distance between two indexed points.
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        self.metric.distance(&self.points[a], &self.points[b])
    }

    /// Indices within `radius` of point `center`, ascending.
    ///
    /// `center` itself is always part of the result.
    ///
    /// # Panics
    ///
    /// If `center >= self.len()`.
    pub fn range_query(&self, center: usize, radius: f64) -> Vec<usize> {
        let mut hits: Vec<usize> = self
            .collect_within(center, radius)
            .into_iter()
            .map(|n| n.index)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Points within `radius` of point `center` with their distances,
    /// ascending by (distance, index). `center` is included at distance 0.
    pub fn range_neighbors(&self, center: usize, radius: f64) -> Vec<Neighbor> {
        let mut hits = self.collect_within(center, radius);
        hits.sort_unstable();
        hits
    }

    /// The `k` nearest points to `center`, excluding `center` itself.
    ///
    /// Ascending by distance with ties broken by ascending index; the result
    /// holds `min(k, N - 1)` entries. Other points that coincide with `center`
    /// are returned at distance 0.
    pub fn k_nearest(&self, center: usize, k: usize) -> Vec<Neighbor> {
        let query = &self.points[center];
        match &self.tree {
            Some(tree) => tree.nearest(self.points, &self.metric, query, k, center),
            None => {
                let mut all: Vec<Neighbor> = self
                    .points
                    .iter()
                    .enumerate()
                    .filter(|&(index, _)| index != center)
                    .map(|(index, p)| Neighbor {
                        index,
                        distance: self.metric.distance(query, p),
                    })
                    .collect();
                all.sort_unstable();
                all.truncate(k);
                all
            }
        }
    }

    /// [`range_query`](Self::range_query) for every point, computed in parallel.
    pub fn range_query_all(&self, radius: f64) -> Vec<Vec<usize>> {
        (0..self.len())
            .into_par_iter()
            .map(|i| self.range_query(i, radius))
            .collect()
    }

    fn collect_within(&self, center: usize, radius: f64) -> Vec<Neighbor> {
        let query = &self.points[center];
        let mut hits = Vec::new();
        match &self.tree {
            Some(tree) => tree.within(self.points, &self.metric, query, radius, &mut hits),
            None => hits.extend(self.points.iter().enumerate().filter_map(|(index, p)| {
                let distance = self.metric.distance(query, p);
                (distance <= radius).then_some(Neighbor { index, distance })
            })),
        }
        hits
    }
}
