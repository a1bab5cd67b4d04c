//! Radius-graph clustering (ball-query connected components).
//!
//! Two points are adjacent iff their Euclidean distance is at most `radius`.
//! Clusters are the connected components of that graph. The graph is never
//! materialised: a breadth-first expansion asks the spatial index for the
//! neighbors of each frontier point as it goes.
//!
//! Every point belongs to some component, so this strategy never reports
//! noise; an isolated point is a singleton cluster. Components are numbered in
//! order of their smallest member index, and the resulting partition does not
//! depend on the order the points are given in.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::labeling::{ClusterLabeling, LabelingBuilder};
use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::spatial::{Algorithm, IndexParams, Metric, SpatialIndex, DEFAULT_LEAF_SIZE};

/// Radius-graph clustering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusGraph {
    radius: f64,
    algorithm: Algorithm,
    leaf_size: usize,
}

impl Default for RadiusGraph {
    fn default() -> Self {
        Self::new(0.05)
    }
}

impl RadiusGraph {
    /// Create a clusterer that links points at most `radius` apart.
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            algorithm: Algorithm::Auto,
            leaf_size: DEFAULT_LEAF_SIZE,
        }
    }

    /// Set the linking radius.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Set the index algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the k-d tree leaf size.
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    /// The linking radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    fn validate(&self) -> Result<()> {
        if self.radius.is_nan() || self.radius <= 0.0 {
            return Err(Error::invalid("radius", "must be positive"));
        }
        Ok(())
    }
}

impl Clustering for RadiusGraph {
    fn fit(&self, data: &[Vec<f64>]) -> Result<ClusterLabeling> {
        self.validate()?;
        let index = SpatialIndex::with_params(
            data,
            Metric::Euclidean,
            IndexParams {
                algorithm: self.algorithm,
                leaf_size: self.leaf_size,
            },
        )?;
        tracing::debug!(
            n = index.len(),
            dim = index.dim(),
            radius = self.radius,
            tree = index.uses_tree(),
            "radius graph clustering"
        );

        let labeling = connected_components(&index, self.radius);
        tracing::debug!(clusters = labeling.n_clusters(), "radius graph done");
        Ok(labeling)
    }
}

/// Label the connected components of the `radius`-ball graph over `index`.
pub(crate) fn connected_components(index: &SpatialIndex<'_>, radius: f64) -> ClusterLabeling {
    let n = index.len();
    let mut out = LabelingBuilder::new(n);
    let mut frontier = VecDeque::new();

    for start in 0..n {
        if out.is_assigned(start) {
            continue;
        }
        let cluster = out.open_cluster();
        out.assign(start, cluster);
        frontier.push_back(start);

        while let Some(j) = frontier.pop_front() {
            for k in index.range_query(j, radius) {
                if !out.is_assigned(k) {
                    out.assign(k, cluster);
                    frontier.push_back(k);
                }
            }
        }
    }

    out.finish()
}
