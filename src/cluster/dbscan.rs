//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! # The Algorithm (Ester et al., 1996)
//!
//! DBSCAN groups points by neighborhood density. Unlike k-means, it:
//!
//! - Discovers clusters of arbitrary shape
//! - Automatically determines the number of clusters
//! - Identifies noise points (outliers)
//!
//! ## Core Concepts
//!
//! - **Epsilon (ε)**: Maximum distance between two points to be neighbors.
//! - **min_samples**: Neighborhood size (the point itself included) at which a
//!   point becomes "core".
//! - **Core point**: Has at least `min_samples` points within ε.
//! - **Border point**: Within ε of a core point but not core itself.
//! - **Noise point**: Neither core nor border.
//!
//! ## Roles as a state machine
//!
//! Every point starts [`PointRole::Unclassified`]. The outer scan visits points
//! in ascending index order and skips those already in a cluster. A visited
//! point that is core opens a new cluster; one that is not is provisionally
//! [`PointRole::Noise`]. Expansion drains a FIFO queue seeded with the core
//! point's neighborhood (ascending index): each unclaimed point joins the
//! cluster and becomes [`PointRole::Core`] (its own neighborhood is queued) or
//! [`PointRole::Border`], which may promote a provisional noise point. When the
//! scan ends every role is terminal.
//!
//! ## Border ties
//!
//! A border point within ε of core points from two different clusters joins
//! whichever cluster reaches it first. With the fixed scan order above this is
//! deterministic, but it is inherently order-dependent: DBSCAN only defines
//! the core/noise split independently of order.
//!
//! ## Complexity
//!
//! - **Time**: one radius query per point; O(n log n) with the k-d tree for
//!   small ε, O(n²) when ε spans the data.
//! - **Space**: all neighborhoods are computed up front (in parallel), so memory
//!   is proportional to the total neighborhood size.
//!
//! ## References
//!
//! Ester et al. (1996). "A Density-Based Algorithm for Discovering Clusters
//! in Large Spatial Databases with Noise." KDD-96.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::labeling::{ClusterLabeling, LabelingBuilder};
use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::spatial::{Algorithm, IndexParams, Metric, MetricName, SpatialIndex, DEFAULT_LEAF_SIZE};

/// DBSCAN clustering algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dbscan {
    /// Epsilon: maximum distance for neighborhood.
    eps: f64,
    /// Neighborhood size (including the point) for core classification.
    min_samples: usize,
    metric: MetricName,
    /// Minkowski exponent; only read when `metric` is Minkowski.
    p: Option<f64>,
    algorithm: Algorithm,
    leaf_size: usize,
}

/// Role of a point after a DBSCAN pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointRole {
    /// Not looked at yet. Never present in a finished fit.
    Unclassified,
    /// At least `min_samples` points within ε.
    Core,
    /// Not core, but within ε of a core point.
    Border,
    /// Not reachable from any core point.
    Noise,
}

/// Full DBSCAN result: labels plus per-point roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbscanFit {
    /// Cluster assignment.
    pub labeling: ClusterLabeling,
    /// Terminal role of every point.
    pub roles: Vec<PointRole>,
}

impl DbscanFit {
    /// Indices of core points, ascending.
    pub fn core_sample_indices(&self) -> Vec<usize> {
        self.roles
            .iter()
            .enumerate()
            .filter_map(|(i, r)| (*r == PointRole::Core).then_some(i))
            .collect()
    }
}

impl Dbscan {
    /// Create a new DBSCAN clusterer.
    ///
    /// # Arguments
    ///
    /// * `eps` - Maximum distance between two points to be neighbors.
    /// * `min_samples` - Neighborhood size, the point itself included, that makes a point core.
    ///
    /// # Typical Values
    ///
    /// - `eps`: Often read off a k-distance plot (k = min_samples - 1).
    /// - `min_samples`: 2 * dimension is a common heuristic.
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self {
            eps,
            min_samples,
            metric: MetricName::Euclidean,
            p: None,
            algorithm: Algorithm::Auto,
            leaf_size: DEFAULT_LEAF_SIZE,
        }
    }

    /// Set epsilon (neighborhood radius).
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Set the core neighborhood size.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Set the distance metric.
    pub fn with_metric(mut self, metric: MetricName) -> Self {
        self.metric = metric;
        self
    }

    /// Set the Minkowski exponent.
    pub fn with_p(mut self, p: f64) -> Self {
        self.p = Some(p);
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

    /// Neighborhood radius.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Core neighborhood size.
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    fn validate(&self) -> Result<Metric> {
        if self.eps.is_nan() || self.eps <= 0.0 {
            return Err(Error::invalid("eps", "must be positive"));
        }
        if self.min_samples == 0 {
            return Err(Error::invalid("min_samples", "must be at least 1"));
        }
        Metric::resolve(self.metric, self.p)
    }

    /// Run DBSCAN and return labels together with point roles.
    pub fn fit_roles(&self, data: &[Vec<f64>]) -> Result<DbscanFit> {
        let metric = self.validate()?;
        let index = SpatialIndex::with_params(
            data,
            metric,
            IndexParams {
                algorithm: self.algorithm,
                leaf_size: self.leaf_size,
            },
        )?;
        tracing::debug!(
            n = index.len(),
            dim = index.dim(),
            eps = self.eps,
            min_samples = self.min_samples,
            metric = metric.name(),
            "dbscan"
        );

        let fit = expand_clusters(&index, self.eps, self.min_samples);
        tracing::debug!(
            clusters = fit.labeling.n_clusters(),
            noise = fit.labeling.noise().len(),
            "dbscan done"
        );
        Ok(fit)
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(0.5, 5)
    }
}

impl Clustering for Dbscan {
    fn fit(&self, data: &[Vec<f64>]) -> Result<ClusterLabeling> {
        Ok(self.fit_roles(data)?.labeling)
    }

    /// Fills in `p = 2` for an unset Minkowski exponent.
    fn effective_params(&self, _n_points: usize) -> Result<Self> {
        self.validate()?;
        let mut params = self.clone();
        if self.metric == MetricName::Minkowski {
            params.p = self.p.or(Some(2.0));
        }
        Ok(params)
    }
}

fn expand_clusters(index: &SpatialIndex<'_>, eps: f64, min_samples: usize) -> DbscanFit {
    let n = index.len();
    // Neighborhoods include the point itself, ascending by index.
    let neighborhoods = index.range_query_all(eps);
    let is_core: Vec<bool> = neighborhoods.iter().map(|nb| nb.len() >= min_samples).collect();

    let mut roles = vec![PointRole::Unclassified; n];
    let mut out = LabelingBuilder::new(n);
    let mut queue: VecDeque<usize> = VecDeque::new();

    for point_idx in 0..n {
        if out.is_assigned(point_idx) {
            continue;
        }
        if !is_core[point_idx] {
            // Provisional: a later cluster may still claim it as a border point.
            roles[point_idx] = PointRole::Noise;
            continue;
        }

        let cluster = out.open_cluster();
        tracing::trace!(cluster, seed = point_idx, "opened cluster");
        roles[point_idx] = PointRole::Core;
        out.assign(point_idx, cluster);
        queue.extend(neighborhoods[point_idx].iter().copied());

        while let Some(neighbor_idx) = queue.pop_front() {
            if out.is_assigned(neighbor_idx) {
                continue;
            }
            out.assign(neighbor_idx, cluster);
            if is_core[neighbor_idx] {
                roles[neighbor_idx] = PointRole::Core;
                queue.extend(
                    neighborhoods[neighbor_idx]
                        .iter()
                        .copied()
                        .filter(|&k| !out.is_assigned(k)),
                );
            } else {
                roles[neighbor_idx] = PointRole::Border;
            }
        }
    }

    DbscanFit {
        labeling: out.finish(),
        roles,
    }
}
