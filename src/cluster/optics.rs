//! OPTICS: Ordering Points To Identify the Clustering Structure.
//!
//! OPTICS (Ankerst et al., 1999) does not cut the data into clusters directly.
//! It produces a *reachability ordering*: a permutation of the points in which
//! density-connected points sit next to each other, annotated with how hard
//! each point was to reach from the ones before it. Valleys in the
//! reachability plot are clusters; peaks separate them.
//!
//! # Ordering
//!
//! - **Core distance** of a point: distance to its `min_samples`-th nearest
//!   point (the point itself counts as the first), or undefined if that is
//!   beyond `max_eps`.
//! - **Reachability** of `q` from a core point `p`: `max(core(p), d(p, q))`.
//!
//! Points are taken in ascending index order whenever the seed set is empty.
//! Processing a core point offers every unprocessed neighbor within `max_eps`
//! its reachability from that point; a neighbor's reachability only ever goes
//! down. The next point processed is always the seed with the smallest
//! reachability (ties to the smaller index), held in an indexed min-heap with
//! decrease-key.
//!
//! # Flat extraction
//!
//! - [`ExtractionMode::DistanceThreshold`]: a horizontal cut of the plot at
//!   `eps`, equivalent to DBSCAN with that radius up to border assignment.
//! - [`ExtractionMode::SteepAreas`]: the ξ steep-area method.
//!
//! # References
//!
//! Ankerst, Breunig, Kriegel, Sander (1999). "OPTICS: Ordering Points To
//! Identify the Clustering Structure." SIGMOD '99.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::labeling::{ClusterLabeling, LabelingBuilder};
use super::seeds::SeedQueue;
use super::traits::Clustering;
use super::xi;
use crate::error::{Error, Result};
use crate::spatial::{Algorithm, IndexParams, Metric, MetricName, SpatialIndex, DEFAULT_LEAF_SIZE};

fn default_xi() -> f64 {
    0.05
}

fn default_true() -> bool {
    true
}

/// Minimum size of a ξ cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinClusterSize {
    /// Absolute number of points (at least 1).
    Count(usize),
    /// Fraction of the point set in `(0, 1]`, rounded up and floored at 2.
    Fraction(f64),
}

impl MinClusterSize {
    fn resolve(self, n: usize) -> Result<usize> {
        match self {
            MinClusterSize::Count(0) => {
                Err(Error::invalid("min_cluster_size", "must be at least 1"))
            }
            MinClusterSize::Count(c) => Ok(c),
            MinClusterSize::Fraction(f) if f > 0.0 && f <= 1.0 => {
                Ok(((f * n as f64).ceil() as usize).max(2))
            }
            MinClusterSize::Fraction(_) => Err(Error::invalid(
                "min_cluster_size",
                "a fractional size must lie in (0, 1]",
            )),
        }
    }
}

/// How to cut a reachability ordering into flat clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Cut the reachability plot at `eps` (defaults to `max_eps`).
    #[serde(alias = "dbscan")]
    DistanceThreshold {
        /// Cut height.
        #[serde(default)]
        eps: Option<f64>,
    },
    /// ξ steep-area extraction.
    #[serde(alias = "xi")]
    SteepAreas {
        /// Minimum relative steepness, in `(0, 1)`.
        #[serde(default = "default_xi")]
        xi: f64,
        /// Minimum cluster size; defaults to `min_samples`.
        #[serde(default)]
        min_cluster_size: Option<MinClusterSize>,
        /// Trim cluster ends not connected to the cluster through their predecessor.
        #[serde(default = "default_true")]
        predecessor_correction: bool,
    },
}

impl Default for ExtractionMode {
    fn default() -> Self {
        ExtractionMode::SteepAreas {
            xi: default_xi(),
            min_cluster_size: None,
            predecessor_correction: true,
        }
    }
}

impl ExtractionMode {
    /// Cut at a fixed reachability.
    pub fn distance_threshold(eps: f64) -> Self {
        ExtractionMode::DistanceThreshold { eps: Some(eps) }
    }

    /// ξ extraction with the given steepness and default size settings.
    pub fn steep_areas(xi: f64) -> Self {
        ExtractionMode::SteepAreas {
            xi,
            min_cluster_size: None,
            predecessor_correction: true,
        }
    }
}

/// An [`ExtractionMode`] with defaults filled in and ranges checked.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Cut {
    Threshold(f64),
    Xi {
        xi: f64,
        min_cluster_size: usize,
        predecessor_correction: bool,
    },
}

impl ExtractionMode {
    fn resolve(&self, n: usize, min_samples: usize, max_eps: f64) -> Result<Cut> {
        match *self {
            ExtractionMode::DistanceThreshold { eps } => {
                let eps = eps.unwrap_or(max_eps);
                if eps.is_nan() || eps <= 0.0 {
                    return Err(Error::invalid("eps", "must be positive"));
                }
                if eps.is_infinite() {
                    return Err(Error::invalid("eps", "must be finite; set eps or max_eps"));
                }
                if eps > max_eps {
                    return Err(Error::invalid("eps", "must not exceed max_eps"));
                }
                Ok(Cut::Threshold(eps))
            }
            ExtractionMode::SteepAreas {
                xi,
                min_cluster_size,
                predecessor_correction,
            } => {
                if xi.is_nan() || xi <= 0.0 || xi >= 1.0 {
                    return Err(Error::invalid("xi", "must lie in (0, 1)"));
                }
                let min_cluster_size = match min_cluster_size {
                    Some(size) => size.resolve(n)?,
                    None => min_samples,
                };
                Ok(Cut::Xi {
                    xi,
                    min_cluster_size,
                    predecessor_correction,
                })
            }
        }
    }

    /// This mode with its defaults filled in for `n` points.
    fn effective(&self, n: usize, min_samples: usize, max_eps: f64) -> Result<Self> {
        Ok(match self.resolve(n, min_samples, max_eps)? {
            Cut::Threshold(eps) => ExtractionMode::distance_threshold(eps),
            Cut::Xi {
                xi,
                min_cluster_size,
                predecessor_correction,
            } => ExtractionMode::SteepAreas {
                xi,
                min_cluster_size: Some(MinClusterSize::Count(min_cluster_size)),
                predecessor_correction,
            },
        })
    }
}

/// One position of a reachability ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderingEntry {
    pub(crate) index: usize,
    pub(crate) reachability: f64,
    pub(crate) core_distance: f64,
    pub(crate) predecessor: Option<usize>,
}

impl OrderingEntry {
    /// Index of the point in the input.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Reachability when the point was appended; `None` for the first point
    /// of every density-connected run.
    pub fn reachability_distance(&self) -> Option<f64> {
        self.reachability.is_finite().then_some(self.reachability)
    }

    /// Core distance; `None` if fewer than `min_samples` points lie within `max_eps`.
    pub fn core_distance(&self) -> Option<f64> {
        self.core_distance.is_finite().then_some(self.core_distance)
    }

    /// The point whose expansion last lowered this point's reachability.
    pub fn predecessor(&self) -> Option<usize> {
        self.predecessor
    }
}

/// A reachability ordering covering every input point exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachabilityOrdering {
    entries: Vec<OrderingEntry>,
    min_samples: usize,
    max_eps: f64,
}

impl ReachabilityOrdering {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ordering is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ordering position.
    pub fn entries(&self) -> &[OrderingEntry] {
        &self.entries
    }

    /// Point indices in ordering position.
    pub fn indices(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.index).collect()
    }

    /// Reachability per ordering position, with undefined values as infinity.
    pub fn reachability_plot(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.reachability).collect()
    }

    /// `min_samples` the ordering was built with.
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// `max_eps` the ordering was built with (infinite if unbounded).
    pub fn max_eps(&self) -> f64 {
        self.max_eps
    }

    /// Cut the ordering into flat clusters.
    pub fn extract_flat(&self, mode: &ExtractionMode) -> Result<ClusterLabeling> {
        Ok(self.extract(mode)?.0)
    }

    fn extract(
        &self,
        mode: &ExtractionMode,
    ) -> Result<(ClusterLabeling, Option<Vec<(usize, usize)>>)> {
        match mode.resolve(self.len(), self.min_samples, self.max_eps)? {
            Cut::Threshold(eps) => Ok((self.extract_distance_threshold(eps), None)),
            Cut::Xi {
                xi,
                min_cluster_size,
                predecessor_correction,
            } => {
                let found = xi::extract(self, xi, min_cluster_size, predecessor_correction);
                Ok((found.labeling, Some(found.hierarchy)))
            }
        }
    }

    /// Horizontal cut at `eps`.
    ///
    /// A point whose reachability exceeds `eps` starts a new cluster if its
    /// core distance is within `eps` and is noise otherwise; every other point
    /// joins the current cluster. Clusters smaller than `min_samples` become
    /// noise.
    pub fn extract_distance_threshold(&self, eps: f64) -> ClusterLabeling {
        let mut out = LabelingBuilder::new(self.len());
        let mut current = None;
        for e in &self.entries {
            if e.reachability > eps {
                if e.core_distance <= eps {
                    let cluster = out.open_cluster();
                    out.assign(e.index, cluster);
                    current = Some(cluster);
                }
            } else if let Some(cluster) = current {
                out.assign(e.index, cluster);
            }
        }
        out.finish_with_min_size(self.min_samples)
    }
}

/// OPTICS clustering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Optics {
    min_samples: usize,
    /// Neighborhood bound; `None` is unbounded.
    max_eps: Option<f64>,
    metric: MetricName,
    p: Option<f64>,
    cluster_method: ExtractionMode,
    algorithm: Algorithm,
    leaf_size: usize,
}

impl Default for Optics {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Full OPTICS result.
#[derive(Debug, Clone, PartialEq)]
pub struct OpticsFit {
    /// The reachability ordering.
    pub ordering: ReachabilityOrdering,
    /// Flat clusters from the configured extraction.
    pub labeling: ClusterLabeling,
    /// ξ candidate clusters as inclusive ordering-position intervals, in the
    /// order they were found (absent for distance-threshold extraction).
    pub hierarchy: Option<Vec<(usize, usize)>>,
}

impl Optics {
    /// Create an OPTICS clusterer with unbounded `max_eps`, Euclidean
    /// (Minkowski p = 2) distance, and ξ = 0.05 extraction.
    pub fn new(min_samples: usize) -> Self {
        Self {
            min_samples,
            max_eps: None,
            metric: MetricName::Minkowski,
            p: Some(2.0),
            cluster_method: ExtractionMode::default(),
            algorithm: Algorithm::Auto,
            leaf_size: DEFAULT_LEAF_SIZE,
        }
    }

    /// Set the core neighborhood size.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Bound neighborhood queries to `max_eps`.
    pub fn with_max_eps(mut self, max_eps: f64) -> Self {
        self.max_eps = Some(max_eps);
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

    /// Set the flat extraction.
    pub fn with_cluster_method(mut self, mode: ExtractionMode) -> Self {
        self.cluster_method = mode;
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

    /// The configured extraction.
    pub fn cluster_method(&self) -> &ExtractionMode {
        &self.cluster_method
    }

    fn validate(&self) -> Result<(Metric, f64)> {
        if self.min_samples == 0 {
            return Err(Error::invalid("min_samples", "must be at least 1"));
        }
        let max_eps = self.max_eps.unwrap_or(f64::INFINITY);
        if max_eps.is_nan() || max_eps <= 0.0 {
            return Err(Error::invalid("max_eps", "must be positive"));
        }
        Ok((Metric::resolve(self.metric, self.p)?, max_eps))
    }

    /// Compute the reachability ordering only.
    pub fn order(&self, data: &[Vec<f64>]) -> Result<ReachabilityOrdering> {
        let (metric, max_eps) = self.validate()?;
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
            min_samples = self.min_samples,
            max_eps,
            metric = metric.name(),
            "optics ordering"
        );
        Ok(reachability_ordering(&index, self.min_samples, max_eps))
    }

    /// Ordering, flat labels, and (for ξ) the candidate hierarchy.
    pub fn fit_full(&self, data: &[Vec<f64>]) -> Result<OpticsFit> {
        // Check extraction parameters before doing any work.
        let (_, max_eps) = self.validate()?;
        self.cluster_method.resolve(data.len(), self.min_samples, max_eps)?;

        let ordering = self.order(data)?;
        let (labeling, hierarchy) = ordering.extract(&self.cluster_method)?;
        tracing::debug!(
            clusters = labeling.n_clusters(),
            noise = labeling.noise().len(),
            "optics done"
        );
        Ok(OpticsFit {
            ordering,
            labeling,
            hierarchy,
        })
    }
}

impl Clustering for Optics {
    fn fit(&self, data: &[Vec<f64>]) -> Result<ClusterLabeling> {
        Ok(self.fit_full(data)?.labeling)
    }

    /// Fills in the Minkowski exponent, the distance-threshold `eps` and the
    /// ξ `min_cluster_size` (as a count). An unbounded `max_eps` stays `None`.
    fn effective_params(&self, n_points: usize) -> Result<Self> {
        let (_, max_eps) = self.validate()?;
        let mut params = self.clone();
        if self.metric == MetricName::Minkowski {
            params.p = self.p.or(Some(2.0));
        }
        params.cluster_method = self
            .cluster_method
            .effective(n_points, self.min_samples, max_eps)?;
        Ok(params)
    }
}

fn core_distance(index: &SpatialIndex<'_>, point: usize, min_samples: usize, max_eps: f64) -> f64 {
    if min_samples <= 1 {
        return 0.0;
    }
    let nearest = index.k_nearest(point, min_samples - 1);
    match nearest.last() {
        Some(n) if nearest.len() == min_samples - 1 && n.distance <= max_eps => n.distance,
        _ => f64::INFINITY,
    }
}

/// Build the reachability ordering over `index`.
pub fn reachability_ordering(
    index: &SpatialIndex<'_>,
    min_samples: usize,
    max_eps: f64,
) -> ReachabilityOrdering {
    let n = index.len();
    let core: Vec<f64> = (0..n)
        .into_par_iter()
        .map(|i| core_distance(index, i, min_samples, max_eps))
        .collect();

    let mut reachability = vec![f64::INFINITY; n];
    let mut predecessor = vec![None; n];
    let mut processed = vec![false; n];
    let mut seeds = SeedQueue::new(n);
    let mut entries = Vec::with_capacity(n);

    for start in 0..n {
        if processed[start] {
            continue;
        }
        tracing::trace!(start, "new density-connected run");

        let mut next = Some(start);
        while let Some(point) = next {
            processed[point] = true;
            entries.push(OrderingEntry {
                index: point,
                reachability: reachability[point],
                core_distance: core[point],
                predecessor: predecessor[point],
            });

            if core[point].is_finite() {
                for neighbor in index.range_neighbors(point, max_eps) {
                    let q = neighbor.index;
                    if processed[q] {
                        continue;
                    }
                    let candidate = core[point].max(neighbor.distance);
                    if candidate < reachability[q] {
                        reachability[q] = candidate;
                        predecessor[q] = Some(point);
                        seeds.push_or_decrease(q, candidate);
                    }
                }
            }

            next = seeds.pop_min();
        }
    }

    ReachabilityOrdering {
        entries,
        min_samples,
        max_eps,
    }
}
