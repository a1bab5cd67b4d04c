use serde::{Deserialize, Serialize};

/// Sentinel used by [`ClusterLabeling::to_dense_labels`] for noise points.
pub const NOISE: usize = usize::MAX;

/// Output of every clustering strategy: each point is in exactly one cluster
/// or in the noise set.
///
/// Cluster ids are dense, start at 0, and follow discovery order. Members of a
/// cluster are listed in the order the algorithm claimed them; noise is listed
/// in ascending index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterLabeling {
    labels: Vec<Option<usize>>,
    clusters: Vec<Vec<usize>>,
    noise: Vec<usize>,
}

impl ClusterLabeling {
    /// Number of labelled points.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no points at all.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of clusters found (noise excluded).
    pub fn n_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Cluster of point `index`, `None` for noise.
    pub fn label(&self, index: usize) -> Option<usize> {
        self.labels[index]
    }

    /// Whether point `index` is noise.
    pub fn is_noise(&self, index: usize) -> bool {
        self.labels[index].is_none()
    }

    /// One entry per point, `None` for noise.
    pub fn labels(&self) -> &[Option<usize>] {
        &self.labels
    }

    /// Cluster members, by ascending cluster id.
    pub fn clusters(&self) -> &[Vec<usize>] {
        &self.clusters
    }

    /// Noise points, ascending.
    pub fn noise(&self) -> &[usize] {
        &self.noise
    }

    /// Labels with noise encoded as [`NOISE`].
    pub fn to_dense_labels(&self) -> Vec<usize> {
        self.labels.iter().map(|l| l.unwrap_or(NOISE)).collect()
    }

    /// Split into `(clusters, noise)`.
    pub fn into_parts(self) -> (Vec<Vec<usize>>, Vec<usize>) {
        (self.clusters, self.noise)
    }
}

/// Accumulates cluster assignments as clusters are discovered.
#[derive(Debug, Clone)]
pub(crate) struct LabelingBuilder {
    labels: Vec<Option<usize>>,
    clusters: Vec<Vec<usize>>,
}

impl LabelingBuilder {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            labels: vec![None; n],
            clusters: Vec::new(),
        }
    }

    /// Start a new, empty cluster and return its id.
    pub(crate) fn open_cluster(&mut self) -> usize {
        self.clusters.push(Vec::new());
        self.clusters.len() - 1
    }

    pub(crate) fn assign(&mut self, index: usize, cluster: usize) {
        debug_assert!(self.labels[index].is_none(), "point {index} assigned twice");
        self.labels[index] = Some(cluster);
        self.clusters[cluster].push(index);
    }

    pub(crate) fn is_assigned(&self, index: usize) -> bool {
        self.labels[index].is_some()
    }

    pub(crate) fn finish(self) -> ClusterLabeling {
        self.finish_with_min_size(1)
    }

    /// Demote clusters with fewer than `min_size` members to noise and
    /// renumber the survivors densely, keeping their relative order.
    pub(crate) fn finish_with_min_size(self, min_size: usize) -> ClusterLabeling {
        let mut labels = vec![None; self.labels.len()];
        let mut clusters = Vec::with_capacity(self.clusters.len());
        for members in self.clusters {
            if members.is_empty() || members.len() < min_size {
                continue;
            }
            let id = clusters.len();
            for &i in &members {
                labels[i] = Some(id);
            }
            clusters.push(members);
        }
        let noise = labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.is_none().then_some(i))
            .collect();
        ClusterLabeling {
            labels,
            clusters,
            noise,
        }
    }
}

/// A labeling together with the configuration that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport<P> {
    /// Cluster members, by ascending cluster id.
    pub clusters: Vec<Vec<usize>>,
    /// Noise points, ascending.
    pub noise: Vec<usize>,
    /// Effective configuration.
    pub params: P,
}

impl<P> ClusterReport<P> {
    /// Wrap `labeling` with its configuration.
    pub fn new(labeling: ClusterLabeling, params: P) -> Self {
        let (clusters, noise) = labeling.into_parts();
        Self {
            clusters,
            noise,
            params,
        }
    }
}
