use super::labeling::{ClusterLabeling, ClusterReport};
use crate::error::Result;

/// Common interface for the clustering strategies (one label per point, noise allowed).
pub trait Clustering {
    /// Partition `data` into clusters and noise.
    fn fit(&self, data: &[Vec<f64>]) -> Result<ClusterLabeling>;

    /// One label per input point, `None` for noise.
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<Option<usize>>> {
        Ok(self.fit(data)?.labels().to_vec())
    }

    /// This configuration with every defaulted option filled in, as it
    /// applies to `n_points` points.
    fn effective_params(&self, _n_points: usize) -> Result<Self>
    where
        Self: Clone + Sized,
    {
        Ok(self.clone())
    }

    /// Fit and echo the effective configuration alongside the result.
    fn report(&self, data: &[Vec<f64>]) -> Result<ClusterReport<Self>>
    where
        Self: Clone + Sized,
    {
        let labeling = self.fit(data)?;
        Ok(ClusterReport::new(labeling, self.effective_params(data.len())?))
    }
}
