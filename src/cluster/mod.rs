//! Clustering strategies for point clouds.
//!
//! Every strategy here takes a set of points in `R^d` and returns a
//! [`ClusterLabeling`]: each point is in exactly one cluster or in the noise
//! set. Neighborhood queries go through [`crate::spatial::SpatialIndex`].
//!
//! ## Algorithms
//!
//! ### Radius graph
//!
//! Connect every pair of points at most `radius` apart and report the
//! connected components. No density requirement and no noise: an isolated
//! point is a cluster of one. This is the "ball query" grouping used to
//! segment point clouds.
//!
//! ### DBSCAN
//!
//! Density-based clustering that can discover non-convex clusters and identify
//! outliers (noise points). DBSCAN does not require specifying the number of
//! clusters in advance, but a single `eps` has to fit every cluster.
//!
//! ### OPTICS
//!
//! Orders the points so that density-connected points are adjacent and records
//! each point's reachability. The ordering captures clusters at every density
//! at once; flat clusters are then cut out of it either at a fixed distance or
//! with the ξ steep-area method, which adapts to varying density.
//!
//! ## Choosing
//!
//! | | needs | noise | varying density |
//! |---|---|---|---|
//! | [`RadiusGraph`] | `radius` | never | no |
//! | [`Dbscan`] | `eps`, `min_samples` | yes | no |
//! | [`Optics`] | `min_samples` (`max_eps` optional) | yes | yes (ξ) |
//!
//! ## Usage
//!
//! ```rust
//! use pointclump::cluster::{Clustering, Dbscan, ExtractionMode, Optics, RadiusGraph};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![0.2, 0.0],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//!     vec![10.2, 10.0],
//! ];
//!
//! let groups = RadiusGraph::new(0.5).fit(&data).unwrap();
//! assert_eq!(groups.n_clusters(), 2);
//!
//! let labels = Dbscan::new(0.5, 3).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[3]);
//!
//! let optics = Optics::new(3).with_cluster_method(ExtractionMode::distance_threshold(0.5));
//! assert_eq!(optics.fit(&data).unwrap().n_clusters(), 2);
//! ```

mod dbscan;
mod labeling;
mod optics;
mod radius_graph;
mod seeds;
mod traits;
mod xi;

pub use dbscan::{Dbscan, DbscanFit, PointRole};
pub use labeling::{ClusterLabeling, ClusterReport, NOISE};
pub use optics::{
    reachability_ordering, ExtractionMode, MinClusterSize, Optics, OpticsFit, OrderingEntry,
    ReachabilityOrdering,
};
pub use radius_graph::RadiusGraph;
pub use traits::Clustering;
