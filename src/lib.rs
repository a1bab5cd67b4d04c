//! Spatial point-cloud clustering.
//!
//! `pointclump` groups points in `R^d` by spatial proximity and density.
//!
//! The primary public API is under [`cluster`], which provides:
//! - radius-graph connected components ("ball query" grouping)
//! - DBSCAN (density clustering with noise, per-point roles)
//! - OPTICS (reachability ordering, with distance-threshold and ξ extraction)
//!
//! All three answer their neighborhood queries through
//! [`spatial::SpatialIndex`], a k-d tree with a linear-scan fallback for
//! metrics the tree cannot prune with. [`StrategyConfig`] selects a strategy
//! from a serialized request.

#![forbid(unsafe_code)]

pub mod cluster;
pub mod error;
pub mod spatial;
pub mod strategy;

pub use cluster::{
    ClusterLabeling, ClusterReport, Clustering, Dbscan, ExtractionMode, Optics, RadiusGraph, NOISE,
};
pub use error::{Error, ErrorKind, Result};
pub use spatial::{Metric, SpatialIndex};
pub use strategy::StrategyConfig;
