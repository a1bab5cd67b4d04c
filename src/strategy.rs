//! Strategy selection from configuration.
//!
//! [`StrategyConfig`] names one strategy and carries its parameters, so a
//! whole clustering request can be deserialized in one step:
//!
//! ```rust
//! use pointclump::StrategyConfig;
//!
//! let config: StrategyConfig =
//!     serde_json::from_str(r#"{"strategy": "dbscan", "eps": 0.2, "min_samples": 2}"#).unwrap();
//! let report = config
//!     .run(&[vec![0.0, 0.0], vec![0.1, 0.0], vec![9.0, 9.0]])
//!     .unwrap();
//! assert_eq!(report.clusters, vec![vec![0, 1]]);
//! assert_eq!(report.noise, vec![2]);
//! ```
//!
//! Fields left out take the strategy's defaults, and the report echoes the
//! effective configuration: an unset distance-threshold `eps` is reported as
//! the `max_eps` it defaulted to, an unset ξ `min_cluster_size` as the count
//! it resolved to, and an unset Minkowski `p` as 2. An unbounded `max_eps` is
//! reported as `null`.

use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterLabeling, ClusterReport, Clustering, Dbscan, Optics, RadiusGraph};
use crate::error::Result;

/// One clustering strategy and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Connected components of the radius graph.
    #[serde(alias = "ball_query", alias = "ballquery")]
    RadiusGraph(RadiusGraph),
    /// DBSCAN.
    Dbscan(Dbscan),
    /// OPTICS with flat extraction.
    Optics(Optics),
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::RadiusGraph(RadiusGraph::default())
    }
}

impl StrategyConfig {
    /// Wire name of the strategy.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::RadiusGraph(_) => "radius_graph",
            StrategyConfig::Dbscan(_) => "dbscan",
            StrategyConfig::Optics(_) => "optics",
        }
    }

    /// Cluster `points` and echo this configuration in the report.
    pub fn run(&self, points: &[Vec<f64>]) -> Result<ClusterReport<StrategyConfig>> {
        self.report(points)
    }
}

impl Clustering for StrategyConfig {
    fn fit(&self, data: &[Vec<f64>]) -> Result<ClusterLabeling> {
        match self {
            StrategyConfig::RadiusGraph(c) => c.fit(data),
            StrategyConfig::Dbscan(c) => c.fit(data),
            StrategyConfig::Optics(c) => c.fit(data),
        }
    }

    fn effective_params(&self, n_points: usize) -> Result<Self> {
        Ok(match self {
            StrategyConfig::RadiusGraph(c) => c.effective_params(n_points)?.into(),
            StrategyConfig::Dbscan(c) => c.effective_params(n_points)?.into(),
            StrategyConfig::Optics(c) => c.effective_params(n_points)?.into(),
        })
    }
}

impl From<RadiusGraph> for StrategyConfig {
    fn from(c: RadiusGraph) -> Self {
        StrategyConfig::RadiusGraph(c)
    }
}

impl From<Dbscan> for StrategyConfig {
    fn from(c: Dbscan) -> Self {
        StrategyConfig::Dbscan(c)
    }
}

impl From<Optics> for StrategyConfig {
    fn from(c: Optics) -> Self {
        StrategyConfig::Optics(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ExtractionMode, MinClusterSize};
    use crate::error::{Error, ErrorKind};

    fn two_groups() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.05, 0.0],
            vec![0.0, 0.05],
            vec![5.0, 5.0],
            vec![5.05, 5.0],
            vec![5.0, 5.05],
            vec![20.0, 20.0],
        ]
    }

    #[test]
    fn parses_each_strategy_with_defaults() {
        let c: StrategyConfig = serde_json::from_str(r#"{"strategy": "radius_graph"}"#).unwrap();
        assert_eq!(c, StrategyConfig::RadiusGraph(RadiusGraph::default()));

        let c: StrategyConfig =
            serde_json::from_str(r#"{"strategy": "ball_query", "radius": 0.2}"#).unwrap();
        assert_eq!(c, StrategyConfig::RadiusGraph(RadiusGraph::new(0.2)));

        let c: StrategyConfig = serde_json::from_str(r#"{"strategy": "dbscan"}"#).unwrap();
        assert_eq!(c, StrategyConfig::Dbscan(Dbscan::default()));

        let c: StrategyConfig =
            serde_json::from_str(r#"{"strategy": "optics", "min_samples": 3}"#).unwrap();
        assert_eq!(c, StrategyConfig::Optics(Optics::new(3)));
        assert_eq!(c.name(), "optics");
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!(serde_json::from_str::<StrategyConfig>(r#"{"strategy": "kmeans"}"#).is_err());
    }

    #[test]
    fn runs_the_selected_strategy() {
        let data = two_groups();

        let report = StrategyConfig::from(RadiusGraph::new(0.1)).run(&data).unwrap();
        assert_eq!(report.clusters, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
        assert!(report.noise.is_empty());

        let report = StrategyConfig::from(Dbscan::new(0.1, 3)).run(&data).unwrap();
        assert_eq!(report.clusters, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert_eq!(report.noise, vec![6]);

        let optics = Optics::new(3)
            .with_max_eps(1.0)
            .with_cluster_method(ExtractionMode::distance_threshold(0.1));
        let report = StrategyConfig::from(optics.clone()).run(&data).unwrap();
        assert_eq!(report.clusters, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert_eq!(report.noise, vec![6]);
        assert_eq!(report.params, StrategyConfig::Optics(optics));
    }

    #[test]
    fn report_fills_in_defaulted_options() {
        let data = two_groups();

        let threshold = Optics::new(3)
            .with_max_eps(1.0)
            .with_cluster_method(ExtractionMode::DistanceThreshold { eps: None });
        let report = StrategyConfig::from(threshold.clone()).run(&data).unwrap();
        let expected = threshold.with_cluster_method(ExtractionMode::distance_threshold(1.0));
        assert_eq!(report.params, StrategyConfig::Optics(expected));

        let xi = Optics::new(3).with_cluster_method(ExtractionMode::SteepAreas {
            xi: 0.1,
            min_cluster_size: Some(MinClusterSize::Fraction(0.5)),
            predecessor_correction: true,
        });
        let report = StrategyConfig::from(xi.clone()).run(&data).unwrap();
        // ceil(0.5 * 7) = 4
        let expected = xi.with_cluster_method(ExtractionMode::SteepAreas {
            xi: 0.1,
            min_cluster_size: Some(MinClusterSize::Count(4)),
            predecessor_correction: true,
        });
        assert_eq!(report.params, StrategyConfig::Optics(expected));

        let report = StrategyConfig::from(Optics::new(3)).run(&data).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["params"]["cluster_method"]["min_cluster_size"], 3);
        assert_eq!(json["params"]["max_eps"], serde_json::Value::Null);

        let minkowski: StrategyConfig = serde_json::from_str(
            r#"{"strategy": "dbscan", "eps": 0.1, "min_samples": 3, "metric": "minkowski"}"#,
        )
        .unwrap();
        let json = serde_json::to_value(minkowski.run(&data).unwrap()).unwrap();
        assert_eq!(json["params"]["p"], 2.0);
    }

    #[test]
    fn errors_pass_through() {
        let err = StrategyConfig::from(RadiusGraph::new(-1.0))
            .run(&two_groups())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);

        let err = StrategyConfig::default().run(&[]).unwrap_err();
        assert_eq!(err, Error::EmptyInput);
    }
}
