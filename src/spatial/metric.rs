//! Distance functions over fixed-dimension vectors.
//!
//! Every metric here is non-negative, symmetric, and zero exactly on equal
//! inputs. Only the Minkowski family with `p >= 1` is a norm, which is what the
//! k-d tree needs to bound the distance from a query to a bounding box; the
//! others (cosine, haversine, Minkowski with `p < 1`) are served by a linear
//! scan.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Metric names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    /// L2 distance.
    #[serde(alias = "l2")]
    Euclidean,
    /// L1 distance.
    #[serde(alias = "cityblock", alias = "l1")]
    Manhattan,
    /// L-infinity distance.
    #[serde(alias = "infinity")]
    Chebyshev,
    /// Lp distance; the exponent comes from the separate `p` parameter.
    Minkowski,
    /// One minus cosine similarity.
    Cosine,
    /// Great-circle distance on the unit sphere, points given as
    /// `[latitude, longitude]` in radians.
    Haversine,
}

impl MetricName {
    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricName::Euclidean => "euclidean",
            MetricName::Manhattan => "manhattan",
            MetricName::Chebyshev => "chebyshev",
            MetricName::Minkowski => "minkowski",
            MetricName::Cosine => "cosine",
            MetricName::Haversine => "haversine",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(MetricName::Euclidean),
            "manhattan" | "cityblock" | "l1" => Ok(MetricName::Manhattan),
            "chebyshev" | "infinity" => Ok(MetricName::Chebyshev),
            "minkowski" => Ok(MetricName::Minkowski),
            "cosine" => Ok(MetricName::Cosine),
            "haversine" => Ok(MetricName::Haversine),
            _ => Err(Error::UnknownName {
                what: "metric",
                name: s.to_string(),
            }),
        }
    }
}

/// A resolved distance function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    /// L2 distance.
    Euclidean,
    /// L1 distance.
    Manhattan,
    /// L-infinity distance.
    Chebyshev,
    /// Lp distance for an exponent other than 1, 2, or infinity.
    Minkowski(f64),
    /// One minus cosine similarity.
    Cosine,
    /// Great-circle distance on the unit sphere.
    Haversine,
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Euclidean
    }
}

impl Metric {
    /// Resolve a configured name and optional exponent into a metric.
    ///
    /// `p` is only read for [`MetricName::Minkowski`], where it defaults to 2.
    /// Exponents 1, 2 and infinity collapse onto their dedicated variants.
    pub fn resolve(name: MetricName, p: Option<f64>) -> Result<Self> {
        match name {
            MetricName::Euclidean => Ok(Metric::Euclidean),
            MetricName::Manhattan => Ok(Metric::Manhattan),
            MetricName::Chebyshev => Ok(Metric::Chebyshev),
            MetricName::Cosine => Ok(Metric::Cosine),
            MetricName::Haversine => Ok(Metric::Haversine),
            MetricName::Minkowski => Metric::minkowski(p.unwrap_or(2.0)),
        }
    }

    /// Minkowski distance with exponent `p`.
    pub fn minkowski(p: f64) -> Result<Self> {
        if p.is_nan() || p <= 0.0 {
            return Err(Error::invalid("p", "must be positive"));
        }
        Ok(if p == 1.0 {
            Metric::Manhattan
        } else if p == 2.0 {
            Metric::Euclidean
        } else if p.is_infinite() {
            Metric::Chebyshev
        } else {
            Metric::Minkowski(p)
        })
    }

    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
            Metric::Chebyshev => "chebyshev",
            Metric::Minkowski(_) => "minkowski",
            Metric::Cosine => "cosine",
            Metric::Haversine => "haversine",
        }
    }

    /// Whether the metric is a norm of the coordinate difference.
    ///
    /// Norms are monotone in every per-axis gap, so the norm of the gaps to a
    /// bounding box is a lower bound on the distance to anything inside it.
    pub fn supports_pruning(&self) -> bool {
        match self {
            Metric::Euclidean | Metric::Manhattan | Metric::Chebyshev => true,
            Metric::Minkowski(p) => *p >= 1.0,
            Metric::Cosine | Metric::Haversine => false,
        }
    }

    /// Reject dimensionalities the metric is undefined for.
    pub fn check_dimension(&self, dim: usize) -> Result<()> {
        if matches!(self, Metric::Haversine) && dim != 2 {
            return Err(Error::UnsupportedMetric {
                metric: "haversine",
                reason: "requires 2-D [latitude, longitude] points",
            });
        }
        Ok(())
    }

    /// Distance between two points of equal length.
    #[inline]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Metric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| {
                    let d = x - y;
                    d * d
                })
                .sum::<f64>()
                .sqrt(),
            Metric::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
            Metric::Chebyshev => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y).abs())
                .fold(0.0, f64::max),
            Metric::Minkowski(p) => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y).abs().powf(*p))
                .sum::<f64>()
                .powf(1.0 / p),
            Metric::Cosine => cosine_distance(a, b),
            Metric::Haversine => haversine_distance(a, b),
        }
    }

    /// Lower bound on the distance from `point` to any point in the box
    /// `[lo, hi]`. Only meaningful when [`Metric::supports_pruning`] holds.
    #[inline]
    pub(crate) fn min_distance_to_box(&self, point: &[f64], lo: &[f64], hi: &[f64]) -> f64 {
        let gaps = point
            .iter()
            .zip(lo.iter().zip(hi))
            .map(|(&x, (&l, &h))| (l - x).max(x - h).max(0.0));
        match self {
            Metric::Euclidean => gaps.map(|g| g * g).sum::<f64>().sqrt(),
            Metric::Manhattan => gaps.sum(),
            Metric::Chebyshev => gaps.fold(0.0, f64::max),
            Metric::Minkowski(p) => gaps.map(|g| g.powf(*p)).sum::<f64>().powf(1.0 / p),
            Metric::Cosine | Metric::Haversine => 0.0,
        }
    }
}

fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut na = 0.0;
    let mut nb = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 && nb == 0.0 {
        return 0.0;
    }
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    (1.0 - dot / (na.sqrt() * nb.sqrt())).clamp(0.0, 2.0)
}

fn haversine_distance(a: &[f64], b: &[f64]) -> f64 {
    let (lat1, lon1) = (a[0], a[1]);
    let (lat2, lon2) = (b[0], b[1]);
    let s_lat = ((lat2 - lat1) / 2.0).sin();
    let s_lon = ((lon2 - lon1) / 2.0).sin();
    let h = s_lat * s_lat + lat1.cos() * lat2.cos() * s_lon * s_lon;
    2.0 * h.clamp(0.0, 1.0).sqrt().asin()
}
