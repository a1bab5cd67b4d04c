use std::collections::BTreeSet;

use pointclump::cluster::{
    ClusterLabeling, Clustering, Dbscan, ExtractionMode, Optics, OrderingEntry, PointRole,
    RadiusGraph,
};
use proptest::prelude::*;

fn points(max_len: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 2), 1..max_len)
}

fn assert_partition(labels: &ClusterLabeling, n: usize) -> Result<(), TestCaseError> {
    prop_assert_eq!(labels.len(), n);
    let mut seen = vec![false; n];
    for (id, members) in labels.clusters().iter().enumerate() {
        prop_assert!(!members.is_empty());
        for &i in members {
            prop_assert!(!seen[i], "point {} listed twice", i);
            seen[i] = true;
            prop_assert_eq!(labels.label(i), Some(id));
        }
    }
    for &i in labels.noise() {
        prop_assert!(!seen[i], "noise point {} also in a cluster", i);
        seen[i] = true;
        prop_assert_eq!(labels.label(i), None);
    }
    prop_assert!(seen.iter().all(|&s| s));
    Ok(())
}

/// Ordering position of every point.
fn positions(entries: &[OrderingEntry]) -> Vec<usize> {
    let mut position = vec![0; entries.len()];
    for (pos, e) in entries.iter().enumerate() {
        position[e.index()] = pos;
    }
    position
}

/// Clusters as sets of original indices, order-free.
fn as_sets(clusters: &[Vec<usize>], back: impl Fn(usize) -> usize) -> BTreeSet<BTreeSet<usize>> {
    clusters
        .iter()
        .map(|c| c.iter().map(|&i| back(i)).collect())
        .collect()
}

proptest! {
    #[test]
    fn prop_every_strategy_partitions(
        data in points(40),
        r in 0.1f64..5.0,
        min_samples in 1usize..6,
    ) {
        let n = data.len();
        assert_partition(&RadiusGraph::new(r).fit(&data).unwrap(), n)?;
        assert_partition(&Dbscan::new(r, min_samples).fit(&data).unwrap(), n)?;

        let threshold = Optics::new(min_samples)
            .with_cluster_method(ExtractionMode::distance_threshold(r));
        assert_partition(&threshold.fit(&data).unwrap(), n)?;
        assert_partition(&Optics::new(min_samples).fit(&data).unwrap(), n)?;
    }

    #[test]
    fn prop_radius_graph_has_no_noise(data in points(40), r in 0.1f64..5.0) {
        let labels = RadiusGraph::new(r).fit(&data).unwrap();
        prop_assert!(labels.noise().is_empty());
    }

    #[test]
    fn prop_radius_graph_ignores_input_order(
        (data, perm) in points(30).prop_flat_map(|d| {
            let n = d.len();
            (Just(d), Just((0..n).collect::<Vec<_>>()).prop_shuffle())
        }),
        r in 0.1f64..5.0,
    ) {
        // shuffled[k] = data[perm[k]]
        let shuffled: Vec<Vec<f64>> = perm.iter().map(|&i| data[i].clone()).collect();
        let a = RadiusGraph::new(r).fit(&data).unwrap();
        let b = RadiusGraph::new(r).fit(&shuffled).unwrap();
        prop_assert_eq!(as_sets(a.clusters(), |i| i), as_sets(b.clusters(), |k| perm[k]));
    }

    #[test]
    fn prop_dbscan_grows_with_eps(
        data in points(40),
        eps in 0.1f64..3.0,
        extra in 0.0f64..3.0,
        min_samples in 1usize..6,
    ) {
        let small = Dbscan::new(eps, min_samples).fit_roles(&data).unwrap();
        let large = Dbscan::new(eps + extra, min_samples).fit_roles(&data).unwrap();

        for (i, role) in small.roles.iter().enumerate() {
            prop_assert_ne!(*role, PointRole::Unclassified);
            if *role == PointRole::Core {
                prop_assert_eq!(large.roles[i], PointRole::Core);
            }
        }
        // Clustered points stay clustered.
        for i in 0..data.len() {
            if !small.labeling.is_noise(i) {
                prop_assert!(!large.labeling.is_noise(i), "point {} became noise", i);
            }
        }
        // Core points clustered together stay together.
        for members in small.labeling.clusters() {
            let labels: BTreeSet<Option<usize>> = members
                .iter()
                .filter(|&&i| small.roles[i] == PointRole::Core)
                .map(|&i| large.labeling.label(i))
                .collect();
            prop_assert!(labels.len() <= 1);
        }
    }

    #[test]
    fn prop_optics_ordering_is_valid(
        data in points(40),
        min_samples in 1usize..6,
        max_eps in 0.5f64..30.0,
    ) {
        let optics = Optics::new(min_samples).with_max_eps(max_eps);
        let ordering = optics.order(&data).unwrap();

        let mut indices = ordering.indices();
        indices.sort_unstable();
        prop_assert_eq!(indices, (0..data.len()).collect::<Vec<_>>());

        prop_assert_eq!(ordering.entries()[0].reachability_distance(), None);
        let mut position = vec![0; data.len()];
        for (pos, e) in ordering.entries().iter().enumerate() {
            position[e.index()] = pos;
        }
        for (pos, e) in ordering.entries().iter().enumerate() {
            // A point is reached from an earlier core point, within max_eps.
            match (e.predecessor(), e.reachability_distance()) {
                (Some(p), Some(r)) => {
                    prop_assert!(position[p] < pos);
                    prop_assert!(r <= max_eps);
                    prop_assert!(ordering.entries()[position[p]].core_distance().is_some());
                }
                (None, None) => {}
                other => {
                    prop_assert!(false, "predecessor and reachability disagree: {:?}", other);
                }
            }
        }
    }

    #[test]
    fn prop_optics_threshold_cuts_at_eps(
        data in points(40),
        min_samples in 1usize..6,
        eps in 0.2f64..5.0,
    ) {
        let fit = Optics::new(min_samples)
            .with_max_eps(10.0)
            .with_cluster_method(ExtractionMode::distance_threshold(eps))
            .fit_full(&data)
            .unwrap();
        let entries = fit.ordering.entries();
        let position = positions(entries);
        let reach_at = |pos: usize| entries[pos].reachability_distance().unwrap_or(f64::INFINITY);
        let core_at = |pos: usize| entries[pos].core_distance().unwrap_or(f64::INFINITY);

        for members in fit.labeling.clusters() {
            prop_assert!(members.len() >= min_samples);
            let first = position[members[0]];
            // Opened by a point that is core at eps but not reachable within it.
            prop_assert!(reach_at(first) > eps);
            prop_assert!(core_at(first) <= eps);
            for (k, &i) in members.iter().enumerate() {
                prop_assert_eq!(position[i], first + k);
                if k > 0 {
                    prop_assert!(reach_at(position[i]) <= eps);
                }
            }
        }

        for &i in fit.labeling.noise() {
            let pos = position[i];
            if reach_at(pos) > eps && core_at(pos) > eps {
                continue;
            }
            // Otherwise the point sits in a run too small to be kept.
            let mut start = pos;
            while reach_at(start) <= eps {
                start -= 1;
            }
            prop_assert!(core_at(start) <= eps);
            let mut end = pos;
            while end + 1 < entries.len() && reach_at(end + 1) <= eps {
                end += 1;
            }
            prop_assert!(end - start + 1 < min_samples);
        }
    }

    #[test]
    fn prop_optics_xi_clusters_are_candidate_intervals(
        data in points(40),
        min_samples in 1usize..6,
        xi in 0.01f64..0.5,
    ) {
        let fit = Optics::new(min_samples)
            .with_max_eps(10.0)
            .with_cluster_method(ExtractionMode::steep_areas(xi))
            .fit_full(&data)
            .unwrap();
        let entries = fit.ordering.entries();
        let position = positions(entries);
        let hierarchy = fit.hierarchy.unwrap();

        for members in fit.labeling.clusters() {
            let first = position[members[0]];
            let last = first + members.len() - 1;
            prop_assert!(
                hierarchy.contains(&(first, last)),
                "({}, {}) is not a candidate interval",
                first,
                last
            );
            for (k, &i) in members.iter().enumerate() {
                prop_assert_eq!(position[i], first + k);
            }
        }
    }

    #[test]
    fn prop_fitting_twice_is_identical(
        data in points(30),
        r in 0.1f64..5.0,
        min_samples in 1usize..6,
    ) {
        let rg = RadiusGraph::new(r);
        prop_assert_eq!(rg.fit(&data).unwrap(), rg.fit(&data).unwrap());

        let db = Dbscan::new(r, min_samples);
        prop_assert_eq!(db.fit_roles(&data).unwrap(), db.fit_roles(&data).unwrap());

        let op = Optics::new(min_samples);
        prop_assert_eq!(op.fit_full(&data).unwrap(), op.fit_full(&data).unwrap());
    }
}
