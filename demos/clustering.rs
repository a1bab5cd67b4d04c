//! Radius graph, DBSCAN, and OPTICS on a simple 2D dataset.
//!
//! Set `RUST_LOG=pointclump=debug` to see what each strategy does.

use pointclump::cluster::{ExtractionMode, OpticsFit};
use pointclump::{ClusterLabeling, Clustering, Dbscan, Optics, RadiusGraph};
use tracing_subscriber::EnvFilter;

fn print_labels(title: &str, data: &[Vec<f64>], labels: &ClusterLabeling) {
    println!("=== {title} ===");
    for (i, label) in labels.labels().iter().enumerate() {
        let tag = match label {
            Some(c) => format!("cluster {c}"),
            None => "NOISE".to_string(),
        };
        println!("  point {:2} ({:5.1}, {:5.1}) => {}", i, data[i][0], data[i][1], tag);
    }
    println!();
}

fn print_ordering(fit: &OpticsFit) {
    println!("  reachability plot:");
    for e in fit.ordering.entries() {
        let reach = e
            .reachability_distance()
            .map_or_else(|| "undefined".to_string(), |r| format!("{r:.3}"));
        println!("    point {:2}  {}", e.index(), reach);
    }
    if let Some(hierarchy) = &fit.hierarchy {
        println!("  candidate intervals: {hierarchy:?}");
    }
    println!();
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let data: Vec<Vec<f64>> = vec![
        // Cluster A (near origin)
        vec![0.0, 0.0],
        vec![0.1, 0.2],
        vec![0.2, 0.1],
        vec![-0.1, 0.1],
        // Cluster B (near (5, 5))
        vec![5.0, 5.0],
        vec![5.1, 4.9],
        vec![4.9, 5.1],
        vec![5.2, 5.2],
        // Cluster C (near (10, 0)), looser
        vec![10.0, 0.0],
        vec![10.4, 0.3],
        vec![9.7, -0.3],
        vec![10.5, 0.6],
        // Outlier
        vec![20.0, 20.0],
    ];

    let labels = RadiusGraph::new(0.5).fit(&data).unwrap();
    print_labels("Radius graph (radius=0.5)", &data, &labels);

    let fit = Dbscan::new(0.5, 3).fit_roles(&data).unwrap();
    print_labels("DBSCAN (eps=0.5, min_samples=3)", &data, &fit.labeling);
    println!("  core points: {:?}\n", fit.core_sample_indices());

    let optics = Optics::new(3).with_max_eps(2.0);
    let fit = optics.fit_full(&data).unwrap();
    print_labels("OPTICS (min_samples=3, xi=0.05)", &data, &fit.labeling);
    print_ordering(&fit);

    let fit = optics
        .with_cluster_method(ExtractionMode::distance_threshold(0.5))
        .fit_full(&data)
        .unwrap();
    print_labels("OPTICS (min_samples=3, cut at 0.5)", &data, &fit.labeling);
}
