//! Median-split k-d tree over a borrowed point set.
//!
//! Nodes live in a flat arena and each owns a contiguous range of the shared
//! index permutation, so construction is one in-place `select_nth` per level
//! (O(N log N) overall). Every node keeps its tight bounding box; queries skip
//! a subtree when the metric's box bound already exceeds the search radius.

use std::collections::BinaryHeap;

use super::metric::Metric;
use super::Neighbor;

#[derive(Debug, Clone)]
struct Node {
    start: usize,
    end: usize,
    lo: Vec<f64>,
    hi: Vec<f64>,
    children: Option<(usize, usize)>,
}

#[derive(Debug, Clone)]
pub(crate) struct KdTree {
    nodes: Vec<Node>,
    indices: Vec<usize>,
}

impl KdTree {
    /// Build over `points`, splitting until a node holds at most `leaf_size`
    /// points or all of its points coincide.
    pub(crate) fn build(points: &[Vec<f64>], leaf_size: usize) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(2 * points.len() / leaf_size.max(1) + 1),
            indices: (0..points.len()).collect(),
        };
        tree.build_node(points, 0, points.len(), leaf_size.max(1));
        tree
    }

    fn build_node(
        &mut self,
        points: &[Vec<f64>],
        start: usize,
        end: usize,
        leaf_size: usize,
    ) -> usize {
        let (lo, hi) = bounding_box(points, &self.indices[start..end]);

        // Split along the axis with the widest spread.
        let (axis, spread) = lo
            .iter()
            .zip(&hi)
            .map(|(l, h)| h - l)
            .enumerate()
            .fold((0, 0.0), |best, (axis, s)| if s > best.1 { (axis, s) } else { best });

        let id = self.nodes.len();
        self.nodes.push(Node {
            start,
            end,
            lo,
            hi,
            children: None,
        });

        if end - start <= leaf_size || spread <= 0.0 {
            return id;
        }

        let mid = start + (end - start) / 2;
        self.indices[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            points[a][axis]
                .total_cmp(&points[b][axis])
                .then(a.cmp(&b))
        });

        let left = self.build_node(points, start, mid, leaf_size);
        let right = self.build_node(points, mid, end, leaf_size);
        self.nodes[id].children = Some((left, right));
        id
    }

    /// Push every point within `radius` of `query` into `out`, unordered.
    pub(crate) fn within(
        &self,
        points: &[Vec<f64>],
        metric: &Metric,
        query: &[f64],
        radius: f64,
        out: &mut Vec<Neighbor>,
    ) {
        let mut stack = vec![0usize];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if metric.min_distance_to_box(query, &node.lo, &node.hi) > radius {
                continue;
            }
            match node.children {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => {
                    for &index in &self.indices[node.start..node.end] {
                        let distance = metric.distance(query, &points[index]);
                        if distance <= radius {
                            out.push(Neighbor { index, distance });
                        }
                    }
                }
            }
        }
    }

    /// The `k` nearest points to `query` other than `exclude`, ascending by
    /// (distance, index).
    pub(crate) fn nearest(
        &self,
        points: &[Vec<f64>],
        metric: &Metric,
        query: &[f64],
        k: usize,
        exclude: usize,
    ) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }

        // Max-heap: the top is the worst of the current best k.
        let mut best: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(k + 1);
        let mut stack = vec![(0usize, 0.0f64)];

        while let Some((id, bound)) = stack.pop() {
            // Ties at the bound may still hold a smaller index, so only a
            // strictly larger bound prunes.
            if best.len() == k && best.peek().is_some_and(|worst| bound > worst.distance) {
                continue;
            }
            let node = &self.nodes[id];
            match node.children {
                Some((left, right)) => {
                    let (l, r) = (&self.nodes[left], &self.nodes[right]);
                    let lb = metric.min_distance_to_box(query, &l.lo, &l.hi);
                    let rb = metric.min_distance_to_box(query, &r.lo, &r.hi);
                    // Visit the nearer child first.
                    if lb <= rb {
                        stack.push((right, rb));
                        stack.push((left, lb));
                    } else {
                        stack.push((left, lb));
                        stack.push((right, rb));
                    }
                }
                None => {
                    for &index in &self.indices[node.start..node.end] {
                        if index == exclude {
                            continue;
                        }
                        let candidate = Neighbor {
                            index,
                            distance: metric.distance(query, &points[index]),
                        };
                        if best.len() < k {
                            best.push(candidate);
                        } else if best.peek().is_some_and(|worst| candidate < *worst) {
                            best.pop();
                            best.push(candidate);
                        }
                    }
                }
            }
        }

        best.into_sorted_vec()
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match nodes[id].children {
                Some((l, r)) => 1 + walk(nodes, l).max(walk(nodes, r)),
                None => 1,
            }
        }
        walk(&self.nodes, 0)
    }
}

fn bounding_box(points: &[Vec<f64>], indices: &[usize]) -> (Vec<f64>, Vec<f64>) {
    let dim = indices.first().map_or(0, |&i| points[i].len());
    let mut lo = vec![f64::INFINITY; dim];
    let mut hi = vec![f64::NEG_INFINITY; dim];
    for &i in indices {
        for (axis, &x) in points[i].iter().enumerate() {
            lo[axis] = lo[axis].min(x);
            hi[axis] = hi[axis].max(x);
        }
    }
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> Vec<Vec<f64>> {
        (0..n * n)
            .map(|i| vec![(i % n) as f64, (i / n) as f64])
            .collect()
    }

    #[test]
    fn every_index_lands_in_exactly_one_leaf() {
        let points = grid(9);
        let tree = KdTree::build(&points, 4);
        let mut seen: Vec<usize> = tree
            .nodes
            .iter()
            .filter(|n| n.children.is_none())
            .flat_map(|n| tree.indices[n.start..n.end].iter().copied())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..81).collect::<Vec<_>>());
    }

    #[test]
    fn tree_is_balanced() {
        let points = grid(32);
        let tree = KdTree::build(&points, 8);
        // 1024 points, 8 per leaf: 128 leaves, depth log2(128) + 1.
        assert!(tree.depth() <= 9, "depth {}", tree.depth());
    }

    #[test]
    fn identical_points_stop_splitting() {
        let points = vec![vec![1.0, 1.0]; 100];
        let tree = KdTree::build(&points, 4);
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn within_matches_linear_scan() {
        let points = grid(12);
        let tree = KdTree::build(&points, 3);
        for metric in [Metric::Euclidean, Metric::Manhattan, Metric::Chebyshev] {
            let query = [5.3, 6.1];
            let mut got = Vec::new();
            tree.within(&points, &metric, &query, 2.0, &mut got);
            let mut got: Vec<usize> = got.into_iter().map(|n| n.index).collect();
            got.sort_unstable();
            let want: Vec<usize> = (0..points.len())
                .filter(|&i| metric.distance(&query, &points[i]) <= 2.0)
                .collect();
            assert_eq!(got, want, "{}", metric.name());
        }
    }

    #[test]
    fn nearest_breaks_ties_by_index() {
        let points = grid(5);
        let tree = KdTree::build(&points, 2);
        // Center of the grid: four neighbors at distance 1.
        let got = tree.nearest(&points, &Metric::Euclidean, &points[12], 4, 12);
        let idx: Vec<usize> = got.iter().map(|n| n.index).collect();
        assert_eq!(idx, vec![7, 11, 13, 17]);
        assert!(got.iter().all(|n| (n.distance - 1.0).abs() < 1e-12));
    }
}
