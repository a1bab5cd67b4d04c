//! ξ (xi) cluster extraction from a reachability ordering.
//!
//! A cluster in the reachability plot is a valley: a steep drop, a stretch of
//! low reachability, and a steep rise. With `ξ ∈ (0, 1)`, position `i` is
//!
//! - *steep down* if `r[i] · (1 - ξ) >= r[i + 1]`,
//! - *steep up* if `r[i] <= r[i + 1] · (1 - ξ)`,
//!
//! where `r` is the plot with an infinite sentinel appended. The extraction
//! runs in two passes:
//!
//! 1. [`steep_areas`] finds maximal steep-down and steep-up areas. An area may
//!    absorb up to `min_samples` consecutive non-steep points as long as they
//!    keep going the same way. Each area records the maximum reachability
//!    between the previous area and itself.
//! 2. [`pair_areas`] replays the areas. Steep-down areas are kept on a stack
//!    and dropped once the plot between them and the current position rises
//!    above their start (scaled by `1 - ξ`). Every steep-up area is paired with
//!    each surviving steep-down area; the interval's ends are pulled in so both
//!    sides sit at a comparable height, optionally trimmed by predecessor
//!    correction, and kept if it is at least `min_cluster_size` long.
//!
//! Candidates are listed innermost first for each steep-up area. Flat labels
//! take candidates in that order and skip any candidate that overlaps one
//! already taken, so the tightest valley wins over the wider ones enclosing it.
//!
//! # References
//!
//! Ankerst et al. (1999), section 4.3; the corrected end-point rule follows
//! Schubert & Gertz (2018), "Improving the Cluster Structure Extracted from
//! OPTICS Plots".

use super::labeling::{ClusterLabeling, LabelingBuilder};
use super::optics::{OrderingEntry, ReachabilityOrdering};

/// Direction of a steep area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slope {
    Down,
    Up,
}

/// A maximal steep area, as inclusive ordering positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SteepArea {
    pub(crate) slope: Slope,
    pub(crate) start: usize,
    pub(crate) end: usize,
    /// Maximum reachability between the end of the previous area and `start`.
    pub(crate) mib: f64,
}

/// Result of ξ extraction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct XiClusters {
    pub(crate) labeling: ClusterLabeling,
    /// Every accepted candidate interval, in discovery order.
    pub(crate) hierarchy: Vec<(usize, usize)>,
}

pub(crate) fn extract(
    ordering: &ReachabilityOrdering,
    xi: f64,
    min_cluster_size: usize,
    predecessor_correction: bool,
) -> XiClusters {
    let mut plot = ordering.reachability_plot();
    plot.push(f64::INFINITY);
    let xi_complement = 1.0 - xi;
    let min_samples = ordering.min_samples();

    let areas = steep_areas(&plot, xi_complement, min_samples);
    let hierarchy = pair_areas(
        &plot,
        ordering.entries(),
        &areas,
        xi_complement,
        min_cluster_size,
        predecessor_correction,
    );
    tracing::trace!(areas = areas.len(), candidates = hierarchy.len(), "xi extraction");

    XiClusters {
        labeling: label_intervals(ordering.entries(), &hierarchy),
        hierarchy,
    }
}

/// Pass 1: maximal steep areas of `plot` (which ends with an infinite sentinel).
pub(crate) fn steep_areas(plot: &[f64], xi_complement: f64, min_samples: usize) -> Vec<SteepArea> {
    let n = plot.len() - 1;
    // NaN ratios (0/0, inf/inf) are neither steep nor sloped.
    let ratio: Vec<f64> = (0..n).map(|i| plot[i] / plot[i + 1]).collect();
    let steep_up: Vec<bool> = ratio.iter().map(|&r| r <= xi_complement).collect();
    let steep_down: Vec<bool> = ratio.iter().map(|&r| r >= 1.0 / xi_complement).collect();
    let upward: Vec<bool> = ratio.iter().map(|&r| r < 1.0).collect();
    let downward: Vec<bool> = ratio.iter().map(|&r| r > 1.0).collect();

    let mut areas = Vec::new();
    let mut index = 0;
    let mut mib = 0.0f64;

    for steep_index in 0..n {
        if steep_index < index || !(steep_up[steep_index] || steep_down[steep_index]) {
            continue;
        }
        mib = plot[index..=steep_index].iter().copied().fold(mib, f64::max);

        let (slope, end) = if steep_down[steep_index] {
            (Slope::Down, extend_region(&steep_down, &upward, steep_index, min_samples))
        } else {
            (Slope::Up, extend_region(&steep_up, &downward, steep_index, min_samples))
        };
        areas.push(SteepArea {
            slope,
            start: steep_index,
            end,
            mib,
        });

        index = end + 1;
        mib = plot[index];
    }

    areas
}

/// Last steep position of the area starting at `start`. The area stops at
/// the first point going the other way (`against`) or after more than
/// `min_samples` consecutive non-steep points.
fn extend_region(steep: &[bool], against: &[bool], start: usize, min_samples: usize) -> usize {
    let mut non_steep = 0;
    let mut end = start;
    for index in start..steep.len() {
        if steep[index] {
            non_steep = 0;
            end = index;
        } else if against[index] {
            return end;
        } else {
            non_steep += 1;
            if non_steep > min_samples {
                break;
            }
        }
    }
    end
}

#[derive(Debug, Clone, Copy)]
struct DownArea {
    start: usize,
    end: usize,
    /// Maximum reachability seen since this area ended.
    mib: f64,
}

/// Pass 2: pair steep-down with steep-up areas into candidate intervals.
pub(crate) fn pair_areas(
    plot: &[f64],
    entries: &[OrderingEntry],
    areas: &[SteepArea],
    xi_complement: f64,
    min_cluster_size: usize,
    predecessor_correction: bool,
) -> Vec<(usize, usize)> {
    let mut downs: Vec<DownArea> = Vec::new();
    let mut clusters = Vec::new();

    for area in areas {
        // Drop down areas the plot has since climbed above.
        if area.mib.is_infinite() {
            downs.clear();
        } else {
            downs.retain(|d| area.mib <= plot[d.start] * xi_complement);
            for d in &mut downs {
                d.mib = d.mib.max(area.mib);
            }
        }

        if area.slope == Slope::Down {
            downs.push(DownArea {
                start: area.start,
                end: area.end,
                mib: 0.0,
            });
            continue;
        }

        let (u_start, u_end) = (area.start, area.end);
        let after = plot[u_end + 1];
        let mut found = Vec::new();

        for d in &downs {
            if after * xi_complement < d.mib {
                continue;
            }

            let mut c_start = d.start;
            let mut c_end = u_end;
            let d_max = plot[d.start];
            if d_max * xi_complement >= after {
                // The drop is much higher than the rise: start where the
                // plot first comes down to the level of the end.
                while c_start < d.end && plot[c_start + 1] > after {
                    c_start += 1;
                }
            } else if after * xi_complement >= d_max {
                // The rise is much higher than the drop: end where the plot
                // last sits at the level of the start.
                while c_end > u_start && plot[c_end - 1] > d_max {
                    c_end -= 1;
                }
            }

            if predecessor_correction {
                match correct_predecessor(plot, entries, c_start, c_end) {
                    Some((s, e)) => {
                        c_start = s;
                        c_end = e;
                    }
                    None => continue,
                }
            }

            if c_end - c_start + 1 < min_cluster_size || c_start > d.end || c_end < u_start {
                continue;
            }
            found.push((c_start, c_end));
        }

        // Later down areas give tighter intervals; list those first.
        found.reverse();
        clusters.extend(found);
    }

    clusters
}

/// Shrink `[s, e]` from the right until its last point is either lower than
/// the first or was reached from a point inside the interval.
fn correct_predecessor(
    plot: &[f64],
    entries: &[OrderingEntry],
    s: usize,
    mut e: usize,
) -> Option<(usize, usize)> {
    while s < e {
        if plot[s] > plot[e] {
            return Some((s, e));
        }
        if let Some(p) = entries[e].predecessor {
            if entries[s..e].iter().any(|x| x.index == p) {
                return Some((s, e));
            }
        }
        e -= 1;
    }
    None
}

/// Flat labels from candidate intervals: take each in order unless it
/// overlaps one already taken.
fn label_intervals(entries: &[OrderingEntry], intervals: &[(usize, usize)]) -> ClusterLabeling {
    let mut out = LabelingBuilder::new(entries.len());
    for &(s, e) in intervals {
        let span = &entries[s..=e];
        if span.iter().any(|x| out.is_assigned(x.index)) {
            continue;
        }
        let cluster = out.open_cluster();
        for x in span {
            out.assign(x.index, cluster);
        }
    }
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INF: f64 = f64::INFINITY;

    #[test]
    fn steep_areas_of_two_valleys() {
        // Two valleys separated by an undefined reachability, plus an outlier.
        let plot = [INF, 2.0, 1.0, 1.0, 1.0, INF, 2.0, 1.0, 1.0, 1.0, INF, INF];
        let areas = steep_areas(&plot, 0.7, 3);
        let spans: Vec<(Slope, usize, usize)> =
            areas.iter().map(|a| (a.slope, a.start, a.end)).collect();
        assert_eq!(
            spans,
            vec![
                (Slope::Down, 0, 1),
                (Slope::Up, 4, 4),
                (Slope::Down, 5, 6),
                (Slope::Up, 9, 9),
            ]
        );
        assert_eq!(areas[0].mib, INF);
        assert_eq!(areas[1].mib, 1.0);
        assert_eq!(areas[2].mib, INF);
    }

    #[test]
    fn region_tolerates_short_flat_runs() {
        // Steep at 0 and 3 with two flat points between: one area with
        // min_samples = 2, cut after the first point with 1.
        let steep = [true, false, false, true, false];
        let against = [false; 5];
        assert_eq!(extend_region(&steep, &against, 0, 2), 3);
        assert_eq!(extend_region(&steep, &against, 0, 1), 0);

        let against = [false, true, false, false, false];
        assert_eq!(extend_region(&steep, &against, 0, 5), 0);
    }

    #[test]
    fn nested_valleys_prefer_the_inner_one() {
        // Unbounded ordering of two groups linked by a reachability of 96.
        let plot = [INF, 2.0, 1.0, 1.0, 1.0, 96.0, 2.0, 1.0, 1.0, 1.0, INF];
        let entries: Vec<OrderingEntry> = (0..10)
            .map(|i| OrderingEntry {
                index: i,
                reachability: plot[i],
                core_distance: 1.0,
                predecessor: i.checked_sub(1),
            })
            .collect();
        let areas = steep_areas(&plot, 0.7, 3);
        let intervals = pair_areas(&plot, &entries, &areas, 0.7, 3, true);
        assert_eq!(intervals, vec![(0, 4), (5, 9), (0, 9)]);

        let labels = label_intervals(&entries, &intervals);
        assert_eq!(labels.clusters(), &[vec![0, 1, 2, 3, 4], vec![5, 6, 7, 8, 9]]);
    }

    #[test]
    fn short_intervals_are_dropped() {
        let plot = [INF, 2.0, 1.0, 1.0, 1.0, 96.0, 2.0, 1.0, 1.0, 1.0, INF];
        let entries: Vec<OrderingEntry> = (0..10)
            .map(|i| OrderingEntry {
                index: i,
                reachability: plot[i],
                core_distance: 1.0,
                predecessor: i.checked_sub(1),
            })
            .collect();
        let areas = steep_areas(&plot, 0.7, 3);
        let intervals = pair_areas(&plot, &entries, &areas, 0.7, 6, true);
        assert_eq!(intervals, vec![(0, 9)]);
    }

    #[test]
    fn predecessor_correction_trims_unconnected_tail() {
        let plot = [INF, 1.0, 1.0, 5.0];
        let entries: Vec<OrderingEntry> = [None, Some(0), Some(1), Some(9)]
            .iter()
            .enumerate()
            .map(|(i, &predecessor)| OrderingEntry {
                index: i,
                reachability: plot[i],
                core_distance: 1.0,
                predecessor,
            })
            .collect();
        // Position 3 was reached from outside the interval and is not lower than its start.
        assert_eq!(correct_predecessor(&[1.0, 1.0, 1.0, 5.0], &entries, 0, 3), Some((0, 2)));
        // A higher start accepts the interval as is.
        assert_eq!(correct_predecessor(&plot, &entries, 0, 3), Some((0, 3)));
    }
}
