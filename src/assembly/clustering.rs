//! Reduce repeated observations of an edge pair to one consensus point

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::core::data_structures::{EdgeId, PairInfo, Point};

/// Consensus observation for one ordered edge pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteredPairInfo {
    /// Upper-median distance, summed weight, zero variance
    pub info: PairInfo,
    /// Ideal weight at the consensus distance
    pub ideal_weight: f64,
}

impl ClusteredPairInfo {
    /// Consensus weight over ideal weight, `None` for an infeasible placement
    pub fn normalized_weight(&self) -> Option<f64> {
        (self.ideal_weight > 0.0).then(|| self.info.weight() / self.ideal_weight)
    }
}

/// Group observations by ordered edge pair.
///
/// `(e1, e2)` and `(e2, e1)` are separate groups; callers wanting a single
/// orientation must canonicalize first.
pub fn group_by_edge_pair(pair_infos: &[PairInfo]) -> BTreeMap<(EdgeId, EdgeId), Vec<Point>> {
    let mut groups: BTreeMap<(EdgeId, EdgeId), Vec<Point>> = BTreeMap::new();
    for info in pair_infos {
        groups
            .entry((info.first, info.second))
            .or_default()
            .push(info.point);
    }
    groups
}

/// Consensus point of one group: the element at `len / 2` after sorting
/// (upper median), carrying the summed weight. Returns `None` for an empty group.
pub fn consensus_point(points: &mut [Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    points.sort_by(|a, b| a.total_cmp(b));

    let d = points[points.len() / 2].d;
    let weight = points.iter().map(|p| p.weight).sum();
    Some(Point::new(d, weight, 0.0))
}

/// Cluster observations and attach the ideal weight of every consensus point.
///
/// `ideal` receives the pair and the consensus distance truncated toward zero. Output holds
/// one entry per distinct edge pair, ordered by pair.
pub fn cluster_pair_infos<F>(pair_infos: &[PairInfo], ideal: F) -> Vec<ClusteredPairInfo>
where
    F: Fn(EdgeId, EdgeId, i64) -> f64,
{
    let groups = group_by_edge_pair(pair_infos);
    let mut clustered = Vec::with_capacity(groups.len());

    for ((first, second), mut points) in groups {
        let Some(point) = consensus_point(&mut points) else {
            continue;
        };
        let ideal_weight = ideal(first, second, point.truncated_d());
        debug!(
            "Clustered {} points for ({}, {}) at d={} w={} ideal={}",
            points.len(),
            first,
            second,
            point.d,
            point.weight,
            ideal_weight
        );
        clustered.push(ClusteredPairInfo {
            info: PairInfo::new(first, second, point),
            ideal_weight,
        });
    }

    clustered
}
