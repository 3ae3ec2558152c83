//! Ideal paired-info geometry
//!
//! Given library parameters and a hypothesized distance between two edges,
//! count the read-pair placements that would be consistent with that distance.
//! Scaffolding divides observed evidence by this count to obtain a confidence.
//!
//! Two window conventions exist for the cross-edge case and give different
//! values near the insert-size limits. [`IdealFormula`] names them; every call
//! site in a library uses the one configured for it.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Window convention for the cross-edge ideal weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdealFormula {
    /// `right = min(IS, gap + len2 + r)`, `left = max(gap, IS - r - len1)`,
    /// `ideal = right - left + 1 - k + v`
    #[default]
    ReadWindow,
    /// Edge lengths extended by `k` before windowing, with the strict
    /// `IS - r + v` bound on the right end
    KmerExtended,
}

/// Library geometry needed by the model, all in nucleotides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertGeometry {
    pub k: usize,
    pub read_length: usize,
    pub insert_size: usize,
    pub insert_size_variation: usize,
}

impl InsertGeometry {
    /// Placements of a read pair entirely inside one edge
    pub fn self_pair(&self, length: usize) -> f64 {
        let w = length as i128 - self.insert_size as i128 + 2 * self.read_length as i128 + 1
            - self.k as i128;
        clamp_weight(w)
    }

    /// Placements for `second` starting `distance` after `first`.
    ///
    /// `distance` must already be oriented so that `first` is upstream.
    /// Windows are computed in `i128` so no `usize` length or `i64` distance
    /// can overflow them.
    pub fn cross_edge(&self, formula: IdealFormula, len1: usize, len2: usize, distance: i64) -> f64 {
        let k = self.k as i128;
        let r = self.read_length as i128;
        let is = self.insert_size as i128;
        let v = self.insert_size_variation as i128;
        let distance = distance as i128;

        let w = match formula {
            IdealFormula::ReadWindow => {
                let (len1, len2) = (len1 as i128, len2 as i128);
                let gap = distance - len1;
                let right = is.min(gap + len2 + r);
                let left = gap.max(is - r - len1);
                right - left + 1 - k + v
            }
            IdealFormula::KmerExtended => {
                let len1 = len1 as i128 + k;
                let len2 = len2 as i128 + k;
                let gap = distance - len1;
                let right = (gap + len2).min(is - r + v) - k + len1;
                let left = (len1 - r + k + gap).max(is - 2 * r + k - v);
                right - left + 1
            }
        };

        trace!("ideal window {:?} distance {} -> {}", formula, distance, w);
        clamp_weight(w)
    }

    /// Ideal weight for two raw lengths before concrete edges are resolved.
    ///
    /// A zero distance is read as both lengths describing the same edge, so
    /// the self-pair count for `len1` is returned.
    pub fn ideal_for_lengths(
        &self,
        formula: IdealFormula,
        len1: usize,
        len2: usize,
        distance: i64,
    ) -> f64 {
        if distance == 0 {
            return self.self_pair(len1);
        }
        if distance < 0 {
            self.cross_edge(formula, len2, len1, distance.saturating_neg())
        } else {
            self.cross_edge(formula, len1, len2, distance)
        }
    }
}

/// Infeasible placements are modeled as zero evidence, never as an error.
fn clamp_weight(w: i128) -> f64 {
    if w > 0 {
        w as f64
    } else {
        0.0
    }
}

/// Standalone ideal weight for raw lengths under [`IdealFormula::ReadWindow`]
pub fn ideal_paired_info(
    len1: usize,
    len2: usize,
    distance: i64,
    insert_size: usize,
    read_length: usize,
    insert_size_variation: usize,
    k: usize,
) -> f64 {
    InsertGeometry {
        k,
        read_length,
        insert_size,
        insert_size_variation,
    }
    .ideal_for_lengths(IdealFormula::ReadWindow, len1, len2, distance)
}
