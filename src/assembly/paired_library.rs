//! Paired-end library view used by scaffolding
//!
//! A [`PairedInfoLibrary`] binds the calibrated parameters of one sequencing
//! library to the graph and to its paired info indices. Every method is a
//! read-only query, so one library can be shared across threads and several
//! libraries can be queried side by side.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::assembly::clustering::{cluster_pair_infos, ClusteredPairInfo};
use crate::assembly::ideal_model::{IdealFormula, InsertGeometry};
use crate::core::data_structures::{Direction, EdgeId, EdgeLengths, EvidenceSource, PairInfo};
use crate::core::paired_info::PairedInfoIndex;
use crate::utils::configuration::{PairedInfoError, PairedLibraryConfig};

/// Divide a weight by a coverage calibration coefficient.
///
/// A zero (or non-finite) coefficient is a configuration error, never an
/// infinite weight.
pub fn normalize_by_coverage(weight: f64, coverage_coeff: f64) -> Result<f64, PairedInfoError> {
    if coverage_coeff == 0.0 || !coverage_coeff.is_finite() {
        return Err(PairedInfoError::ConfigurationError {
            message: format!("coverage coefficient must be finite and non-zero, got {coverage_coeff}"),
        });
    }
    Ok(weight / coverage_coeff)
}

/// Per-edge evidence totals in both directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeEvidenceSummary {
    pub edge: EdgeId,
    /// Raw weight towards downstream partners
    pub forward_raw: f64,
    /// Raw weight towards upstream partners
    pub backward_raw: f64,
    /// Mean normalized weight downstream, `None` without feasible points
    pub forward_normalized: Option<f64>,
    /// Mean normalized weight upstream, `None` without feasible points
    pub backward_normalized: Option<f64>,
    pub forward_points: usize,
    pub backward_points: usize,
}

/// One sequencing library over a borrowed graph and borrowed indices
pub struct PairedInfoLibrary<'a, G, I>
where
    G: EdgeLengths,
    I: PairedInfoIndex,
{
    graph: &'a G,
    config: PairedLibraryConfig,
    geometry: InsertGeometry,
    index: &'a I,
    index_not_clustered: &'a I,
}

impl<'a, G, I> PairedInfoLibrary<'a, G, I>
where
    G: EdgeLengths,
    I: PairedInfoIndex,
{
    /// Library whose raw and clustered roles share one index
    pub fn new(graph: &'a G, config: PairedLibraryConfig, index: &'a I) -> Self {
        Self::with_raw_index(graph, config, index, index)
    }

    /// Library with a separate uncorrected index for raw counts
    pub fn with_raw_index(
        graph: &'a G,
        config: PairedLibraryConfig,
        index: &'a I,
        index_not_clustered: &'a I,
    ) -> Self {
        let geometry = config.geometry();
        debug!(
            "Library {}: k={} rl={} is={} var={} mate_pair={}",
            config.name,
            config.k,
            config.read_length,
            config.insert_size,
            config.insert_size_variation,
            config.is_mate_pair
        );
        Self {
            graph,
            config,
            geometry,
            index,
            index_not_clustered,
        }
    }

    /// Validate the configuration, then build the library
    pub fn try_new(
        graph: &'a G,
        config: PairedLibraryConfig,
        index: &'a I,
        index_not_clustered: &'a I,
    ) -> Result<Self, PairedInfoError> {
        config.validate()?;
        Ok(Self::with_raw_index(graph, config, index, index_not_clustered))
    }

    pub fn config(&self) -> &PairedLibraryConfig {
        &self.config
    }

    pub fn k(&self) -> usize {
        self.config.k
    }

    pub fn read_length(&self) -> usize {
        self.config.read_length
    }

    pub fn insert_size(&self) -> usize {
        self.config.insert_size
    }

    pub fn insert_size_variation(&self) -> usize {
        self.config.insert_size_variation
    }

    pub fn is_mate_pair(&self) -> bool {
        self.config.is_mate_pair
    }

    pub fn coverage_coeff(&self) -> f64 {
        self.config.coverage_coeff
    }

    pub fn single_threshold(&self) -> Option<f64> {
        self.config.single_threshold
    }

    pub fn ideal_formula(&self) -> IdealFormula {
        self.config.ideal_formula
    }

    fn index_for(&self, source: EvidenceSource) -> &'a I {
        match source {
            EvidenceSource::Raw => self.index_not_clustered,
            EvidenceSource::Clustered => self.index,
        }
    }

    /* --------------------------------------------------------------------- */
    /*                              Geometry                                 */
    /* --------------------------------------------------------------------- */

    /// Expected evidence for `second` starting `distance` after `first`.
    ///
    /// A negative distance is read from the other edge's side. For two
    /// distinct edges at zero distance the lower id is taken as upstream so
    /// that swapping the pair gives the same value.
    pub fn ideal_paired_info(&self, first: EdgeId, second: EdgeId, distance: i64) -> f64 {
        if distance == 0 && first == second {
            return self.geometry.self_pair(self.graph.length(first));
        }

        let (upstream, downstream, distance) = if distance < 0 || (distance == 0 && first > second) {
            (second, first, distance.saturating_neg())
        } else {
            (first, second, distance)
        };

        self.geometry.cross_edge(
            self.config.ideal_formula,
            self.graph.length(upstream),
            self.graph.length(downstream),
            distance,
        )
    }

    /// Ideal weight for raw lengths, before edges are resolved
    pub fn ideal_paired_info_for_lengths(&self, len1: usize, len2: usize, distance: i64) -> f64 {
        self.geometry
            .ideal_for_lengths(self.config.ideal_formula, len1, len2, distance)
    }

    /* --------------------------------------------------------------------- */
    /*                               Queries                                 */
    /* --------------------------------------------------------------------- */

    /// Every edge sharing at least one observation with `edge`
    pub fn neighbors(&self, edge: EdgeId) -> BTreeSet<EdgeId> {
        self.index
            .edge_info(edge)
            .into_iter()
            .map(|info| info.second)
            .collect()
    }

    /// Rounded distance and weight of every observation between two distinct edges
    pub fn count_distances(&self, first: EdgeId, second: EdgeId) -> Vec<(i64, f64)> {
        if first == second {
            return Vec::new();
        }
        self.index
            .edge_pair_info(first, second)
            .iter()
            .map(|point| (point.rounded_d(), point.weight))
            .collect()
    }

    /// Weight of observations whose own variance window covers `distance`
    pub fn count_paired_info(&self, first: EdgeId, second: EdgeId, distance: i64) -> f64 {
        self.index
            .edge_pair_info(first, second)
            .iter()
            .filter(|point| {
                let paired_distance = point.rounded_d();
                let deviation = point.var as i64;
                paired_distance >= distance.saturating_sub(deviation)
                    && paired_distance <= distance.saturating_add(deviation)
            })
            .map(|point| point.weight)
            .sum()
    }

    /* --------------------------------------------------------------------- */
    /*                            Normalization                              */
    /* --------------------------------------------------------------------- */

    /// Observed weight over ideal weight; 0 for an infeasible placement
    pub fn normalize_weight(&self, pair_info: &PairInfo) -> f64 {
        let ideal = self.ideal_paired_info(pair_info.first, pair_info.second, pair_info.rounded_d());
        if ideal > 0.0 {
            pair_info.weight() / ideal
        } else {
            0.0
        }
    }

    /// Scale a weight by this library's coverage coefficient
    pub fn normalize_by_coverage(&self, weight: f64) -> Result<f64, PairedInfoError> {
        normalize_by_coverage(weight, self.config.coverage_coeff)
    }

    /* --------------------------------------------------------------------- */
    /*                       Clustering and aggregates                       */
    /* --------------------------------------------------------------------- */

    /// Consensus point per edge pair with the ideal weight under this library
    pub fn cluster(&self, pair_infos: &[PairInfo]) -> Vec<ClusteredPairInfo> {
        cluster_pair_infos(pair_infos, |first, second, d| {
            self.ideal_paired_info(first, second, d)
        })
    }

    /// Sum of raw weights on `edge` in one direction, from the uncorrected index
    pub fn all_pi_count(&self, edge: EdgeId, direction: Direction) -> f64 {
        self.index_not_clustered
            .edge_info(edge)
            .iter()
            .filter(|info| direction.matches(info.d()))
            .map(|info| info.weight())
            .sum()
    }

    /// Sum of normalized consensus weights in one direction and how many points contributed
    pub fn all_norm_pi_and_size(
        &self,
        edge: EdgeId,
        direction: Direction,
        source: EvidenceSource,
    ) -> (f64, usize) {
        let pair_infos = self.index_for(source).edge_info(edge);
        let clustered = self.cluster(&pair_infos);

        clustered
            .iter()
            .filter(|c| direction.matches(c.info.d()))
            .filter_map(ClusteredPairInfo::normalized_weight)
            .fold((0.0, 0), |(sum, size), w| (sum + w, size + 1))
    }

    pub fn all_norm_pi(&self, edge: EdgeId, direction: Direction, source: EvidenceSource) -> f64 {
        self.all_norm_pi_and_size(edge, direction, source).0
    }

    /// Mean normalized consensus weight, `None` when no point qualifies
    pub fn all_norm_pi_average(
        &self,
        edge: EdgeId,
        direction: Direction,
        source: EvidenceSource,
    ) -> Option<f64> {
        let (sum, size) = self.all_norm_pi_and_size(edge, direction, source);
        (size > 0).then(|| sum / size as f64)
    }

    fn summarize_edge(&self, edge: EdgeId, source: EvidenceSource) -> EdgeEvidenceSummary {
        let (forward_sum, forward_points) =
            self.all_norm_pi_and_size(edge, Direction::Forward, source);
        let (backward_sum, backward_points) =
            self.all_norm_pi_and_size(edge, Direction::Backward, source);

        EdgeEvidenceSummary {
            edge,
            forward_raw: self.all_pi_count(edge, Direction::Forward),
            backward_raw: self.all_pi_count(edge, Direction::Backward),
            forward_normalized: (forward_points > 0).then(|| forward_sum / forward_points as f64),
            backward_normalized: (backward_points > 0)
                .then(|| backward_sum / backward_points as f64),
            forward_points,
            backward_points,
        }
    }
}

impl<'a, G, I> PairedInfoLibrary<'a, G, I>
where
    G: EdgeLengths + Sync,
    I: PairedInfoIndex + Sync,
{
    /// Evidence summaries for many edges, computed in parallel, in input order
    pub fn summarize_edges(
        &self,
        edges: &[EdgeId],
        source: EvidenceSource,
    ) -> Vec<EdgeEvidenceSummary> {
        let summaries: Vec<EdgeEvidenceSummary> = edges
            .par_iter()
            .map(|&edge| self.summarize_edge(edge, source))
            .collect();

        info!(
            "📊 Library {}: summarized {} edges from {:?} evidence",
            self.config.name,
            summaries.len(),
            source
        );
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_structures::{EdgeLengthArena, Point};
    use crate::core::paired_info::PairedIndex;

    fn library_config() -> PairedLibraryConfig {
        PairedLibraryConfig::new(55, 100, 500, 50)
    }

    fn two_edge_graph() -> (EdgeLengthArena, EdgeId, EdgeId) {
        let mut graph = EdgeLengthArena::new();
        let e1 = graph.add_edge(100);
        let e2 = graph.add_edge(80);
        (graph, e1, e2)
    }

    #[test]
    fn test_ideal_cross_edge() {
        let (graph, e1, e2) = two_edge_graph();
        let index = PairedIndex::new();
        let library = PairedInfoLibrary::new(&graph, library_config(), &index);

        assert_eq!(library.ideal_paired_info(e1, e2, 300), 76.0);
        assert_eq!(library.ideal_paired_info(e2, e1, -300), 76.0);
    }

    #[test]
    fn test_ideal_self_pair() {
        let mut graph = EdgeLengthArena::new();
        let e = graph.add_edge(1000);
        let index = PairedIndex::new();
        let library = PairedInfoLibrary::new(&graph, library_config(), &index);

        assert_eq!(library.ideal_paired_info(e, e, 0), 646.0);
    }

    #[test]
    fn test_zero_distance_is_symmetric() {
        let (graph, e1, e2) = two_edge_graph();
        let index = PairedIndex::new();
        let library = PairedInfoLibrary::new(&graph, library_config(), &index);

        assert_eq!(
            library.ideal_paired_info(e1, e2, 0),
            library.ideal_paired_info(e2, e1, 0)
        );
    }

    #[test]
    fn test_formula_selector_is_applied() {
        let (graph, e1, e2) = two_edge_graph();
        let index = PairedIndex::new();
        let read_window = PairedInfoLibrary::new(&graph, library_config(), &index);
        let kmer_extended = PairedInfoLibrary::new(
            &graph,
            library_config().with_ideal_formula(IdealFormula::KmerExtended),
            &index,
        );

        assert_eq!(read_window.ideal_paired_info(e1, e2, 450), 146.0);
        assert_eq!(kmer_extended.ideal_paired_info(e1, e2, 450), 126.0);
        assert_eq!(kmer_extended.ideal_formula(), IdealFormula::KmerExtended);
    }

    #[test]
    fn test_neighbors_and_distances() {
        let (mut graph, e1, e2) = two_edge_graph();
        let e3 = graph.add_edge(500);
        let mut index = PairedIndex::new();
        index.add_pair_info(e1, e2, Point::new(300.0, 2.0, 10.0));
        index.add_pair_info(e1, e2, Point::new(-20.4, 1.0, 10.0));
        index.add_pair_info(e3, e1, Point::new(700.0, 1.0, 0.0));
        let library = PairedInfoLibrary::new(&graph, library_config(), &index);

        assert_eq!(library.neighbors(e1), BTreeSet::from([e2, e3]));
        assert_eq!(library.neighbors(e2), BTreeSet::from([e1]));
        assert!(library.neighbors(EdgeId(99)).is_empty());

        assert_eq!(library.count_distances(e1, e2), vec![(300, 2.0), (-20, 1.0)]);
        assert!(library.count_distances(e1, e1).is_empty());
    }

    #[test]
    fn test_count_paired_info_uses_point_variance() {
        let (graph, e1, e2) = two_edge_graph();
        let mut index = PairedIndex::new();
        index.add_pair_info(e1, e2, Point::new(300.0, 2.0, 10.0));
        index.add_pair_info(e1, e2, Point::new(320.0, 3.0, 5.0));
        index.add_pair_info(e1, e2, Point::new(330.0, 4.0, 30.0));
        let library = PairedInfoLibrary::new(&graph, library_config(), &index);

        // 300 within 10 of 310; 320 within 5 of 310 fails; 330 within 30 of 310
        assert_eq!(library.count_paired_info(e1, e2, 310), 6.0);
        assert_eq!(library.count_paired_info(e1, e2, 320), 7.0);
        assert_eq!(library.count_paired_info(e1, e2, 1_000), 0.0);
    }

    #[test]
    fn test_normalize_weight() {
        let (graph, e1, e2) = two_edge_graph();
        let index = PairedIndex::new();
        let library = PairedInfoLibrary::new(&graph, library_config(), &index);

        let feasible = PairInfo::new(e1, e2, Point::new(300.0, 38.0, 0.0));
        assert_eq!(library.normalize_weight(&feasible), 0.5);

        let infeasible = PairInfo::new(e1, e2, Point::new(5_000.0, 38.0, 0.0));
        assert_eq!(library.normalize_weight(&infeasible), 0.0);
    }

    #[test]
    fn test_extreme_distances_and_variances() {
        let (graph, e1, e2) = two_edge_graph();
        let mut index = PairedIndex::new();
        index.add_pair_info(e1, e2, Point::new(-1e19, 1.0, 0.0));
        index.add_pair_info(e1, e2, Point::new(300.0, 2.0, 1e19));
        let library = PairedInfoLibrary::new(&graph, library_config(), &index);

        let far_behind = PairInfo::new(e1, e2, Point::new(-1e19, 1.0, 0.0));
        assert_eq!(library.normalize_weight(&far_behind), 0.0);
        assert_eq!(library.normalize_weight(&far_behind.mirrored()), 0.0);
        assert_eq!(library.ideal_paired_info(e1, e2, i64::MIN), 0.0);
        assert_eq!(library.ideal_paired_info(e2, e1, i64::MAX), 0.0);

        // The unbounded variance window covers every distance
        assert_eq!(library.count_paired_info(e1, e2, 300), 2.0);
        // The far point saturates to i64::MIN and matches that distance exactly
        assert_eq!(library.count_paired_info(e1, e2, i64::MIN), 3.0);
        assert_eq!(library.count_paired_info(e1, e2, i64::MAX), 2.0);

        assert_eq!(library.all_pi_count(e1, Direction::Backward), 1.0);
        assert_eq!(
            library.all_norm_pi_average(e1, Direction::Backward, EvidenceSource::Raw),
            None
        );
    }

    #[test]
    fn test_normalize_by_coverage() {
        assert_eq!(normalize_by_coverage(12.5, 1.0).unwrap(), 12.5);
        assert_eq!(normalize_by_coverage(10.0, 4.0).unwrap(), 2.5);
        assert!(matches!(
            normalize_by_coverage(10.0, 0.0),
            Err(PairedInfoError::ConfigurationError { .. })
        ));

        let (graph, _, _) = two_edge_graph();
        let index = PairedIndex::new();
        let library =
            PairedInfoLibrary::new(&graph, library_config().with_coverage_coeff(2.0), &index);
        assert_eq!(library.normalize_by_coverage(3.0).unwrap(), 1.5);
    }

    #[test]
    fn test_try_new_rejects_invalid_config() {
        let (graph, _, _) = two_edge_graph();
        let index = PairedIndex::new();
        let config = library_config().with_coverage_coeff(0.0);

        assert!(PairedInfoLibrary::try_new(&graph, config, &index, &index).is_err());
    }

    #[test]
    fn test_all_pi_count_reads_raw_index() {
        let (graph, e1, e2) = two_edge_graph();
        let mut raw = PairedIndex::new();
        raw.add_pair_info(e1, e2, Point::new(300.0, 2.0, 0.0));
        raw.add_pair_info(e1, e2, Point::new(310.0, 3.0, 0.0));
        raw.add_pair_info(e1, e2, Point::new(-40.0, 7.0, 0.0));
        raw.add_pair_info(e1, e1, Point::new(0.0, 100.0, 0.0));
        let clustered = PairedIndex::new();
        let library = PairedInfoLibrary::with_raw_index(&graph, library_config(), &clustered, &raw);

        assert_eq!(library.all_pi_count(e1, Direction::Forward), 5.0);
        assert_eq!(library.all_pi_count(e1, Direction::Backward), 7.0);
        assert_eq!(library.all_pi_count(e2, Direction::Backward), 5.0);
    }

    #[test]
    fn test_normalized_aggregates() {
        let (graph, e1, e2) = two_edge_graph();
        let mut raw = PairedIndex::new();
        raw.add_pair_info(e1, e2, Point::new(298.0, 10.0, 0.0));
        raw.add_pair_info(e1, e2, Point::new(300.0, 20.0, 0.0));
        raw.add_pair_info(e1, e2, Point::new(305.0, 8.0, 0.0));
        let mut clustered = PairedIndex::new();
        clustered.add_pair_info(e1, e2, Point::new(300.0, 76.0, 0.0));
        let library = PairedInfoLibrary::with_raw_index(&graph, library_config(), &clustered, &raw);

        // consensus at 300 with weight 38 over ideal 76
        assert_eq!(
            library.all_norm_pi_and_size(e1, Direction::Forward, EvidenceSource::Raw),
            (0.5, 1)
        );
        assert_eq!(library.all_norm_pi(e1, Direction::Forward, EvidenceSource::Clustered), 1.0);
        assert_eq!(
            library.all_norm_pi_average(e2, Direction::Backward, EvidenceSource::Raw),
            Some(0.5)
        );
        assert_eq!(
            library.all_norm_pi_average(e1, Direction::Backward, EvidenceSource::Raw),
            None
        );
    }

    #[test]
    fn test_summarize_edges() {
        let (graph, e1, e2) = two_edge_graph();
        let mut index = PairedIndex::new();
        index.add_pair_info(e1, e2, Point::new(300.0, 38.0, 0.0));
        let library = PairedInfoLibrary::new(&graph, library_config(), &index);

        let summaries = library.summarize_edges(&[e2, e1], EvidenceSource::Clustered);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].edge, e2);
        assert_eq!(summaries[0].backward_raw, 38.0);
        assert_eq!(summaries[0].backward_normalized, Some(0.5));
        assert_eq!(summaries[0].forward_normalized, None);
        assert_eq!(summaries[1].edge, e1);
        assert_eq!(summaries[1].forward_points, 1);
        assert_eq!(summaries[1].backward_points, 0);
    }
}
