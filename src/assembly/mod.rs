//! Paired-end distance model used by scaffolding
//!
//! **Geometry**: `ideal_model.rs` - expected evidence for a hypothesized distance
//! **Clustering**: `clustering.rs` - consensus point per edge pair
//! **Library**: `paired_library.rs` - queries, normalization and per-edge aggregates

pub mod clustering;
pub mod ideal_model;
pub mod paired_library;

pub use clustering::{cluster_pair_infos, ClusteredPairInfo};
pub use ideal_model::{ideal_paired_info, IdealFormula, InsertGeometry};
pub use paired_library::{normalize_by_coverage, EdgeEvidenceSummary, PairedInfoLibrary};
