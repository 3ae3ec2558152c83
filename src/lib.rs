//! # ScaffoldForge - Paired-End Distance Model
//!
//! Statistical backbone for scaffolding a de Bruijn assembly graph with
//! paired-end and mate-pair reads. Given noisy (distance, weight) observations
//! between graph edges, it predicts the evidence an ideal library would produce
//! at a hypothesized distance, normalizes observed evidence against that
//! prediction, and clusters repeated observations into consensus distances.

pub mod assembly;
pub mod core;
pub mod utils;

// Re-export commonly used types at crate level
pub use crate::assembly::{
    cluster_pair_infos, ideal_paired_info, normalize_by_coverage, ClusteredPairInfo,
    EdgeEvidenceSummary, IdealFormula, PairedInfoLibrary,
};
pub use crate::core::data_structures::*;
pub use crate::core::paired_info::{PairedIndex, PairedInfoIndex};
pub use crate::utils::configuration::{ConfigurationManager, PairedInfoError, PairedLibraryConfig};

/// Result type used throughout the crate
pub type Result<T> = anyhow::Result<T>;

/// Error type used throughout the crate
pub type Error = anyhow::Error;
