pub mod data_structures;
pub mod paired_info;

// Re-export key types for scaffolding integration
pub use data_structures::{
    // Edge handles and graph capability
    Direction,
    EdgeId,
    EdgeLengthArena,
    EdgeLengths,
    EvidenceSource,
    // Observations
    Histogram,
    PairInfo,
    Point,
};
pub use paired_info::{PairedIndex, PairedInfoIndex};
