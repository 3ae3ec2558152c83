pub mod configuration;

pub use configuration::{
    ConfigurationManager, LoggingConfig, PairedInfoError, PairedLibraryConfig, PerformanceConfig,
    ScaffoldingConfiguration,
};
