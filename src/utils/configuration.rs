use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::assembly::ideal_model::{IdealFormula, InsertGeometry};

/// Configuration for all sequencing libraries used during scaffolding
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScaffoldingConfiguration {
    /// One entry per paired-end or mate-pair library
    #[serde(default)]
    pub libraries: Vec<PairedLibraryConfig>,
    /// Logging and monitoring configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Thread pool configuration
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Calibrated parameters of one sequencing library
///
/// Insert size and its variation come from upstream insert-size refinement and
/// are never recomputed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedLibraryConfig {
    /// Human readable library name, used in log lines
    #[serde(default = "default_library_name")]
    pub name: String,
    /// K-mer size of the assembly graph
    pub k: usize,
    /// Read length
    pub read_length: usize,
    /// Expected insert size
    pub insert_size: usize,
    /// Insert size variation
    pub insert_size_variation: usize,
    #[serde(default)]
    pub is_mate_pair: bool,
    /// Coverage calibration coefficient
    #[serde(default = "default_coverage_coeff")]
    pub coverage_coeff: f64,
    /// Single-evidence threshold, unset unless calibrated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_threshold: Option<f64>,
    /// Cross-edge window convention for ideal weights
    #[serde(default)]
    pub ideal_formula: IdealFormula,
}

fn default_library_name() -> String {
    "lib".to_string()
}

fn default_coverage_coeff() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log output format (json, pretty, compact)
    pub format: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Worker threads for batch evaluation, 0 means one per core
    pub num_threads: usize,
}

/// Errors raised by configuration and calibration
#[derive(Error, Debug)]
pub enum PairedInfoError {
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Input/Output error: {message}")]
    IOError { message: String },

    #[error("Validation error: {field} is invalid: {reason}")]
    ValidationError { field: String, reason: String },
}

impl From<ConfigError> for PairedInfoError {
    fn from(err: ConfigError) -> Self {
        PairedInfoError::ConfigurationError {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for PairedInfoError {
    fn from(err: std::io::Error) -> Self {
        PairedInfoError::IOError {
            message: err.to_string(),
        }
    }
}

impl PairedLibraryConfig {
    pub fn new(k: usize, read_length: usize, insert_size: usize, insert_size_variation: usize) -> Self {
        Self {
            name: default_library_name(),
            k,
            read_length,
            insert_size,
            insert_size_variation,
            is_mate_pair: false,
            coverage_coeff: default_coverage_coeff(),
            single_threshold: None,
            ideal_formula: IdealFormula::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_mate_pair(mut self, is_mate_pair: bool) -> Self {
        self.is_mate_pair = is_mate_pair;
        self
    }

    pub fn with_coverage_coeff(mut self, coverage_coeff: f64) -> Self {
        self.coverage_coeff = coverage_coeff;
        self
    }

    pub fn with_single_threshold(mut self, threshold: f64) -> Self {
        self.single_threshold = Some(threshold);
        self
    }

    pub fn with_ideal_formula(mut self, formula: IdealFormula) -> Self {
        self.ideal_formula = formula;
        self
    }

    pub fn geometry(&self) -> InsertGeometry {
        InsertGeometry {
            k: self.k,
            read_length: self.read_length,
            insert_size: self.insert_size,
            insert_size_variation: self.insert_size_variation,
        }
    }

    /// Check parameters before a library is built from them
    pub fn validate(&self) -> Result<(), PairedInfoError> {
        if self.k == 0 {
            return Err(self.invalid("k", "must be greater than 0"));
        }
        if self.read_length == 0 {
            return Err(self.invalid("read_length", "must be greater than 0"));
        }
        if self.insert_size == 0 {
            return Err(self.invalid("insert_size", "must be greater than 0"));
        }
        if self.coverage_coeff == 0.0 || !self.coverage_coeff.is_finite() {
            return Err(self.invalid("coverage_coeff", "must be finite and non-zero"));
        }
        if let Some(threshold) = self.single_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(self.invalid("single_threshold", "must be a non-negative number"));
            }
        }

        if self.insert_size_variation > self.insert_size {
            warn!(
                "Library {}: insert size variation ({}) exceeds insert size ({})",
                self.name, self.insert_size_variation, self.insert_size
            );
        }
        if self.read_length > self.insert_size && !self.is_mate_pair {
            warn!(
                "Library {}: read length ({}) exceeds insert size ({})",
                self.name, self.read_length, self.insert_size
            );
        }
        Ok(())
    }

    fn invalid(&self, field: &str, reason: &str) -> PairedInfoError {
        PairedInfoError::ValidationError {
            field: format!("libraries.{}.{}", self.name, field),
            reason: reason.to_string(),
        }
    }
}

/// Configuration manager with validation and environment integration
pub struct ConfigurationManager {
    config: ScaffoldingConfiguration,
    config_path: Option<PathBuf>,
}

impl ConfigurationManager {
    /// Create configuration manager with pure defaults (no file dependencies)
    pub fn new_with_defaults() -> Result<Self, PairedInfoError> {
        let manager = Self {
            config: ScaffoldingConfiguration::default(),
            config_path: None,
        };
        manager.validate_configuration()?;
        Ok(manager)
    }

    /// Load configuration from a TOML file, layered with `SCAFFOLD__*` variables
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, PairedInfoError> {
        let config_path = config_path.as_ref().to_path_buf();
        let config = Self::load_config_from_file(&config_path)?;

        let manager = Self {
            config,
            config_path: Some(config_path),
        };
        manager.validate_configuration()?;
        Ok(manager)
    }

    fn load_config_from_file(path: &Path) -> Result<ScaffoldingConfiguration, PairedInfoError> {
        let config = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("SCAFFOLD").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validate every library and the performance section
    pub fn validate_configuration(&self) -> Result<(), PairedInfoError> {
        let config = &self.config;

        for library in &config.libraries {
            library.validate()?;
        }

        let mut names: Vec<&str> = config.libraries.iter().map(|l| l.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(PairedInfoError::ValidationError {
                field: "libraries.name".to_string(),
                reason: format!("duplicate library name '{}'", pair[0]),
            });
        }

        let available_threads = num_cpus::get();
        if config.performance.num_threads > available_threads * 2 {
            warn!(
                "Configured threads ({}) exceeds available cores ({})",
                config.performance.num_threads, available_threads
            );
        }

        info!(
            "✅ Configuration validated: {} librar{}",
            config.libraries.len(),
            if config.libraries.len() == 1 { "y" } else { "ies" }
        );
        Ok(())
    }

    /// Setup logging based on configuration
    pub fn setup_logging(&self) -> Result<(), PairedInfoError> {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if tracing::dispatcher::has_been_set() {
            info!("⏭️  Logging already initialized, skipping setup");
            return Ok(());
        }

        let level = &self.config.logging.level;
        let format = &self.config.logging.format;

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let subscriber = tracing_subscriber::registry().with(env_filter);

        let installed = match format.as_str() {
            "json" => tracing::subscriber::set_global_default(
                subscriber.with(fmt::layer().json().with_target(true).with_thread_ids(true)),
            ),
            "compact" => {
                tracing::subscriber::set_global_default(subscriber.with(fmt::layer().compact()))
            }
            _ => tracing::subscriber::set_global_default(
                subscriber.with(fmt::layer().without_time().with_target(false)),
            ),
        };

        installed.map_err(|e| PairedInfoError::ConfigurationError {
            message: format!("Failed to install tracing subscriber: {e}"),
        })?;

        info!(
            "📝 Logging initialized with level: {}, format: {}",
            level, format
        );
        Ok(())
    }

    /// Size the global rayon pool used by batch edge summaries
    pub fn install_thread_pool(&self) -> Result<(), PairedInfoError> {
        let num_threads = self.config.performance.num_threads;
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| PairedInfoError::ConfigurationError {
                message: format!("Failed to build thread pool: {e}"),
            })?;

        info!("🧵 Thread pool ready with {} threads", rayon::current_num_threads());
        Ok(())
    }

    /// Get configuration reference
    pub fn config(&self) -> &ScaffoldingConfiguration {
        &self.config
    }

    /// Path the configuration was loaded from, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Look up a library by name
    pub fn library(&self, name: &str) -> Option<&PairedLibraryConfig> {
        self.config.libraries.iter().find(|l| l.name == name)
    }

    /// Save current configuration to file
    pub fn save_config<P: AsRef<Path>>(&self, path: P) -> Result<(), PairedInfoError> {
        let toml_string = toml::to_string_pretty(&self.config).map_err(|e| {
            PairedInfoError::ConfigurationError {
                message: format!("Failed to serialize configuration: {e}"),
            }
        })?;

        std::fs::write(path.as_ref(), toml_string)?;

        info!("💾 Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
