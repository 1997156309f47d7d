//! TOML configuration
//!
//! Every field has a default, so a partial file (or none at all) is valid.
//! A missing file is created with the defaults written out as comments.

use crate::experiment::AppendMode;
use crate::stats::SignificancePolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "chart-ab.toml";

/// Where tables live and how interactions are appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory of the CSV table store
    #[serde(default = "StoreConfig::default_dir")]
    pub dir: PathBuf,
    /// Reference dataset table
    #[serde(default = "StoreConfig::default_dataset_table")]
    pub dataset_table: String,
    /// Interaction log table
    #[serde(default = "StoreConfig::default_interactions_table")]
    pub interactions_table: String,
    /// `native` or `read-modify-write`
    #[serde(default)]
    pub append_mode: AppendMode,
}

impl StoreConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("data")
    }
    fn default_dataset_table() -> String {
        "penguins".to_string()
    }
    fn default_interactions_table() -> String {
        "interactions".to_string()
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            dataset_table: Self::default_dataset_table(),
            interactions_table: Self::default_interactions_table(),
            append_mode: AppendMode::default(),
        }
    }
}

/// Dataset cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Seconds a loaded dataset (and interaction log) may be served from cache
    #[serde(default = "DatasetConfig::default_staleness_secs")]
    pub staleness_secs: u64,
}

impl DatasetConfig {
    fn default_staleness_secs() -> u64 {
        300
    }

    /// Staleness budget as a duration.
    #[must_use]
    pub const fn staleness(&self) -> Duration {
        Duration::from_secs(self.staleness_secs)
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            staleness_secs: Self::default_staleness_secs(),
        }
    }
}

/// Significance testing thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// The test runs only with strictly more records than this
    #[serde(default = "AnalysisConfig::default_min_total_samples")]
    pub min_total_samples: usize,
    /// Significance level
    #[serde(default = "AnalysisConfig::default_alpha")]
    pub alpha: f64,
}

impl AnalysisConfig {
    fn default_min_total_samples() -> usize {
        SignificancePolicy::default().min_total_samples
    }
    fn default_alpha() -> f64 {
        SignificancePolicy::default().alpha
    }

    /// As a [`SignificancePolicy`].
    #[must_use]
    pub const fn policy(&self) -> SignificancePolicy {
        SignificancePolicy {
            min_total_samples: self.min_total_samples,
            alpha: self.alpha,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_total_samples: Self::default_min_total_samples(),
            alpha: Self::default_alpha(),
        }
    }
}

/// Chart output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// HTML file written each time a chart is shown
    #[serde(default = "ChartConfig::default_output")]
    pub output: PathBuf,
}

impl ChartConfig {
    fn default_output() -> PathBuf {
        PathBuf::from("chart.html")
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            output: Self::default_output(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// `[store]`
    #[serde(default)]
    pub store: StoreConfig,
    /// `[dataset]`
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// `[analysis]`
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// `[chart]`
    #[serde(default)]
    pub chart: ChartConfig,
}

impl AppConfig {
    /// Parse TOML text.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the text is not valid configuration.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load `path`, or create it with commented-out defaults if it does not
    /// exist.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if an existing file cannot be read, or
    /// [`Error::Config`] if it cannot be parsed. Failing to write the
    /// defaults file is logged, not returned.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let text = fs::read_to_string(path)?;
            debug!(path = %path.display(), "config loaded");
            return Self::from_toml(&text)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())));
        }

        let defaults = Self::default();
        match defaults.to_toml() {
            Ok(text) => {
                if let Err(err) = fs::write(path, comment_out(&text)) {
                    warn!(path = %path.display(), error = %err, "failed to write default config");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize default config"),
        }
        Ok(defaults)
    }

    fn validate(&self) -> Result<()> {
        if !(self.analysis.alpha > 0.0 && self.analysis.alpha < 1.0) {
            return Err(Error::Config(format!(
                "analysis.alpha must be in (0, 1), got {}",
                self.analysis.alpha
            )));
        }
        if self.store.dataset_table == self.store.interactions_table {
            return Err(Error::Config(
                "store.dataset_table and store.interactions_table must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Comment out every key, keeping section headers.
fn comment_out(text: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || (trimmed.starts_with('[') && trimmed.ends_with(']')) {
            out.push_str(line);
        } else {
            out.push_str("# ");
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}
