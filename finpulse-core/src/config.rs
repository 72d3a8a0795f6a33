//! Pipeline configuration, loaded from TOML.

use crate::data::Lookback;
use crate::domain::InstrumentSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default directory for exported tables.
pub const DEFAULT_OUTPUT_DIR: &str = "data_output";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown export table '{0}' (expected prices, daily_returns, rebased, volatility or correlation)")]
    UnknownTable(String),
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Instruments to analyze, in display order.
    pub instruments: InstrumentSet,
    pub lookback: Lookback,
    pub export: ExportConfig,
    pub provider: ProviderConfig,
}

impl PipelineConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string. Missing keys take defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            instruments: InstrumentSet::new(["AAPL", "BTC-USD", "GC=F", "IWDA.AS"]),
            lookback: Lookback::OneYear,
            export: ExportConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

/// Which tables get persisted after a run, and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub tables: Vec<ExportTable>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            tables: Vec::new(),
        }
    }
}

/// A table the pipeline can export. The name doubles as the file stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportTable {
    Prices,
    DailyReturns,
    /// Base-100 relative performance.
    Rebased,
    Volatility,
    Correlation,
}

impl ExportTable {
    pub const ALL: [ExportTable; 5] = [
        ExportTable::Prices,
        ExportTable::DailyReturns,
        ExportTable::Rebased,
        ExportTable::Volatility,
        ExportTable::Correlation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExportTable::Prices => "prices",
            ExportTable::DailyReturns => "daily_returns",
            ExportTable::Rebased => "rebased",
            ExportTable::Volatility => "volatility",
            ExportTable::Correlation => "correlation",
        }
    }
}

impl fmt::Display for ExportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportTable {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportTable::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ConfigError::UnknownTable(s.to_string()))
    }
}

/// HTTP settings for the market-data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query2.finance.yahoo.com".into(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
        }
    }
}
