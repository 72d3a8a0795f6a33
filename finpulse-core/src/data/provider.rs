//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over market-data sources so the
//! extractor can run against Yahoo Finance in production and a mock in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Coarse lookback window understood by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lookback {
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Lookback {
    pub const ALL: [Lookback; 6] = [
        Lookback::FiveDays,
        Lookback::OneMonth,
        Lookback::SixMonths,
        Lookback::OneYear,
        Lookback::TwoYears,
        Lookback::FiveYears,
    ];

    /// Range token as used in provider URLs and config files.
    pub fn token(self) -> &'static str {
        match self {
            Lookback::FiveDays => "5d",
            Lookback::OneMonth => "1mo",
            Lookback::SixMonths => "6mo",
            Lookback::OneYear => "1y",
            Lookback::TwoYears => "2y",
            Lookback::FiveYears => "5y",
        }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Lookback {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Lookback::ALL
            .into_iter()
            .find(|l| l.token() == s.trim())
            .ok_or_else(|| {
                DataError::Other(format!(
                    "unknown lookback '{s}' (expected one of 5d, 1mo, 6mo, 1y, 2y, 5y)"
                ))
            })
    }
}

/// Raw daily observation from a provider, before alignment and cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no instruments requested")]
    EmptyInstrumentSet,

    #[error("provider returned no usable data for {instruments}")]
    NoData { instruments: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Synthetic,
}

/// Trait for market-data providers.
///
/// Providers return daily observations for one symbol over a lookback
/// window. They know nothing about alignment or cleaning.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily observations for a symbol.
    fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<FetchResult, DataError>;
}
